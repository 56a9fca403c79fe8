//! # GPU Scene
//!
//! Scene representation and GPU draw-data assembly.
//!
//! ## Features
//!
//! - **Scene graph**: slot-map node arena with cached world transforms and bounds
//! - **Level-ordered transforms**: flat hierarchy store updated one depth at a time
//! - **Transactional uploads**: geometry, instances and draw commands batched per update
//! - **Growable GPU buffers**: geometric growth with generation counters
//! - **Meshlets**: greedy triangle clustering with backface cones
//! - **Culling data**: frustum extraction and packed parameters for GPU culling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gpu_scene::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut scene = SceneManager::new(HeadlessDevice::new());
//!     scene.init(SceneConfig::default())?;
//!
//!     scene.begin_scene_update()?;
//!     let cube = scene.add_mesh(MeshAsset::cuboid("cube", Vec3::new(1.0, 1.0, 1.0)))?;
//!     if let Some(node) = scene.create_node("cube_0") {
//!         scene.add_mesh_instance(node, cube)?;
//!     }
//!     scene.end_scene_update()?;
//!     scene.update()?;
//!
//!     let mut view = SceneView::default();
//!     view.set_camera(&Camera::perspective(Vec3::new(0.0, 2.0, 8.0), 60.0, 16.0 / 9.0, 0.1, 100.0));
//!     let draw_count = scene.indirect_draws().map_or(0, |(_, count)| count);
//!     let _cull = view.cull_data(draw_count);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod assets;
pub mod config;
pub mod error;
pub mod foundation;
pub mod gpu;
pub mod meshlet;
pub mod scene;

pub use error::{SceneError, SceneResult};

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        SceneError, SceneResult,
        assets::{LoadedMesh, LoadedNode, LoadedScene, Material, MaterialId, MeshAsset, MeshKey},
        config::{Config, SceneConfig, ViewConfig},
        foundation::math::{Mat4, Transform, Vec3},
        gpu::{DrawCullData, GpuDevice, HeadlessDevice},
        meshlet::{Meshlet, MeshletBuilder},
        scene::{Bounds, Camera, CameraProvider, NodeKey, SceneManager, SceneView, UpdateState},
    };
}
