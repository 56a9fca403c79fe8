//! Scene management system
//!
//! Turns a hierarchy of nodes, meshes and materials into GPU-ready draw data.
//!
//! ## Architecture
//!
//! ```text
//! Imported scenes / procedural meshes
//!      ↓
//! Scene Manager (transactional update, pending batch)
//!      ↓
//! GPU resource pool (vertex, index, instance, indirect, material buffers)
//!      ↓
//! Scene View (frustum + cull data for the GPU culling pass)
//! ```
//!
//! The Scene Manager:
//! - Owns the node arena and keeps world transforms and bounds current
//! - Batches geometry and instance records between begin/end of an update
//! - Uploads the batch through the staging buffer, growing buffers as needed

mod bounds;
mod camera;
mod frustum;
mod hierarchy;
mod node;
mod pending;
mod scene_manager;
mod tree;
mod view;

#[cfg(test)]
mod tests;

pub use bounds::Bounds;
pub use camera::{Camera, CameraProvider, Projection};
pub use frustum::{Frustum, FrustumPlane, Plane};
pub use hierarchy::{compute_levels, TransformStore};
pub use node::{DrawContext, NodeKey, NodeKind, RenderObject, SceneNode};
pub use pending::{BufferCounts, PendingBatch};
pub use scene_manager::{SceneManager, UpdateState};
pub use tree::SceneTree;
pub use view::SceneView;
