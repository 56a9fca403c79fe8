//! Scene assets: meshes, materials and imported scenes

mod loaded_scene;
mod material;
mod mesh;

pub use loaded_scene::{LoadedMesh, LoadedNode, LoadedScene};
pub use material::{AlphaMode, Material, MaterialFlags, MaterialId};
pub use mesh::{GeoSurface, MeshAsset, MeshKey};
