//! Imported scene description
//!
//! A [`LoadedScene`] is what an external importer (glTF or similar) hands to
//! [`SceneManager::add_loaded_scene`](crate::scene::SceneManager::add_loaded_scene):
//! a flat node list with parent links plus the meshes and materials those
//! nodes reference by index.

use crate::foundation::math::Mat4;
use super::material::Material;
use super::mesh::MeshAsset;

/// Node in an imported scene
#[derive(Debug, Clone)]
pub struct LoadedNode {
    /// Node name; collisions with existing scene nodes get a numeric suffix
    pub name: String,
    /// Index of the parent in [`LoadedScene::nodes`], `None` for roots
    pub parent: Option<usize>,
    /// Baked local matrix
    pub local_matrix: Mat4,
    /// Index into [`LoadedScene::meshes`]
    pub mesh: Option<usize>,
}

impl LoadedNode {
    /// Node without a mesh
    pub fn new(name: impl Into<String>, parent: Option<usize>, local_matrix: Mat4) -> Self {
        Self {
            name: name.into(),
            parent,
            local_matrix,
            mesh: None,
        }
    }

    /// Attach a mesh index
    #[must_use]
    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.mesh = Some(mesh);
        self
    }
}

/// Mesh in an imported scene with per-surface material slots
#[derive(Debug, Clone)]
pub struct LoadedMesh {
    /// Geometry; surface materials are resolved from `surface_materials`
    pub mesh: MeshAsset,
    /// Index into [`LoadedScene::materials`] per surface
    pub surface_materials: Vec<Option<usize>>,
}

impl LoadedMesh {
    /// Mesh whose every surface uses one material slot
    pub fn new(mesh: MeshAsset, material: Option<usize>) -> Self {
        let surface_materials = vec![material; mesh.surfaces.len()];
        Self { mesh, surface_materials }
    }
}

/// Imported scene ready to merge
#[derive(Debug, Clone, Default)]
pub struct LoadedScene {
    /// Scene name, used to prefix unnamed meshes
    pub name: String,
    /// Flat node list
    pub nodes: Vec<LoadedNode>,
    /// Meshes referenced by nodes
    pub meshes: Vec<LoadedMesh>,
    /// Materials referenced by mesh surfaces
    pub materials: Vec<Material>,
}

impl LoadedScene {
    /// Empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Indices of nodes without a parent
    pub fn root_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| index)
    }
}
