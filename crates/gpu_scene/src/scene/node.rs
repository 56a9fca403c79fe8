//! Scene nodes and the render-object collection hook

use slotmap::new_key_type;

use crate::assets::MeshKey;
use crate::foundation::math::{Mat4, Transform};
use super::bounds::Bounds;

new_key_type! {
    /// Key of a node in the scene arena
    pub struct NodeKey;
}

/// What a node draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// Grouping node; contributes only its children
    #[default]
    Empty,
    /// Draws a registered mesh
    StaticMesh {
        /// Mesh drawn by this node
        mesh: MeshKey,
    },
}

impl NodeKind {
    /// Mesh drawn by this node, if any
    pub const fn mesh(&self) -> Option<MeshKey> {
        match self {
            Self::Empty => None,
            Self::StaticMesh { mesh } => Some(*mesh),
        }
    }

    /// Append this node's render object, if it draws anything
    pub fn collect(&self, node_id: u32, is_static: bool, out: &mut Vec<RenderObject>) {
        if let Self::StaticMesh { mesh } = self {
            out.push(RenderObject {
                node_id,
                mesh: *mesh,
                is_static,
            });
        }
    }
}

/// Lightweight record produced by [`SceneTree::draw`](super::SceneTree::draw)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderObject {
    /// Id of the node that produced it
    pub node_id: u32,
    /// Mesh to draw
    pub mesh: MeshKey,
    /// Static objects keep their instance records across frames
    pub is_static: bool,
}

/// Output list for a draw traversal
#[derive(Debug, Default)]
pub struct DrawContext {
    /// Collected render objects in traversal order
    pub objects: Vec<RenderObject>,
}

impl DrawContext {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop collected objects, keeping the allocation
    pub fn clear(&mut self) {
        self.objects.clear();
    }
}

/// A node in the scene arena
///
/// Children are owned through the arena; `parent` is a plain back-link that
/// the tree keeps in sync on attach and detach.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) name: String,
    pub(crate) id: u32,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) level: u32,
    pub(crate) world_matrix: Mat4,
    pub(crate) local_bounds: Bounds,
    pub(crate) world_bounds: Bounds,
    pub(crate) kind: NodeKind,
    /// Local transform relative to the parent
    pub transform: Transform,
    /// Hidden nodes and their subtrees are skipped by `draw`
    pub visible: bool,
    /// Marks geometry whose instance records never change
    pub is_static: bool,
}

impl SceneNode {
    pub(crate) fn new(name: String, id: u32) -> Self {
        Self {
            name,
            id,
            parent: None,
            children: Vec::new(),
            level: 0,
            world_matrix: Mat4::identity(),
            local_bounds: Bounds::default(),
            world_bounds: Bounds::default(),
            kind: NodeKind::Empty,
            transform: Transform::identity(),
            visible: true,
            is_static: true,
        }
    }

    /// Unique name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric id assigned by the scene manager
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Parent node
    pub const fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Direct children in attach order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Depth below the root of the tree the node is attached to
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// World matrix from the last refresh
    pub const fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Object-space bounds of the node's own geometry
    pub const fn local_bounds(&self) -> &Bounds {
        &self.local_bounds
    }

    /// World bounds of the node and its whole subtree
    pub const fn world_bounds(&self) -> &Bounds {
        &self.world_bounds
    }

    /// What the node draws
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Local matrix composed from the transform
    pub fn local_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Replace the local transform with a decomposed matrix
    pub fn set_local_matrix(&mut self, matrix: &Mat4) {
        self.transform = Transform::from_matrix(matrix);
    }

    /// Visibility predicate used by `draw`
    pub const fn is_visible(&self) -> bool {
        self.visible
    }
}
