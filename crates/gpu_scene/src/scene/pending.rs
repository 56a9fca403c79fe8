//! Pending batch: CPU-side data collected during one scene update

use crate::gpu::{BufferKind, DrawCommand, GpuMaterial, ObjectData, Vertex};

/// Arrays appended during a `Building` transaction and uploaded at its end
#[derive(Debug, Default, Clone)]
pub struct PendingBatch {
    /// Vertices of newly added meshes
    pub vertices: Vec<Vertex>,
    /// Indices of newly added meshes, relative to each mesh's first vertex
    pub indices: Vec<u32>,
    /// Instance records
    pub objects: Vec<ObjectData>,
    /// Indirect draw commands, one per instance record
    pub draws: Vec<DrawCommand>,
    /// Material table entries
    pub materials: Vec<GpuMaterial>,
}

impl PendingBatch {
    /// Empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, keeping allocations
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.objects.clear();
        self.draws.clear();
        self.materials.clear();
    }

    /// True when nothing is waiting for upload
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
            && self.indices.is_empty()
            && self.objects.is_empty()
            && self.draws.is_empty()
            && self.materials.is_empty()
    }

    /// Element count waiting for one buffer
    pub fn len_of(&self, kind: BufferKind) -> u64 {
        (match kind {
            BufferKind::Vertex => self.vertices.len(),
            BufferKind::Index => self.indices.len(),
            BufferKind::Instance => self.objects.len(),
            BufferKind::Indirect => self.draws.len(),
            BufferKind::Material => self.materials.len(),
            BufferKind::Staging => 0,
        }) as u64
    }
}

/// Element counts already resident in the GPU buffers
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferCounts {
    /// Vertices uploaded
    pub vertices: u32,
    /// Indices uploaded
    pub indices: u32,
    /// Instance records uploaded
    pub objects: u32,
    /// Draw commands uploaded
    pub draws: u32,
    /// Materials uploaded
    pub materials: u32,
}

impl BufferCounts {
    /// Count for one buffer
    pub const fn get(&self, kind: BufferKind) -> u32 {
        match kind {
            BufferKind::Vertex => self.vertices,
            BufferKind::Index => self.indices,
            BufferKind::Instance => self.objects,
            BufferKind::Indirect => self.draws,
            BufferKind::Material => self.materials,
            BufferKind::Staging => 0,
        }
    }

    /// Counts once `pending` is uploaded on top of these
    #[must_use]
    pub fn with_pending(&self, pending: &PendingBatch) -> Self {
        Self {
            vertices: self.vertices + pending.vertices.len() as u32,
            indices: self.indices + pending.indices.len() as u32,
            objects: self.objects + pending.objects.len() as u32,
            draws: self.draws + pending.draws.len() as u32,
            materials: self.materials + pending.materials.len() as u32,
        }
    }
}
