//! Mesh assets and sub-mesh surfaces

use slotmap::new_key_type;

use crate::foundation::math::Vec3;
use crate::gpu::Vertex;
use crate::scene::Bounds;
use super::material::MaterialId;

new_key_type! {
    /// Key of a mesh registered with the scene manager
    pub struct MeshKey;
}

/// A contiguous index range drawn with one material
#[derive(Debug, Clone, PartialEq)]
pub struct GeoSurface {
    /// First index, relative to the mesh's own index array
    pub first_index: u32,
    /// Number of indices
    pub index_count: u32,
    /// Material, if any; unresolved materials draw with the default
    pub material: Option<MaterialId>,
    /// Object-space bounds of the vertices this range references
    pub bounds: Bounds,
}

impl GeoSurface {
    /// Surface over `indices[first_index..first_index + index_count]`
    pub fn from_range(
        vertices: &[Vertex],
        indices: &[u32],
        first_index: u32,
        index_count: u32,
        material: Option<MaterialId>,
    ) -> Self {
        let start = (first_index as usize).min(indices.len());
        let end = (start + index_count as usize).min(indices.len());
        let positions: Vec<Vec3> = indices[start..end]
            .iter()
            .filter_map(|&i| vertices.get(i as usize).map(Vertex::position))
            .collect();

        Self {
            first_index,
            index_count,
            material,
            bounds: Bounds::from_points(positions.iter()),
        }
    }
}

/// Geometry registered with the scene manager
///
/// Vertex and index arrays are CPU copies; they may be released once uploaded.
/// The offsets are assigned when the mesh is added to the shared buffers.
#[derive(Debug, Clone)]
pub struct MeshAsset {
    /// Unique name
    pub name: String,
    /// Vertices
    pub vertices: Vec<Vertex>,
    /// Triangle-list indices, relative to this mesh's first vertex
    pub indices: Vec<u32>,
    /// Sub-meshes
    pub surfaces: Vec<GeoSurface>,
    /// Object-space bounds of all vertices
    pub bounds: Bounds,
    /// First vertex in the shared vertex buffer
    pub vertex_offset: Option<u32>,
    /// First index in the shared index buffer
    pub index_offset: Option<u32>,
    vertex_count: u32,
    index_count: u32,
}

impl MeshAsset {
    /// Mesh with one surface covering every index
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let surface = GeoSurface::from_range(&vertices, &indices, 0, indices.len() as u32, None);
        Self::with_surfaces(name, vertices, indices, vec![surface])
    }

    /// Mesh with explicit surfaces
    pub fn with_surfaces(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        surfaces: Vec<GeoSurface>,
    ) -> Self {
        let positions: Vec<Vec3> = vertices.iter().map(Vertex::position).collect();
        Self {
            name: name.into(),
            bounds: Bounds::from_points(positions.iter()),
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
            vertices,
            indices,
            surfaces,
            vertex_offset: None,
            index_offset: None,
        }
    }

    /// Assign every surface a material
    #[must_use]
    pub fn with_material(mut self, material: MaterialId) -> Self {
        for surface in &mut self.surfaces {
            surface.material = Some(material);
        }
        self
    }

    /// Vertex count, still valid after CPU data is released
    pub const fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Index count, still valid after CPU data is released
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }

    /// True while the CPU arrays are present
    pub fn has_cpu_data(&self) -> bool {
        !self.vertices.is_empty() || self.vertex_count == 0
    }

    /// Drop the CPU vertex and index arrays
    pub fn release_cpu_data(&mut self) {
        self.vertices = Vec::new();
        self.indices = Vec::new();
    }

    /// Vertex positions
    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(Vertex::position).collect()
    }

    /// Axis-aligned box mesh with per-face normals
    pub fn cuboid(name: impl Into<String>, half_extents: Vec3) -> Self {
        let h = half_extents;
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([1.0, 0.0, 0.0], [[h.x, -h.y, -h.z], [h.x, h.y, -h.z], [h.x, h.y, h.z], [h.x, -h.y, h.z]]),
            ([-1.0, 0.0, 0.0], [[-h.x, -h.y, h.z], [-h.x, h.y, h.z], [-h.x, h.y, -h.z], [-h.x, -h.y, -h.z]]),
            ([0.0, 1.0, 0.0], [[-h.x, h.y, -h.z], [-h.x, h.y, h.z], [h.x, h.y, h.z], [h.x, h.y, -h.z]]),
            ([0.0, -1.0, 0.0], [[-h.x, -h.y, h.z], [-h.x, -h.y, -h.z], [h.x, -h.y, -h.z], [h.x, -h.y, h.z]]),
            ([0.0, 0.0, 1.0], [[-h.x, -h.y, h.z], [h.x, -h.y, h.z], [h.x, h.y, h.z], [-h.x, h.y, h.z]]),
            ([0.0, 0.0, -1.0], [[h.x, -h.y, -h.z], [-h.x, -h.y, -h.z], [-h.x, h.y, -h.z], [h.x, h.y, -h.z]]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in faces {
            let base = vertices.len() as u32;
            for (i, corner) in corners.into_iter().enumerate() {
                let u = if i == 1 || i == 2 { 1.0 } else { 0.0 };
                let v = if i >= 2 { 1.0 } else { 0.0 };
                vertices.push(Vertex::new(corner, normal).with_uv(u, v));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(name, vertices, indices)
    }

    /// Flat grid in the XZ plane with `cells * cells` quads
    pub fn grid(name: impl Into<String>, size: f32, cells: u32) -> Self {
        let cells = cells.max(1);
        let step = size / cells as f32;
        let half = size * 0.5;
        let row = cells + 1;

        let mut vertices = Vec::with_capacity((row * row) as usize);
        for z in 0..row {
            for x in 0..row {
                let position = [x as f32 * step - half, 0.0, z as f32 * step - half];
                vertices.push(
                    Vertex::new(position, [0.0, 1.0, 0.0])
                        .with_uv(x as f32 / cells as f32, z as f32 / cells as f32),
                );
            }
        }

        let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
        for z in 0..cells {
            for x in 0..cells {
                let i = z * row + x;
                indices.extend_from_slice(&[i, i + row, i + 1, i + 1, i + row, i + row + 1]);
            }
        }

        Self::new(name, vertices, indices)
    }
}
