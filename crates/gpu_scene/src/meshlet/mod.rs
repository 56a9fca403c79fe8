//! Meshlet builder
//!
//! Splits a triangle list into small clusters ("meshlets") with a bounded
//! number of unique vertices and triangles, then annotates each cluster with a
//! normal cone for cluster-level back-face rejection.
//!
//! ```text
//! indices ──► MeshletBuilder::build ──► Vec<Meshlet> ──► build_cones(positions)
//!                 greedy, one pass                         axis + cutoff per cluster
//! ```

use std::collections::HashMap;

use crate::foundation::math::Vec3;

/// Maximum unique vertices per meshlet
pub const MAX_MESHLET_VERTICES: usize = 64;

/// Maximum triangles per meshlet
pub const MAX_MESHLET_TRIANGLES: usize = 126;

/// Axis used when a cluster has no usable face normal
const FALLBACK_CONE_AXIS: [f32; 3] = [0.0, 0.0, 1.0];

/// A bounded triangle cluster
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Meshlet {
    /// Global vertex indices, addressed by local slot
    pub vertices: Vec<u32>,
    /// Local-slot triples, three per triangle
    pub triangles: Vec<u8>,
    /// Normal cone: xyz axis, w cutoff. `w == 1` means the cluster is never
    /// cone-culled.
    pub cone: [f32; 4],
}

impl Meshlet {
    /// Unique vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Triangle `index` as local slots
    pub fn local_triangle(&self, index: usize) -> Option<[u8; 3]> {
        let t = self.triangles.get(index * 3..index * 3 + 3)?;
        Some([t[0], t[1], t[2]])
    }

    /// Triangle `index` as global vertex indices
    pub fn triangle(&self, index: usize) -> Option<[u32; 3]> {
        let [a, b, c] = self.local_triangle(index)?;
        Some([
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ])
    }

    /// Every triangle as global vertex indices
    pub fn global_triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        (0..self.triangle_count()).filter_map(|i| self.triangle(i))
    }

    /// Cone axis
    pub fn cone_axis(&self) -> Vec3 {
        Vec3::new(self.cone[0], self.cone[1], self.cone[2])
    }

    /// Cone cutoff term
    pub const fn cone_cutoff(&self) -> f32 {
        self.cone[3]
    }
}

/// Greedy meshlet builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshletBuilder {
    max_vertices: usize,
    max_triangles: usize,
}

impl Default for MeshletBuilder {
    fn default() -> Self {
        Self {
            max_vertices: MAX_MESHLET_VERTICES,
            max_triangles: MAX_MESHLET_TRIANGLES,
        }
    }
}

impl MeshletBuilder {
    /// Builder with custom limits.
    ///
    /// Vertices are clamped to 3..=256 so local slots fit a byte and any
    /// triangle fits an empty cluster; triangles to at least 1.
    pub fn new(max_vertices: usize, max_triangles: usize) -> Self {
        Self {
            max_vertices: max_vertices.clamp(3, 256),
            max_triangles: max_triangles.max(1),
        }
    }

    /// Vertex limit
    pub const fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    /// Triangle limit
    pub const fn max_triangles(&self) -> usize {
        self.max_triangles
    }

    /// Partition a triangle list into meshlets.
    ///
    /// Triangles keep their input order, each appearing in exactly one
    /// meshlet. Trailing indices that do not form a triangle are ignored.
    pub fn build(&self, indices: &[u32]) -> Vec<Meshlet> {
        if indices.len() % 3 != 0 {
            log::warn!(
                "Index count {} is not a multiple of 3; ignoring {} trailing indices",
                indices.len(),
                indices.len() % 3
            );
        }

        let mut slots: HashMap<u32, u8> = HashMap::with_capacity(self.max_vertices);
        let mut meshlets = Vec::new();
        let mut current = Meshlet::default();

        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]];
            let new_vertices = usize::from(!slots.contains_key(&a))
                + usize::from(!slots.contains_key(&b) && b != a)
                + usize::from(!slots.contains_key(&c) && c != a && c != b);

            if current.vertex_count() + new_vertices > self.max_vertices
                || current.triangle_count() >= self.max_triangles
            {
                Self::emit(&mut current, &mut slots, &mut meshlets);
            }

            for &vertex in tri {
                let next = current.vertices.len() as u8;
                let slot = *slots.entry(vertex).or_insert_with(|| {
                    current.vertices.push(vertex);
                    next
                });
                current.triangles.push(slot);
            }
        }

        if current.triangle_count() > 0 {
            meshlets.push(current);
        }
        meshlets
    }

    /// Close the current cluster; slots only ever hold the open cluster's vertices
    fn emit(current: &mut Meshlet, slots: &mut HashMap<u32, u8>, meshlets: &mut Vec<Meshlet>) {
        slots.clear();
        meshlets.push(std::mem::take(current));
    }

    /// Compute the normal cone of every meshlet.
    ///
    /// Zero-area triangles are skipped; clusters without a usable normal get
    /// a fixed axis and a cutoff of 1.
    pub fn build_cones(&self, meshlets: &mut [Meshlet], positions: &[Vec3]) {
        for meshlet in meshlets {
            meshlet.cone = compute_cone(meshlet, positions);
        }
    }
}

fn compute_cone(meshlet: &Meshlet, positions: &[Vec3]) -> [f32; 4] {
    let normals: Vec<Vec3> = meshlet
        .global_triangles()
        .filter_map(|[a, b, c]| {
            let p0 = positions.get(a as usize)?;
            let p1 = positions.get(b as usize)?;
            let p2 = positions.get(c as usize)?;
            (p1 - p0).cross(&(p2 - p0)).try_normalize(f32::EPSILON)
        })
        .collect();

    let sum: Vec3 = normals.iter().sum();
    let Some(axis) = sum.try_normalize(f32::EPSILON) else {
        let [x, y, z] = FALLBACK_CONE_AXIS;
        return [x, y, z, 1.0];
    };

    let min_dot = normals
        .iter()
        .map(|n| n.dot(&axis))
        .fold(1.0_f32, f32::min);

    let cutoff = if min_dot <= 0.0 {
        1.0
    } else {
        (1.0 - min_dot * min_dot).max(0.0).sqrt()
    };

    [axis.x, axis.y, axis.z, cutoff]
}
