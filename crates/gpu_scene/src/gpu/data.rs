//! GPU record layouts
//!
//! Plain-old-data structs written verbatim into device buffers. Field order
//! and padding match the std430 layouts read by the culling and draw shaders.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{utils, Mat4, Vec3};
use crate::scene::Bounds;

/// Interleaved vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Texture coordinate U, packed next to the position
    pub uv_x: f32,
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinate V
    pub uv_y: f32,
    /// Vertex color
    pub color: [f32; 4],
}

impl Vertex {
    /// Vertex with position and normal, white, zero UV
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self {
            position,
            uv_x: 0.0,
            normal,
            uv_y: 0.0,
            color: [1.0; 4],
        }
    }

    /// Set texture coordinates
    #[must_use]
    pub const fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.uv_x = u;
        self.uv_y = v;
        self
    }

    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

/// Per-instance record: one per surface instance
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectData {
    /// World matrix, column-major
    pub world: [[f32; 4]; 4],
    /// World bounding sphere: xyz center, w radius
    pub sphere: [f32; 4],
    /// World half-extents; w unused
    pub extents: [f32; 4],
    /// Index into the material table
    pub material_index: u32,
    /// Padding to 16 bytes
    pub _pad: [u32; 3],
}

impl ObjectData {
    /// Build from a world matrix, world-space bounds and a material index
    pub fn new(world: &Mat4, world_bounds: &Bounds, material_index: u32) -> Self {
        let c = world_bounds.center;
        let e = world_bounds.extents;
        Self {
            world: utils::to_cols_array(world),
            sphere: [c.x, c.y, c.z, world_bounds.sphere_radius],
            extents: [e.x, e.y, e.z, 0.0],
            material_index,
            _pad: [0; 3],
        }
    }
}

/// Indexed indirect draw arguments plus the owning object id
///
/// The first five fields match `VkDrawIndexedIndirectCommand`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct DrawCommand {
    /// Indices to draw
    pub index_count: u32,
    /// Instances to draw; the GPU culling pass overwrites this
    pub instance_count: u32,
    /// First index in the shared index buffer
    pub first_index: u32,
    /// Added to each index before fetching a vertex
    pub vertex_offset: i32,
    /// First instance; equals the object index
    pub first_instance: u32,
    /// Object record this draw belongs to
    pub object_id: u32,
}

/// Material table entry
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    /// Base color factor
    pub base_color: [f32; 4],
    /// Emissive color in xyz, alpha cutoff in w
    pub emissive_cutoff: [f32; 4],
    /// Metallic factor
    pub metallic: f32,
    /// Roughness factor
    pub roughness: f32,
    /// [`MaterialFlags`](crate::assets::MaterialFlags) bits
    pub flags: u32,
    /// Padding to 16 bytes
    pub _pad: u32,
}

/// Per-frame parameters for the GPU culling pass
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawCullData {
    /// View matrix, column-major
    pub view: [[f32; 4]; 4],
    /// Projection scale term `P[0][0]`
    pub p00: f32,
    /// Projection scale term `P[1][1]`
    pub p11: f32,
    /// Near plane distance
    pub znear: f32,
    /// Far plane distance
    pub zfar: f32,
    /// Packed side planes: left/right x and z, top/bottom y and z
    pub frustum: [f32; 4],
    /// Number of draw commands to test
    pub draw_count: u32,
    /// Non-zero when frustum culling is on
    pub culling_enabled: u32,
    /// Non-zero when distance culling is on
    pub dist_cull: u32,
    /// Non-zero when instances are tested against the AABB below
    pub aabb_check: u32,
    /// World-space AABB minimum; w unused
    pub aabb_min: [f32; 4],
    /// World-space AABB maximum; w unused
    pub aabb_max: [f32; 4],
}
