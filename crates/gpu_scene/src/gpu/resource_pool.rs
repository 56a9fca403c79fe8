//! GPU Resource Pool
//!
//! Owns the shared device buffers every scene draws from: vertices, indices,
//! per-instance object records, indirect draw commands and the material
//! table, plus one staging buffer that feeds all transfers.
//!
//! # Architecture
//!
//! ```text
//! GpuResourcePool
//!         ├── vertex    (VERTEX | STORAGE)
//!         ├── index     (INDEX)
//!         ├── instance  (STORAGE)          ObjectData records
//!         ├── indirect  (INDIRECT|STORAGE) DrawCommand records
//!         ├── material  (STORAGE)          GpuMaterial records
//!         └── staging   (TRANSFER_SRC, host-visible)
//! ```
//!
//! Buffers grow by reallocate-and-recopy. Each reallocation bumps the
//! buffer's generation; a [`PooledBuffer`] captured before the bump is stale.

use std::fmt;
use std::mem::size_of;

use crate::config::{BufferGrowthPolicy, SceneConfig};
use crate::error::{SceneError, SceneResult};
use super::data::{DrawCommand, GpuMaterial, ObjectData, Vertex};
use super::device::{BufferHandle, BufferUsage, GpuDevice, MemoryResidency};

/// The data-bearing pool buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Shared vertex buffer
    Vertex,
    /// Shared index buffer
    Index,
    /// Per-instance object records
    Instance,
    /// Indirect draw commands
    Indirect,
    /// Material table
    Material,
    /// Transfer staging buffer
    Staging,
}

impl BufferKind {
    /// Every data-bearing kind, staging excluded
    pub const DATA: [Self; 5] = [
        Self::Vertex,
        Self::Index,
        Self::Instance,
        Self::Indirect,
        Self::Material,
    ];

    /// Size of one element in bytes
    pub const fn stride(self) -> u64 {
        (match self {
            Self::Vertex => size_of::<Vertex>(),
            Self::Index => size_of::<u32>(),
            Self::Instance => size_of::<ObjectData>(),
            Self::Indirect => size_of::<DrawCommand>(),
            Self::Material => size_of::<GpuMaterial>(),
            Self::Staging => 1,
        }) as u64
    }

    const fn usage(self) -> BufferUsage {
        match self {
            Self::Vertex => BufferUsage::VERTEX
                .union(BufferUsage::STORAGE)
                .union(BufferUsage::TRANSFER_DST)
                .union(BufferUsage::TRANSFER_SRC),
            Self::Index => BufferUsage::INDEX
                .union(BufferUsage::TRANSFER_DST)
                .union(BufferUsage::TRANSFER_SRC),
            Self::Instance | Self::Material => BufferUsage::STORAGE
                .union(BufferUsage::TRANSFER_DST)
                .union(BufferUsage::TRANSFER_SRC),
            Self::Indirect => BufferUsage::INDIRECT
                .union(BufferUsage::STORAGE)
                .union(BufferUsage::TRANSFER_DST)
                .union(BufferUsage::TRANSFER_SRC),
            Self::Staging => BufferUsage::TRANSFER_SRC,
        }
    }

    const fn residency(self) -> MemoryResidency {
        match self {
            Self::Staging => MemoryResidency::HostVisible,
            _ => MemoryResidency::DeviceLocal,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Index => "index",
            Self::Instance => "instance",
            Self::Indirect => "indirect",
            Self::Material => "material",
            Self::Staging => "staging",
        }
    }
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A pool buffer and its bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PooledBuffer {
    /// Device handle; replaced on growth
    pub handle: BufferHandle,
    /// Capacity in bytes
    pub capacity: u64,
    /// Bumped on every reallocation
    pub generation: u32,
}

impl PooledBuffer {
    /// Capacity in elements of `kind`
    pub const fn element_capacity(&self, kind: BufferKind) -> u64 {
        self.capacity / kind.stride()
    }
}

/// Shared scene buffers plus staging
#[derive(Debug)]
pub struct GpuResourcePool {
    buffers: [PooledBuffer; 6],
    growth: BufferGrowthPolicy,
}

impl GpuResourcePool {
    /// Create all buffers with the capacities in `config`.
    ///
    /// Staging is sized to the largest data-bearing buffer.
    pub fn new(device: &mut impl GpuDevice, config: &SceneConfig) -> SceneResult<Self> {
        let counts = [
            (BufferKind::Vertex, config.max_vertices),
            (BufferKind::Index, config.max_indices),
            (BufferKind::Instance, config.max_objects),
            (BufferKind::Indirect, config.max_objects),
            (BufferKind::Material, config.max_materials),
        ];

        let mut created: Vec<PooledBuffer> = Vec::with_capacity(6);
        for (kind, count) in counts {
            let size = u64::from(count) * kind.stride();
            match create(device, kind, size) {
                Ok(buffer) => created.push(buffer),
                Err(err) => {
                    for buffer in created {
                        device.destroy_buffer(buffer.handle);
                    }
                    return Err(err);
                }
            }
        }

        let staging_size = created.iter().map(|b| b.capacity).max().unwrap_or(0);
        match create(device, BufferKind::Staging, staging_size) {
            Ok(buffer) => created.push(buffer),
            Err(err) => {
                for buffer in created {
                    device.destroy_buffer(buffer.handle);
                }
                return Err(err);
            }
        }

        let buffers: [PooledBuffer; 6] = created
            .try_into()
            .map_err(|_| SceneError::Device("pool buffer count mismatch".to_string()))?;

        log::info!(
            "GPU resource pool created: {} vertices, {} indices, {} objects, {} materials, {} byte staging",
            config.max_vertices,
            config.max_indices,
            config.max_objects,
            config.max_materials,
            staging_size
        );

        Ok(Self {
            buffers,
            growth: config.growth,
        })
    }

    /// Buffer of one kind
    pub const fn buffer(&self, kind: BufferKind) -> &PooledBuffer {
        &self.buffers[kind as usize]
    }

    /// Device handle of one kind
    pub const fn handle(&self, kind: BufferKind) -> BufferHandle {
        self.buffer(kind).handle
    }

    /// Make `kind` hold at least `required_bytes`, keeping the first
    /// `used_bytes` of its contents.
    pub fn ensure_capacity(
        &mut self,
        device: &mut impl GpuDevice,
        kind: BufferKind,
        required_bytes: u64,
        used_bytes: u64,
    ) -> SceneResult<()> {
        let current = self.buffers[kind as usize];
        if required_bytes <= current.capacity {
            return Ok(());
        }
        if !self.growth.enabled {
            log::error!(
                "{kind} buffer overflow: {required_bytes} bytes required, {} available",
                current.capacity
            );
            return Err(SceneError::CapacityExceeded {
                buffer: kind,
                required: required_bytes,
                capacity: current.capacity,
            });
        }

        let new_capacity = self.growth.grown_capacity(current.capacity, required_bytes);
        let mut grown = create(device, kind, new_capacity)?;
        let keep = used_bytes.min(current.capacity);
        if keep > 0 && kind != BufferKind::Staging {
            if let Err(err) = device.copy_buffer(current.handle, grown.handle, keep) {
                device.destroy_buffer(grown.handle);
                return Err(err);
            }
        }
        device.destroy_buffer(current.handle);

        grown.generation = current.generation.wrapping_add(1);
        self.buffers[kind as usize] = grown;

        log::info!(
            "Grew {kind} buffer from {} to {} bytes (generation {})",
            current.capacity,
            new_capacity,
            grown.generation
        );
        Ok(())
    }

    /// Grow the vertex buffer to hold `count` vertices
    pub fn ensure_vertex_capacity(&mut self, device: &mut impl GpuDevice, count: u64, used: u64) -> SceneResult<()> {
        self.ensure_elements(device, BufferKind::Vertex, count, used)
    }

    /// Grow the index buffer to hold `count` indices
    pub fn ensure_index_capacity(&mut self, device: &mut impl GpuDevice, count: u64, used: u64) -> SceneResult<()> {
        self.ensure_elements(device, BufferKind::Index, count, used)
    }

    /// Grow the instance buffer to hold `count` object records
    pub fn ensure_instance_capacity(&mut self, device: &mut impl GpuDevice, count: u64, used: u64) -> SceneResult<()> {
        self.ensure_elements(device, BufferKind::Instance, count, used)
    }

    /// Grow the indirect buffer to hold `count` draw commands
    pub fn ensure_indirect_capacity(&mut self, device: &mut impl GpuDevice, count: u64, used: u64) -> SceneResult<()> {
        self.ensure_elements(device, BufferKind::Indirect, count, used)
    }

    /// Grow the material table to hold `count` materials
    pub fn ensure_material_capacity(&mut self, device: &mut impl GpuDevice, count: u64, used: u64) -> SceneResult<()> {
        self.ensure_elements(device, BufferKind::Material, count, used)
    }

    /// Grow staging to hold `bytes`; staging contents are never preserved
    pub fn ensure_staging_capacity(&mut self, device: &mut impl GpuDevice, bytes: u64) -> SceneResult<()> {
        self.ensure_capacity(device, BufferKind::Staging, bytes, 0)
    }

    fn ensure_elements(
        &mut self,
        device: &mut impl GpuDevice,
        kind: BufferKind,
        count: u64,
        used: u64,
    ) -> SceneResult<()> {
        self.ensure_capacity(device, kind, count * kind.stride(), used * kind.stride())
    }

    /// Upload `data` into `kind` at element offset `first_element` via staging.
    ///
    /// The destination must already be large enough; staging grows on demand.
    pub fn upload<T: bytemuck::Pod>(
        &mut self,
        device: &mut impl GpuDevice,
        kind: BufferKind,
        first_element: u64,
        data: &[T],
    ) -> SceneResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let offset = first_element * kind.stride();
        let end = offset + bytes.len() as u64;

        let dest = self.buffers[kind as usize];
        if end > dest.capacity {
            return Err(SceneError::CapacityExceeded {
                buffer: kind,
                required: end,
                capacity: dest.capacity,
            });
        }

        self.ensure_staging_capacity(device, bytes.len() as u64)?;
        device.upload_buffer(self.handle(BufferKind::Staging), dest.handle, offset, bytes)?;

        log::debug!("Uploaded {} bytes to {kind} buffer at offset {offset}", bytes.len());
        Ok(())
    }

    /// Destroy every buffer
    pub fn destroy(self, device: &mut impl GpuDevice) {
        for buffer in self.buffers {
            device.destroy_buffer(buffer.handle);
        }
    }
}

fn create(device: &mut impl GpuDevice, kind: BufferKind, size: u64) -> SceneResult<PooledBuffer> {
    let handle = device.create_buffer(kind.label(), kind.usage(), size, kind.residency())?;
    Ok(PooledBuffer {
        handle,
        capacity: size,
        generation: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessDevice;

    fn small_config() -> SceneConfig {
        SceneConfig::default()
            .with_geometry_capacity(4, 6)
            .with_max_objects(2)
            .with_max_materials(2)
    }

    #[test]
    fn test_pool_creates_six_buffers_with_config_capacity() {
        let mut device = HeadlessDevice::new();
        let pool = GpuResourcePool::new(&mut device, &small_config()).unwrap();

        assert_eq!(device.live_buffer_count(), 6);
        assert_eq!(pool.buffer(BufferKind::Vertex).element_capacity(BufferKind::Vertex), 4);
        assert_eq!(pool.buffer(BufferKind::Index).capacity, 24);
        let largest = BufferKind::DATA.iter().map(|k| pool.buffer(*k).capacity).max().unwrap();
        assert_eq!(pool.buffer(BufferKind::Staging).capacity, largest);
        assert_eq!(
            device.buffer_residency(pool.handle(BufferKind::Staging)),
            Some(MemoryResidency::HostVisible)
        );
    }

    #[test]
    fn test_growth_preserves_contents_and_bumps_generation() {
        let mut device = HeadlessDevice::new();
        let mut pool = GpuResourcePool::new(&mut device, &small_config()).unwrap();
        pool.upload(&mut device, BufferKind::Index, 0, &[1u32, 2, 3]).unwrap();
        let old = *pool.buffer(BufferKind::Index);

        pool.ensure_index_capacity(&mut device, 10, 3).unwrap();
        let grown = *pool.buffer(BufferKind::Index);

        assert_eq!(grown.generation, old.generation + 1);
        assert_ne!(grown.handle, old.handle);
        assert!(!device.is_live(old.handle));
        assert_eq!(grown.capacity, 48);
        let data = device.buffer_data(grown.handle).unwrap();
        let indices: Vec<u32> = data[..12]
            .chunks_exact(4)
            .map(|b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_growth_uses_geometric_factor() {
        let mut device = HeadlessDevice::new();
        let mut pool = GpuResourcePool::new(&mut device, &small_config()).unwrap();

        pool.ensure_index_capacity(&mut device, 7, 0).unwrap();

        assert_eq!(pool.buffer(BufferKind::Index).capacity, 48);
    }

    #[test]
    fn test_fixed_capacity_overflow_is_an_error() {
        let mut device = HeadlessDevice::new();
        let config = small_config().with_growth(BufferGrowthPolicy::fixed());
        let mut pool = GpuResourcePool::new(&mut device, &config).unwrap();

        let err = pool.ensure_vertex_capacity(&mut device, 5, 0).unwrap_err();

        assert!(matches!(
            err,
            SceneError::CapacityExceeded { buffer: BufferKind::Vertex, .. }
        ));
        assert_eq!(pool.buffer(BufferKind::Vertex).generation, 0);
    }

    #[test]
    fn test_upload_past_capacity_fails_before_transfer() {
        let mut device = HeadlessDevice::new();
        let mut pool = GpuResourcePool::new(&mut device, &small_config()).unwrap();

        let result = pool.upload(&mut device, BufferKind::Index, 4, &[0u32; 3]);

        assert!(result.is_err());
        assert!(device.uploads().is_empty());
    }

    #[test]
    fn test_destroy_releases_everything() {
        let mut device = HeadlessDevice::new();
        let pool = GpuResourcePool::new(&mut device, &small_config()).unwrap();
        pool.destroy(&mut device);
        assert_eq!(device.live_buffer_count(), 0);
    }
}
