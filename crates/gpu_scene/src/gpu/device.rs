//! Device abstraction consumed by the resource pool
//!
//! The scene core never talks to a graphics API directly. Buffer creation,
//! destruction and transfers go through [`GpuDevice`], which a Vulkan or
//! headless backend implements.

use bitflags::bitflags;

use crate::error::SceneResult;

/// Opaque handle to a device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

bitflags! {
    /// How a buffer will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex input
        const VERTEX = 1 << 0;
        /// Index input
        const INDEX = 1 << 1;
        /// Shader storage
        const STORAGE = 1 << 2;
        /// Indirect draw arguments
        const INDIRECT = 1 << 3;
        /// Source of transfers
        const TRANSFER_SRC = 1 << 4;
        /// Destination of transfers
        const TRANSFER_DST = 1 << 5;
    }
}

/// Where buffer memory lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryResidency {
    /// Device-local, written only through transfers
    DeviceLocal,
    /// Host-visible, mapped for CPU writes
    HostVisible,
}

/// Buffer allocation and transfer interface
pub trait GpuDevice {
    /// Create a buffer of `size` bytes
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        size: u64,
        residency: MemoryResidency,
    ) -> SceneResult<BufferHandle>;

    /// Destroy a buffer; unknown handles are ignored
    fn destroy_buffer(&mut self, handle: BufferHandle);

    /// Queue a host-to-device transfer of `data` into `dest` at `dest_offset`,
    /// staged through `staging`
    fn upload_buffer(
        &mut self,
        staging: BufferHandle,
        dest: BufferHandle,
        dest_offset: u64,
        data: &[u8],
    ) -> SceneResult<()>;

    /// Queue a device-side copy of the first `size` bytes of `src` into `dst`
    fn copy_buffer(&mut self, src: BufferHandle, dst: BufferHandle, size: u64) -> SceneResult<()>;
}
