//! GPU-facing layer: record layouts, the device seam and the shared buffer pool

mod data;
mod device;
mod headless;
mod resource_pool;

pub use data::{DrawCommand, DrawCullData, GpuMaterial, ObjectData, Vertex};
pub use device::{BufferHandle, BufferUsage, GpuDevice, MemoryResidency};
pub use headless::{HeadlessDevice, UploadRecord};
pub use resource_pool::{BufferKind, GpuResourcePool, PooledBuffer};
