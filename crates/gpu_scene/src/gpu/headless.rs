//! CPU-backed device
//!
//! Stores buffer contents in host memory and records every transfer. Used by
//! tests and the headless demo, and as a reference for real backends.

use std::collections::HashMap;

use crate::error::{SceneError, SceneResult};
use super::device::{BufferHandle, BufferUsage, GpuDevice, MemoryResidency};

/// One recorded upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRecord {
    /// Staging buffer used
    pub staging: BufferHandle,
    /// Destination buffer
    pub dest: BufferHandle,
    /// Byte offset in the destination
    pub dest_offset: u64,
    /// Bytes transferred
    pub size: u64,
}

#[derive(Debug)]
struct HeadlessBuffer {
    label: String,
    usage: BufferUsage,
    residency: MemoryResidency,
    data: Vec<u8>,
}

/// Device that keeps every buffer in a `Vec<u8>`
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    buffers: HashMap<BufferHandle, HeadlessBuffer>,
    next_handle: u64,
    uploads: Vec<UploadRecord>,
    copies: usize,
}

impl HeadlessDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a live buffer
    pub fn buffer_data(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&handle).map(|b| b.data.as_slice())
    }

    /// Size of a live buffer in bytes
    pub fn buffer_size(&self, handle: BufferHandle) -> Option<u64> {
        self.buffers.get(&handle).map(|b| b.data.len() as u64)
    }

    /// Label given at creation
    pub fn buffer_label(&self, handle: BufferHandle) -> Option<&str> {
        self.buffers.get(&handle).map(|b| b.label.as_str())
    }

    /// Usage given at creation
    pub fn buffer_usage(&self, handle: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(&handle).map(|b| b.usage)
    }

    /// Residency given at creation
    pub fn buffer_residency(&self, handle: BufferHandle) -> Option<MemoryResidency> {
        self.buffers.get(&handle).map(|b| b.residency)
    }

    /// True if the handle refers to a live buffer
    pub fn is_live(&self, handle: BufferHandle) -> bool {
        self.buffers.contains_key(&handle)
    }

    /// Number of live buffers
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Every upload so far, oldest first
    pub fn uploads(&self) -> &[UploadRecord] {
        &self.uploads
    }

    /// Uploads that targeted one buffer
    pub fn uploads_to(&self, dest: BufferHandle) -> impl Iterator<Item = &UploadRecord> {
        self.uploads.iter().filter(move |u| u.dest == dest)
    }

    /// Number of device-side copies
    pub const fn copy_count(&self) -> usize {
        self.copies
    }

    fn buffer_mut(&mut self, handle: BufferHandle) -> SceneResult<&mut HeadlessBuffer> {
        self.buffers
            .get_mut(&handle)
            .ok_or_else(|| SceneError::Device(format!("unknown buffer {handle:?}")))
    }

    fn check_range(buffer: &HeadlessBuffer, offset: u64, size: u64) -> SceneResult<()> {
        let end = offset.checked_add(size).unwrap_or(u64::MAX);
        if end > buffer.data.len() as u64 {
            return Err(SceneError::Device(format!(
                "transfer of {size} bytes at offset {offset} overruns '{}' ({} bytes)",
                buffer.label,
                buffer.data.len()
            )));
        }
        Ok(())
    }
}

impl GpuDevice for HeadlessDevice {
    fn create_buffer(
        &mut self,
        label: &str,
        usage: BufferUsage,
        size: u64,
        residency: MemoryResidency,
    ) -> SceneResult<BufferHandle> {
        let size = usize::try_from(size)
            .map_err(|_| SceneError::Device(format!("buffer '{label}' size {size} too large")))?;

        self.next_handle += 1;
        let handle = BufferHandle(self.next_handle);
        self.buffers.insert(
            handle,
            HeadlessBuffer {
                label: label.to_string(),
                usage,
                residency,
                data: vec![0; size],
            },
        );
        log::trace!("Created buffer '{label}' ({size} bytes) as {handle:?}");
        Ok(handle)
    }

    fn destroy_buffer(&mut self, handle: BufferHandle) {
        if self.buffers.remove(&handle).is_none() {
            log::warn!("Destroy of unknown buffer {handle:?} ignored");
        }
    }

    fn upload_buffer(
        &mut self,
        staging: BufferHandle,
        dest: BufferHandle,
        dest_offset: u64,
        data: &[u8],
    ) -> SceneResult<()> {
        let size = data.len() as u64;

        let staging_buffer = self.buffer_mut(staging)?;
        Self::check_range(staging_buffer, 0, size)?;
        staging_buffer.data[..data.len()].copy_from_slice(data);

        let dest_buffer = self.buffer_mut(dest)?;
        Self::check_range(dest_buffer, dest_offset, size)?;
        let start = dest_offset as usize;
        dest_buffer.data[start..start + data.len()].copy_from_slice(data);

        self.uploads.push(UploadRecord {
            staging,
            dest,
            dest_offset,
            size,
        });
        Ok(())
    }

    fn copy_buffer(&mut self, src: BufferHandle, dst: BufferHandle, size: u64) -> SceneResult<()> {
        let source = self
            .buffers
            .get(&src)
            .ok_or_else(|| SceneError::Device(format!("unknown buffer {src:?}")))?;
        Self::check_range(source, 0, size)?;
        let bytes = source.data[..size as usize].to_vec();

        let dest_buffer = self.buffer_mut(dst)?;
        Self::check_range(dest_buffer, 0, size)?;
        dest_buffer.data[..bytes.len()].copy_from_slice(&bytes);

        self.copies += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(device: &mut HeadlessDevice, size: u64) -> BufferHandle {
        device
            .create_buffer("test", BufferUsage::STORAGE, size, MemoryResidency::DeviceLocal)
            .unwrap()
    }

    #[test]
    fn test_upload_writes_destination_and_records() {
        let mut device = HeadlessDevice::new();
        let staging = create(&mut device, 16);
        let dest = create(&mut device, 32);

        device.upload_buffer(staging, dest, 8, &[1, 2, 3, 4]).unwrap();

        assert_eq!(&device.buffer_data(dest).unwrap()[8..12], &[1, 2, 3, 4]);
        assert_eq!(device.uploads().len(), 1);
        assert_eq!(device.uploads()[0].size, 4);
        assert_eq!(device.uploads_to(dest).count(), 1);
    }

    #[test]
    fn test_overrun_is_rejected_without_recording() {
        let mut device = HeadlessDevice::new();
        let staging = create(&mut device, 64);
        let dest = create(&mut device, 8);

        let result = device.upload_buffer(staging, dest, 4, &[0; 8]);

        assert!(matches!(result, Err(SceneError::Device(_))));
        assert!(device.uploads().is_empty());
    }

    #[test]
    fn test_staging_too_small_is_rejected() {
        let mut device = HeadlessDevice::new();
        let staging = create(&mut device, 2);
        let dest = create(&mut device, 8);

        assert!(device.upload_buffer(staging, dest, 0, &[0; 4]).is_err());
    }

    #[test]
    fn test_copy_and_destroy() {
        let mut device = HeadlessDevice::new();
        let staging = create(&mut device, 4);
        let a = create(&mut device, 4);
        let b = create(&mut device, 8);
        device.upload_buffer(staging, a, 0, &[9, 8, 7, 6]).unwrap();

        device.copy_buffer(a, b, 4).unwrap();
        device.destroy_buffer(a);

        assert_eq!(&device.buffer_data(b).unwrap()[..4], &[9, 8, 7, 6]);
        assert!(!device.is_live(a));
        assert_eq!(device.live_buffer_count(), 2);
        assert_eq!(device.copy_count(), 1);
    }
}
