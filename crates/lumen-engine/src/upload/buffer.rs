use std::marker::PhantomData;
use std::ops::Range;

use bytemuck::Pod;

use crate::backend::Backend;
use crate::error::GpuResult;
use crate::resource::{BufferDesc, BufferId, BufferUsage};

/// Constant-buffer windows must start on this boundary.
pub const CONSTANT_ALIGNMENT: usize = 256;

/// How elements of an [`UploadBuffer`] are addressed by shaders.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ElementKind {
    /// Each element is bound on its own through a dynamic offset.
    Constant,
    /// The whole buffer is one structured array.
    Structured,
}

/// Rounds `size` up to the next multiple of 256.
pub const fn constant_buffer_byte_size(size: usize) -> usize {
    (size + CONSTANT_ALIGNMENT - 1) & !(CONSTANT_ALIGNMENT - 1)
}

/// Distance in bytes between consecutive elements.
pub const fn element_stride(kind: ElementKind, size: usize) -> usize {
    match kind {
        ElementKind::Constant => constant_buffer_byte_size(size),
        ElementKind::Structured => size,
    }
}

/// Fixed-count array of `T` written by the CPU and read by the GPU.
///
/// The CPU copy stays valid for the buffer's lifetime. Writes are staged and
/// reach the GPU on [`UploadBuffer::flush`]; the owner must only write while
/// the GPU is not reading this buffer.
pub struct UploadBuffer<T: Pod> {
    buffer: BufferId,
    kind: ElementKind,
    stride: usize,
    count: usize,
    bytes: Vec<u8>,
    dirty: Option<Range<usize>>,
    _marker: PhantomData<T>,
}

impl<T: Pod> UploadBuffer<T> {
    pub fn new<B: Backend + ?Sized>(
        backend: &mut B,
        label: &str,
        count: usize,
        kind: ElementKind,
    ) -> GpuResult<Self> {
        assert!(count > 0, "upload buffer `{label}` needs at least one element");
        let stride = element_stride(kind, size_of::<T>());
        let size = stride * count;

        let buffer = backend.create_buffer(&BufferDesc {
            label: label.to_string(),
            size: size as u64,
            usage: match kind {
                ElementKind::Constant => BufferUsage::Constant,
                ElementKind::Structured => BufferUsage::Structured,
            },
        })?;

        log::debug!("upload buffer `{label}`: {count} x {stride} bytes");

        Ok(Self {
            buffer,
            kind,
            stride,
            count,
            bytes: vec![0; size],
            dirty: None,
            _marker: PhantomData,
        })
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Byte offset of element `index`; the dynamic offset for constants.
    pub fn byte_offset(&self, index: usize) -> usize {
        self.check(index);
        index * self.stride
    }

    /// Copies `value` into element `index`.
    pub fn write(&mut self, index: usize, value: &T) {
        let start = self.byte_offset(index);
        let end = start + size_of::<T>();
        self.bytes[start..end].copy_from_slice(bytemuck::bytes_of(value));

        self.dirty = Some(match self.dirty.take() {
            Some(r) => r.start.min(start)..r.end.max(end),
            None => start..end,
        });
    }

    /// Reads back the CPU copy of element `index`.
    pub fn read(&self, index: usize) -> T {
        let start = self.byte_offset(index);
        bytemuck::pod_read_unaligned(&self.bytes[start..start + size_of::<T>()])
    }

    /// Sends all writes since the last flush to the GPU buffer.
    pub fn flush<B: Backend + ?Sized>(&mut self, backend: &mut B) -> GpuResult<()> {
        let Some(range) = self.dirty.take() else { return Ok(()) };
        backend.write_buffer(self.buffer, range.start as u64, &self.bytes[range])
    }

    fn check(&self, index: usize) {
        assert!(
            index < self.count,
            "upload buffer index {index} out of range (count {})",
            self.count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Completion, HeadlessBackend};

    #[test]
    fn constant_stride_rounds_to_256() {
        assert_eq!(element_stride(ElementKind::Constant, 4), 256);
        assert_eq!(element_stride(ElementKind::Constant, 256), 256);
        assert_eq!(element_stride(ElementKind::Constant, 257), 512);
        assert_eq!(element_stride(ElementKind::Structured, 64), 64);
    }

    #[test]
    fn writes_land_at_stride_offsets_after_flush() {
        let mut backend = HeadlessBackend::new(4, 4, Completion::Immediate);
        let mut buf = UploadBuffer::<[u32; 2]>::new(&mut backend, "consts", 3, ElementKind::Constant)
            .unwrap();
        assert_eq!(buf.stride(), 256);

        buf.write(2, &[7, 9]);
        assert_eq!(buf.read(2), [7, 9]);
        buf.flush(&mut backend).unwrap();

        let bytes = backend.buffer_bytes(buf.buffer()).unwrap();
        assert_eq!(bytes.len(), 768);
        assert_eq!(bytemuck::pod_read_unaligned::<[u32; 2]>(&bytes[512..520]), [7, 9]);
        assert!(bytes[..512].iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_write_panics() {
        let mut backend = HeadlessBackend::new(4, 4, Completion::Immediate);
        let mut buf =
            UploadBuffer::<u32>::new(&mut backend, "s", 2, ElementKind::Structured).unwrap();
        buf.write(2, &1);
    }
}
