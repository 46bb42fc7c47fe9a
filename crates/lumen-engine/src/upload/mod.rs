//! CPU-written, GPU-read buffers.

mod buffer;

pub use buffer::{constant_buffer_byte_size, element_stride, ElementKind, UploadBuffer};
