//! GPU backend abstraction.
//!
//! The frame pipeline records [`CommandList`]s against typed handles and hands
//! them to a [`Backend`]. Two implementations exist:
//! - [`crate::device::Gpu`]: wgpu on a window surface
//! - [`HeadlessBackend`]: records and validates lists without a GPU; used by
//!   tests and the demo's `--headless` mode

mod desc;
mod headless;

pub use desc::{
    Binding, BindingKind, ComputePipelineDesc, PipelineKind, RenderPipelineDesc, ShaderSource,
    StorageAccess, TableDesc, TextureView,
};
pub use headless::{Completion, CompletionHandle, HeadlessBackend};

use crate::command::CommandList;
use crate::error::GpuResult;
use crate::resource::{BufferDesc, BufferId, MeshId, PipelineId, TableId, TextureDesc, TextureId};
use crate::scene::Vertex;
use crate::sync::Timeline;

/// Outcome of acquiring the next back buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    /// A back buffer is ready; record and present.
    Ready,
    /// The surface was reconfigured or timed out; present nothing this frame.
    Skip,
}

/// Device + queue + swap chain, addressed through typed handles.
///
/// All fallible calls return structured [`crate::error::GpuError`]s; the
/// pipeline treats every one of them as fatal.
pub trait Backend: Timeline {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Current swap-chain size in pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Texture handle of swap-chain image `index` (0 or 1).
    fn back_buffer(&self, index: usize) -> TextureId;

    fn create_texture(&mut self, desc: &TextureDesc) -> GpuResult<TextureId>;
    fn destroy_texture(&mut self, id: TextureId);

    fn create_buffer(&mut self, desc: &BufferDesc) -> GpuResult<BufferId>;
    fn destroy_buffer(&mut self, id: BufferId);

    /// Copies `data` into the buffer at `offset`. Ordered before the next
    /// [`Backend::execute`].
    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> GpuResult<()>;

    fn create_mesh(&mut self, label: &str, vertices: &[Vertex], indices: &[u32])
    -> GpuResult<MeshId>;

    fn create_render_pipeline(&mut self, desc: &RenderPipelineDesc<'_>) -> GpuResult<PipelineId>;
    fn create_compute_pipeline(&mut self, desc: &ComputePipelineDesc<'_>)
    -> GpuResult<PipelineId>;

    fn create_table(&mut self, desc: &TableDesc) -> GpuResult<TableId>;
    fn destroy_table(&mut self, id: TableId);

    /// Acquires the back buffer for this frame.
    fn begin_frame(&mut self) -> GpuResult<FrameStatus>;

    /// Submits a closed list to the queue.
    fn execute(&mut self, list: &CommandList) -> GpuResult<()>;

    /// Presents the back buffer acquired by [`Backend::begin_frame`].
    fn present(&mut self) -> GpuResult<()>;

    /// Resizes the swap chain. The caller must have drained the queue.
    fn resize_surface(&mut self, width: u32, height: u32) -> GpuResult<()>;
}
