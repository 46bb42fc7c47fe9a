use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::command::{CommandList, StateValidator};
use crate::error::{ErrorCode, GpuError, GpuResult};
use crate::resource::{
    Arena, BufferDesc, BufferId, Format, MeshId, PipelineId, ResourceState, TableId, TextureDesc,
    TextureId, TextureUsage,
};
use crate::scene::Vertex;
use crate::sync::{Fence, FenceCompleter, FenceValue, Timeline};

use super::{
    Backend, ComputePipelineDesc, FrameStatus, RenderPipelineDesc, TableDesc,
};

/// When signals enqueued on a [`HeadlessBackend`] complete.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Completion {
    /// Every signal completes as soon as it is enqueued.
    Immediate,
    /// Signals stay pending until released through a [`CompletionHandle`].
    Manual,
}

/// Thread-safe access to the pending signals of a manual backend.
///
/// Plays the role of the GPU: releasing a signal is the simulated queue
/// reaching that point.
#[derive(Debug, Clone, Default)]
pub struct CompletionHandle {
    pending: Arc<Mutex<Vec<(FenceCompleter, FenceValue)>>>,
}

impl CompletionHandle {
    /// Number of signals not yet released.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Releases the oldest pending signal. Returns its value.
    pub fn complete_next(&self) -> Option<FenceValue> {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return None;
        }
        let (completer, value) = pending.remove(0);
        completer.complete(value);
        Some(value)
    }

    /// Releases every pending signal in submission order.
    pub fn complete_all(&self) {
        let drained: Vec<_> = self.pending.lock().drain(..).collect();
        for (completer, value) in drained {
            completer.complete(value);
        }
    }
}

#[derive(Debug)]
struct HeadlessBuffer {
    desc: BufferDesc,
    bytes: Vec<u8>,
}

/// GPU-less backend.
///
/// Resources are bookkeeping entries; buffer writes land in CPU memory.
/// Every executed list is validated against tracked resource states and kept
/// for inspection.
#[derive(Debug)]
pub struct HeadlessBackend {
    completion: Completion,
    handle: CompletionHandle,
    size: (u32, u32),

    textures: Arena<TextureId, TextureDesc>,
    buffers: Arena<BufferId, HeadlessBuffer>,
    meshes: Arena<MeshId, (usize, usize)>,
    pipelines: Arena<PipelineId, String>,
    tables: Arena<TableId, TableDesc>,
    back_buffers: [TextureId; 2],

    validator: StateValidator,
    executed: Vec<CommandList>,
    frame_acquired: bool,
    presents: u64,
    textures_created: u64,
    skip_frames: u32,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32, completion: Completion) -> Self {
        let mut textures = Arena::new();
        let mut validator = StateValidator::new();
        let back_buffers = [0, 1].map(|i| {
            let id = textures.insert(back_buffer_desc(i, width, height));
            validator.track_texture(id, ResourceState::Present);
            id
        });

        Self {
            completion,
            handle: CompletionHandle::default(),
            size: (width, height),
            textures,
            buffers: Arena::new(),
            meshes: Arena::new(),
            pipelines: Arena::new(),
            tables: Arena::new(),
            back_buffers,
            validator,
            executed: Vec::new(),
            frame_acquired: false,
            presents: 0,
            textures_created: 0,
            skip_frames: 0,
        }
    }

    /// Makes the next `n` calls to `begin_frame` report [`FrameStatus::Skip`].
    pub fn skip_next_frames(&mut self, n: u32) {
        self.skip_frames = n;
    }

    pub fn completion_handle(&self) -> CompletionHandle {
        self.handle.clone()
    }

    /// Lists executed so far, in submission order.
    pub fn executed(&self) -> &[CommandList] {
        &self.executed
    }

    pub fn take_executed(&mut self) -> Vec<CommandList> {
        std::mem::take(&mut self.executed)
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Textures created since construction (back buffers excluded).
    pub fn textures_created(&self) -> u64 {
        self.textures_created
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn texture_desc(&self, id: TextureId) -> Option<&TextureDesc> {
        self.textures.get(id)
    }

    /// Validator view of a texture's state after everything executed so far.
    pub fn texture_state(&self, id: TextureId) -> Option<ResourceState> {
        self.validator.state(id)
    }

    pub fn buffer_bytes(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(id).map(|b| b.bytes.as_slice())
    }

    fn missing(operation: &'static str, what: impl std::fmt::Debug) -> GpuError {
        GpuError::new(ErrorCode::Validation, operation).with_detail(format!("unknown {what:?}"))
    }
}

fn back_buffer_desc(index: usize, width: u32, height: u32) -> TextureDesc {
    TextureDesc::d2(
        format!("back buffer {index}"),
        Format::Surface,
        width,
        height,
        TextureUsage::RENDER_TARGET,
        ResourceState::Present,
    )
}

impl Timeline for HeadlessBackend {
    fn enqueue_signal(&mut self, completer: FenceCompleter, value: FenceValue) -> GpuResult<()> {
        match self.completion {
            Completion::Immediate => completer.complete(value),
            Completion::Manual => self.handle.pending.lock().push((completer, value)),
        }
        Ok(())
    }

    fn drive(&self, _fence: &Fence, value: FenceValue, _timeout: Option<Duration>) -> GpuResult<()> {
        log::debug!(
            "headless: waiting for {value} ({} signals pending)",
            self.handle.pending()
        );
        Ok(())
    }
}

impl Backend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn back_buffer(&self, index: usize) -> TextureId {
        self.back_buffers[index % 2]
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> GpuResult<TextureId> {
        if desc.width == 0 || desc.height == 0 || desc.mip_levels == 0 {
            return Err(GpuError::new(ErrorCode::Validation, "create_texture")
                .with_detail(format!("`{}` has an empty extent", desc.label)));
        }
        let id = self.textures.insert(desc.clone());
        self.validator.track_texture(id, desc.initial_state);
        self.textures_created += 1;
        Ok(id)
    }

    fn destroy_texture(&mut self, id: TextureId) {
        self.textures.remove(id);
        self.validator.forget_texture(id);
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> GpuResult<BufferId> {
        Ok(self.buffers.insert(HeadlessBuffer {
            desc: desc.clone(),
            bytes: vec![0; desc.size as usize],
        }))
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.buffers.remove(id);
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> GpuResult<()> {
        let buffer = self
            .buffers
            .get_mut(id)
            .ok_or_else(|| Self::missing("write_buffer", id))?;
        let start = offset as usize;
        let end = start + data.len();
        if end > buffer.bytes.len() {
            return Err(GpuError::new(ErrorCode::Validation, "write_buffer").with_detail(
                format!("`{}`: write {start}..{end} past {}", buffer.desc.label, buffer.bytes.len()),
            ));
        }
        buffer.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn create_mesh(
        &mut self,
        _label: &str,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> GpuResult<MeshId> {
        Ok(self.meshes.insert((vertices.len(), indices.len())))
    }

    fn create_render_pipeline(&mut self, desc: &RenderPipelineDesc<'_>) -> GpuResult<PipelineId> {
        Ok(self.pipelines.insert(desc.label.to_string()))
    }

    fn create_compute_pipeline(
        &mut self,
        desc: &ComputePipelineDesc<'_>,
    ) -> GpuResult<PipelineId> {
        Ok(self.pipelines.insert(desc.label.to_string()))
    }

    fn create_table(&mut self, desc: &TableDesc) -> GpuResult<TableId> {
        for binding in &desc.entries {
            if let Some(texture) = binding.texture() {
                if self.textures.get(texture).is_none() {
                    return Err(Self::missing("create_table", texture));
                }
            }
        }
        let id = self.tables.insert(desc.clone());
        self.validator.track_table(id, &desc.entries);
        Ok(id)
    }

    fn destroy_table(&mut self, id: TableId) {
        self.tables.remove(id);
        self.validator.forget_table(id);
    }

    fn begin_frame(&mut self) -> GpuResult<FrameStatus> {
        if self.skip_frames > 0 {
            self.skip_frames -= 1;
            return Ok(FrameStatus::Skip);
        }
        self.frame_acquired = true;
        Ok(FrameStatus::Ready)
    }

    fn execute(&mut self, list: &CommandList) -> GpuResult<()> {
        self.validator.validate(list)?;
        self.executed.push(list.clone());
        Ok(())
    }

    fn present(&mut self) -> GpuResult<()> {
        if !self.frame_acquired {
            return Err(GpuError::new(ErrorCode::Validation, "present")
                .with_detail("no back buffer acquired"));
        }
        let back = self.back_buffer((self.presents % 2) as usize);
        self.validator.check_present(back)?;
        self.frame_acquired = false;
        self.presents += 1;
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> GpuResult<()> {
        if !self.handle.pending.lock().is_empty() {
            return Err(GpuError::new(ErrorCode::Validation, "resize_surface")
                .with_detail("queue not drained"));
        }
        self.size = (width, height);
        for (i, id) in self.back_buffers.into_iter().enumerate() {
            if let Some(desc) = self.textures.get_mut(id) {
                *desc = back_buffer_desc(i, width, height);
            }
            self.validator.track_texture(id, ResourceState::Present);
        }
        self.presents = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::BufferUsage;

    #[test]
    fn manual_signals_complete_in_order() {
        let mut backend = HeadlessBackend::new(8, 8, Completion::Manual);
        let handle = backend.completion_handle();
        let mut fence = Fence::new();

        fence.signal(&mut backend).unwrap();
        fence.signal(&mut backend).unwrap();
        assert_eq!(fence.completed_value(), 0);
        assert_eq!(handle.pending(), 2);

        assert_eq!(handle.complete_next(), Some(1));
        assert_eq!(fence.completed_value(), 1);
        handle.complete_all();
        assert_eq!(fence.completed_value(), 2);
    }

    #[test]
    fn write_past_end_is_rejected() {
        let mut backend = HeadlessBackend::new(8, 8, Completion::Immediate);
        let buffer = backend
            .create_buffer(&BufferDesc {
                label: "b".into(),
                size: 16,
                usage: BufferUsage::Structured,
            })
            .unwrap();
        backend.write_buffer(buffer, 8, &[1; 8]).unwrap();
        assert!(backend.write_buffer(buffer, 12, &[1; 8]).is_err());
        assert_eq!(&backend.buffer_bytes(buffer).unwrap()[8..], &[1; 8]);
    }

    #[test]
    fn present_without_transition_back_fails() {
        let mut backend = HeadlessBackend::new(8, 8, Completion::Immediate);
        let back = backend.back_buffer(0);

        let mut list = CommandList::new("frame");
        list.transition(back, ResourceState::Present, ResourceState::RenderTarget);
        list.close();

        assert_eq!(backend.begin_frame().unwrap(), FrameStatus::Ready);
        backend.execute(&list).unwrap();
        assert!(backend.present().is_err());
    }
}
