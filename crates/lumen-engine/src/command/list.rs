use std::ops::Range;

use crate::resource::{MeshId, PipelineId, ResourceState, TableId, TextureId};

/// Viewport rectangle in pixels plus depth range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with the `[0, 1]` depth range.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle in pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorAttachment {
    pub texture: TextureId,
    /// Array layer (cube face) to render into.
    pub layer: u32,
    /// `None` keeps the existing contents.
    pub clear: Option<[f32; 4]>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DepthAttachment {
    pub texture: TextureId,
    pub layer: u32,
    pub clear: Option<f32>,
}

/// One recorded GPU command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Transition {
        texture: TextureId,
        from: ResourceState,
        to: ResourceState,
    },
    UavBarrier {
        texture: TextureId,
    },
    BeginRenderPass {
        label: &'static str,
        color: Option<ColorAttachment>,
        depth: Option<DepthAttachment>,
    },
    EndRenderPass,
    BeginComputePass {
        label: &'static str,
    },
    EndComputePass,
    SetViewport(Viewport),
    SetScissor(ScissorRect),
    SetPipeline(PipelineId),
    SetTable {
        group: u32,
        table: TableId,
        dynamic_offset: Option<u32>,
    },
    DrawIndexed {
        mesh: MeshId,
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    },
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum ListState {
    Open,
    Closed,
}

/// Ordered command recording.
///
/// A list is created open. `close` ends recording; only a closed list may be
/// executed, and only a closed list may be `reset` for reuse. The owner is
/// responsible for resetting only once the GPU no longer reads the previous
/// recording.
#[derive(Debug, Clone)]
pub struct CommandList {
    label: String,
    commands: Vec<Command>,
    state: ListState,
}

impl CommandList {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
            state: ListState::Open,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_closed(&self) -> bool {
        self.state == ListState::Closed
    }

    /// Clears the previous recording and reopens the list.
    pub fn reset(&mut self) {
        assert!(self.is_closed(), "reset of command list `{}` while recording", self.label);
        self.commands.clear();
        self.state = ListState::Open;
    }

    pub fn close(&mut self) {
        assert!(!self.is_closed(), "command list `{}` closed twice", self.label);
        self.state = ListState::Closed;
    }

    pub fn push(&mut self, command: Command) {
        assert!(
            !self.is_closed(),
            "recording into closed command list `{}`",
            self.label
        );
        self.commands.push(command);
    }

    // ── recording helpers ─────────────────────────────────────────────────

    pub fn transition(&mut self, texture: TextureId, from: ResourceState, to: ResourceState) {
        self.push(Command::Transition { texture, from, to });
    }

    pub fn uav_barrier(&mut self, texture: TextureId) {
        self.push(Command::UavBarrier { texture });
    }

    pub fn begin_render_pass(
        &mut self,
        label: &'static str,
        color: Option<ColorAttachment>,
        depth: Option<DepthAttachment>,
    ) {
        self.push(Command::BeginRenderPass { label, color, depth });
    }

    pub fn end_render_pass(&mut self) {
        self.push(Command::EndRenderPass);
    }

    pub fn begin_compute_pass(&mut self, label: &'static str) {
        self.push(Command::BeginComputePass { label });
    }

    pub fn end_compute_pass(&mut self) {
        self.push(Command::EndComputePass);
    }

    /// Sets viewport and scissor together; every pass needs both.
    pub fn set_viewport_scissor(&mut self, viewport: Viewport, scissor: ScissorRect) {
        self.push(Command::SetViewport(viewport));
        self.push(Command::SetScissor(scissor));
    }

    pub fn set_pipeline(&mut self, pipeline: PipelineId) {
        self.push(Command::SetPipeline(pipeline));
    }

    pub fn set_table(&mut self, group: u32, table: TableId, dynamic_offset: Option<u32>) {
        self.push(Command::SetTable {
            group,
            table,
            dynamic_offset,
        });
    }

    pub fn draw_indexed(
        &mut self,
        mesh: MeshId,
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    ) {
        self.push(Command::DrawIndexed {
            mesh,
            indices,
            base_vertex,
            instances,
        });
    }

    /// Full-screen triangle.
    pub fn draw_fullscreen(&mut self) {
        self.push(Command::Draw {
            vertices: 0..3,
            instances: 0..1,
        });
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.push(Command::Dispatch { x, y, z });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_list_is_open_and_close_then_reset_reopens() {
        let mut list = CommandList::new("frame");
        list.dispatch(1, 1, 1);
        list.close();
        assert!(list.is_closed());

        list.reset();
        assert!(!list.is_closed());
        assert!(list.commands().is_empty());
    }

    #[test]
    #[should_panic(expected = "while recording")]
    fn reset_of_open_list_panics() {
        let mut list = CommandList::new("frame");
        list.reset();
    }

    #[test]
    #[should_panic(expected = "closed command list")]
    fn recording_after_close_panics() {
        let mut list = CommandList::new("frame");
        list.close();
        list.draw_fullscreen();
    }
}
