use crate::backend::Backend;
use crate::command::{ColorAttachment, CommandList, ScissorRect, Viewport};
use crate::error::GpuResult;
use crate::resource::{
    Format, PipelineId, ResourceState, TextureDesc, TextureUsage, TrackedTexture,
};

/// Split-sum BRDF integration table.
///
/// Filled once at start-up by a full-screen pass; independent of the window
/// size.
#[derive(Debug)]
pub struct BrdfLut {
    size: u32,
    texture: TrackedTexture,
    generated: bool,
}

impl BrdfLut {
    pub fn new<B: Backend + ?Sized>(backend: &mut B, size: u32) -> GpuResult<Self> {
        let id = backend.create_texture(&TextureDesc::d2(
            "brdf lut",
            Format::Rgba16Float,
            size,
            size,
            TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED,
            ResourceState::ShaderRead,
        ))?;
        Ok(Self {
            size,
            texture: TrackedTexture::new(id, ResourceState::ShaderRead),
            generated: false,
        })
    }

    pub fn texture(&self) -> &TrackedTexture {
        &self.texture
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Records the generation pass. Later calls record nothing.
    pub fn record_generate(&mut self, list: &mut CommandList, pipeline: PipelineId) {
        if self.generated {
            return;
        }
        self.texture.transition_to(list, ResourceState::RenderTarget);
        list.begin_render_pass(
            "brdf lut",
            Some(ColorAttachment {
                texture: self.texture.id(),
                layer: 0,
                clear: Some([0.0; 4]),
            }),
            None,
        );
        list.set_viewport_scissor(
            Viewport::full(self.size, self.size),
            ScissorRect::full(self.size, self.size),
        );
        list.set_pipeline(pipeline);
        list.draw_fullscreen();
        list.end_render_pass();
        self.texture.transition_to(list, ResourceState::ShaderRead);
        self.generated = true;
    }
}
