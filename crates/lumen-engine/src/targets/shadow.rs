use crate::backend::Backend;
use crate::command::{CommandList, DepthAttachment, ScissorRect, Viewport};
use crate::error::GpuResult;
use crate::resource::{Format, ResourceState, TextureDesc, TextureUsage, TrackedTexture};

/// Square depth map rendered from the main light.
///
/// Rests in `ShaderRead`; [`ShadowMap::begin`] moves it to `DepthWrite` for
/// the duration of the pass.
#[derive(Debug)]
pub struct ShadowMap {
    size: u32,
    texture: TrackedTexture,
}

impl ShadowMap {
    pub fn new<B: Backend + ?Sized>(backend: &mut B, size: u32) -> GpuResult<Self> {
        let id = backend.create_texture(&TextureDesc::d2(
            "shadow map",
            Format::Depth32Float,
            size,
            size,
            TextureUsage::DEPTH | TextureUsage::SAMPLED,
            ResourceState::ShaderRead,
        ))?;
        Ok(Self {
            size,
            texture: TrackedTexture::new(id, ResourceState::ShaderRead),
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn texture(&self) -> &TrackedTexture {
        &self.texture
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::full(self.size, self.size)
    }

    pub fn scissor(&self) -> ScissorRect {
        ScissorRect::full(self.size, self.size)
    }

    /// Opens a depth-only pass cleared to the far plane.
    pub fn begin(&mut self, list: &mut CommandList) {
        self.texture.transition_to(list, ResourceState::DepthWrite);
        list.begin_render_pass(
            "shadow",
            None,
            Some(DepthAttachment {
                texture: self.texture.id(),
                layer: 0,
                clear: Some(1.0),
            }),
        );
        list.set_viewport_scissor(self.viewport(), self.scissor());
    }

    pub fn end(&mut self, list: &mut CommandList) {
        list.end_render_pass();
        self.texture.transition_to(list, ResourceState::ShaderRead);
    }
}
