use crate::backend::Backend;
use crate::command::{ColorAttachment, CommandList, DepthAttachment, ScissorRect, Viewport};
use crate::error::GpuResult;
use crate::resource::{Format, ResourceState, TextureDesc, TextureUsage, TrackedTexture};

/// Dynamic environment cube map plus the depth buffer its faces share.
#[derive(Debug)]
pub struct CubeRenderTarget {
    size: u32,
    color: TrackedTexture,
    depth: TrackedTexture,
}

impl CubeRenderTarget {
    pub fn new<B: Backend + ?Sized>(backend: &mut B, size: u32) -> GpuResult<Self> {
        let color = backend.create_texture(
            &TextureDesc::d2(
                "cube map",
                Format::Rgba8Unorm,
                size,
                size,
                TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED,
                ResourceState::ShaderRead,
            )
            .cube(),
        )?;
        let depth = backend.create_texture(&TextureDesc::d2(
            "cube map depth",
            Format::Depth32Float,
            size,
            size,
            TextureUsage::DEPTH,
            ResourceState::DepthWrite,
        ))?;

        Ok(Self {
            size,
            color: TrackedTexture::new(color, ResourceState::ShaderRead),
            depth: TrackedTexture::new(depth, ResourceState::DepthWrite),
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn color(&self) -> &TrackedTexture {
        &self.color
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::full(self.size, self.size)
    }

    pub fn scissor(&self) -> ScissorRect {
        ScissorRect::full(self.size, self.size)
    }

    /// Opens a pass rendering into cube face `face` (0..6).
    pub fn begin_face(&mut self, list: &mut CommandList, face: u32, clear: [f32; 4]) {
        assert!(face < 6, "cube face {face} out of range");
        self.color.transition_to(list, ResourceState::RenderTarget);
        self.depth.transition_to(list, ResourceState::DepthWrite);
        list.begin_render_pass(
            "cube face",
            Some(ColorAttachment {
                texture: self.color.id(),
                layer: face,
                clear: Some(clear),
            }),
            Some(DepthAttachment {
                texture: self.depth.id(),
                layer: 0,
                clear: Some(1.0),
            }),
        );
        list.set_viewport_scissor(self.viewport(), self.scissor());
    }

    pub fn end_face(&mut self, list: &mut CommandList) {
        list.end_render_pass();
    }

    /// Makes the finished cube readable by the main pass.
    pub fn finish(&mut self, list: &mut CommandList) {
        self.color.transition_to(list, ResourceState::ShaderRead);
    }

    pub fn release<B: Backend + ?Sized>(&self, backend: &mut B) {
        backend.destroy_texture(self.color.id());
        backend.destroy_texture(self.depth.id());
    }
}

/// 1x1 cube bound in place of the dynamic cube while that one is being
/// rendered.
#[derive(Debug)]
pub struct FallbackCube {
    texture: TrackedTexture,
}

impl FallbackCube {
    pub fn new<B: Backend + ?Sized>(backend: &mut B) -> GpuResult<Self> {
        let id = backend.create_texture(
            &TextureDesc::d2(
                "fallback cube",
                Format::Rgba8Unorm,
                1,
                1,
                TextureUsage::SAMPLED,
                ResourceState::ShaderRead,
            )
            .cube(),
        )?;
        Ok(Self {
            texture: TrackedTexture::new(id, ResourceState::ShaderRead),
        })
    }

    pub fn texture(&self) -> &TrackedTexture {
        &self.texture
    }
}
