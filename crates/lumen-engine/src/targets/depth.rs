use crate::backend::Backend;
use crate::command::CommandList;
use crate::error::GpuResult;
use crate::resource::{Format, ResourceState, TextureDesc, TextureUsage, TrackedTexture};

/// Main depth buffer, recreated with the swap chain.
///
/// Created in `Common`; the owner records the move to `DepthWrite` in a
/// one-off list right after creation.
#[derive(Debug)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    texture: TrackedTexture,
}

impl DepthBuffer {
    pub fn new<B: Backend + ?Sized>(backend: &mut B, width: u32, height: u32) -> GpuResult<Self> {
        let id = backend.create_texture(&TextureDesc::d2(
            "depth buffer",
            Format::Depth32Float,
            width,
            height,
            TextureUsage::DEPTH | TextureUsage::SAMPLED,
            ResourceState::Common,
        ))?;
        Ok(Self {
            width,
            height,
            texture: TrackedTexture::new(id, ResourceState::Common),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn texture(&self) -> &TrackedTexture {
        &self.texture
    }

    pub fn transition_to(&mut self, list: &mut CommandList, state: ResourceState) -> bool {
        self.texture.transition_to(list, state)
    }

    pub fn tracked_mut(&mut self) -> &mut TrackedTexture {
        &mut self.texture
    }

    pub fn release<B: Backend + ?Sized>(&self, backend: &mut B) {
        backend.destroy_texture(self.texture.id());
    }
}
