use crate::backend::Backend;
use crate::command::{ColorAttachment, CommandList, ScissorRect, Viewport};
use crate::error::GpuResult;
use crate::resource::{Format, ResourceState, TextureDesc, TextureUsage, TrackedTexture};

/// Window-sized color target that rests in `ShaderRead`.
#[derive(Debug)]
struct ScreenTexture {
    label: &'static str,
    format: Format,
    width: u32,
    height: u32,
    texture: TrackedTexture,
}

impl ScreenTexture {
    fn new<B: Backend + ?Sized>(
        backend: &mut B,
        label: &'static str,
        format: Format,
        width: u32,
        height: u32,
    ) -> GpuResult<Self> {
        let texture = Self::create(backend, label, format, width, height)?;
        Ok(Self {
            label,
            format,
            width,
            height,
            texture,
        })
    }

    fn create<B: Backend + ?Sized>(
        backend: &mut B,
        label: &'static str,
        format: Format,
        width: u32,
        height: u32,
    ) -> GpuResult<TrackedTexture> {
        let id = backend.create_texture(&TextureDesc::d2(
            label,
            format,
            width,
            height,
            TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED,
            ResourceState::ShaderRead,
        ))?;
        Ok(TrackedTexture::new(id, ResourceState::ShaderRead))
    }

    fn on_resize<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> GpuResult<bool> {
        if (self.width, self.height) == (width, height) {
            return Ok(false);
        }
        log::debug!("{}: {}x{} -> {width}x{height}", self.label, self.width, self.height);
        backend.destroy_texture(self.texture.id());
        self.texture = Self::create(backend, self.label, self.format, width, height)?;
        self.width = width;
        self.height = height;
        Ok(true)
    }

    fn begin(&mut self, list: &mut CommandList, label: &'static str, clear: Option<[f32; 4]>) {
        self.texture.transition_to(list, ResourceState::RenderTarget);
        list.begin_render_pass(
            label,
            Some(ColorAttachment {
                texture: self.texture.id(),
                layer: 0,
                clear,
            }),
            None,
        );
        list.set_viewport_scissor(
            Viewport::full(self.width, self.height),
            ScissorRect::full(self.width, self.height),
        );
    }

    fn finish(&mut self, list: &mut CommandList) {
        self.texture.transition_to(list, ResourceState::ShaderRead);
    }
}

/// Lit scene before post-processing (RGBA8).
#[derive(Debug)]
pub struct SceneColor {
    inner: ScreenTexture,
    clear: [f32; 4],
}

impl SceneColor {
    pub fn new<B: Backend + ?Sized>(
        backend: &mut B,
        width: u32,
        height: u32,
        clear: [f32; 4],
    ) -> GpuResult<Self> {
        Ok(Self {
            inner: ScreenTexture::new(backend, "scene color", Format::Rgba8Unorm, width, height)?,
            clear,
        })
    }

    pub fn texture(&self) -> &TrackedTexture {
        &self.inner.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.inner.width, self.inner.height)
    }

    /// Rebuilds for a new size. Returns `false` when nothing changed.
    pub fn on_resize<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> GpuResult<bool> {
        self.inner.on_resize(backend, width, height)
    }

    /// Color attachment for the main pass, cleared to the configured color.
    pub fn attachment(&mut self, list: &mut CommandList) -> ColorAttachment {
        self.inner.texture.transition_to(list, ResourceState::RenderTarget);
        ColorAttachment {
            texture: self.inner.texture.id(),
            layer: 0,
            clear: Some(self.clear),
        }
    }

    pub fn finish(&mut self, list: &mut CommandList) {
        self.inner.finish(list);
    }
}

/// Screen-space reflection result (RGBA16F: color + confidence).
#[derive(Debug)]
pub struct SsrTarget {
    inner: ScreenTexture,
}

impl SsrTarget {
    pub fn new<B: Backend + ?Sized>(backend: &mut B, width: u32, height: u32) -> GpuResult<Self> {
        Ok(Self {
            inner: ScreenTexture::new(backend, "ssr", Format::Rgba16Float, width, height)?,
        })
    }

    pub fn texture(&self) -> &TrackedTexture {
        &self.inner.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.inner.width, self.inner.height)
    }

    pub fn on_resize<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> GpuResult<bool> {
        self.inner.on_resize(backend, width, height)
    }

    pub fn begin(&mut self, list: &mut CommandList) {
        self.inner.begin(list, "ssr", Some([0.0; 4]));
    }

    pub fn end(&mut self, list: &mut CommandList) {
        list.end_render_pass();
        self.inner.finish(list);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Completion, HeadlessBackend};

    #[test]
    fn resize_to_same_size_is_a_no_op() {
        let mut backend = HeadlessBackend::new(64, 32, Completion::Immediate);
        let mut ssr = SsrTarget::new(&mut backend, 64, 32).unwrap();
        let created = backend.textures_created();

        assert!(!ssr.on_resize(&mut backend, 64, 32).unwrap());
        assert_eq!(backend.textures_created(), created);

        assert!(ssr.on_resize(&mut backend, 128, 64).unwrap());
        assert_eq!(backend.textures_created(), created + 1);
        assert_eq!(ssr.size(), (128, 64));
        let desc = backend.texture_desc(ssr.texture().id()).unwrap();
        assert_eq!((desc.width, desc.format), (128, Format::Rgba16Float));
    }
}
