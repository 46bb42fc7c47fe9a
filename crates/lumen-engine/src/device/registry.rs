//! GPU objects addressed by the backend's typed handles.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::backend::BindingKind;
use crate::resource::{Arena, BufferId, MeshId, PipelineId, TableId, TextureDesc, TextureId};

use super::convert;

pub(super) enum GpuTexture {
    Owned {
        texture: wgpu::Texture,
        desc: TextureDesc,
    },
    /// Resolves to whatever swap-chain image is acquired this frame.
    BackBuffer,
}

pub(super) struct GpuBuffer {
    pub buffer: wgpu::Buffer,
    pub size: u64,
}

pub(super) struct GpuMesh {
    pub vertices: wgpu::Buffer,
    pub indices: wgpu::Buffer,
}

pub(super) enum GpuPipeline {
    Render(wgpu::RenderPipeline),
    Compute(wgpu::ComputePipeline),
}

#[derive(Default)]
pub(super) struct Registry {
    pub textures: Arena<TextureId, GpuTexture>,
    pub buffers: Arena<BufferId, GpuBuffer>,
    pub meshes: Arena<MeshId, GpuMesh>,
    pub pipelines: Arena<PipelineId, GpuPipeline>,
    pub tables: Arena<TableId, wgpu::BindGroup>,
    pub shaders: HashMap<Cow<'static, str>, wgpu::ShaderModule>,
    /// Keyed by binding shape so tables and pipelines share layout objects.
    layouts: HashMap<Vec<BindingKind>, wgpu::BindGroupLayout>,
}

impl Registry {
    pub fn layout(&mut self, device: &wgpu::Device, kinds: &[BindingKind]) -> wgpu::BindGroupLayout {
        if let Some(layout) = self.layouts.get(kinds) {
            return layout.clone();
        }
        let entries: Vec<_> = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| convert::layout_entry(i as u32, *kind))
            .collect();
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen table layout"),
            entries: &entries,
        });
        log::debug!("gpu: new table layout with {} entries", kinds.len());
        self.layouts.insert(kinds.to_vec(), layout.clone());
        layout
    }

    pub fn pipeline_layout(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        groups: &[&[BindingKind]],
    ) -> wgpu::PipelineLayout {
        let layouts: Vec<_> = groups.iter().map(|g| self.layout(device, g)).collect();
        let refs: Vec<_> = layouts.iter().collect();
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &refs,
            immediate_size: 0,
        })
    }

    /// Owned texture for `id`; `None` for back buffers and stale handles.
    pub fn owned_texture(&self, id: TextureId) -> Option<(&wgpu::Texture, &TextureDesc)> {
        match self.textures.get(id)? {
            GpuTexture::Owned { texture, desc } => Some((texture, desc)),
            GpuTexture::BackBuffer => None,
        }
    }
}
