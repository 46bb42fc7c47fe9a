//! Mapping from backend-neutral descriptions to wgpu types.

use std::num::NonZeroU64;

use crate::backend::{BindingKind, PipelineKind, StorageAccess, TextureView};
use crate::resource::{Dimension, Format, TextureUsage};
use crate::scene::Vertex;

pub(super) fn texture_format(format: Format, surface: wgpu::TextureFormat) -> wgpu::TextureFormat {
    match format {
        Format::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        Format::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        Format::R32Float => wgpu::TextureFormat::R32Float,
        Format::Depth32Float => wgpu::TextureFormat::Depth32Float,
        Format::Surface => surface,
    }
}

pub(super) fn texture_usages(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut out = wgpu::TextureUsages::empty();
    if usage.contains(TextureUsage::RENDER_TARGET) || usage.contains(TextureUsage::DEPTH) {
        out |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    if usage.contains(TextureUsage::SAMPLED) {
        out |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if usage.contains(TextureUsage::STORAGE) {
        out |= wgpu::TextureUsages::STORAGE_BINDING;
    }
    out
}

/// View used when a texture is bound for sampling.
pub(super) fn sampled_view(
    texture: &wgpu::Texture,
    dimension: Dimension,
    view: TextureView,
) -> wgpu::TextureView {
    let (dimension, aspect) = match (view, dimension) {
        (TextureView::Cube, _) => (wgpu::TextureViewDimension::Cube, wgpu::TextureAspect::All),
        (TextureView::Depth, _) => (wgpu::TextureViewDimension::D2, wgpu::TextureAspect::DepthOnly),
        (_, Dimension::Cube) => (wgpu::TextureViewDimension::D2Array, wgpu::TextureAspect::All),
        _ => (wgpu::TextureViewDimension::D2, wgpu::TextureAspect::All),
    };
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("sampled view"),
        dimension: Some(dimension),
        aspect,
        ..Default::default()
    })
}

/// Single-mip, single-layer view for attachments and storage writes.
pub(super) fn subresource_view(texture: &wgpu::Texture, mip: u32, layer: u32) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("subresource view"),
        dimension: Some(wgpu::TextureViewDimension::D2),
        base_mip_level: mip,
        mip_level_count: Some(1),
        base_array_layer: layer,
        array_layer_count: Some(1),
        ..Default::default()
    })
}

pub(super) fn layout_entry(binding: u32, kind: BindingKind) -> wgpu::BindGroupLayoutEntry {
    let graphics = wgpu::ShaderStages::VERTEX_FRAGMENT | wgpu::ShaderStages::COMPUTE;
    let (visibility, ty) = match kind {
        BindingKind::UniformDynamic { size } => (
            graphics,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(size),
            },
        ),
        BindingKind::Storage => (
            graphics,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
        ),
        BindingKind::Texture(view) => {
            let (sample_type, view_dimension) = match view {
                TextureView::D2 => (
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::TextureViewDimension::D2,
                ),
                TextureView::D2Unfilterable => (
                    wgpu::TextureSampleType::Float { filterable: false },
                    wgpu::TextureViewDimension::D2,
                ),
                TextureView::Depth => (
                    wgpu::TextureSampleType::Depth,
                    wgpu::TextureViewDimension::D2,
                ),
                TextureView::Cube => (
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::TextureViewDimension::Cube,
                ),
            };
            (
                graphics,
                wgpu::BindingType::Texture {
                    sample_type,
                    view_dimension,
                    multisampled: false,
                },
            )
        }
        BindingKind::StorageTexture { format, access } => (
            // Writable storage is not allowed in the vertex stage.
            wgpu::ShaderStages::COMPUTE,
            wgpu::BindingType::StorageTexture {
                access: match access {
                    StorageAccess::Read => wgpu::StorageTextureAccess::ReadOnly,
                    StorageAccess::Write => wgpu::StorageTextureAccess::WriteOnly,
                },
                format: texture_format(format, wgpu::TextureFormat::Rgba8Unorm),
                view_dimension: wgpu::TextureViewDimension::D2,
            },
        ),
        BindingKind::LinearSampler => (
            graphics,
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        ),
        BindingKind::ComparisonSampler => (
            graphics,
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
        ),
    };
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty,
        count: None,
    }
}

// ── raster state ──────────────────────────────────────────────────────────

pub(super) struct RasterState {
    pub cull_mode: Option<wgpu::Face>,
    pub blend: Option<wgpu::BlendState>,
    pub depth: Option<(wgpu::CompareFunction, bool)>,
    pub bias: wgpu::DepthBiasState,
}

pub(super) fn raster_state(kind: PipelineKind) -> RasterState {
    let opaque = RasterState {
        cull_mode: Some(wgpu::Face::Back),
        blend: None,
        depth: Some((wgpu::CompareFunction::Less, true)),
        bias: wgpu::DepthBiasState::default(),
    };
    match kind {
        PipelineKind::Opaque => opaque,
        PipelineKind::AlphaTested => RasterState {
            cull_mode: None,
            ..opaque
        },
        PipelineKind::Transparent => RasterState {
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            depth: Some((wgpu::CompareFunction::Less, false)),
            ..opaque
        },
        PipelineKind::Sky => RasterState {
            cull_mode: None,
            depth: Some((wgpu::CompareFunction::LessEqual, false)),
            ..opaque
        },
        PipelineKind::ShadowDepth => RasterState {
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
            ..opaque
        },
        PipelineKind::Fullscreen => RasterState {
            cull_mode: None,
            blend: None,
            depth: None,
            bias: wgpu::DepthBiasState::default(),
        },
    }
}

// ── vertex layout ─────────────────────────────────────────────────────────

const VERTEX_ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
    3 => Float32x3,
];

pub(super) fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_attributes_cover_the_whole_vertex() {
        let last = VERTEX_ATTRS[3];
        assert_eq!(last.offset + 12, size_of::<Vertex>() as u64);
    }

    #[test]
    fn storage_textures_are_compute_only() {
        let entry = layout_entry(
            0,
            BindingKind::StorageTexture {
                format: Format::R32Float,
                access: StorageAccess::Write,
            },
        );
        assert_eq!(entry.visibility, wgpu::ShaderStages::COMPUTE);
    }
}
