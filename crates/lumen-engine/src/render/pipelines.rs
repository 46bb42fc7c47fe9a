use crate::backend::{
    Backend, BindingKind, ComputePipelineDesc, PipelineKind, RenderPipelineDesc, ShaderSource,
    StorageAccess, TextureView,
};
use crate::error::GpuResult;
use crate::frame::globals_layout;
use crate::resource::{Format, PipelineId};
use crate::scene::RenderLayer;

use super::ShaderLibrary;

/// Binding layouts shared by pipelines and the tables bound to them.
pub struct Layouts;

impl Layouts {
    /// Shadow map, environment cube, BRDF LUT and their samplers.
    pub const SCENE_TEXTURES: [BindingKind; 5] = [
        BindingKind::Texture(TextureView::Depth),
        BindingKind::Texture(TextureView::Cube),
        BindingKind::Texture(TextureView::D2),
        BindingKind::LinearSampler,
        BindingKind::ComparisonSampler,
    ];

    /// Scene color, depth and the Hi-Z pyramid.
    pub const SSR_INPUTS: [BindingKind; 4] = [
        BindingKind::Texture(TextureView::D2),
        BindingKind::Texture(TextureView::Depth),
        BindingKind::Texture(TextureView::D2Unfilterable),
        BindingKind::LinearSampler,
    ];

    /// Scene color and the SSR result.
    pub const COMPOSITE_INPUTS: [BindingKind; 3] = [
        BindingKind::Texture(TextureView::D2),
        BindingKind::Texture(TextureView::D2),
        BindingKind::LinearSampler,
    ];

    pub const HIZ_FIRST: [BindingKind; 2] = [
        BindingKind::Texture(TextureView::Depth),
        BindingKind::StorageTexture {
            format: Format::R32Float,
            access: StorageAccess::Write,
        },
    ];

    pub const HIZ_REDUCE: [BindingKind; 2] = [
        BindingKind::StorageTexture {
            format: Format::R32Float,
            access: StorageAccess::Read,
        },
        BindingKind::StorageTexture {
            format: Format::R32Float,
            access: StorageAccess::Write,
        },
    ];
}

/// Every pipeline the frame records.
#[derive(Debug, Clone)]
pub struct Pipelines {
    layers: [PipelineId; 5],
    pub shadow: PipelineId,
    pub hiz_first: PipelineId,
    pub hiz_reduce: PipelineId,
    pub ssr: PipelineId,
    pub composite: PipelineId,
    pub brdf_lut: PipelineId,
}

impl Pipelines {
    pub fn new<B: Backend + ?Sized>(backend: &mut B, shaders: &ShaderLibrary) -> GpuResult<Self> {
        let globals = globals_layout();
        let scene_groups: [&[BindingKind]; 2] = [&globals, &Layouts::SCENE_TEXTURES];

        let scene = shaders.get("scene")?;
        let sky = shaders.get("sky")?;

        let mut layer = |label: &str, shader: &ShaderSource, fs: &str, kind: PipelineKind| {
            backend.create_render_pipeline(&RenderPipelineDesc {
                label,
                shader,
                vs_entry: "vs_main",
                fs_entry: Some(fs),
                kind,
                color_format: Some(Format::Rgba8Unorm),
                depth_format: Some(Format::Depth32Float),
                groups: &scene_groups,
            })
        };

        // Indexed like `RenderLayer::ORDER`.
        let layers = [
            layer("opaque", scene, "fs_main", PipelineKind::Opaque)?,
            layer("opaque flat", scene, "fs_flat", PipelineKind::Opaque)?,
            layer("sky", sky, "fs_main", PipelineKind::Sky)?,
            layer("alpha tested", scene, "fs_alpha_tested", PipelineKind::AlphaTested)?,
            layer("transparent", scene, "fs_main", PipelineKind::Transparent)?,
        ];

        let shadow = backend.create_render_pipeline(&RenderPipelineDesc {
            label: "shadow",
            shader: shaders.get("shadow")?,
            vs_entry: "vs_main",
            fs_entry: None,
            kind: PipelineKind::ShadowDepth,
            color_format: None,
            depth_format: Some(Format::Depth32Float),
            groups: &[&globals],
        })?;

        let hiz_first = backend.create_compute_pipeline(&ComputePipelineDesc {
            label: "hi-z first mip",
            shader: shaders.get("hiz_first")?,
            entry: "cs_first_mip",
            groups: &[&Layouts::HIZ_FIRST],
        })?;
        let hiz_reduce = backend.create_compute_pipeline(&ComputePipelineDesc {
            label: "hi-z reduce",
            shader: shaders.get("hiz_reduce")?,
            entry: "cs_reduce",
            groups: &[&Layouts::HIZ_REDUCE],
        })?;

        let ssr = backend.create_render_pipeline(&RenderPipelineDesc {
            label: "ssr",
            shader: shaders.get("ssr")?,
            vs_entry: "vs_main",
            fs_entry: Some("fs_main"),
            kind: PipelineKind::Fullscreen,
            color_format: Some(Format::Rgba16Float),
            depth_format: None,
            groups: &[&globals, &Layouts::SSR_INPUTS],
        })?;

        let composite = backend.create_render_pipeline(&RenderPipelineDesc {
            label: "composite",
            shader: shaders.get("composite")?,
            vs_entry: "vs_main",
            fs_entry: Some("fs_main"),
            kind: PipelineKind::Fullscreen,
            color_format: Some(Format::Surface),
            depth_format: None,
            groups: &[&Layouts::COMPOSITE_INPUTS],
        })?;

        let brdf_lut = backend.create_render_pipeline(&RenderPipelineDesc {
            label: "brdf lut",
            shader: shaders.get("brdf_lut")?,
            vs_entry: "vs_main",
            fs_entry: Some("fs_main"),
            kind: PipelineKind::Fullscreen,
            color_format: Some(Format::Rgba16Float),
            depth_format: None,
            groups: &[],
        })?;

        Ok(Self {
            layers,
            shadow,
            hiz_first,
            hiz_reduce,
            ssr,
            composite,
            brdf_lut,
        })
    }

    pub fn layer(&self, layer: RenderLayer) -> PipelineId {
        let index = RenderLayer::ORDER
            .iter()
            .position(|l| *l == layer)
            .unwrap_or(0);
        self.layers[index]
    }
}
