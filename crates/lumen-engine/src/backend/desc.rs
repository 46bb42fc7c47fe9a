//! Backend-neutral descriptions of shaders, pipelines and binding tables.

use std::borrow::Cow;

use crate::resource::{BufferId, Format, TextureId};

/// A named WGSL shader blob.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub name: Cow<'static, str>,
    pub wgsl: Cow<'static, str>,
}

/// How a sampled texture is viewed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureView {
    /// Filterable float 2D texture, all mips.
    D2,
    /// Non-filterable float 2D texture (R32Float), all mips.
    D2Unfilterable,
    /// Depth texture read through comparison or `textureLoad`.
    Depth,
    Cube,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StorageAccess {
    Read,
    Write,
}

/// Shape of one binding slot. Pipelines are laid out from these; tables
/// must match them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BindingKind {
    /// Uniform buffer window of `size` bytes selected by a dynamic offset.
    UniformDynamic { size: u64 },
    /// Read-only storage array.
    Storage,
    Texture(TextureView),
    StorageTexture { format: Format, access: StorageAccess },
    LinearSampler,
    ComparisonSampler,
}

/// One resource bound into a table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Binding {
    UniformDynamic { buffer: BufferId, size: u64 },
    Storage { buffer: BufferId },
    Texture { texture: TextureId, view: TextureView },
    StorageTexture {
        texture: TextureId,
        format: Format,
        mip: u32,
        access: StorageAccess,
    },
    LinearSampler,
    ComparisonSampler,
}

impl Binding {
    pub fn kind(&self) -> BindingKind {
        match *self {
            Binding::UniformDynamic { size, .. } => BindingKind::UniformDynamic { size },
            Binding::Storage { .. } => BindingKind::Storage,
            Binding::Texture { view, .. } => BindingKind::Texture(view),
            Binding::StorageTexture { format, access, .. } => {
                BindingKind::StorageTexture { format, access }
            }
            Binding::LinearSampler => BindingKind::LinearSampler,
            Binding::ComparisonSampler => BindingKind::ComparisonSampler,
        }
    }

    /// Texture referenced by this binding, if any.
    pub fn texture(&self) -> Option<TextureId> {
        match *self {
            Binding::Texture { texture, .. } | Binding::StorageTexture { texture, .. } => {
                Some(texture)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableDesc {
    pub label: String,
    pub entries: Vec<Binding>,
}

impl TableDesc {
    pub fn layout(&self) -> Vec<BindingKind> {
        self.entries.iter().map(Binding::kind).collect()
    }
}

/// Fixed-function presets for raster pipelines.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PipelineKind {
    /// Depth test + write, back-face culling, no blending.
    Opaque,
    /// Like `Opaque` without culling (foliage, fences).
    AlphaTested,
    /// Alpha blending, depth test without write.
    Transparent,
    /// Drawn from inside the sky sphere: `LessEqual`, no culling, no write.
    Sky,
    /// Depth only with slope-scaled bias.
    ShadowDepth,
    /// Vertex-less full-screen triangle, no depth.
    Fullscreen,
}

impl PipelineKind {
    pub fn uses_mesh_vertices(self) -> bool {
        !matches!(self, PipelineKind::Fullscreen)
    }
}

#[derive(Debug, Clone)]
pub struct RenderPipelineDesc<'a> {
    pub label: &'a str,
    pub shader: &'a ShaderSource,
    pub vs_entry: &'a str,
    /// `None` for depth-only pipelines.
    pub fs_entry: Option<&'a str>,
    pub kind: PipelineKind,
    pub color_format: Option<Format>,
    pub depth_format: Option<Format>,
    /// Binding layout per group index.
    pub groups: &'a [&'a [BindingKind]],
}

#[derive(Debug, Clone)]
pub struct ComputePipelineDesc<'a> {
    pub label: &'a str,
    pub shader: &'a ShaderSource,
    pub entry: &'a str,
    pub groups: &'a [&'a [BindingKind]],
}
