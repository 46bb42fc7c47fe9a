use std::ops::BitOr;

use super::ResourceState;

/// Texel formats used by the pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Format {
    Rgba8Unorm,
    Rgba16Float,
    R32Float,
    Depth32Float,
    /// Whatever the presentation surface was configured with.
    Surface,
}

impl Format {
    pub fn is_depth(self) -> bool {
        matches!(self, Format::Depth32Float)
    }
}

/// Texture dimensionality.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Dimension {
    D2,
    /// Six array layers addressed as cube faces.
    Cube,
}

/// Allowed texture uses, combinable with `|`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextureUsage(u8);

impl TextureUsage {
    pub const RENDER_TARGET: Self = Self(1);
    pub const DEPTH: Self = Self(1 << 1);
    pub const SAMPLED: Self = Self(1 << 2);
    pub const STORAGE: Self = Self(1 << 3);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TextureUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub label: String,
    pub format: Format,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub dimension: Dimension,
    pub usage: TextureUsage,
    /// State the texture is in right after creation.
    pub initial_state: ResourceState,
}

impl TextureDesc {
    /// Single-mip 2D texture.
    pub fn d2(
        label: impl Into<String>,
        format: Format,
        width: u32,
        height: u32,
        usage: TextureUsage,
        initial_state: ResourceState,
    ) -> Self {
        Self {
            label: label.into(),
            format,
            width,
            height,
            mip_levels: 1,
            dimension: Dimension::D2,
            usage,
            initial_state,
        }
    }

    pub fn with_mips(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels;
        self
    }

    pub fn cube(mut self) -> Self {
        self.dimension = Dimension::Cube;
        self
    }

    pub fn layers(&self) -> u32 {
        match self.dimension {
            Dimension::D2 => 1,
            Dimension::Cube => 6,
        }
    }
}

/// How a buffer is bound.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    /// Uniform data addressed with a dynamic offset.
    Constant,
    /// Read-only structured array.
    Structured,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferDesc {
    pub label: String,
    pub size: u64,
    pub usage: BufferUsage,
}
