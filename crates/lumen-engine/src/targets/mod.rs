//! Auxiliary render targets.
//!
//! Each target owns its texture(s), knows the state it leaves them in and
//! exposes the viewport/scissor for rendering into it. Size-dependent targets
//! rebuild through `on_resize`, which does nothing when the size is unchanged.

mod brdf;
mod cube;
mod depth;
mod hiz;
mod screen;
mod shadow;

pub use brdf::BrdfLut;
pub use cube::{CubeRenderTarget, FallbackCube};
pub use depth::DepthBuffer;
pub use hiz::{dispatch_size, mip_count, mip_extent, HiZ, HIZ_GROUP_SIZE};
pub use screen::{SceneColor, SsrTarget};
pub use shadow::ShadowMap;
