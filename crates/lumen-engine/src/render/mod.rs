//! Frame pipeline.
//!
//! [`Renderer`] owns the pipelines, render targets and the frame ring, and
//! records one command list per frame:
//! - shadow depth from the first directional light
//! - six dynamic cube faces around a fixed center
//! - the main pass, drawing render layers in order
//! - Hi-Z generation and screen-space reflections
//! - composite onto the back buffer

mod config;
mod pipelines;
mod renderer;
mod shaders;
mod shadow;

pub use config::RendererConfig;
pub use pipelines::{Layouts, Pipelines};
pub use renderer::Renderer;
pub use shaders::ShaderLibrary;
pub use shadow::{directional_shadow, ShadowMatrices};
