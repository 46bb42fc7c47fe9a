//! wgpu device, surface and GPU object management.
//!
//! [`Gpu`] is the [`crate::backend::Backend`] used on a real window:
//! - creates the wgpu Instance/Adapter/Device/Queue
//! - creates & configures the Surface (swap chain)
//! - maps typed handles to wgpu objects and replays command lists

mod convert;
mod error;
mod exec;
mod gpu;
mod init;
mod registry;
mod signals;
mod surface;

pub use error::SurfaceErrorAction;
pub use gpu::Gpu;
pub use init::GpuInit;
