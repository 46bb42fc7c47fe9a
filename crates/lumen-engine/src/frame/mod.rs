//! Frame resources in flight.
//!
//! Each frame slot owns a command list and upload buffers; a [`FrameRing`]
//! rotates through slots and only hands one out once the GPU is done with it.

mod constants;
mod pass;
mod resource;
mod ring;

pub use constants::{
    InstanceData, LightData, MaterialData, PassConstants, PassView, SsrParams, MAX_LIGHTS,
};
pub use pass::{PassAllocator, PassHandle, PassLayout};
pub use resource::{globals_layout, FrameResource, FrameSizes};
pub use ring::{FrameRing, SlotState};
