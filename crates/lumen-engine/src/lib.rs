//! Lumen engine crate.
//!
//! Frame-resource and GPU submission pipeline: triple-buffered per-frame
//! uploads synchronized by a fence, command lists with explicit resource
//! state transitions, and the render targets of a small multi-pass renderer.
//! Runs on wgpu behind a winit window or on the headless validating backend.

pub mod backend;
pub mod command;
pub mod core;
pub mod device;
pub mod error;
pub mod frame;
pub mod input;
pub mod logging;
pub mod render;
pub mod resource;
pub mod scene;
pub mod sync;
pub mod targets;
pub mod time;
pub mod upload;
pub mod window;
