//! Core engine-facing contracts.
//!
//! This module defines the interface between a driver (the winit runtime or
//! the headless loop) and the application.

mod app;
mod headless;

pub use app::{App, AppControl};
pub use headless::{run_headless, HEADLESS_DT};
