//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `GameTimer` per render loop, stopped while the window is minimized
//! - call `tick()` once per frame to obtain `GameTime`
//! - feed `GameTime::total` to `FrameStats` for the title bar counter

mod game_timer;
mod stats;

pub use game_timer::{GameTime, GameTimer};
pub use stats::FrameStats;
