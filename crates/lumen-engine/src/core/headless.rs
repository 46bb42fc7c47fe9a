use crate::backend::Backend;
use crate::error::GpuResult;
use crate::time::GameTime;

use super::App;

/// Fixed step used when no wall clock drives the loop.
pub const HEADLESS_DT: f32 = 1.0 / 60.0;

/// Drives `frames` iterations of the app loop without a window.
///
/// Time advances by [`HEADLESS_DT`] per frame, so runs are reproducible.
pub fn run_headless<A: App + ?Sized>(
    app: &mut A,
    backend: &mut dyn Backend,
    frames: u64,
) -> GpuResult<()> {
    app.init(backend)?;
    let (w, h) = backend.surface_size();
    app.on_resize(backend, w, h)?;

    for frame_index in 0..frames {
        let time = GameTime {
            dt: HEADLESS_DT,
            total: (frame_index + 1) as f32 * HEADLESS_DT,
            frame_index,
        };
        app.update(backend, time)?;
        app.draw(backend)?;
    }

    log::info!("headless: {frames} frames on {}", backend.name());
    app.shutdown(backend)
}
