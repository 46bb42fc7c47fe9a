use crate::backend::Backend;
use crate::error::GpuResult;
use crate::input::InputEvent;
use crate::time::GameTime;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`crate::window::Runtime`] or
/// [`super::run_headless`].
///
/// Per loop iteration the driver calls `update` then `draw`. GPU failures
/// returned from any callback are fatal and end the loop.
pub trait App {
    /// Called once the backend exists, before the first frame.
    fn init(&mut self, backend: &mut dyn Backend) -> GpuResult<()>;

    /// Called for every surface size change, including zero-sized ones
    /// while minimized.
    fn on_resize(&mut self, backend: &mut dyn Backend, width: u32, height: u32) -> GpuResult<()>;

    fn update(&mut self, backend: &mut dyn Backend, time: GameTime) -> GpuResult<()>;

    fn draw(&mut self, backend: &mut dyn Backend) -> GpuResult<()>;

    /// Mouse and keyboard input as plain values.
    fn on_input(&mut self, event: InputEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once before the backend is dropped.
    fn shutdown(&mut self, backend: &mut dyn Backend) -> GpuResult<()> {
        let _ = backend;
        Ok(())
    }
}
