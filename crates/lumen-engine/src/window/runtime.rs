use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl};
use crate::device::{Gpu, GpuInit};
use crate::error::GpuResult;
use crate::input::platform::winit::translate_window_event;
use crate::input::InputState;
use crate::time::{FrameStats, GameTimer};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the windowed loop.
pub struct Runtime;

impl Runtime {
    /// Opens one window, runs `app` until it exits or the window closes and
    /// returns the first fatal error, if any.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    input: InputState,
    timer: GameTimer,
    stats: FrameStats,

    /// Set while the window is minimized (zero-sized).
    minimized: bool,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            input: InputState::default(),
            timer: GameTimer::new(),
            stats: FrameStats::default(),
            minimized: false,
            exit_requested: false,
            error: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let mut entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let app = &mut self.app;
        entry
            .with_gpu_mut(|gpu| app.init(gpu))
            .context("application init failed")?;

        self.entry = Some(entry);
        self.timer.reset();
        Ok(())
    }

    /// Runs `f` against the app and the window's GPU. A returned error is
    /// fatal.
    fn with_app<F>(&mut self, event_loop: &ActiveEventLoop, f: F)
    where
        F: FnOnce(&mut A, &mut Gpu<'_>) -> GpuResult<()>,
    {
        let Some(entry) = self.entry.as_mut() else { return };
        let app = &mut self.app;
        if let Err(e) = entry.with_gpu_mut(|gpu| f(app, gpu)) {
            log::error!("{e}");
            self.fail(event_loop, e.into());
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self.request_exit(event_loop);
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            return;
        }
        self.exit_requested = true;
        // Drain the GPU before the window and device go away.
        self.with_app(event_loop, |app, gpu| app.shutdown(gpu));
        self.entry = None;
        event_loop.exit();
    }

    fn on_resize(&mut self, event_loop: &ActiveEventLoop, width: u32, height: u32) {
        let minimized = width == 0 || height == 0;
        if minimized != self.minimized {
            log::debug!("runtime: {}", if minimized { "minimized" } else { "restored" });
            if minimized {
                self.timer.stop();
            } else {
                self.timer.start();
            }
            self.minimized = minimized;
        }
        self.with_app(event_loop, |app, gpu| app.on_resize(gpu, width, height));
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.minimized {
            return;
        }
        let time = self.timer.tick();
        if let Some((fps, mspf)) = self.stats.frame(time.total) {
            let title = FrameStats::title(&self.config.title, fps, mspf);
            if let Some(entry) = &self.entry {
                entry.with_window(|w| w.set_title(&title));
            }
        }
        self.with_app(event_loop, |app, gpu| {
            app.update(gpu, time)?;
            app.draw(gpu)
        });
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.fail(event_loop, e);
            return;
        }

        if let Some(entry) = &self.entry {
            let size = entry.with_window(|w| w.inner_size());
            self.on_resize(event_loop, size.width, size.height);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw while visible.
        if !self.minimized {
            if let Some(entry) = &self.entry {
                entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            return;
        }

        if let Some(ev) = translate_window_event(&mut self.input, &event) {
            if self.app.on_input(ev) == AppControl::Exit {
                self.request_exit(event_loop);
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::Resized(size) => self.on_resize(event_loop, size.width, size.height),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = &self.entry {
                    let size = entry.with_window(|w| w.inner_size());
                    self.on_resize(event_loop, size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => self.frame(event_loop),

            _ => {}
        }
    }
}
