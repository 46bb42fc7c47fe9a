mod app;
mod args;
mod geometry;
mod shaders;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_engine::backend::{Completion, HeadlessBackend};
use lumen_engine::core::run_headless;
use lumen_engine::device::GpuInit;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::render::RendererConfig;
use lumen_engine::window::{Runtime, RuntimeConfig};

use crate::app::DemoApp;
use crate::args::Args;

const HEADLESS_SIZE: (u32, u32) = (1280, 720);

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args = Args::parse();
    let config = RendererConfig {
        frames_in_flight: args.frames_in_flight,
        ..RendererConfig::default()
    };
    let mut app = DemoApp::new(shaders::library(), config);

    match args.headless {
        Some(frames) => {
            let (w, h) = HEADLESS_SIZE;
            let mut backend = HeadlessBackend::new(w, h, Completion::Immediate);
            run_headless(&mut app, &mut backend, frames).context("headless run failed")?;
            log::info!(
                "headless: {} presents, {} command lists validated",
                backend.presents(),
                backend.executed().len()
            );
            Ok(())
        }
        None => Runtime::run(
            RuntimeConfig {
                title: "lumen demo".to_string(),
                ..RuntimeConfig::default()
            },
            GpuInit::default(),
            app,
        ),
    }
}
