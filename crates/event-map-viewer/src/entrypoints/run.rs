//! Native entry point
//!
//! Sets up logging and the tokio runtime, then either validates the event
//! data (`--validate`) or opens the window.

use super::{logging, metadata};
use crate::app::loader::{EventSource, fetch_blocking};
use crate::{APP_NAME, EventMapApp, Settings};
use event_map_lib::validate::validate_records;
use std::process::ExitCode;

/// Run the application on native (desktop) platforms. Call this from `main.rs`.
pub fn run_native() -> ExitCode {
    logging::setup_logging();
    metadata::log_version_info();

    let settings = Settings::from_cli();
    if settings.validate {
        return validate_source(&settings);
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!("Failed to create Tokio runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    // Loader tasks are spawned from the UI thread
    let _guard = rt.enter();

    let renderer: eframe::Renderer = settings.renderer.into();
    let native_options = eframe::NativeOptions {
        renderer,
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([360.0, 480.0])
            .with_title(APP_NAME),
        ..Default::default()
    };

    let result = eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(move |cc| Ok(Box::new(EventMapApp::with_settings(cc, &settings)))),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{APP_NAME} failed: {err}");
            if renderer == eframe::Renderer::Wgpu {
                tracing::error!("If the GPU renderer is unavailable, try `--renderer glow`");
            }
            ExitCode::FAILURE
        }
    }
}

/// Load the event data, print every issue found and report through the exit code
fn validate_source(settings: &Settings) -> ExitCode {
    let source = EventSource::parse(&settings.source);
    let records = match fetch_blocking(&source) {
        Ok(records) => records,
        Err(err) => {
            eprintln!("Failed to load {source}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let issues = validate_records(&records);
    if issues.is_empty() {
        println!("OK: {} events validated", records.len());
        return ExitCode::SUCCESS;
    }

    for issue in &issues {
        println!("{issue}");
    }
    println!("{} issue(s) in {} events", issues.len(), records.len());
    ExitCode::FAILURE
}
