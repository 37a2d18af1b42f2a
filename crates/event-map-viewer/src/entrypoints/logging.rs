//! Logging setup for both targets.
//!
//! Native logs go through `tracing_subscriber::fmt` filtered by `RUST_LOG`,
//! web logs go to the browser console filtered by the `LOG_LEVEL` slot.

/// Filter used when `RUST_LOG` is unset or unparsable
#[cfg(not(target_arch = "wasm32"))]
fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,eframe::native=warn,walkers=info,egui::context=warn,wgpu_core=warn,wgpu_hal=warn,naga=warn"
    } else {
        "info,eframe::native=warn,egui::context=warn,wgpu_core=warn,wgpu_hal=warn"
    }
}

/// Install the global subscriber. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(default_filter()), false),
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .try_init();

    if !from_env {
        tracing::info!("RUST_LOG not set, using default: {}", default_filter());
    }
}

/// Map a `LOG_LEVEL` value to a level, falling back by build type.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn parse_level(raw: Option<&str>) -> tracing::Level {
    match raw.map(|s| s.trim().to_uppercase()).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") => tracing::Level::INFO,
        Some("WARN") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        _ if cfg!(debug_assertions) => tracing::Level::DEBUG,
        _ => tracing::Level::INFO,
    }
}

/// Console logging for the browser, plus a panic hook that reports there too.
#[cfg(target_arch = "wasm32")]
pub fn setup_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_wasm::WASMLayerConfigBuilder;

    let level = super::cli::get_env::<String>("LOG_LEVEL");
    let mut builder = WASMLayerConfigBuilder::new();
    builder.set_max_level(parse_level(level.as_deref()));
    let _ = tracing_subscriber::registry()
        .with(tracing_wasm::WASMLayer::new(builder.build()))
        .try_init();

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
}
