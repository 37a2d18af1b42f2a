//! Event Map - Application Library
//!
//! The eframe application around `event-map-lib`: it loads the event data,
//! picks one of the two walkers-backed map surfaces and wires the sidebar
//! (date picker, upcoming list) to the browser session.

mod app;
mod entrypoints;

pub use app::EventMapApp;
pub use app::settings::Settings;

#[cfg(not(target_arch = "wasm32"))]
pub use entrypoints::run::run_native;

#[cfg(target_arch = "wasm32")]
pub use entrypoints::web::WebHandle;

/// Window title and log name
pub const APP_NAME: &str = "Event Map";
