// Shared modules
pub(crate) mod cli;
pub(crate) mod logging;
pub(crate) mod metadata;

// Entry points
#[cfg(not(target_arch = "wasm32"))]
pub mod run;
#[cfg(target_arch = "wasm32")]
pub mod web;
