#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

// The binary uses the library, not duplicate modules
#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    event_map_viewer::run_native()
}

// On web the page calls `WebHandle::start` instead
#[cfg(target_arch = "wasm32")]
fn main() {}
