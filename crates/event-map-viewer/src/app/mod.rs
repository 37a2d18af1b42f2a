//! Application module
//!
//! This module provides the main application structure:
//! - Full-screen map view on one of the two surfaces
//! - Toggleable sidebar with the date picker and the upcoming list
//! - One-shot event loading
//! - Coalesced resize signals when the map area changes size

pub(crate) mod loader;
pub(crate) mod map;
pub(crate) mod settings;
mod ui_panels;

use crate::app::loader::{EventLoader, EventSource};
use crate::app::map::MapWidget;
use crate::app::settings::Settings;
use eframe::egui;
use event_map_lib::EventBrowser;
use instant::Instant;

/// The browser session as driven by the app
pub type Browser = EventBrowser<Box<dyn MapWidget>>;

/// Main application structure
pub struct EventMapApp {
    browser: Browser,
    loader: EventLoader,
    /// Map area size seen last frame
    map_size: Option<egui::Vec2>,
}

impl EventMapApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::from_cli();
        Self::with_settings(cc, &settings)
    }

    pub fn with_settings(cc: &eframe::CreationContext<'_>, settings: &Settings) -> Self {
        if settings.validate && cfg!(target_arch = "wasm32") {
            tracing::warn!("--validate is only supported on native; ignoring");
        }

        let vector_supported = map::probe_vector_support(cc);
        let surface = map::build_surface(vector_supported, settings, &cc.egui_ctx);
        let browser = EventBrowser::new(surface, settings.today());

        let mut source = EventSource::parse(&settings.source);
        if settings.cache_bust {
            source = source.cache_busted(chrono::Utc::now().timestamp());
        }
        let loader = EventLoader::spawn(source, cc.egui_ctx.clone());

        tracing::info!("Today is {}", browser.today());

        Self {
            browser,
            loader,
            map_size: None,
        }
    }

    /// Schedule a surface resize when the map area changed size
    fn track_map_size(&mut self, size: egui::Vec2, now: Instant) {
        match self.map_size {
            Some(previous) if previous == size => {}
            Some(_) => {
                self.map_size = Some(size);
                self.browser.request_resize(now);
            }
            None => self.map_size = Some(size),
        }
    }
}

#[profiling::all_functions]
impl eframe::App for EventMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(outcome) = self.loader.poll() {
            self.browser.load(outcome);
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.browser.close_sidebar();
        }

        // Areas that do not count as "outside the sidebar"
        let mut inside_rects = Vec::with_capacity(3);
        inside_rects.extend(ui_panels::map_error_notice(ctx, &mut self.browser));
        inside_rects.extend(ui_panels::render_sidebar(ctx, &mut self.browser));

        let now = Instant::now();
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("map_panel");

                let response = self.browser.surface_mut().show(ui);
                self.track_map_size(response.rect.size(), now);

                inside_rects.push(ui_panels::burger_button(ui, &mut self.browser));
                ui_panels::attribution(ui, self.browser.surface().attribution());
            });

        let click = ui_panels::click_target(ctx);
        if self.browser.is_sidebar_open()
            && let Some(inside) = ui_panels::classify_click(click, &inside_rects)
        {
            self.browser.dismiss_sidebar_outside(inside);
        }

        self.browser.tick(now);
        if let Some(due) = self.browser.resize_due_in(now) {
            ctx.request_repaint_after(due);
        }
    }
}
