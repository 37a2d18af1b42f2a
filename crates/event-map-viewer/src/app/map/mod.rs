//! Map surfaces
//!
//! Two implementations of [`MapSurface`] built on walkers: [`VectorSurface`]
//! (needs the wgpu renderer, animated viewport, selectable style) and
//! [`RasterSurface`] (works with any renderer, snapping viewport). One of them
//! is picked at startup by [`build_surface`] and kept for the session.

mod locate;
mod markers;
mod raster;
mod tiles;
mod vector;

pub use raster::RasterSurface;
pub use vector::VectorSurface;

use crate::app::settings::{Settings, StyleChoice};
use crate::entrypoints::cli::get_env;
use egui::{Vec2, vec2};
use event_map_lib::{EventId, EventRecord, MapError, MapSurface, MarkerHandle, StyleErrorLatch};
use geo::{Coord, Point, Rect};
use markers::{ClickSlot, MarkerLayer};
use std::sync::Arc;
use tokio::sync::mpsc;
use walkers::{HttpTiles, Map, MapMemory};

/// Region shown by default: min lon, min lat, max lon, max lat
pub const REGION_BOUNDS: [f64; 4] = [19.30, 54.00, 23.10, 55.60];
/// Initial center as (lon, lat)
pub const HOME: (f64, f64) = (20.45, 54.71);
pub const HOME_ZOOM: f64 = 10.0;

/// Runtime slot holding the hosted style API key
pub const STYLE_KEY_SLOT: &str = "MAP_STYLE_KEY";

/// Pixel size of one tile at integer zoom, used to convert the viewport to degrees
const TILE_SIZE_PX: f64 = 256.0;

pub fn region_bounds() -> Rect<f64> {
    let [min_lon, min_lat, max_lon, max_lat] = REGION_BOUNDS;
    Rect::new(
        Coord {
            x: min_lon,
            y: min_lat,
        },
        Coord {
            x: max_lon,
            y: max_lat,
        },
    )
}

/// Initial viewport and its limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewConfig {
    pub home: Point<f64>,
    pub home_zoom: f64,
    pub max_zoom: f64,
    pub bounds: Option<Rect<f64>>,
}

impl ViewConfig {
    pub fn region(bounded: bool) -> Self {
        Self {
            home: Point::new(HOME.0, HOME.1),
            home_zoom: HOME_ZOOM,
            max_zoom: f64::from(tiles::MAX_ZOOM),
            bounds: bounded.then(region_bounds),
        }
    }
}

/// Which tiles the vector surface draws
#[derive(Debug, Clone)]
pub enum MapStyle {
    Inline,
    Hosted { style: String, key: Option<String> },
}

impl MapStyle {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.style {
            StyleChoice::Inline => Self::Inline,
            StyleChoice::Hosted => {
                let key = get_env::<String>(STYLE_KEY_SLOT).filter(|k| !k.trim().is_empty());
                Self::Hosted {
                    style: settings.hosted_style.clone(),
                    key,
                }
            }
        }
    }
}

/// Keep `center` such that a `viewport`-sized view at `zoom` stays inside `bounds`.
///
/// When the view is larger than the bounds on an axis, it is centered on that axis.
pub fn clamp_center(
    center: Point<f64>,
    zoom: f64,
    viewport: Vec2,
    bounds: Rect<f64>,
) -> Point<f64> {
    let deg_per_px = 360.0 / (TILE_SIZE_PX * 2f64.powf(zoom));
    let half_w = f64::from(viewport.x) * deg_per_px / 2.0;
    let half_h = f64::from(viewport.y) * deg_per_px * center.y().to_radians().cos() / 2.0;

    let axis = |value: f64, min: f64, max: f64, half: f64| {
        if max - min <= 2.0 * half {
            (min + max) / 2.0
        } else {
            value.clamp(min + half, max - half)
        }
    };

    let (min, max) = (bounds.min(), bounds.max());
    Point::new(
        axis(center.x(), min.x, max.x, half_w),
        axis(center.y(), min.y, max.y, half_h),
    )
}

fn to_walkers(point: Point<f64>) -> walkers::Position {
    walkers::lat_lon(point.y(), point.x())
}

/// Overlay buttons on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavButton {
    ZoomIn,
    ZoomOut,
    Reset,
    Locate,
}

impl NavButton {
    fn label(self) -> &'static str {
        match self {
            Self::ZoomIn => "➕",
            Self::ZoomOut => "➖",
            Self::Reset => "🏠",
            Self::Locate => "📍",
        }
    }

    fn hover_text(self) -> &'static str {
        match self {
            Self::ZoomIn => "Zoom in",
            Self::ZoomOut => "Zoom out",
            Self::Reset => "Reset view",
            Self::Locate => "Show my location",
        }
    }
}

/// Column of navigation buttons in the top-right corner of `map_rect`
fn nav_controls(
    ui: &mut egui::Ui,
    map_rect: egui::Rect,
    buttons: &[NavButton],
) -> Option<NavButton> {
    let size = vec2(32.0, 32.0);
    let margin = 10.0;
    let mut pressed = None;

    for (i, button) in buttons.iter().enumerate() {
        let min = map_rect.right_top() + vec2(-size.x - margin, margin + i as f32 * (size.y + 4.0));
        let rect = egui::Rect::from_min_size(min, size);
        let response = ui
            .put(rect, egui::Button::new(button.label()))
            .on_hover_text(button.hover_text());
        if response.clicked() {
            pressed = Some(*button);
        }
    }

    pressed
}

/// State shared by both surfaces: tiles, viewport, markers and map errors
pub struct MapCore {
    tiles: HttpTiles,
    memory: MapMemory,
    markers: MarkerLayer,
    view: ViewConfig,
    clicks: Arc<ClickSlot>,
    /// Last known container size; refreshed on the next frame after a resize
    viewport: Option<Vec2>,
    clamp_pending: bool,
    errors: StyleErrorLatch,
    error_rx: Option<mpsc::UnboundedReceiver<MapError>>,
    attribution: &'static str,
    ctx: egui::Context,
}

impl MapCore {
    pub fn new(
        tiles: HttpTiles,
        attribution: &'static str,
        view: ViewConfig,
        ctx: egui::Context,
    ) -> Self {
        let mut memory = MapMemory::default();
        memory.center_at(to_walkers(view.home));
        let _ = memory.set_zoom(view.home_zoom);

        Self {
            tiles,
            memory,
            markers: MarkerLayer::default(),
            view,
            clicks: Arc::new(ClickSlot::default()),
            viewport: None,
            clamp_pending: true,
            errors: StyleErrorLatch::default(),
            error_rx: None,
            attribution,
            ctx,
        }
    }

    /// Request one tile in the background; a failure is reported as a map error.
    pub fn probe(&mut self, url: String, to_error: fn(String) -> MapError) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = self.ctx.clone();
        tracing::debug!("Probing map tiles at {url}");

        ehttp::fetch(ehttp::Request::get(url), move |result| {
            let failure = match result {
                Ok(response) if response.ok => None,
                Ok(response) => Some(format!("HTTP {} {}", response.status, response.status_text)),
                Err(err) => Some(err),
            };
            match failure {
                Some(reason) => {
                    let _ = tx.send(to_error(reason));
                    ctx.request_repaint();
                }
                None => tracing::debug!("Map tile probe succeeded"),
            }
        });

        self.error_rx = Some(rx);
    }

    fn drain_errors(&mut self) {
        if let Some(rx) = self.error_rx.as_mut() {
            while let Ok(err) = rx.try_recv() {
                self.errors.report(err);
            }
        }
    }

    pub fn center(&self) -> Point<f64> {
        self.memory
            .detached()
            .map(|p| Point::new(p.x(), p.y()))
            .unwrap_or(self.view.home)
    }

    pub fn zoom(&self) -> f64 {
        self.memory.zoom()
    }

    pub fn view(&self) -> &ViewConfig {
        &self.view
    }

    /// Move the viewport immediately
    pub fn jump_to(&mut self, position: Point<f64>, zoom: f64) {
        self.memory.center_at(to_walkers(position));
        let _ = self.memory.set_zoom(zoom.min(self.view.max_zoom));
    }

    pub fn apply_nav(&mut self, button: NavButton) {
        match button {
            NavButton::ZoomIn => {
                if self.memory.zoom() < self.view.max_zoom {
                    let _ = self.memory.zoom_in();
                }
            }
            NavButton::ZoomOut => {
                let _ = self.memory.zoom_out();
            }
            NavButton::Reset => self.jump_to(self.view.home, self.view.home_zoom),
            NavButton::Locate => tracing::debug!("Locate is answered by the surface"),
        }
    }

    fn apply_limits(&mut self) {
        if self.memory.zoom() > self.view.max_zoom {
            let _ = self.memory.set_zoom(self.view.max_zoom);
        }
        if let (Some(bounds), Some(viewport)) = (self.view.bounds, self.viewport) {
            let center = self.center();
            let clamped = clamp_center(center, self.memory.zoom(), viewport, bounds);
            if clamped != center {
                self.memory.center_at(to_walkers(clamped));
            }
        }
    }

    /// Draw the map with its markers and apply clicks and limits
    pub fn show(&mut self, ui: &mut egui::Ui) -> egui::Response {
        profiling::scope!("MapCore::show");
        self.drain_errors();

        let plugin = self.markers.plugin(self.clicks.clone());
        let map = Map::new(Some(&mut self.tiles), &mut self.memory, to_walkers(self.view.home))
            .with_plugin(plugin);
        let response = ui.add(map);

        if let Some(click) = self.clicks.take() {
            self.markers.handle_click(click);
            self.ctx.request_repaint();
        }

        if self.clamp_pending {
            self.clamp_pending = false;
            let size = response.rect.size();
            if self.viewport != Some(size) {
                tracing::debug!("Map viewport is now {:.0}x{:.0}", size.x, size.y);
                self.viewport = Some(size);
            }
        }
        self.apply_limits();

        response
    }

    pub fn place_marker(&mut self, id: EventId, event: &EventRecord) -> MarkerHandle {
        self.ctx.request_repaint();
        self.markers.place(id, event)
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
        self.ctx.request_repaint();
    }

    pub fn open_callout(&mut self, marker: MarkerHandle) {
        self.markers.toggle_callout(marker);
        self.ctx.request_repaint();
    }

    /// Re-read the container size on the next frame
    pub fn resize(&mut self) {
        self.clamp_pending = true;
        self.ctx.request_repaint();
    }

    pub fn request_repaint(&self) {
        self.ctx.request_repaint();
    }
}

/// A map surface that can also draw itself
pub trait MapWidget: MapSurface {
    fn core(&self) -> &MapCore;

    fn core_mut(&mut self) -> &mut MapCore;

    fn show(&mut self, ui: &mut egui::Ui) -> egui::Response;

    /// First map error of the session, until dismissed
    fn error_notice(&self) -> Option<&MapError> {
        self.core().errors.notice()
    }

    fn dismiss_error(&mut self) {
        self.core_mut().errors.dismiss();
    }

    fn attribution(&self) -> &'static str {
        self.core().attribution
    }
}

/// Whether the vector surface can run with this renderer
pub fn probe_vector_support(cc: &eframe::CreationContext<'_>) -> bool {
    cc.wgpu_render_state.is_some()
}

/// Pick and build the surface for this session
pub fn build_surface(
    vector_supported: bool,
    settings: &Settings,
    ctx: &egui::Context,
) -> Box<dyn MapWidget> {
    let view = ViewConfig::region(!settings.unbounded);

    let surface: Box<dyn MapWidget> = if vector_supported {
        Box::new(VectorSurface::new(
            MapStyle::from_settings(settings),
            view,
            ctx.clone(),
        ))
    } else {
        Box::new(RasterSurface::new(view, ctx.clone()))
    };

    tracing::info!(
        "Using {} map surface ({})",
        surface.kind().name(),
        if view.bounds.is_some() {
            "bounded"
        } else {
            "unbounded"
        }
    );
    surface
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point<f64>, b: Point<f64>) -> bool {
        (a.x() - b.x()).abs() < 1e-9 && (a.y() - b.y()).abs() < 1e-9
    }

    #[test]
    fn test_region_view() {
        let view = ViewConfig::region(true);
        assert_eq!(view.home, Point::new(20.45, 54.71));
        assert_eq!(view.home_zoom, 10.0);
        assert_eq!(view.max_zoom, 17.0);
        let bounds = view.bounds.unwrap();
        assert_eq!(bounds.min(), Coord { x: 19.30, y: 54.00 });
        assert_eq!(bounds.max(), Coord { x: 23.10, y: 55.60 });

        assert_eq!(ViewConfig::region(false).bounds, None);
    }

    #[test]
    fn test_clamp_center_keeps_interior_point() {
        let center = Point::new(20.45, 54.71);
        let clamped = clamp_center(center, 14.0, vec2(800.0, 600.0), region_bounds());
        assert!(close(clamped, center));
    }

    #[test]
    fn test_clamp_center_pulls_outside_point_in() {
        let clamped = clamp_center(
            Point::new(30.0, 60.0),
            14.0,
            vec2(800.0, 600.0),
            region_bounds(),
        );
        assert!(clamped.x() < 23.10 && clamped.x() > 23.0);
        assert!(clamped.y() < 55.60 && clamped.y() > 55.5);
    }

    #[test]
    fn test_clamp_center_depends_on_viewport() {
        let point = Point::new(19.35, 54.71);
        let small = clamp_center(point, 10.0, vec2(100.0, 100.0), region_bounds());
        let large = clamp_center(point, 10.0, vec2(1000.0, 100.0), region_bounds());
        assert!(large.x() > small.x());
    }

    #[test]
    fn test_clamp_center_centers_when_view_exceeds_bounds() {
        let clamped = clamp_center(
            Point::new(0.0, 0.0),
            2.0,
            vec2(1920.0, 1080.0),
            region_bounds(),
        );
        assert!(close(clamped, Point::new(21.2, 54.8)));
    }
}
