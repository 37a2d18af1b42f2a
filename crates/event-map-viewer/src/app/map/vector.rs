use super::locate::{self, LOCATE_ZOOM, Locator};
use super::tiles::{HostedStyle, RegionOsm};
use super::{MapCore, MapStyle, MapWidget, NavButton, STYLE_KEY_SLOT, ViewConfig, nav_controls};
use event_map_lib::{EventId, EventRecord, MapError, MapSurface, MarkerHandle, SurfaceKind};
use geo::Point;
use instant::Instant;
use std::time::Duration;
use walkers::HttpTiles;
use walkers::sources::TileSource;

pub const FLIGHT_DURATION: Duration = Duration::from_millis(1200);

/// Animated viewport move
#[derive(Debug, Clone, Copy)]
pub struct Flight {
    from: Point<f64>,
    from_zoom: f64,
    to: Point<f64>,
    to_zoom: f64,
    start: Instant,
    duration: Duration,
}

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

impl Flight {
    pub fn new(
        from: (Point<f64>, f64),
        to: (Point<f64>, f64),
        start: Instant,
        duration: Duration,
    ) -> Self {
        Self {
            from: from.0,
            from_zoom: from.1,
            to: to.0,
            to_zoom: to.1,
            start,
            duration,
        }
    }

    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() || now <= self.start {
            return if self.duration.is_zero() { 1.0 } else { 0.0 };
        }
        let elapsed = now.duration_since(self.start).as_secs_f64();
        (elapsed / self.duration.as_secs_f64()).min(1.0)
    }

    /// Center and zoom at `now`
    pub fn sample(&self, now: Instant) -> (Point<f64>, f64) {
        let t = ease_in_out(self.progress(now));
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        (
            Point::new(lerp(self.from.x(), self.to.x()), lerp(self.from.y(), self.to.y())),
            lerp(self.from_zoom, self.to_zoom),
        )
    }

    pub fn is_done(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// Overlay buttons of the vector surface; "locate me" only where a position exists
fn control_set() -> &'static [NavButton] {
    if locate::is_supported() {
        &[
            NavButton::ZoomIn,
            NavButton::ZoomOut,
            NavButton::Reset,
            NavButton::Locate,
        ]
    } else {
        &[NavButton::ZoomIn, NavButton::ZoomOut, NavButton::Reset]
    }
}

/// Surface for the wgpu renderer: chosen style, fly-to animation, full controls
pub struct VectorSurface {
    core: MapCore,
    flight: Option<Flight>,
    locator: Locator,
}

impl VectorSurface {
    pub fn new(style: MapStyle, view: ViewConfig, ctx: egui::Context) -> Self {
        match style {
            MapStyle::Inline => {
                let probe_url = RegionOsm.tile_url(walkers::TileId {
                    x: 0,
                    y: 0,
                    zoom: 0,
                });
                let attribution = RegionOsm.attribution().text;
                let tiles = HttpTiles::new(RegionOsm, ctx.clone());
                let mut core = MapCore::new(tiles, attribution, view, ctx);
                core.probe(probe_url, MapError::Tiles);
                Self {
                    core,
                    flight: None,
                    locator: Locator::default(),
                }
            }
            MapStyle::Hosted { style, key } => {
                let source = HostedStyle::new(style, key);
                if !source.has_key() {
                    tracing::warn!(
                        "{STYLE_KEY_SLOT} is not set; the hosted map style will fail to load"
                    );
                }
                let probe_url = source.url_for(0, 0, 0);
                let attribution = source.attribution().text;
                let tiles = HttpTiles::new(source, ctx.clone());
                let mut core = MapCore::new(tiles, attribution, view, ctx);
                core.probe(probe_url, MapError::Style);
                Self {
                    core,
                    flight: None,
                    locator: Locator::default(),
                }
            }
        }
    }
}

impl MapSurface for VectorSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Vector
    }

    fn place_marker(&mut self, id: EventId, event: &EventRecord) -> MarkerHandle {
        self.core.place_marker(id, event)
    }

    fn clear_markers(&mut self) {
        self.core.clear_markers();
    }

    fn focus(&mut self, position: Point<f64>, zoom: f64) {
        let target_zoom = zoom.min(self.core.view().max_zoom);
        self.flight = Some(Flight::new(
            (self.core.center(), self.core.zoom()),
            (position, target_zoom),
            Instant::now(),
            FLIGHT_DURATION,
        ));
        self.core.request_repaint();
    }

    fn open_callout(&mut self, marker: MarkerHandle) {
        self.core.open_callout(marker);
    }

    fn resize(&mut self) {
        self.core.resize();
    }
}

impl MapWidget for VectorSurface {
    fn core(&self) -> &MapCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MapCore {
        &mut self.core
    }

    fn show(&mut self, ui: &mut egui::Ui) -> egui::Response {
        match self.locator.poll() {
            Some(Ok(position)) => {
                tracing::info!("Device position: {:.5}, {:.5}", position.y(), position.x());
                self.focus(position, LOCATE_ZOOM);
            }
            Some(Err(err)) => tracing::warn!("Could not get the device position: {err}"),
            None => {}
        }

        let now = Instant::now();
        if let Some(flight) = self.flight {
            let (center, zoom) = flight.sample(now);
            self.core.jump_to(center, zoom);
            if flight.is_done(now) {
                self.flight = None;
            } else {
                ui.ctx().request_repaint();
            }
        }

        let response = self.core.show(ui);
        if response.dragged() && self.flight.take().is_some() {
            tracing::trace!("Flight interrupted by drag");
        }

        match nav_controls(ui, response.rect, control_set()) {
            Some(NavButton::Locate) => self.locator.request(ui.ctx()),
            Some(button) => {
                self.flight = None;
                self.core.apply_nav(button);
            }
            None => {}
        }

        response
    }
}
