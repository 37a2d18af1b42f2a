use super::tiles::RegionOsm;
use super::{MapCore, MapWidget, NavButton, ViewConfig, nav_controls};
use event_map_lib::{EventId, EventRecord, MapError, MapSurface, MarkerHandle, SurfaceKind};
use geo::Point;
use walkers::HttpTiles;
use walkers::sources::TileSource;

/// Fallback surface: OpenStreetMap tiles, snapping viewport, zoom buttons
pub struct RasterSurface {
    core: MapCore,
}

impl RasterSurface {
    pub fn new(view: ViewConfig, ctx: egui::Context) -> Self {
        let probe_url = RegionOsm.tile_url(walkers::TileId {
            x: 0,
            y: 0,
            zoom: 0,
        });
        let attribution = RegionOsm.attribution().text;
        let tiles = HttpTiles::new(RegionOsm, ctx.clone());
        let mut core = MapCore::new(tiles, attribution, view, ctx);
        core.probe(probe_url, MapError::Tiles);
        Self { core }
    }
}

impl MapSurface for RasterSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Raster
    }

    fn place_marker(&mut self, id: EventId, event: &EventRecord) -> MarkerHandle {
        self.core.place_marker(id, event)
    }

    fn clear_markers(&mut self) {
        self.core.clear_markers();
    }

    fn focus(&mut self, position: Point<f64>, zoom: f64) {
        self.core.jump_to(position, zoom);
        self.core.request_repaint();
    }

    fn open_callout(&mut self, marker: MarkerHandle) {
        self.core.open_callout(marker);
    }

    fn resize(&mut self) {
        self.core.resize();
    }
}

impl MapWidget for RasterSurface {
    fn core(&self) -> &MapCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MapCore {
        &mut self.core
    }

    fn show(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let response = self.core.show(ui);
        if let Some(button) = nav_controls(
            ui,
            response.rect,
            &[NavButton::ZoomIn, NavButton::ZoomOut],
        ) {
            self.core.apply_nav(button);
        }
        response
    }
}
