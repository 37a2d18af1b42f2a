//! Tile sources for the two map styles

use walkers::TileId;
use walkers::sources::{Attribution, TileSource};

/// Highest zoom level served for the region
pub const MAX_ZOOM: u8 = 17;

/// OpenStreetMap raster tiles, spread over the a/b/c mirrors
pub struct RegionOsm;

impl TileSource for RegionOsm {
    fn tile_url(&self, tile_id: TileId) -> String {
        let mirror = ['a', 'b', 'c'][((tile_id.x + tile_id.y) % 3) as usize];
        format!(
            "https://{}.tile.openstreetmap.org/{}/{}/{}.png",
            mirror, tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenStreetMap contributors",
            url: "https://www.openstreetmap.org/copyright",
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        MAX_ZOOM
    }
}

/// Raster rendering of a hosted MapTiler style
#[derive(Debug, Clone)]
pub struct HostedStyle {
    style: String,
    key: Option<String>,
}

impl HostedStyle {
    pub fn new(style: impl Into<String>, key: Option<String>) -> Self {
        Self {
            style: style.into(),
            key,
        }
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// URL of a single tile, also used for the startup probe
    pub fn url_for(&self, zoom: u8, x: u32, y: u32) -> String {
        format!(
            "https://api.maptiler.com/maps/{}/256/{}/{}/{}.png?key={}",
            self.style,
            zoom,
            x,
            y,
            self.key.as_deref().unwrap_or_default()
        )
    }
}

impl TileSource for HostedStyle {
    fn tile_url(&self, tile_id: TileId) -> String {
        self.url_for(tile_id.zoom, tile_id.x, tile_id.y)
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© MapTiler © OpenStreetMap contributors",
            url: "https://www.maptiler.com/copyright/",
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        MAX_ZOOM
    }
}
