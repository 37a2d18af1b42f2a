//! Event Map Library - Core logic for browsing dated, geolocated events
//!
//! This library owns everything the viewer does that is not drawing: the event
//! model, the date-sorted catalog, the map-surface abstraction and the browser
//! session that drives it. It has no knowledge of egui or of which map widget
//! is active, so all of it is testable with a recording surface.
//!
//! # Architecture
//!
//! - **[`EventRecord`]**: One event as supplied by the data source
//! - **[`EventCatalog`]**: Immutable, date-sorted collection with date-range queries
//! - **[`MapSurface`]**: Capability interface over the map widget (markers, viewport, callouts)
//! - **[`EventBrowser`]**: Session state (selected date, active markers, sidebar) driving a surface
//! - **[`Coalescer`]**: Schedule-or-replace utility used to debounce resize signals
//!
//! # Complexity
//!
//! - **Load**: O(N log N) for the initial sort
//! - **Render(date)**: O(log N + K) where K = events on that date
//! - **Upcoming list**: O(log N + L) where L = list limit

mod browser;
mod catalog;
mod coalesce;
mod event;
mod surface;
pub mod validate;

// Public API exports
pub use browser::{
    DATE_ZOOM, EventBrowser, LOAD_FAILED_MESSAGE, LoadState, NO_EVENTS_MESSAGE, SELECTION_ZOOM,
    UPCOMING_LIMIT, UpcomingView,
};
pub use catalog::EventCatalog;
pub use coalesce::{Coalescer, DEFAULT_RESIZE_DELAY};
pub use event::{
    COORD_TOLERANCE_DEG, DATE_FORMAT, EventId, EventRecord, coords_match, iso_date,
    normalize_date, parse_events, today_utc,
};
pub use surface::{Callout, MapSurface, MarkerHandle, StyleErrorLatch, SurfaceKind};

/// Failure to obtain the event collection from the data source
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid event data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors returned by browser operations driven by user input
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    #[error("No date is selected")]
    NoSelectedDate,
}

/// Non-fatal map widget failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("Map style failed to load: {0}")]
    Style(String),

    #[error("Map tiles failed to load: {0}")]
    Tiles(String),
}

pub type Result<T> = std::result::Result<T, BrowserError>;
