//! EventBrowser - session state driving a map surface
//!
//! The browser owns the loaded catalog, the selected date, the markers
//! currently on the map and the sidebar flag. Every user interaction (date
//! change, list click, sidebar controls, resize signals) goes through it.

use crate::validate::validate_records;
use crate::{
    BrowserError, Coalescer, EventCatalog, EventId, EventRecord, LoadError, MapSurface,
    MarkerHandle, Result, coords_match, iso_date, normalize_date,
};
use chrono::{Days, NaiveDate};
use geo::Point;
use instant::Instant;
use std::time::Duration;

/// Zoom used when the viewport follows a date change
pub const DATE_ZOOM: f64 = 12.0;

/// Zoom used when a single event is picked from the list
pub const SELECTION_ZOOM: f64 = 14.0;

/// Maximum number of entries in the upcoming list
pub const UPCOMING_LIMIT: usize = 100;

/// Shown in the list area when nothing is upcoming
pub const NO_EVENTS_MESSAGE: &str = "No events found";

/// Shown in the list area when the data source could not be loaded
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load events";

/// Lifecycle of the event data
#[derive(Debug)]
pub enum LoadState {
    /// Waiting for the data source
    Pending,
    /// Events loaded (possibly zero of them)
    Ready(EventCatalog),
    /// The load failed; terminal for the session
    Failed,
}

/// What the upcoming-list area should show
#[derive(Debug)]
pub enum UpcomingView<'a> {
    Loading,
    Placeholder(&'static str),
    Entries(Vec<(EventId, &'a EventRecord)>),
}

/// A marker currently placed on the surface
#[derive(Debug, Clone, Copy)]
struct ActiveMarker {
    handle: MarkerHandle,
    event: EventId,
    position: Point<f64>,
}

/// Browsing session over a map surface
pub struct EventBrowser<S: MapSurface> {
    surface: S,
    state: LoadState,
    /// Today's date as `YYYY-MM-DD`
    today: String,
    selected_date: Option<String>,
    upcoming: Vec<EventId>,
    active_markers: Vec<ActiveMarker>,
    sidebar_open: bool,
    resize: Coalescer<()>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<S: MapSurface> EventBrowser<S> {
    /// Create a browser waiting for its data, with today's date fixed for the session
    pub fn new(surface: S, today: NaiveDate) -> Self {
        Self {
            surface,
            state: LoadState::Pending,
            today: iso_date(today),
            selected_date: None,
            upcoming: Vec::new(),
            active_markers: Vec::new(),
            sidebar_open: false,
            resize: Coalescer::default(),
        }
    }

    /// Use a different resize coalescing delay
    pub fn with_resize_delay(mut self, delay: Duration) -> Self {
        self.resize = Coalescer::new(delay);
        self
    }

    /// Apply the outcome of the data fetch.
    ///
    /// Only the first outcome is used; the data is fetched once per session.
    pub fn load(&mut self, outcome: std::result::Result<Vec<EventRecord>, LoadError>) {
        if !matches!(self.state, LoadState::Pending) {
            tracing::warn!("Ignoring repeated load; events are loaded once per session");
            return;
        }

        match outcome {
            Ok(records) => self.load_records(records),
            Err(err) => {
                tracing::error!("Failed to load events: {err}");
                self.clear_markers();
                self.state = LoadState::Failed;
            }
        }
    }

    fn load_records(&mut self, records: Vec<EventRecord>) {
        let issues = validate_records(&records);
        if !issues.is_empty() {
            tracing::warn!("{} issue(s) found in event data", issues.len());
            for issue in &issues {
                tracing::debug!("Event data issue: {issue}");
            }
        }

        let catalog = EventCatalog::new(records);
        self.upcoming = catalog.upcoming(&self.today, UPCOMING_LIMIT);
        let default_date = catalog.default_date(&self.today).map(str::to_owned);

        tracing::info!(
            "Loaded {} events ({} upcoming), default date {:?}",
            catalog.len(),
            self.upcoming.len(),
            default_date
        );

        self.state = LoadState::Ready(catalog);
        if let Some(date) = default_date {
            self.render(&date);
        }
    }

    /// Show the markers for `date`, replacing whatever was shown.
    ///
    /// Returns the number of markers placed. The viewport moves to the first
    /// matching event; it stays put when nothing matches.
    pub fn render(&mut self, date: &str) -> usize {
        profiling::scope!("EventBrowser::render");

        let LoadState::Ready(catalog) = &self.state else {
            tracing::debug!("Render({date}) ignored: no events loaded");
            return 0;
        };

        self.surface.clear_markers();
        self.active_markers.clear();

        for (id, event) in catalog.on_date(date) {
            let handle = self.surface.place_marker(id, event);
            self.active_markers.push(ActiveMarker {
                handle,
                event: id,
                position: event.position(),
            });
        }

        if let Some(first) = self.active_markers.first() {
            self.surface.focus(first.position, DATE_ZOOM);
        }
        self.selected_date = Some(date.to_owned());

        tracing::debug!("Rendered {} marker(s) for {date}", self.active_markers.len());
        self.active_markers.len()
    }

    /// Handle a click on an upcoming-list entry.
    ///
    /// Shows the event's date, zooms in on the event, opens its callout and
    /// closes the sidebar. Returns `true` if a callout was opened.
    pub fn select_from_list(&mut self, id: EventId) -> bool {
        let Some(event) = self.catalog().and_then(|c| c.get(id)).cloned() else {
            tracing::warn!("Selected unknown event {id:?}");
            self.close_sidebar();
            return false;
        };

        self.render(&event.date);

        let target = event.position();
        let marker = find_marker(&self.active_markers, id, target);

        let opened = match marker {
            Some(marker) => {
                self.surface.focus(target, SELECTION_ZOOM);
                self.surface.open_callout(marker.handle);
                true
            }
            None => false,
        };

        self.close_sidebar();
        opened
    }

    /// Handle a new date-picker value. The upcoming list is not affected.
    pub fn change_date(&mut self, raw: &str) -> Result<usize> {
        let date = normalize_date(raw).ok_or_else(|| BrowserError::InvalidDate(raw.to_owned()))?;
        Ok(self.render(&date))
    }

    /// Move the selected date by `days` (negative goes back)
    pub fn shift_date(&mut self, days: i64) -> Result<usize> {
        let current = self
            .selected_date
            .as_deref()
            .ok_or(BrowserError::NoSelectedDate)?;
        let date = NaiveDate::parse_from_str(current, crate::DATE_FORMAT)
            .map_err(|_| BrowserError::InvalidDate(current.to_owned()))?;

        let step = Days::new(days.unsigned_abs());
        let shifted = if days >= 0 {
            date.checked_add_days(step)
        } else {
            date.checked_sub_days(step)
        }
        .ok_or_else(|| BrowserError::InvalidDate(current.to_owned()))?;

        Ok(self.render(&iso_date(shifted)))
    }

    /// Burger control
    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    /// Close control
    pub fn close_sidebar(&mut self) {
        self.sidebar_open = false;
    }

    /// A click landed somewhere while the sidebar may be open.
    /// Clicks outside the sidebar (and not on the burger) close it.
    pub fn dismiss_sidebar_outside(&mut self, inside_sidebar_or_burger: bool) {
        if self.sidebar_open && !inside_sidebar_or_burger {
            self.sidebar_open = false;
        }
    }

    /// Signal that the map container may have changed size
    pub fn request_resize(&mut self, now: Instant) {
        self.resize.schedule((), now);
    }

    /// Deliver a coalesced resize to the surface if one is due.
    /// Returns `true` when the surface was resized.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.resize.poll(now).is_some() {
            self.surface.resize();
            true
        } else {
            false
        }
    }

    /// How long until a pending resize is due
    pub fn resize_due_in(&self, now: Instant) -> Option<Duration> {
        self.resize.time_until_due(now)
    }

    fn clear_markers(&mut self) {
        self.surface.clear_markers();
        self.active_markers.clear();
    }

    // === Accessors ===

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn catalog(&self) -> Option<&EventCatalog> {
        match &self.state {
            LoadState::Ready(catalog) => Some(catalog),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, LoadState::Pending)
    }

    pub fn has_failed(&self) -> bool {
        matches!(self.state, LoadState::Failed)
    }

    pub fn today(&self) -> &str {
        &self.today
    }

    pub fn selected_date(&self) -> Option<&str> {
        self.selected_date.as_deref()
    }

    /// Date picker min/max
    pub fn date_bounds(&self) -> Option<(&str, &str)> {
        self.catalog()?.date_bounds()
    }

    /// Number of markers shown for the selected date
    pub fn marker_count(&self) -> usize {
        self.active_markers.len()
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    /// Content of the upcoming-list area
    pub fn upcoming_view(&self) -> UpcomingView<'_> {
        match &self.state {
            LoadState::Pending => UpcomingView::Loading,
            LoadState::Failed => UpcomingView::Placeholder(LOAD_FAILED_MESSAGE),
            LoadState::Ready(_) if self.upcoming.is_empty() => {
                UpcomingView::Placeholder(NO_EVENTS_MESSAGE)
            }
            LoadState::Ready(catalog) => UpcomingView::Entries(
                self.upcoming
                    .iter()
                    .filter_map(|id| catalog.get(*id).map(|event| (*id, event)))
                    .collect(),
            ),
        }
    }
}

/// The marker placed for `id`, else the first one within tolerance of `target`
fn find_marker(markers: &[ActiveMarker], id: EventId, target: Point<f64>) -> Option<ActiveMarker> {
    markers
        .iter()
        .find(|m| m.event == id)
        .or_else(|| markers.iter().find(|m| coords_match(m.position, target)))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::event;
    use crate::surface::tests::{Call, RecordingSurface};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn sample_events() -> Vec<EventRecord> {
        vec![
            event("July", "2024-07-01", 54.72, 20.50),
            event("Past", "2024-06-01", 54.70, 20.40),
            event("Mid A", "2024-06-15", 54.71, 20.45),
            event("Mid B", "2024-06-15", 54.65, 20.30),
        ]
    }

    fn loaded() -> EventBrowser<RecordingSurface> {
        let mut browser = EventBrowser::new(RecordingSurface::default(), today());
        browser.load(Ok(sample_events()));
        browser
    }

    fn marker_events(browser: &EventBrowser<RecordingSurface>) -> Vec<usize> {
        browser
            .surface()
            .markers
            .iter()
            .map(|(_, id, _)| id.index())
            .collect()
    }

    #[test]
    fn test_load_sets_bounds_and_default_date() {
        let browser = loaded();
        assert_eq!(browser.date_bounds(), Some(("2024-06-01", "2024-07-01")));
        assert_eq!(browser.selected_date(), Some("2024-06-15"));
        assert_eq!(marker_events(&browser), vec![1, 2]);

        // Viewport follows the first event of the day at the date zoom
        let (focus, zoom) = browser.surface().last_focus().unwrap();
        assert_eq!(zoom, DATE_ZOOM);
        assert!(coords_match(focus, Point::new(20.45, 54.71)));
    }

    #[test]
    fn test_default_date_falls_back_to_earliest() {
        let mut browser = EventBrowser::new(RecordingSurface::default(), today());
        browser.load(Ok(vec![
            event("B", "2024-05-01", 54.0, 20.0),
            event("A", "2024-04-20", 54.1, 20.1),
        ]));
        assert_eq!(browser.selected_date(), Some("2024-04-20"));
        assert_eq!(browser.marker_count(), 1);
        assert!(matches!(
            browser.upcoming_view(),
            UpcomingView::Placeholder(NO_EVENTS_MESSAGE)
        ));
    }

    #[test]
    fn test_render_places_one_marker_per_matching_event() {
        let mut browser = loaded();
        assert_eq!(browser.render("2024-07-01"), 1);
        assert_eq!(marker_events(&browser), vec![3]);

        assert_eq!(browser.render("2024-06-15"), 2);
        assert_eq!(marker_events(&browser), vec![1, 2]);

        assert_eq!(browser.render("1999-01-01"), 0);
        assert!(browser.surface().markers.is_empty());
        assert_eq!(browser.selected_date(), Some("1999-01-01"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut browser = loaded();
        browser.render("2024-06-15");
        let first = marker_events(&browser);
        browser.render("2024-06-15");
        assert_eq!(marker_events(&browser), first);
        assert_eq!(browser.marker_count(), 2);
    }

    #[test]
    fn test_render_without_matches_keeps_viewport() {
        let mut browser = loaded();
        let focus_calls_before = focus_calls(&browser);
        browser.render("2024-06-02");
        assert_eq!(focus_calls(&browser), focus_calls_before);
        assert_eq!(browser.surface().calls.last(), Some(&Call::Clear));
    }

    fn focus_calls(browser: &EventBrowser<RecordingSurface>) -> usize {
        browser
            .surface()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Focus(..)))
            .count()
    }

    #[test]
    fn test_upcoming_view_lists_future_events_in_order() {
        let browser = loaded();
        let UpcomingView::Entries(entries) = browser.upcoming_view() else {
            panic!("expected entries");
        };
        let titles: Vec<_> = entries.iter().map(|(_, e)| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Mid A", "Mid B", "July"]);
    }

    #[test]
    fn test_upcoming_view_is_capped() {
        let events = (0..150)
            .map(|day| {
                let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Days::new(day);
                event(&format!("E{day}"), &iso_date(date), 54.7, 20.4)
            })
            .collect();
        let mut browser = EventBrowser::new(RecordingSurface::default(), today());
        browser.load(Ok(events));

        let UpcomingView::Entries(entries) = browser.upcoming_view() else {
            panic!("expected entries");
        };
        assert_eq!(entries.len(), UPCOMING_LIMIT);
        assert_eq!(entries[0].1.title, "E0");
        assert_eq!(entries[99].1.title, "E99");
    }

    #[test]
    fn test_select_from_list() {
        let mut browser = loaded();
        browser.render("2024-07-01");
        browser.toggle_sidebar();
        assert!(browser.is_sidebar_open());

        // "Mid B" shares its date with "Mid A"
        let id = EventId(2);
        assert!(browser.select_from_list(id));

        assert_eq!(browser.selected_date(), Some("2024-06-15"));
        assert!(!browser.is_sidebar_open());

        let surface = browser.surface();
        let (_, opened_id, opened_at) = surface.opened_marker().unwrap();
        assert_eq!(*opened_id, id);
        assert!(coords_match(*opened_at, Point::new(20.30, 54.65)));
        assert_eq!(
            surface
                .calls
                .iter()
                .filter(|c| matches!(c, Call::OpenCallout(_)))
                .count(),
            1
        );

        let (focus, zoom) = surface.last_focus().unwrap();
        assert_eq!(zoom, SELECTION_ZOOM);
        assert!(coords_match(focus, Point::new(20.30, 54.65)));
    }

    #[test]
    fn test_select_unknown_event_only_closes_sidebar() {
        let mut browser = loaded();
        browser.toggle_sidebar();
        let calls_before = browser.surface().calls.len();

        assert!(!browser.select_from_list(EventId(42)));
        assert_eq!(browser.surface().calls.len(), calls_before);
        assert!(!browser.is_sidebar_open());
    }

    fn marker_at(serial: u64, event: usize, lon: f64, lat: f64) -> ActiveMarker {
        ActiveMarker {
            handle: MarkerHandle::from_raw(serial),
            event: EventId(event),
            position: Point::new(lon, lat),
        }
    }

    #[test]
    fn test_find_marker_prefers_id() {
        let markers = [
            marker_at(1, 5, 20.30, 54.65),
            marker_at(2, 7, 20.30, 54.65),
        ];
        let found = find_marker(&markers, EventId(7), Point::new(20.30, 54.65)).unwrap();
        assert_eq!(found.handle, MarkerHandle::from_raw(2));
    }

    #[test]
    fn test_find_marker_falls_back_to_coordinates() {
        let markers = [
            marker_at(1, 5, 20.40, 54.70),
            marker_at(2, 6, 20.300004, 54.649996),
        ];

        // No marker carries id 9; the one within 1e-5 degrees is used
        let found = find_marker(&markers, EventId(9), Point::new(20.30, 54.65)).unwrap();
        assert_eq!(found.handle, MarkerHandle::from_raw(2));

        let far = [marker_at(3, 6, 20.30005, 54.65)];
        assert!(find_marker(&far, EventId(9), Point::new(20.30, 54.65)).is_none());
        assert!(find_marker(&[], EventId(9), Point::new(20.30, 54.65)).is_none());
    }

    #[test]
    fn test_change_date_normalizes_input() {
        let mut browser = loaded();
        assert_eq!(browser.change_date("2024-07-01T10:00:00Z").unwrap(), 1);
        assert_eq!(browser.selected_date(), Some("2024-07-01"));

        let err = browser.change_date("not a date").unwrap_err();
        assert!(matches!(err, BrowserError::InvalidDate(_)));
        assert_eq!(browser.selected_date(), Some("2024-07-01"));
    }

    #[test]
    fn test_change_date_keeps_upcoming_list() {
        let mut browser = loaded();
        browser.change_date("2024-06-01").unwrap();
        let UpcomingView::Entries(entries) = browser.upcoming_view() else {
            panic!("expected entries");
        };
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_shift_date() {
        let mut browser = loaded();
        assert_eq!(browser.shift_date(16).unwrap(), 1);
        assert_eq!(browser.selected_date(), Some("2024-07-01"));
        assert_eq!(browser.shift_date(-30).unwrap(), 1);
        assert_eq!(browser.selected_date(), Some("2024-06-01"));

        let mut empty = EventBrowser::new(RecordingSurface::default(), today());
        assert!(matches!(
            empty.shift_date(1),
            Err(BrowserError::NoSelectedDate)
        ));
    }

    #[test]
    fn test_failed_load() {
        let mut browser = EventBrowser::new(RecordingSurface::default(), today());
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "events.json");
        browser.load(Err(LoadError::Io(err)));

        assert!(browser.has_failed());
        assert!(browser.surface().markers.is_empty());
        assert!(matches!(
            browser.upcoming_view(),
            UpcomingView::Placeholder(LOAD_FAILED_MESSAGE)
        ));
        assert_eq!(browser.date_bounds(), None);

        // Terminal: later loads and renders do nothing
        browser.load(Ok(sample_events()));
        assert!(browser.has_failed());
        assert_eq!(browser.render("2024-06-15"), 0);
    }

    #[test]
    fn test_empty_collection() {
        let mut browser = EventBrowser::new(RecordingSurface::default(), today());
        browser.load(Ok(Vec::new()));
        assert!(!browser.is_pending());
        assert_eq!(browser.selected_date(), None);
        assert_eq!(browser.date_bounds(), None);
        assert!(matches!(
            browser.upcoming_view(),
            UpcomingView::Placeholder(NO_EVENTS_MESSAGE)
        ));
    }

    #[test]
    fn test_pending_view() {
        let browser = EventBrowser::new(RecordingSurface::default(), today());
        assert!(browser.is_pending());
        assert!(matches!(browser.upcoming_view(), UpcomingView::Loading));
    }

    #[test]
    fn test_sidebar_controls() {
        let mut browser = loaded();
        assert!(!browser.is_sidebar_open());
        browser.toggle_sidebar();
        assert!(browser.is_sidebar_open());

        browser.dismiss_sidebar_outside(true);
        assert!(browser.is_sidebar_open());
        browser.dismiss_sidebar_outside(false);
        assert!(!browser.is_sidebar_open());

        browser.toggle_sidebar();
        browser.close_sidebar();
        assert!(!browser.is_sidebar_open());
        browser.close_sidebar();
        assert!(!browser.is_sidebar_open());
    }

    #[test]
    fn test_resize_requests_are_coalesced() {
        let mut browser = EventBrowser::new(RecordingSurface::default(), today())
            .with_resize_delay(Duration::from_millis(100));
        let start = Instant::now();

        for step in 0..5 {
            browser.request_resize(start + Duration::from_millis(step * 20));
        }
        assert!(!browser.tick(start + Duration::from_millis(150)));
        assert_eq!(
            browser.resize_due_in(start + Duration::from_millis(150)),
            Some(Duration::from_millis(30))
        );
        assert!(browser.tick(start + Duration::from_millis(180)));
        assert!(!browser.tick(start + Duration::from_millis(500)));

        assert_eq!(browser.surface().resize_count(), 1);
    }
}
