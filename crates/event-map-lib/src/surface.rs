//! Map surface abstraction
//!
//! The browser never talks to a concrete map widget. It drives a
//! [`MapSurface`], of which the viewer provides exactly two implementations
//! (a GPU-backed one and a universally supported fallback), chosen once at
//! startup.

use crate::{EventId, EventRecord, MapError};
use geo::Point;

/// Which of the two surface implementations is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Requires the GPU renderer; animated viewport, full control set
    Vector,
    /// Works everywhere; raster tiles, snapping viewport
    Raster,
}

impl SurfaceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Raster => "raster",
        }
    }
}

/// Opaque reference to a marker placed on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(u64);

impl MarkerHandle {
    pub fn from_raw(serial: u64) -> Self {
        Self(serial)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Content of the popup attached to a marker
#[derive(Debug, Clone, PartialEq)]
pub struct Callout {
    pub title: String,
    pub location: String,
    pub date: String,
}

impl Callout {
    pub fn for_event(event: &EventRecord) -> Self {
        Self {
            title: event.title.clone(),
            location: event.location.clone(),
            date: event.date.clone(),
        }
    }
}

/// Capability interface over a map widget
pub trait MapSurface {
    fn kind(&self) -> SurfaceKind;

    /// Add a marker at the event's position with a callout describing it.
    /// Placing the same event twice yields two overlapping markers.
    fn place_marker(&mut self, id: EventId, event: &EventRecord) -> MarkerHandle;

    /// Remove every marker placed so far. No-op when there are none.
    fn clear_markers(&mut self);

    /// Move the viewport to `position` (x = lon, y = lat) at `zoom`
    fn focus(&mut self, position: Point<f64>, zoom: f64);

    /// Open (or toggle) the callout of a placed marker
    fn open_callout(&mut self, marker: MarkerHandle);

    /// The container size may have changed; recompute the viewport
    fn resize(&mut self);
}

impl<S: MapSurface + ?Sized> MapSurface for Box<S> {
    fn kind(&self) -> SurfaceKind {
        (**self).kind()
    }

    fn place_marker(&mut self, id: EventId, event: &EventRecord) -> MarkerHandle {
        (**self).place_marker(id, event)
    }

    fn clear_markers(&mut self) {
        (**self).clear_markers()
    }

    fn focus(&mut self, position: Point<f64>, zoom: f64) {
        (**self).focus(position, zoom)
    }

    fn open_callout(&mut self, marker: MarkerHandle) {
        (**self).open_callout(marker)
    }

    fn resize(&mut self) {
        (**self).resize()
    }
}

/// Remembers the first map error of the session.
///
/// Only the first error is logged; later ones are counted and dropped.
/// The first error stays available as a user notice until dismissed.
#[derive(Debug, Default)]
pub struct StyleErrorLatch {
    first: Option<MapError>,
    suppressed: usize,
    dismissed: bool,
}

impl StyleErrorLatch {
    /// Record an error. Returns `true` if it was the first one (and was logged).
    pub fn report(&mut self, err: MapError) -> bool {
        if self.first.is_some() {
            self.suppressed += 1;
            tracing::trace!("Suppressed repeated map error: {err}");
            return false;
        }
        tracing::error!("{err}");
        self.first = Some(err);
        true
    }

    /// The error to show to the user, if any and not dismissed yet
    pub fn notice(&self) -> Option<&MapError> {
        if self.dismissed {
            None
        } else {
            self.first.as_ref()
        }
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    pub fn has_failed(&self) -> bool {
        self.first.is_some()
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One call observed on a [`RecordingSurface`]
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Place(EventId),
        Clear,
        Focus(Point<f64>, f64),
        OpenCallout(MarkerHandle),
        Resize,
    }

    /// Surface that records every call and keeps the visible marker set
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub calls: Vec<Call>,
        pub markers: Vec<(MarkerHandle, EventId, Point<f64>)>,
        pub open: Option<MarkerHandle>,
        next_serial: u64,
    }

    impl RecordingSurface {
        pub fn resize_count(&self) -> usize {
            self.calls.iter().filter(|c| **c == Call::Resize).count()
        }

        pub fn last_focus(&self) -> Option<(Point<f64>, f64)> {
            self.calls.iter().rev().find_map(|c| match c {
                Call::Focus(p, z) => Some((*p, *z)),
                _ => None,
            })
        }

        pub fn opened_marker(&self) -> Option<&(MarkerHandle, EventId, Point<f64>)> {
            let open = self.open?;
            self.markers.iter().find(|(h, _, _)| *h == open)
        }
    }

    impl MapSurface for RecordingSurface {
        fn kind(&self) -> SurfaceKind {
            SurfaceKind::Raster
        }

        fn place_marker(&mut self, id: EventId, event: &EventRecord) -> MarkerHandle {
            self.next_serial += 1;
            let handle = MarkerHandle::from_raw(self.next_serial);
            self.calls.push(Call::Place(id));
            self.markers.push((handle, id, event.position()));
            handle
        }

        fn clear_markers(&mut self) {
            self.calls.push(Call::Clear);
            self.markers.clear();
            self.open = None;
        }

        fn focus(&mut self, position: Point<f64>, zoom: f64) {
            self.calls.push(Call::Focus(position, zoom));
        }

        fn open_callout(&mut self, marker: MarkerHandle) {
            self.calls.push(Call::OpenCallout(marker));
            if self.markers.iter().any(|(h, _, _)| *h == marker) {
                self.open = Some(marker);
            }
        }

        fn resize(&mut self) {
            self.calls.push(Call::Resize);
        }
    }

    #[test]
    fn test_boxed_surface_delegates() {
        let mut surface: Box<dyn MapSurface> = Box::new(RecordingSurface::default());
        let event = crate::catalog::tests::event("A", "2024-06-01", 54.7, 20.4);
        let handle = surface.place_marker(EventId(0), &event);
        surface.open_callout(handle);
        surface.clear_markers();
        assert_eq!(surface.kind(), SurfaceKind::Raster);
    }

    #[test]
    fn test_callout_for_event() {
        let event = crate::catalog::tests::event("Fair", "2024-06-15", 54.7, 20.4);
        let callout = Callout::for_event(&event);
        assert_eq!(callout.title, "Fair");
        assert_eq!(callout.location, "Fair venue");
        assert_eq!(callout.date, "2024-06-15");
    }

    #[test]
    fn test_latch_reports_first_error_only() {
        let mut latch = StyleErrorLatch::default();
        assert!(latch.notice().is_none());

        assert!(latch.report(MapError::Style("401 Unauthorized".to_string())));
        assert!(!latch.report(MapError::Tiles("timeout".to_string())));
        assert!(!latch.report(MapError::Tiles("timeout".to_string())));

        assert_eq!(
            latch.notice(),
            Some(&MapError::Style("401 Unauthorized".to_string()))
        );
        assert_eq!(latch.suppressed_count(), 2);

        latch.dismiss();
        assert!(latch.notice().is_none());
        assert!(latch.has_failed());
    }
}
