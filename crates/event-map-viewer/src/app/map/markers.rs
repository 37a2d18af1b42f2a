//! Event markers and their callouts
//!
//! [`MarkerLayer`] is the marker state shared by both surfaces. Each frame it
//! hands a snapshot to a [`MarkerPlugin`], which draws pins and the open
//! callout on top of the walkers map and reports clicks back through a
//! [`ClickSlot`].

use egui::{Color32, FontId, Pos2, Rect, Shape, Stroke, vec2};
use event_map_lib::{Callout, EventId, EventRecord, MarkerHandle};
use geo::Point;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use walkers::{Plugin, Projector};

const PIN_RADIUS: f32 = 7.0;
/// Clicks this close to a pin center hit the pin
const PIN_HIT_RADIUS: f32 = 12.0;
const PIN_COLOR: Color32 = Color32::from_rgb(220, 60, 70);
const PIN_OPEN_COLOR: Color32 = Color32::from_rgb(70, 130, 220);

/// A marker currently on the map
#[derive(Debug, Clone)]
pub struct PlacedMarker {
    pub handle: MarkerHandle,
    pub id: EventId,
    pub position: Point<f64>,
    pub callout: Callout,
}

/// Markers and the (at most one) open callout
#[derive(Debug, Default)]
pub struct MarkerLayer {
    markers: Vec<PlacedMarker>,
    next_serial: u64,
    open: Option<MarkerHandle>,
}

impl MarkerLayer {
    pub fn place(&mut self, id: EventId, event: &EventRecord) -> MarkerHandle {
        // Serial 0 is reserved by ClickSlot for "no click"
        self.next_serial += 1;
        let handle = MarkerHandle::from_raw(self.next_serial);
        self.markers.push(PlacedMarker {
            handle,
            id,
            position: event.position(),
            callout: Callout::for_event(event),
        });
        handle
    }

    pub fn clear(&mut self) {
        self.markers.clear();
        self.open = None;
    }

    /// Same behavior as clicking the pin: opens its callout, or closes it if already open
    pub fn toggle_callout(&mut self, handle: MarkerHandle) {
        let Some(marker) = self.markers.iter().find(|m| m.handle == handle) else {
            tracing::trace!("Ignoring callout request for unknown marker {}", handle.raw());
            return;
        };
        self.open = if self.open == Some(handle) {
            None
        } else {
            tracing::debug!("Opening callout for event #{}", marker.id.index());
            Some(handle)
        };
    }

    pub fn close_callout(&mut self) {
        self.open = None;
    }

    #[cfg(test)]
    pub fn open_marker(&self) -> Option<&PlacedMarker> {
        let open = self.open?;
        self.markers.iter().find(|m| m.handle == open)
    }

    #[cfg(test)]
    pub fn markers(&self) -> &[PlacedMarker] {
        &self.markers
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Snapshot for this frame's drawing
    pub fn plugin(&self, clicks: Arc<ClickSlot>) -> MarkerPlugin {
        MarkerPlugin {
            markers: self.markers.clone(),
            open: self.open,
            clicks,
        }
    }

    /// Apply a click reported by the plugin
    pub fn handle_click(&mut self, click: MapClick) {
        match click {
            MapClick::Marker(handle) => self.toggle_callout(handle),
            MapClick::Elsewhere => self.close_callout(),
        }
    }
}

/// A click on the map, as seen by the marker plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapClick {
    Marker(MarkerHandle),
    Elsewhere,
}

const NO_CLICK: u64 = 0;
const CLICK_ELSEWHERE: u64 = u64::MAX;

/// Last click reported by the plugin, taken by the surface after the map is shown
#[derive(Debug, Default)]
pub struct ClickSlot(AtomicU64);

impl ClickSlot {
    pub fn store(&self, click: MapClick) {
        let raw = match click {
            MapClick::Marker(handle) => handle.raw(),
            MapClick::Elsewhere => CLICK_ELSEWHERE,
        };
        self.0.store(raw, Ordering::Relaxed);
    }

    pub fn take(&self) -> Option<MapClick> {
        match self.0.swap(NO_CLICK, Ordering::Relaxed) {
            NO_CLICK => None,
            CLICK_ELSEWHERE => Some(MapClick::Elsewhere),
            raw => Some(MapClick::Marker(MarkerHandle::from_raw(raw))),
        }
    }
}

/// Topmost pin within the hit radius of `pointer`
fn hit_test(pins: &[(MarkerHandle, Pos2)], pointer: Pos2) -> Option<MarkerHandle> {
    pins.iter()
        .rev()
        .filter(|(_, pos)| pos.distance(pointer) <= PIN_HIT_RADIUS)
        .min_by(|a, b| a.1.distance(pointer).total_cmp(&b.1.distance(pointer)))
        .map(|(handle, _)| *handle)
}

fn to_screen(projector: &Projector, position: Point<f64>) -> Pos2 {
    let screen = projector.project(walkers::lat_lon(position.y(), position.x()));
    Pos2::new(screen.x, screen.y)
}

fn draw_pin(painter: &egui::Painter, pos: Pos2, open: bool) {
    let fill = if open { PIN_OPEN_COLOR } else { PIN_COLOR };
    painter.circle_filled(pos + vec2(0.0, 1.5), PIN_RADIUS, Color32::from_black_alpha(60));
    painter.circle_filled(pos, PIN_RADIUS, fill);
    painter.circle_stroke(pos, PIN_RADIUS, Stroke::new(2.0, Color32::WHITE));
}

/// Draw the callout box above `anchor` and return its rect
fn draw_callout(painter: &egui::Painter, anchor: Pos2, callout: &Callout) -> Rect {
    let title = painter.layout_no_wrap(
        callout.title.clone(),
        FontId::proportional(15.0),
        Color32::from_gray(20),
    );
    let details = painter.layout_no_wrap(
        format!("{}\n{}", callout.location, callout.date),
        FontId::proportional(12.0),
        Color32::from_gray(80),
    );

    let padding = vec2(8.0, 6.0);
    let title_size = title.size();
    let details_size = details.size();
    let size = vec2(
        title_size.x.max(details_size.x),
        title_size.y + 2.0 + details_size.y,
    ) + padding * 2.0;
    let rect = Rect::from_min_size(
        anchor - vec2(size.x / 2.0, size.y + PIN_RADIUS + 8.0),
        size,
    );

    painter.rect_filled(rect.expand(1.0), 6.0, Color32::from_black_alpha(90));
    painter.rect_filled(rect, 6.0, Color32::WHITE);
    painter.add(Shape::convex_polygon(
        vec![
            rect.center_bottom() + vec2(-6.0, 0.0),
            rect.center_bottom() + vec2(6.0, 0.0),
            anchor - vec2(0.0, PIN_RADIUS + 1.0),
        ],
        Color32::WHITE,
        Stroke::NONE,
    ));
    painter.galley(rect.min + padding, title, Color32::BLACK);
    painter.galley(
        rect.min + padding + vec2(0.0, title_size.y + 2.0),
        details,
        Color32::DARK_GRAY,
    );
    rect
}

/// Walkers plugin drawing one frame of markers
pub struct MarkerPlugin {
    markers: Vec<PlacedMarker>,
    open: Option<MarkerHandle>,
    clicks: Arc<ClickSlot>,
}

impl Plugin for MarkerPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("MarkerPlugin::run");

        let painter = ui.painter().with_clip_rect(response.rect);
        let pins: Vec<(MarkerHandle, Pos2)> = self
            .markers
            .iter()
            .map(|m| (m.handle, to_screen(projector, m.position)))
            .collect();

        for (handle, pos) in &pins {
            draw_pin(&painter, *pos, self.open == Some(*handle));
        }

        let callout_rect = self.open.and_then(|open| {
            let marker = self.markers.iter().find(|m| m.handle == open)?;
            let (_, anchor) = pins.iter().find(|(h, _)| *h == open)?;
            Some(draw_callout(&painter, *anchor, &marker.callout))
        });

        if response.clicked()
            && let Some(pointer) = response.interact_pointer_pos()
        {
            if callout_rect.is_some_and(|rect| rect.contains(pointer)) {
                return;
            }
            let click = match hit_test(&pins, pointer) {
                Some(handle) => MapClick::Marker(handle),
                None => MapClick::Elsewhere,
            };
            self.clicks.store(click);
        }
    }
}
