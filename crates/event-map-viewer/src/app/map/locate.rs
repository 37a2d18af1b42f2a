//! Device position for the "locate me" control
//!
//! Only browsers expose the device position; on native targets the control is
//! not offered and a request answers with an error right away.

use geo::Point;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Zoom used when the viewport follows the device position
pub const LOCATE_ZOOM: f64 = 14.0;

pub type LocateOutcome = Result<Point<f64>, String>;

/// Whether this target can ask for the device position
pub fn is_supported() -> bool {
    cfg!(target_arch = "wasm32")
}

/// Reported coordinates as a map point, rejecting values off the globe
pub fn to_point(lat: f64, lon: f64) -> Option<Point<f64>> {
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon))
        .then(|| Point::new(lon, lat))
}

/// One position request at a time, polled from the frame loop
#[derive(Default)]
pub struct Locator {
    rx: Option<mpsc::UnboundedReceiver<LocateOutcome>>,
}

impl Locator {
    /// Ask for the device position. Repaints `ctx` when the answer arrives.
    pub fn request(&mut self, ctx: &egui::Context) {
        if self.is_waiting() {
            tracing::debug!("Position request already in flight");
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        request_position(tx, ctx.clone());
        self.rx = Some(rx);
    }

    /// Take the answer if it arrived
    pub fn poll(&mut self) -> Option<LocateOutcome> {
        let rx = self.rx.as_mut()?;
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err("position request was dropped".to_string()),
        };
        self.rx = None;
        Some(outcome)
    }

    pub fn is_waiting(&self) -> bool {
        self.rx.is_some()
    }
}

#[cfg(target_arch = "wasm32")]
fn request_position(tx: mpsc::UnboundedSender<LocateOutcome>, ctx: egui::Context) {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    let geolocation = match web_sys::window().map(|window| window.navigator().geolocation()) {
        Some(Ok(geolocation)) => geolocation,
        Some(Err(err)) => {
            let _ = tx.send(Err(format!("geolocation is not available: {err:?}")));
            return;
        }
        None => {
            let _ = tx.send(Err("no browser window".to_string()));
            return;
        }
    };

    let failed = tx.clone();
    let on_error = {
        let tx = tx.clone();
        let ctx = ctx.clone();
        Closure::once_into_js(move |err: web_sys::GeolocationPositionError| {
            let _ = tx.send(Err(err.message()));
            ctx.request_repaint();
        })
    };
    let on_success = Closure::once_into_js(move |position: web_sys::GeolocationPosition| {
        let coords = position.coords();
        let outcome = to_point(coords.latitude(), coords.longitude())
            .ok_or_else(|| "device reported an invalid position".to_string());
        let _ = tx.send(outcome);
        ctx.request_repaint();
    });

    if let Err(err) = geolocation.get_current_position_with_error_callback(
        on_success.unchecked_ref(),
        Some(on_error.unchecked_ref()),
    ) {
        let _ = failed.send(Err(format!("position request rejected: {err:?}")));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn request_position(tx: mpsc::UnboundedSender<LocateOutcome>, _ctx: egui::Context) {
    let _ = tx.send(Err("device location is only available in the browser".to_string()));
}
