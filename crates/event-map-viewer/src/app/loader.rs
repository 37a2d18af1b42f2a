//! Event data loading
//!
//! The event list is fetched exactly once, off the UI thread. URLs go through
//! `ehttp` (native and web), local paths through a tokio task (native only).
//! The outcome travels back over a oneshot channel that the app polls once
//! per frame.

use event_map_lib::{EventRecord, LoadError, parse_events};
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
use tokio::sync::oneshot;

pub type LoadOutcome = Result<Vec<EventRecord>, LoadError>;

/// Where the event list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    Url(String),
    #[cfg(not(target_arch = "wasm32"))]
    File(PathBuf),
}

impl EventSource {
    /// Interpret the `--source` setting.
    ///
    /// On web every source is a URL (relative ones resolve against the page).
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if is_remote(raw) {
            return Self::Url(raw.to_string());
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::File(PathBuf::from(raw))
        }
        #[cfg(target_arch = "wasm32")]
        {
            Self::Url(raw.to_string())
        }
    }

    /// Append a `v=<timestamp>` parameter to URL sources
    pub fn cache_busted(self, timestamp: i64) -> Self {
        match self {
            Self::Url(url) => Self::Url(with_cache_bust(&url, timestamp)),
            #[cfg(not(target_arch = "wasm32"))]
            other => other,
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            #[cfg(not(target_arch = "wasm32"))]
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn is_remote(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn with_cache_bust(url: &str, timestamp: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}v={timestamp}")
}

/// Turn an HTTP response into events, treating non-2xx as a failure
fn decode_response(ok: bool, status: u16, status_text: &str, bytes: &[u8]) -> LoadOutcome {
    if !ok {
        return Err(LoadError::Http {
            status,
            status_text: status_text.to_string(),
        });
    }
    parse_events(bytes)
}

fn decode_fetch(result: ehttp::Result<ehttp::Response>) -> LoadOutcome {
    let response = result.map_err(LoadError::Transport)?;
    decode_response(
        response.ok,
        response.status,
        &response.status_text,
        &response.bytes,
    )
}

#[cfg(not(target_arch = "wasm32"))]
async fn read_file(path: &Path) -> LoadOutcome {
    let bytes = tokio::fs::read(path).await?;
    parse_events(&bytes)
}

/// One in-flight fetch of the event list
pub struct EventLoader {
    rx: Option<oneshot::Receiver<LoadOutcome>>,
}

impl EventLoader {
    /// Start fetching. Repaints `ctx` when the outcome is ready.
    pub fn spawn(source: EventSource, ctx: egui::Context) -> Self {
        let (tx, rx) = oneshot::channel();
        tracing::info!("Loading events from {source}");

        match source {
            EventSource::Url(url) => {
                ehttp::fetch(ehttp::Request::get(url), move |result| {
                    let _ = tx.send(decode_fetch(result));
                    ctx.request_repaint();
                });
            }
            #[cfg(not(target_arch = "wasm32"))]
            EventSource::File(path) => {
                tokio::spawn(async move {
                    let outcome = read_file(&path).await;
                    let _ = tx.send(outcome);
                    ctx.request_repaint();
                });
            }
        }

        Self { rx: Some(rx) }
    }

    /// Take the outcome if it arrived. Returns `Some` at most once.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        use tokio::sync::oneshot::error::TryRecvError;

        let rx = self.rx.as_mut()?;
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(LoadError::Transport(
                "loader stopped before delivering a result".to_string(),
            )),
        };
        self.rx = None;
        Some(outcome)
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.rx.is_none()
    }
}

/// Fetch synchronously, for the `--validate` command
#[cfg(not(target_arch = "wasm32"))]
pub fn fetch_blocking(source: &EventSource) -> LoadOutcome {
    match source {
        EventSource::Url(url) => decode_fetch(ehttp::fetch_blocking(&ehttp::Request::get(url))),
        EventSource::File(path) => parse_events(&std::fs::read(path)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"title": "Jazz night", "location": "Old Town", "date": "2024-06-15", "lat": 54.71, "lon": 20.51}
    ]"#;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            EventSource::parse(" https://example.com/events.json "),
            EventSource::Url("https://example.com/events.json".to_string())
        );
        assert_eq!(
            EventSource::parse("HTTP://example.com/e.json"),
            EventSource::Url("HTTP://example.com/e.json".to_string())
        );
        #[cfg(not(target_arch = "wasm32"))]
        assert_eq!(
            EventSource::parse("data/events.json"),
            EventSource::File(PathBuf::from("data/events.json"))
        );
    }

    #[test]
    fn test_cache_bust() {
        assert_eq!(
            with_cache_bust("https://example.com/events.json", 1700000000),
            "https://example.com/events.json?v=1700000000"
        );
        assert_eq!(
            with_cache_bust("https://example.com/events.json?lang=en", 42),
            "https://example.com/events.json?lang=en&v=42"
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_cache_bust_skips_files() {
        let source = EventSource::parse("events.json").cache_busted(42);
        assert_eq!(source, EventSource::File(PathBuf::from("events.json")));
    }

    #[test]
    fn test_decode_response_http_error() {
        let err = decode_response(false, 404, "Not Found", b"").unwrap_err();
        assert!(matches!(err, LoadError::Http { status: 404, .. }));
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
    }

    #[test]
    fn test_decode_response_ok() {
        let events = decode_response(true, 200, "OK", SAMPLE.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Jazz night");
    }

    #[test]
    fn test_decode_response_bad_json() {
        let err = decode_response(true, 200, "OK", b"{not json").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn test_decode_fetch_transport_error() {
        let err = decode_fetch(Err("connection refused".to_string())).unwrap_err();
        assert!(matches!(err, LoadError::Transport(ref msg) if msg == "connection refused"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test]
    async fn test_read_file() {
        let path = std::env::temp_dir().join(format!(
            "event-map-loader-test-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, SAMPLE).unwrap();
        let events = read_file(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(events.len(), 1);

        let missing = read_file(Path::new("/definitely/not/here.json")).await;
        assert!(matches!(missing, Err(LoadError::Io(_))));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_fetch_blocking_file() {
        let path = std::env::temp_dir().join(format!(
            "event-map-blocking-test-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, SAMPLE).unwrap();
        let events = fetch_blocking(&EventSource::File(path.clone())).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(events[0].location, "Old Town");
    }

    #[test]
    fn test_poll_closed_channel() {
        let (tx, rx) = oneshot::channel::<LoadOutcome>();
        drop(tx);
        let mut loader = EventLoader { rx: Some(rx) };
        assert!(matches!(loader.poll(), Some(Err(LoadError::Transport(_)))));
        assert!(loader.is_finished());
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_poll_delivers_once() {
        let (tx, rx) = oneshot::channel::<LoadOutcome>();
        let mut loader = EventLoader { rx: Some(rx) };
        assert!(loader.poll().is_none());
        tx.send(Ok(Vec::new())).unwrap();
        assert!(matches!(loader.poll(), Some(Ok(ref v)) if v.is_empty()));
        assert!(loader.poll().is_none());
    }
}
