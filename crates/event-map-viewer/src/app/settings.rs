use crate::entrypoints::cli::parse_args;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

/// Map style used by the vector surface
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleChoice {
    /// OpenStreetMap raster tiles limited to the region
    #[default]
    Inline,
    /// Hosted provider style, needs the `MAP_STYLE_KEY` slot
    Hosted,
}

/// Graphics backend requested at startup
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererChoice {
    #[default]
    Wgpu,
    Glow,
}

#[cfg(not(target_arch = "wasm32"))]
impl From<RendererChoice> for eframe::Renderer {
    fn from(choice: RendererChoice) -> Self {
        match choice {
            RendererChoice::Wgpu => eframe::Renderer::Wgpu,
            RendererChoice::Glow => eframe::Renderer::Glow,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Event Map - browse dated events on an interactive map
pub struct Settings {
    /// Event data URL or local path (JSON array of events)
    #[clap(short, long, default_value = "events.json")]
    pub source: String,

    /// Append a `v=<timestamp>` parameter to the data URL
    #[clap(long, default_value = "false")]
    pub cache_bust: bool,

    /// Map style for the vector surface
    #[clap(long, value_enum, default_value_t = StyleChoice::Inline)]
    pub style: StyleChoice,

    /// Hosted style name, used with `--style hosted`
    #[clap(long, default_value = "streets-v2")]
    pub hosted_style: String,

    /// Do not clamp the viewport to the region bounds
    #[clap(long, default_value = "false")]
    pub unbounded: bool,

    /// Graphics backend (native only); `glow` forces the raster surface
    #[clap(long, value_enum, default_value_t = RendererChoice::Wgpu)]
    pub renderer: RendererChoice,

    /// Override today's date (YYYY-MM-DD)
    #[clap(long, value_name = "DATE")]
    pub today: Option<NaiveDate>,

    /// Validate the event data, print a report and exit
    #[clap(long, default_value = "false")]
    pub validate: bool,
}

impl Settings {
    /// Parse settings, falling back to defaults on web when the URL is malformed
    pub fn from_cli() -> Self {
        match parse_args::<Settings>() {
            Ok(args) => args,
            Err(e) => {
                #[cfg(not(target_arch = "wasm32"))]
                e.exit();
                #[cfg(target_arch = "wasm32")]
                {
                    let user_msg = format!(
                        "Error parsing CLI:\n{}\n
    You should change the GET params, using the cli prefix.\n
    Starting anyway without args.",
                        e
                    );
                    if let Some(window) = web_sys::window() {
                        window.alert_with_message(&user_msg).unwrap_or(());
                    } else {
                        tracing::error!(user_msg);
                    }
                    Settings::parse_from(["event-map"]) // Default args on web if parsing fails
                }
            }
        }
    }

    /// Today's date for the session, honoring `--today`
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(event_map_lib::today_utc)
    }
}
