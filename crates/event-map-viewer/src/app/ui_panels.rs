//! UI panels for the application
//!
//! Sidebar (date picker, count, upcoming list), the burger button overlaid on
//! the map, the map-error notice and the attribution line.

use crate::app::Browser;
use chrono::{Datelike, NaiveDate};
use egui::{Color32, LayerId, Order, Pos2, Rect, RichText, Ui};
use event_map_lib::{DATE_FORMAT, EventId, UpcomingView};

/// Render the burger button (overlaid on top-left of map) and return its rect
pub fn burger_button(ui: &mut Ui, browser: &mut Browser) -> Rect {
    let button_size = egui::vec2(40.0, 40.0);
    let margin = 10.0;

    let rect = ui.max_rect();
    let button_rect =
        Rect::from_min_size(rect.left_top() + egui::vec2(margin, margin), button_size);

    let response = ui
        .allocate_rect(button_rect, egui::Sense::click())
        .on_hover_text("Events");

    if response.clicked() {
        browser.toggle_sidebar();
    }

    let bg_color = if response.hovered() {
        ui.visuals().widgets.hovered.bg_fill
    } else {
        ui.visuals().widgets.inactive.bg_fill
    };
    ui.painter().rect_filled(button_rect, 5.0, bg_color);

    let icon = if browser.is_sidebar_open() { "✕" } else { "☰" };
    ui.painter().text(
        button_rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(20.0),
        ui.visuals().text_color(),
    );

    button_rect
}

/// Render the sidebar if open (side on landscape, bottom on portrait) and return its rect
pub fn render_sidebar(ctx: &egui::Context, browser: &mut Browser) -> Option<Rect> {
    if !browser.is_sidebar_open() {
        return None;
    }

    let screen_size = ctx.viewport_rect().size();
    let is_portrait = screen_size.y > screen_size.x;

    let response = if is_portrait {
        egui::TopBottomPanel::bottom("main_sidebar")
            .default_height(320.0)
            .min_height(180.0)
            .max_height(ctx.viewport_rect().height() * 0.6)
            .resizable(true)
            .show(ctx, |ui| render_sidebar_content(ui, browser))
            .response
    } else {
        egui::SidePanel::left("main_sidebar")
            .default_width(320.0)
            .min_width(260.0)
            .max_width(450.0)
            .resizable(true)
            .show(ctx, |ui| render_sidebar_content(ui, browser))
            .response
    };

    Some(response.rect)
}

fn render_sidebar_content(ui: &mut Ui, browser: &mut Browser) {
    ui.horizontal(|ui| {
        ui.heading("📅 Events");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("✕").on_hover_text("Close").clicked() {
                browser.close_sidebar();
            }
        });
    });
    ui.separator();

    render_date_picker(ui, browser);

    if let Some(date) = browser.selected_date() {
        ui.label(format!("{} event(s) on {date}", browser.marker_count()));
    }

    ui.add_space(8.0);
    ui.label(RichText::new("Upcoming").strong());
    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if let Some(id) = render_upcoming(ui, browser) {
                browser.select_from_list(id);
            }
        });
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Date input limited to the loaded range, with previous/next-day steps
fn render_date_picker(ui: &mut Ui, browser: &mut Browser) {
    let bounds = browser
        .date_bounds()
        .and_then(|(min, max)| Some((parse_date(min)?, parse_date(max)?)));
    let selected = browser.selected_date().and_then(parse_date);

    let (Some((min, max)), Some(mut date)) = (bounds, selected) else {
        ui.add_enabled(false, egui::Label::new("No dates available"));
        return;
    };

    let mut step = None;
    let mut picked = None;
    ui.horizontal(|ui| {
        if ui
            .add_enabled(date > min, egui::Button::new("◀"))
            .on_hover_text("Previous day")
            .clicked()
        {
            step = Some(-1);
        }

        let response = ui.add(
            egui_extras::DatePickerButton::new(&mut date)
                .id_salt("event_date")
                .start_end_years(min.year()..=max.year())
                .calendar_week(false),
        );
        if response.changed() {
            picked = Some(date.clamp(min, max));
        }

        if ui
            .add_enabled(date < max, egui::Button::new("▶"))
            .on_hover_text("Next day")
            .clicked()
        {
            step = Some(1);
        }
    });

    let result = match (picked, step) {
        (Some(date), _) => browser.change_date(&date.format(DATE_FORMAT).to_string()),
        (None, Some(days)) => browser.shift_date(days),
        (None, None) => return,
    };
    if let Err(err) = result {
        tracing::warn!("Date change rejected: {err}");
    }
}

/// Draw the upcoming list; returns the entry clicked this frame
fn render_upcoming(ui: &mut Ui, browser: &Browser) -> Option<EventId> {
    let mut clicked = None;

    match browser.upcoming_view() {
        UpcomingView::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading events…");
            });
        }
        UpcomingView::Placeholder(message) => {
            ui.label(RichText::new(message).italics().weak());
        }
        UpcomingView::Entries(entries) => {
            for (id, event) in entries {
                let response = egui::Frame::group(ui.style())
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(RichText::new(&event.title).strong());
                        ui.label(&event.location);
                        ui.label(RichText::new(&event.date).small().weak());
                    })
                    .response
                    .interact(egui::Sense::click())
                    .on_hover_cursor(egui::CursorIcon::PointingHand);
                if response.clicked() {
                    clicked = Some(id);
                }
            }
        }
    }

    clicked
}

/// Dismissible notice for the first map error; returns the window rect while shown
pub fn map_error_notice(ctx: &egui::Context, browser: &mut Browser) -> Option<Rect> {
    let message = browser.surface().error_notice()?.to_string();

    let mut dismissed = false;
    let rect = egui::Window::new("Map problem")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(RichText::new(message).color(Color32::from_rgb(200, 60, 60)));
            ui.label("The map stays usable, but parts of it may not be drawn.");
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        })
        .map(|inner| inner.response.rect);

    if dismissed {
        browser.surface_mut().dismiss_error();
    }
    rect
}

/// Tile attribution at the bottom of the map
pub fn attribution(ui: &mut Ui, text: &str) {
    let screen_rect = ui.max_rect();
    ui.painter().text(
        screen_rect.center_bottom() + egui::vec2(0.0, -5.0),
        egui::Align2::CENTER_BOTTOM,
        text,
        egui::FontId::proportional(10.0),
        Color32::from_black_alpha(180),
    );
}

/// Click position and the topmost layer under it
pub type ClickTarget = (Pos2, Option<LayerId>);

/// Where this frame's click landed: `None` without a click, else whether it hit
/// any of `rects` or a floating layer (popups, windows) above the panels
pub fn classify_click(click: Option<ClickTarget>, rects: &[Rect]) -> Option<bool> {
    click.map(|(pos, layer)| is_floating(layer) || rects.iter().any(|rect| rect.contains(pos)))
}

fn is_floating(layer: Option<LayerId>) -> bool {
    layer.is_some_and(|layer| layer.order != Order::Background)
}

/// Position and topmost layer of a completed click this frame, if any
pub fn click_target(ctx: &egui::Context) -> Option<ClickTarget> {
    let pos = ctx.input(|i| {
        if i.pointer.any_click() {
            i.pointer.interact_pos()
        } else {
            None
        }
    })?;
    Some((pos, ctx.layer_id_at(pos)))
}
