// UI module for agrivision
// Screen dispatch and the shared reveal effect

pub mod format;
pub mod screens;
pub mod widgets;

use crate::app::state::AppScreen;
use crate::app::App;
use ratatui::layout::{Margin, Rect};
use ratatui::Frame;
use tachyonfx::EffectRenderer;

pub fn ui(app: &App, f: &mut Frame<'_>) {
    match app.screen {
        AppScreen::Map => screens::map::render_map_screen(app, f),
        AppScreen::Detail => screens::detail::render_detail_screen(app, f),
        AppScreen::Stats => screens::stats::render_stats_screen(app, f),
    }

    if app.show_help {
        let area = f.area().inner(Margin::new(2, 1));
        screens::help::render_help_popup(app, f, area);
    }
}

/// Plays the pending reveal effect over `area`, if any.
pub fn render_reveal(app: &App, f: &mut Frame<'_>, area: Rect) {
    if let Ok(mut effect) = app.reveal_fx.lock() {
        if let Some(effect) = effect.as_mut() {
            let buffer = f.buffer_mut();
            buffer.render_effect(effect, area, app.last_tick);
        }
    }
}
