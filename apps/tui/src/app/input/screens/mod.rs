use crate::app::state::{App, AppScreen};
use crossterm::event::KeyCode;

mod detail;
mod help;
pub mod map;
mod stats;

pub fn dispatch_input(app: &mut App, key: KeyCode) {
    // Search input swallows every key, including the help toggle.
    if app.screen == AppScreen::Map && app.search_active {
        map::handle_search_input(app, key);
        return;
    }

    if help::handle_help_toggle(app, key) {
        return;
    }

    match app.screen {
        AppScreen::Map => map::handle_map_input(app, key),
        AppScreen::Detail => detail::handle_detail_input(app, key),
        AppScreen::Stats => stats::handle_stats_input(app, key),
    }
}
