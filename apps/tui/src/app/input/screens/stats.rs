use crate::app::state::App;
use crossterm::event::KeyCode;

pub fn handle_stats_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc | KeyCode::Char('m' | 'b') => app.show_map(),
        KeyCode::Char('q') => app.running = false,
        KeyCode::Left => app.cycle_stats_tab(false),
        KeyCode::Right | KeyCode::Tab => app.cycle_stats_tab(true),
        KeyCode::Char('y') => app.cycle_stats_year(true),
        KeyCode::Char('Y') => app.cycle_stats_year(false),
        KeyCode::Char('g') => app.cycle_stats_product(true),
        KeyCode::Char('G') => app.cycle_stats_product(false),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('R') => app.hard_refresh(),
        _ => {}
    }
}
