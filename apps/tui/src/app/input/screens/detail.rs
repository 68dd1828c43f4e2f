use crate::app::state::App;
use crossterm::event::KeyCode;

pub fn handle_detail_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc | KeyCode::Char('b') => app.show_map(),
        KeyCode::Char('q') => app.running = false,
        KeyCode::Tab => app.toggle_detail_panel(),
        KeyCode::Up => app.move_detail_cursor(false),
        KeyCode::Down => app.move_detail_cursor(true),
        KeyCode::Enter => app.open_child_detail(),
        KeyCode::Char('+' | '=') => app.detail_map.zoom_by(1.0),
        KeyCode::Char('-') => app.detail_map.zoom_by(-1.0),
        KeyCode::Char('s') => app.show_stats(),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('R') => app.hard_refresh(),
        _ => {}
    }
}
