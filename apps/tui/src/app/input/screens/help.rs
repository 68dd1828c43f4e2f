use crate::app::state::App;
use crossterm::event::KeyCode;

/// Keys owned by the help overlay. Returns whether the key was consumed;
/// while the overlay is open it consumes everything.
pub fn handle_help_toggle(app: &mut App, key: KeyCode) -> bool {
    match (app.show_help, key) {
        (_, KeyCode::F(1)) | (false, KeyCode::Char('?')) => {
            app.show_help = !app.show_help;
            true
        }
        (true, KeyCode::Esc | KeyCode::Char('?')) => {
            app.show_help = false;
            true
        }
        (true, KeyCode::Char('q')) => {
            app.running = false;
            true
        }
        (open, _) => open,
    }
}
