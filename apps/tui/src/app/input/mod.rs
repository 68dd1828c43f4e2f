pub(crate) mod helpers;
pub mod screens;

use crate::app::state::App;
use crossterm::event::{KeyCode, MouseEventKind};

pub fn handle_input(app: &mut App, key: KeyCode) {
    screens::dispatch_input(app, key);
}

/// Mouse events over the map canvas, in canvas-local cells. `None` means
/// the pointer is outside the canvas.
pub fn handle_map_mouse(app: &mut App, kind: MouseEventKind, cell: Option<(u16, u16)>) {
    screens::map::handle_map_mouse(app, kind, cell);
}
