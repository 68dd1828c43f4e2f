use crate::app::state::{App, SidebarTab};
use crate::domain::MapLevel;
use crossterm::event::{KeyCode, MouseButton, MouseEventKind};

const PAN_STEP: f64 = 0.1;
const ZOOM_STEP: f64 = 1.0;

pub fn handle_map_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('1') => app.set_level(MapLevel::Regions),
        KeyCode::Char('2') => app.set_level(MapLevel::Departements),
        KeyCode::Char('3') => app.set_level(MapLevel::Communes),
        KeyCode::Char('h') => app.map.pan(-PAN_STEP, 0.0),
        KeyCode::Char('l') => app.map.pan(PAN_STEP, 0.0),
        KeyCode::Char('k') => app.map.pan(0.0, PAN_STEP),
        KeyCode::Char('j') => app.map.pan(0.0, -PAN_STEP),
        KeyCode::Char('+' | '=') => app.map.zoom_by(ZOOM_STEP),
        KeyCode::Char('-') => app.map.zoom_by(-ZOOM_STEP),
        KeyCode::Char('0') => app.map.reset_view(),
        KeyCode::Char('n') => app.cycle_feature(true),
        KeyCode::Char('p') => app.cycle_feature(false),
        KeyCode::Char('o') => app.open_selected_detail(),
        KeyCode::Char('s') => app.show_stats(),
        KeyCode::Char('i') => app.sidebar_tab = app.sidebar_tab.toggled(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('x') => app.reset_filters(),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('R') => app.hard_refresh(),
        KeyCode::Tab => {
            app.sidebar_tab = SidebarTab::Filters;
            app.cycle_section(true);
        }
        KeyCode::BackTab => {
            app.sidebar_tab = SidebarTab::Filters;
            app.cycle_section(false);
        }
        KeyCode::Up if app.sidebar_tab == SidebarTab::Filters => app.move_cursor(false),
        KeyCode::Down if app.sidebar_tab == SidebarTab::Filters => app.move_cursor(true),
        KeyCode::Enter | KeyCode::Char(' ') if app.sidebar_tab == SidebarTab::Filters => {
            app.activate_filter();
        }
        KeyCode::Enter if app.sidebar_tab == SidebarTab::Info => app.open_selected_detail(),
        KeyCode::Esc => {
            if app.map.selected().is_some() {
                app.clear_selection();
            } else if !app.search_query.is_empty() {
                app.search_query.clear();
            }
        }
        _ => {}
    }
}

pub fn handle_search_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => {
            app.submit_search();
        }
        KeyCode::Backspace => app.pop_search(),
        KeyCode::Up => app.move_cursor(false),
        KeyCode::Down => app.move_cursor(true),
        KeyCode::Char(c) => app.push_search(c),
        _ => {}
    }
}

pub fn handle_map_mouse(app: &mut App, kind: MouseEventKind, cell: Option<(u16, u16)>) {
    let Some((col, row)) = cell else {
        app.leave_map();
        return;
    };

    match kind {
        MouseEventKind::Down(MouseButton::Left) => app.click_map(col, row),
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            app.hover_map(col, row);
        }
        MouseEventKind::ScrollUp => app.map.zoom_by(ZOOM_STEP),
        MouseEventKind::ScrollDown => app.map.zoom_by(-ZOOM_STEP),
        _ => {}
    }
}
