use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Paragraph, Tabs, Wrap};
use ratatui::Frame;

use crate::app::state::{App, FilterSection, SidebarTab};
use crate::domain::MapLevel;
use crate::map::style::{GREEN_300, GREEN_500};
use crate::ui::format;
use crate::ui::widgets::chrome::{
    error_line, panel, render_shortcuts, render_status, render_title, screen_layout,
};
use crate::ui::widgets::map::{render_legend, render_map, render_tooltip};
use crate::ui::widgets::tables::{row_style, scroll_offset};

const SHORTCUTS: [(&str, &str); 9] = [
    ("1-3", "Level"),
    ("n/p", "Cycle"),
    ("o", "Detail"),
    ("/", "Search"),
    ("Tab", "Filters"),
    ("s", "Stats"),
    ("R", "Refresh"),
    ("?", "Help"),
    ("q", "Quit"),
];

fn body_split(body: Rect) -> [Rect; 2] {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(body);
    [chunks[0], chunks[1]]
}

/// Inner area of the map canvas for a frame of size `full`.
pub fn canvas_area(full: Rect) -> Rect {
    let [_, body, _, _] = screen_layout(full);
    body_split(body)[0].inner(Margin::new(1, 1))
}

pub fn render_map_screen(app: &App, f: &mut Frame<'_>) {
    let [title, body, status, keys] = screen_layout(f.area());
    let [map_area, sidebar] = body_split(body);
    let level = app.map.level();

    render_title(
        f,
        title,
        &format!("{} · {} zones", level.label(), app.map.feature_count()),
    );
    render_map_panel(app, f, map_area);
    render_sidebar(app, f, sidebar);
    render_status(app, f, status);
    render_shortcuts(f, keys, &SHORTCUTS);
}

fn render_map_panel(app: &App, f: &mut Frame<'_>, area: Rect) {
    let level = app.map.level();
    let title = app
        .map
        .selected()
        .and_then(|id| app.map.collection()?.find(id))
        .map_or_else(
            || level.label().to_string(),
            |feature| format!("{} · {}", level.label(), feature.name()),
        );

    render_map(f, area, &app.map.surface, panel(&title, true));
    let canvas = area.inner(Margin::new(1, 1));

    if app.map.feature_count() == 0 {
        let message = if app.loading.geo {
            format!("Loading {}…", level.label().to_lowercase())
        } else {
            "No zones to display".to_string()
        };
        let middle = Rect::new(canvas.x, canvas.y + canvas.height / 2, canvas.width, 1);
        f.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center),
            middle,
        );
    }

    if let Some(tooltip) = app.map.surface.tooltip() {
        render_tooltip(f, canvas, tooltip);
    }
    if app.map.metric().is_some() {
        render_legend(f, canvas, "Production");
    }
}

fn render_sidebar(app: &App, f: &mut Frame<'_>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let tabs = Tabs::new(SidebarTab::TITLES.to_vec())
        .select(app.sidebar_tab.index())
        .block(panel("Sidebar", false))
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(GREEN_500).add_modifier(Modifier::BOLD))
        .divider(Span::raw("|"));
    f.render_widget(tabs, chunks[0]);

    match app.sidebar_tab {
        SidebarTab::Filters => render_filters(app, f, chunks[1]),
        SidebarTab::Info => render_info(app, f, chunks[1]),
    }
}

fn render_filters(app: &App, f: &mut Frame<'_>, area: Rect) {
    let searching = app.search_active || !app.search_query.is_empty();
    let mut constraints = Vec::new();
    if searching {
        constraints.push(Constraint::Length(3));
    }
    constraints.extend([
        Constraint::Length(5),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(6),
    ]);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut slots = chunks.iter().copied();
    if searching {
        if let Some(slot) = slots.next() {
            render_search(app, f, slot);
        }
    }

    for section in FilterSection::ALL {
        let Some(slot) = slots.next() else {
            break;
        };
        let items = section_items(app, section);
        render_section(app, f, slot, section, &items);
    }
}

fn render_search(app: &App, f: &mut Frame<'_>, area: Rect) {
    let cursor = if app.search_active { "▏" } else { "" };
    let hint = if app.search_active {
        "  Enter: search API  Esc: cancel"
    } else {
        ""
    };
    let line = TextLine::from(vec![
        Span::styled("/ ", Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("{}{cursor}", app.search_query),
            Style::default().fg(Color::White),
        ),
        Span::styled(hint, Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(
        Paragraph::new(line).block(panel("Search", app.search_active)),
        area,
    );
}

/// Label and "is the active filter" flag for each entry of a section.
fn section_items(app: &App, section: FilterSection) -> Vec<(String, bool)> {
    let filters = &app.filters;
    match section {
        FilterSection::Level => MapLevel::ALL
            .iter()
            .enumerate()
            .map(|(i, level)| {
                (
                    format!("{} {}", i + 1, level.label()),
                    *level == app.map.level(),
                )
            })
            .collect(),
        FilterSection::Sectors => app
            .visible_sectors()
            .into_iter()
            .map(|s| (s.name.clone(), filters.sector_id == Some(s.id)))
            .collect(),
        FilterSection::Categories => app
            .categories
            .iter()
            .map(|c| (c.name.clone(), filters.category_id == Some(c.id)))
            .collect(),
        FilterSection::Products => app
            .products
            .iter()
            .map(|p| (p.name.clone(), filters.product_id == Some(p.id)))
            .collect(),
        FilterSection::Year => std::iter::once(("Toutes".to_string(), filters.year.is_none()))
            .chain(
                app.years
                    .iter()
                    .map(|year| (year.to_string(), filters.year == Some(*year))),
            )
            .collect(),
    }
}

fn empty_hint(app: &App, section: FilterSection) -> &'static str {
    match section {
        FilterSection::Sectors if app.loading.sectors => "Loading…",
        FilterSection::Sectors => "No filière",
        FilterSection::Categories if app.filters.sector_id.is_none() => "Pick a filière",
        FilterSection::Products
            if app.filters.sector_id.is_none() && app.filters.category_id.is_none() =>
        {
            "Pick a filière or catégorie"
        }
        _ => "Nothing here",
    }
}

fn render_section(
    app: &App,
    f: &mut Frame<'_>,
    area: Rect,
    section: FilterSection,
    items: &[(String, bool)],
) {
    let focused = app.sidebar_tab == SidebarTab::Filters && app.filter_section == section;
    let block = panel(section.title(), focused);
    let visible = usize::from(block.inner(area).height);
    let width = usize::from(area.width.saturating_sub(6));

    if items.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled(
                empty_hint(app, section),
                Style::default().fg(Color::DarkGray),
            ))
            .block(block),
            area,
        );
        return;
    }

    let cursor = app.cursor(section).min(items.len() - 1);
    let offset = scroll_offset(items.len(), visible, cursor);
    let lines: Vec<TextLine<'_>> = items
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, (label, active))| {
            let marker = if *active { "● " } else { "○ " };
            let style = if focused && i == cursor {
                row_style(true)
            } else if *active {
                Style::default().fg(GREEN_300).add_modifier(Modifier::BOLD)
            } else {
                row_style(false)
            };
            TextLine::from(Span::styled(
                format!("{marker}{}", format::truncate(label, width)),
                style,
            ))
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_info(app: &App, f: &mut Frame<'_>, area: Rect) {
    let block = panel("Info", true);
    let mut lines: Vec<TextLine<'_>> = Vec::new();
    if let Some(error) = error_line(app) {
        lines.push(error);
        lines.push(TextLine::from(""));
    }

    match (&app.selection, app.map.selected()) {
        (_, None) => {
            lines.push(TextLine::from(Span::styled(
                "Click a zone or press n/p to select one.",
                Style::default().fg(Color::Gray),
            )));
        }
        (None, Some(_)) => {
            lines.push(TextLine::from(Span::styled(
                "Loading…",
                Style::default().fg(Color::Gray),
            )));
        }
        (Some(info), Some(_)) => {
            lines.push(TextLine::from(Span::styled(
                info.title.clone(),
                Style::default().fg(GREEN_500).add_modifier(Modifier::BOLD),
            )));
            lines.push(TextLine::from(""));
            for (key, value) in &info.fields {
                lines.push(TextLine::from(vec![
                    Span::styled(format!("{key}: "), Style::default().fg(Color::Gray)),
                    Span::styled(value.clone(), Style::default().fg(Color::White)),
                ]));
            }
            if let Some(productions) = &info.productions {
                let quantity: f64 = productions.iter().filter_map(|p| p.quantity).sum();
                let value: f64 = productions.iter().filter_map(|p| p.value_fcfa).sum();
                lines.push(TextLine::from(""));
                lines.push(TextLine::from(Span::styled(
                    "Productions (filtered)",
                    Style::default().fg(GREEN_300).add_modifier(Modifier::BOLD),
                )));
                lines.push(TextLine::from(format!("Records: {}", productions.len())));
                lines.push(TextLine::from(format!(
                    "Quantity: {}",
                    format::number(quantity, 2)
                )));
                lines.push(TextLine::from(format!("Value: {}", format::fcfa(value))));
            }
            lines.push(TextLine::from(""));
            lines.push(TextLine::from(Span::styled(
                "Enter / o: open detail",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn canvas_sits_inside_map_block() {
        let full = Rect::new(0, 0, 120, 40);
        let canvas = canvas_area(full);
        let [_, body, _, _] = screen_layout(full);
        assert_eq!(canvas.x, body.x + 1);
        assert_eq!(canvas.y, body.y + 1);
        assert!(canvas.width < body.width);
        assert_eq!(canvas.height, body.height - 2);
    }

    #[tokio::test]
    async fn renders_empty_map_screen() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let config = crate::config::ApiConfig::default();
        let client = crate::api::ApiClient::new(&config).unwrap();
        let app = App::new(client, MapLevel::Regions, tx);

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| render_map_screen(&app, f)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("AgriVision"));
        assert!(text.contains("No zones to display"));
        assert!(text.contains("Filières"));
    }
}
