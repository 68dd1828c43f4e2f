//! Title bar, status bar and shortcut hints shared by every screen.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use throbber_widgets_tui::Throbber;

use crate::app::App;
use crate::map::style::{GREEN_500, GREEN_600, RED_400};

/// Splits the frame into title, body, status and shortcut rows.
pub fn screen_layout(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(8),    // Body
            Constraint::Length(3), // Status
            Constraint::Length(1), // Shortcuts
        ])
        .split(area.inner(Margin::new(1, 0)));
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

pub fn render_title(f: &mut Frame<'_>, area: Rect, subtitle: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(GREEN_600));

    let title = Paragraph::new(TextLine::from(vec![
        Span::styled(
            "AgriVision ",
            Style::default().fg(GREEN_500).add_modifier(Modifier::BOLD),
        ),
        Span::styled("· ", Style::default().fg(Color::Gray)),
        Span::styled(
            subtitle.to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(block)
    .alignment(Alignment::Left);

    f.render_widget(title, area);
}

pub fn render_status(app: &App, f: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .title(" Status ")
        .title_style(Style::default().fg(Color::Yellow))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let mut spans = Vec::new();
    if app.loading.any() {
        let throbber = Throbber::default()
            .label("Loading ")
            .style(Style::default().fg(GREEN_500));
        spans.extend(throbber.to_line(&app.throbber).spans);
    }

    if !app.status_message.is_empty() {
        let style = if app.status_message.starts_with("Error") {
            Style::default().fg(RED_400)
        } else {
            Style::default().fg(Color::Green)
        };
        spans.push(Span::styled(app.status_message.clone(), style));
    }

    let stats = app.client().cache_stats();
    let cache = format!(
        "cache {} entries, {} hits / {} misses",
        stats.entries, stats.hits, stats.misses
    );

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(48)])
        .split(block.inner(area));
    f.render_widget(block, area);

    f.render_widget(
        Paragraph::new(Text::from(TextLine::from(spans))).wrap(Wrap { trim: true }),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(Span::styled(cache, Style::default().fg(Color::DarkGray)))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

/// One-line key hints, e.g. `[("q", "Quit"), ("?", "Help")]`.
pub fn render_shortcuts(f: &mut Frame<'_>, area: Rect, keys: &[(&str, &str)]) {
    let mut spans = Vec::with_capacity(keys.len() * 2);
    for (i, (key, label)) in keys.iter().enumerate() {
        spans.push(Span::styled(
            (*key).to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        let separator = if i + 1 == keys.len() { "" } else { " | " };
        spans.push(Span::styled(
            format!(": {label}{separator}"),
            Style::default().fg(Color::Gray),
        ));
    }

    f.render_widget(
        Paragraph::new(TextLine::from(spans)).alignment(Alignment::Center),
        area,
    );
}

/// Bordered panel block in the app's green frame style.
pub fn panel(title: &str, focused: bool) -> Block<'static> {
    let color = if focused { GREEN_500 } else { GREEN_600 };
    Block::default()
        .title(format!(" {title} "))
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

/// Error banner text, if any.
pub fn error_line(app: &App) -> Option<TextLine<'static>> {
    app.error.as_ref().map(|message| {
        TextLine::from(Span::styled(
            format!("⚠ {message}"),
            Style::default().fg(RED_400).add_modifier(Modifier::BOLD),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_reserves_fixed_rows() {
        let [title, body, status, keys] = screen_layout(Rect::new(0, 0, 100, 40));
        assert_eq!(title.height, 3);
        assert_eq!(status.height, 3);
        assert_eq!(keys.height, 1);
        assert_eq!(body.height, 33);
        assert_eq!(body.x, 1);
        assert_eq!(body.width, 98);
    }
}
