use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::state::{App, AppScreen};
use crate::map::style::{GREEN_500, GREEN_600};
use crate::ui::widgets::chrome::panel;
use crate::ui::widgets::popup::centered_rect;

const GLOBAL_KEYS: [(&str, &str); 4] = [
    ("F1 / ?", "Toggle this help"),
    ("r", "Reload the current screen"),
    ("R", "Clear the response cache and reload"),
    ("q", "Quit"),
];

const MAP_KEYS: [(&str, &str); 14] = [
    ("1 / 2 / 3", "Régions, départements, communes"),
    ("click", "Select the zone under the pointer"),
    ("n / p", "Select next / previous zone"),
    ("h j k l", "Pan the map"),
    ("+ / -", "Zoom in / out (mouse wheel too)"),
    ("0", "Reset the view"),
    ("o", "Open the selected zone's detail page"),
    ("i", "Switch between Filters and Info"),
    ("Tab / S-Tab", "Next / previous filter section"),
    ("↑ / ↓", "Move in the filter section"),
    ("Enter / Space", "Toggle the highlighted filter"),
    ("/", "Search filières (Enter queries the API)"),
    ("x", "Reset every filter"),
    ("Esc", "Clear the selection"),
];

const DETAIL_KEYS: [(&str, &str); 5] = [
    ("Tab", "Productions / related table"),
    ("↑ / ↓", "Move in the table"),
    ("Enter", "Open the highlighted département or commune"),
    ("+ / -", "Zoom the location map"),
    ("Esc / b", "Back to the map"),
];

const STATS_KEYS: [(&str, &str); 4] = [
    ("← / →", "Switch tab"),
    ("y / Y", "Next / previous year"),
    ("g / G", "Next / previous product"),
    ("m / Esc", "Back to the map"),
];

fn section(title: &str, keys: &[(&str, &str)], lines: &mut Vec<TextLine<'static>>) {
    lines.push(TextLine::from(Span::styled(
        title.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (key, action) in keys {
        lines.push(TextLine::from(vec![
            Span::styled(
                format!("  {key:<14}"),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw((*action).to_string()),
        ]));
    }
    lines.push(TextLine::from(""));
}

pub fn help_lines(screen: AppScreen) -> Vec<TextLine<'static>> {
    let mut lines = vec![
        TextLine::from(Span::styled(
            "AgriVision",
            Style::default().fg(GREEN_500).add_modifier(Modifier::BOLD),
        )),
        TextLine::from("Agricultural production statistics by region, département and commune."),
        TextLine::from(""),
    ];

    match screen {
        AppScreen::Map => section("Map", &MAP_KEYS, &mut lines),
        AppScreen::Detail => section("Detail", &DETAIL_KEYS, &mut lines),
        AppScreen::Stats => section("Statistics", &STATS_KEYS, &mut lines),
    }
    section("Everywhere", &GLOBAL_KEYS, &mut lines);
    lines
}

pub fn render_help_popup(app: &App, f: &mut Frame<'_>, area: Rect) {
    let popup_area = centered_rect(70, 80, area);
    f.render_widget(Clear, popup_area);

    let block = panel("Help & Keyboard Shortcuts", true).border_style(Style::default().fg(GREEN_600));
    let paragraph = Paragraph::new(Text::from(help_lines(app.screen)))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup_area);

    let hint_area = Rect {
        x: popup_area.x,
        y: popup_area.y + popup_area.height.saturating_sub(2),
        width: popup_area.width,
        height: 1,
    };
    f.render_widget(
        Paragraph::new(Span::styled(
            "Press ? or Esc to close",
            Style::default().fg(Color::Gray),
        ))
        .alignment(Alignment::Center),
        hint_area,
    );
}
