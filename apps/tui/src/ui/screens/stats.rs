use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Paragraph, Row, Table, Tabs, Wrap};
use ratatui::Frame;
use serde_json::Value;

use crate::app::events::StatsData;
use crate::app::state::{App, StatsTab};
use crate::map::style::{GREEN_300, GREEN_500};
use crate::ui::format;
use crate::ui::render_reveal;
use crate::ui::widgets::charts::{render_ranking, render_year_chart};
use crate::ui::widgets::chrome::{
    error_line, panel, render_shortcuts, render_status, render_title, screen_layout,
};
use crate::ui::widgets::tables::{header_row, row_style};

const SHORTCUTS: [(&str, &str); 7] = [
    ("←/→", "Tab"),
    ("y/Y", "Year"),
    ("g/G", "Product"),
    ("r", "Reload"),
    ("m/Esc", "Map"),
    ("?", "Help"),
    ("q", "Quit"),
];

pub fn render_stats_screen(app: &App, f: &mut Frame<'_>) {
    let [title, body, status, keys] = screen_layout(f.area());

    let year = app
        .stats_filters
        .year
        .map_or_else(|| "toutes années".to_string(), |y| y.to_string());
    let product = app.stats_product_name().unwrap_or("tous produits");
    render_title(f, title, &format!("Statistiques · {year} · {product}"));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(body);

    let tabs = Tabs::new(StatsTab::ALL.iter().map(|tab| tab.title()).collect::<Vec<_>>())
        .select(app.stats_tab.index())
        .block(panel("Vue", false))
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(GREEN_500).add_modifier(Modifier::BOLD))
        .divider(Span::raw("|"));
    f.render_widget(tabs, chunks[0]);

    match &app.stats {
        Some(stats) => {
            match app.stats_tab {
                StatsTab::Overview => render_overview(stats, f, chunks[1]),
                StatsTab::Evolution => render_evolution(stats, f, chunks[1]),
                StatsTab::Distribution => render_distribution(stats, f, chunks[1]),
                StatsTab::Top => render_top(stats, f, chunks[1]),
            }
            render_reveal(app, f, chunks[1]);
        }
        None => {
            let line = error_line(app).unwrap_or_else(|| {
                TextLine::from(Span::styled(
                    if app.loading.stats {
                        "Loading statistics…"
                    } else {
                        "No statistics loaded"
                    },
                    Style::default().fg(Color::Gray),
                ))
            });
            f.render_widget(
                Paragraph::new(line)
                    .block(panel("Statistiques", true))
                    .alignment(Alignment::Center),
                chunks[1],
            );
        }
    }

    render_status(app, f, status);
    render_shortcuts(f, keys, &SHORTCUTS);
}

fn stat_line(label: &str, value: String) -> TextLine<'static> {
    TextLine::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::styled(
            value,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ])
}

/// Renders a production statistics value, numbers grouped.
fn display_stat(value: &Value) -> String {
    match value {
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), |v| format::number(v, 2)),
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn render_overview(stats: &StatsData, f: &mut Frame<'_>, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let global = &stats.global;
    let lines = vec![
        stat_line("Régions", format::integer(global.total_regions)),
        stat_line("Départements", format::integer(global.total_departements)),
        stat_line("Communes", format::integer(global.total_communes)),
        stat_line("Filières", format::integer(global.total_sectors)),
        stat_line("Produits", format::integer(global.total_products)),
        stat_line("Productions", format::integer(global.total_productions)),
    ];
    f.render_widget(
        Paragraph::new(Text::from(lines)).block(panel("Référentiel", true)),
        columns[0],
    );

    let mut lines: Vec<TextLine<'_>> = stats
        .production
        .iter()
        .map(|(key, value)| stat_line(&key.replace('_', " "), display_stat(value)))
        .collect();
    if lines.is_empty() {
        lines.push(TextLine::from(Span::styled(
            "No production statistics",
            Style::default().fg(Color::Gray),
        )));
    }
    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(panel("Production", false))
            .wrap(Wrap { trim: true }),
        columns[1],
    );
}

fn render_evolution(stats: &StatsData, f: &mut Frame<'_>, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    render_year_chart(f, rows[0], "Production par année", &stats.by_year);
    render_year_chart(f, rows[1], "Évolution", &stats.evolution);
}

fn ranked<T>(items: &[T], label: impl Fn(&T) -> String, value: impl Fn(&T) -> f64) -> Vec<(String, f64)> {
    let mut rows: Vec<(String, f64)> = items.iter().map(|item| (label(item), value(item))).collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    rows
}

fn render_distribution(stats: &StatsData, f: &mut Frame<'_>, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let regions = ranked(&stats.by_region, |r| r.label(), |r| r.total_quantity);
    let products = ranked(&stats.by_product, |p| p.label(), |p| p.total_quantity);
    render_ranking(f, columns[0], "Par région", &regions);
    render_ranking(f, columns[1], "Par produit", &products);
}

fn top_table<'a>(title: &str, rows: Vec<(String, f64, Option<f64>)>) -> Table<'a> {
    let total: f64 = rows.iter().map(|r| r.1).sum();
    let rows: Vec<Row<'_>> = rows
        .into_iter()
        .enumerate()
        .map(|(i, (label, quantity, value))| {
            Row::new(vec![
                format!("{}", i + 1),
                label,
                format::number(quantity, 0),
                format::percent(quantity, total),
                value.map_or_else(|| "-".to_string(), format::fcfa),
            ])
            .style(if i == 0 {
                Style::default().fg(GREEN_300).add_modifier(Modifier::BOLD)
            } else {
                row_style(false)
            })
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(8),
            Constraint::Fill(1),
        ],
    )
    .header(header_row(&["#", "Nom", "Quantité", "Part", "Valeur"]))
    .block(panel(title, true))
    .column_spacing(1)
}

fn render_top(stats: &StatsData, f: &mut Frame<'_>, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let regions = stats
        .top_regions
        .iter()
        .map(|r| (r.label(), r.total_quantity, r.total_value_fcfa))
        .collect();
    let products = stats
        .top_products
        .iter()
        .map(|p| (p.label(), p.total_quantity, p.total_value_fcfa))
        .collect();

    f.render_widget(top_table("Top régions", regions), columns[0]);
    f.render_widget(top_table("Top produits", products), columns[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::RegionTotal;
    use serde_json::json;

    #[test]
    fn ranking_is_descending() {
        let totals = vec![
            RegionTotal {
                name: Some("Est".into()),
                total_quantity: 5.0,
                ..RegionTotal::default()
            },
            RegionTotal {
                name: Some("Centre".into()),
                total_quantity: 50.0,
                ..RegionTotal::default()
            },
        ];
        let rows = ranked(&totals, RegionTotal::label, |r| r.total_quantity);
        assert_eq!(rows[0].0, "Centre");
        assert_eq!(rows[1].0, "Est");
    }

    #[test]
    fn stat_values_are_grouped() {
        assert_eq!(display_stat(&json!(1234567.5)), "1 234 567,5");
        assert_eq!(display_stat(&json!("tonnes")), "tonnes");
        assert_eq!(display_stat(&Value::Null), "-");
    }
}
