use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::app::events::DetailData;
use crate::app::state::{App, DetailPanel};
use crate::map::style::{GREEN_300, GREEN_500};
use crate::ui::format;
use crate::ui::render_reveal;
use crate::ui::widgets::chrome::{
    error_line, panel, render_shortcuts, render_status, render_title, screen_layout,
};
use crate::ui::widgets::map::render_map;
use crate::ui::widgets::tables::{header_row, row_style, scroll_offset};

const SHORTCUTS: [(&str, &str); 7] = [
    ("Esc/b", "Map"),
    ("Tab", "Table"),
    ("↑/↓", "Row"),
    ("Enter", "Open"),
    ("s", "Stats"),
    ("r", "Reload"),
    ("?", "Help"),
];

fn body_split(body: Rect) -> [Rect; 3] {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);
    [top[0], top[1], rows[1]]
}

/// Inner area of the detail map canvas for a frame of size `full`.
pub fn map_area(full: Rect) -> Rect {
    let [_, body, _, _] = screen_layout(full);
    body_split(body)[1].inner(Margin::new(1, 1))
}

pub fn render_detail_screen(app: &App, f: &mut Frame<'_>) {
    let [title, body, status, keys] = screen_layout(f.area());
    let [info, map, table] = body_split(body);

    let heading = match (&app.detail_target, &app.detail) {
        (Some(target), Some(data)) => format!("{} · {}", target.level.singular(), data.entity.title),
        (Some(target), None) => format!("{} #{}", target.level.singular(), target.id),
        (None, _) => "Detail".to_string(),
    };
    render_title(f, title, &heading);

    render_map(f, map, &app.detail_map.surface, panel("Location", false));

    match &app.detail {
        Some(data) => {
            render_info(app, data, f, info);
            render_table(app, data, f, table);
            render_reveal(app, f, body);
        }
        None => render_placeholder(app, f, info, table),
    }

    render_status(app, f, status);
    render_shortcuts(f, keys, &SHORTCUTS);
}

fn render_placeholder(app: &App, f: &mut Frame<'_>, info: Rect, table: Rect) {
    let mut lines = Vec::new();
    if let Some(error) = error_line(app) {
        lines.push(error);
    } else {
        lines.push(TextLine::from(Span::styled(
            if app.loading.detail {
                "Loading…"
            } else {
                "No data"
            },
            Style::default().fg(Color::Gray),
        )));
    }
    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(panel("Information", true))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        info,
    );
    f.render_widget(panel("Productions", false), table);
}

fn render_info(app: &App, data: &DetailData, f: &mut Frame<'_>, area: Rect) {
    let label = Style::default().fg(Color::Gray);
    let mut lines: Vec<TextLine<'_>> = vec![TextLine::from(Span::styled(
        data.entity.title.clone(),
        Style::default().fg(GREEN_500).add_modifier(Modifier::BOLD),
    ))];

    for (key, value) in &data.entity.fields {
        lines.push(TextLine::from(vec![
            Span::styled(format!("{key}: "), label),
            Span::raw(value.clone()),
        ]));
    }

    lines.push(TextLine::from(""));
    lines.push(TextLine::from(Span::styled(
        "Production summary",
        Style::default().fg(GREEN_300).add_modifier(Modifier::BOLD),
    )));
    let summary = [
        ("Records", data.productions.len().to_string()),
        ("Quantity", format::number(data.total_quantity(), 2)),
        ("Value", format::fcfa(data.total_value())),
        ("Producers", format::integer(data.total_producers())),
        ("Area", format!("{} ha", format::number(data.total_area(), 1))),
    ];
    for (key, value) in summary {
        lines.push(TextLine::from(vec![
            Span::styled(format!("{key}: "), label),
            Span::raw(value),
        ]));
    }

    if let Some(level) = app.detail_target.and_then(|t| t.child_level()) {
        lines.push(TextLine::from(vec![
            Span::styled(format!("{}: ", level.label()), label),
            Span::raw(data.children.len().to_string()),
        ]));
    } else {
        lines.push(TextLine::from(vec![
            Span::styled("Infrastructures: ", label),
            Span::raw(data.infrastructures.len().to_string()),
        ]));
    }

    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(panel("Information", true))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_table(app: &App, data: &DetailData, f: &mut Frame<'_>, area: Rect) {
    let (title, header, widths, rows) = match app.detail_panel {
        DetailPanel::Productions => production_rows(data),
        DetailPanel::Related if !data.children.is_empty() => child_rows(app, data),
        DetailPanel::Related => infrastructure_rows(data),
    };

    let block = panel(&format!("{title} ({})", rows.len()), true);
    if rows.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("Nothing to show", Style::default().fg(Color::Gray)))
                .block(block)
                .alignment(Alignment::Center),
            area,
        );
        return;
    }

    // Header plus its bottom margin.
    let visible = usize::from(block.inner(area).height.saturating_sub(2));
    let cursor = app.detail_cursor.min(rows.len() - 1);
    let offset = scroll_offset(rows.len(), visible, cursor);
    let rows: Vec<Row<'_>> = rows
        .into_iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, cells)| Row::new(cells).style(row_style(i == cursor)))
        .collect();

    let table = Table::new(rows, widths)
        .header(header_row(header))
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
}

type TableParts = (
    &'static str,
    &'static [&'static str],
    Vec<Constraint>,
    Vec<Vec<String>>,
);

fn production_rows(data: &DetailData) -> TableParts {
    let mut productions: Vec<_> = data.productions.iter().collect();
    productions.sort_by(|a, b| b.year.cmp(&a.year).then(a.product_id.cmp(&b.product_id)));
    let rows = productions
        .into_iter()
        .map(|p| {
            vec![
                data.product_name(p.product_id),
                p.year.to_string(),
                format::optional(p.season.as_deref()),
                p.quantity.map_or_else(|| "-".to_string(), |q| format::number(q, 2)),
                p.value_fcfa.map_or_else(|| "-".to_string(), format::fcfa),
                p.producers.map_or_else(|| "-".to_string(), format::integer),
            ]
        })
        .collect();
    (
        "Productions",
        &["Produit", "Année", "Saison", "Quantité", "Valeur", "Producteurs"],
        vec![
            Constraint::Fill(2),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(11),
        ],
        rows,
    )
}

fn child_rows(app: &App, data: &DetailData) -> TableParts {
    let title = app
        .detail_target
        .and_then(|t| t.child_level())
        .map_or("Related", |level| level.label());
    let rows = data
        .children
        .iter()
        .map(|child| {
            vec![
                child.name.clone(),
                child.code.clone(),
                child.population.map_or_else(|| "-".to_string(), format::integer),
            ]
        })
        .collect();
    (
        title,
        &["Nom", "Code", "Population"],
        vec![
            Constraint::Fill(2),
            Constraint::Length(10),
            Constraint::Fill(1),
        ],
        rows,
    )
}

fn infrastructure_rows(data: &DetailData) -> TableParts {
    let rows = data
        .infrastructures
        .iter()
        .map(|infra| {
            vec![
                infra.name.clone(),
                format::optional(infra.kind.as_deref()),
                format::optional(infra.capacity.as_deref()),
                format::optional(infra.address.as_deref()),
            ]
        })
        .collect();
    (
        "Infrastructures",
        &["Nom", "Type", "Capacité", "Adresse"],
        vec![
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(2),
        ],
        rows,
    )
}
