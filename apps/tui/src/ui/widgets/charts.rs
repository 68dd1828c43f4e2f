use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph,
};
use ratatui::Frame;

use crate::api::models::YearTotal;
use crate::map::style::{AMBER_400, GREEN_500, GREEN_600};
use crate::ui::format;

fn chart_block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .title_style(Style::default().fg(GREEN_500).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(GREEN_600))
}

pub fn render_empty(f: &mut Frame<'_>, area: Rect, title: &str, message: &str) {
    let paragraph = Paragraph::new(message)
        .style(Style::default().fg(Color::Gray))
        .block(chart_block(title))
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

/// Axis bounds padded so the line never sits on the frame.
fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if (max - min).abs() < f64::EPSILON {
        return [min - 1.0, max + 1.0];
    }
    let pad = (max - min) * 0.05;
    [min - pad, max + pad]
}

/// Quantity and value per year as two line series. Values share the
/// quantity axis after scaling to its maximum.
pub fn render_year_chart(f: &mut Frame<'_>, area: Rect, title: &str, totals: &[YearTotal]) {
    if totals.is_empty() {
        render_empty(f, area, title, "No production data");
        return;
    }

    let mut sorted: Vec<&YearTotal> = totals.iter().collect();
    sorted.sort_by_key(|t| t.year);

    let quantities: Vec<(f64, f64)> = sorted
        .iter()
        .map(|t| (f64::from(t.year), t.total_quantity))
        .collect();

    let max_quantity = quantities.iter().map(|p| p.1).fold(0.0, f64::max);
    let max_value = sorted
        .iter()
        .filter_map(|t| t.total_value_fcfa)
        .fold(0.0, f64::max);
    let values: Vec<(f64, f64)> = if max_value > 0.0 && max_quantity > 0.0 {
        sorted
            .iter()
            .filter_map(|t| Some((f64::from(t.year), t.total_value_fcfa? / max_value * max_quantity)))
            .collect()
    } else {
        Vec::new()
    };

    let x_bounds = padded_bounds(quantities.iter().map(|p| p.0));
    let y_bounds = [0.0, padded_bounds(quantities.iter().map(|p| p.1))[1].max(1.0)];

    let mut datasets = vec![Dataset::default()
        .name("Quantité")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(GREEN_500))
        .data(&quantities)];
    if !values.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Valeur (relative)")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(AMBER_400))
                .data(&values),
        );
    }

    let first = sorted.first().map_or(0, |t| t.year);
    let last = sorted.last().map_or(0, |t| t.year);

    let chart = Chart::new(datasets)
        .block(chart_block(title))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels(vec![
                    Span::raw(first.to_string()),
                    Span::raw(last.to_string()),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format::number(y_bounds[1], 0)),
                ]),
        );

    f.render_widget(chart, area);
}

/// Horizontal bars for labelled totals, largest first.
pub fn render_ranking(f: &mut Frame<'_>, area: Rect, title: &str, rows: &[(String, f64)]) {
    if rows.is_empty() {
        render_empty(f, area, title, "No data");
        return;
    }

    let label_width = usize::from(area.width / 3).max(6);
    let bars: Vec<Bar<'_>> = rows
        .iter()
        .map(|(label, value)| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let height = value.max(0.0).round() as u64;
            Bar::default()
                .label(Line::from(format::truncate(label, label_width)))
                .value(height)
                .text_value(format::number(*value, 0))
                .style(Style::default().fg(GREEN_500))
                .value_style(Style::default().fg(Color::Black).bg(GREEN_500))
        })
        .collect();

    let chart = BarChart::default()
        .block(chart_block(title))
        .direction(ratatui::layout::Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));

    f.render_widget(chart, area);
}
