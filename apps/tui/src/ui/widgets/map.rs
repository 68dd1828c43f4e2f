//! Draws a [`CanvasSurface`] onto a braille canvas.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Clear, Paragraph};
use ratatui::Frame;

use crate::map::geojson::Position;
use crate::map::style::LEGEND;
use crate::map::{CanvasSurface, Geometry, LayerStyle};

/// Renders every layer of `surface` inside `block`. The canvas uses the
/// block's inner area, which is what the surface was sized to.
pub fn render_map(f: &mut Frame<'_>, area: Rect, surface: &CanvasSurface, block: Block<'_>) {
    let viewport = surface.viewport();
    let bounds = viewport.bounds();
    let inner = block.inner(area);
    let dot_x = bounds.width() / f64::from(inner.width.max(1)) / 2.0;
    let dot_y = bounds.height() / f64::from(inner.height.max(1)) / 4.0;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(viewport.x_bounds())
        .y_bounds(viewport.y_bounds())
        .paint(|ctx| {
            for layer in surface.layers() {
                let style = surface.effective_style(layer);
                let points: Vec<Position> = surface
                    .fill_samples(layer.id)
                    .iter()
                    .filter(|sample| sample.visible_at(style.fill_opacity))
                    .map(|sample| sample.position)
                    .collect();
                if !points.is_empty() {
                    ctx.draw(&Points {
                        coords: &points,
                        color: style.fill,
                    });
                }
            }

            // Outlines go above every fill.
            ctx.layer();
            for layer in surface.layers() {
                if let Some(geometry) = &layer.geometry {
                    let style = surface.effective_style(layer);
                    draw_outline(ctx, geometry, style, (dot_x, dot_y));
                }
            }
        });

    f.render_widget(canvas, area);
}

fn stroke_offsets(weight: u8, (dot_x, dot_y): (f64, f64)) -> Vec<(f64, f64)> {
    match weight {
        0 | 1 => vec![(0.0, 0.0)],
        2 => vec![(0.0, 0.0), (dot_x, 0.0)],
        _ => vec![(0.0, 0.0), (dot_x, 0.0), (0.0, dot_y)],
    }
}

fn draw_path(ctx: &mut Context<'_>, path: &[Position], color: Color, offsets: &[(f64, f64)]) {
    for (ox, oy) in offsets {
        for pair in path.windows(2) {
            let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
            ctx.draw(&CanvasLine {
                x1: x1 + ox,
                y1: y1 + oy,
                x2: x2 + ox,
                y2: y2 + oy,
                color,
            });
        }
    }
}

fn draw_outline(ctx: &mut Context<'_>, geometry: &Geometry, style: LayerStyle, dots: (f64, f64)) {
    let offsets = stroke_offsets(style.weight, dots);
    match geometry {
        Geometry::Point(position) => ctx.draw(&Points {
            coords: &[*position],
            color: style.stroke,
        }),
        Geometry::LineString(path) => draw_path(ctx, path, style.stroke, &offsets),
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => {
            for ring in geometry.rings() {
                draw_path(ctx, ring, style.stroke, &offsets);
            }
        }
        Geometry::Unsupported(_) => {}
    }
}

/// Hover tooltip in the top-left corner of the canvas.
pub fn render_tooltip(f: &mut Frame<'_>, canvas: Rect, text: &str) {
    let width = u16::try_from(text.chars().count() + 2)
        .unwrap_or(u16::MAX)
        .min(canvas.width);
    if width == 0 || canvas.height == 0 {
        return;
    }
    let area = Rect::new(canvas.x, canvas.y, width, 1);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(format!(" {text} "))
            .style(Style::default().fg(Color::Black).bg(Color::White)),
        area,
    );
}

/// Choropleth legend in the bottom-left corner of the canvas.
pub fn render_legend(f: &mut Frame<'_>, canvas: Rect, title: &str) {
    let height = u16::try_from(LEGEND.len() + 1).unwrap_or(u16::MAX);
    if canvas.height <= height || canvas.width < 14 {
        return;
    }
    let area = Rect::new(
        canvas.x,
        canvas.y + canvas.height - height,
        canvas.width.min(24),
        height,
    );

    let mut lines = vec![TextLine::from(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Gray),
    ))];
    lines.extend(LEGEND.iter().map(|(label, color)| {
        TextLine::from(vec![
            Span::styled("██ ", Style::default().fg(*color)),
            Span::raw(*label),
        ])
    }));

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines), area);
}
