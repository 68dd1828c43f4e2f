use chrono::{DateTime, Utc};
use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseEvent};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io::Stdout;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::models::{GlobalStats, ProductTotal, RegionTotal};
use crate::api::{ApiClient, CacheStats};
use crate::app::tasks::TOP_LIMIT;
use crate::app::{handle_input, handle_map_mouse, App, AppEvent, AppScreen};
use crate::ui;

/// Run the application without a terminal UI: fetch headline statistics,
/// print them and exit.
pub async fn run_headless(client: &ApiClient, json: bool) -> Result<()> {
    let stats = build_headless_stats(client).await?;

    if json {
        let json = serde_json::to_string_pretty(&stats)?;
        println!("{json}");
    } else {
        render_headless_stats(&stats);
    }

    Ok(())
}

fn render_headless_stats(stats: &HeadlessStats) {
    let global = &stats.global;
    println!("\nAgriVision Stats");
    println!("================");
    println!("API: {}", stats.api_url);
    println!("Generated: {}", stats.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Regions: {}", ui::format::integer(global.total_regions));
    println!("Départements: {}", ui::format::integer(global.total_departements));
    println!("Communes: {}", ui::format::integer(global.total_communes));
    println!("Filières: {}", ui::format::integer(global.total_sectors));
    println!("Products: {}", ui::format::integer(global.total_products));
    println!("Production records: {}", ui::format::integer(global.total_productions));

    if !stats.years.is_empty() {
        let years: Vec<String> = stats.years.iter().map(ToString::to_string).collect();
        println!("Years: {}", years.join(", "));
    }

    println!("\nTop regions:");
    for region in &stats.top_regions {
        println!(
            "- {} | {}",
            region.label(),
            ui::format::number(region.total_quantity, 2)
        );
    }

    println!("\nTop products:");
    for product in &stats.top_products {
        println!(
            "- {} | {}",
            product.label(),
            ui::format::number(product.total_quantity, 2)
        );
    }

    println!(
        "\nCache: {} entries, {} hits, {} misses",
        stats.cache.entries, stats.cache.hits, stats.cache.misses
    );
}

async fn build_headless_stats(client: &ApiClient) -> Result<HeadlessStats> {
    let (global, years, top_regions, top_products) = tokio::try_join!(
        client.global_stats(),
        client.available_years(),
        client.top_regions(None, None, TOP_LIMIT),
        client.top_products(None, None, TOP_LIMIT),
    )?;

    let mut years = years;
    years.sort_unstable();

    Ok(HeadlessStats {
        api_url: client.base_url().to_string(),
        generated_at: Utc::now(),
        global,
        years,
        top_regions,
        top_products,
        cache: client.cache_stats(),
    })
}

#[derive(serde::Serialize)]
struct HeadlessStats {
    api_url: String,
    generated_at: DateTime<Utc>,
    global: GlobalStats,
    years: Vec<i32>,
    top_regions: Vec<RegionTotal>,
    top_products: Vec<ProductTotal>,
    cache: CacheStats,
}

/// Translates a terminal position into a cell of `canvas`, if inside.
const fn canvas_cell(canvas: Rect, column: u16, row: u16) -> Option<(u16, u16)> {
    if column >= canvas.x
        && row >= canvas.y
        && column < canvas.x + canvas.width
        && row < canvas.y + canvas.height
    {
        Some((column - canvas.x, row - canvas.y))
    } else {
        None
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, canvas: Rect) {
    if app.screen != AppScreen::Map || app.show_help {
        return;
    }
    let cell = canvas_cell(canvas, mouse.column, mouse.row);
    handle_map_mouse(app, mouse.kind, cell);
}

/// Run the main application event loop
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    events: &mut UnboundedReceiver<AppEvent>,
) -> Result<()> {
    // Configure event poll timeout (ms)
    const EVENT_POLL_TIMEOUT: u64 = 50;

    app.init();

    loop {
        // Apply finished fetches
        while let Ok(event) = events.try_recv() {
            app.apply(event);
        }

        // Keep both map surfaces sized to their canvases
        let size = terminal.size()?;
        let full = Rect::new(0, 0, size.width, size.height);
        let canvas = ui::screens::map::canvas_area(full);
        app.map.resize(canvas.width, canvas.height);
        let detail_canvas = ui::screens::detail::map_area(full);
        app.detail_map.resize(detail_canvas.width, detail_canvas.height);

        // Update animations
        app.update();

        if let Err(e) = terminal.draw(|f| ui::ui(app, f)) {
            return Err(color_eyre::eyre::eyre!("Terminal draw error: {e}"));
        }

        if matches!(
            event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT)),
            Ok(true)
        ) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    handle_input(app, key.code);
                }
                Ok(Event::Mouse(mouse)) => handle_mouse(app, mouse, canvas),
                Ok(Event::Resize(width, height)) => {
                    tracing::debug!(width, height, "terminal resized");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "failed to read terminal event"),
            }
        }

        if !app.running {
            break;
        }
    }

    tracing::info!("event loop finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_cell_is_relative_to_canvas() {
        let canvas = Rect::new(2, 3, 10, 5);
        assert_eq!(canvas_cell(canvas, 2, 3), Some((0, 0)));
        assert_eq!(canvas_cell(canvas, 11, 7), Some((9, 4)));
        assert_eq!(canvas_cell(canvas, 12, 7), None);
        assert_eq!(canvas_cell(canvas, 1, 4), None);
    }
}
