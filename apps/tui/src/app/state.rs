use std::sync::Mutex;
use std::time::{Duration, Instant};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use tachyonfx::{fx, Effect, Interpolation};
use throbber_widgets_tui::ThrobberState;

use super::events::{AppEvent, DetailData, DetailTarget, EntityInfo, StatsData, StatsFilters};
use super::input::helpers::step_index;
use super::map_panel::MapPanel;
use super::tasks::Tasks;
use crate::api::models::{Category, Product, Sector};
use crate::api::{ApiClient, ApiError};
use crate::domain::{FilterState, MapLevel};
use crate::map::{FeatureId, Metric, ReconcileOutcome, SelectOutcome};
use tokio::sync::mpsc::UnboundedSender;

const MIN_SEARCH_CHARS: usize = 2;
const REVEAL_MS: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Map,
    Detail,
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarTab {
    Filters,
    Info,
}

impl SidebarTab {
    pub const TITLES: [&'static str; 2] = ["Filters", "Info"];

    pub const fn index(self) -> usize {
        match self {
            Self::Filters => 0,
            Self::Info => 1,
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Filters => Self::Info,
            Self::Info => Self::Filters,
        }
    }
}

/// Sidebar section that owns the list cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSection {
    Level,
    Sectors,
    Categories,
    Products,
    Year,
}

impl FilterSection {
    pub const ALL: [Self; 5] = [
        Self::Level,
        Self::Sectors,
        Self::Categories,
        Self::Products,
        Self::Year,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::Level => 0,
            Self::Sectors => 1,
            Self::Categories => 2,
            Self::Products => 3,
            Self::Year => 4,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Level => "Map level",
            Self::Sectors => "Filières",
            Self::Categories => "Catégories",
            Self::Products => "Produits",
            Self::Year => "Année",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsTab {
    Overview,
    Evolution,
    Distribution,
    Top,
}

impl StatsTab {
    pub const ALL: [Self; 4] = [Self::Overview, Self::Evolution, Self::Distribution, Self::Top];

    pub const fn index(self) -> usize {
        match self {
            Self::Overview => 0,
            Self::Evolution => 1,
            Self::Distribution => 2,
            Self::Top => 3,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Evolution => "Evolution",
            Self::Distribution => "Distribution",
            Self::Top => "Top",
        }
    }
}

/// Lower table of the detail screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailPanel {
    Productions,
    Related,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loading {
    pub sectors: bool,
    pub geo: bool,
    pub metric: bool,
    pub selection: bool,
    pub detail: bool,
    pub stats: bool,
}

impl Loading {
    pub const fn any(&self) -> bool {
        self.sectors || self.geo || self.metric || self.selection || self.detail || self.stats
    }
}

pub struct App {
    pub running: bool,
    pub screen: AppScreen,
    pub show_help: bool,
    pub status_message: String,
    pub error: Option<String>,
    pub loading: Loading,
    pub throbber: ThrobberState,
    pub last_frame: Instant,
    pub last_tick: Duration,
    pub reveal_fx: Mutex<Option<Effect>>,
    started: Instant,
    tasks: Tasks,
    matcher: SkimMatcherV2,

    pub map: MapPanel,
    pub sidebar_tab: SidebarTab,
    pub filter_section: FilterSection,
    filter_cursors: [usize; 5],
    pub filters: FilterState,
    pub sectors: Vec<Sector>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub years: Vec<i32>,
    pub search_active: bool,
    pub search_query: String,
    pub selection: Option<EntityInfo>,

    pub detail_target: Option<DetailTarget>,
    pub detail: Option<DetailData>,
    pub detail_map: MapPanel,
    pub detail_panel: DetailPanel,
    pub detail_cursor: usize,

    pub stats_tab: StatsTab,
    pub stats_filters: StatsFilters,
    pub stats: Option<StatsData>,
}

impl App {
    pub fn new(client: ApiClient, level: MapLevel, tx: UnboundedSender<AppEvent>) -> Self {
        let now = Instant::now();
        Self {
            running: true,
            screen: AppScreen::Map,
            show_help: false,
            status_message: String::new(),
            error: None,
            loading: Loading::default(),
            throbber: ThrobberState::default(),
            last_frame: now,
            last_tick: Duration::ZERO,
            reveal_fx: Mutex::new(None),
            started: now,
            tasks: Tasks::new(client, tx),
            matcher: SkimMatcherV2::default(),
            map: MapPanel::new(level),
            sidebar_tab: SidebarTab::Filters,
            filter_section: FilterSection::Sectors,
            filter_cursors: [level.index(), 0, 0, 0, 0],
            filters: FilterState::default(),
            sectors: Vec::new(),
            categories: Vec::new(),
            products: Vec::new(),
            years: Vec::new(),
            search_active: false,
            search_query: String::new(),
            selection: None,
            detail_target: None,
            detail: None,
            detail_map: MapPanel::new(level),
            detail_panel: DetailPanel::Productions,
            detail_cursor: 0,
            stats_tab: StatsTab::Overview,
            stats_filters: StatsFilters::default(),
            stats: None,
        }
    }

    pub const fn client(&self) -> &ApiClient {
        self.tasks.client()
    }

    /// First fetches of the map screen.
    pub fn init(&mut self) {
        self.loading.sectors = true;
        self.tasks.sectors();
        self.tasks.years();
        self.load_geojson();
    }

    pub fn update(&mut self) {
        let now = Instant::now();
        self.last_tick = now.duration_since(self.last_frame);
        self.last_frame = now;

        if self.loading.any() {
            self.throbber.calc_next();
        }

        let seconds = now.duration_since(self.started).as_secs_f64();
        self.map.tick(seconds);
        self.detail_map.tick(seconds);
    }

    // Sidebar lists

    /// Filières shown in the sidebar, narrowed by the search box while typing.
    pub fn visible_sectors(&self) -> Vec<&Sector> {
        let query = self.search_query.trim();
        if !self.search_active || query.is_empty() {
            return self.sectors.iter().collect();
        }

        let mut scored: Vec<(i64, &Sector)> = self
            .sectors
            .iter()
            .filter_map(|sector| {
                self.matcher
                    .fuzzy_match(&sector.name, query)
                    .map(|score| (score, sector))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, sector)| sector).collect()
    }

    pub fn section_len(&self, section: FilterSection) -> usize {
        match section {
            FilterSection::Level => MapLevel::ALL.len(),
            FilterSection::Sectors => self.visible_sectors().len(),
            FilterSection::Categories => self.categories.len(),
            FilterSection::Products => self.products.len(),
            FilterSection::Year => self.years.len() + 1,
        }
    }

    pub const fn cursor(&self, section: FilterSection) -> usize {
        self.filter_cursors[section.index()]
    }

    pub fn move_cursor(&mut self, forward: bool) {
        let section = self.filter_section;
        let len = self.section_len(section);
        let cursor = &mut self.filter_cursors[section.index()];
        *cursor = step_index(*cursor, len, forward);
    }

    pub fn cycle_section(&mut self, forward: bool) {
        let index = self.filter_section.index();
        let len = FilterSection::ALL.len();
        let next = step_index(index, len, forward);
        self.filter_section = FilterSection::ALL[next];
    }

    fn clamp_cursor(&mut self, section: FilterSection) {
        let len = self.section_len(section);
        let cursor = &mut self.filter_cursors[section.index()];
        if *cursor >= len {
            *cursor = len.saturating_sub(1);
        }
    }

    /// Applies the highlighted entry of the focused section.
    pub fn activate_filter(&mut self) {
        let cursor = self.cursor(self.filter_section);
        match self.filter_section {
            FilterSection::Level => {
                if let Some(level) = MapLevel::from_index(cursor) {
                    self.set_level(level);
                }
            }
            FilterSection::Sectors => {
                if let Some(id) = self.visible_sectors().get(cursor).map(|s| s.id) {
                    self.toggle_sector(id);
                }
            }
            FilterSection::Categories => {
                if let Some(id) = self.categories.get(cursor).map(|c| c.id) {
                    self.toggle_category(id);
                }
            }
            FilterSection::Products => {
                if let Some(id) = self.products.get(cursor).map(|p| p.id) {
                    self.toggle_product(id);
                }
            }
            FilterSection::Year => {
                let year = cursor.checked_sub(1).and_then(|i| self.years.get(i).copied());
                self.set_year(year);
            }
        }
    }

    // Filters

    pub fn set_level(&mut self, level: MapLevel) {
        if level == self.map.level() {
            return;
        }
        tracing::info!(level = level.as_str(), "map level changed");
        self.filter_cursors[FilterSection::Level.index()] = level.index();
        self.map.switch_level(level);
        self.selection = None;
        self.loading.selection = false;
        self.loading.metric = false;
        self.status_message = format!("Loading {}...", level.label());
        self.load_geojson();
    }

    fn load_geojson(&mut self) {
        self.loading.geo = true;
        self.tasks.geojson(self.map.level());
    }

    pub fn toggle_sector(&mut self, id: i64) {
        let next = (self.filters.sector_id != Some(id)).then_some(id);
        self.filters.sector_id = next;
        self.filters.category_id = None;
        self.filters.product_id = None;
        self.categories.clear();
        self.products.clear();
        if let Some(sector_id) = next {
            self.tasks.categories(sector_id);
            self.tasks.products(Some(sector_id), None);
        }
        self.on_filters_changed();
    }

    pub fn toggle_category(&mut self, id: i64) {
        let next = (self.filters.category_id != Some(id)).then_some(id);
        self.filters.category_id = next;
        self.filters.product_id = None;
        self.products.clear();
        if next.is_some() || self.filters.sector_id.is_some() {
            self.tasks.products(self.filters.sector_id, next);
        }
        self.on_filters_changed();
    }

    pub fn toggle_product(&mut self, id: i64) {
        self.filters.product_id = (self.filters.product_id != Some(id)).then_some(id);
        self.on_filters_changed();
    }

    pub fn set_year(&mut self, year: Option<i32>) {
        self.filters.year = year;
        self.on_filters_changed();
    }

    pub fn reset_filters(&mut self) {
        self.filters = FilterState::default();
        self.categories.clear();
        self.products.clear();
        self.search_query.clear();
        self.search_active = false;
        self.filter_cursors[1..].fill(0);
        self.loading.sectors = true;
        self.tasks.sectors();
        self.on_filters_changed();
        self.status_message = "Filters reset".to_string();
    }

    fn on_filters_changed(&mut self) {
        tracing::debug!(filters = ?self.filters, "filters changed");
        self.refresh_metric();
    }

    fn wants_metric(&self) -> bool {
        self.map.level() == MapLevel::Regions && self.filters.has_production_filter()
    }

    fn refresh_metric(&mut self) {
        if self.wants_metric() {
            self.loading.metric = true;
            self.tasks.region_metric(self.filters);
        } else {
            self.loading.metric = false;
            if self.map.metric().is_some() {
                self.map.set_metric(None);
            }
        }
    }

    // Search

    pub fn start_search(&mut self) {
        self.search_active = true;
        self.sidebar_tab = SidebarTab::Filters;
        self.filter_section = FilterSection::Sectors;
    }

    pub fn push_search(&mut self, c: char) {
        self.search_query.push(c);
        self.filter_cursors[FilterSection::Sectors.index()] = 0;
    }

    pub fn pop_search(&mut self) {
        self.search_query.pop();
        self.filter_cursors[FilterSection::Sectors.index()] = 0;
    }

    pub fn cancel_search(&mut self) {
        self.search_active = false;
        self.search_query.clear();
    }

    /// Runs the remote filière search. Queries shorter than two characters
    /// are ignored.
    pub fn submit_search(&mut self) -> bool {
        if self.search_query.trim().chars().count() < MIN_SEARCH_CHARS {
            self.status_message = "Type at least 2 characters to search".to_string();
            return false;
        }
        self.search_active = false;
        self.loading.sectors = true;
        self.tasks.search_sectors(self.search_query.clone());
        true
    }

    // Map selection

    pub fn select_feature(&mut self, id: FeatureId) {
        match self.map.select(id) {
            SelectOutcome::NotFound => {
                tracing::debug!(id, "selection ignored, feature not on map");
                return;
            }
            SelectOutcome::NoGeometry => {
                self.status_message = "Selected zone has no geometry".to_string();
            }
            SelectOutcome::Zoomed => {}
        }
        self.selection = None;
        self.sidebar_tab = SidebarTab::Info;
        self.loading.selection = true;
        self.tasks.selection(self.map.level(), id, self.filters);
    }

    pub fn cycle_feature(&mut self, forward: bool) {
        let ids = self.map.feature_ids();
        if ids.is_empty() {
            return;
        }
        let next = match self.map.selected().and_then(|s| ids.iter().position(|id| *id == s)) {
            Some(index) => step_index(index, ids.len(), forward),
            None if forward => 0,
            None => ids.len() - 1,
        };
        self.select_feature(ids[next]);
    }

    pub fn clear_selection(&mut self) {
        self.map.clear_selection();
        self.selection = None;
        self.loading.selection = false;
    }

    pub fn click_map(&mut self, col: u16, row: u16) {
        if let Some(id) = self.map.surface.click(col, row) {
            self.select_feature(id);
        }
    }

    pub fn hover_map(&mut self, col: u16, row: u16) {
        self.map.surface.hover(col, row);
    }

    pub fn leave_map(&mut self) {
        self.map.surface.clear_hover();
    }

    // Screens

    pub fn show_map(&mut self) {
        self.screen = AppScreen::Map;
    }

    pub fn open_selected_detail(&mut self) {
        match self.map.selected() {
            Some(id) => self.open_detail(DetailTarget {
                level: self.map.level(),
                id,
            }),
            None => self.status_message = "Select a zone first".to_string(),
        }
    }

    pub fn open_detail(&mut self, target: DetailTarget) {
        tracing::info!(level = target.level.as_str(), id = target.id, "opening detail");
        self.screen = AppScreen::Detail;
        self.detail_target = Some(target);
        self.detail = None;
        self.detail_cursor = 0;
        self.detail_panel = DetailPanel::Productions;
        self.detail_map.switch_level(target.level);
        self.loading.detail = true;
        self.tasks.detail(target);
    }

    /// Opens the highlighted child (département or commune) of the current
    /// detail page.
    pub fn open_child_detail(&mut self) {
        let Some(target) = self.detail_target else {
            return;
        };
        let Some(level) = target.child_level() else {
            return;
        };
        let child = self
            .detail
            .as_ref()
            .and_then(|data| data.children.get(self.detail_cursor))
            .map(|child| child.id);
        if let Some(id) = child {
            self.open_detail(DetailTarget { level, id });
        }
    }

    pub fn detail_rows(&self) -> usize {
        let Some(data) = &self.detail else {
            return 0;
        };
        match self.detail_panel {
            DetailPanel::Productions => data.productions.len(),
            DetailPanel::Related => data.children.len().max(data.infrastructures.len()),
        }
    }

    pub fn move_detail_cursor(&mut self, forward: bool) {
        let len = self.detail_rows();
        self.detail_cursor = step_index(self.detail_cursor, len, forward);
    }

    pub fn toggle_detail_panel(&mut self) {
        self.detail_panel = match self.detail_panel {
            DetailPanel::Productions => DetailPanel::Related,
            DetailPanel::Related => DetailPanel::Productions,
        };
        self.detail_cursor = 0;
    }

    pub fn show_stats(&mut self) {
        self.screen = AppScreen::Stats;
        if self.stats.is_none() && !self.loading.stats {
            self.load_stats();
        }
    }

    fn load_stats(&mut self) {
        self.loading.stats = true;
        self.tasks.stats(self.stats_filters);
    }

    pub fn cycle_stats_tab(&mut self, forward: bool) {
        let index = self.stats_tab.index();
        let len = StatsTab::ALL.len();
        let next = step_index(index, len, forward);
        self.stats_tab = StatsTab::ALL[next];
    }

    /// Steps the statistics year filter through "all" and every known year.
    pub fn cycle_stats_year(&mut self, forward: bool) {
        let options: Vec<Option<i32>> = std::iter::once(None)
            .chain(self.years.iter().copied().map(Some))
            .collect();
        self.stats_filters.year = cycle_option(&options, self.stats_filters.year, forward);
        self.load_stats();
    }

    pub fn cycle_stats_product(&mut self, forward: bool) {
        let options: Vec<Option<i64>> = std::iter::once(None)
            .chain(
                self.stats
                    .iter()
                    .flat_map(|stats| stats.products.iter().map(|p| Some(p.id))),
            )
            .collect();
        self.stats_filters.product_id =
            cycle_option(&options, self.stats_filters.product_id, forward);
        self.load_stats();
    }

    pub fn stats_product_name(&self) -> Option<&str> {
        let id = self.stats_filters.product_id?;
        self.stats
            .as_ref()?
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }

    // Refresh

    pub fn reload(&mut self) {
        self.error = None;
        match self.screen {
            AppScreen::Map => {
                self.loading.sectors = true;
                self.tasks.sectors();
                self.tasks.years();
                self.load_geojson();
                self.refresh_metric();
            }
            AppScreen::Detail => {
                if let Some(target) = self.detail_target {
                    self.open_detail(target);
                }
            }
            AppScreen::Stats => self.load_stats(),
        }
        self.status_message = "Reloading...".to_string();
    }

    /// Drops every cached response before reloading.
    pub fn hard_refresh(&mut self) {
        let stats = self.client().cache_stats();
        self.client().clear_cache();
        tracing::info!(entries = stats.entries, "response cache cleared");
        self.reload();
        self.status_message = format!("Cache cleared ({} entries), reloading...", stats.entries);
    }

    // Fetch results

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Sectors(result) => {
                self.loading.sectors = false;
                match result {
                    Ok(sectors) => {
                        self.sectors = sectors;
                        self.clamp_cursor(FilterSection::Sectors);
                    }
                    Err(err) => self.fail("filières", &err),
                }
            }
            AppEvent::SectorSearch { query, result } => {
                if query != self.search_query {
                    tracing::debug!(%query, "stale search result discarded");
                    return;
                }
                self.loading.sectors = false;
                match result {
                    Ok(sectors) => {
                        self.status_message = format!("{} filières match {query:?}", sectors.len());
                        self.sectors = sectors;
                        self.filter_cursors[FilterSection::Sectors.index()] = 0;
                    }
                    Err(err) => self.fail("search", &err),
                }
            }
            AppEvent::Categories { sector_id, result } => {
                if self.filters.sector_id != Some(sector_id) {
                    return;
                }
                match result {
                    Ok(categories) => {
                        self.categories = categories;
                        self.clamp_cursor(FilterSection::Categories);
                    }
                    Err(err) => self.fail("catégories", &err),
                }
            }
            AppEvent::Products {
                sector_id,
                category_id,
                result,
            } => {
                if (self.filters.sector_id, self.filters.category_id) != (sector_id, category_id) {
                    return;
                }
                match result {
                    Ok(products) => {
                        self.products = products;
                        self.clamp_cursor(FilterSection::Products);
                    }
                    Err(err) => self.fail("produits", &err),
                }
            }
            AppEvent::Years(result) => match result {
                Ok(mut years) => {
                    years.sort_unstable_by(|a, b| b.cmp(a));
                    years.dedup();
                    self.years = years;
                    self.clamp_cursor(FilterSection::Year);
                }
                Err(err) => self.fail("years", &err),
            },
            AppEvent::GeoJson { level, result } => self.apply_geojson(level, result),
            AppEvent::RegionMetric { filters, result } => {
                if filters != self.filters || self.map.level() != MapLevel::Regions {
                    tracing::debug!("stale region metric discarded");
                    return;
                }
                self.loading.metric = false;
                match result {
                    Ok(rows) => {
                        let metric = Metric::from_pairs(
                            rows.iter()
                                .filter_map(|row| Some((row.region_id?, row.total_quantity))),
                        );
                        self.map.set_metric(Some(metric));
                    }
                    Err(err) => self.fail("production totals", &err),
                }
            }
            AppEvent::Selection { level, id, result } => {
                if level != self.map.level() || self.map.selected() != Some(id) {
                    tracing::debug!(id, "stale selection discarded");
                    return;
                }
                self.loading.selection = false;
                match result {
                    Ok(info) => self.selection = Some(info),
                    Err(err) => {
                        self.selection = self
                            .map
                            .collection()
                            .and_then(|c| c.find(id))
                            .map(|feature| EntityInfo::from_properties(&feature.properties));
                        self.fail("zone details", &err);
                    }
                }
            }
            AppEvent::Detail { target, result } => {
                if self.detail_target != Some(target) {
                    tracing::debug!(id = target.id, "stale detail discarded");
                    return;
                }
                self.loading.detail = false;
                match result {
                    Ok(mut data) => {
                        let geo = std::mem::take(&mut data.geo);
                        self.detail_map.show_detail(geo, target.id);
                        self.detail = Some(*data);
                        self.start_reveal();
                    }
                    Err(err) => self.fail("detail", &err),
                }
            }
            AppEvent::Stats { filters, result } => {
                if filters != self.stats_filters {
                    return;
                }
                self.loading.stats = false;
                match result {
                    Ok(data) => {
                        self.stats = Some(*data);
                        self.start_reveal();
                    }
                    Err(err) => self.fail("statistics", &err),
                }
            }
        }
    }

    fn apply_geojson(
        &mut self,
        level: MapLevel,
        result: Result<crate::map::FeatureCollection, ApiError>,
    ) {
        if level != self.map.level() {
            tracing::debug!(level = level.as_str(), "stale geojson discarded");
            return;
        }
        self.loading.geo = false;
        match result {
            Ok(collection) => {
                let outcome = self.map.show(collection);
                let zones = self.map.feature_count();
                match outcome {
                    ReconcileOutcome::Rebuilt { .. } => {
                        tracing::info!(zones, level = level.as_str(), "map layer built");
                    }
                    ReconcileOutcome::Incremental { restyled } => {
                        tracing::debug!(restyled, "map layer restyled");
                    }
                }
                self.error = None;
                self.status_message = format!("{zones} zones");
                if self.wants_metric() && self.map.metric().is_none() {
                    self.refresh_metric();
                }
            }
            Err(err) => self.fail(level.label(), &err),
        }
    }

    fn fail(&mut self, context: &str, err: &ApiError) {
        tracing::warn!(context, error = %err, "fetch failed");
        let message = err.user_message();
        self.error = Some(message.to_string());
        self.status_message = format!("Error: {context}: {message}");
    }

    fn start_reveal(&self) {
        if let Ok(mut effect) = self.reveal_fx.lock() {
            *effect = Some(fx::coalesce((REVEAL_MS, Interpolation::QuadOut)));
        }
    }
}

fn cycle_option<T: Copy + PartialEq>(options: &[T], current: T, forward: bool) -> T {
    let index = options.iter().position(|o| *o == current).unwrap_or(0);
    let next = step_index(index, options.len(), forward);
    options.get(next).copied().unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::RegionTotal;
    use crate::config::ApiConfig;
    use crate::map::geojson::tests::{collection, square};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn app() -> (App, UnboundedReceiver<AppEvent>) {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(200),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(&config).unwrap();
        let (tx, rx) = unbounded_channel();
        (App::new(client, MapLevel::Regions, tx), rx)
    }

    fn regions() -> crate::map::FeatureCollection {
        collection(vec![
            square(1, "Adamaoua", 13.5, 7.0, 1.0),
            square(2, "Centre", 11.5, 4.5, 1.0),
            square(3, "Est", 14.5, 4.0, 1.0),
        ])
    }

    fn sector(id: i64, name: &str) -> Sector {
        Sector {
            id,
            name: name.to_string(),
            code: name.to_uppercase(),
            description: None,
            color: None,
            icon: None,
        }
    }

    #[tokio::test]
    async fn geojson_for_another_level_is_discarded() {
        let (mut app, _rx) = app();
        app.apply(AppEvent::GeoJson {
            level: MapLevel::Communes,
            result: Ok(regions()),
        });
        assert_eq!(app.map.feature_count(), 0);

        app.apply(AppEvent::GeoJson {
            level: MapLevel::Regions,
            result: Ok(regions()),
        });
        assert_eq!(app.map.feature_count(), 3);
        assert_eq!(app.status_message, "3 zones");
        assert!(!app.loading.geo);
    }

    #[tokio::test]
    async fn level_change_clears_selection_and_requests_geojson() {
        let (mut app, _rx) = app();
        app.apply(AppEvent::GeoJson {
            level: MapLevel::Regions,
            result: Ok(regions()),
        });
        app.select_feature(2);
        assert_eq!(app.map.selected(), Some(2));
        assert_eq!(app.sidebar_tab, SidebarTab::Info);

        app.set_level(MapLevel::Departements);
        assert_eq!(app.map.level(), MapLevel::Departements);
        assert_eq!(app.map.selected(), None);
        assert!(app.selection.is_none());
        assert!(app.loading.geo);
    }

    #[tokio::test]
    async fn stale_selection_result_is_ignored() {
        let (mut app, _rx) = app();
        app.apply(AppEvent::GeoJson {
            level: MapLevel::Regions,
            result: Ok(regions()),
        });
        app.select_feature(1);
        app.select_feature(3);

        app.apply(AppEvent::Selection {
            level: MapLevel::Regions,
            id: 1,
            result: Ok(EntityInfo {
                title: "Adamaoua".into(),
                ..EntityInfo::default()
            }),
        });
        assert!(app.selection.is_none());
        assert!(app.loading.selection);

        app.apply(AppEvent::Selection {
            level: MapLevel::Regions,
            id: 3,
            result: Ok(EntityInfo {
                title: "Est".into(),
                ..EntityInfo::default()
            }),
        });
        assert_eq!(app.selection.as_ref().map(|s| s.title.as_str()), Some("Est"));
    }

    #[tokio::test]
    async fn failed_selection_falls_back_to_feature_properties() {
        let (mut app, _rx) = app();
        app.apply(AppEvent::GeoJson {
            level: MapLevel::Regions,
            result: Ok(regions()),
        });
        app.select_feature(2);
        app.apply(AppEvent::Selection {
            level: MapLevel::Regions,
            id: 2,
            result: Err(ApiError::InvalidUrl("bad".into())),
        });

        assert_eq!(app.selection.as_ref().map(|s| s.title.as_str()), Some("Centre"));
        assert!(app.error.is_some());
        assert!(app.status_message.starts_with("Error"));
    }

    #[tokio::test]
    async fn cycling_wraps_through_features() {
        let (mut app, _rx) = app();
        app.apply(AppEvent::GeoJson {
            level: MapLevel::Regions,
            result: Ok(regions()),
        });

        app.cycle_feature(true);
        assert_eq!(app.map.selected(), Some(1));
        app.cycle_feature(false);
        assert_eq!(app.map.selected(), Some(3));
        app.cycle_feature(true);
        assert_eq!(app.map.selected(), Some(1));
    }

    #[tokio::test]
    async fn product_filter_at_region_level_requests_metric() {
        let (mut app, _rx) = app();
        app.apply(AppEvent::GeoJson {
            level: MapLevel::Regions,
            result: Ok(regions()),
        });

        app.toggle_product(7);
        assert!(app.loading.metric);

        let filters = app.filters;
        app.apply(AppEvent::RegionMetric {
            filters,
            result: Ok(vec![
                RegionTotal {
                    region_id: Some(1),
                    total_quantity: 100.0,
                    ..RegionTotal::default()
                },
                RegionTotal {
                    region_id: Some(2),
                    total_quantity: 20.0,
                    ..RegionTotal::default()
                },
            ]),
        });
        assert!(!app.loading.metric);
        assert_eq!(app.map.metric().and_then(|m| m.value(1)), Some(100.0));

        app.toggle_product(7);
        assert!(app.map.metric().is_none());
    }

    #[tokio::test]
    async fn metric_for_old_filters_is_discarded() {
        let (mut app, _rx) = app();
        app.apply(AppEvent::GeoJson {
            level: MapLevel::Regions,
            result: Ok(regions()),
        });
        app.set_year(Some(2021));
        let old = app.filters;
        app.set_year(Some(2022));

        app.apply(AppEvent::RegionMetric {
            filters: old,
            result: Ok(vec![RegionTotal {
                region_id: Some(1),
                total_quantity: 5.0,
                ..RegionTotal::default()
            }]),
        });
        assert!(app.map.metric().is_none());
        assert!(app.loading.metric);
    }

    #[tokio::test]
    async fn sector_toggle_resets_cascade() {
        let (mut app, _rx) = app();
        app.toggle_sector(1);
        app.apply(AppEvent::Categories {
            sector_id: 1,
            result: Ok(vec![Category {
                id: 10,
                name: "Céréales".into(),
                code: "CER".into(),
                sector_id: 1,
                description: None,
            }]),
        });
        app.toggle_category(10);
        assert_eq!(app.filters.category_id, Some(10));

        app.toggle_sector(1);
        assert_eq!(app.filters.sector_id, None);
        assert_eq!(app.filters.category_id, None);
        assert!(app.categories.is_empty());

        app.apply(AppEvent::Categories {
            sector_id: 1,
            result: Ok(Vec::new()),
        });
        assert!(app.categories.is_empty());
    }

    #[tokio::test]
    async fn typing_narrows_sectors_locally() {
        let (mut app, _rx) = app();
        app.apply(AppEvent::Sectors(Ok(vec![
            sector(1, "Agriculture"),
            sector(2, "Elevage"),
            sector(3, "Pêche"),
        ])));

        app.start_search();
        for c in "elv".chars() {
            app.push_search(c);
        }
        let names: Vec<&str> = app.visible_sectors().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Elevage"]);

        app.cancel_search();
        assert_eq!(app.visible_sectors().len(), 3);
    }

    #[tokio::test]
    async fn remote_search_needs_two_characters() {
        let (mut app, _rx) = app();
        app.start_search();
        app.push_search('a');
        assert!(!app.submit_search());
        assert!(app.search_active);

        app.push_search('g');
        assert!(app.submit_search());
        assert!(!app.search_active);
        assert!(app.loading.sectors);

        app.apply(AppEvent::SectorSearch {
            query: "x".into(),
            result: Ok(vec![sector(9, "Other")]),
        });
        assert!(app.sectors.is_empty());

        app.apply(AppEvent::SectorSearch {
            query: "ag".into(),
            result: Ok(vec![sector(1, "Agriculture")]),
        });
        assert_eq!(app.sectors.len(), 1);
        assert!(!app.loading.sectors);
    }

    #[tokio::test]
    async fn stale_detail_is_discarded() {
        let (mut app, _rx) = app();
        let first = DetailTarget {
            level: MapLevel::Regions,
            id: 1,
        };
        let second = DetailTarget {
            level: MapLevel::Regions,
            id: 2,
        };
        app.open_detail(first);
        app.open_detail(second);

        app.apply(AppEvent::Detail {
            target: first,
            result: Ok(Box::default()),
        });
        assert!(app.detail.is_none());

        app.apply(AppEvent::Detail {
            target: second,
            result: Ok(Box::new(DetailData {
                geo: regions(),
                ..DetailData::default()
            })),
        });
        assert!(app.detail.is_some());
        assert!(!app.loading.detail);
        assert_eq!(app.detail_map.feature_count(), 3);
    }

    #[tokio::test]
    async fn stats_year_cycles_through_all_and_years() {
        let (mut app, _rx) = app();
        app.apply(AppEvent::Years(Ok(vec![2020, 2022, 2021])));
        assert_eq!(app.years, vec![2022, 2021, 2020]);

        app.cycle_stats_year(true);
        assert_eq!(app.stats_filters.year, Some(2022));
        app.cycle_stats_year(false);
        assert_eq!(app.stats_filters.year, None);
        app.cycle_stats_year(false);
        assert_eq!(app.stats_filters.year, Some(2020));
    }

    #[test]
    fn cycle_option_wraps() {
        let options = [None, Some(1), Some(2)];
        assert_eq!(cycle_option(&options, Some(2), true), None);
        assert_eq!(cycle_option(&options, None, false), Some(2));
        assert_eq!(cycle_option(&options, Some(7), true), Some(1));
    }
}
