//! Background fetches. Each spawns onto the runtime and reports one
//! [`AppEvent`] back to the UI loop.

use std::future::Future;

use tokio::sync::mpsc::UnboundedSender;

use super::events::{
    AppEvent, ChildRow, DetailData, DetailTarget, EntityInfo, StatsData, StatsFilters,
};
use crate::api::{ApiClient, ApiError, PAGE_LIMIT, SEARCH_LIMIT};
use crate::domain::{FilterState, MapLevel};
use crate::map::FeatureId;

pub const TOP_LIMIT: u32 = 10;

/// Handle used by the app to start fetches.
#[derive(Debug, Clone)]
pub struct Tasks {
    client: ApiClient,
    tx: UnboundedSender<AppEvent>,
}

impl Tasks {
    pub const fn new(client: ApiClient, tx: UnboundedSender<AppEvent>) -> Self {
        Self { client, tx }
    }

    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    fn spawn<F>(&self, task: &'static str, fut: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = fut.await;
            if tx.send(event).is_err() {
                tracing::debug!(task, "event channel closed, result dropped");
            }
        });
    }

    pub fn sectors(&self) {
        let client = self.client.clone();
        self.spawn("sectors", async move {
            AppEvent::Sectors(client.sectors(0, PAGE_LIMIT).await.map(|page| page.items))
        });
    }

    pub fn search_sectors(&self, query: String) {
        let client = self.client.clone();
        self.spawn("search_sectors", async move {
            let result = client.search_sectors(query.trim(), SEARCH_LIMIT).await;
            AppEvent::SectorSearch { query, result }
        });
    }

    pub fn categories(&self, sector_id: i64) {
        let client = self.client.clone();
        self.spawn("categories", async move {
            let result = client
                .categories(0, PAGE_LIMIT, Some(sector_id))
                .await
                .map(|page| page.items);
            AppEvent::Categories { sector_id, result }
        });
    }

    pub fn products(&self, sector_id: Option<i64>, category_id: Option<i64>) {
        let client = self.client.clone();
        self.spawn("products", async move {
            let result = client
                .products(0, PAGE_LIMIT, category_id, sector_id)
                .await
                .map(|page| page.items);
            AppEvent::Products {
                sector_id,
                category_id,
                result,
            }
        });
    }

    pub fn years(&self) {
        let client = self.client.clone();
        self.spawn("years", async move {
            AppEvent::Years(client.available_years().await)
        });
    }

    pub fn geojson(&self, level: MapLevel) {
        let client = self.client.clone();
        self.spawn("geojson", async move {
            let result = match level {
                MapLevel::Regions => client.regions_geojson().await,
                MapLevel::Departements => client.departements_geojson(None).await,
                MapLevel::Communes => client.communes_geojson(None).await,
            };
            AppEvent::GeoJson { level, result }
        });
    }

    pub fn region_metric(&self, filters: FilterState) {
        let client = self.client.clone();
        self.spawn("region_metric", async move {
            let result = client
                .totals_by_region(filters.year, filters.product_id)
                .await;
            AppEvent::RegionMetric { filters, result }
        });
    }

    pub fn selection(&self, level: MapLevel, id: FeatureId, filters: FilterState) {
        let client = self.client.clone();
        self.spawn("selection", async move {
            let result = selection_info(&client, level, id, filters).await;
            AppEvent::Selection { level, id, result }
        });
    }

    pub fn detail(&self, target: DetailTarget) {
        let client = self.client.clone();
        self.spawn("detail", async move {
            let result = detail_data(&client, target).await.map(Box::new);
            AppEvent::Detail { target, result }
        });
    }

    pub fn stats(&self, filters: StatsFilters) {
        let client = self.client.clone();
        self.spawn("stats", async move {
            let result = stats_data(&client, filters).await.map(Box::new);
            AppEvent::Stats { filters, result }
        });
    }
}

async fn selection_info(
    client: &ApiClient,
    level: MapLevel,
    id: FeatureId,
    filters: FilterState,
) -> Result<EntityInfo, ApiError> {
    let with_productions = filters.has_production_filter();
    match level {
        MapLevel::Regions => {
            let region = client.region(id).await?;
            let productions = if with_productions {
                Some(
                    client
                        .region_productions(id, filters.year, filters.product_id, PAGE_LIMIT)
                        .await?,
                )
            } else {
                None
            };
            Ok(EntityInfo::from_entity(&region, productions))
        }
        MapLevel::Departements => {
            let departement = client.departement(id).await?;
            let productions = if with_productions {
                Some(
                    client
                        .departement_productions(id, filters.year, filters.product_id, PAGE_LIMIT)
                        .await?,
                )
            } else {
                None
            };
            Ok(EntityInfo::from_entity(&departement, productions))
        }
        MapLevel::Communes => {
            let summary = client.commune_summary(id).await?;
            Ok(EntityInfo::from_value(&summary))
        }
    }
}

async fn detail_data(client: &ApiClient, target: DetailTarget) -> Result<DetailData, ApiError> {
    let id = target.id;
    let products = client.products(0, PAGE_LIMIT, None, None).await?;
    let product_names = products
        .items
        .into_iter()
        .map(|product| (product.id, product.name))
        .collect();

    let mut data = match target.level {
        MapLevel::Regions => {
            let (region, productions, children, geo) = tokio::try_join!(
                client.region(id),
                client.region_productions(id, None, None, PAGE_LIMIT),
                client.region_departements(id),
                client.regions_geojson(),
            )?;
            DetailData {
                entity: EntityInfo::from_entity(&region, None),
                productions,
                children: children.into_iter().map(ChildRow::from).collect(),
                geo,
                ..DetailData::default()
            }
        }
        MapLevel::Departements => {
            let (departement, productions, children, geo) = tokio::try_join!(
                client.departement(id),
                client.departement_productions(id, None, None, PAGE_LIMIT),
                client.departement_communes(id),
                client.departements_geojson(None),
            )?;
            DetailData {
                entity: EntityInfo::from_entity(&departement, None),
                productions,
                children: children.into_iter().map(ChildRow::from).collect(),
                geo,
                ..DetailData::default()
            }
        }
        MapLevel::Communes => {
            let (commune, productions, infrastructures, geo) = tokio::try_join!(
                client.commune(id),
                client.commune_productions(id, None, None, PAGE_LIMIT),
                client.commune_infrastructures(id),
                client.communes_geojson(None),
            )?;
            DetailData {
                entity: EntityInfo::from_entity(&commune, None),
                productions,
                infrastructures,
                geo,
                ..DetailData::default()
            }
        }
    };
    data.product_names = product_names;
    Ok(data)
}

async fn stats_data(client: &ApiClient, filters: StatsFilters) -> Result<StatsData, ApiError> {
    let StatsFilters { year, product_id } = filters;
    let (global, production, by_year, evolution, by_region, by_product) = tokio::try_join!(
        client.global_stats(),
        client.production_stats(year),
        client.totals_by_year(product_id, None, None, None),
        client.evolution(product_id, None, None, None),
        client.totals_by_region(year, product_id),
        client.totals_by_product(year, None),
    )?;
    let (top_regions, top_products, products) = tokio::try_join!(
        client.top_regions(year, product_id, TOP_LIMIT),
        client.top_products(year, None, TOP_LIMIT),
        client.products(0, PAGE_LIMIT, None, None),
    )?;

    Ok(StatsData {
        global,
        production,
        by_year,
        evolution,
        by_region,
        by_product,
        top_regions,
        top_products,
        products: products.items,
    })
}
