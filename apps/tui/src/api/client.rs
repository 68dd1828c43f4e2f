use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::cache::{CachePolicy, CacheStats, ResponseCache};
use super::endpoints::{self, Endpoint};
use super::error::ApiError;
use super::models::{
    Category, Commune, Departement, GlobalStats, Infrastructure, Page, Product, ProductTotal,
    Production, ProductionQuery, ProductionStats, Region, RegionTotal, Sector, YearTotal,
};
use crate::config::ApiConfig;
use crate::map::geojson::FeatureCollection;

/// Default page size for reference lists.
pub const PAGE_LIMIT: u32 = 100;
/// Default result count for searches.
pub const SEARCH_LIMIT: u32 = 10;

struct Inner {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<ResponseCache<Value>>,
}

/// REST client for the statistics API with a shared response cache.
///
/// Cloning is cheap; every clone shares the same connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("cache", &self.inner.cache.stats())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|_| ApiError::InvalidUrl(base_url.clone()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                cache: Arc::new(ResponseCache::new(CachePolicy::from(config))),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn cache(&self) -> &Arc<ResponseCache<Value>> {
        &self.inner.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        tracing::info!("response cache cleared");
    }

    /// Starts the periodic expiry sweep for this client's cache.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        ResponseCache::spawn_sweeper(&self.inner.cache, interval)
    }

    /// Performs a GET for `endpoint`, going through the cache when the
    /// endpoint is cacheable.
    pub async fn fetch<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, ApiError> {
        let url = endpoint.url(&self.inner.base_url)?;
        let key = url.as_str().to_string();

        if endpoint.cache().is_some() {
            if let Some(cached) = self.inner.cache.get(&key) {
                match T::deserialize(&cached) {
                    Ok(data) => {
                        tracing::debug!(url = %key, "cache hit");
                        return Ok(data);
                    }
                    Err(err) => {
                        tracing::warn!(url = %key, error = %err, "cached value has unexpected shape, refetching");
                    }
                }
            }
        }

        let value = self.get_json(url).await.inspect_err(|err| {
            tracing::error!(url = %key, error = %err, "API request failed");
        })?;

        let data = T::deserialize(&value).map_err(|source| {
            let err = ApiError::Decode {
                url: key.clone(),
                source,
            };
            tracing::error!(url = %key, error = %err, "API response did not match the expected type");
            err
        })?;

        if let Some(category) = endpoint.cache() {
            self.inner.cache.set(key, value, category);
        }

        Ok(data)
    }

    async fn get_json(&self, url: Url) -> Result<Value, ApiError> {
        tracing::debug!(url = %url, "GET");

        let response = self
            .inner
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| ApiError::from_transport(url.as_str(), err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::from_transport(url.as_str(), err))?;

        serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    // Regions

    pub async fn regions(&self, skip: u32, limit: u32) -> Result<Page<Region>, ApiError> {
        self.fetch(&endpoints::regions(skip, limit)).await
    }

    pub async fn search_regions(&self, q: &str, limit: u32) -> Result<Vec<Region>, ApiError> {
        self.fetch(&endpoints::search_regions(q, limit)).await
    }

    pub async fn region(&self, id: i64) -> Result<Region, ApiError> {
        self.fetch(&endpoints::region(id)).await
    }

    pub async fn region_departements(&self, id: i64) -> Result<Vec<Departement>, ApiError> {
        self.fetch(&endpoints::region_departements(id)).await
    }

    pub async fn region_productions(
        &self,
        id: i64,
        year: Option<i32>,
        product_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<Production>, ApiError> {
        self.fetch(&endpoints::region_productions(id, year, product_id, limit))
            .await
    }

    // Départements

    pub async fn departements(
        &self,
        skip: u32,
        limit: u32,
        region_id: Option<i64>,
    ) -> Result<Page<Departement>, ApiError> {
        self.fetch(&endpoints::departements(skip, limit, region_id))
            .await
    }

    pub async fn search_departements(
        &self,
        q: &str,
        limit: u32,
    ) -> Result<Vec<Departement>, ApiError> {
        self.fetch(&endpoints::search_departements(q, limit)).await
    }

    pub async fn departement(&self, id: i64) -> Result<Departement, ApiError> {
        self.fetch(&endpoints::departement(id)).await
    }

    pub async fn departement_communes(&self, id: i64) -> Result<Vec<Commune>, ApiError> {
        self.fetch(&endpoints::departement_communes(id)).await
    }

    pub async fn departement_productions(
        &self,
        id: i64,
        year: Option<i32>,
        product_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<Production>, ApiError> {
        self.fetch(&endpoints::departement_productions(
            id, year, product_id, limit,
        ))
        .await
    }

    // Communes

    pub async fn communes(
        &self,
        skip: u32,
        limit: u32,
        departement_id: Option<i64>,
        kind: Option<&str>,
    ) -> Result<Page<Commune>, ApiError> {
        self.fetch(&endpoints::communes(skip, limit, departement_id, kind))
            .await
    }

    pub async fn search_communes(
        &self,
        q: &str,
        limit: u32,
        departement_id: Option<i64>,
    ) -> Result<Vec<Commune>, ApiError> {
        self.fetch(&endpoints::search_communes(q, limit, departement_id))
            .await
    }

    pub async fn commune(&self, id: i64) -> Result<Commune, ApiError> {
        self.fetch(&endpoints::commune(id)).await
    }

    pub async fn commune_infrastructures(&self, id: i64) -> Result<Vec<Infrastructure>, ApiError> {
        self.fetch(&endpoints::commune_infrastructures(id)).await
    }

    pub async fn commune_productions(
        &self,
        id: i64,
        year: Option<i32>,
        product_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<Production>, ApiError> {
        self.fetch(&endpoints::commune_productions(id, year, product_id, limit))
            .await
    }

    /// Free-form summary of a commune (entity plus aggregates).
    pub async fn commune_summary(&self, id: i64) -> Result<Value, ApiError> {
        self.fetch(&endpoints::commune_summary(id)).await
    }

    // Filières

    pub async fn sectors(&self, skip: u32, limit: u32) -> Result<Page<Sector>, ApiError> {
        self.fetch(&endpoints::sectors(skip, limit)).await
    }

    pub async fn search_sectors(&self, q: &str, limit: u32) -> Result<Vec<Sector>, ApiError> {
        self.fetch(&endpoints::search_sectors(q, limit)).await
    }

    pub async fn sector(&self, id: i64) -> Result<Sector, ApiError> {
        self.fetch(&endpoints::sector(id)).await
    }

    pub async fn sector_categories(&self, id: i64) -> Result<Vec<Category>, ApiError> {
        self.fetch(&endpoints::sector_categories(id)).await
    }

    pub async fn sector_products(&self, id: i64) -> Result<Vec<Product>, ApiError> {
        self.fetch(&endpoints::sector_products(id)).await
    }

    // Catégories

    pub async fn categories(
        &self,
        skip: u32,
        limit: u32,
        sector_id: Option<i64>,
    ) -> Result<Page<Category>, ApiError> {
        self.fetch(&endpoints::categories(skip, limit, sector_id))
            .await
    }

    pub async fn category(&self, id: i64) -> Result<Category, ApiError> {
        self.fetch(&endpoints::category(id)).await
    }

    pub async fn category_products(&self, id: i64) -> Result<Vec<Product>, ApiError> {
        self.fetch(&endpoints::category_products(id)).await
    }

    // Produits

    pub async fn products(
        &self,
        skip: u32,
        limit: u32,
        category_id: Option<i64>,
        sector_id: Option<i64>,
    ) -> Result<Page<Product>, ApiError> {
        self.fetch(&endpoints::products(skip, limit, category_id, sector_id))
            .await
    }

    pub async fn search_products(
        &self,
        q: &str,
        limit: u32,
        category_id: Option<i64>,
        sector_id: Option<i64>,
    ) -> Result<Vec<Product>, ApiError> {
        self.fetch(&endpoints::search_products(q, limit, category_id, sector_id))
            .await
    }

    pub async fn product(&self, id: i64) -> Result<Product, ApiError> {
        self.fetch(&endpoints::product(id)).await
    }

    pub async fn product_summary(&self, id: i64, year: Option<i32>) -> Result<Value, ApiError> {
        self.fetch(&endpoints::product_summary(id, year)).await
    }

    // Productions

    pub async fn productions(&self, query: &ProductionQuery) -> Result<Page<Production>, ApiError> {
        self.fetch(&endpoints::productions(query)).await
    }

    pub async fn available_years(&self) -> Result<Vec<i32>, ApiError> {
        self.fetch(&endpoints::available_years()).await
    }

    pub async fn available_seasons(&self) -> Result<Vec<String>, ApiError> {
        self.fetch(&endpoints::available_seasons()).await
    }

    pub async fn totals_by_year(
        &self,
        product_id: Option<i64>,
        region_id: Option<i64>,
        year_from: Option<i32>,
        year_to: Option<i32>,
    ) -> Result<Vec<YearTotal>, ApiError> {
        self.fetch(&endpoints::totals_by_year(
            product_id, region_id, year_from, year_to,
        ))
        .await
    }

    pub async fn totals_by_region(
        &self,
        year: Option<i32>,
        product_id: Option<i64>,
    ) -> Result<Vec<RegionTotal>, ApiError> {
        self.fetch(&endpoints::totals_by_region(year, product_id))
            .await
    }

    pub async fn totals_by_product(
        &self,
        year: Option<i32>,
        region_id: Option<i64>,
    ) -> Result<Vec<ProductTotal>, ApiError> {
        self.fetch(&endpoints::totals_by_product(year, region_id))
            .await
    }

    // Statistics

    pub async fn global_stats(&self) -> Result<GlobalStats, ApiError> {
        self.fetch(&endpoints::global_stats()).await
    }

    pub async fn production_stats(&self, year: Option<i32>) -> Result<ProductionStats, ApiError> {
        self.fetch(&endpoints::production_stats(year)).await
    }

    pub async fn evolution(
        &self,
        product_id: Option<i64>,
        region_id: Option<i64>,
        year_from: Option<i32>,
        year_to: Option<i32>,
    ) -> Result<Vec<YearTotal>, ApiError> {
        self.fetch(&endpoints::evolution(
            product_id, region_id, year_from, year_to,
        ))
        .await
    }

    pub async fn top_regions(
        &self,
        year: Option<i32>,
        product_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<RegionTotal>, ApiError> {
        self.fetch(&endpoints::top_regions(year, product_id, limit))
            .await
    }

    pub async fn top_products(
        &self,
        year: Option<i32>,
        region_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<ProductTotal>, ApiError> {
        self.fetch(&endpoints::top_products(year, region_id, limit))
            .await
    }

    // GeoJSON

    pub async fn regions_geojson(&self) -> Result<FeatureCollection, ApiError> {
        self.fetch(&endpoints::regions_geojson()).await
    }

    pub async fn departements_geojson(
        &self,
        region_id: Option<i64>,
    ) -> Result<FeatureCollection, ApiError> {
        self.fetch(&endpoints::departements_geojson(region_id)).await
    }

    pub async fn communes_geojson(
        &self,
        departement_id: Option<i64>,
    ) -> Result<FeatureCollection, ApiError> {
        self.fetch(&endpoints::communes_geojson(departement_id))
            .await
    }

    pub async fn infrastructures_geojson(
        &self,
        kind: Option<&str>,
        commune_id: Option<i64>,
    ) -> Result<FeatureCollection, ApiError> {
        self.fetch(&endpoints::infrastructures_geojson(kind, commune_id))
            .await
    }
}
