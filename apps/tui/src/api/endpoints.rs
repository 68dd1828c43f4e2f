//! Request descriptions for every API route, with their cache category.
//!
//! Reference lists and single entities are cached as [`CacheCategory::Reference`],
//! all GeoJSON as [`CacheCategory::Geographic`]. Searches, production queries
//! and most aggregates are always fetched live.

use reqwest::Url;

use super::cache::CacheCategory;
use super::error::ApiError;
use super::models::ProductionQuery;

/// One GET request: path, query pairs and cache policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    path: String,
    query: Vec<(&'static str, String)>,
    cache: Option<CacheCategory>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            cache: None,
        }
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn query_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub const fn cached(mut self, category: CacheCategory) -> Self {
        self.cache = Some(category);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub const fn cache(&self) -> Option<CacheCategory> {
        self.cache
    }

    /// Absolute URL against `base`. Doubles as the cache key.
    pub fn url(&self, base: &str) -> Result<Url, ApiError> {
        let raw = format!("{base}{}", self.path);
        let mut url = Url::parse(&raw).map_err(|_| ApiError::InvalidUrl(raw))?;
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

fn page(path: &str, skip: u32, limit: u32) -> Endpoint {
    Endpoint::new(path)
        .query("skip", skip)
        .query("limit", limit)
        .cached(CacheCategory::Reference)
}

fn search(path: &str, q: &str, limit: u32) -> Endpoint {
    Endpoint::new(path).query("q", q).query("limit", limit)
}

fn entity(path: String) -> Endpoint {
    Endpoint::new(path).cached(CacheCategory::Reference)
}

fn productions_of(
    path: String,
    year: Option<i32>,
    product_id: Option<i64>,
    limit: u32,
) -> Endpoint {
    Endpoint::new(path)
        .query("limit", limit)
        .query_opt("annee", year)
        .query_opt("produit_id", product_id)
}

fn year_range(
    path: &str,
    product_id: Option<i64>,
    region_id: Option<i64>,
    year_from: Option<i32>,
    year_to: Option<i32>,
) -> Endpoint {
    Endpoint::new(path)
        .query_opt("produit_id", product_id)
        .query_opt("region_id", region_id)
        .query_opt("annee_debut", year_from)
        .query_opt("annee_fin", year_to)
}

// Regions

pub fn regions(skip: u32, limit: u32) -> Endpoint {
    page("/api/v1/regions/", skip, limit)
}

pub fn search_regions(q: &str, limit: u32) -> Endpoint {
    search("/api/v1/regions/search", q, limit)
}

pub fn region(id: i64) -> Endpoint {
    entity(format!("/api/v1/regions/{id}"))
}

pub fn region_departements(id: i64) -> Endpoint {
    entity(format!("/api/v1/regions/{id}/departements"))
}

pub fn region_productions(
    id: i64,
    year: Option<i32>,
    product_id: Option<i64>,
    limit: u32,
) -> Endpoint {
    productions_of(
        format!("/api/v1/regions/{id}/productions"),
        year,
        product_id,
        limit,
    )
}

// Départements

pub fn departements(skip: u32, limit: u32, region_id: Option<i64>) -> Endpoint {
    page("/api/v1/departements/", skip, limit).query_opt("region_id", region_id)
}

pub fn search_departements(q: &str, limit: u32) -> Endpoint {
    search("/api/v1/departements/search", q, limit)
}

pub fn departement(id: i64) -> Endpoint {
    entity(format!("/api/v1/departements/{id}"))
}

pub fn departement_communes(id: i64) -> Endpoint {
    entity(format!("/api/v1/departements/{id}/communes"))
}

pub fn departement_productions(
    id: i64,
    year: Option<i32>,
    product_id: Option<i64>,
    limit: u32,
) -> Endpoint {
    productions_of(
        format!("/api/v1/departements/{id}/productions"),
        year,
        product_id,
        limit,
    )
}

// Communes

pub fn communes(
    skip: u32,
    limit: u32,
    departement_id: Option<i64>,
    kind: Option<&str>,
) -> Endpoint {
    page("/api/v1/communes/", skip, limit)
        .query_opt("departement_id", departement_id)
        .query_opt("type_commune", kind)
}

pub fn search_communes(q: &str, limit: u32, departement_id: Option<i64>) -> Endpoint {
    search("/api/v1/communes/search", q, limit).query_opt("departement_id", departement_id)
}

pub fn commune(id: i64) -> Endpoint {
    entity(format!("/api/v1/communes/{id}"))
}

pub fn commune_infrastructures(id: i64) -> Endpoint {
    entity(format!("/api/v1/communes/{id}/infrastructures"))
}

pub fn commune_productions(
    id: i64,
    year: Option<i32>,
    product_id: Option<i64>,
    limit: u32,
) -> Endpoint {
    productions_of(
        format!("/api/v1/communes/{id}/productions"),
        year,
        product_id,
        limit,
    )
}

pub fn commune_summary(id: i64) -> Endpoint {
    entity(format!("/api/v1/communes/{id}/resume"))
}

// Filières

pub fn sectors(skip: u32, limit: u32) -> Endpoint {
    page("/api/v1/filieres/", skip, limit)
}

pub fn search_sectors(q: &str, limit: u32) -> Endpoint {
    search("/api/v1/filieres/search", q, limit)
}

pub fn sector(id: i64) -> Endpoint {
    entity(format!("/api/v1/filieres/{id}"))
}

pub fn sector_categories(id: i64) -> Endpoint {
    entity(format!("/api/v1/filieres/{id}/categories"))
}

pub fn sector_products(id: i64) -> Endpoint {
    entity(format!("/api/v1/filieres/{id}/produits"))
}

// Catégories

pub fn categories(skip: u32, limit: u32, sector_id: Option<i64>) -> Endpoint {
    page("/api/v1/categories/", skip, limit).query_opt("filiere_id", sector_id)
}

pub fn category(id: i64) -> Endpoint {
    entity(format!("/api/v1/categories/{id}"))
}

pub fn category_products(id: i64) -> Endpoint {
    entity(format!("/api/v1/categories/{id}/produits"))
}

// Produits

pub fn products(
    skip: u32,
    limit: u32,
    category_id: Option<i64>,
    sector_id: Option<i64>,
) -> Endpoint {
    page("/api/v1/produits/", skip, limit)
        .query_opt("categorie_id", category_id)
        .query_opt("filiere_id", sector_id)
}

pub fn search_products(
    q: &str,
    limit: u32,
    category_id: Option<i64>,
    sector_id: Option<i64>,
) -> Endpoint {
    search("/api/v1/produits/search", q, limit)
        .query_opt("categorie_id", category_id)
        .query_opt("filiere_id", sector_id)
}

pub fn product(id: i64) -> Endpoint {
    entity(format!("/api/v1/produits/{id}"))
}

pub fn product_summary(id: i64, year: Option<i32>) -> Endpoint {
    Endpoint::new(format!("/api/v1/produits/{id}/resume")).query_opt("annee", year)
}

// Productions

pub fn productions(query: &ProductionQuery) -> Endpoint {
    query
        .pairs()
        .into_iter()
        .fold(Endpoint::new("/api/v1/productions/"), |endpoint, (k, v)| {
            endpoint.query(k, v)
        })
}

pub fn available_years() -> Endpoint {
    entity("/api/v1/productions/annees".to_string())
}

pub fn available_seasons() -> Endpoint {
    entity("/api/v1/productions/saisons".to_string())
}

pub fn totals_by_year(
    product_id: Option<i64>,
    region_id: Option<i64>,
    year_from: Option<i32>,
    year_to: Option<i32>,
) -> Endpoint {
    year_range(
        "/api/v1/productions/par-annee",
        product_id,
        region_id,
        year_from,
        year_to,
    )
}

pub fn totals_by_region(year: Option<i32>, product_id: Option<i64>) -> Endpoint {
    Endpoint::new("/api/v1/productions/par-region")
        .query_opt("annee", year)
        .query_opt("produit_id", product_id)
}

pub fn totals_by_product(year: Option<i32>, region_id: Option<i64>) -> Endpoint {
    Endpoint::new("/api/v1/productions/par-produit")
        .query_opt("annee", year)
        .query_opt("region_id", region_id)
}

// Statistics

pub fn global_stats() -> Endpoint {
    entity("/api/v1/statistiques/globales".to_string())
}

pub fn production_stats(year: Option<i32>) -> Endpoint {
    Endpoint::new("/api/v1/statistiques/production").query_opt("annee", year)
}

pub fn evolution(
    product_id: Option<i64>,
    region_id: Option<i64>,
    year_from: Option<i32>,
    year_to: Option<i32>,
) -> Endpoint {
    year_range(
        "/api/v1/statistiques/evolution",
        product_id,
        region_id,
        year_from,
        year_to,
    )
}

pub fn top_regions(year: Option<i32>, product_id: Option<i64>, limit: u32) -> Endpoint {
    Endpoint::new("/api/v1/statistiques/top-regions")
        .query("limit", limit)
        .query_opt("annee", year)
        .query_opt("produit_id", product_id)
}

pub fn top_products(year: Option<i32>, region_id: Option<i64>, limit: u32) -> Endpoint {
    Endpoint::new("/api/v1/statistiques/top-produits")
        .query("limit", limit)
        .query_opt("annee", year)
        .query_opt("region_id", region_id)
}

// GeoJSON

pub fn regions_geojson() -> Endpoint {
    Endpoint::new("/api/v1/geojson/regions").cached(CacheCategory::Geographic)
}

pub fn departements_geojson(region_id: Option<i64>) -> Endpoint {
    Endpoint::new("/api/v1/geojson/departements")
        .query_opt("region_id", region_id)
        .cached(CacheCategory::Geographic)
}

pub fn communes_geojson(departement_id: Option<i64>) -> Endpoint {
    Endpoint::new("/api/v1/geojson/communes")
        .query_opt("departement_id", departement_id)
        .cached(CacheCategory::Geographic)
}

pub fn infrastructures_geojson(kind: Option<&str>, commune_id: Option<i64>) -> Endpoint {
    Endpoint::new("/api/v1/geojson/infrastructures")
        .query_opt("type_infrastructure", kind)
        .query_opt("commune_id", commune_id)
        .cached(CacheCategory::Geographic)
}
