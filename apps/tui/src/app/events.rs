//! Results of background fetches, delivered to the UI loop over a channel.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::models::{
    Category, Commune, Departement, GlobalStats, Infrastructure, Product, ProductTotal,
    Production, ProductionStats, RegionTotal, Sector, YearTotal,
};
use crate::api::ApiError;
use crate::domain::{FilterState, MapLevel};
use crate::map::{FeatureCollection, FeatureId};

const HIDDEN_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Key/value view of whatever entity is selected on the map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityInfo {
    pub title: String,
    pub fields: Vec<(String, String)>,
    pub productions: Option<Vec<Production>>,
}

impl EntityInfo {
    pub fn from_entity<T: Serialize>(entity: &T, productions: Option<Vec<Production>>) -> Self {
        let value = serde_json::to_value(entity).unwrap_or(Value::Null);
        Self {
            productions,
            ..Self::from_value(&value)
        }
    }

    /// Flattens a JSON object, dropping ids, timestamps and empty values.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::from_properties(map),
            _ => Self {
                title: "Information".to_string(),
                ..Self::default()
            },
        }
    }

    pub fn from_properties(map: &Map<String, Value>) -> Self {
        let title = map
            .get("nom")
            .and_then(Value::as_str)
            .unwrap_or("Information")
            .to_string();

        let fields = map
            .iter()
            .filter(|(key, _)| !HIDDEN_FIELDS.contains(&key.as_str()))
            .filter_map(|(key, value)| Some((key.replace('_', " "), display_value(value)?)))
            .collect();

        Self {
            title,
            fields,
            productions: None,
        }
    }
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(display_value)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(map) => Some(format!("{} fields", map.len())),
        other => Some(other.to_string()),
    }
}

/// Entity whose detail page is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DetailTarget {
    pub level: MapLevel,
    pub id: FeatureId,
}

impl DetailTarget {
    /// Level of the entities listed as children on the detail page.
    pub const fn child_level(self) -> Option<MapLevel> {
        match self.level {
            MapLevel::Regions => Some(MapLevel::Departements),
            MapLevel::Departements => Some(MapLevel::Communes),
            MapLevel::Communes => None,
        }
    }
}

/// Département or commune listed under its parent.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRow {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub population: Option<u64>,
}

impl From<Departement> for ChildRow {
    fn from(d: Departement) -> Self {
        Self {
            id: d.id,
            name: d.name,
            code: d.code,
            population: d.population,
        }
    }
}

impl From<Commune> for ChildRow {
    fn from(c: Commune) -> Self {
        Self {
            id: c.id,
            name: c.name,
            code: c.code,
            population: c.population,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DetailData {
    pub entity: EntityInfo,
    pub productions: Vec<Production>,
    pub children: Vec<ChildRow>,
    pub infrastructures: Vec<Infrastructure>,
    pub product_names: HashMap<i64, String>,
    pub geo: FeatureCollection,
}

impl DetailData {
    pub fn total_quantity(&self) -> f64 {
        self.productions.iter().filter_map(|p| p.quantity).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.productions.iter().filter_map(|p| p.value_fcfa).sum()
    }

    pub fn total_producers(&self) -> u64 {
        self.productions.iter().filter_map(|p| p.producers).sum()
    }

    pub fn total_area(&self) -> f64 {
        self.productions.iter().filter_map(|p| p.area_ha).sum()
    }

    pub fn product_name(&self, id: i64) -> String {
        self.product_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{id}"))
    }
}

/// Year and product filters of the statistics screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsFilters {
    pub year: Option<i32>,
    pub product_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct StatsData {
    pub global: GlobalStats,
    pub production: ProductionStats,
    pub by_year: Vec<YearTotal>,
    pub evolution: Vec<YearTotal>,
    pub by_region: Vec<RegionTotal>,
    pub by_product: Vec<ProductTotal>,
    pub top_regions: Vec<RegionTotal>,
    pub top_products: Vec<ProductTotal>,
    pub products: Vec<Product>,
}

#[derive(Debug)]
pub enum AppEvent {
    Sectors(Result<Vec<Sector>, ApiError>),
    SectorSearch {
        query: String,
        result: Result<Vec<Sector>, ApiError>,
    },
    Categories {
        sector_id: i64,
        result: Result<Vec<Category>, ApiError>,
    },
    Products {
        sector_id: Option<i64>,
        category_id: Option<i64>,
        result: Result<Vec<Product>, ApiError>,
    },
    Years(Result<Vec<i32>, ApiError>),
    GeoJson {
        level: MapLevel,
        result: Result<FeatureCollection, ApiError>,
    },
    RegionMetric {
        filters: FilterState,
        result: Result<Vec<RegionTotal>, ApiError>,
    },
    Selection {
        level: MapLevel,
        id: FeatureId,
        result: Result<EntityInfo, ApiError>,
    },
    Detail {
        target: DetailTarget,
        result: Result<Box<DetailData>, ApiError>,
    },
    Stats {
        filters: StatsFilters,
        result: Result<Box<StatsData>, ApiError>,
    },
}
