//! Wire types returned by the statistics API.
//!
//! Field names on the wire are French; the Rust side uses English names and
//! renames at the serde boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Paginated list envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub items: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            total: 0,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "code_region")]
    pub code: String,
    #[serde(rename = "chef_lieu", default)]
    pub capital: Option<String>,
    #[serde(rename = "superficie_km2", default)]
    pub area_km2: Option<f64>,
    #[serde(default)]
    pub population: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Departement {
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "code_departement")]
    pub code: String,
    #[serde(rename = "chef_lieu", default)]
    pub capital: Option<String>,
    #[serde(rename = "superficie_km2", default)]
    pub area_km2: Option<f64>,
    #[serde(default)]
    pub population: Option<u64>,
    pub region_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commune {
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "code_commune")]
    pub code: String,
    pub departement_id: i64,
    #[serde(rename = "type_commune", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(rename = "superficie_km2", default)]
    pub area_km2: Option<f64>,
}

/// Agricultural sector (filière).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "couleur", default)]
    pub color: Option<String>,
    #[serde(rename = "icone", default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    pub code: String,
    #[serde(rename = "filiere_id")]
    pub sector_id: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    pub code: String,
    #[serde(rename = "categorie_id")]
    pub category_id: i64,
    #[serde(rename = "nom_scientifique", default)]
    pub scientific_name: Option<String>,
    #[serde(rename = "unite_mesure", default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "couleur", default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub id: i64,
    #[serde(rename = "produit_id")]
    pub product_id: i64,
    #[serde(rename = "annee")]
    pub year: i32,
    #[serde(default)]
    pub region_id: Option<i64>,
    #[serde(default)]
    pub departement_id: Option<i64>,
    #[serde(default)]
    pub commune_id: Option<i64>,
    #[serde(rename = "saison", default)]
    pub season: Option<String>,
    #[serde(rename = "quantite", default)]
    pub quantity: Option<f64>,
    #[serde(rename = "valeur_fcfa", default)]
    pub value_fcfa: Option<f64>,
    #[serde(rename = "superficie_ha", default)]
    pub area_ha: Option<f64>,
    #[serde(rename = "rendement", default)]
    pub yield_per_ha: Option<f64>,
    #[serde(rename = "nombre_producteurs", default)]
    pub producers: Option<u64>,
    #[serde(rename = "source_donnees", default)]
    pub source: Option<String>,
    #[serde(rename = "fiabilite", default)]
    pub reliability: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Infrastructure {
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "type_infrastructure", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub commune_id: Option<i64>,
    #[serde(rename = "capacite", default)]
    pub capacity: Option<String>,
    #[serde(rename = "adresse", default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_regions: u64,
    pub total_departements: u64,
    pub total_communes: u64,
    #[serde(rename = "total_filieres")]
    pub total_sectors: u64,
    #[serde(rename = "total_produits")]
    pub total_products: u64,
    pub total_productions: u64,
}

/// Free-form production statistics keyed by indicator name.
pub type ProductionStats = Map<String, Value>;

/// Totals for one year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearTotal {
    #[serde(rename = "annee")]
    pub year: i32,
    #[serde(rename = "total_quantite", default)]
    pub total_quantity: f64,
    #[serde(rename = "total_valeur_fcfa", default)]
    pub total_value_fcfa: Option<f64>,
}

/// Totals for one region, used by the per-region and top-region endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionTotal {
    #[serde(default)]
    pub region_id: Option<i64>,
    #[serde(rename = "nom", default)]
    pub name: Option<String>,
    #[serde(rename = "total_quantite", default)]
    pub total_quantity: f64,
    #[serde(rename = "total_valeur_fcfa", default)]
    pub total_value_fcfa: Option<f64>,
}

impl RegionTotal {
    pub fn label(&self) -> String {
        match (&self.name, self.region_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("Region {id}"),
            (None, None) => "Unknown region".to_string(),
        }
    }
}

/// Totals for one product, used by the per-product and top-product endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductTotal {
    #[serde(rename = "produit_id", default)]
    pub product_id: Option<i64>,
    #[serde(rename = "nom", default)]
    pub name: Option<String>,
    #[serde(rename = "total_quantite", default)]
    pub total_quantity: f64,
    #[serde(rename = "total_valeur_fcfa", default)]
    pub total_value_fcfa: Option<f64>,
}

impl ProductTotal {
    pub fn label(&self) -> String {
        match (&self.name, self.product_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("Product {id}"),
            (None, None) => "Unknown product".to_string(),
        }
    }
}

/// Filters accepted by the production list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub year: Option<i32>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub product_id: Option<i64>,
    pub category_id: Option<i64>,
    pub sector_id: Option<i64>,
    pub region_id: Option<i64>,
    pub departement_id: Option<i64>,
    pub commune_id: Option<i64>,
    pub season: Option<String>,
}

impl ProductionQuery {
    /// Query pairs in wire order, skipping unset filters.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push(&mut pairs, "skip", self.skip);
        push(&mut pairs, "limit", self.limit);
        push(&mut pairs, "annee", self.year);
        push(&mut pairs, "annee_debut", self.year_from);
        push(&mut pairs, "annee_fin", self.year_to);
        push(&mut pairs, "produit_id", self.product_id);
        push(&mut pairs, "categorie_id", self.category_id);
        push(&mut pairs, "filiere_id", self.sector_id);
        push(&mut pairs, "region_id", self.region_id);
        push(&mut pairs, "departement_id", self.departement_id);
        push(&mut pairs, "commune_id", self.commune_id);
        push(&mut pairs, "saison", self.season.as_ref());
        pairs
    }
}

fn push<V: ToString>(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<V>) {
    if let Some(value) = value {
        pairs.push((key, value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn region_decodes_french_fields_and_nulls() {
        let region: Region = serde_json::from_value(json!({
            "id": 3,
            "nom": "Centre",
            "code_region": "CE",
            "chef_lieu": "Yaoundé",
            "superficie_km2": null,
            "population": 4_100_000,
            "created_at": "2024-01-01T00:00:00",
            "updated_at": null
        }))
        .unwrap();

        assert_eq!(region.name, "Centre");
        assert_eq!(region.capital.as_deref(), Some("Yaoundé"));
        assert_eq!(region.area_km2, None);
        assert_eq!(region.population, Some(4_100_000));
    }

    #[test]
    fn page_of_sectors_decodes() {
        let page: Page<Sector> = serde_json::from_value(json!({
            "total": 1,
            "items": [{"id": 1, "nom": "Agriculture", "code": "AGR", "couleur": "#22c55e"}]
        }))
        .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].color.as_deref(), Some("#22c55e"));
        assert_eq!(page.items[0].icon, None);
    }

    #[test]
    fn aggregate_rows_tolerate_missing_fields() {
        let rows: Vec<RegionTotal> =
            serde_json::from_value(json!([{"region_id": 7, "total_quantite": 12.5}])).unwrap();
        assert_eq!(rows[0].label(), "Region 7");
        assert_eq!(rows[0].total_value_fcfa, None);

        let product: ProductTotal =
            serde_json::from_value(json!({"nom": "Cacao", "total_quantite": 3})).unwrap();
        assert_eq!(product.label(), "Cacao");
    }

    #[test]
    fn production_query_skips_unset_filters() {
        let query = ProductionQuery {
            limit: Some(50),
            year: Some(2022),
            region_id: Some(4),
            season: Some("seche".to_string()),
            ..ProductionQuery::default()
        };

        assert_eq!(
            query.pairs(),
            vec![
                ("limit", "50".to_string()),
                ("annee", "2022".to_string()),
                ("region_id", "4".to_string()),
                ("saison", "seche".to_string()),
            ]
        );
    }
}
