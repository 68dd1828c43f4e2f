use serde::{Deserialize, Serialize};

/// Administrative level shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapLevel {
    #[default]
    Regions,
    Departements,
    Communes,
}

impl MapLevel {
    pub const ALL: [Self; 3] = [Self::Regions, Self::Departements, Self::Communes];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regions => "regions",
            Self::Departements => "departements",
            Self::Communes => "communes",
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Regions),
            1 => Some(Self::Departements),
            2 => Some(Self::Communes),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Regions => 0,
            Self::Departements => 1,
            Self::Communes => 2,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "regions" | "region" => Some(Self::Regions),
            "departements" | "departement" | "departments" => Some(Self::Departements),
            "communes" | "commune" => Some(Self::Communes),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Regions => "Regions",
            Self::Departements => "Départements",
            Self::Communes => "Communes",
        }
    }

    /// Singular label used in detail page headers.
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Regions => "Region",
            Self::Departements => "Département",
            Self::Communes => "Commune",
        }
    }
}

/// Filters chosen in the sidebar. `None` means "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterState {
    pub sector_id: Option<i64>,
    pub category_id: Option<i64>,
    pub product_id: Option<i64>,
    pub year: Option<i32>,
}

impl FilterState {
    /// Whether a production-level filter is active.
    pub const fn has_production_filter(&self) -> bool {
        self.product_id.is_some() || self.year.is_some()
    }

    pub const fn is_empty(&self) -> bool {
        self.sector_id.is_none()
            && self.category_id.is_none()
            && self.product_id.is_none()
            && self.year.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_level_round_trips_through_index() {
        for level in MapLevel::ALL {
            assert_eq!(MapLevel::from_index(level.index()), Some(level));
        }
        assert_eq!(MapLevel::from_index(3), None);
    }

    #[test]
    fn map_level_parse_accepts_singular_and_case() {
        assert_eq!(MapLevel::parse(" Regions "), Some(MapLevel::Regions));
        assert_eq!(MapLevel::parse("commune"), Some(MapLevel::Communes));
        assert_eq!(MapLevel::parse("departments"), Some(MapLevel::Departements));
        assert_eq!(MapLevel::parse("districts"), None);
    }

    #[test]
    fn filter_state_production_filter() {
        let mut filters = FilterState::default();
        assert!(filters.is_empty());
        assert!(!filters.has_production_filter());

        filters.sector_id = Some(2);
        assert!(!filters.is_empty());
        assert!(!filters.has_production_filter());

        filters.year = Some(2022);
        assert!(filters.has_production_filter());
    }
}
