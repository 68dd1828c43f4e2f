//! GeoJSON feature model as served by the geometry endpoints.
//!
//! Geometry is decoded leniently: positions may carry an altitude (ignored),
//! unknown geometry types are kept as [`Geometry::Unsupported`] and skipped
//! when drawing.

use serde::Deserialize;
use serde_json::{Map, Value};

/// `(longitude, latitude)` in degrees.
pub type Position = (f64, f64);
pub type Ring = Vec<Position>;

/// Identifier carried in `properties.id`.
pub type FeatureId = i64;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn find(&self, id: FeatureId) -> Option<&Feature> {
        self.features.iter().find(|feature| feature.id() == Some(id))
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_collection(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    /// `properties.id` as an integer, if present.
    pub fn id(&self) -> Option<FeatureId> {
        match self.properties.get("id")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Display name: `nom`, then `name`, else "Unnamed".
    pub fn name(&self) -> &str {
        ["nom", "name"]
            .iter()
            .filter_map(|key| self.properties.get(*key).and_then(Value::as_str))
            .find(|name| !name.is_empty())
            .unwrap_or("Unnamed")
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_feature(self)
    }

    /// Whether `(lon, lat)` lies inside the feature's polygons.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.geometry
            .as_ref()
            .is_some_and(|geometry| geometry.contains(lon, lat))
    }

    /// Hit test used for mouse interaction. Polygons test containment,
    /// points and lines accept anything within `tolerance` degrees.
    pub fn hit(&self, lon: f64, lat: f64, tolerance: f64) -> bool {
        self.geometry
            .as_ref()
            .is_some_and(|geometry| geometry.hit(lon, lat, tolerance))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawGeometry")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
    /// Any other geometry type, or coordinates that failed to parse.
    Unsupported(String),
}

impl Geometry {
    /// Every position of the geometry, flattened.
    pub fn positions(&self) -> Box<dyn Iterator<Item = Position> + '_> {
        match self {
            Self::Point(p) => Box::new(std::iter::once(*p)),
            Self::LineString(line) => Box::new(line.iter().copied()),
            Self::Polygon(rings) => Box::new(rings.iter().flatten().copied()),
            Self::MultiPolygon(polys) => Box::new(polys.iter().flatten().flatten().copied()),
            Self::Unsupported(_) => Box::new(std::iter::empty()),
        }
    }

    /// Outer and inner rings of every polygon, for outline drawing.
    pub fn rings(&self) -> Vec<&Ring> {
        match self {
            Self::Polygon(rings) => rings.iter().collect(),
            Self::MultiPolygon(polys) => polys.iter().flatten().collect(),
            _ => Vec::new(),
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        match self {
            Self::Polygon(rings) => polygon_contains(rings, lon, lat),
            Self::MultiPolygon(polys) => polys.iter().any(|rings| polygon_contains(rings, lon, lat)),
            _ => false,
        }
    }

    pub fn hit(&self, lon: f64, lat: f64, tolerance: f64) -> bool {
        match self {
            Self::Point(p) => distance(*p, (lon, lat)) <= tolerance,
            Self::LineString(line) => line
                .windows(2)
                .any(|seg| segment_distance((lon, lat), seg[0], seg[1]) <= tolerance),
            _ => self.contains(lon, lat),
        }
    }

    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl From<RawGeometry> for Geometry {
    fn from(raw: RawGeometry) -> Self {
        let parsed = match raw.kind.as_str() {
            "Point" => position(&raw.coordinates).map(Self::Point),
            "LineString" => line(&raw.coordinates).map(Self::LineString),
            "Polygon" => polygon(&raw.coordinates).map(Self::Polygon),
            "MultiPolygon" => raw
                .coordinates
                .as_array()
                .and_then(|polys| polys.iter().map(polygon).collect::<Option<Vec<_>>>())
                .map(Self::MultiPolygon),
            _ => None,
        };
        parsed.unwrap_or(Self::Unsupported(raw.kind))
    }
}

fn position(value: &Value) -> Option<Position> {
    let coords = value.as_array()?;
    let lon = coords.first()?.as_f64()?;
    let lat = coords.get(1)?.as_f64()?;
    Some((lon, lat))
}

fn line(value: &Value) -> Option<Vec<Position>> {
    value.as_array()?.iter().map(position).collect()
}

fn polygon(value: &Value) -> Option<Vec<Ring>> {
    value.as_array()?.iter().map(line).collect()
}

fn ring_contains(ring: &[Position], lon: f64, lat: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn polygon_contains(rings: &[Ring], lon: f64, lat: f64) -> bool {
    let Some((outer, holes)) = rings.split_first() else {
        return false;
    };
    ring_contains(outer, lon, lat) && !holes.iter().any(|hole| ring_contains(hole, lon, lat))
}

fn distance(a: Position, b: Position) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

fn segment_distance(p: Position, a: Position, b: Position) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx.mul_add(dx, dy * dy);
    if len2 == 0.0 {
        return distance(p, a);
    }
    let t = ((p.0 - a.0).mul_add(dx, (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0);
    distance(p, (t.mul_add(dx, a.0), t.mul_add(dy, a.1)))
}

/// Longitude/latitude bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub const EMPTY: Self = Self {
        min_lon: f64::INFINITY,
        min_lat: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
        max_lat: f64::NEG_INFINITY,
    };

    pub const fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    pub fn from_positions(positions: impl IntoIterator<Item = Position>) -> Self {
        positions
            .into_iter()
            .fold(Self::EMPTY, |bounds, pos| bounds.extend(pos))
    }

    pub fn from_feature(feature: &Feature) -> Self {
        feature
            .geometry
            .as_ref()
            .map_or(Self::EMPTY, |geometry| Self::from_positions(geometry.positions()))
    }

    pub fn from_collection(collection: &FeatureCollection) -> Self {
        collection
            .features
            .iter()
            .map(Self::from_feature)
            .fold(Self::EMPTY, Self::union)
    }

    #[must_use]
    pub fn extend(self, (lon, lat): Position) -> Self {
        Self {
            min_lon: self.min_lon.min(lon),
            min_lat: self.min_lat.min(lat),
            max_lon: self.max_lon.max(lon),
            max_lat: self.max_lat.max(lat),
        }
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Non-empty and finite. A single point is valid.
    pub fn is_valid(&self) -> bool {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lon <= self.max_lon
            && self.min_lat <= self.max_lat
    }

    pub fn center(&self) -> Position {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn contains(&self, (lon, lat): Position) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }
}
