//! Domain entities for the air-quality map.
//!
//! Everything here is a plain value: snapshots built from a provider fetch
//! replace the previous snapshot wholesale and are never mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A longitude/latitude pair, GeoJSON axis order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Computes the bounding box of a set of points.
    ///
    /// Returns `None` when the iterator is empty or any coordinate is
    /// non-finite, so degenerate geometry never produces a bogus viewport.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LngLat>,
    {
        let mut bounds: Option<Bounds> = None;
        for p in points {
            if !p.lat.is_finite() || !p.lng.is_finite() {
                return None;
            }
            bounds = Some(match bounds {
                None => Bounds {
                    south: p.lat,
                    west: p.lng,
                    north: p.lat,
                    east: p.lng,
                },
                Some(b) => b.extended(p),
            });
        }
        bounds
    }

    #[must_use]
    pub fn extended(self, p: LngLat) -> Self {
        Bounds {
            south: self.south.min(p.lat),
            west: self.west.min(p.lng),
            north: self.north.max(p.lat),
            east: self.east.max(p.lng),
        }
    }

    /// Merges two boxes into the smallest box covering both.
    #[must_use]
    pub fn union(self, other: Bounds) -> Self {
        Bounds {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }

    #[must_use]
    pub fn center(&self) -> LngLat {
        LngLat {
            lng: f64::midpoint(self.west, self.east),
            lat: f64::midpoint(self.south, self.north),
        }
    }
}

/// Per-pollutant readings for a station. Any field may be absent; consumers
/// must never assume presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pollutants {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub o3: Option<f64>,
    pub co: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

/// A single monitoring-station reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Never negative; 0.0 when the provider omitted it.
    pub aqi: f64,
    pub pollutants: Pollutants,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Aggregate AQI statistics attached to a ward polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardProperties {
    pub ward_id: String,
    pub ward_name: String,
    pub avg_aqi: Option<f64>,
    pub max_aqi: Option<f64>,
    pub min_aqi: Option<f64>,
    /// 0 means the ward value is interpolated, not measured.
    pub station_count: u32,
}

/// An administrative ward boundary: the outer ring of its polygon plus its
/// aggregate properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardFeature {
    pub ring: Vec<LngLat>,
    pub properties: WardProperties,
}

impl WardFeature {
    /// True when at least one station reading backs this ward's AQI.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.properties.station_count > 0
    }

    /// Arithmetic mean of the ring vertices. A deliberate approximation of
    /// the centroid; not area-weighted.
    #[must_use]
    pub fn centroid(&self) -> Option<LngLat> {
        if self.ring.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.ring.len() as f64;
        let (lng, lat) = self
            .ring
            .iter()
            .fold((0.0, 0.0), |(x, y), p| (x + p.lng, y + p.lat));
        Some(LngLat {
            lng: lng / n,
            lat: lat / n,
        })
    }
}

/// Ordered sequence of ward features from one provider fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<WardFeature>,
}

impl FeatureCollection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }
}

/// City-wide statistics snapshot, replaced wholesale on every successful
/// refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_wards: u32,
    pub total_stations: u32,
    pub avg_aqi: f64,
    pub max_aqi: f64,
    pub min_aqi: f64,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// What kind of named entity a search hit refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Ward,
    Station,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Ward => write!(f, "ward"),
            EntityKind::Station => write!(f, "station"),
        }
    }
}

/// A name-search hit with the coordinates to fly to. Derived, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub kind: EntityKind,
}
