//! Defensive normalization of raw provider payloads.
//!
//! The provider is duck-typed and partially available: any top-level field
//! may be missing, numbers arrive as JSON numbers or numeric strings, and
//! individual records can be arbitrarily malformed. This layer coerces what
//! it can, drops what it cannot, and never returns an error — the map
//! renders whatever is usable.

use chrono::{DateTime, Utc};
use serde_json::Value;

use metroaq_core::{
    FeatureCollection, LngLat, Pollutants, Station, Summary, WardFeature, WardProperties,
};

/// Best-effort normalization result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedData {
    /// `None` means "no boundary data available", not "unknown failure".
    pub wards: Option<FeatureCollection>,
    pub stations: Vec<Station>,
    pub summary: Option<Summary>,
}

/// Outcome of normalizing one payload, by data availability.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedPayload {
    /// Both ward and station data were present.
    Complete(NormalizedData),
    /// Exactly one of wards/stations was present.
    Partial(NormalizedData),
    /// Neither was present. A summary alone does not upgrade this.
    Empty,
}

impl NormalizedPayload {
    /// Unwraps into data, with `Empty` degrading to an all-empty snapshot.
    #[must_use]
    pub fn into_data(self) -> NormalizedData {
        match self {
            NormalizedPayload::Complete(data) | NormalizedPayload::Partial(data) => data,
            NormalizedPayload::Empty => NormalizedData::default(),
        }
    }
}

/// Normalizes an arbitrary provider payload.
///
/// Never panics and never fails: malformed station records and ward
/// features are dropped individually (logged at debug), and absent
/// top-level sections simply come back as empty/`None`.
#[must_use]
pub fn normalize(payload: &Value) -> NormalizedPayload {
    let wards = payload.get("wards").and_then(parse_feature_collection);

    let raw_stations = payload.get("stations").and_then(Value::as_array);
    let stations: Vec<Station> = raw_stations
        .map(|records| {
            records
                .iter()
                .enumerate()
                .filter_map(|(index, record)| {
                    let station = parse_station(record);
                    if station.is_none() {
                        tracing::debug!(index, "dropping malformed station record");
                    }
                    station
                })
                .collect()
        })
        .unwrap_or_default();

    let summary = payload.get("summary").and_then(parse_summary);

    match (wards.is_some(), raw_stations.is_some()) {
        (true, true) => NormalizedPayload::Complete(NormalizedData {
            wards,
            stations,
            summary,
        }),
        (false, false) => NormalizedPayload::Empty,
        _ => NormalizedPayload::Partial(NormalizedData {
            wards,
            stations,
            summary,
        }),
    }
}

/// Reads a numeric field that may arrive as a JSON number or numeric string.
fn num_field(record: &Value, key: &str) -> Option<f64> {
    let value = record.get(key)?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|n| n.is_finite())
}

fn str_field(record: &Value, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn timestamp_field(record: &Value, key: &str) -> Option<DateTime<Utc>> {
    record
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Coordinate handling: an absent field coerces to 0.0, but a field that is
/// present and unparseable poisons the whole record.
fn coordinate(record: &Value, key: &str) -> Option<f64> {
    if record.get(key).is_none_or(Value::is_null) {
        return Some(0.0);
    }
    num_field(record, key)
}

fn parse_station(record: &Value) -> Option<Station> {
    if !record.is_object() {
        return None;
    }

    // The upstream feed nests the display name under `station.name`.
    let name = str_field(record, "name")
        .or_else(|| record.get("station").and_then(|s| str_field(s, "name")))
        .unwrap_or_else(|| "Unknown".to_string());

    let lat = coordinate(record, "lat")?;
    let lon = coordinate(record, "lon")?;
    let aqi = num_field(record, "aqi").unwrap_or(0.0).max(0.0);

    let pollutants = record
        .get("pollutants")
        .map(parse_pollutants)
        .unwrap_or_default();

    let updated_at =
        timestamp_field(record, "updated_at").or_else(|| timestamp_field(record, "updated"));

    Some(Station {
        name,
        lat,
        lon,
        aqi,
        pollutants,
        updated_at,
    })
}

/// Each pollutant may be a bare number or the upstream `{"v": number}`
/// wrapper.
fn parse_pollutants(value: &Value) -> Pollutants {
    let field = |key: &str| -> Option<f64> {
        num_field(value, key).or_else(|| value.get(key).and_then(|v| num_field(v, "v")))
    };
    Pollutants {
        pm25: field("pm25"),
        pm10: field("pm10"),
        no2: field("no2"),
        so2: field("so2"),
        o3: field("o3"),
        co: field("co"),
        temperature: field("temperature"),
        humidity: field("humidity"),
    }
}

fn parse_feature_collection(wards: &Value) -> Option<FeatureCollection> {
    let raw_features = wards.get("features")?.as_array()?;
    let features = raw_features
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let ward = parse_ward(feature);
            if ward.is_none() {
                tracing::debug!(index, "dropping malformed ward feature");
            }
            ward
        })
        .collect();
    Some(FeatureCollection { features })
}

fn parse_ward(feature: &Value) -> Option<WardFeature> {
    let properties = feature.get("properties")?;

    let ward_name = str_field(properties, "ward_name")
        .or_else(|| str_field(properties, "name"))
        .unwrap_or_else(|| "Unknown".to_string());
    // Some exports carry numeric ward numbers instead of string ids.
    let ward_id = str_field(properties, "ward_id")
        .or_else(|| {
            properties
                .get("ward_no")
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
        })
        .unwrap_or_else(|| ward_name.clone());

    let ring = parse_ring(feature.get("geometry")?)?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let station_count = num_field(properties, "station_count")
        .filter(|n| *n >= 0.0)
        .map_or(0, |n| n as u32);

    Some(WardFeature {
        ring,
        properties: WardProperties {
            ward_id,
            ward_name,
            avg_aqi: num_field(properties, "avg_aqi"),
            max_aqi: num_field(properties, "max_aqi"),
            min_aqi: num_field(properties, "min_aqi"),
            station_count,
        },
    })
}

/// Extracts the outer ring of a `Polygon` or `MultiPolygon` geometry.
/// Degenerate rings (fewer than 3 usable vertices) are rejected.
fn parse_ring(geometry: &Value) -> Option<Vec<LngLat>> {
    let coordinates = geometry.get("coordinates")?;
    let outer = match geometry.get("type").and_then(Value::as_str)? {
        "Polygon" => coordinates.get(0)?,
        "MultiPolygon" => coordinates.get(0)?.get(0)?,
        _ => return None,
    };

    let vertices = outer.as_array()?;
    let mut ring = Vec::with_capacity(vertices.len());
    for vertex in vertices {
        let pair = vertex.as_array()?;
        let lng = pair.first().and_then(Value::as_f64)?;
        let lat = pair.get(1).and_then(Value::as_f64)?;
        if !lng.is_finite() || !lat.is_finite() {
            return None;
        }
        ring.push(LngLat { lng, lat });
    }

    (ring.len() >= 3).then_some(ring)
}

fn parse_summary(value: &Value) -> Option<Summary> {
    if !value.is_object() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = |key: &str| -> u32 {
        num_field(value, key)
            .filter(|n| *n >= 0.0)
            .map_or(0, |n| n as u32)
    };
    Some(Summary {
        total_wards: count("total_wards"),
        total_stations: count("total_stations"),
        avg_aqi: num_field(value, "avg_aqi").unwrap_or(0.0),
        max_aqi: num_field(value, "max_aqi").unwrap_or(0.0),
        min_aqi: num_field(value, "min_aqi").unwrap_or(0.0),
        fetched_at: timestamp_field(value, "fetched_at"),
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
