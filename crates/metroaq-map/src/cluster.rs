//! Marker clustering for station readings.
//!
//! Stations that land within the same 80-pixel grid cell at the current
//! zoom level merge into one cluster icon; lone stations render as
//! individual AQI-colored markers. The whole group is rebuilt from scratch
//! whenever the station set changes and swapped in atomically — the viewer
//! never sees a half-built map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use metroaq_core::{classify, AqiCategory, Pollutants, Station};

use crate::error::RenderError;

/// Cluster icon size tier by child count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterTier {
    Small,
    Medium,
    Large,
}

impl ClusterTier {
    /// Small < 10, Medium 10..=99, Large >= 100.
    #[must_use]
    pub fn for_count(count: usize) -> Self {
        if count >= 100 {
            ClusterTier::Large
        } else if count >= 10 {
            ClusterTier::Medium
        } else {
            ClusterTier::Small
        }
    }
}

/// Visual identity of a single station marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcon {
    /// Severity color from the AQI classifier.
    pub color: &'static str,
    /// Rounded AQI value shown on the icon.
    pub label: String,
}

/// Popup content surfaced on marker click. Clicking a marker never
/// navigates anywhere; it only opens this detail.
#[derive(Debug, Clone, PartialEq)]
pub struct StationPopup {
    pub name: String,
    pub aqi: f64,
    pub category: AqiCategory,
    pub pollutants: Pollutants,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One renderable station marker.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMarker {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub icon: MarkerIcon,
    pub popup: StationPopup,
}

/// A node of the cluster layer: either a lone marker or a merged cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterNode {
    Marker(StationMarker),
    Cluster {
        lat: f64,
        lng: f64,
        count: usize,
        tier: ClusterTier,
        /// Indices into the station slice the group was built from.
        members: Vec<usize>,
    },
}

/// The single live cluster group for the current station set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterGroup {
    pub nodes: Vec<ClusterNode>,
}

/// Grid cell size in screen pixels; matches the default cluster radius of
/// the marker-cluster plugin the styling is modeled on.
const CLUSTER_CELL_PX: f64 = 80.0;
const TILE_SIZE: f64 = 256.0;
/// Web-mercator latitude clamp.
const MAX_LAT: f64 = 85.051_128_78;

/// Projects a lat/lng to global pixel coordinates at the given zoom.
/// Computed in floating point so any `u8` zoom is safe.
fn project(lat: f64, lng: f64, zoom: u8) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powi(i32::from(zoom));
    let x = (lng + 180.0) / 360.0 * scale;
    let clamped = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let y = (1.0 - ((clamped.tan() + 1.0 / clamped.cos()).ln() / std::f64::consts::PI)) / 2.0
        * scale;
    (x, y)
}

fn marker_for(station: &Station) -> StationMarker {
    let class = classify(station.aqi);
    StationMarker {
        name: station.name.clone(),
        lat: station.lat,
        lng: station.lon,
        icon: MarkerIcon {
            color: class.color,
            label: format!("{}", station.aqi.round()),
        },
        popup: StationPopup {
            name: station.name.clone(),
            aqi: station.aqi,
            category: class.category,
            pollutants: station.pollutants,
            updated_at: station.updated_at,
        },
    }
}

impl ClusterGroup {
    /// Builds the cluster group for `stations` at `zoom`, excluding
    /// stations whose AQI falls outside `aqi_filter`.
    ///
    /// Unprojectable stations are collected and reported, never
    /// propagated; the rest of the group still builds. The returned group
    /// is complete before the caller installs it, so a rebuild is atomic
    /// from the viewer's perspective.
    #[must_use]
    pub fn build(
        stations: &[Station],
        zoom: u8,
        aqi_filter: (f64, f64),
    ) -> (ClusterGroup, Vec<RenderError>) {
        let (filter_min, filter_max) = aqi_filter;
        let mut errors = Vec::new();

        // Cells in first-seen order so output is deterministic.
        let mut cell_order: Vec<(i64, i64)> = Vec::new();
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();

        for (index, station) in stations.iter().enumerate() {
            if station.aqi < filter_min || station.aqi > filter_max {
                continue;
            }
            if !station.lat.is_finite() || !station.lon.is_finite() {
                errors.push(RenderError::Station {
                    name: station.name.clone(),
                    reason: "non-finite coordinates".to_owned(),
                });
                continue;
            }
            let (px, py) = project(station.lat, station.lon, zoom);
            #[allow(clippy::cast_possible_truncation)]
            let key = (
                (px / CLUSTER_CELL_PX).floor() as i64,
                (py / CLUSTER_CELL_PX).floor() as i64,
            );
            if !cells.contains_key(&key) {
                cell_order.push(key);
            }
            cells.entry(key).or_default().push(index);
        }

        let nodes = cell_order
            .into_iter()
            .map(|key| {
                let members = cells.remove(&key).unwrap_or_default();
                if members.len() == 1 {
                    ClusterNode::Marker(marker_for(&stations[members[0]]))
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let n = members.len() as f64;
                    let (lat_sum, lng_sum) = members.iter().fold((0.0, 0.0), |(la, ln), &i| {
                        (la + stations[i].lat, ln + stations[i].lon)
                    });
                    ClusterNode::Cluster {
                        lat: lat_sum / n,
                        lng: lng_sum / n,
                        count: members.len(),
                        tier: ClusterTier::for_count(members.len()),
                        members,
                    }
                }
            })
            .collect();

        if !errors.is_empty() {
            tracing::warn!(skipped = errors.len(), "stations skipped during clustering");
        }
        (ClusterGroup { nodes }, errors)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total stations represented, markers and cluster members combined.
    #[must_use]
    pub fn station_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| match node {
                ClusterNode::Marker(_) => 1,
                ClusterNode::Cluster { count, .. } => *count,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(name: &str, lat: f64, lon: f64, aqi: f64) -> Station {
        Station {
            name: name.to_owned(),
            lat,
            lon,
            aqi,
            pollutants: Pollutants::default(),
            updated_at: None,
        }
    }

    /// `n` stations at effectively the same point, so they always share a
    /// grid cell.
    fn co_located(n: usize) -> Vec<Station> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let jitter = i as f64 * 1e-7;
                station(&format!("S{i}"), 28.6 + jitter, 77.2, 100.0)
            })
            .collect()
    }

    const OPEN_FILTER: (f64, f64) = (0.0, 500.0);

    #[test]
    fn tier_boundaries_are_exact() {
        assert_eq!(ClusterTier::for_count(9), ClusterTier::Small);
        assert_eq!(ClusterTier::for_count(10), ClusterTier::Medium);
        assert_eq!(ClusterTier::for_count(99), ClusterTier::Medium);
        assert_eq!(ClusterTier::for_count(100), ClusterTier::Large);
    }

    #[test]
    fn co_located_stations_merge_into_one_cluster() {
        let (group, _) = ClusterGroup::build(&co_located(10), 11, OPEN_FILTER);
        assert_eq!(group.nodes.len(), 1);
        assert!(matches!(
            group.nodes[0],
            ClusterNode::Cluster { count: 10, tier: ClusterTier::Medium, .. }
        ));
    }

    #[test]
    fn nine_stations_cluster_small_hundred_large() {
        let (group9, _) = ClusterGroup::build(&co_located(9), 11, OPEN_FILTER);
        assert!(matches!(
            group9.nodes[0],
            ClusterNode::Cluster { tier: ClusterTier::Small, .. }
        ));
        let (group100, _) = ClusterGroup::build(&co_located(100), 11, OPEN_FILTER);
        assert!(matches!(
            group100.nodes[0],
            ClusterNode::Cluster { tier: ClusterTier::Large, .. }
        ));
    }

    #[test]
    fn distant_stations_stay_individual_markers() {
        let stations = vec![
            station("North", 28.8, 77.1, 90.0),
            station("South", 28.4, 77.3, 210.0),
        ];
        let (group, _) = ClusterGroup::build(&stations, 11, OPEN_FILTER);
        assert_eq!(group.nodes.len(), 2);
        assert!(group
            .nodes
            .iter()
            .all(|n| matches!(n, ClusterNode::Marker(_))));
    }

    #[test]
    fn higher_zoom_splits_a_cluster() {
        let stations = vec![
            station("A", 28.60, 77.20, 90.0),
            station("B", 28.62, 77.22, 95.0),
        ];
        let (low, _) = ClusterGroup::build(&stations, 8, OPEN_FILTER);
        let (high, _) = ClusterGroup::build(&stations, 15, OPEN_FILTER);
        assert_eq!(low.nodes.len(), 1, "expected one merged cluster at low zoom");
        assert_eq!(high.nodes.len(), 2, "expected split markers at high zoom");
    }

    #[test]
    fn marker_icon_encodes_aqi_color_and_rounded_label() {
        let (group, _) = ClusterGroup::build(&[station("S", 28.6, 77.2, 132.4)], 11, OPEN_FILTER);
        let ClusterNode::Marker(marker) = &group.nodes[0] else {
            panic!("expected a lone marker");
        };
        assert_eq!(marker.icon.color, "#ff7e00");
        assert_eq!(marker.icon.label, "132");
        assert_eq!(marker.popup.category, AqiCategory::Moderate);
    }

    #[test]
    fn aqi_filter_excludes_stations() {
        let stations = vec![
            station("Clean", 28.6, 77.2, 30.0),
            station("Dirty", 28.8, 77.4, 320.0),
        ];
        let (group, _) = ClusterGroup::build(&stations, 11, (100.0, 500.0));
        assert_eq!(group.station_count(), 1);
    }

    #[test]
    fn extreme_zoom_levels_build_without_overflow() {
        let stations = vec![
            station("North", 28.8, 77.1, 90.0),
            station("South", 28.4, 77.3, 210.0),
        ];
        for zoom in [31, 32, u8::MAX] {
            let (group, errors) = ClusterGroup::build(&stations, zoom, OPEN_FILTER);
            assert_eq!(group.station_count(), 2, "zoom {zoom}");
            assert!(errors.is_empty());
        }
    }

    #[test]
    fn non_finite_coordinates_are_reported_not_fatal() {
        let stations = vec![
            station("Broken", f64::NAN, 77.2, 90.0),
            station("Fine", 28.6, 77.2, 110.0),
        ];
        let (group, errors) = ClusterGroup::build(&stations, 11, OPEN_FILTER);
        assert_eq!(group.station_count(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], RenderError::Station { name, .. } if name == "Broken"));
    }

    #[test]
    fn cluster_position_is_member_mean() {
        let stations = vec![
            station("A", 28.0, 77.0, 90.0),
            station("B", 28.0002, 77.0002, 110.0),
        ];
        let (group, _) = ClusterGroup::build(&stations, 5, OPEN_FILTER);
        let ClusterNode::Cluster { lat, lng, .. } = &group.nodes[0] else {
            panic!("expected a cluster");
        };
        assert!((lat - 28.0001).abs() < 1e-6);
        assert!((lng - 77.0001).abs() < 1e-6);
    }
}
