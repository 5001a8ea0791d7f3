//! Ad-hoc substring index over ward and station names.
//!
//! Rebuilt on every successful data refresh; a linear scan is plenty at the
//! hundreds-of-entities scale this map operates on.

use metroaq_core::{EntityKind, FeatureCollection, SearchResult, Station};

/// Maximum number of results a query returns.
const MAX_RESULTS: usize = 10;

#[derive(Debug, Clone)]
struct IndexEntry {
    name_lower: String,
    result: SearchResult,
}

/// In-memory name index answering ranked, capped substring queries.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    /// Builds the index from the current snapshot. Wards enter first, then
    /// stations, so results intermix in data order.
    #[must_use]
    pub fn build(wards: Option<&FeatureCollection>, stations: &[Station]) -> SearchIndex {
        let mut entries = Vec::new();

        if let Some(collection) = wards {
            for feature in &collection.features {
                // A ward without a usable centroid has nowhere to fly to.
                let Some(centroid) = feature.centroid() else {
                    continue;
                };
                let name = feature.properties.ward_name.clone();
                entries.push(IndexEntry {
                    name_lower: name.to_lowercase(),
                    result: SearchResult {
                        name,
                        lat: centroid.lat,
                        lon: centroid.lng,
                        kind: EntityKind::Ward,
                    },
                });
            }
        }

        for station in stations {
            entries.push(IndexEntry {
                name_lower: station.name.to_lowercase(),
                result: SearchResult {
                    name: station.name.clone(),
                    lat: station.lat,
                    lon: station.lon,
                    kind: EntityKind::Station,
                },
            });
        }

        SearchIndex { entries }
    }

    /// Case-insensitive substring search, capped at 10 results.
    ///
    /// A blank query matches nothing — it is neither an error nor
    /// "match all".
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| entry.name_lower.contains(&needle))
            .take(MAX_RESULTS)
            .map(|entry| entry.result.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
