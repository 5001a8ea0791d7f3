//! Choropleth rendering of ward polygons.
//!
//! Builds one styled polygon per ward from the current feature collection.
//! Exactly one `WardLayer` is alive at a time; the session replaces (never
//! stacks) it on every data refresh.

use metroaq_core::{classify, Bounds, FeatureCollection, LngLat, WardProperties};

use crate::error::RenderError;

/// Stroke/fill styling for one polygon, resolved from its AQI class and
/// whether the value is measured or interpolated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonStyle {
    pub fill_color: &'static str,
    pub fill_opacity: f64,
    pub stroke_color: &'static str,
    pub stroke_weight: f64,
    /// `Some` renders a dashed outline (estimated data).
    pub dash_array: Option<&'static str>,
}

/// Hover-tooltip content for a ward.
#[derive(Debug, Clone, PartialEq)]
pub struct WardTooltip {
    pub ward_name: String,
    pub avg_aqi: Option<f64>,
    pub measured: bool,
}

/// One renderable ward polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct WardPolygon {
    pub ward_id: String,
    pub ward_name: String,
    pub ring: Vec<LngLat>,
    pub base_style: PolygonStyle,
    pub tooltip: WardTooltip,
}

/// The single renderer-owned ward layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WardLayer {
    pub polygons: Vec<WardPolygon>,
}

/// Base style per the severity ramp: measured wards get a solid black
/// outline at full weight, interpolated wards a lighter dashed one.
#[must_use]
pub fn base_style(properties: &WardProperties) -> PolygonStyle {
    let fill_color = classify(properties.avg_aqi.unwrap_or(0.0)).color;
    if properties.station_count > 0 {
        PolygonStyle {
            fill_color,
            fill_opacity: 0.7,
            stroke_color: "#000000",
            stroke_weight: 1.5,
            dash_array: None,
        }
    } else {
        PolygonStyle {
            fill_color,
            fill_opacity: 0.5,
            stroke_color: "#666666",
            stroke_weight: 0.5,
            dash_array: Some("3, 3"),
        }
    }
}

/// Pointer-enter emphasis. Reverting on pointer-leave is just the polygon's
/// `base_style` again; no refetch involved.
#[must_use]
pub fn hover_style(polygon: &WardPolygon) -> PolygonStyle {
    PolygonStyle {
        fill_color: polygon.base_style.fill_color,
        fill_opacity: 0.9,
        stroke_color: "#ffffff",
        stroke_weight: 3.0,
        dash_array: None,
    }
}

impl WardLayer {
    /// Builds the layer from a feature collection, excluding wards whose
    /// AQI falls outside `aqi_filter`.
    ///
    /// Per-feature geometry failures are collected and reported, never
    /// propagated: one bad ward must not take down the rest of the layer.
    #[must_use]
    pub fn build(
        collection: &FeatureCollection,
        aqi_filter: (f64, f64),
    ) -> (WardLayer, Vec<RenderError>) {
        let (filter_min, filter_max) = aqi_filter;
        let mut polygons = Vec::with_capacity(collection.len());
        let mut errors = Vec::new();

        for feature in &collection.features {
            let props = &feature.properties;
            let aqi = props.avg_aqi.unwrap_or(0.0);
            if aqi < filter_min || aqi > filter_max {
                continue;
            }
            if feature.ring.len() < 3 {
                errors.push(RenderError::Ward {
                    ward_id: props.ward_id.clone(),
                    reason: format!("degenerate ring with {} vertices", feature.ring.len()),
                });
                continue;
            }
            if feature
                .ring
                .iter()
                .any(|p| !p.lat.is_finite() || !p.lng.is_finite())
            {
                errors.push(RenderError::Ward {
                    ward_id: props.ward_id.clone(),
                    reason: "non-finite vertex coordinate".to_owned(),
                });
                continue;
            }

            polygons.push(WardPolygon {
                ward_id: props.ward_id.clone(),
                ward_name: props.ward_name.clone(),
                ring: feature.ring.clone(),
                base_style: base_style(props),
                tooltip: WardTooltip {
                    ward_name: props.ward_name.clone(),
                    avg_aqi: props.avg_aqi,
                    measured: props.station_count > 0,
                },
            });
        }

        if !errors.is_empty() {
            tracing::warn!(skipped = errors.len(), "ward features skipped during render");
        }
        (WardLayer { polygons }, errors)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    #[must_use]
    pub fn get(&self, ward_id: &str) -> Option<&WardPolygon> {
        self.polygons.iter().find(|p| p.ward_id == ward_id)
    }

    /// Combined bounds of all polygon rings. `None` for an empty layer, so
    /// a failed bounds computation is swallowed rather than fatal.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.polygons
            .iter()
            .filter_map(|p| Bounds::from_points(p.ring.iter().copied()))
            .reduce(Bounds::union)
    }
}
