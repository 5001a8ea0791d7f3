//! End-to-end session behavior against a scripted provider: load a
//! realistic payload, then walk the full interaction surface.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};

use metroaq_core::{AqiCategory, classify, EntityKind};
use metroaq_map::orchestrator::DataProvider;
use metroaq_map::view::DEFAULT_ZOOM;
use metroaq_map::{ClusterNode, FetchPhase, MapEvent, MapSession};
use metroaq_provider::{ProviderError, TriggerPath};

#[derive(Default)]
struct ScriptedProvider {
    fetches: Mutex<VecDeque<Result<Value, ProviderError>>>,
}

impl ScriptedProvider {
    fn with_fetches(fetches: Vec<Result<Value, ProviderError>>) -> Self {
        ScriptedProvider {
            fetches: Mutex::new(fetches.into()),
        }
    }
}

impl DataProvider for ScriptedProvider {
    async fn fetch_dataset(&self) -> Result<Value, ProviderError> {
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(fetch_error()))
    }

    async fn trigger_recompute(&self) -> Result<TriggerPath, ProviderError> {
        Ok(TriggerPath::Secondary)
    }
}

fn fetch_error() -> ProviderError {
    ProviderError::UnexpectedStatus {
        status: 502,
        url: "http://test/api/map/data".to_owned(),
    }
}

/// One measured ward at AQI 120 plus two stations far enough apart to stay
/// unclustered at the default zoom.
fn city_payload() -> Value {
    json!({
        "wards": {
            "features": [{
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[77.10, 28.55], [77.30, 28.55],
                                     [77.30, 28.70], [77.10, 28.70]]]
                },
                "properties": {
                    "ward_id": "W042",
                    "ward_name": "Model Town",
                    "avg_aqi": 120.0,
                    "max_aqi": 140.0,
                    "min_aqi": 100.0,
                    "station_count": 2
                }
            }]
        },
        "stations": [
            { "name": "Anand Vihar", "lat": 28.65, "lon": 77.12, "aqi": 140.0,
              "pollutants": { "pm25": { "v": 68.0 }, "pm10": 120.0 } },
            { "name": "RK Puram", "lat": 28.56, "lon": 77.27, "aqi": 100.0 }
        ],
        "summary": { "total_wards": 1, "total_stations": 2, "avg_aqi": 120.0,
                     "max_aqi": 140.0, "min_aqi": 100.0 }
    })
}

async fn loaded_session() -> MapSession<ScriptedProvider> {
    let provider = ScriptedProvider::with_fetches(vec![Ok(city_payload())]);
    let mut session = MapSession::new(provider, Duration::ZERO);
    assert!(session.initial_load().await);
    session
}

#[tokio::test]
async fn initial_load_renders_wards_and_markers() {
    let session = loaded_session().await;

    assert_eq!(session.phase(), FetchPhase::Ready);

    let layer = session.ward_layer().expect("ward layer built");
    let polygon = layer.get("W042").expect("ward rendered");
    assert_eq!(polygon.base_style.fill_color, "#ff7e00");
    assert_eq!(polygon.base_style.fill_opacity, 0.7);
    assert!(polygon.base_style.dash_array.is_none(), "measured ward is solid");

    let group = session.cluster_group().expect("cluster group built");
    assert_eq!(group.station_count(), 2);
    assert!(
        group.nodes.iter().all(|n| matches!(n, ClusterNode::Marker(_))),
        "distant stations render as lone markers at zoom {DEFAULT_ZOOM}"
    );

    let summary = session.summary().expect("summary present");
    assert_eq!(summary.total_stations, 2);
    assert_eq!(classify(summary.avg_aqi).category, AqiCategory::Moderate);
}

#[tokio::test]
async fn viewport_fits_to_data_once_and_only_once() {
    let provider =
        ScriptedProvider::with_fetches(vec![Ok(city_payload()), Ok(city_payload())]);
    let mut session = MapSession::new(provider, Duration::ZERO);

    session.initial_load().await;
    let fits = session
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, MapEvent::FitBounds(_)))
        .count();
    assert_eq!(fits, 1);

    session.refresh().await;
    assert!(
        !session
            .drain_events()
            .iter()
            .any(|e| matches!(e, MapEvent::FitBounds(_))),
        "refresh must not move the camera"
    );
}

#[tokio::test]
async fn clicking_a_ward_opens_its_detail_view() {
    let mut session = loaded_session().await;
    session.drain_events();

    session.click_ward("W042");
    assert_eq!(
        session.state().selected_ward_id.as_deref(),
        Some("W042")
    );
    assert_eq!(
        session.drain_events(),
        vec![MapEvent::OpenWardDetail {
            ward_id: "W042".to_owned(),
            ward_name: "Model Town".to_owned(),
        }]
    );

    // A click on something no longer rendered is a no-op.
    session.click_ward("GONE");
    assert!(session.drain_events().is_empty());
}

#[tokio::test]
async fn hover_emphasizes_and_unhover_restores_resting_style() {
    let session = loaded_session().await;

    let hovered = session.hover_ward("W042").expect("hover style");
    assert_eq!(hovered.fill_opacity, 0.9);
    assert_eq!(hovered.stroke_color, "#ffffff");

    let resting = session.unhover_ward("W042").expect("resting style");
    assert_eq!(resting.fill_opacity, 0.7);
    assert_eq!(resting.stroke_color, "#000000");
}

#[tokio::test]
async fn search_finds_entities_and_selection_flies_to_them() {
    let mut session = loaded_session().await;
    session.drain_events();

    let results = session.search("model");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind, EntityKind::Ward);

    let station_results = session.search("vihar");
    assert_eq!(station_results.len(), 1);
    assert_eq!(session.query(), "vihar");

    session.select_search_result(&station_results[0]);
    assert!(session.query().is_empty(), "picking a result clears the query");
    assert!(matches!(
        session.drain_events().as_slice(),
        [MapEvent::FlyTo { zoom: 14, .. }]
    ));
}

#[tokio::test]
async fn layer_toggles_remove_and_restore_layers() {
    let mut session = loaded_session().await;

    session.set_show_wards(false);
    assert!(session.ward_layer().is_none());
    assert!(session.cluster_group().is_some(), "station half unaffected");

    session.set_show_wards(true);
    assert!(session.ward_layer().is_some());

    session.set_show_stations(false);
    assert!(session.cluster_group().is_none());
}

#[tokio::test]
async fn aqi_filter_narrows_both_layers() {
    let mut session = loaded_session().await;

    // Ward avg 120 and station "RK Puram" at 100 fall below the window.
    session.set_aqi_filter(130.0, 500.0);
    assert!(session.ward_layer().unwrap().is_empty());
    assert_eq!(session.cluster_group().unwrap().station_count(), 1);

    session.set_aqi_filter(0.0, 500.0);
    assert_eq!(session.ward_layer().unwrap().polygons.len(), 1);
    assert_eq!(session.cluster_group().unwrap().station_count(), 2);
}

#[tokio::test]
async fn zoom_change_rebuilds_clustering() {
    let mut session = loaded_session().await;

    // Zoomed far out, the two stations collapse into one cluster.
    session.notify_zoom_changed(5);
    let group = session.cluster_group().expect("cluster group");
    assert_eq!(group.nodes.len(), 1);
    assert!(matches!(group.nodes[0], ClusterNode::Cluster { count: 2, .. }));

    session.notify_zoom_changed(DEFAULT_ZOOM);
    assert_eq!(session.cluster_group().unwrap().nodes.len(), 2);

    // Hosts can report any zoom level; clustering must take it in stride.
    session.notify_zoom_changed(u8::MAX);
    assert_eq!(session.cluster_group().unwrap().station_count(), 2);
}

#[tokio::test]
async fn failed_initial_load_shows_banner_and_no_layers() {
    let provider = ScriptedProvider::with_fetches(vec![Err(fetch_error())]);
    let mut session = MapSession::new(provider, Duration::ZERO);

    assert!(!session.initial_load().await);
    assert_eq!(session.phase(), FetchPhase::Failed);
    assert!(session.ward_layer().is_none());
    assert!(session.banner().is_some());

    session.dismiss_banner();
    assert!(session.banner().is_none());
}

#[tokio::test]
async fn failed_refresh_keeps_the_working_map() {
    let provider =
        ScriptedProvider::with_fetches(vec![Ok(city_payload()), Err(fetch_error())]);
    let mut session = MapSession::new(provider, Duration::ZERO);
    session.initial_load().await;

    assert!(!session.refresh().await);
    assert_eq!(session.phase(), FetchPhase::Ready);
    assert!(session.ward_layer().is_some(), "stale layers stay up");
    assert_eq!(session.cluster_group().unwrap().station_count(), 2);
    assert!(session.banner().is_some());
}

#[tokio::test(start_paused = true)]
async fn recompute_refetches_and_installs_new_data() {
    let recomputed = {
        let mut payload = city_payload();
        payload["summary"]["avg_aqi"] = json!(95.0);
        payload
    };
    let provider =
        ScriptedProvider::with_fetches(vec![Ok(city_payload()), Ok(recomputed)]);
    let mut session = MapSession::new(provider, Duration::from_secs(20));
    session.initial_load().await;

    assert!(session.trigger_recompute().await);
    let summary = session.summary().expect("summary");
    assert!((summary.avg_aqi - 95.0).abs() < f64::EPSILON);
}
