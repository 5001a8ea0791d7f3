//! The map session: one live choropleth layer, one live cluster group, a
//! search index, and the viewport controller, all kept in step with the
//! orchestrator's snapshot.
//!
//! Layer replacement is remove-before-install: the old layer handle is
//! dropped before the new one is built, so two generations never coexist.
//! The ward and station halves rebuild independently; a failure in one
//! leaves the other standing.

use std::time::Duration;

use metroaq_core::{Bounds, LngLat, SearchResult, Summary};

use crate::choropleth::{hover_style, PolygonStyle, WardLayer};
use crate::cluster::ClusterGroup;
use crate::orchestrator::{Banner, DataProvider, FetchPhase, Orchestrator};
use crate::search::SearchIndex;
use crate::view::{MapEvent, MapViewController, ViewState};

/// Zoom applied when flying to a picked search result.
const SEARCH_RESULT_ZOOM: u8 = 14;

pub struct MapSession<P> {
    orchestrator: Orchestrator<P>,
    view: MapViewController,
    ward_layer: Option<WardLayer>,
    cluster_group: Option<ClusterGroup>,
    search_index: SearchIndex,
    query: String,
    /// The viewport fits to the data exactly once, on the first snapshot
    /// with usable bounds. Later refreshes never move the camera.
    fitted: bool,
    /// Snapshot version the layers were last built from.
    applied_version: u64,
}

impl<P> MapSession<P> {
    pub fn new(provider: P, refetch_delay: Duration) -> Self {
        MapSession {
            orchestrator: Orchestrator::new(provider, refetch_delay),
            view: MapViewController::new(),
            ward_layer: None,
            cluster_group: None,
            search_index: SearchIndex::default(),
            query: String::new(),
            fitted: false,
            applied_version: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> FetchPhase {
        self.orchestrator.phase()
    }

    #[must_use]
    pub fn banner(&self) -> Option<&Banner> {
        self.orchestrator.banner()
    }

    pub fn dismiss_banner(&mut self) {
        self.orchestrator.dismiss_banner();
    }

    #[must_use]
    pub fn summary(&self) -> Option<&Summary> {
        self.orchestrator.snapshot().summary.as_ref()
    }

    #[must_use]
    pub fn view(&self) -> &MapViewController {
        &self.view
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        self.view.state()
    }

    #[must_use]
    pub fn ward_layer(&self) -> Option<&WardLayer> {
        self.ward_layer.as_ref()
    }

    #[must_use]
    pub fn cluster_group(&self) -> Option<&ClusterGroup> {
        self.cluster_group.as_ref()
    }

    /// Takes all pending viewport instructions, oldest first.
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        self.view.drain_events()
    }

    // -- interactions -----------------------------------------------------

    /// Records the ward selection and asks the host to open the detail
    /// view. A click on a ward that is not currently rendered is ignored.
    pub fn click_ward(&mut self, ward_id: &str) {
        let Some(name) = self
            .ward_layer
            .as_ref()
            .and_then(|layer| layer.get(ward_id))
            .map(|polygon| polygon.ward_name.clone())
        else {
            return;
        };
        self.view.select_ward(ward_id, &name);
    }

    pub fn clear_selected_ward(&mut self) {
        self.view.clear_selected_ward();
    }

    /// Style to apply while the pointer is over `ward_id`.
    #[must_use]
    pub fn hover_ward(&self, ward_id: &str) -> Option<PolygonStyle> {
        self.ward_layer
            .as_ref()?
            .get(ward_id)
            .map(hover_style)
    }

    /// Style to restore on pointer-leave; the polygon's resting style, no
    /// recomputation from data.
    #[must_use]
    pub fn unhover_ward(&self, ward_id: &str) -> Option<PolygonStyle> {
        self.ward_layer
            .as_ref()?
            .get(ward_id)
            .map(|polygon| polygon.base_style)
    }

    /// Records the live query text and returns the matches for it.
    pub fn search(&mut self, query: &str) -> Vec<SearchResult> {
        self.query = query.to_owned();
        self.search_index.search(query)
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Flies the viewport to a picked result and clears the query.
    pub fn select_search_result(&mut self, result: &SearchResult) {
        self.query.clear();
        self.view.fly_to(result.lat, result.lon, SEARCH_RESULT_ZOOM);
    }

    pub fn cycle_base_layer(&mut self) {
        self.view.cycle_base_layer();
    }

    pub fn toggle_fullscreen(&mut self) {
        self.view.toggle_fullscreen();
    }

    pub fn notify_container_resized(&mut self) {
        self.view.notify_container_resized();
    }

    pub fn reset_view(&mut self) {
        self.view.reset_view();
    }

    /// Host reports a zoom change. Clustering is zoom-dependent, so the
    /// cluster group rebuilds; the ward layer is untouched.
    pub fn notify_zoom_changed(&mut self, zoom: u8) {
        if self.view.set_zoom(zoom) {
            self.rebuild_cluster_group();
        }
    }

    pub fn set_show_wards(&mut self, show: bool) {
        if self.view.set_show_wards(show) {
            self.rebuild_ward_layer();
        }
    }

    pub fn set_show_stations(&mut self, show: bool) {
        if self.view.set_show_stations(show) {
            self.rebuild_cluster_group();
        }
    }

    /// Narrows both layers to the AQI range; entities filtered out are
    /// removed from the map, not just dimmed.
    pub fn set_aqi_filter(&mut self, min: f64, max: f64) {
        if self.view.set_aqi_filter(min, max) {
            self.rebuild_ward_layer();
            self.rebuild_cluster_group();
        }
    }

    // -- layer lifecycle --------------------------------------------------

    fn rebuild_ward_layer(&mut self) {
        // Remove before install.
        self.ward_layer = None;
        if !self.view.state().show_wards {
            return;
        }
        let Some(wards) = self.orchestrator.snapshot().wards.clone() else {
            return;
        };
        let (layer, errors) = WardLayer::build(&wards, self.view.state().aqi_filter);
        self.ward_layer = Some(layer);
        if !errors.is_empty() {
            self.orchestrator.report_render_errors(&errors);
        }
    }

    fn rebuild_cluster_group(&mut self) {
        self.cluster_group = None;
        if !self.view.state().show_stations {
            return;
        }
        let stations = self.orchestrator.snapshot().stations.clone();
        let (group, errors) = ClusterGroup::build(
            &stations,
            self.view.zoom(),
            self.view.state().aqi_filter,
        );
        self.cluster_group = Some(group);
        if !errors.is_empty() {
            self.orchestrator.report_render_errors(&errors);
        }
    }

    /// Brings layers, search index, and the one-time viewport fit in line
    /// with the orchestrator's snapshot. No-op when the snapshot version
    /// has not moved.
    fn sync_layers(&mut self) {
        if self.orchestrator.data_version() == self.applied_version {
            return;
        }
        self.applied_version = self.orchestrator.data_version();

        self.rebuild_ward_layer();
        self.rebuild_cluster_group();

        let snapshot = self.orchestrator.snapshot();
        self.search_index = SearchIndex::build(snapshot.wards.as_ref(), &snapshot.stations);

        if !self.fitted {
            if let Some(bounds) = self.data_bounds() {
                self.view.fit_bounds(bounds);
                self.fitted = true;
            }
        }
    }

    /// Ward bounds when a ward layer exists, station extent otherwise.
    fn data_bounds(&self) -> Option<Bounds> {
        if let Some(bounds) = self.ward_layer.as_ref().and_then(WardLayer::bounds) {
            return Some(bounds);
        }
        let snapshot = self.orchestrator.snapshot();
        Bounds::from_points(snapshot.stations.iter().map(|s| LngLat {
            lng: s.lon,
            lat: s.lat,
        }))
    }
}

impl<P: DataProvider> MapSession<P> {
    /// Loads the first dataset and builds the initial layers.
    pub async fn initial_load(&mut self) -> bool {
        let installed = self.orchestrator.initial_load().await;
        self.sync_layers();
        installed
    }

    /// Manual refresh; layers rebuild only when a new snapshot landed.
    pub async fn refresh(&mut self) -> bool {
        let installed = self.orchestrator.refresh().await;
        self.sync_layers();
        installed
    }

    /// Fires the recompute trigger; on acceptance the delayed refetch has
    /// already completed by the time this returns, so layers sync here.
    pub async fn trigger_recompute(&mut self) -> bool {
        let installed = self.orchestrator.trigger_recompute().await;
        self.sync_layers();
        installed
    }
}
