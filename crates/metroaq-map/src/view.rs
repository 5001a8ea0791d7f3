//! Viewport and layer-visibility state.
//!
//! The controller owns `ViewState` exclusively and communicates with the
//! host map widget through drained [`MapEvent`]s instead of ambient
//! globals. View state persists across fetch cycles; only `reset_view`
//! restores the defaults.

use metroaq_core::{Bounds, LngLat};

/// Fixed default center and zoom, independent of loaded data.
pub const DEFAULT_CENTER: LngLat = LngLat {
    lng: 77.209,
    lat: 28.6139,
};
pub const DEFAULT_ZOOM: u8 = 11;

/// The fixed, ordered set of selectable base tile styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseLayer {
    CartoPositron,
    OpenStreetMap,
    CartoDarkMatter,
}

impl BaseLayer {
    /// Cycle order; wraps around after the last style.
    const ORDER: [BaseLayer; 3] = [
        BaseLayer::CartoPositron,
        BaseLayer::OpenStreetMap,
        BaseLayer::CartoDarkMatter,
    ];

    #[must_use]
    pub fn next(self) -> Self {
        let index = Self::ORDER.iter().position(|l| *l == self).unwrap_or(0);
        Self::ORDER[(index + 1) % Self::ORDER.len()]
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            BaseLayer::CartoPositron => "Light",
            BaseLayer::OpenStreetMap => "Street Map",
            BaseLayer::CartoDarkMatter => "Dark Mode",
        }
    }
}

/// Viewport/layer state owned exclusively by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub selected_ward_id: Option<String>,
    pub selected_layer: BaseLayer,
    pub is_fullscreen: bool,
    pub aqi_filter: (f64, f64),
    pub show_wards: bool,
    pub show_stations: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            selected_ward_id: None,
            selected_layer: BaseLayer::CartoPositron,
            is_fullscreen: false,
            aqi_filter: (0.0, 500.0),
            show_wards: true,
            show_stations: true,
        }
    }
}

/// An instruction for the host map widget, drained in order.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Fit the viewport to the given bounds.
    FitBounds(Bounds),
    /// Animate to a point at a zoom level.
    FlyTo { lat: f64, lng: f64, zoom: u8 },
    /// Enter (true) or leave (false) platform fullscreen on the container.
    RequestFullscreen(bool),
    /// Re-measure the container; dimensions and hit-testing are invalid
    /// until this runs.
    InvalidateSize,
    /// Switch the active base tile style.
    BaseLayerChanged(BaseLayer),
    /// Open the external ward-detail view.
    OpenWardDetail { ward_id: String, ward_name: String },
}

/// Owns viewport state and the outgoing event queue.
#[derive(Debug, Default)]
pub struct MapViewController {
    state: ViewState,
    center: Option<LngLat>,
    zoom: Option<u8>,
    events: Vec<MapEvent>,
}

impl MapViewController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    #[must_use]
    pub fn center(&self) -> LngLat {
        self.center.unwrap_or(DEFAULT_CENTER)
    }

    #[must_use]
    pub fn zoom(&self) -> u8 {
        self.zoom.unwrap_or(DEFAULT_ZOOM)
    }

    /// Takes all pending events, oldest first.
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advances to the next base style in the fixed cycle.
    pub fn cycle_base_layer(&mut self) -> BaseLayer {
        let next = self.state.selected_layer.next();
        self.state.selected_layer = next;
        self.events.push(MapEvent::BaseLayerChanged(next));
        next
    }

    /// Requests the platform fullscreen transition and forces the layout
    /// re-measurement the transition invalidates.
    pub fn toggle_fullscreen(&mut self) {
        self.state.is_fullscreen = !self.state.is_fullscreen;
        self.events
            .push(MapEvent::RequestFullscreen(self.state.is_fullscreen));
        self.events.push(MapEvent::InvalidateSize);
    }

    /// Container geometry changed (sidebar shown/hidden, window resize).
    /// Needs the same re-measurement as a fullscreen transition.
    pub fn notify_container_resized(&mut self) {
        self.events.push(MapEvent::InvalidateSize);
    }

    pub fn fit_bounds(&mut self, bounds: Bounds) {
        self.center = Some(bounds.center());
        self.events.push(MapEvent::FitBounds(bounds));
    }

    /// Host reports a zoom change (wheel, pinch). Nothing is echoed back
    /// out; returns true when the level actually changed.
    pub fn set_zoom(&mut self, zoom: u8) -> bool {
        let changed = self.zoom != Some(zoom);
        self.zoom = Some(zoom);
        changed
    }

    pub fn fly_to(&mut self, lat: f64, lng: f64, zoom: u8) {
        self.center = Some(LngLat { lng, lat });
        self.zoom = Some(zoom);
        self.events.push(MapEvent::FlyTo { lat, lng, zoom });
    }

    /// Restores the fixed default center/zoom and clears the selection.
    /// Independent of whatever data is loaded.
    pub fn reset_view(&mut self) {
        self.center = Some(DEFAULT_CENTER);
        self.zoom = Some(DEFAULT_ZOOM);
        self.state.selected_ward_id = None;
        self.events.push(MapEvent::FlyTo {
            lat: DEFAULT_CENTER.lat,
            lng: DEFAULT_CENTER.lng,
            zoom: DEFAULT_ZOOM,
        });
    }

    /// Records the selection and asks the host to open the external
    /// ward-detail view.
    pub fn select_ward(&mut self, ward_id: &str, ward_name: &str) {
        self.state.selected_ward_id = Some(ward_id.to_owned());
        self.events.push(MapEvent::OpenWardDetail {
            ward_id: ward_id.to_owned(),
            ward_name: ward_name.to_owned(),
        });
    }

    pub fn clear_selected_ward(&mut self) {
        self.state.selected_ward_id = None;
    }

    /// Returns true when the value changed (callers rebuild layers then).
    pub fn set_show_wards(&mut self, show: bool) -> bool {
        let changed = self.state.show_wards != show;
        self.state.show_wards = show;
        changed
    }

    pub fn set_show_stations(&mut self, show: bool) -> bool {
        let changed = self.state.show_stations != show;
        self.state.show_stations = show;
        changed
    }

    pub fn set_aqi_filter(&mut self, min: f64, max: f64) -> bool {
        let clamped = (min.max(0.0), max.max(min.max(0.0)));
        let changed = self.state.aqi_filter != clamped;
        self.state.aqi_filter = clamped;
        changed
    }
}
