//! Headless map engine: choropleth rendering, marker clustering, name
//! search, refresh/recompute orchestration, and viewport state.
//!
//! Nothing here draws pixels. Layers, styles, icons, and viewport changes
//! are plain values plus a [`view::MapEvent`] stream; a host UI drains the
//! events and renders the current layer handles however it likes.

pub mod choropleth;
pub mod cluster;
pub mod error;
pub mod orchestrator;
pub mod search;
pub mod session;
pub mod view;

pub use choropleth::{PolygonStyle, WardLayer, WardPolygon};
pub use cluster::{ClusterGroup, ClusterNode, ClusterTier, MarkerIcon, StationMarker};
pub use error::RenderError;
pub use orchestrator::{Banner, DataProvider, FetchPhase, Orchestrator, Snapshot};
pub use search::SearchIndex;
pub use session::MapSession;
pub use view::{BaseLayer, MapEvent, MapViewController, ViewState};
