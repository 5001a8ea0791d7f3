pub mod app_config;
pub mod aqi;
pub mod config;
pub mod model;

pub use app_config::{AppConfig, Environment};
pub use aqi::{classify, AqiCategory, AqiClass};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use model::{
    Bounds, EntityKind, FeatureCollection, LngLat, Pollutants, SearchResult, Station, Summary,
    WardFeature, WardProperties,
};
