pub mod app_config;
pub mod config;
pub mod geo;
pub mod provider;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{distance_km, BoundingBox, GeoPoint, Viewport, EARTH_RADIUS_KM, KM_PER_DEGREE};
pub use provider::{Provider, ProviderLocation};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid coordinate ({lat}, {lng}): latitude must be within [-90, 90] and longitude within [-180, 180]")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("invalid viewport: {0}")]
    InvalidViewport(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
