//! Shared domain types, station registry, configuration and the pure
//! ranking pipeline for fuelwatch.

pub mod app_config;
pub mod config;
pub mod model;
pub mod payload;
pub mod pricing;
pub mod stations;

pub use app_config::{AppConfig, CacheMode, Discount, SourceKind};
pub use config::{load_app_config, load_app_config_from_env};
pub use model::{
    Brand, BrandRecord, GradeVariant, Payload, PriceObservation, Station, StationId,
    StationObservations,
};
pub use payload::{assemble, empty_payload};
pub use pricing::{aggregate, rank};
pub use stations::{default_registry, load_stations, resolve_registry};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read stations file {path}: {source}")]
    StationsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse stations file: {0}")]
    StationsFileParse(#[source] serde_yaml::Error),

    #[error("stations validation failed: {0}")]
    Validation(String),
}
