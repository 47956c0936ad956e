pub mod app_config;
pub mod config;
pub mod facets;
pub mod fallback;
pub mod filter;
pub mod geojson;
pub mod location;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use facets::{facets, ElevationSpan, FacetValue, Facets};
pub use fallback::{fallback_locations, load_fallback_file, validate_locations};
pub use filter::{
    evaluate, find_by_id, FilterSpec, SearchScope, DEFAULT_MAX_ELEVATION, DEFAULT_MIN_ELEVATION,
};
pub use geojson::{to_feature_collection, Feature, FeatureCollection, FeatureProperties};
pub use location::{Link, Location, LocationType};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read fallback file {path}: {source}")]
    FallbackFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fallback file: {0}")]
    FallbackFileParse(#[source] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
