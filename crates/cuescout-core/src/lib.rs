//! Shared domain model for the cuescout tournament discovery engine:
//! tournament/venue types, the filter compiler, the distance evaluator,
//! collaborator traits, and application configuration.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod distance;
pub mod filter;
pub mod store;
pub mod types;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use distance::{distance_miles, within_radius, EARTH_RADIUS_MILES};
pub use filter::{compile, normalize_term, FilterSpec, FlagField, Predicate, PredicateSet, TextField};
pub use store::{Geocoder, ProviderError, StoreError, TournamentStore};
pub use types::{
    Coordinates, DiscoveryHit, DiscoveryRequest, RadiusFilter, Tournament, Venue,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
