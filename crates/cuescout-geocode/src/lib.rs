//! Geocoding support for tournament discovery: a Nominatim-shaped provider
//! client, provider rate limiting, and the process-scoped geocode cache
//! with per-address single-flight.

mod cache;
mod client;
mod error;
mod rate_limit;

pub use cache::{normalize_address, CachingGeocoder};
pub use client::NominatimClient;
pub use error::GeocodeError;
pub use rate_limit::RateLimiter;
