//! HTTP client for a Nominatim-shaped geocoding endpoint.
//!
//! Wraps `reqwest` with timeout/user-agent configuration, response
//! deserialization, and provider rate limiting. The provider returns a JSON
//! array of places with string `lat`/`lon` fields; the first element is
//! taken as the match.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use cuescout_core::{Coordinates, Geocoder, ProviderError};

use crate::error::GeocodeError;
use crate::rate_limit::RateLimiter;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/";

/// Client for a Nominatim-compatible `/search` endpoint.
///
/// Use [`NominatimClient::new`] for production or
/// [`NominatimClient::with_base_url`] to point at a mock server in tests.
pub struct NominatimClient {
    client: Client,
    base_url: Url,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

impl NominatimClient {
    /// Creates a client pointed at the public Nominatim API.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        min_interval_ms: u64,
        user_agent: &str,
    ) -> Result<Self, GeocodeError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, min_interval_ms, user_agent)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        min_interval_ms: u64,
        user_agent: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise: exactly one trailing slash so join() appends the path
        // segment instead of replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|e| GeocodeError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            limiter: RateLimiter::new(Duration::from_millis(min_interval_ms)),
        })
    }

    /// Forward-geocodes a free-text address.
    ///
    /// Returns `Ok(None)` when the provider answers with no places, or when
    /// the first place carries unparseable or out-of-range coordinates.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::Http`] on network failure.
    /// - [`GeocodeError::UnexpectedStatus`] on a non-2xx response.
    /// - [`GeocodeError::Deserialize`] if the body is not a place array.
    pub async fn search(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = self
            .base_url
            .join("search")
            .map_err(|e| GeocodeError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        self.limiter.acquire().await;

        let response = self
            .client
            .get(url.clone())
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let places: Vec<NominatimPlace> =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
                context: format!("search(q={address})"),
                source: e,
            })?;

        let Some(place) = places.into_iter().next() else {
            tracing::debug!(address, "geocoder returned no places");
            return Ok(None);
        };

        let parsed = place
            .lat
            .parse::<f64>()
            .ok()
            .zip(place.lon.parse::<f64>().ok())
            .and_then(|(lat, lng)| Coordinates::checked(lat, lng));

        if parsed.is_none() {
            tracing::warn!(
                address,
                lat = %place.lat,
                lon = %place.lon,
                display_name = %place.display_name,
                "geocoder place has unusable coordinates"
            );
        }
        Ok(parsed)
    }
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, ProviderError> {
        self.search(address)
            .await
            .map_err(|e| ProviderError(e.to_string()))
    }
}
