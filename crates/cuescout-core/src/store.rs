//! Collaborator interfaces consumed by the discovery engine.
//!
//! The engine reads tournaments and venues through [`TournamentStore`] and
//! resolves free-text addresses through [`Geocoder`]; production backends
//! live in `cuescout-db` and `cuescout-geocode`, tests substitute in-memory
//! fakes.

use std::future::Future;

use thiserror::Error;

use crate::filter::PredicateSet;
use crate::types::{Coordinates, Tournament, Venue};

/// Failure of the persistence collaborator. Fatal to the current discovery
/// call; no partial results are returned past it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl StoreError {
    /// Wraps an arbitrary backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

/// Failure of the external geocoding provider. Callers treat it the same as
/// "no result": logged, not retried within the same discovery call, never
/// cached.
#[derive(Debug, Clone, Error)]
#[error("geocoding provider error: {0}")]
pub struct ProviderError(pub String);

/// Read access to the tournament/venue store.
pub trait TournamentStore: Send + Sync {
    /// Fetches all candidate tournaments satisfying the compiled predicates,
    /// in the store's stable order.
    fn fetch_tournaments(
        &self,
        predicates: &PredicateSet,
    ) -> impl Future<Output = Result<Vec<Tournament>, StoreError>> + Send;

    /// Looks up a venue by id. `Ok(None)` when no such venue exists.
    fn fetch_venue(
        &self,
        venue_id: i64,
    ) -> impl Future<Output = Result<Option<Venue>, StoreError>> + Send;
}

/// Forward geocoding of a free-text address.
pub trait Geocoder: Send + Sync {
    /// Resolves an address to coordinates. `Ok(None)` means the provider
    /// answered but found nothing.
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Option<Coordinates>, ProviderError>> + Send;
}
