//! Discovery orchestration.
//!
//! Compiles the filter, runs the single candidate fetch, resolves venue
//! coordinates per candidate, applies radius filtering/sorting, and
//! enforces the supersession contract: each request carries a per-session
//! monotonically increasing sequence number, and a response whose sequence
//! is no longer the latest issued is reported as superseded instead of
//! being handed to the caller.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use cuescout_core::{
    compile, distance_miles, within_radius, DiscoveryHit, DiscoveryRequest, Geocoder, StoreError,
    TournamentStore,
};

use crate::resolver::resolve_venue;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("tournament fetch failed: {0}")]
    Fetch(#[from] StoreError),
}

/// Result of one discovery call.
#[derive(Debug)]
pub enum DiscoveryOutcome {
    /// This call's request was still the latest when it completed.
    Fresh(Vec<DiscoveryHit>),
    /// A newer request was issued while this one was in flight; the stale
    /// result is withheld. Not an error.
    Superseded,
}

impl DiscoveryOutcome {
    /// The hits, when fresh.
    #[must_use]
    pub fn hits(&self) -> Option<&[DiscoveryHit]> {
        match self {
            Self::Fresh(hits) => Some(hits),
            Self::Superseded => None,
        }
    }
}

/// One coordinator per logical consumer session. Holds the injected
/// collaborators plus the session's request sequence counter.
pub struct DiscoveryCoordinator<S, G> {
    store: S,
    geocoder: G,
    latest_seq: AtomicU64,
}

impl<S, G> DiscoveryCoordinator<S, G>
where
    S: TournamentStore,
    G: Geocoder,
{
    pub fn new(store: S, geocoder: G) -> Self {
        Self {
            store,
            geocoder,
            latest_seq: AtomicU64::new(0),
        }
    }

    /// Runs one discovery request.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Fetch`] when the persistence fetch fails;
    /// no partial results are returned.
    pub async fn discover(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<DiscoveryOutcome, DiscoveryError> {
        let seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let predicates = compile(&request.filter);
        tracing::debug!(seq, clauses = predicates.len(), "compiled filter spec");

        let candidates = self.store.fetch_tournaments(&predicates).await?;
        tracing::debug!(seq, candidates = candidates.len(), "fetched candidates");

        // Skip venue resolution when the response is already stale.
        if self.superseded(seq) {
            tracing::debug!(seq, "request superseded during fetch");
            return Ok(DiscoveryOutcome::Superseded);
        }

        let mut hits = Vec::with_capacity(candidates.len());
        for tournament in candidates {
            let coordinates = resolve_venue(&self.store, &self.geocoder, &tournament).await;
            hits.push(DiscoveryHit {
                tournament,
                coordinates,
                distance_miles: None,
            });
        }

        if let Some(near) = request.near {
            // Candidates without resolved coordinates cannot be distance
            // checked and are excluded while a radius filter is active.
            hits.retain_mut(|hit| {
                let Some(coords) = hit.coordinates else {
                    return false;
                };
                let distance = distance_miles(near.origin, coords);
                hit.distance_miles = Some(distance);
                within_radius(distance, near.radius_miles)
            });
            hits.sort_by(|a, b| {
                a.distance_miles
                    .partial_cmp(&b.distance_miles)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        if self.superseded(seq) {
            tracing::debug!(seq, "request superseded during resolution");
            return Ok(DiscoveryOutcome::Superseded);
        }
        tracing::debug!(seq, hits = hits.len(), "discovery complete");
        Ok(DiscoveryOutcome::Fresh(hits))
    }

    fn superseded(&self, seq: u64) -> bool {
        self.latest_seq.load(Ordering::SeqCst) != seq
    }
}
