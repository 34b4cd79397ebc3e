//! [`TournamentStore`] implementation backed by the Postgres pool.

use sqlx::PgPool;

use cuescout_core::{PredicateSet, StoreError, Tournament, TournamentStore, Venue};

use crate::{tournaments, venues};

/// Postgres-backed tournament store. Cheap to clone; wraps the shared pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TournamentStore for PgStore {
    async fn fetch_tournaments(
        &self,
        predicates: &PredicateSet,
    ) -> Result<Vec<Tournament>, StoreError> {
        let rows = tournaments::fetch_tournaments(&self.pool, predicates)
            .await
            .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Tournament::from).collect())
    }

    async fn fetch_venue(&self, venue_id: i64) -> Result<Option<Venue>, StoreError> {
        let row = venues::fetch_venue(&self.pool, venue_id)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.map(Venue::from))
    }
}
