//! Read operations for the `venues` table.

use sqlx::PgPool;

use cuescout_core::Venue;

/// A row from the `venues` table. Coordinates are nullable; rows without
/// them are the expected trigger for the geocoding fallback.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VenueRow {
    pub id: i64,
    pub name: String,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<VenueRow> for Venue {
    fn from(row: VenueRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address_line1: row.address_line1,
            city: row.city,
            state: row.state,
            zip: row.zip,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

/// Look up a venue by id. `Ok(None)` when no such venue exists.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn fetch_venue(pool: &PgPool, venue_id: i64) -> Result<Option<VenueRow>, sqlx::Error> {
    sqlx::query_as::<_, VenueRow>(
        "SELECT id, name, address_line1, city, state, zip, \
                latitude::float8 AS latitude, longitude::float8 AS longitude \
         FROM venues \
         WHERE id = $1",
    )
    .bind(venue_id)
    .fetch_optional(pool)
    .await
}
