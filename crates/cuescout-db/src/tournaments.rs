//! Read operations for the `tournaments` table.
//!
//! The candidate fetch is a single predicate-driven query: every compiled
//! clause becomes a `WHERE` conjunct, so the store does the filtering and
//! callers never re-filter beyond what radius evaluation requires.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use cuescout_core::{Predicate, PredicateSet, Tournament};

/// A row from the `tournaments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TournamentRow {
    pub id: i64,
    pub name: String,
    pub venue: String,
    pub venue_id: Option<i64>,
    pub venue_lat: Option<f64>,
    pub venue_lng: Option<f64>,
    pub game_type: Option<String>,
    pub format: Option<String>,
    pub equipment: Option<String>,
    pub skill_level: Option<String>,
    pub entry_fee: Option<Decimal>,
    pub scheduled_date: NaiveDate,
    pub reports_to_fargo: bool,
    pub handicapped: bool,
}

impl From<TournamentRow> for Tournament {
    fn from(row: TournamentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            venue: row.venue,
            venue_id: row.venue_id,
            venue_lat: row.venue_lat,
            venue_lng: row.venue_lng,
            game_type: row.game_type,
            format: row.format,
            equipment: row.equipment,
            skill_level: row.skill_level,
            entry_fee: row.entry_fee,
            scheduled_date: row.scheduled_date,
            reports_to_fargo: row.reports_to_fargo,
            handicapped: row.handicapped,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, venue, venue_id, venue_lat, venue_lng, \
     game_type, format, equipment, skill_level, entry_fee, scheduled_date, \
     reports_to_fargo, handicapped \
     FROM tournaments";

/// Fetch all tournaments satisfying the compiled predicates.
///
/// Results are ordered by `scheduled_date ASC, id ASC` — the stable order
/// discovery preserves when no radius filter is active.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn fetch_tournaments(
    pool: &PgPool,
    predicates: &PredicateSet,
) -> Result<Vec<TournamentRow>, sqlx::Error> {
    let mut query = QueryBuilder::new(SELECT_COLUMNS);
    push_predicates(&mut query, predicates);
    query.push(" ORDER BY scheduled_date ASC, id ASC");
    query
        .build_query_as::<TournamentRow>()
        .fetch_all(pool)
        .await
}

/// Translate compiled predicates into `WHERE` conjuncts.
///
/// Text comparisons mirror the compiler's normalization: the bound value is
/// already trimmed and case-folded, so the column side is wrapped in
/// `LOWER(TRIM(...))`.
fn push_predicates(query: &mut QueryBuilder<'_, Postgres>, predicates: &PredicateSet) {
    let mut separator = " WHERE ";
    for predicate in predicates {
        query.push(separator);
        separator = " AND ";
        match predicate {
            Predicate::NameContains(needle) => {
                query
                    .push("name ILIKE ")
                    .push_bind(format!("%{}%", escape_like(needle)))
                    .push(" ESCAPE '\\'");
            }
            Predicate::TextEquals { field, value } => {
                query
                    .push(format!("LOWER(TRIM({})) = ", field.column()))
                    .push_bind(value.clone());
            }
            Predicate::ScheduledOnOrAfter(date) => {
                query.push("scheduled_date >= ").push_bind(*date);
            }
            Predicate::ScheduledOnOrBefore(date) => {
                query.push("scheduled_date <= ").push_bind(*date);
            }
            Predicate::EntryFeeAtMost(limit) => {
                query
                    .push("entry_fee IS NOT NULL AND entry_fee <= ")
                    .push_bind(*limit);
            }
            Predicate::FlagIs { field, value } => {
                query
                    .push(format!("{} = ", field.column()))
                    .push_bind(*value);
            }
        }
    }
}

/// Escapes `ILIKE` metacharacters in a user-supplied needle so it matches
/// literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
