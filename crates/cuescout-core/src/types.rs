//! Domain types shared across the workspace.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::filter::FilterSpec;

/// A validated geographic coordinate pair.
///
/// Construct through [`Coordinates::checked`]; out-of-range values from any
/// upstream source must never survive as a `Coordinates`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Builds a coordinate pair, rejecting values outside
    /// (-90..=90, -180..=180) or non-finite floats.
    #[must_use]
    pub fn checked(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }

    /// Builds a coordinate pair from two optional fields, treating a missing
    /// half or an out-of-range value as absent.
    #[must_use]
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        Self::checked(lat?, lng?)
    }
}

/// A tournament record as exposed by the persistence layer.
///
/// Venue location is denormalized three ways (relational `venue_id` link,
/// inline `venue_lat`/`venue_lng`, free-text `venue` address); any or all
/// of them may be unpopulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: i64,
    pub name: String,
    /// Free-text venue name/address as entered by the operator.
    pub venue: String,
    /// Link to a `Venue` record. Upstream data uses both `NULL` and `-1`
    /// for "no link"; consumers must go through [`Tournament::linked_venue_id`].
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

impl Tournament {
    /// The linked venue id, with both sentinel conventions (`NULL` and any
    /// non-positive id such as `-1`) folded into `None`.
    #[must_use]
    pub fn linked_venue_id(&self) -> Option<i64> {
        self.venue_id.filter(|id| *id >= 1)
    }

    /// Inline coordinates, validated. `None` when either half is missing or
    /// out of range.
    #[must_use]
    pub fn inline_coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.venue_lat, self.venue_lng)
    }
}

/// A venue record. Absent coordinates are a valid, expected state and
/// trigger the geocoding fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Venue {
    /// Stored coordinates, validated. Out-of-range values are treated as
    /// absent rather than propagated.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

/// Radius constraint around a reference point, in miles. Inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFilter {
    pub origin: Coordinates,
    pub radius_miles: f64,
}

/// One discovery request: filter criteria plus an optional radius constraint.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRequest {
    pub filter: FilterSpec,
    pub near: Option<RadiusFilter>,
}

/// A single matched tournament with whatever location data could be resolved.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryHit {
    pub tournament: Tournament,
    /// Resolved venue coordinates; `None` when all resolution strategies
    /// were exhausted.
    pub coordinates: Option<Coordinates>,
    /// Distance from the request's reference point; only computed when a
    /// radius filter is present.
    pub distance_miles: Option<f64>,
}
