//! Venue coordinate resolution.
//!
//! Three independent sources of truth exist for a tournament's location
//! (relational venue link, denormalized inline fields, free-text address)
//! because of incremental schema evolution. Resolution tries them in
//! priority order and returns the first success; exhausting all of them is
//! a valid outcome, never an error.

use cuescout_core::{Coordinates, Geocoder, Tournament, TournamentStore};

/// Resolve a tournament's venue to authoritative coordinates.
///
/// Strategy order (first success wins):
/// 1. linked venue record with valid stored coordinates,
/// 2. inline `venue_lat`/`venue_lng` on the tournament itself,
/// 3. geocoded free-text venue address (through the caller's geocoder,
///    which is expected to carry the cache/single-flight layer).
///
/// Out-of-range coordinates from any source are treated as absent. A store
/// failure during the venue lookup is logged and falls through to the next
/// strategy; venue resolution is never fatal to a discovery call.
pub async fn resolve_venue<S, G>(store: &S, geocoder: &G, tournament: &Tournament) -> Option<Coordinates>
where
    S: TournamentStore,
    G: Geocoder,
{
    // Strategy 1: linked venue record
    if let Some(venue_id) = tournament.linked_venue_id() {
        match store.fetch_venue(venue_id).await {
            Ok(Some(venue)) => {
                if let Some(coords) = venue.coordinates() {
                    tracing::debug!(
                        tournament_id = tournament.id,
                        venue_id,
                        "resolved coordinates from linked venue"
                    );
                    return Some(coords);
                }
                tracing::debug!(
                    tournament_id = tournament.id,
                    venue_id,
                    "linked venue has no usable coordinates"
                );
            }
            Ok(None) => {
                tracing::debug!(
                    tournament_id = tournament.id,
                    venue_id,
                    "venue link points at a missing record"
                );
            }
            Err(err) => {
                tracing::warn!(
                    tournament_id = tournament.id,
                    venue_id,
                    error = %err,
                    "venue lookup failed; falling through to inline coordinates"
                );
            }
        }
    }

    // Strategy 2: inline coordinates on the tournament row
    if let Some(coords) = tournament.inline_coordinates() {
        tracing::debug!(
            tournament_id = tournament.id,
            "resolved coordinates from inline fields"
        );
        return Some(coords);
    }

    // Strategy 3: geocode the free-text venue address
    match geocoder.geocode(&tournament.venue).await {
        Ok(Some(coords)) => {
            tracing::debug!(
                tournament_id = tournament.id,
                venue = %tournament.venue,
                "resolved coordinates by geocoding"
            );
            Some(coords)
        }
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(
                tournament_id = tournament.id,
                venue = %tournament.venue,
                error = %err,
                "geocoding failed; leaving coordinates unresolved"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::NaiveDate;
    use cuescout_core::{PredicateSet, ProviderError, StoreError, Venue};

    struct FakeStore {
        venues: HashMap<i64, Venue>,
        fail_venue_lookup: bool,
    }

    impl FakeStore {
        fn empty() -> Self {
            Self {
                venues: HashMap::new(),
                fail_venue_lookup: false,
            }
        }

        fn with_venue(venue: Venue) -> Self {
            let mut venues = HashMap::new();
            venues.insert(venue.id, venue);
            Self {
                venues,
                fail_venue_lookup: false,
            }
        }
    }

    impl TournamentStore for FakeStore {
        async fn fetch_tournaments(
            &self,
            _predicates: &PredicateSet,
        ) -> Result<Vec<Tournament>, StoreError> {
            Ok(vec![])
        }

        async fn fetch_venue(&self, venue_id: i64) -> Result<Option<Venue>, StoreError> {
            if self.fail_venue_lookup {
                return Err(StoreError::backend(std::io::Error::other("pool exhausted")));
            }
            Ok(self.venues.get(&venue_id).cloned())
        }
    }

    struct FakeGeocoder {
        result: Option<Coordinates>,
        calls: AtomicU32,
    }

    impl FakeGeocoder {
        fn returning(result: Option<Coordinates>) -> Self {
            Self {
                result,
                calls: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result)
        }
    }

    fn venue(id: i64, latitude: Option<f64>, longitude: Option<f64>) -> Venue {
        Venue {
            id,
            name: "Bull Shooters".to_string(),
            address_line1: Some("3744 W Peoria Ave".to_string()),
            city: Some("Phoenix".to_string()),
            state: Some("AZ".to_string()),
            zip: Some("85029".to_string()),
            latitude,
            longitude,
        }
    }

    fn tournament() -> Tournament {
        Tournament {
            id: 10,
            name: "Weekly 8-Ball".to_string(),
            venue: "Bull Shooters, Phoenix AZ".to_string(),
            venue_id: None,
            venue_lat: None,
            venue_lng: None,
            game_type: Some("8-Ball".to_string()),
            format: None,
            equipment: None,
            skill_level: None,
            entry_fee: None,
            scheduled_date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            reports_to_fargo: false,
            handicapped: false,
        }
    }

    fn stored() -> Coordinates {
        Coordinates::checked(33.5795, -112.1188).unwrap()
    }

    fn inline() -> Coordinates {
        Coordinates::checked(33.6598, -112.1806).unwrap()
    }

    fn geocoded() -> Coordinates {
        Coordinates::checked(33.4484, -112.0740).unwrap()
    }

    #[tokio::test]
    async fn linked_venue_wins_over_inline_and_geocoding() {
        let store = FakeStore::with_venue(venue(5, Some(33.5795), Some(-112.1188)));
        let geocoder = FakeGeocoder::returning(Some(geocoded()));
        let mut t = tournament();
        t.venue_id = Some(5);
        t.venue_lat = Some(inline().lat);
        t.venue_lng = Some(inline().lng);

        let resolved = resolve_venue(&store, &geocoder, &t).await;
        assert_eq!(resolved, Some(stored()));
        assert_eq!(geocoder.call_count(), 0, "geocoder must not be consulted");
    }

    #[tokio::test]
    async fn venue_without_coordinates_falls_through_to_inline() {
        let store = FakeStore::with_venue(venue(5, None, None));
        let geocoder = FakeGeocoder::returning(Some(geocoded()));
        let mut t = tournament();
        t.venue_id = Some(5);
        t.venue_lat = Some(inline().lat);
        t.venue_lng = Some(inline().lng);

        assert_eq!(resolve_venue(&store, &geocoder, &t).await, Some(inline()));
    }

    #[tokio::test]
    async fn out_of_range_venue_coordinates_are_absent() {
        let store = FakeStore::with_venue(venue(5, Some(133.0), Some(-112.1188)));
        let geocoder = FakeGeocoder::returning(None);
        let mut t = tournament();
        t.venue_id = Some(5);
        t.venue_lat = Some(inline().lat);
        t.venue_lng = Some(inline().lng);

        assert_eq!(resolve_venue(&store, &geocoder, &t).await, Some(inline()));
    }

    #[tokio::test]
    async fn sentinel_venue_id_skips_the_lookup_entirely() {
        let mut store = FakeStore::empty();
        store.fail_venue_lookup = true;
        let geocoder = FakeGeocoder::returning(None);
        let mut t = tournament();
        t.venue_id = Some(-1);
        t.venue_lat = Some(inline().lat);
        t.venue_lng = Some(inline().lng);

        // A failing store would surface if the sentinel were looked up.
        assert_eq!(resolve_venue(&store, &geocoder, &t).await, Some(inline()));
    }

    #[tokio::test]
    async fn store_failure_during_venue_lookup_is_not_fatal() {
        let mut store = FakeStore::with_venue(venue(5, Some(33.5795), Some(-112.1188)));
        store.fail_venue_lookup = true;
        let geocoder = FakeGeocoder::returning(Some(geocoded()));
        let mut t = tournament();
        t.venue_id = Some(5);

        assert_eq!(resolve_venue(&store, &geocoder, &t).await, Some(geocoded()));
    }

    #[tokio::test]
    async fn free_text_address_is_geocoded_last() {
        let store = FakeStore::empty();
        let geocoder = FakeGeocoder::returning(Some(geocoded()));

        let resolved = resolve_venue(&store, &geocoder, &tournament()).await;
        assert_eq!(resolved, Some(geocoded()));
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test]
    async fn exhausting_every_strategy_yields_none() {
        let store = FakeStore::empty();
        let geocoder = FakeGeocoder::returning(None);

        assert_eq!(resolve_venue(&store, &geocoder, &tournament()).await, None);
    }
}
