//! Process-scoped geocode cache with per-address single-flight.
//!
//! Wraps any [`Geocoder`] so that repeated lookups of the same normalized
//! address hit memory instead of the provider, and concurrent misses for an
//! identical address collapse into exactly one in-flight provider call.
//! Entries are immutable for the process lifetime; failures and no-results
//! are never cached, so a later call may retry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use cuescout_core::{Coordinates, Geocoder, ProviderError};

type SharedLookup = Shared<BoxFuture<'static, Option<Coordinates>>>;

/// Caching/single-flight layer over an inner geocoder. Cloning shares the
/// same cache, so one instance can be injected into every consumer of a
/// process.
pub struct CachingGeocoder<G> {
    inner: Arc<G>,
    entries: Arc<Mutex<HashMap<String, Coordinates>>>,
    inflight: Arc<Mutex<HashMap<String, SharedLookup>>>,
}

impl<G> Clone for CachingGeocoder<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            entries: Arc::clone(&self.entries),
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<G> CachingGeocoder<G>
where
    G: Geocoder + 'static,
{
    #[must_use]
    pub fn new(inner: G) -> Self {
        Self {
            inner: Arc::new(inner),
            entries: Arc::new(Mutex::new(HashMap::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of cached positive entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves an address through the cache. Provider errors are logged and
    /// reported as `None`; only successful resolutions are stored.
    pub async fn resolve(&self, address: &str) -> Option<Coordinates> {
        let key = normalize_address(address);
        if key.is_empty() {
            return None;
        }

        if let Some(hit) = self.cached(&key) {
            tracing::debug!(address = %key, "geocode cache hit");
            return Some(hit);
        }

        let lookup = {
            let mut inflight = self.inflight.lock().expect("inflight lock poisoned");
            if let Some(existing) = inflight.get(&key) {
                existing.clone()
            } else {
                let fut = self.spawn_lookup(key.clone());
                inflight.insert(key, fut.clone());
                fut
            }
        };

        lookup.await
    }

    fn cached(&self, key: &str) -> Option<Coordinates> {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .get(key)
            .copied()
    }

    fn spawn_lookup(&self, key: String) -> SharedLookup {
        let inner = Arc::clone(&self.inner);
        let entries = Arc::clone(&self.entries);
        let inflight = Arc::clone(&self.inflight);

        async move {
            // A lookup can be created just after the previous winner for the
            // same key completed; the cache check here turns that into a hit.
            if let Some(hit) = entries.lock().expect("cache lock poisoned").get(&key).copied() {
                inflight.lock().expect("inflight lock poisoned").remove(&key);
                return Some(hit);
            }

            let resolved = match inner.geocode(&key).await {
                Ok(Some(coords)) => Some(coords),
                Ok(None) => {
                    tracing::debug!(address = %key, "geocoder found no result");
                    None
                }
                Err(err) => {
                    tracing::warn!(address = %key, error = %err, "geocoder call failed");
                    None
                }
            };

            if let Some(coords) = resolved {
                entries
                    .lock()
                    .expect("cache lock poisoned")
                    .insert(key.clone(), coords);
            }
            inflight.lock().expect("inflight lock poisoned").remove(&key);
            resolved
        }
        .boxed()
        .shared()
    }
}

impl<G> Geocoder for CachingGeocoder<G>
where
    G: Geocoder + 'static,
{
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, ProviderError> {
        Ok(self.resolve(address).await)
    }
}

/// Normalizes a free-text address into a cache key: trimmed, internal
/// whitespace collapsed, case-folded. One entry per distinct normalized
/// address.
#[must_use]
pub fn normalize_address(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::sync::Notify;

    struct CountingGeocoder {
        calls: AtomicU32,
        result: Option<Coordinates>,
        fail: bool,
        release: Option<Arc<Notify>>,
    }

    impl CountingGeocoder {
        fn returning(result: Option<Coordinates>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                result,
                fail: false,
                release: None,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicU32::new(0),
                result: None,
                fail: true,
                release: None,
            }
        }

        fn gated(result: Option<Coordinates>, release: Arc<Notify>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                result,
                fail: false,
                release: Some(release),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Geocoder for CountingGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(release) = &self.release {
                release.notified().await;
            }
            if self.fail {
                return Err(ProviderError("boom".to_string()));
            }
            Ok(self.result)
        }
    }

    fn bull_shooters() -> Coordinates {
        Coordinates::checked(33.5795, -112.1188).unwrap()
    }

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_address("  Bull   Shooters,\tPhoenix  AZ "),
            "bull shooters, phoenix az"
        );
        assert_eq!(normalize_address("   "), "");
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let cache = CachingGeocoder::new(CountingGeocoder::returning(Some(bull_shooters())));

        assert_eq!(cache.resolve("Bull Shooters").await, Some(bull_shooters()));
        assert_eq!(cache.resolve("Bull Shooters").await, Some(bull_shooters()));
        assert_eq!(cache.inner.call_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn differently_spelled_same_address_shares_one_entry() {
        let cache = CachingGeocoder::new(CountingGeocoder::returning(Some(bull_shooters())));

        cache.resolve("Bull Shooters  Phoenix").await;
        cache.resolve("  bull shooters phoenix ").await;
        cache.resolve("BULL SHOOTERS PHOENIX").await;

        assert_eq!(cache.inner.call_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_collapse_into_one_provider_call() {
        let release = Arc::new(Notify::new());
        let cache = CachingGeocoder::new(CountingGeocoder::gated(
            Some(bull_shooters()),
            Arc::clone(&release),
        ));

        let a = cache.resolve("Bull Shooters Phoenix");
        let b = cache.resolve("bull shooters phoenix");
        let c = cache.resolve("  Bull   Shooters Phoenix ");

        let release_task = async {
            // Let all three join the in-flight lookup before the provider
            // is allowed to answer.
            tokio::task::yield_now().await;
            release.notify_waiters();
            release.notify_one();
        };

        let (ra, rb, rc, ()) = tokio::join!(a, b, c, release_task);
        assert_eq!(ra, Some(bull_shooters()));
        assert_eq!(rb, Some(bull_shooters()));
        assert_eq!(rc, Some(bull_shooters()));
        assert_eq!(cache.inner.call_count(), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached_and_may_retry_later() {
        let cache = CachingGeocoder::new(CountingGeocoder::failing());

        assert_eq!(cache.resolve("Bull Shooters").await, None);
        assert_eq!(cache.resolve("Bull Shooters").await, None);
        // No negative caching: each later call retries the provider.
        assert_eq!(cache.inner.call_count(), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn no_result_is_not_cached() {
        let cache = CachingGeocoder::new(CountingGeocoder::returning(None));

        assert_eq!(cache.resolve("Nowhere Hall").await, None);
        assert_eq!(cache.resolve("Nowhere Hall").await, None);
        assert_eq!(cache.inner.call_count(), 2);
    }

    #[tokio::test]
    async fn empty_address_never_reaches_the_provider() {
        let cache = CachingGeocoder::new(CountingGeocoder::returning(Some(bull_shooters())));
        assert_eq!(cache.resolve("   ").await, None);
        assert_eq!(cache.inner.call_count(), 0);
    }
}
