//! Cache-aside retrieval of APOD records
//!
//! The proxy is the single entry point for obtaining a record: it checks the
//! cache first, delegates misses to the circuit breaker wrapped around the
//! upstream client, and stores successful results. All failure paths resolve
//! to the empty sentinel record; callers never see an error.

use tracing::{error, info};

use crate::cache::ApodCache;
use crate::data::{Apod, ApodClient, ApodError};
use crate::resilience::{BreakerError, CircuitBreaker};

/// Fallback invoked when the breaker cannot complete a call
///
/// Logs the reason and substitutes the empty sentinel. Never rethrows, so
/// the proxy's failure path cannot surface an error to its caller.
fn fallback_apod(error: BreakerError<ApodError>) -> Apod {
    error!(%error, "serving empty record");
    Apod::empty()
}

/// Entry point composing the cache, circuit breaker and upstream client
///
/// Each collaborator is injected at construction, so tests can build an
/// isolated proxy per case instead of sharing process-wide state. One proxy
/// instance is meant to be shared by all callers hitting the same upstream
/// endpoint; the breaker tracks that endpoint's health across them.
#[derive(Debug)]
pub struct ApodProxy {
    cache: ApodCache,
    breaker: CircuitBreaker,
    client: ApodClient,
}

impl ApodProxy {
    /// Creates a proxy from its three collaborators
    pub fn new(cache: ApodCache, breaker: CircuitBreaker, client: ApodClient) -> Self {
        Self {
            cache,
            breaker,
            client,
        }
    }

    /// Fetches the record for `date`, consulting the cache first
    ///
    /// On a cache hit the stored record is returned with no network call and
    /// no breaker involvement. On a miss the upstream call runs under the
    /// breaker; a successful result is stored (write-once per date) and
    /// returned. When the breaker falls back, the empty sentinel is returned
    /// and nothing is cached.
    ///
    /// # Arguments
    /// * `id` - Identifier for the record, supplied by the persistence layer
    /// * `date` - Date string to fetch, also the cache key
    /// * `api_key` - NASA API key forwarded to the upstream
    pub async fn fetch_record(&self, id: &str, date: &str, api_key: &str) -> Apod {
        if let Some(apod) = self.cache.get(date) {
            info!(%id, %date, "cache hit");
            return apod;
        }

        let outcome = self
            .breaker
            .execute(
                || async move { self.client.fetch(date, api_key).await.map(|apod| apod.with_id(id)) },
                fallback_apod,
            )
            .await;
        if outcome.retries > 0 {
            info!(%date, retries = outcome.retries, "number of retries");
        }

        let apod = outcome.value;
        if !apod.is_empty() && self.cache.put_if_absent(date, apod.clone()) {
            info!(%id, %date, "added entry to cache");
        }

        apod
    }

    /// Read access to the cache, mainly for tests and diagnostics
    #[allow(dead_code)]
    pub fn cache(&self) -> &ApodCache {
        &self.cache
    }

    /// Read access to the breaker, mainly for tests and diagnostics
    #[allow(dead_code)]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_returns_empty_sentinel() {
        let apod = fallback_apod(BreakerError::Open);
        assert!(apod.is_empty());
    }

    #[tokio::test]
    async fn test_cached_record_short_circuits_the_breaker() {
        let cache = ApodCache::new();
        let stored = Apod {
            id: "7".to_string(),
            date: "2019-01-10".to_string(),
            title: "X".to_string(),
            explanation: String::new(),
            url: "http://img".to_string(),
            hdurl: None,
        };
        assert!(cache.put_if_absent("2019-01-10", stored.clone()));

        // Client points at an unroutable address: a cache hit must not
        // touch the network, so the call still succeeds instantly.
        let client = ApodClient::new().with_base_url("http://127.0.0.1:1/apod");
        let proxy = ApodProxy::new(cache, CircuitBreaker::default(), client);

        let apod = proxy.fetch_record("7", "2019-01-10", "DEMO_KEY").await;
        assert_eq!(apod, stored);
    }
}
