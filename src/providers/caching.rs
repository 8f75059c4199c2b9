use crate::core::cache::Cache;
use crate::core::currency::{RateProvider, RateSource, RateTable};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const CURRENT_KEY: &str = "rates:current";
const LAST_GOOD_KEY: &str = "rates:last_good";

/// Process-wide home of the rate table.
///
/// Holds two entries: the table handed out for the current TTL window, and
/// the last table obtained from a successful fetch, which never expires.
pub struct RateCache {
    store: Arc<dyn Cache<String, RateTable>>,
    ttl: Duration,
}

impl RateCache {
    pub fn new(store: Arc<dyn Cache<String, RateTable>>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn current(&self) -> Option<RateTable> {
        self.store.get(&CURRENT_KEY.to_string()).await
    }

    pub async fn last_good(&self) -> Option<RateTable> {
        self.store.get(&LAST_GOOD_KEY.to_string()).await
    }

    async fn remember(&self, table: &RateTable) {
        self.store
            .put(CURRENT_KEY.to_string(), table.clone(), Some(self.ttl))
            .await;
    }

    async fn remember_good(&self, table: &RateTable) {
        self.store
            .put(LAST_GOOD_KEY.to_string(), table.clone(), None)
            .await;
    }

    /// Drops the current window; the last good table is kept.
    pub async fn invalidate(&self) {
        debug!("Invalidating cached rates");
        self.store.remove(&CURRENT_KEY.to_string()).await;
    }
}

/// Rate provider that serves from [`RateCache`] and degrades to the last
/// good or the hardcoded table whenever `source` fails.
pub struct CachingRateProvider<S: RateSource> {
    source: S,
    cache: Arc<RateCache>,
}

impl<S: RateSource> CachingRateProvider<S> {
    pub fn new(source: S, cache: Arc<RateCache>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }
}

#[async_trait]
impl<S: RateSource> RateProvider for CachingRateProvider<S> {
    async fn get_rates(&self) -> RateTable {
        if let Some(cached) = self.cache.current().await {
            return cached;
        }

        let table = match self.source.fetch_rates().await {
            Ok(table) => {
                info!(rates = table.rates.len(), "Fetched live exchange rates");
                self.cache.remember_good(&table).await;
                table
            }
            Err(e) => match self.cache.last_good().await {
                Some(table) => {
                    warn!("Rate fetch failed, using last known rates: {e:#}");
                    table
                }
                None => {
                    warn!("Rate fetch failed, using built-in rates: {e:#}");
                    RateTable::fallback()
                }
            },
        };
        self.cache.remember(&table).await;
        table
    }

    async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::RateOrigin;
    use crate::store::memory::MemoryCache;
    use anyhow::{Result, anyhow};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct MockSource {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl MockSource {
        fn new(failing: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(failing),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn live_table(cny: f64) -> RateTable {
        let mut table = RateTable::fallback();
        table.rates.insert("CNY".to_string(), cny);
        table.origin = RateOrigin::Live;
        table
    }

    #[async_trait]
    impl<'a> RateSource for &'a MockSource {
        async fn fetch_rates(&self) -> Result<RateTable> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(anyhow!("network down"))
            } else {
                Ok(live_table(0.14 + call as f64 / 100.0))
            }
        }
    }

    fn rate_cache(ttl: Duration) -> Arc<RateCache> {
        Arc::new(RateCache::new(
            Arc::new(MemoryCache::<String, RateTable>::new()),
            ttl,
        ))
    }

    #[tokio::test]
    async fn test_serves_from_cache_within_ttl() {
        let source = MockSource::new(false);
        let provider = CachingRateProvider::new(&source, rate_cache(Duration::from_secs(300)));

        let first = provider.get_rates().await;
        let second = provider.get_rates().await;
        assert_eq!(first, second);
        assert_eq!(first.origin, RateOrigin::Live);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_refetches_after_invalidate() {
        let source = MockSource::new(false);
        let provider = CachingRateProvider::new(&source, rate_cache(Duration::from_secs(300)));

        let first = provider.get_rates().await;
        provider.invalidate().await;
        let second = provider.get_rates().await;
        assert_eq!(source.calls(), 2);
        assert_ne!(first.rate("CNY"), second.rate("CNY"));
    }

    #[tokio::test]
    async fn test_refetches_after_ttl_expires() {
        let source = MockSource::new(false);
        let provider = CachingRateProvider::new(&source, rate_cache(Duration::from_millis(10)));

        provider.get_rates().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        provider.get_rates().await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_without_history_yields_fallback() {
        let source = MockSource::new(true);
        let provider = CachingRateProvider::new(&source, rate_cache(Duration::from_secs(300)));

        let table = provider.get_rates().await;
        assert_eq!(table, RateTable::fallback());

        // The fallback is cached for the window too
        provider.get_rates().await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_prefers_last_good_table() {
        let source = MockSource::new(false);
        let provider = CachingRateProvider::new(&source, rate_cache(Duration::from_secs(300)));

        let good = provider.get_rates().await;
        source.failing.store(true, Ordering::SeqCst);
        provider.invalidate().await;

        let table = provider.get_rates().await;
        assert_eq!(table, good);
        assert_eq!(source.calls(), 2);
    }
}
