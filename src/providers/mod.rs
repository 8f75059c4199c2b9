pub mod caching;
pub mod er_api;
pub mod util;

use crate::core::config::AppConfig;
use crate::store::open_rate_cache;
use anyhow::Result;
use caching::{CachingRateProvider, RateCache};
use er_api::ErApiRateSource;
use std::path::Path;
use std::sync::Arc;

/// The live quote feed behind the cache configured in `config`.
pub fn rate_provider(
    config: &AppConfig,
    data_dir: &Path,
) -> Result<CachingRateProvider<ErApiRateSource>> {
    let cache = RateCache::new(open_rate_cache(data_dir), config.rates.cache_ttl());
    let source = ErApiRateSource::from_config(config)?;
    Ok(CachingRateProvider::new(source, Arc::new(cache)))
}
