pub mod assets;
pub mod disk;
pub mod ledger;
pub mod memory;

use crate::core::cache::Cache;
use crate::core::currency::RateTable;
use anyhow::{Context, Result};
use disk::DiskCache;
use memory::MemoryCache;
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub use assets::AssetStore;
pub use ledger::LedgerStore;

pub const ASSETS_FILE: &str = "assets.json";
pub const TRANSACTIONS_FILE: &str = "transactions.json";

/// Opens the rate cache under `data_dir/cache`, falling back to a
/// process-local cache when the on-disk one cannot be opened.
pub fn open_rate_cache(data_dir: &Path) -> Arc<dyn Cache<String, RateTable>> {
    match DiskCache::<String, RateTable>::open(&data_dir.join("cache"), "rates") {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            debug!("Using in-memory rate cache: {e:#}");
            Arc::new(MemoryCache::<String, RateTable>::new())
        }
    }
}

/// Reads a whole JSON document, or `T::default()` when the file is absent.
pub(crate) fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        debug!("{} not found, starting empty", path.display());
        return Ok(T::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Replaces the file with the serialized document in one rename, so readers
/// see either the old or the new content.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, text).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    debug!("Saved {}", path.display());
    Ok(())
}
