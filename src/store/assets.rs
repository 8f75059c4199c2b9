use crate::core::asset::{AccountKey, Asset, AssetCategory, CurrencyClassifier};
use crate::core::convert::PRIMARY_DP;
use crate::store::{read_json, write_json_atomic};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk layout of the asset collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetBook {
    #[serde(default)]
    pub fiat_assets: Vec<Asset>,
    #[serde(default)]
    pub crypto_assets: Vec<Asset>,
}

impl AssetBook {
    fn group_mut(&mut self, category: AssetCategory) -> &mut Vec<Asset> {
        match category {
            AssetCategory::Fiat => &mut self.fiat_assets,
            AssetCategory::Crypto => &mut self.crypto_assets,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.fiat_assets.iter().chain(self.crypto_assets.iter())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Asset> {
        self.fiat_assets
            .iter_mut()
            .chain(self.crypto_assets.iter_mut())
    }
}

/// Current balances keyed by (platform, currency). Every mutation rewrites
/// the whole file.
pub struct AssetStore {
    path: PathBuf,
    book: AssetBook,
    classifier: CurrencyClassifier,
}

impl AssetStore {
    pub fn open(path: &Path, classifier: CurrencyClassifier) -> Result<Self> {
        let book: AssetBook = read_json(path)?;
        debug!(
            fiat = book.fiat_assets.len(),
            crypto = book.crypto_assets.len(),
            "Loaded assets from {}",
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            book,
            classifier,
        })
    }

    /// Fiat assets first, then crypto, each in insertion order.
    pub fn list(&self) -> Vec<&Asset> {
        self.book.iter().collect()
    }

    pub fn book(&self) -> &AssetBook {
        &self.book
    }

    pub fn find(&self, key: &AccountKey) -> Option<&Asset> {
        self.book.iter().find(|asset| asset.matches(key))
    }

    /// Sets the balance of an existing asset. Returns `false` without
    /// writing anything when no asset matches `key`.
    pub fn upsert_amount(&mut self, key: &AccountKey, amount: Decimal) -> Result<bool> {
        let Some(asset) = self.book.iter_mut().find(|asset| asset.matches(key)) else {
            debug!(%key, "No asset to update");
            return Ok(false);
        };
        asset.amount = amount;
        self.save()?;
        Ok(true)
    }

    /// Moves the balance of an existing asset by `delta`. A result outside
    /// the `Decimal` range is an error and nothing is written.
    pub fn adjust(&mut self, key: &AccountKey, delta: Decimal) -> Result<bool> {
        let Some(current) = self.find(key).map(|asset| asset.amount) else {
            debug!(%key, "No asset to adjust");
            return Ok(false);
        };
        let updated = current
            .checked_add(delta)
            .with_context(|| format!("Balance of {key} overflows when adding {delta}"))?;
        self.upsert_amount(key, updated.round_dp(PRIMARY_DP))
    }

    /// Creates a new asset. Returns `None` without writing when the key is
    /// already taken.
    pub fn add(
        &mut self,
        platform: &str,
        currency: &str,
        amount: Decimal,
    ) -> Result<Option<AssetCategory>> {
        let key = AccountKey::new(platform, currency);
        if self.find(&key).is_some() {
            debug!(%key, "Asset already exists");
            return Ok(None);
        }
        let category = self.classifier.classify(currency);
        self.book.group_mut(category).push(Asset {
            platform: platform.to_string(),
            currency: currency.to_string(),
            amount,
        });
        self.save()?;
        info!(%key, %category, "Added asset");
        Ok(Some(category))
    }

    /// Deletes the asset matching `key` from whichever group holds it.
    pub fn remove(&mut self, key: &AccountKey) -> Result<bool> {
        for category in [AssetCategory::Fiat, AssetCategory::Crypto] {
            let group = self.book.group_mut(category);
            if let Some(index) = group.iter().position(|asset| asset.matches(key)) {
                group.remove(index);
                self.save()?;
                info!(%key, "Removed asset");
                return Ok(true);
            }
        }
        debug!(%key, "No asset to remove");
        Ok(false)
    }

    fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> AssetStore {
        AssetStore::open(
            &dir.path().join("assets.json"),
            CurrencyClassifier::new(["USDT", "BTC"]),
        )
        .unwrap()
    }

    #[test]
    fn test_add_classifies_and_lists_fiat_first() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        assert_eq!(
            store.add("Binance", "USDT", dec!(50)).unwrap(),
            Some(AssetCategory::Crypto)
        );
        assert_eq!(
            store.add("Wise", "USD", dec!(100)).unwrap(),
            Some(AssetCategory::Fiat)
        );
        assert_eq!(
            store.add("BCA", "IDR", dec!(1000000)).unwrap(),
            Some(AssetCategory::Fiat)
        );

        let keys: Vec<String> = store.list().iter().map(|a| a.key().to_string()).collect();
        assert_eq!(keys, vec!["Wise|USD", "BCA|IDR", "Binance|USDT"]);
    }

    #[test]
    fn test_add_rejects_duplicate_key() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.add("Wise", "USD", dec!(100)).unwrap();

        assert_eq!(store.add("Wise", "USD", dec!(5)).unwrap(), None);
        assert_eq!(store.list().len(), 1);
        assert_eq!(
            store.find(&AccountKey::new("Wise", "USD")).unwrap().amount,
            dec!(100)
        );
    }

    #[test]
    fn test_remove_only_touches_matching_key() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.add("Binance", "USD", dec!(10)).unwrap();
        store.add("Binance", "USDT", dec!(50)).unwrap();

        assert!(store.remove(&AccountKey::new("Binance", "USDT")).unwrap());
        assert!(!store.remove(&AccountKey::new("Binance", "USDT")).unwrap());

        let assets = store.list();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].key(), AccountKey::new("Binance", "USD"));
        assert_eq!(assets[0].amount, dec!(10));
    }

    #[test]
    fn test_update_of_unknown_key_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let key = AccountKey::new("Ghost", "USD");
        assert!(!store.upsert_amount(&key, dec!(1)).unwrap());
        assert!(!store.adjust(&key, dec!(1)).unwrap());
        assert!(!dir.path().join("assets.json").exists());
    }

    #[test]
    fn test_adjust_allows_negative_balances() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.add("Wise", "USD", dec!(10)).unwrap();

        let key = AccountKey::new("Wise", "USD");
        assert!(store.adjust(&key, dec!(-25.5)).unwrap());
        assert_eq!(store.find(&key).unwrap().amount, dec!(-15.5));
    }

    #[test]
    fn test_adjust_past_decimal_range_fails_without_writing() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.add("Wise", "USD", Decimal::MAX).unwrap();
        let before = std::fs::read_to_string(dir.path().join("assets.json")).unwrap();

        let key = AccountKey::new("Wise", "USD");
        assert!(store.adjust(&key, dec!(1)).is_err());
        assert_eq!(store.find(&key).unwrap().amount, Decimal::MAX);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("assets.json")).unwrap(),
            before
        );
    }

    #[test]
    fn test_mutations_are_persisted() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = open_store(&dir);
            store.add("Wise", "USD", dec!(100)).unwrap();
            store.add("Binance", "BTC", dec!(0.5)).unwrap();
            store
                .upsert_amount(&AccountKey::new("Wise", "USD"), dec!(80))
                .unwrap();
        }

        let store = open_store(&dir);
        assert_eq!(store.book().fiat_assets.len(), 1);
        assert_eq!(store.book().crypto_assets.len(), 1);
        assert_eq!(
            store.find(&AccountKey::new("Wise", "USD")).unwrap().amount,
            dec!(80)
        );
    }

    #[test]
    fn test_reads_existing_layout() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("assets.json"),
            r#"{"fiat_assets": [{"platform": "Wise", "currency": "USD", "amount": 100}],
                "crypto_assets": [{"platform": "Binance", "currency": "USDT", "amount": 12.5}]}"#,
        )
        .unwrap();

        let store = open_store(&dir);
        let assets = store.list();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].amount, dec!(100));
        assert_eq!(assets[1].amount, dec!(12.5));
    }
}
