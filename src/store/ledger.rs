use crate::core::convert::{to_reporting, to_secondary};
use crate::core::currency::RateTable;
use crate::core::error::LedgerError;
use crate::core::transaction::{TIMESTAMP_WIDTH, Transaction, TransactionType};
use crate::store::{read_json, write_json_atomic};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Year assumed for entries written before timestamps carried one.
pub const LEGACY_YEAR_PREFIX: &str = "2026-";

/// A transaction as found on disk, possibly written by an older schema.
#[derive(Debug, Deserialize)]
struct StoredTransaction {
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    account: String,
    #[serde(rename = "type")]
    kind: TransactionType,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision")]
    amount: Decimal,
    #[serde(default)]
    currency: String,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    reporting_value: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    value_usdt: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    secondary_value: Option<Decimal>,
    #[serde(default)]
    note: String,
}

impl StoredTransaction {
    fn needs_migration(&self) -> bool {
        self.reporting_value.is_none() || self.secondary_value.is_none()
    }

    fn migrate(self, rates: &RateTable) -> Transaction {
        let reporting_value = self
            .reporting_value
            .or(self.value_usdt)
            .unwrap_or_else(|| to_reporting(self.amount, &self.currency, rates));
        let secondary_value = self
            .secondary_value
            .unwrap_or_else(|| to_secondary(reporting_value, rates));

        Transaction {
            timestamp: normalize_timestamp(&self.timestamp),
            category: self.category,
            account: self.account,
            kind: self.kind,
            amount: self.amount,
            currency: self.currency,
            reporting_value,
            secondary_value,
            note: self.note,
        }
    }
}

/// Brings a stored timestamp to the canonical minute-precision layout:
/// entries without a year get [`LEGACY_YEAR_PREFIX`], and anything past
/// minute precision is cut off.
pub fn normalize_timestamp(raw: &str) -> String {
    let prefixed = if !raw.is_empty() && !raw.starts_with("20") {
        format!("{LEGACY_YEAR_PREFIX}{raw}")
    } else {
        raw.to_string()
    };
    prefixed.chars().take(TIMESTAMP_WIDTH).collect()
}

/// Most-recent-first transaction log persisted as one JSON array.
pub struct LedgerStore {
    path: PathBuf,
    transactions: Vec<Transaction>,
}

impl LedgerStore {
    pub fn open(path: &Path, rates: &RateTable) -> Result<Self> {
        let mut store = Self {
            path: path.to_path_buf(),
            transactions: Vec::new(),
        };
        store.load(rates)?;
        Ok(store)
    }

    /// Reads the log from disk, backfilling cached values missing from older
    /// entries with `rates`. Migrated values are only written back by the
    /// next [`LedgerStore::save`].
    pub fn load(&mut self, rates: &RateTable) -> Result<&[Transaction]> {
        let stored: Vec<StoredTransaction> = read_json(&self.path)?;
        let migrated = stored.iter().filter(|tx| tx.needs_migration()).count();
        if migrated > 0 {
            info!(migrated, "Backfilled cached values on legacy transactions");
        }
        self.transactions = stored.into_iter().map(|tx| tx.migrate(rates)).collect();
        debug!(
            count = self.transactions.len(),
            "Loaded transactions from {}",
            self.path.display()
        );
        Ok(&self.transactions)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn head(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    /// Up to `limit` most recent entries.
    pub fn recent(&self, limit: usize) -> &[Transaction] {
        &self.transactions[..limit.min(self.transactions.len())]
    }

    pub fn insert_at_head(&mut self, transaction: Transaction) {
        self.transactions.insert(0, transaction);
    }

    pub fn remove_head(&mut self) -> Result<Transaction, LedgerError> {
        if self.transactions.is_empty() {
            return Err(LedgerError::EmptyLedger);
        }
        Ok(self.transactions.remove(0))
    }

    /// Writes the whole log, newest first. Entries sharing a timestamp keep
    /// their relative order.
    pub fn save(&mut self) -> Result<()> {
        self.transactions
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        write_json_atomic(&self.path, &self.transactions)
    }
}
