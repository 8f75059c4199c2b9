//! Keeps the transaction log and the account balances in step.
//!
//! Every change that should be reflected in both stores goes through
//! [`LedgerEngine`]. The two files are written one after the other, ledger
//! first; a crash between the writes leaves them out of step and has to be
//! reconciled by hand with [`LedgerEngine::correct_balance`].

use crate::core::asset::{AccountKey, Asset, AssetCategory, CurrencyClassifier};
use crate::core::convert::{PRIMARY_DP, checked_to_reporting, checked_to_secondary};
use crate::core::currency::RateTable;
use crate::core::error::LedgerError;
use crate::core::transaction::{Transaction, TransactionType, now_timestamp};
use crate::store::{ASSETS_FILE, AssetStore, LedgerStore, TRANSACTIONS_FILE};
use anyhow::Result;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Parses a user-typed amount. Surrounding whitespace and `,` thousands
/// separators are ignored.
pub fn parse_amount(text: &str) -> Result<Decimal, LedgerError> {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() {
        return Err(LedgerError::invalid("amount must not be empty"));
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map(|amount| amount.round_dp(PRIMARY_DP))
        .map_err(|_| LedgerError::invalid(format!("'{}' is not a number", text.trim())))
}

/// Like [`parse_amount`], but rejects negative values.
pub fn parse_entry_amount(text: &str) -> Result<Decimal, LedgerError> {
    let amount = parse_amount(text)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::invalid(format!(
            "amount must not be negative, got {amount}"
        )));
    }
    Ok(amount)
}

pub struct LedgerEngine {
    assets: AssetStore,
    ledger: LedgerStore,
    clock: fn() -> String,
}

impl LedgerEngine {
    pub fn new(assets: AssetStore, ledger: LedgerStore) -> Self {
        Self {
            assets,
            ledger,
            clock: now_timestamp,
        }
    }

    /// Opens both stores under `data_dir`, migrating legacy ledger entries
    /// with `rates`.
    pub fn open(
        data_dir: &Path,
        classifier: CurrencyClassifier,
        rates: &RateTable,
    ) -> Result<Self> {
        let assets = AssetStore::open(&data_dir.join(ASSETS_FILE), classifier)?;
        let ledger = LedgerStore::open(&data_dir.join(TRANSACTIONS_FILE), rates)?;
        Ok(Self::new(assets, ledger))
    }

    /// Replaces the source of transaction timestamps.
    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Records an expense or income against `key` and moves its balance.
    ///
    /// Validation happens before anything is touched: a bad amount or an
    /// unknown account leaves both stores exactly as they were.
    pub fn record_transaction(
        &mut self,
        key: &AccountKey,
        kind: TransactionType,
        amount: &str,
        category: &str,
        note: &str,
        rates: &RateTable,
    ) -> Result<Transaction, LedgerError> {
        let amount = parse_entry_amount(amount)?;
        if self.assets.find(key).is_none() {
            return Err(LedgerError::invalid(format!("unknown account {key}")));
        }

        let out_of_range =
            || LedgerError::invalid(format!("{amount} {} is out of range", key.currency));
        let reporting_value =
            checked_to_reporting(amount, &key.currency, rates).ok_or_else(out_of_range)?;
        let secondary_value =
            checked_to_secondary(reporting_value, rates).ok_or_else(out_of_range)?;
        let transaction = Transaction {
            timestamp: (self.clock)(),
            category: category.trim().to_string(),
            account: key.platform.clone(),
            kind,
            amount,
            currency: key.currency.clone(),
            reporting_value,
            secondary_value,
            note: note.trim().to_string(),
        };
        self.balance_after(key, transaction.balance_delta())?;

        self.ledger.insert_at_head(transaction.clone());
        if let Err(e) = self.ledger.save() {
            // Keep memory in line with what is on disk
            let _ = self.ledger.remove_head();
            return Err(e.into());
        }
        self.assets.adjust(key, transaction.balance_delta())?;

        info!(
            %key,
            %kind,
            amount = %transaction.amount,
            reporting_value = %transaction.reporting_value,
            "Recorded transaction"
        );
        Ok(transaction)
    }

    /// Removes the most recent transaction and reverses its balance change.
    ///
    /// When the account has been deleted in the meantime only the ledger
    /// entry is removed.
    pub fn undo_last(&mut self) -> Result<Transaction, LedgerError> {
        let Some(head) = self.ledger.head() else {
            return Err(LedgerError::EmptyLedger);
        };
        self.balance_after(&head.account_key(), -head.balance_delta())?;

        let transaction = self.ledger.remove_head()?;
        if let Err(e) = self.ledger.save() {
            self.ledger.insert_at_head(transaction);
            return Err(e.into());
        }

        let key = transaction.account_key();
        if !self.assets.adjust(&key, -transaction.balance_delta())? {
            warn!(%key, "Account no longer exists, balance not restored");
        }
        info!(%key, kind = %transaction.kind, amount = %transaction.amount, "Undid transaction");
        Ok(transaction)
    }

    /// Balance of `key` once `delta` is applied, or `None` for an unknown
    /// account. Fails without touching anything when the result does not
    /// fit in a `Decimal`.
    fn balance_after(
        &self,
        key: &AccountKey,
        delta: Decimal,
    ) -> Result<Option<Decimal>, LedgerError> {
        let Some(asset) = self.assets.find(key) else {
            return Ok(None);
        };
        asset
            .amount
            .checked_add(delta)
            .map(Some)
            .ok_or_else(|| LedgerError::invalid(format!("balance of {key} would be out of range")))
    }

    /// Overwrites a balance by hand. No transaction is recorded, so the
    /// balance stops being the sum of the ledger from here on.
    pub fn correct_balance(
        &mut self,
        key: &AccountKey,
        amount: &str,
    ) -> Result<Decimal, LedgerError> {
        let amount = parse_amount(amount)?;
        if !self.assets.upsert_amount(key, amount)? {
            return Err(LedgerError::invalid(format!("unknown account {key}")));
        }
        info!(%key, %amount, "Corrected balance");
        Ok(amount)
    }

    pub fn add_asset(
        &mut self,
        platform: &str,
        currency: &str,
        amount: &str,
    ) -> Result<AssetCategory, LedgerError> {
        let platform = platform.trim();
        let currency = currency.trim().to_uppercase();
        if platform.is_empty() || currency.is_empty() || platform.contains('|') {
            return Err(LedgerError::invalid(
                "platform and currency must be non-empty and free of '|'",
            ));
        }
        let amount = parse_amount(amount)?;
        self.assets
            .add(platform, &currency, amount)?
            .ok_or_else(|| LedgerError::invalid(format!("account {platform}|{currency} exists")))
    }

    pub fn remove_asset(&mut self, key: &AccountKey) -> Result<Asset, LedgerError> {
        let asset = self
            .assets
            .find(key)
            .cloned()
            .ok_or_else(|| LedgerError::invalid(format!("unknown account {key}")))?;
        self.assets.remove(key)?;
        Ok(asset)
    }
}
