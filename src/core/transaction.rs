use crate::core::asset::AccountKey;
use anyhow::anyhow;
use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Canonical timestamp layout, minute precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Length of a timestamp rendered with [`TIMESTAMP_FORMAT`].
pub const TIMESTAMP_WIDTH: usize = 16;

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Income,
}

impl TransactionType {
    /// Sign applied to the account balance when the transaction is recorded.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Expense => -amount,
            TransactionType::Income => amount,
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Expense => write!(f, "expense"),
            TransactionType::Income => write!(f, "income"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            _ => Err(anyhow!("Invalid transaction type: {}", s)),
        }
    }
}

/// One ledger entry. The two cached values are a historical record of the
/// rates in effect when the entry was written and are never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: String,
    pub category: String,
    pub account: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub reporting_value: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub secondary_value: Decimal,
    #[serde(default)]
    pub note: String,
}

impl Transaction {
    pub fn account_key(&self) -> AccountKey {
        AccountKey::new(&self.account, &self.currency)
    }

    /// Balance change this entry applied to its account.
    pub fn balance_delta(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    /// `YYYY-MM` of the entry, if its timestamp is well formed.
    pub fn month(&self) -> Option<String> {
        parse_timestamp(&self.timestamp).map(|dt| dt.format("%Y-%m").to_string())
    }
}
