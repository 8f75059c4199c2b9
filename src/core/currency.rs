//! Exchange rate tables and the provider abstractions that produce them

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Where a [`RateTable`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateOrigin {
    Live,
    Fallback,
}

impl Display for RateOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateOrigin::Live => write!(f, "live"),
            RateOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

/// Conversion multipliers into the reporting currency.
///
/// `rates[code]` answers "1 unit of `code` is worth how many units of the
/// reporting currency". Cross rates such as `CNY/IDR` are kept apart and are
/// only used for display, with the single exception of the
/// reporting-to-secondary rate which derives the secondary cached value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub reporting: String,
    pub secondary: String,
    pub rates: BTreeMap<String, f64>,
    #[serde(default)]
    pub cross: BTreeMap<String, f64>,
    pub origin: RateOrigin,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

pub const DEFAULT_REPORTING_CURRENCY: &str = "USD";
pub const DEFAULT_SECONDARY_CURRENCY: &str = "CNY";

const FALLBACK_RATES: &[(&str, f64)] = &[
    ("CNY", 0.138),
    ("IDR", 0.000062),
    ("USD", 1.0),
    ("USDT", 1.0),
];

const FALLBACK_CROSS_RATES: &[(&str, f64)] = &[
    ("CNY/IDR", 2180.0),
    ("USD/IDR", 15800.0),
    ("USD/CNY", 7.23),
];

pub fn cross_key(from: &str, to: &str) -> String {
    format!("{from}/{to}")
}

impl RateTable {
    /// The hardcoded table used when no live quote has ever been obtained.
    pub fn fallback() -> Self {
        Self {
            reporting: DEFAULT_REPORTING_CURRENCY.to_string(),
            secondary: DEFAULT_SECONDARY_CURRENCY.to_string(),
            rates: FALLBACK_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
            cross: FALLBACK_CROSS_RATES
                .iter()
                .map(|(pair, rate)| (pair.to_string(), *rate))
                .collect(),
            origin: RateOrigin::Fallback,
            fetched_at: None,
        }
    }

    /// Fallback constant for a currency code, if one is known.
    pub fn fallback_rate(code: &str) -> Option<f64> {
        FALLBACK_RATES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, rate)| *rate)
    }

    /// Fallback constant for a cross pair key such as `USD/CNY`.
    pub fn fallback_cross_rate(key: &str) -> Option<f64> {
        FALLBACK_CROSS_RATES
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, rate)| *rate)
    }

    /// Multiplier for `code`; unknown currencies are treated as the
    /// reporting currency.
    pub fn rate(&self, code: &str) -> f64 {
        self.rates.get(code).copied().unwrap_or(1.0)
    }

    pub fn knows(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    pub fn cross_rate(&self, from: &str, to: &str) -> Option<f64> {
        self.cross.get(&cross_key(from, to)).copied()
    }

    /// Factor turning a reporting-currency value into the secondary currency.
    pub fn secondary_factor(&self) -> f64 {
        let key = cross_key(&self.reporting, &self.secondary);
        self.cross
            .get(&key)
            .copied()
            .or_else(|| Self::fallback_cross_rate(&key))
            .unwrap_or(1.0)
    }
}

/// Fallible access to a remote quote feed.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateTable>;
}

/// Always yields a usable rate table. Implementations must never fail:
/// conversions have to stay possible when the network is not.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn get_rates(&self) -> RateTable;

    /// Forget any cached table so the next call refetches.
    async fn invalidate(&self);
}
