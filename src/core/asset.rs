use anyhow::anyhow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;

/// Balance held on one platform in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub platform: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

impl Asset {
    pub fn key(&self) -> AccountKey {
        AccountKey::new(&self.platform, &self.currency)
    }

    pub fn matches(&self, key: &AccountKey) -> bool {
        self.platform == key.platform && self.currency == key.currency
    }
}

/// The (platform, currency) pair identifying a balance-holding account.
///
/// Parsed from and displayed as `platform|currency`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountKey {
    pub platform: String,
    pub currency: String,
}

impl AccountKey {
    pub fn new(platform: &str, currency: &str) -> Self {
        Self {
            platform: platform.to_string(),
            currency: currency.to_string(),
        }
    }
}

impl Display for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.platform, self.currency)
    }
}

impl FromStr for AccountKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('|') {
            Some((platform, currency))
                if !platform.trim().is_empty()
                    && !currency.trim().is_empty()
                    && !currency.contains('|') =>
            {
                Ok(AccountKey::new(platform.trim(), currency.trim()))
            }
            _ => Err(anyhow!(
                "Invalid account key '{}', expected platform|currency",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Fiat,
    Crypto,
}

impl Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetCategory::Fiat => write!(f, "fiat"),
            AssetCategory::Crypto => write!(f, "crypto"),
        }
    }
}

/// Decides the category of a new asset from its currency code.
#[derive(Debug, Clone, Default)]
pub struct CurrencyClassifier {
    crypto: HashSet<String>,
}

impl CurrencyClassifier {
    pub fn new<I, S>(crypto_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            crypto: crypto_codes
                .into_iter()
                .map(|c| c.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    pub fn classify(&self, currency: &str) -> AssetCategory {
        if self.crypto.contains(&currency.trim().to_uppercase()) {
            AssetCategory::Crypto
        } else {
            AssetCategory::Fiat
        }
    }
}
