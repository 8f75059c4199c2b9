use crate::core::asset::CurrencyClassifier;
use crate::core::currency::{DEFAULT_REPORTING_CURRENCY, DEFAULT_SECONDARY_CURRENCY};
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RatesConfig {
    pub base_url: String,
    /// Currency the quote feed is requested in.
    pub base_currency: String,
    /// Multiplicative margin modelling the cost of converting.
    pub spread: f64,
    pub timeout_secs: u64,
    pub retries: usize,
    pub cache_ttl_secs: u64,
    /// Currencies whose rates are derived from the feed.
    pub tracked: Vec<String>,
    /// Currencies pinned to the reporting currency at 1.0.
    pub pegged: Vec<String>,
    /// Display-only pairs written as `FROM/TO`.
    pub cross_pairs: Vec<String>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            base_url: "https://open.er-api.com".to_string(),
            base_currency: "CNY".to_string(),
            spread: 1.008,
            timeout_secs: 5,
            retries: 1,
            cache_ttl_secs: 300,
            tracked: vec!["CNY".to_string(), "IDR".to_string()],
            pegged: vec!["USDT".to_string()],
            cross_pairs: vec![
                "CNY/IDR".to_string(),
                "USD/IDR".to_string(),
                "USD/CNY".to_string(),
            ],
        }
    }
}

impl RatesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Rejects settings that would derive meaningless rates.
    pub fn validate(&self) -> Result<()> {
        if !self.spread.is_finite() || self.spread <= 0.0 {
            bail!("rates.spread must be a positive number, got {}", self.spread);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub reporting_currency: String,
    pub secondary_currency: String,
    pub data_path: Option<String>,
    pub rates: RatesConfig,
    pub crypto_currencies: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            reporting_currency: DEFAULT_REPORTING_CURRENCY.to_string(),
            secondary_currency: DEFAULT_SECONDARY_CURRENCY.to_string(),
            data_path: None,
            rates: RatesConfig::default(),
            crypto_currencies: ["USDT", "USDC", "BTC", "ETH", "BNB", "SOL"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("app", "nomadvault", "nomadvault")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("app", "nomadvault", "nomadvault")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .rates
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn classifier(&self) -> CurrencyClassifier {
        CurrencyClassifier::new(&self.crypto_currencies)
    }
}
