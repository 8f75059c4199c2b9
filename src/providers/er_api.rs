use crate::core::config::{AppConfig, RatesConfig};
use crate::core::currency::{RateOrigin, RateSource, RateTable};
use crate::providers::util::with_retry;
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, warn};

const RETRY_DELAY: Duration = Duration::from_millis(300);

/// Quote feed in the shape served by open.er-api.com: every rate is
/// expressed per one unit of the requested base currency.
pub struct ErApiRateSource {
    base_url: String,
    settings: RatesConfig,
    reporting: String,
    secondary: String,
    client: reqwest::Client,
}

impl ErApiRateSource {
    pub fn new(settings: &RatesConfig, reporting: &str, secondary: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("nomadvault/1.0")
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            settings: settings.clone(),
            reporting: reporting.to_string(),
            secondary: secondary.to_string(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.rates,
            &config.reporting_currency,
            &config.secondary_currency,
        )
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

fn usable_quote(quotes: &HashMap<String, f64>, code: &str, base: &str) -> Option<f64> {
    match quotes.get(code) {
        Some(q) if q.is_finite() && *q > 0.0 => Some(*q),
        _ if code == base => Some(1.0),
        _ => None,
    }
}

/// Builds a rate table from one base-currency quote set.
///
/// For each tracked currency `X`, `rate[X] = q[reporting] / (q[X] * spread)`.
/// Cross pairs `A/B` are `q[B] / q[A]` without spread. Quotes that are absent,
/// zero or not finite are replaced by the fallback constant for that key.
pub fn derive_rate_table(
    quotes: &HashMap<String, f64>,
    settings: &RatesConfig,
    reporting: &str,
    secondary: &str,
) -> Result<RateTable> {
    settings.validate()?;
    let base = settings.base_currency.as_str();
    let reporting_quote = usable_quote(quotes, reporting, base)
        .ok_or_else(|| anyhow!("Quote feed has no usable {} rate", reporting))?;

    let mut rates = BTreeMap::new();
    rates.insert(reporting.to_string(), 1.0);
    for code in &settings.pegged {
        rates.insert(code.clone(), 1.0);
    }
    for code in settings.tracked.iter().filter(|c| c.as_str() != reporting) {
        match usable_quote(quotes, code, base) {
            Some(quote) => {
                rates.insert(code.clone(), reporting_quote / (quote * settings.spread));
            }
            None => match RateTable::fallback_rate(code) {
                Some(rate) => {
                    warn!(currency = %code, "Missing quote, using fallback rate");
                    rates.insert(code.clone(), rate);
                }
                None => warn!(currency = %code, "Missing quote and no fallback rate"),
            },
        }
    }

    let mut cross = BTreeMap::new();
    for pair in &settings.cross_pairs {
        let Some((from, to)) = pair.split_once('/') else {
            warn!(%pair, "Ignoring malformed cross pair");
            continue;
        };
        let derived = usable_quote(quotes, from, base)
            .zip(usable_quote(quotes, to, base))
            .map(|(from_quote, to_quote)| to_quote / from_quote);
        match derived.or_else(|| RateTable::fallback_cross_rate(pair)) {
            Some(rate) => {
                cross.insert(pair.clone(), rate);
            }
            None => warn!(%pair, "Missing quotes for cross pair"),
        }
    }

    Ok(RateTable {
        reporting: reporting.to_string(),
        secondary: secondary.to_string(),
        rates,
        cross,
        origin: RateOrigin::Live,
        fetched_at: Some(Utc::now()),
    })
}

#[async_trait]
impl RateSource for ErApiRateSource {
    async fn fetch_rates(&self) -> Result<RateTable> {
        let url = format!("{}/v6/latest/{}", self.base_url, self.settings.base_currency);
        debug!("Requesting exchange rates from {}", url);

        let response = with_retry(
            || self.client.get(&url).send(),
            self.settings.retries,
            RETRY_DELAY,
        )
        .await
        .with_context(|| format!("Failed to send request for rates: {url}"))?;

        if !response.status().is_success() {
            bail!("HTTP error: {} for rates: {}", response.status(), url);
        }

        let data: LatestResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse rates response from {url}"))?;

        if let Some(result) = data.result.as_deref() {
            if result != "success" {
                bail!("Rate feed reported '{}' for {}", result, url);
            }
        }

        derive_rate_table(&data.rates, &self.settings, &self.reporting, &self.secondary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quotes(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_derive_applies_spread_and_inverts() {
        let settings = RatesConfig::default();
        let table = derive_rate_table(
            &quotes(&[("CNY", 1.0), ("USD", 0.14), ("IDR", 2200.0)]),
            &settings,
            "USD",
            "CNY",
        )
        .unwrap();

        assert_eq!(table.rate("USD"), 1.0);
        assert_eq!(table.rate("USDT"), 1.0);
        assert!(approx(table.rate("CNY"), 0.14 / 1.008));
        assert!(approx(table.rate("IDR"), 0.14 / (2200.0 * 1.008)));

        assert!(approx(table.cross_rate("CNY", "IDR").unwrap(), 2200.0));
        assert!(approx(table.cross_rate("USD", "IDR").unwrap(), 2200.0 / 0.14));
        assert!(approx(table.cross_rate("USD", "CNY").unwrap(), 1.0 / 0.14));
        assert_eq!(table.origin, RateOrigin::Live);
        assert!(table.fetched_at.is_some());
    }

    #[test]
    fn test_derive_substitutes_fallback_for_missing_keys() {
        let settings = RatesConfig::default();
        let table = derive_rate_table(
            &quotes(&[("USD", 0.14), ("IDR", 0.0)]),
            &settings,
            "USD",
            "CNY",
        )
        .unwrap();

        // Base currency is implied even when the feed omits it
        assert!(approx(table.rate("CNY"), 0.14 / 1.008));
        assert_eq!(table.rate("IDR"), 0.000062);
        assert_eq!(table.cross_rate("CNY", "IDR"), Some(2180.0));
        assert_eq!(table.cross_rate("USD", "IDR"), Some(15800.0));
        assert!(table.rates.values().all(|r| *r > 0.0));
    }

    #[test]
    fn test_derive_fails_without_reporting_quote() {
        let settings = RatesConfig::default();
        let result = derive_rate_table(&quotes(&[("IDR", 2200.0)]), &settings, "USD", "CNY");
        assert!(result.is_err());
    }

    #[test]
    fn test_derive_rejects_invalid_spread() {
        let feed = quotes(&[("CNY", 1.0), ("USD", 0.14), ("IDR", 2200.0)]);
        for spread in [0.0, -1.008, f64::INFINITY, f64::NAN] {
            let settings = RatesConfig {
                spread,
                ..RatesConfig::default()
            };
            assert!(
                derive_rate_table(&feed, &settings, "USD", "CNY").is_err(),
                "spread {spread}"
            );
        }
    }

    async fn source_for(server: &MockServer) -> ErApiRateSource {
        let settings = RatesConfig {
            base_url: server.uri(),
            retries: 0,
            ..RatesConfig::default()
        };
        ErApiRateSource::new(&settings, "USD", "CNY").unwrap()
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/latest/CNY"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"result": "success", "base_code": "CNY",
                    "rates": {"CNY": 1, "USD": 0.14, "IDR": 2200.5}}"#,
            ))
            .mount(&mock_server)
            .await;

        let table = source_for(&mock_server).await.fetch_rates().await.unwrap();
        assert!(approx(table.rate("CNY"), 0.14 / 1.008));
        assert!(approx(table.cross_rate("CNY", "IDR").unwrap(), 2200.5));
    }

    #[tokio::test]
    async fn test_fetch_fails_on_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/latest/CNY"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let result = source_for(&mock_server).await.fetch_rates().await;
        assert!(result.unwrap_err().to_string().contains("HTTP error"));
    }

    #[tokio::test]
    async fn test_fetch_fails_on_error_result() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/latest/CNY"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"result": "error", "error-type": "unsupported-code"}"#),
            )
            .mount(&mock_server)
            .await;

        let result = source_for(&mock_server).await.fetch_rates().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_fails_on_malformed_payload() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/latest/CNY"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let result = source_for(&mock_server).await.fetch_rates().await;
        assert!(result.unwrap_err().to_string().contains("Failed to parse"));
    }
}
