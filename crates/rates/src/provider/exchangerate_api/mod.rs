//! ExchangeRate-API provider.
//!
//! Two endpoints share one payload shape:
//! - keyed: `https://v6.exchangerate-api.com/v6/{key}/latest/{BASE}` with the
//!   table under `conversion_rates`
//! - open access: `https://open.er-api.com/v6/latest/{BASE}` with the table
//!   under `rates`
//!
//! Both report failures in-band as `{"result": "error", "error-type": ...}`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::RateProviderError;
use crate::models::RateSnapshot;
use crate::provider::RateProvider;

/// Provider ID constant
const PROVIDER_ID: &str = "EXCHANGERATE_API";

const KEYED_BASE_URL: &str = "https://v6.exchangerate-api.com";
const OPEN_BASE_URL: &str = "https://open.er-api.com";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// API response from ExchangeRate-API
#[derive(Debug, Deserialize)]
struct LatestResponse {
    /// "success" or "error"
    result: String,
    /// Error code when `result == "error"` (invalid-key, quota-reached, ...)
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    /// Base currency echoed back by the API
    base_code: Option<String>,
    /// Unix timestamp of the upstream update
    time_last_update_unix: Option<i64>,
    /// Rate table; the open endpoint names it `rates`
    #[serde(alias = "rates")]
    conversion_rates: Option<HashMap<String, f64>>,
}

/// ExchangeRate-API provider.
///
/// # Example
///
/// ```ignore
/// use bookshelf_rates::ExchangeRateApiProvider;
///
/// let keyed = ExchangeRateApiProvider::new(Some("your_api_key".to_string()));
/// let open = ExchangeRateApiProvider::new(None);
/// ```
pub struct ExchangeRateApiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl ExchangeRateApiProvider {
    /// Create a provider. Without an API key the open endpoint is used.
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        let base_url = if api_key.is_some() {
            KEYED_BASE_URL
        } else {
            OPEN_BASE_URL
        };
        Self::with_timeout(api_key, base_url.to_string(), REQUEST_TIMEOUT)
    }

    /// Create a provider against a custom host (self-hosted mirror, tests).
    pub fn with_timeout(api_key: Option<String>, base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn latest_url(&self, base: &str) -> String {
        match &self.api_key {
            Some(key) => format!("{}/v6/{}/latest/{}", self.base_url, key, base),
            None => format!("{}/v6/latest/{}", self.base_url, base),
        }
    }

    /// Decodes a response body into a snapshot for `base`.
    fn parse_latest(base: &str, body: &str) -> Result<RateSnapshot, RateProviderError> {
        let payload: LatestResponse =
            serde_json::from_str(body).map_err(|e| RateProviderError::Parse {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })?;

        if payload.result != "success" {
            return Err(RateProviderError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: payload
                    .error_type
                    .unwrap_or_else(|| format!("unexpected result '{}'", payload.result)),
            });
        }

        if let Some(code) = payload.base_code.as_deref() {
            if !code.eq_ignore_ascii_case(base) {
                return Err(RateProviderError::Parse {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("requested base {} but payload is based on {}", base, code),
                });
            }
        }

        let table = payload
            .conversion_rates
            .ok_or_else(|| RateProviderError::Parse {
                provider: PROVIDER_ID.to_string(),
                message: "payload has no rate table".to_string(),
            })?;

        let mut rates = HashMap::with_capacity(table.len());
        for (code, value) in table {
            if !value.is_finite() || value <= 0.0 {
                warn!("{}: skipping non-positive rate {} for {}", PROVIDER_ID, value, code);
                continue;
            }
            let rate = Decimal::try_from(value).map_err(|_| RateProviderError::Parse {
                provider: PROVIDER_ID.to_string(),
                message: format!("rate for {} is not representable: {}", code, value),
            })?;
            rates.insert(code.to_uppercase(), rate);
        }

        let mut snapshot = RateSnapshot::new(base.to_uppercase(), rates, PROVIDER_ID);
        if let Some(ts) = payload
            .time_last_update_unix
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        {
            snapshot.fetched_at = ts;
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_latest(&self, base: &str) -> Result<RateSnapshot, RateProviderError> {
        if base.len() != 3 || !base.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RateProviderError::UnsupportedBase(base.to_string()));
        }
        let base = base.to_uppercase();

        debug!("{}: fetching latest rates for {}", PROVIDER_ID, base);

        let response = self
            .client
            .get(self.latest_url(&base))
            .send()
            .await
            .map_err(|e| RateProviderError::from_reqwest(PROVIDER_ID, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RateProviderError::from_reqwest(PROVIDER_ID, e))?;

        if !status.is_success() {
            // Error payloads still carry `error-type`; prefer that over the status.
            return match Self::parse_latest(&base, &body) {
                Err(err @ RateProviderError::ProviderError { .. }) => Err(err),
                _ => Err(RateProviderError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("HTTP {}", status),
                }),
            };
        }

        Self::parse_latest(&base, &body)
    }
}
