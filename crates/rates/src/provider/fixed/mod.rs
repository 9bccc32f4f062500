//! Fixed-rate provider.
//!
//! Serves a static rate table. Used when no network provider is configured
//! and as a deterministic provider in tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::errors::RateProviderError;
use crate::models::RateSnapshot;
use crate::provider::RateProvider;

const PROVIDER_ID: &str = "FIXED";

/// Static rate table quoted against a single base currency.
pub struct FixedRateProvider {
    base: String,
    rates: RwLock<HashMap<String, Decimal>>,
}

impl FixedRateProvider {
    pub fn new(base: &str, rates: HashMap<String, Decimal>) -> Self {
        Self {
            base: base.to_uppercase(),
            rates: RwLock::new(rates),
        }
    }

    /// Replace one quoted rate.
    pub async fn set_rate(&self, code: &str, rate: Decimal) {
        self.rates.write().await.insert(code.to_uppercase(), rate);
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_latest(&self, base: &str) -> Result<RateSnapshot, RateProviderError> {
        if !base.eq_ignore_ascii_case(&self.base) {
            return Err(RateProviderError::UnsupportedBase(base.to_string()));
        }
        let rates = self.rates.read().await.clone();
        Ok(RateSnapshot::new(self.base.clone(), rates, PROVIDER_ID))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn provider() -> FixedRateProvider {
        FixedRateProvider::new(
            "TRY",
            HashMap::from([("USD".to_string(), dec!(0.03)), ("EUR".to_string(), dec!(0.028))]),
        )
    }

    #[tokio::test]
    async fn test_fetch_latest_returns_table() {
        let snapshot = provider().fetch_latest("try").await.unwrap();
        assert_eq!(snapshot.base, "TRY");
        assert_eq!(snapshot.rate("USD"), Some(dec!(0.03)));
        assert_eq!(snapshot.source, "FIXED");
    }

    #[tokio::test]
    async fn test_other_base_is_unsupported() {
        let err = provider().fetch_latest("USD").await.unwrap_err();
        assert!(matches!(err, RateProviderError::UnsupportedBase(_)));
    }

    #[tokio::test]
    async fn test_set_rate_updates_next_snapshot() {
        let provider = provider();
        provider.set_rate("gbp", dec!(0.024)).await;
        let snapshot = provider.fetch_latest("TRY").await.unwrap();
        assert_eq!(snapshot.rate("GBP"), Some(dec!(0.024)));
    }
}
