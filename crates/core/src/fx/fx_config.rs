use std::time::Duration;

use crate::constants::{
    DEFAULT_BASE_CURRENCY, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_STALENESS_SECS,
    DEFAULT_TRACKED_CURRENCIES,
};
use crate::fx::currency::{is_valid_currency_code, normalize_currency_code};
use crate::fx::currency_formatter::DisplayLocale;
use crate::fx::fx_errors::FxError;

/// Settings of the rate store.
#[derive(Debug, Clone, PartialEq)]
pub struct FxConfig {
    /// Currency prices are stored in and rates are quoted against
    pub base_currency: String,
    /// Currencies kept from provider payloads and offered for display
    pub tracked_currencies: Vec<String>,
    /// Maximum age of the cached rate set
    pub staleness_threshold: Duration,
    /// Upper bound for one provider call
    pub fetch_timeout: Duration,
    pub locale: DisplayLocale,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            tracked_currencies: DEFAULT_TRACKED_CURRENCIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            staleness_threshold: Duration::from_secs(DEFAULT_STALENESS_SECS),
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            locale: DisplayLocale::default(),
        }
    }
}

impl FxConfig {
    /// Normalizes codes, drops the base and duplicates from the tracked list
    /// and rejects malformed codes.
    pub fn validated(mut self) -> Result<Self, FxError> {
        self.base_currency = normalize_currency_code(&self.base_currency);
        if !is_valid_currency_code(&self.base_currency) {
            return Err(FxError::InvalidCurrencyCode(self.base_currency));
        }

        let mut tracked: Vec<String> = Vec::with_capacity(self.tracked_currencies.len());
        for code in &self.tracked_currencies {
            let code = normalize_currency_code(code);
            if !is_valid_currency_code(&code) {
                return Err(FxError::InvalidCurrencyCode(code));
            }
            if code != self.base_currency && !tracked.contains(&code) {
                tracked.push(code);
            }
        }
        self.tracked_currencies = tracked;
        Ok(self)
    }

    /// True for the base or a tracked currency.
    pub fn is_supported(&self, code: &str) -> bool {
        let code = normalize_currency_code(code);
        code == self.base_currency || self.tracked_currencies.contains(&code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FxConfig::default();
        assert_eq!(config.base_currency, "TRY");
        assert_eq!(config.tracked_currencies, vec!["USD", "EUR", "GBP"]);
        assert_eq!(config.staleness_threshold, Duration::from_secs(1800));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.locale, DisplayLocale::TrTr);
    }

    #[test]
    fn test_validated_normalizes_tracked() {
        let config = FxConfig {
            tracked_currencies: vec!["usd".into(), "TRY".into(), "USD".into(), " eur".into()],
            ..FxConfig::default()
        }
        .validated()
        .unwrap();
        assert_eq!(config.tracked_currencies, vec!["USD", "EUR"]);
        assert!(config.is_supported("try"));
        assert!(config.is_supported("eur"));
        assert!(!config.is_supported("GBP"));
    }

    #[test]
    fn test_validated_rejects_bad_base() {
        let config = FxConfig {
            base_currency: "LIRA".into(),
            ..FxConfig::default()
        };
        assert!(config.validated().is_err());
    }
}
