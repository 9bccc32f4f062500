use crate::fx::currency::{is_valid_currency_code, normalize_currency_code};
use crate::fx::currency_converter;
use crate::fx::currency_formatter::{format_amount, DisplayLocale};
use crate::fx::fx_errors::FxError;
use bookshelf_rates::RateSnapshot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Exchange rates quoted against a single base currency.
///
/// `rates[code]` is how many units of `code` one unit of `base` buys. The
/// base itself is never stored; its rate is implicitly one. A set is always
/// replaced wholesale on refresh.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateSet {
    pub base: String,
    pub rates: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ExchangeRateSet {
    /// Builds a validated rate set.
    ///
    /// Codes are normalized, an entry for the base is dropped and any
    /// non-positive rate is rejected.
    pub fn new<I, S>(
        base: &str,
        rates: I,
        last_updated: Option<DateTime<Utc>>,
    ) -> Result<Self, FxError>
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let base = normalize_currency_code(base);
        if !is_valid_currency_code(&base) {
            return Err(FxError::InvalidCurrencyCode(base));
        }

        let mut normalized = BTreeMap::new();
        for (code, rate) in rates {
            let code = normalize_currency_code(code.as_ref());
            if !is_valid_currency_code(&code) {
                return Err(FxError::InvalidCurrencyCode(code));
            }
            if code == base {
                continue;
            }
            if rate <= Decimal::ZERO {
                return Err(FxError::InvalidRate(format!("{}: {}", code, rate)));
            }
            normalized.insert(code, rate);
        }

        Ok(Self {
            base,
            rates: normalized,
            last_updated,
        })
    }

    /// A set holding no rates. Only identity conversions succeed against it.
    pub fn empty(base: &str) -> Self {
        Self {
            base: normalize_currency_code(base),
            rates: BTreeMap::new(),
            last_updated: None,
        }
    }

    /// Keeps the tracked currencies of a provider snapshot, stamped `now`.
    ///
    /// Tracked currencies the provider did not quote are skipped. A snapshot
    /// that quotes none of them is unusable.
    pub fn from_snapshot(
        snapshot: &RateSnapshot,
        tracked: &[String],
        now: DateTime<Utc>,
    ) -> Result<Self, FxError> {
        let kept: Vec<(String, Decimal)> = tracked
            .iter()
            .map(|code| normalize_currency_code(code))
            .filter_map(|code| snapshot.rate(&code).map(|rate| (code, rate)))
            .collect();

        if kept.is_empty() {
            return Err(FxError::Parse(format!(
                "{} payload for {} has none of the tracked currencies ({})",
                snapshot.source,
                snapshot.base,
                tracked.join(", ")
            )));
        }

        Self::new(&snapshot.base, kept, Some(now))
    }

    /// Rate of `code` against the base. The base itself is always one.
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        let code = normalize_currency_code(code);
        if code == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(&code).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// An amount in a given currency. Immutable; conversion yields a new value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: normalize_currency_code(currency),
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Converts into `to` using `rates`.
    pub fn convert_to(&self, to: &str, rates: &ExchangeRateSet) -> Result<Money, FxError> {
        let amount = currency_converter::convert(self.amount, &self.currency, to, rates)?;
        Ok(Money::new(amount, to))
    }

    /// Renders the amount with two fraction digits for `locale`.
    pub fn format(&self, locale: DisplayLocale) -> String {
        format_amount(self.amount, &self.currency, locale)
    }
}

/// Result of a refresh. A failed fetch is not an error value: it carries the
/// cached rates (if any) and a soft error message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub rates: Option<ExchangeRateSet>,
    pub from_cache: bool,
    pub error: Option<String>,
}

impl RefreshOutcome {
    pub fn fresh(rates: ExchangeRateSet, error: Option<String>) -> Self {
        Self {
            rates: Some(rates),
            from_cache: false,
            error,
        }
    }

    /// `from_cache` is false when there was nothing cached to fall back to.
    pub fn cached(rates: Option<ExchangeRateSet>, error: String) -> Self {
        Self {
            from_cache: rates.is_some(),
            rates,
            error: Some(error),
        }
    }
}

/// A price rendered for display.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPrice {
    pub text: String,
    pub amount: Decimal,
    pub currency: String,
    /// False when conversion failed and the original amount is shown.
    pub converted: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_new_strips_base_and_normalizes() {
        let set = ExchangeRateSet::new(
            "try",
            vec![("usd", dec!(0.03)), ("TRY", dec!(1)), ("eur", dec!(0.028))],
            None,
        )
        .unwrap();
        assert_eq!(set.base, "TRY");
        assert_eq!(set.rates.len(), 2);
        assert!(!set.rates.contains_key("TRY"));
        assert_eq!(set.rate("TRY"), Some(Decimal::ONE));
        assert_eq!(set.rate("usd"), Some(dec!(0.03)));
    }

    #[test]
    fn test_new_rejects_non_positive_rate() {
        let err = ExchangeRateSet::new("TRY", vec![("USD", dec!(0))], None).unwrap_err();
        assert!(matches!(err, FxError::InvalidRate(_)));
        let err = ExchangeRateSet::new("TRY", vec![("USD", dec!(-1))], None).unwrap_err();
        assert!(matches!(err, FxError::InvalidRate(_)));
    }

    #[test]
    fn test_new_rejects_bad_code() {
        let err = ExchangeRateSet::new("TRY", vec![("US", dec!(1))], None).unwrap_err();
        assert_eq!(err, FxError::InvalidCurrencyCode("US".to_string()));
    }

    #[test]
    fn test_from_snapshot_keeps_tracked_only() {
        let mut rates = HashMap::new();
        rates.insert("USD".to_string(), dec!(0.031));
        rates.insert("JPY".to_string(), dec!(4.6));
        rates.insert("TRY".to_string(), dec!(1));
        let snapshot = RateSnapshot::new("TRY", rates, "FIXED");
        let tracked = vec!["USD".to_string(), "EUR".to_string()];
        let now = Utc::now();

        let set = ExchangeRateSet::from_snapshot(&snapshot, &tracked, now).unwrap();
        assert_eq!(set.rates.len(), 1);
        assert_eq!(set.rate("USD"), Some(dec!(0.031)));
        assert_eq!(set.rate("JPY"), None);
        assert_eq!(set.last_updated, Some(now));
    }

    #[test]
    fn test_from_snapshot_without_tracked_is_parse_error() {
        let mut rates = HashMap::new();
        rates.insert("JPY".to_string(), dec!(4.6));
        let snapshot = RateSnapshot::new("TRY", rates, "FIXED");
        let err = ExchangeRateSet::from_snapshot(&snapshot, &["USD".to_string()], Utc::now())
            .unwrap_err();
        assert!(matches!(err, FxError::Parse(_)));
    }

    #[test]
    fn test_serializes_camel_case() {
        let set = ExchangeRateSet::new("TRY", vec![("USD", dec!(0.03))], None).unwrap();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["base"], "TRY");
        assert_eq!(json["rates"]["USD"], "0.03");
        assert!(json.get("lastUpdated").is_some());
    }

    #[test]
    fn test_deserializes_without_last_updated() {
        let set: ExchangeRateSet =
            serde_json::from_str(r#"{"base":"TRY","rates":{"USD":0.03}}"#).unwrap();
        assert_eq!(set.last_updated, None);
        assert_eq!(set.rate("USD"), Some(dec!(0.03)));
    }

    #[test]
    fn test_money_convert_to() {
        let rates = ExchangeRateSet::new("TRY", vec![("USD", dec!(0.03))], None).unwrap();
        let price = Money::new(dec!(100), "try");
        let converted = price.convert_to("USD", &rates).unwrap();
        assert_eq!(converted.amount(), dec!(3.00));
        assert_eq!(converted.currency(), "USD");
        // Original is untouched
        assert_eq!(price.amount(), dec!(100));
    }
}
