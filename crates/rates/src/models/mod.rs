//! Rate data returned by providers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest rates quoted against a base currency.
///
/// `rates[code]` is the number of `code` units one unit of `base` buys.
/// Providers may include the base itself with a rate of one; consumers are
/// expected to strip it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSnapshot {
    /// Base currency (ISO 4217)
    pub base: String,

    /// Currency code -> rate relative to `base`
    pub rates: HashMap<String, Decimal>,

    /// When the provider produced the snapshot
    pub fetched_at: DateTime<Utc>,

    /// Source of the snapshot (EXCHANGERATE_API, FIXED, ...)
    pub source: String,
}

impl RateSnapshot {
    pub fn new(base: impl Into<String>, rates: HashMap<String, Decimal>, source: &str) -> Self {
        Self {
            base: base.into(),
            rates,
            fetched_at: Utc::now(),
            source: source.to_string(),
        }
    }

    /// Returns the rate for `code`, if quoted.
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(code).copied()
    }
}
