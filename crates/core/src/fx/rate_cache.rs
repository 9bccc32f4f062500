//! Persisted rate set, display preferences and the staleness rule.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{
    LEGACY_LAST_RATES_KEY, LEGACY_LAST_UPDATE_KEY, LEGACY_SELECTED_CURRENCY_KEY,
    LEGACY_SELECTED_LOCALE_KEY, LEGACY_TIMESTAMPED_RATES_KEY, RATES_STORAGE_KEY,
    SELECTED_CURRENCY_STORAGE_KEY, SELECTED_LOCALE_STORAGE_KEY,
};
use crate::fx::currency::{is_valid_currency_code, normalize_currency_code};
use crate::fx::currency_formatter::DisplayLocale;
use crate::fx::fx_errors::FxError;
use crate::fx::fx_model::ExchangeRateSet;
use crate::kv::{get_json, set_json, KeyValueStore};

/// True when a rate set stamped `last_updated` must be refreshed at `now`.
///
/// An absent timestamp is always stale. A timestamp in the future is not.
pub fn is_stale(
    last_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold: Duration,
) -> bool {
    match last_updated {
        None => true,
        Some(updated) => match now.signed_duration_since(updated).to_std() {
            Ok(age) => age > threshold,
            // Negative age
            Err(_) => false,
        },
    }
}

/// `exchange_rates` as written by earlier releases: `{ rates, timestamp }`.
#[derive(Deserialize)]
struct LegacyTimestampedRates {
    rates: BTreeMap<String, Decimal>,
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Reads and writes the rate set and selected currency in a key-value store.
#[derive(Clone)]
pub struct RateCache {
    store: Arc<dyn KeyValueStore>,
    base_currency: String,
}

impl RateCache {
    pub fn new(store: Arc<dyn KeyValueStore>, base_currency: &str) -> Self {
        Self {
            store,
            base_currency: normalize_currency_code(base_currency),
        }
    }

    /// Loads the cached rate set from the unified key.
    ///
    /// The stored record is revalidated like a fresh one. A set quoted
    /// against another base or holding a malformed entry is a `CacheError`.
    pub fn load(&self) -> Result<Option<ExchangeRateSet>, FxError> {
        let cached: Option<ExchangeRateSet> = get_json(self.store.as_ref(), RATES_STORAGE_KEY)
            .map_err(|e| FxError::Persistence(e.to_string()))?;

        let Some(set) = cached else {
            return Ok(None);
        };
        if normalize_currency_code(&set.base) != self.base_currency {
            return Err(FxError::CacheError(format!(
                "cached rates are quoted against {}, expected {}",
                set.base, self.base_currency
            )));
        }

        ExchangeRateSet::new(&set.base, set.rates, set.last_updated)
            .map(Some)
            .map_err(|e| FxError::CacheError(format!("cached rates are invalid: {}", e)))
    }

    /// Loads the cached rate set, migrating legacy keys when the unified key
    /// is absent.
    pub async fn load_or_migrate(&self) -> Result<Option<ExchangeRateSet>, FxError> {
        if let Some(set) = self.load()? {
            return Ok(Some(set));
        }
        self.migrate_legacy().await
    }

    /// Persists `rates` under the unified key.
    pub async fn save(&self, rates: &ExchangeRateSet) -> Result<(), FxError> {
        set_json(self.store.as_ref(), RATES_STORAGE_KEY, rates)
            .await
            .map_err(|e| FxError::Persistence(e.to_string()))
    }

    /// The persisted display currency, falling back to the legacy key.
    pub fn load_selected_currency(&self) -> Result<Option<String>, FxError> {
        for key in [SELECTED_CURRENCY_STORAGE_KEY, LEGACY_SELECTED_CURRENCY_KEY] {
            let stored: Option<String> = get_json(self.store.as_ref(), key)
                .map_err(|e| FxError::Persistence(e.to_string()))?;
            if let Some(code) = stored {
                let code = normalize_currency_code(&code);
                if is_valid_currency_code(&code) {
                    return Ok(Some(code));
                }
                log::warn!("Ignoring invalid currency code '{}' stored under '{}'", code, key);
            }
        }
        Ok(None)
    }

    pub async fn save_selected_currency(&self, code: &str) -> Result<(), FxError> {
        set_json(self.store.as_ref(), SELECTED_CURRENCY_STORAGE_KEY, &code)
            .await
            .map_err(|e| FxError::Persistence(e.to_string()))
    }

    /// The persisted display locale. The legacy key holds short tags
    /// (`tr`, `en`).
    pub fn load_selected_locale(&self) -> Result<Option<DisplayLocale>, FxError> {
        for key in [SELECTED_LOCALE_STORAGE_KEY, LEGACY_SELECTED_LOCALE_KEY] {
            let stored: Option<String> = get_json(self.store.as_ref(), key)
                .map_err(|e| FxError::Persistence(e.to_string()))?;
            if let Some(tag) = stored {
                match tag.parse::<DisplayLocale>() {
                    Ok(locale) => return Ok(Some(locale)),
                    Err(e) => log::warn!("Ignoring locale stored under '{}': {}", key, e),
                }
            }
        }
        Ok(None)
    }

    pub async fn save_selected_locale(&self, locale: DisplayLocale) -> Result<(), FxError> {
        set_json(self.store.as_ref(), SELECTED_LOCALE_STORAGE_KEY, &locale.as_str())
            .await
            .map_err(|e| FxError::Persistence(e.to_string()))
    }

    /// Moves the newest legacy rate record into the unified key and removes
    /// the legacy keys. Returns `None` when there is nothing to migrate.
    async fn migrate_legacy(&self) -> Result<Option<ExchangeRateSet>, FxError> {
        let candidates = [self.read_legacy_timestamped()?, self.read_legacy_last()?];
        let newest = candidates
            .into_iter()
            .flatten()
            .max_by_key(|set| set.last_updated);

        let Some(set) = newest else {
            return Ok(None);
        };

        log::info!(
            "Migrating legacy exchange rates ({} currencies, updated {:?})",
            set.rates.len(),
            set.last_updated
        );
        self.save(&set).await?;

        for key in [
            LEGACY_TIMESTAMPED_RATES_KEY,
            LEGACY_LAST_RATES_KEY,
            LEGACY_LAST_UPDATE_KEY,
        ] {
            if let Err(e) = self.store.remove(key).await {
                log::warn!("Failed to remove legacy key '{}': {}", key, e);
            }
        }

        Ok(Some(set))
    }

    fn read_legacy_timestamped(&self) -> Result<Option<ExchangeRateSet>, FxError> {
        let legacy: Option<LegacyTimestampedRates> =
            get_json(self.store.as_ref(), LEGACY_TIMESTAMPED_RATES_KEY)
                .map_err(|e| FxError::Persistence(e.to_string()))?;

        Ok(legacy.and_then(|record| {
            let updated = record.timestamp.as_ref().and_then(parse_legacy_timestamp);
            self.legacy_set(record.rates, updated, LEGACY_TIMESTAMPED_RATES_KEY)
        }))
    }

    fn read_legacy_last(&self) -> Result<Option<ExchangeRateSet>, FxError> {
        let rates: Option<BTreeMap<String, Decimal>> =
            get_json(self.store.as_ref(), LEGACY_LAST_RATES_KEY)
                .map_err(|e| FxError::Persistence(e.to_string()))?;
        let Some(rates) = rates else {
            return Ok(None);
        };

        let updated = self
            .store
            .get(LEGACY_LAST_UPDATE_KEY)
            .map_err(|e| FxError::Persistence(e.to_string()))?
            .as_ref()
            .and_then(parse_legacy_timestamp);

        Ok(self.legacy_set(rates, updated, LEGACY_LAST_RATES_KEY))
    }

    fn legacy_set(
        &self,
        rates: BTreeMap<String, Decimal>,
        updated: Option<DateTime<Utc>>,
        key: &str,
    ) -> Option<ExchangeRateSet> {
        match ExchangeRateSet::new(&self.base_currency, rates, updated) {
            Ok(set) if !set.is_empty() => Some(set),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Skipping legacy rates under '{}': {}", key, e);
                None
            }
        }
    }
}

/// Legacy timestamps are RFC 3339 strings or epoch milliseconds.
fn parse_legacy_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
