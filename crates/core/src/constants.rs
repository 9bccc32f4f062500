/// Currency every stored rate is quoted against
pub const DEFAULT_BASE_CURRENCY: &str = "TRY";

/// Currencies kept from a provider payload
pub const DEFAULT_TRACKED_CURRENCIES: &[&str] = &["USD", "EUR", "GBP"];

/// Maximum age of a cached rate set before it is refreshed (30 minutes)
pub const DEFAULT_STALENESS_SECS: u64 = 30 * 60;

/// Upper bound for one provider round trip
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Decimal places shown for prices
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Storage key of the cached rate set
pub const RATES_STORAGE_KEY: &str = "currency_rates";

/// Storage key of the user's display currency
pub const SELECTED_CURRENCY_STORAGE_KEY: &str = "selected_currency";

/// Storage key of the user's display locale
pub const SELECTED_LOCALE_STORAGE_KEY: &str = "selected_locale";

/// Keys written by earlier releases, read once and migrated
pub const LEGACY_TIMESTAMPED_RATES_KEY: &str = "exchange_rates";
pub const LEGACY_LAST_RATES_KEY: &str = "lastCurrencyRates";
pub const LEGACY_LAST_UPDATE_KEY: &str = "lastCurrencyUpdate";
pub const LEGACY_SELECTED_CURRENCY_KEY: &str = "app_currency";
pub const LEGACY_SELECTED_LOCALE_KEY: &str = "app_locale";

/// Soft error shown when a refresh failed but saved rates are available
pub const SOFT_ERROR_USING_SAVED_RATES: &str =
    "Current exchange rates could not be fetched; showing the last saved rates.";

/// Soft error shown when a refresh failed and nothing is saved
pub const SOFT_ERROR_NO_RATES: &str =
    "Exchange rates could not be fetched and no saved rates are available.";

/// Soft error shown when fresh rates could not be written to storage
pub const SOFT_ERROR_RATES_NOT_SAVED: &str =
    "Exchange rates were updated but could not be saved.";
