use async_trait::async_trait;

use super::currency::CurrencyInfo;
use super::currency_formatter::DisplayLocale;
use super::fx_model::{DisplayPrice, ExchangeRateSet, Money, RefreshOutcome};
use crate::errors::Result;

/// Trait defining the contract for the rate store.
#[async_trait]
pub trait FxServiceTrait: Send + Sync {
    /// Loads the persisted display currency and makes sure rates are loaded.
    /// Rate failures are reported as soft errors, not returned.
    async fn initialize(&self) -> Result<()>;

    /// Fetches current rates. Concurrent calls share one provider request.
    async fn refresh(&self) -> RefreshOutcome;

    /// Returns the cached rates, refreshing first when they are stale or
    /// missing.
    async fn ensure_fresh(&self) -> RefreshOutcome;

    fn rates(&self) -> Option<ExchangeRateSet>;
    fn is_stale(&self) -> bool;
    fn is_refreshing(&self) -> bool;
    fn last_error(&self) -> Option<String>;

    fn base_currency(&self) -> &str;
    fn locale(&self) -> DisplayLocale;
    fn selected_currency(&self) -> String;

    /// Persists and activates a new display currency.
    async fn select_currency(&self, code: &str) -> Result<String>;

    /// Persists and activates a new display locale.
    async fn select_locale(&self, locale: DisplayLocale) -> Result<DisplayLocale>;

    fn supported_currencies(&self) -> Vec<CurrencyInfo>;

    fn convert(&self, money: &Money, to: &str) -> Result<Money>;
    fn convert_to_selected(&self, money: &Money) -> Result<Money>;
    fn format(&self, money: &Money) -> String;

    /// Converts to the display currency and formats. Never fails: on error
    /// the unconverted amount is shown.
    fn display_price(&self, money: &Money) -> DisplayPrice;
}
