//! Rate store event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fx::DisplayLocale;

/// Events emitted by the rate store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FxEvent {
    /// The active rate set was replaced.
    #[serde(rename_all = "camelCase")]
    RatesUpdated {
        base: String,
        last_updated: Option<DateTime<Utc>>,
        /// True when the set came from storage after a failed fetch
        from_cache: bool,
    },

    /// The user's display currency changed.
    SelectedCurrencyChanged { currency: String },

    /// The user's display locale changed.
    LocaleChanged { locale: DisplayLocale },

    /// A display-only error, such as a failed refresh.
    SoftError { message: String },
}

impl FxEvent {
    pub fn rates_updated(
        base: impl Into<String>,
        last_updated: Option<DateTime<Utc>>,
        from_cache: bool,
    ) -> Self {
        FxEvent::RatesUpdated {
            base: base.into(),
            last_updated,
            from_cache,
        }
    }

    pub fn selected_currency_changed(currency: impl Into<String>) -> Self {
        FxEvent::SelectedCurrencyChanged {
            currency: currency.into(),
        }
    }

    pub fn locale_changed(locale: DisplayLocale) -> Self {
        FxEvent::LocaleChanged { locale }
    }

    pub fn soft_error(message: impl Into<String>) -> Self {
        FxEvent::SoftError {
            message: message.into(),
        }
    }

    /// Event name used by streaming adapters.
    pub fn name(&self) -> &'static str {
        match self {
            FxEvent::RatesUpdated { .. } => "rates_updated",
            FxEvent::SelectedCurrencyChanged { .. } => "selected_currency_changed",
            FxEvent::LocaleChanged { .. } => "locale_changed",
            FxEvent::SoftError { .. } => "soft_error",
        }
    }
}
