//! FX (Foreign Exchange) module - rate sets, conversion, formatting and the
//! rate store service.

pub mod currency;
pub mod currency_converter;
pub mod currency_formatter;
mod fx_config;
mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;
pub mod rate_cache;


pub use currency::{
    currency_catalogue, find_currency, is_valid_currency_code, normalize_currency_code,
    CurrencyInfo,
};
pub use currency_converter::{convert, CurrencyConverter};
pub use currency_formatter::{format_amount, DisplayLocale};
pub use fx_config::FxConfig;
pub use fx_errors::FxError;
pub use fx_model::{DisplayPrice, ExchangeRateSet, Money, RefreshOutcome};
pub use fx_service::FxService;
pub use fx_traits::FxServiceTrait;
pub use rate_cache::{is_stale, RateCache};
