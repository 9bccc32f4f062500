//! Bookshelf Rates Crate
//!
//! Provider-agnostic exchange rate fetching for the Bookshelf price display.
//!
//! # Overview
//!
//! A rate provider answers one question: given a base currency, what is one
//! unit of the base worth in each other currency? Providers return a
//! [`RateSnapshot`] and classify their failures as [`RateProviderError`]s so
//! the caller can tell transport problems from malformed payloads.
//!
//! ```text
//! +------------------+     +------------------+     +------------------+
//! |   FxService      | --> |  RateProvider    | --> |  RateSnapshot    |
//! |   (core crate)   |     |  (this crate)    |     |  base + rates    |
//! +------------------+     +------------------+     +------------------+
//! ```
//!
//! # Providers
//!
//! - [`ExchangeRateApiProvider`] - ExchangeRate-API (keyed or open endpoint)
//! - [`FixedRateProvider`] - static rates for offline use and tests

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::RateProviderError;
pub use models::RateSnapshot;
pub use provider::exchangerate_api::ExchangeRateApiProvider;
pub use provider::fixed::FixedRateProvider;
pub use provider::RateProvider;
