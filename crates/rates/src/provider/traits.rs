//! Rate provider trait definition.

use async_trait::async_trait;

use crate::errors::RateProviderError;
use crate::models::RateSnapshot;

/// Trait for exchange rate providers.
///
/// Implement this trait to add a new rate source. A provider is stateless
/// from the caller's point of view: caching, staleness and fallback live in
/// the core `FxService`.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use bookshelf_rates::{RateProvider, RateProviderError, RateSnapshot};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl RateProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     async fn fetch_latest(&self, base: &str) -> Result<RateSnapshot, RateProviderError> {
///         // ... call the upstream API
///     }
/// }
/// ```
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs and snapshots.
    fn id(&self) -> &'static str;

    /// Fetch the latest rates quoted against `base`.
    ///
    /// # Returns
    ///
    /// A snapshot whose `rates` map holds one entry per quoted currency, or a
    /// `RateProviderError` describing whether the transport or the payload
    /// failed.
    async fn fetch_latest(&self, base: &str) -> Result<RateSnapshot, RateProviderError>;
}
