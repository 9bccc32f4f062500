use bookshelf_rates::RateProviderError;
use thiserror::Error;

/// Errors raised by the rate store, converter and formatter.
///
/// None of these are fatal: refresh failures fall back to the last cached
/// rates and display failures fall back to the unconverted amount.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FxError {
    /// The rate provider could not be reached or timed out.
    #[error("Rate fetch failed: {0}")]
    Network(String),

    /// The rate provider answered with something unusable.
    #[error("Malformed rate payload: {0}")]
    Parse(String),

    /// A conversion needed a rate the current set does not hold.
    #[error("No exchange rate available for {0}")]
    MissingRate(String),

    /// Reading or writing the key-value store failed.
    #[error("Rate storage failed: {0}")]
    Persistence(String),

    #[error("Invalid currency code: {0}")]
    InvalidCurrencyCode(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Rate cache error: {0}")]
    CacheError(String),
}

impl From<RateProviderError> for FxError {
    fn from(err: RateProviderError) -> Self {
        if err.is_transport() {
            FxError::Network(err.to_string())
        } else {
            FxError::Parse(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_map_to_network() {
        let err: FxError = RateProviderError::Timeout {
            provider: "EXCHANGERATE_API".to_string(),
        }
        .into();
        assert!(matches!(err, FxError::Network(_)));
    }

    #[test]
    fn test_payload_errors_map_to_parse() {
        let err: FxError = RateProviderError::ProviderError {
            provider: "EXCHANGERATE_API".to_string(),
            message: "invalid-key".to_string(),
        }
        .into();
        assert!(matches!(err, FxError::Parse(_)));
    }
}
