//! Error types for rate providers.

use thiserror::Error;

/// Errors that can occur while fetching exchange rates.
///
/// Callers only need to distinguish two families: transport failures
/// ([`is_transport`](Self::is_transport)) and everything the provider sent
/// back that could not be used.
#[derive(Error, Debug)]
pub enum RateProviderError {
    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("Network error: {provider} - {message}")]
    Network {
        /// The provider that was being called
        provider: String,
        /// The underlying transport error
        message: String,
    },

    /// The request did not complete within the client timeout.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The response body could not be decoded into a rate table.
    #[error("Malformed payload from {provider}: {message}")]
    Parse {
        /// The provider that sent the payload
        provider: String,
        /// What was wrong with it
        message: String,
    },

    /// The provider answered but reported an error (bad key, quota, ...).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider cannot quote rates against this base currency.
    #[error("Unsupported base currency: {0}")]
    UnsupportedBase(String),
}

impl RateProviderError {
    /// True for failures where no usable response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// Classifies a `reqwest` error raised while talking to `provider`.
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else if err.is_decode() {
            Self::Parse {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Network {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_and_timeout_are_transport() {
        let network = RateProviderError::Network {
            provider: "EXCHANGERATE_API".to_string(),
            message: "connection refused".to_string(),
        };
        let timeout = RateProviderError::Timeout {
            provider: "EXCHANGERATE_API".to_string(),
        };
        assert!(network.is_transport());
        assert!(timeout.is_transport());
    }

    #[test]
    fn test_payload_errors_are_not_transport() {
        let parse = RateProviderError::Parse {
            provider: "EXCHANGERATE_API".to_string(),
            message: "missing field `conversion_rates`".to_string(),
        };
        let provider = RateProviderError::ProviderError {
            provider: "EXCHANGERATE_API".to_string(),
            message: "invalid-key".to_string(),
        };
        assert!(!parse.is_transport());
        assert!(!provider.is_transport());
        assert!(!RateProviderError::UnsupportedBase("XYZ".to_string()).is_transport());
    }

    #[test]
    fn test_error_display() {
        let error = RateProviderError::Timeout {
            provider: "EXCHANGERATE_API".to_string(),
        };
        assert_eq!(format!("{}", error), "Timeout: EXCHANGERATE_API");

        let error = RateProviderError::ProviderError {
            provider: "EXCHANGERATE_API".to_string(),
            message: "quota-reached".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Provider error: EXCHANGERATE_API - quota-reached"
        );
    }
}
