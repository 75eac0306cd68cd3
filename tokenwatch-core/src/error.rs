//! Core error types for `tokenwatch`.

use thiserror::Error;

/// Core error type for `tokenwatch` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Platform not found or not configured.
    #[error("Platform not found: {0}")]
    PlatformNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Error taxonomy surfaced by [`Provider`](crate::traits::Provider)
/// implementations.
///
/// The variants distinguish credential problems (re-run setup), throttling
/// (a retry is already in flight), connectivity (check the network), and
/// upstream outages. The underlying cause travels along as a message.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing or invalid credentials before any request was made.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The upstream rejected the credentials (401).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Credentials are valid but lack the required scope (403).
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// The upstream is throttling us (429).
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if the upstream said.
        retry_after: Option<u64>,
    },

    /// Transport-level failure (DNS, connection refused, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream returned a server error (5xx) even after retries.
    #[error("Upstream server error (status {status})")]
    UpstreamServer {
        /// HTTP status code of the final failed attempt.
        status: u16,
    },

    /// The circuit breaker is open; no request was attempted.
    #[error("Circuit open: upstream calls are suspended")]
    CircuitOpen,

    /// Malformed response payload.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Programming or invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Returns true if this error indicates a credential problem the user
    /// can fix by reconfiguring.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            ProviderError::Config(_)
                | ProviderError::Authentication(_)
                | ProviderError::Authorization(_)
        )
    }

    /// Returns true if this is a transient error that might succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::Network(_)
                | ProviderError::UpstreamServer { .. }
                | ProviderError::CircuitOpen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_classification() {
        assert!(ProviderError::Config("no key".into()).is_credential_error());
        assert!(ProviderError::Authentication("401".into()).is_credential_error());
        assert!(!ProviderError::Network("refused".into()).is_credential_error());
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::CircuitOpen.is_transient());
        assert!(ProviderError::RateLimited { retry_after: None }.is_transient());
        assert!(!ProviderError::Config("no key".into()).is_transient());
    }
}
