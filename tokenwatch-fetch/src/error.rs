//! Fetch error types.

use thiserror::Error;

use tokenwatch_core::ProviderError;

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed at the transport level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The rate limiter could not grant a permit before the deadline.
    ///
    /// Sentinel error: terminal for the attempt, never retried.
    #[error("Would exceed deadline while waiting for a rate limit permit")]
    WouldExceedDeadline,

    /// The circuit breaker is open; the operation was not invoked.
    ///
    /// Sentinel error: terminal for the call, never retried.
    #[error("Circuit breaker is open after {failures} consecutive failures")]
    CircuitOpen {
        /// Consecutive failures recorded when the circuit opened.
        failures: u32,
    },

    /// Rate limited by the upstream (429), retries exhausted.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, from the `Retry-After` header.
        retry_after: Option<u64>,
    },

    /// The upstream rejected the credentials (401).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Credentials lack the required scope (403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A non-retryable client-side error status (4xx).
    #[error("Request failed with client error status {status}")]
    ClientError {
        /// HTTP status code.
        status: u16,
    },

    /// An upstream server error status (5xx).
    #[error("Upstream server error (status {status})")]
    UpstreamServer {
        /// HTTP status code.
        status: u16,
    },

    /// All retry attempts were used up; wraps the last failure.
    #[error("Request failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Total attempts made (initial + retries).
        attempts: u32,
        /// The final underlying failure.
        #[source]
        source: Box<FetchError>,
    },

    /// Malformed response payload.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Programming or invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FetchError> for ProviderError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Http(e) => ProviderError::Network(e.to_string()),
            // Local admission control timing out is still throttling from
            // the caller's point of view.
            FetchError::WouldExceedDeadline => ProviderError::RateLimited { retry_after: None },
            FetchError::CircuitOpen { .. } => ProviderError::CircuitOpen,
            FetchError::RateLimited { retry_after } => ProviderError::RateLimited { retry_after },
            FetchError::AuthenticationFailed(msg) => ProviderError::Authentication(msg),
            FetchError::Forbidden(msg) => ProviderError::Authorization(msg),
            FetchError::ClientError { status } => {
                ProviderError::InvalidResponse(format!("unexpected status {status}"))
            }
            FetchError::UpstreamServer { status } => ProviderError::UpstreamServer { status },
            // Classify exhaustion by what finally failed.
            FetchError::RetriesExhausted { source, .. } => ProviderError::from(*source),
            FetchError::InvalidResponse(msg) => ProviderError::InvalidResponse(msg),
            FetchError::Json(e) => ProviderError::InvalidResponse(e.to_string()),
            FetchError::Internal(msg) => ProviderError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_classified_by_final_failure() {
        let err = FetchError::RetriesExhausted {
            attempts: 4,
            source: Box::new(FetchError::UpstreamServer { status: 502 }),
        };
        assert!(matches!(
            ProviderError::from(err),
            ProviderError::UpstreamServer { status: 502 }
        ));
    }

    #[test]
    fn test_circuit_open_maps_to_sentinel() {
        let err = FetchError::CircuitOpen { failures: 5 };
        assert!(matches!(ProviderError::from(err), ProviderError::CircuitOpen));
    }
}
