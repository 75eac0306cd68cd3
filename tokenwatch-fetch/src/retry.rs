//! Retry policy for HTTP requests.

use std::time::Duration;

/// Policy for retrying failed requests with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Multiplier applied per attempt.
    pub backoff_factor: f64,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given retry count and default backoff.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Sets the upper bound on any single delay.
    #[must_use]
    pub fn with_max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }

    /// Total attempts this policy allows (initial + retries).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before the retry following attempt number `attempt`
    /// (zero-based): `initial_backoff * backoff_factor^attempt`, capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.min(30) as i32);
        let delay = self.initial_backoff.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_backoff.as_secs_f64()))
    }

    /// Whether a response status is worth retrying: server errors and
    /// upstream throttling. Everything below 500 other than 429 is a
    /// client-side defect that retrying cannot fix.
    pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
        status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
    }

    #[test]
    fn test_max_backoff_cap() {
        let policy = RetryPolicy::new(10).with_max_backoff(Duration::from_secs(30));

        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(30));
    }

    #[test]
    fn test_retryable_statuses() {
        use reqwest::StatusCode;

        assert!(RetryPolicy::is_retryable_status(
            StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(RetryPolicy::is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(RetryPolicy::is_retryable_status(
            StatusCode::TOO_MANY_REQUESTS
        ));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_max_attempts() {
        assert_eq!(RetryPolicy::new(3).max_attempts(), 4);
        assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
    }
}
