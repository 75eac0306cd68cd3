//! HTTP client with admission control and retry.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::limiter::TokenBucket;
use crate::retry::RetryPolicy;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client that gates every attempt through a rate limiter and
/// retries transient failures with exponential backoff.
///
/// Retries and admission control compose per attempt: each retry waits
/// for its own permit, so backing off never bypasses the limiter.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    limiter: Arc<TokenBucket>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a client with default timeout and retry policy.
    pub fn new(limiter: Arc<TokenBucket>) -> Result<Self, FetchError> {
        Self::with_timeout(limiter, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with a custom request timeout. The timeout also
    /// bounds how long an attempt may wait for a rate limit permit.
    pub fn with_timeout(limiter: Arc<TokenBucket>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tokenwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: client,
            limiter,
            retry: RetryPolicy::default(),
            timeout,
        })
    }

    /// Sets the retry policy for this client.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Starts building a GET request against `url`.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.inner.get(url)
    }

    /// Executes a request, retrying transient failures.
    ///
    /// Server errors (5xx) and throttling (429, honoring `Retry-After`)
    /// are retried up to the policy's limit. Authentication failures,
    /// other client errors, and rate limiter deadline misses are
    /// returned immediately.
    pub async fn execute(&self, request: reqwest::Request) -> Result<Response, FetchError> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            // Permit acquisition failing fast is terminal: retrying would
            // just queue more load behind an exhausted bucket.
            self.limiter.acquire(self.timeout).await?;

            let req = request
                .try_clone()
                .ok_or_else(|| FetchError::Internal("request body is not cloneable".into()))?;

            debug!(url = %req.url(), attempt, "sending request");

            match self.inner.execute(req).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(FetchError::AuthenticationFailed(
                            "invalid or expired credentials".to_string(),
                        ));
                    }
                    if status == reqwest::StatusCode::FORBIDDEN {
                        return Err(FetchError::Forbidden(
                            "credentials lack the required scope".to_string(),
                        ));
                    }

                    if RetryPolicy::is_retryable_status(status) {
                        let throttled = status == reqwest::StatusCode::TOO_MANY_REQUESTS;
                        let retry_after = throttled.then(|| parse_retry_after(&response)).flatten();

                        if attempt < max_attempts {
                            // A Retry-After hint overrides the backoff curve.
                            let delay = retry_after
                                .map(Duration::from_secs)
                                .unwrap_or_else(|| self.retry.delay_for_attempt(attempt - 1));
                            warn!(
                                status = status.as_u16(),
                                attempt,
                                delay_secs = delay.as_secs_f64(),
                                "transient upstream failure, retrying"
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }

                        let source = if throttled {
                            FetchError::RateLimited { retry_after }
                        } else {
                            FetchError::UpstreamServer {
                                status: status.as_u16(),
                            }
                        };
                        return Err(FetchError::RetriesExhausted {
                            attempts: attempt,
                            source: Box::new(source),
                        });
                    }

                    // Remaining 4xx: the request itself is wrong, do not retry.
                    return Err(FetchError::ClientError {
                        status: status.as_u16(),
                    });
                }
                Err(e) => {
                    if attempt < max_attempts {
                        let delay = self.retry.delay_for_attempt(attempt - 1);
                        warn!(
                            error = %e,
                            attempt,
                            delay_secs = delay.as_secs_f64(),
                            "request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(e.into()),
                    });
                }
            }
        }
    }
}

/// Reads a response body and decodes it as JSON.
///
/// The raw payload is logged at debug level before deserialization, so
/// running with the verbose flag shows exactly what the upstream sent.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let url = response.url().clone();
    let body = response.text().await?;
    debug!(url = %url, body = %body, "response body");
    Ok(serde_json::from_str(&body)?)
}

fn parse_retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
