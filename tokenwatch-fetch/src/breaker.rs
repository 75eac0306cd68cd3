//! Circuit breaker around outbound API calls.

use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::FetchError;

/// The current state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation; failures are counted.
    Closed,
    /// Circuit tripped; calls fail immediately without invoking the
    /// wrapped operation.
    Open,
    /// A single trial call is allowed through to probe recovery.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
            CircuitState::HalfOpen => f.write_str("half-open"),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
}

/// A three-state circuit breaker.
///
/// Trips to Open after `failure_threshold` consecutive failures; after
/// `reset_timeout` has elapsed the next call is let through as a half-open
/// trial. The open-to-half-open transition is evaluated lazily when `call`
/// is invoked, never in the background.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Creates a breaker that opens after `failure_threshold` consecutive
    /// failures and allows a trial call `reset_timeout` after the last one.
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: 0,
                last_failure: None,
            }),
        }
    }

    /// Executes `op` with circuit breaker protection.
    ///
    /// If the circuit is Open and the reset timeout has not elapsed, fails
    /// immediately with [`FetchError::CircuitOpen`] without invoking `op`.
    /// Half-open admits exactly one trial call: the caller that performs
    /// the open-to-half-open transition. Concurrent callers arriving while
    /// that trial is in flight are rejected with `CircuitOpen` until the
    /// trial's outcome settles the state.
    ///
    /// Otherwise `op` runs exactly once and its own error (or success) is
    /// propagated unmodified after the state is updated.
    ///
    /// The lock is not held across the awaited operation; admission and
    /// recording are each a single critical section.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        {
            let mut inner = self.inner.lock().unwrap();
            match inner.state {
                CircuitState::Closed => {}
                CircuitState::Open => {
                    let elapsed_enough = inner
                        .last_failure
                        .is_some_and(|at| at.elapsed() > self.reset_timeout);

                    if elapsed_enough {
                        info!("circuit breaker half-open, allowing trial call");
                        inner.state = CircuitState::HalfOpen;
                    } else {
                        return Err(FetchError::CircuitOpen {
                            failures: inner.failures,
                        });
                    }
                }
                // A trial call is already in flight.
                CircuitState::HalfOpen => {
                    return Err(FetchError::CircuitOpen {
                        failures: inner.failures,
                    });
                }
            }
        }

        let result = op().await;

        let mut inner = self.inner.lock().unwrap();
        match &result {
            Ok(_) => Self::record_success(&mut inner),
            Err(err) => self.record_failure(&mut inner, err),
        }

        result
    }

    /// Returns the current state without updating it.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    /// Manually resets the breaker to Closed, clearing all counters.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.last_failure = None;
    }

    fn record_success(inner: &mut BreakerInner) {
        match inner.state {
            CircuitState::HalfOpen => {
                info!("circuit breaker closed after successful trial call");
                inner.state = CircuitState::Closed;
                inner.failures = 0;
            }
            CircuitState::Closed => {
                // Failures must be consecutive to trip the breaker.
                inner.failures = 0;
            }
            CircuitState::Open => {}
        }
    }

    fn record_failure(&self, inner: &mut BreakerInner, err: &FetchError) {
        inner.failures += 1;
        inner.last_failure = Some(Instant::now());

        match inner.state {
            CircuitState::Closed => {
                if inner.failures >= self.failure_threshold {
                    warn!(
                        failures = inner.failures,
                        error = %err,
                        "circuit breaker opened"
                    );
                    inner.state = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                warn!(error = %err, "trial call failed, circuit breaker reopened");
                inner.state = CircuitState::Open;
            }
            CircuitState::Open => {}
        }
    }
}
