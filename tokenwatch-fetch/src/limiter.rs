//! Token-bucket rate limiter.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::FetchError;

/// A token-bucket rate limiter.
///
/// Permits accumulate continuously at the configured rate up to the burst
/// capacity, so short bursts are allowed while sustained throughput stays
/// bounded. The permit counter never exceeds the burst capacity and never
/// goes negative.
///
/// Shared across every attempt a client makes, including retries, so that
/// retrying does not amplify load on a saturated upstream.
#[derive(Debug)]
pub struct TokenBucket {
    /// Permits added per second.
    rate: f64,
    /// Maximum stored permits.
    burst: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    permits: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a bucket that refills at `rate` permits per second with the
    /// given burst capacity. The bucket starts full.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is not positive or `burst` is zero.
    pub fn new(rate: f64, burst: u32) -> Self {
        assert!(rate > 0.0, "refill rate must be positive");
        assert!(burst > 0, "burst capacity must be at least 1");

        Self {
            rate,
            burst: f64::from(burst),
            state: Mutex::new(BucketState {
                permits: f64::from(burst),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Waits until one permit is available, then consumes it.
    ///
    /// Fails fast with [`FetchError::WouldExceedDeadline`] if the wait for
    /// the next permit cannot complete within `deadline`; no permit is
    /// consumed in that case. Dropping the returned future while sleeping
    /// also leaves the bucket untouched.
    pub async fn acquire(&self, deadline: Duration) -> Result<(), FetchError> {
        let started = Instant::now();

        loop {
            let wait = {
                let mut state = self.state.lock().unwrap();
                self.refill(&mut state);

                if state.permits >= 1.0 {
                    state.permits -= 1.0;
                    return Ok(());
                }

                // Time until one whole permit has accumulated.
                Duration::from_secs_f64((1.0 - state.permits) / self.rate)
            };

            if started.elapsed() + wait > deadline {
                return Err(FetchError::WouldExceedDeadline);
            }

            tokio::time::sleep(wait).await;
        }
    }

    /// Consumes a permit if one is immediately available.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        self.refill(&mut state);

        if state.permits >= 1.0 {
            state.permits -= 1.0;
            true
        } else {
            false
        }
    }

    /// Adds permits for the time elapsed since the last refill, clamped to
    /// the burst capacity.
    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        state.permits = (state.permits + elapsed.as_secs_f64() * self.rate).min(self.burst);
        state.last_refill = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_bound() {
        // Slow refill so the window cannot top the bucket up mid-test.
        let bucket = TokenBucket::new(0.1, 3);

        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
    }

    #[test]
    fn test_permits_capped_at_burst() {
        let bucket = TokenBucket::new(1000.0, 2);
        std::thread::sleep(Duration::from_millis(50));

        // Even after plenty of refill time, only `burst` instantaneous grabs.
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_refill() {
        let bucket = TokenBucket::new(100.0, 1);
        assert!(bucket.try_acquire());

        // ~10ms until the next permit; well inside the deadline.
        bucket.acquire(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_acquire_fails_fast_past_deadline() {
        let bucket = TokenBucket::new(0.1, 1);
        assert!(bucket.try_acquire());

        // Next permit is ~10s away; a 20ms deadline must fail immediately.
        let started = Instant::now();
        let result = bucket.acquire(Duration::from_millis(20)).await;

        assert!(matches!(result, Err(FetchError::WouldExceedDeadline)));
        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
