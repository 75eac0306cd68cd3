// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `tokenwatch` Fetch
//!
//! Resilient HTTP plumbing for the `tokenwatch` application.
//!
//! Outbound API calls are wrapped in a small cluster of resilience
//! primitives, composed from the outside in:
//!
//! - [`breaker::CircuitBreaker`] - fails fast while the upstream is down
//! - [`limiter::TokenBucket`] - admission control in front of every attempt
//! - [`client::HttpClient`] - retry/backoff loop around one round trip
//! - [`cache::ResponseCache`] - short-lived typed cache of prior responses
//!
//! Admission control sits in front of the retry loop, not behind it:
//! every retry attempt waits for its own permit.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokenwatch_fetch::{CircuitBreaker, HttpClient, TokenBucket};
//!
//! let limiter = Arc::new(TokenBucket::new(1.0, 5));
//! let client = HttpClient::new(limiter)?;
//! let breaker = CircuitBreaker::new(5, Duration::from_secs(60));
//!
//! let request = client.get("https://api.example.com/v1/usage").build()?;
//! let response = breaker.call(|| client.execute(request)).await?;
//! ```

pub mod breaker;
pub mod cache;
pub mod client;
pub mod error;
pub mod limiter;
pub mod retry;

// Re-export key types at crate root
pub use breaker::{CircuitBreaker, CircuitState};
pub use cache::{CacheKey, ResponseCache};
pub use client::{decode_json, HttpClient};
pub use error::FetchError;
pub use limiter::TokenBucket;
pub use retry::RetryPolicy;
