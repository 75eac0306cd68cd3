// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `tokenwatch` Providers
//!
//! Platform-specific implementations for the `tokenwatch` application.
//!
//! Each provider module wraps one vendor's usage and billing APIs and
//! normalizes the payloads into the domain types from `tokenwatch-core`.
//! A provider module includes:
//!
//! - **Api**: Wire types mirroring the vendor's JSON responses
//! - **Parser**: Normalization from wire types into domain records
//! - **Provider**: The [`tokenwatch_core::Provider`] implementation,
//!   wiring together rate limiting, circuit breaking, retries, and
//!   response caching from `tokenwatch-fetch`
//!
//! ## Usage
//!
//! ```ignore
//! use tokenwatch_core::{Period, Provider};
//! use tokenwatch_providers::openai::{OpenAiConfig, OpenAiProvider};
//!
//! let provider = OpenAiProvider::new(OpenAiConfig::new("sk-admin-..."))?;
//! let summary = provider.consumption_summary(Period::Week).await?;
//! println!("{} tokens", summary.total_tokens);
//! ```

pub mod openai;

// Re-export key types
pub use openai::{OpenAiConfig, OpenAiProvider};
