//! OpenAI organization usage and cost provider.
//!
//! Talks to the OpenAI admin APIs:
//!
//! - `GET /v1/organization/usage/completions` for token consumption
//! - `GET /v1/organization/costs` for billed amounts
//!
//! Both endpoints are cursor-paginated and require an admin API key.

pub mod api;
pub mod parser;
pub mod provider;

pub use provider::{OpenAiConfig, OpenAiProvider};
