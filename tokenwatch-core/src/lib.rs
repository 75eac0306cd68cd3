// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `tokenwatch` Core
//!
//! Core types, models, and traits for the `tokenwatch` application.
//!
//! This crate provides the foundational abstractions used across all other
//! `tokenwatch` crates, including:
//!
//! - Domain models (consumption, cost records, summaries)
//! - Error taxonomy shared by providers and the CLI
//! - The [`Provider`] trait that platform implementations satisfy
//! - Reporting periods and their time windows
//!
//! ## Key Types
//!
//! ### Platform & Period
//! - [`Platform`] - Enum of supported billing platforms
//! - [`Period`] - Reporting periods (`1d`, `7d`, `30d`, ...)
//!
//! ### Usage
//! - [`Consumption`] - Normalized token usage for one model/time bucket
//! - [`ConsumptionSummary`] - Aggregated usage totals
//!
//! ### Cost
//! - [`CostRecord`] - Normalized cost for one line item/time bucket
//! - [`CostSummary`] - Aggregated cost with line-item breakdown

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::{CoreError, ProviderError};

// Re-export all model types
pub use models::{
    // Platform & period
    Period,
    Platform,
    // Usage
    Consumption,
    ConsumptionSummary,
    // Cost
    CostRecord,
    CostSummary,
    // Aggregation helpers
    summarize_consumption_by_model,
    summarize_costs_by_model,
};

// Re-export traits
pub use traits::Provider;
