//! Domain models for `tokenwatch`.
//!
//! This module contains the domain types shared across the workspace:
//! - [`Platform`] and [`Period`] identify what is queried and for how long
//! - [`Consumption`] / [`ConsumptionSummary`] for token usage
//! - [`CostRecord`] / [`CostSummary`] for billing line items

mod consumption;
mod cost;
mod period;
mod platform;

pub use consumption::{summarize_consumption_by_model, Consumption, ConsumptionSummary};
pub use cost::{summarize_costs_by_model, CostRecord, CostSummary};
pub use period::Period;
pub use platform::Platform;
