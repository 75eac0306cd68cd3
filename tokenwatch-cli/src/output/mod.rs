//! Output formatting for CLI.

mod json;
mod text;

pub use json::{CostOutput, JsonFormatter, UsageOutput};
pub use text::TextFormatter;

use tokenwatch_core::Platform;

/// Combined usage and cost totals for one platform, as shown by the
/// summary and watch commands.
#[derive(Debug, Clone)]
pub struct PlatformTotals {
    /// Prompt tokens over the window.
    pub input_tokens: i64,
    /// Completion tokens over the window.
    pub output_tokens: i64,
    /// Total tokens over the window.
    pub total_tokens: i64,
    /// Requests over the window.
    pub requests: i64,
    /// Billed cost over the window.
    pub total_cost: f64,
    /// Currency of `total_cost`, empty when no cost data exists.
    pub currency: String,
}

/// Per-platform outcome of a summary fetch. Failures carry the error
/// text so one broken platform never hides the others.
#[derive(Debug, Clone)]
pub struct PlatformSummary {
    /// The platform queried.
    pub platform: Platform,
    /// Totals, or the failure rendered as text.
    pub result: Result<PlatformTotals, String>,
}
