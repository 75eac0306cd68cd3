//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;
use tokenwatch_core::{ConsumptionSummary, CostSummary, Period};

use super::PlatformSummary;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for the usage command, one entry per platform.
#[derive(Debug, Serialize)]
pub struct UsageOutput {
    pub platform: String,
    pub period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<ConsumptionSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<ConsumptionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON output for the cost command, one entry per platform.
#[derive(Debug, Serialize)]
pub struct CostOutput {
    pub platform: String,
    pub period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<CostSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<CostSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One platform entry in the summary output.
#[derive(Debug, Serialize)]
pub struct SummaryItem {
    pub platform: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary output wrapper.
#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    pub period: String,
    pub platforms: Vec<SummaryItem>,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the summary command's per-platform results.
    pub fn format_summary(
        &self,
        period: Period,
        summaries: &[PlatformSummary],
    ) -> Result<String> {
        let platforms = summaries
            .iter()
            .map(|summary| match &summary.result {
                Ok(totals) => SummaryItem {
                    platform: summary.platform.as_str().to_string(),
                    status: "ok".to_string(),
                    total_tokens: Some(totals.total_tokens),
                    requests: Some(totals.requests),
                    total_cost: Some(totals.total_cost),
                    currency: Some(totals.currency.clone()),
                    error: None,
                },
                Err(e) => SummaryItem {
                    platform: summary.platform.as_str().to_string(),
                    status: "error".to_string(),
                    total_tokens: None,
                    requests: None,
                    total_cost: None,
                    currency: None,
                    error: Some(e.clone()),
                },
            })
            .collect();

        self.format(&SummaryOutput {
            period: period.label().to_string(),
            platforms,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
