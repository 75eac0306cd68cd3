//! Wire types for the OpenAI organization usage and cost APIs.

use serde::Deserialize;

// ============================================================================
// Constants
// ============================================================================

/// OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Completions usage endpoint, relative to the base URL.
pub const USAGE_ENDPOINT: &str = "/organization/usage/completions";

/// Costs endpoint, relative to the base URL.
pub const COSTS_ENDPOINT: &str = "/organization/costs";

// ============================================================================
// Pagination envelope
// ============================================================================

/// One page of a cursor-paginated response.
///
/// Both the usage and cost endpoints share this shape; only the bucket
/// payload differs.
#[derive(Debug, Deserialize)]
pub struct Page<B> {
    /// Time buckets in this page.
    #[serde(default = "Vec::new")]
    pub data: Vec<B>,

    /// Whether more pages follow.
    #[serde(default)]
    pub has_more: bool,

    /// Cursor for the next page. May be absent even when `has_more` is
    /// set; callers must treat that as end of data.
    #[serde(default)]
    pub next_page: Option<String>,
}

// ============================================================================
// Usage types
// ============================================================================

/// One time bucket of usage results.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageBucket {
    /// Bucket start, unix seconds.
    #[serde(default)]
    pub start_time: i64,

    /// Bucket end, unix seconds.
    #[serde(default)]
    pub end_time: i64,

    /// Per-model results within the bucket.
    #[serde(default)]
    pub results: Vec<UsageResult>,
}

/// Usage for one model within a bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageResult {
    /// Model identifier. Absent when the query is not grouped by model.
    #[serde(default)]
    pub model: Option<String>,

    /// Prompt tokens.
    #[serde(default)]
    pub input_tokens: i64,

    /// Completion tokens.
    #[serde(default)]
    pub output_tokens: i64,

    /// Request count.
    #[serde(default)]
    pub num_model_requests: i64,
}

// ============================================================================
// Cost types
// ============================================================================

/// One time bucket of cost results.
#[derive(Debug, Clone, Deserialize)]
pub struct CostBucket {
    /// Bucket start, unix seconds.
    #[serde(default)]
    pub start_time: i64,

    /// Bucket end, unix seconds.
    #[serde(default)]
    pub end_time: i64,

    /// Per-line-item results within the bucket.
    #[serde(default)]
    pub results: Vec<CostResult>,
}

/// Cost for one line item within a bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct CostResult {
    /// Billing line item, e.g. `"gpt-4o-2024-08-06, input"`.
    #[serde(default)]
    pub line_item: Option<String>,

    /// Billed amount.
    pub amount: CostAmount,
}

/// A monetary amount.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CostAmount {
    /// Numeric value.
    #[serde(default)]
    pub value: f64,

    /// ISO currency code, lowercased by the API.
    #[serde(default)]
    pub currency: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usage_page() {
        let json = r#"{
            "object": "page",
            "data": [{
                "object": "bucket",
                "start_time": 1730419200,
                "end_time": 1730505600,
                "results": [{
                    "object": "organization.usage.completions.result",
                    "model": "gpt-4o-2024-08-06",
                    "input_tokens": 1500,
                    "output_tokens": 300,
                    "num_model_requests": 12
                }]
            }],
            "has_more": true,
            "next_page": "page_abc123"
        }"#;

        let page: Page<UsageBucket> = serde_json::from_str(json).unwrap();
        assert!(page.has_more);
        assert_eq!(page.next_page.as_deref(), Some("page_abc123"));
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].results[0].input_tokens, 1500);
        assert_eq!(
            page.data[0].results[0].model.as_deref(),
            Some("gpt-4o-2024-08-06")
        );
    }

    #[test]
    fn test_parse_cost_page() {
        let json = r#"{
            "data": [{
                "start_time": 1730419200,
                "end_time": 1730505600,
                "results": [{
                    "line_item": "gpt-4o-2024-08-06, input",
                    "amount": { "value": 3.25, "currency": "usd" }
                }]
            }],
            "has_more": false
        }"#;

        let page: Page<CostBucket> = serde_json::from_str(json).unwrap();
        assert!(!page.has_more);
        assert!(page.next_page.is_none());
        assert_eq!(page.data[0].results[0].amount.value, 3.25);
        assert_eq!(page.data[0].results[0].amount.currency, "usd");
    }

    #[test]
    fn test_missing_fields_default() {
        let page: Page<UsageBucket> = serde_json::from_str("{}").unwrap();
        assert!(page.data.is_empty());
        assert!(!page.has_more);
        assert!(page.next_page.is_none());
    }
}
