//! Token consumption records and aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Period, Platform};

/// Normalized token usage for one model within one time bucket.
///
/// Constructed once from a vendor response page and never mutated;
/// `total_tokens` is always derived from input + output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consumption {
    /// Platform this record came from.
    pub platform: Platform,
    /// Model identifier as reported by the vendor.
    pub model: String,
    /// Input (prompt) token count.
    pub input_tokens: i64,
    /// Output (completion) token count.
    pub output_tokens: i64,
    /// Derived total, input + output.
    pub total_tokens: i64,
    /// Number of model requests in the bucket.
    pub request_count: i64,
    /// Bucket start.
    pub start_time: DateTime<Utc>,
    /// Bucket end.
    pub end_time: DateTime<Utc>,
}

impl Consumption {
    /// Creates a new consumption record. `total_tokens` is computed.
    pub fn new(
        platform: Platform,
        model: impl Into<String>,
        input_tokens: i64,
        output_tokens: i64,
        request_count: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            platform,
            model: model.into(),
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            request_count,
            start_time,
            end_time,
        }
    }
}

/// Aggregated token usage over a period.
///
/// Totals only ever grow as records are folded in; folding is commutative,
/// so record order does not matter. An empty model means the summary spans
/// every model in the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionSummary {
    /// Platform the summary covers.
    pub platform: Platform,
    /// Model the summary covers, or empty for all models.
    pub model: String,
    /// Total input tokens.
    pub total_input_tokens: i64,
    /// Total output tokens.
    pub total_output_tokens: i64,
    /// Total tokens (input + output).
    pub total_tokens: i64,
    /// Total request count.
    pub total_requests: i64,
    /// Period label (e.g. "7d").
    pub period: String,
    /// Window start.
    pub start_time: DateTime<Utc>,
    /// Window end.
    pub end_time: DateTime<Utc>,
}

impl ConsumptionSummary {
    /// Creates an empty summary for the given grouping key and window.
    pub fn new(
        platform: Platform,
        model: impl Into<String>,
        period: Period,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            platform,
            model: model.into(),
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_tokens: 0,
            total_requests: 0,
            period: period.label().to_string(),
            start_time,
            end_time,
        }
    }

    /// Folds one consumption record into the running totals.
    pub fn add_consumption(&mut self, consumption: &Consumption) {
        self.total_input_tokens += consumption.input_tokens;
        self.total_output_tokens += consumption.output_tokens;
        self.total_tokens += consumption.total_tokens;
        self.total_requests += consumption.request_count;
    }

    /// Returns true if no records have been folded in.
    pub fn is_empty(&self) -> bool {
        self.total_tokens == 0 && self.total_requests == 0
    }
}

/// Groups consumption records by model, producing one summary per distinct
/// model, sorted by model name for deterministic output.
pub fn summarize_consumption_by_model(
    platform: Platform,
    period: Period,
    window: (DateTime<Utc>, DateTime<Utc>),
    records: &[Consumption],
) -> Vec<ConsumptionSummary> {
    let mut by_model: BTreeMap<&str, ConsumptionSummary> = BTreeMap::new();

    for record in records {
        by_model
            .entry(record.model.as_str())
            .or_insert_with(|| {
                ConsumptionSummary::new(platform, record.model.clone(), period, window.0, window.1)
            })
            .add_consumption(record);
    }

    by_model.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2025, 8, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 8, 17, 0, 0, 0).unwrap(),
        )
    }

    fn sample_records() -> Vec<Consumption> {
        let (start, end) = window();
        vec![
            Consumption::new(Platform::OpenAi, "gpt-4o", 1872, 3099, 12, start, end),
            Consumption::new(Platform::OpenAi, "gpt-4o-mini", 10, 71, 1, start, end),
        ]
    }

    #[test]
    fn test_total_is_derived() {
        let record = sample_records().remove(0);
        assert_eq!(record.total_tokens, 1872 + 3099);
    }

    #[test]
    fn test_combined_totals_scenario() {
        let (start, end) = window();
        let mut summary =
            ConsumptionSummary::new(Platform::OpenAi, "", Period::Week, start, end);
        for record in &sample_records() {
            summary.add_consumption(record);
        }

        assert_eq!(summary.total_input_tokens, 1882);
        assert_eq!(summary.total_output_tokens, 3170);
        assert_eq!(summary.total_tokens, 5052);
        assert_eq!(summary.total_requests, 13);
    }

    #[test]
    fn test_fold_is_commutative() {
        let (start, end) = window();
        let records = sample_records();

        let mut forward =
            ConsumptionSummary::new(Platform::OpenAi, "", Period::Week, start, end);
        for record in &records {
            forward.add_consumption(record);
        }

        let mut backward =
            ConsumptionSummary::new(Platform::OpenAi, "", Period::Week, start, end);
        for record in records.iter().rev() {
            backward.add_consumption(record);
        }

        assert_eq!(forward.total_tokens, backward.total_tokens);
        assert_eq!(forward.total_input_tokens, backward.total_input_tokens);
        assert_eq!(forward.total_output_tokens, backward.total_output_tokens);
        assert_eq!(forward.total_requests, backward.total_requests);
    }

    #[test]
    fn test_summarize_by_model() {
        let summaries = summarize_consumption_by_model(
            Platform::OpenAi,
            Period::Week,
            window(),
            &sample_records(),
        );

        assert_eq!(summaries.len(), 2);
        // Sorted by model name
        assert_eq!(summaries[0].model, "gpt-4o");
        assert_eq!(summaries[0].total_tokens, 4971);
        assert_eq!(summaries[1].model, "gpt-4o-mini");
        assert_eq!(summaries[1].total_tokens, 81);
    }

    #[test]
    fn test_empty_records_yield_no_summaries() {
        let summaries =
            summarize_consumption_by_model(Platform::OpenAi, Period::Week, window(), &[]);
        assert!(summaries.is_empty());
    }
}
