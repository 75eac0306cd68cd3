//! Cost records and aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Period, Platform};

/// Normalized cost for one billing line item within one time bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    /// Platform this record came from.
    pub platform: Platform,
    /// Model extracted from the line item label.
    pub model: String,
    /// Raw vendor line item (e.g. "gpt-4o-2024-08-06, input").
    pub line_item: String,
    /// Amount billed. Never negative.
    pub amount: f64,
    /// ISO currency code (e.g. "usd").
    pub currency: String,
    /// Bucket start.
    pub start_time: DateTime<Utc>,
    /// Bucket end.
    pub end_time: DateTime<Utc>,
}

impl CostRecord {
    /// Creates a new cost record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        platform: Platform,
        model: impl Into<String>,
        line_item: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            platform,
            model: model.into(),
            line_item: line_item.into(),
            amount: amount.max(0.0),
            currency: currency.into(),
            start_time,
            end_time,
        }
    }
}

/// Aggregated cost over a period, with a per-line-item breakdown.
///
/// The currency is adopted from the first folded record; mixed-currency
/// windows keep the first and the breakdown preserves each record's own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSummary {
    /// Platform the summary covers.
    pub platform: Platform,
    /// Model the summary covers, or empty for all models.
    pub model: String,
    /// Total amount billed.
    pub total_cost: f64,
    /// Currency of the total.
    pub currency: String,
    /// Period label (e.g. "30d").
    pub period: String,
    /// Window start.
    pub start_time: DateTime<Utc>,
    /// Window end.
    pub end_time: DateTime<Utc>,
    /// Per-line-item breakdown, in fold order.
    pub line_items: Vec<CostRecord>,
}

impl CostSummary {
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
            total_cost: 0.0,
            currency: String::new(),
            period: period.label().to_string(),
            start_time,
            end_time,
            line_items: Vec::new(),
        }
    }

    /// Folds one cost record into the running total and breakdown.
    pub fn add_cost(&mut self, record: &CostRecord) {
        self.total_cost += record.amount;
        if self.currency.is_empty() {
            self.currency = record.currency.clone();
        }
        self.line_items.push(record.clone());
    }

    /// Returns true if no records have been folded in.
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }
}

/// Groups cost records by model, producing one summary per distinct model,
/// sorted by model name for deterministic output.
pub fn summarize_costs_by_model(
    platform: Platform,
    period: Period,
    window: (DateTime<Utc>, DateTime<Utc>),
    records: &[CostRecord],
) -> Vec<CostSummary> {
    let mut by_model: BTreeMap<&str, CostSummary> = BTreeMap::new();

    for record in records {
        by_model
            .entry(record.model.as_str())
            .or_insert_with(|| {
                CostSummary::new(platform, record.model.clone(), period, window.0, window.1)
            })
            .add_cost(record);
    }

    by_model.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 8, 31, 0, 0, 0).unwrap(),
        )
    }

    fn sample_records() -> Vec<CostRecord> {
        let (start, end) = window();
        vec![
            CostRecord::new(
                Platform::OpenAi,
                "gpt-4o",
                "gpt-4o, input",
                1.25,
                "usd",
                start,
                end,
            ),
            CostRecord::new(
                Platform::OpenAi,
                "gpt-4o",
                "gpt-4o, output",
                3.75,
                "usd",
                start,
                end,
            ),
            CostRecord::new(
                Platform::OpenAi,
                "misc-fee",
                "misc-fee",
                0.10,
                "usd",
                start,
                end,
            ),
        ]
    }

    #[test]
    fn test_amount_clamped_non_negative() {
        let (start, end) = window();
        let record =
            CostRecord::new(Platform::OpenAi, "m", "m, input", -1.0, "usd", start, end);
        assert_eq!(record.amount, 0.0);
    }

    #[test]
    fn test_combined_total_and_currency() {
        let (start, end) = window();
        let mut summary = CostSummary::new(Platform::OpenAi, "", Period::Month, start, end);
        for record in &sample_records() {
            summary.add_cost(record);
        }

        assert!((summary.total_cost - 5.10).abs() < 1e-9);
        assert_eq!(summary.currency, "usd");
        assert_eq!(summary.line_items.len(), 3);
    }

    #[test]
    fn test_fold_is_commutative() {
        let (start, end) = window();
        let records = sample_records();

        let mut forward = CostSummary::new(Platform::OpenAi, "", Period::Month, start, end);
        for record in &records {
            forward.add_cost(record);
        }

        let mut backward = CostSummary::new(Platform::OpenAi, "", Period::Month, start, end);
        for record in records.iter().rev() {
            backward.add_cost(record);
        }

        assert!((forward.total_cost - backward.total_cost).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_by_model() {
        let summaries =
            summarize_costs_by_model(Platform::OpenAi, Period::Month, window(), &sample_records());

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].model, "gpt-4o");
        assert_eq!(summaries[0].line_items.len(), 2);
        assert_eq!(summaries[1].model, "misc-fee");
    }
}
