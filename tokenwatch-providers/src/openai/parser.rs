//! Normalization of OpenAI wire types into domain records.

use chrono::{DateTime, Utc};
use tokenwatch_core::{Consumption, CostRecord, Platform};

use super::api::{CostBucket, UsageBucket};

/// Extracts the model name from a billing line item.
///
/// Line items read `"gpt-4o-2024-08-06, input"`; everything before the
/// first `", "` is the model. Line items without the separator are
/// returned unchanged.
pub fn model_from_line_item(line_item: &str) -> &str {
    match line_item.split_once(", ") {
        Some((model, _)) => model,
        None => line_item,
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Flattens usage buckets into consumption records, one per model per
/// bucket. Results without a model are kept under an empty model name.
pub fn consumptions_from_buckets(buckets: &[UsageBucket]) -> Vec<Consumption> {
    let mut records = Vec::new();
    for bucket in buckets {
        for result in &bucket.results {
            records.push(Consumption::new(
                Platform::OpenAi,
                result.model.as_deref().unwrap_or_default(),
                result.input_tokens,
                result.output_tokens,
                result.num_model_requests,
                timestamp(bucket.start_time),
                timestamp(bucket.end_time),
            ));
        }
    }
    records
}

/// Flattens cost buckets into cost records, one per line item per
/// bucket, deriving the model name from each line item.
pub fn costs_from_buckets(buckets: &[CostBucket]) -> Vec<CostRecord> {
    let mut records = Vec::new();
    for bucket in buckets {
        for result in &bucket.results {
            let line_item = result.line_item.as_deref().unwrap_or_default();
            records.push(CostRecord::new(
                Platform::OpenAi,
                model_from_line_item(line_item),
                line_item,
                result.amount.value,
                result.amount.currency.as_str(),
                timestamp(bucket.start_time),
                timestamp(bucket.end_time),
            ));
        }
    }
    records
}
