//! Trait definitions for tokenwatch.
//!
//! This module defines the interface that platform provider implementations
//! must satisfy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ProviderError;
use crate::models::{Consumption, ConsumptionSummary, CostRecord, CostSummary, Period, Platform};

/// A platform whose usage and billing APIs we can query.
///
/// Implementors are responsible for:
/// - Authenticating against the platform's API
/// - Fetching consumption and cost data for a time window, with caching
/// - Normalizing vendor payloads into the domain types
///
/// A single provider instance is long-lived: it is reused across watch-mode
/// refreshes, and internal state (circuit breaker, response cache) carries
/// over between calls.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The platform this provider queries.
    fn platform(&self) -> Platform;

    /// Cheap configuration-presence check; no network traffic.
    fn is_available(&self) -> bool;

    /// Empties any cached responses so the next fetch hits the API.
    fn clear_cache(&self);

    /// Fetches normalized token consumption for a time window.
    ///
    /// `bypass_cache` skips the cache lookup but still refreshes the cache
    /// for subsequent callers.
    async fn fetch_consumption(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bypass_cache: bool,
    ) -> Result<Vec<Consumption>, ProviderError>;

    /// Fetches normalized cost records for a time window.
    async fn fetch_pricing(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bypass_cache: bool,
    ) -> Result<Vec<CostRecord>, ProviderError>;

    /// Fetches and folds consumption for a period into combined totals
    /// across all models. Zero usage yields an empty summary, not an error.
    async fn consumption_summary(
        &self,
        period: Period,
    ) -> Result<ConsumptionSummary, ProviderError> {
        let (start, end) = period.time_range();
        let records = self.fetch_consumption(start, end, false).await?;

        let mut summary = ConsumptionSummary::new(self.platform(), "", period, start, end);
        for record in &records {
            summary.add_consumption(record);
        }
        Ok(summary)
    }

    /// Fetches and folds costs for a period into combined totals across all
    /// models, keeping the line-item breakdown.
    async fn pricing_summary(&self, period: Period) -> Result<CostSummary, ProviderError> {
        let (start, end) = period.time_range();
        let records = self.fetch_pricing(start, end, false).await?;

        let mut summary = CostSummary::new(self.platform(), "", period, start, end);
        for record in &records {
            summary.add_cost(record);
        }
        Ok(summary)
    }
}
