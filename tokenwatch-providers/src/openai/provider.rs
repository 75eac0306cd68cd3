//! OpenAI provider implementation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use tokenwatch_core::{Consumption, CostRecord, Platform, Provider, ProviderError};
use tokenwatch_fetch::{
    decode_json, CacheKey, CircuitBreaker, FetchError, HttpClient, ResponseCache, RetryPolicy,
    TokenBucket,
};

use super::api::{CostBucket, Page, UsageBucket, COSTS_ENDPOINT, OPENAI_API_BASE, USAGE_ENDPOINT};
use super::parser;

/// Hard ceiling on pages fetched per request, against runaway cursors.
const MAX_PAGES: usize = 50;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the OpenAI provider.
///
/// Defaults are conservative: 1 request per second with a burst of 5,
/// three retries, circuit opening after 5 consecutive failures for one
/// minute, and a five minute response cache.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Admin API key. Usage and cost endpoints reject regular keys.
    pub api_key: String,
    /// Organization id, sent as the `OpenAI-Organization` header.
    pub org_id: Option<String>,
    /// API base URL, overridable for testing.
    pub base_url: String,
    /// Response cache lifetime.
    pub cache_ttl: Duration,
    /// Per-request timeout, also bounding rate limit waits.
    pub request_timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
    /// Sustained request rate.
    pub requests_per_second: f64,
    /// Burst capacity above the sustained rate.
    pub burst: u32,
    /// Consecutive failures before the circuit opens.
    pub breaker_failure_threshold: u32,
    /// How long the circuit stays open before probing.
    pub breaker_reset_timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a configuration with defaults for the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            org_id: None,
            base_url: OPENAI_API_BASE.to_string(),
            cache_ttl: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            requests_per_second: 1.0,
            burst: 5,
            breaker_failure_threshold: 5,
            breaker_reset_timeout: Duration::from_secs(60),
        }
    }

    /// Sets the organization id.
    #[must_use]
    pub fn with_org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Provider for OpenAI organization usage and cost data.
///
/// Every API call passes through a token bucket rate limiter, a circuit
/// breaker, and the retrying HTTP client. Page sets are cached whole per
/// query, so watch-mode refreshes within the TTL cost no network traffic
/// unless the cache is bypassed.
pub struct OpenAiProvider {
    http: HttpClient,
    breaker: CircuitBreaker,
    usage_cache: ResponseCache<Vec<UsageBucket>>,
    cost_cache: ResponseCache<Vec<CostBucket>>,
    api_key: String,
    org_id: Option<String>,
    base_url: String,
}

impl OpenAiProvider {
    /// Creates a provider from the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let limiter = Arc::new(TokenBucket::new(config.requests_per_second, config.burst));
        let http = HttpClient::with_timeout(limiter, config.request_timeout)
            .map_err(ProviderError::from)?
            .with_retry_policy(config.retry);

        Ok(Self {
            http,
            breaker: CircuitBreaker::new(
                config.breaker_failure_threshold,
                config.breaker_reset_timeout,
            ),
            usage_cache: ResponseCache::new(config.cache_ttl),
            cost_cache: ResponseCache::new(config.cache_ttl),
            api_key: config.api_key,
            org_id: config.org_id,
            base_url: config.base_url,
        })
    }

    /// Fetches every page of a cursor-paginated endpoint and returns the
    /// concatenated buckets.
    ///
    /// A repeated cursor, a missing cursor with `has_more` set, or the
    /// page ceiling all end pagination with the data gathered so far; a
    /// failed page aborts the whole fetch instead.
    async fn fetch_pages<B>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<B>, FetchError>
    where
        B: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut buckets = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen: HashSet<String> = HashSet::new();
        let mut pages = 0;

        loop {
            pages += 1;

            let mut builder = self
                .http
                .get(&url)
                .query(query)
                .bearer_auth(&self.api_key);
            if let Some(org_id) = &self.org_id {
                builder = builder.header("OpenAI-Organization", org_id);
            }
            if let Some(cursor) = &cursor {
                builder = builder.query(&[("page", cursor)]);
            }
            let request = builder.build()?;

            let response = self.breaker.call(|| self.http.execute(request)).await?;
            let page: Page<B> = decode_json(response).await?;

            debug!(endpoint, page = pages, buckets = page.data.len(), "fetched page");
            buckets.extend(page.data);

            if !page.has_more {
                break;
            }
            let Some(next) = page.next_page else {
                warn!(endpoint, "upstream reports more pages but sent no cursor, stopping");
                break;
            };
            if !seen.insert(next.clone()) {
                warn!(endpoint, cursor = %next, "pagination cursor repeated, stopping");
                break;
            }
            if pages >= MAX_PAGES {
                warn!(endpoint, limit = MAX_PAGES, "page ceiling reached, stopping");
                break;
            }
            cursor = Some(next);
        }

        Ok(buckets)
    }

    async fn usage_buckets(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bypass_cache: bool,
    ) -> Result<Vec<UsageBucket>, ProviderError> {
        let key = CacheKey::new("usage")
            .param("start_time", start.timestamp())
            .param("end_time", end.timestamp())
            .param("bucket_width", "1d")
            .param("group_by", "model")
            .build();

        if !bypass_cache {
            if let Some(buckets) = self.usage_cache.get(&key) {
                debug!(key = %key, "usage cache hit");
                return Ok(buckets);
            }
        }

        let query = [
            ("start_time", start.timestamp().to_string()),
            ("end_time", end.timestamp().to_string()),
            ("bucket_width", "1d".to_string()),
            ("group_by", "model".to_string()),
        ];
        let buckets: Vec<UsageBucket> = self.fetch_pages(USAGE_ENDPOINT, &query).await?;

        // Refresh even on bypass so later cached reads see fresh data.
        self.usage_cache.put(key, buckets.clone());
        Ok(buckets)
    }

    async fn cost_buckets(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bypass_cache: bool,
    ) -> Result<Vec<CostBucket>, ProviderError> {
        let key = CacheKey::new("costs")
            .param("start_time", start.timestamp())
            .param("end_time", end.timestamp())
            .param("bucket_width", "1d")
            .param("group_by", "line_item")
            .build();

        if !bypass_cache {
            if let Some(buckets) = self.cost_cache.get(&key) {
                debug!(key = %key, "cost cache hit");
                return Ok(buckets);
            }
        }

        // The costs endpoint only supports daily buckets.
        let query = [
            ("start_time", start.timestamp().to_string()),
            ("end_time", end.timestamp().to_string()),
            ("bucket_width", "1d".to_string()),
            ("group_by", "line_item".to_string()),
        ];
        let buckets: Vec<CostBucket> = self.fetch_pages(COSTS_ENDPOINT, &query).await?;

        self.cost_cache.put(key, buckets.clone());
        Ok(buckets)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn platform(&self) -> Platform {
        Platform::OpenAi
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn clear_cache(&self) {
        self.usage_cache.clear();
        self.cost_cache.clear();
    }

    async fn fetch_consumption(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bypass_cache: bool,
    ) -> Result<Vec<Consumption>, ProviderError> {
        let buckets = self.usage_buckets(start, end, bypass_cache).await?;
        Ok(parser::consumptions_from_buckets(&buckets))
    }

    async fn fetch_pricing(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bypass_cache: bool,
    ) -> Result<Vec<CostRecord>, ProviderError> {
        let buckets = self.cost_buckets(start, end, bypass_cache).await?;
        Ok(parser::costs_from_buckets(&buckets))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves a fixed sequence of JSON bodies on a local port, counting
    /// hits. Once the sequence is exhausted the last body repeats.
    async fn serve(bodies: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let body = &bodies[n.min(bodies.len() - 1)];
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn test_provider(base_url: &str) -> OpenAiProvider {
        let mut config = OpenAiConfig::new("sk-admin-test")
            .with_base_url(base_url)
            .with_retry_policy(RetryPolicy::no_retry());
        // Keep tests fast regardless of the limiter.
        config.requests_per_second = 1000.0;
        config.burst = 1000;
        OpenAiProvider::new(config).unwrap()
    }

    fn usage_body(model: &str, input: i64, output: i64, more: bool, next: Option<&str>) -> String {
        let next = match next {
            Some(t) => format!(r#","next_page":"{t}""#),
            None => String::new(),
        };
        format!(
            r#"{{"data":[{{"start_time":1730419200,"end_time":1730505600,"results":[{{"model":"{model}","input_tokens":{input},"output_tokens":{output},"num_model_requests":1}}]}}],"has_more":{more}{next}}}"#
        )
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = DateTime::from_timestamp(1_730_419_200, 0).unwrap();
        (start, start + chrono::Duration::days(7))
    }

    #[tokio::test]
    async fn test_pagination_concatenates_pages() {
        let (url, hits) = serve(vec![
            usage_body("gpt-4o", 100, 10, true, Some("t1")),
            usage_body("gpt-4o", 200, 20, false, None),
        ])
        .await;
        let provider = test_provider(&url);
        let (start, end) = window();

        let records = provider.fetch_consumption(start, end, false).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(records.len(), 2);
        let total: i64 = records.iter().map(|r| r.total_tokens).sum();
        assert_eq!(total, 330);
    }

    #[tokio::test]
    async fn test_repeated_cursor_stops_pagination() {
        // Every page claims more data behind the same cursor. The second
        // page's repeat must end the loop with two pages gathered.
        let (url, hits) = serve(vec![usage_body("gpt-4o", 100, 10, true, Some("t1"))]).await;
        let provider = test_provider(&url);
        let (start, end) = window();

        let records = provider.fetch_consumption(start, end, false).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_cursor_stops_pagination() {
        let (url, hits) = serve(vec![usage_body("gpt-4o", 100, 10, true, None)]).await;
        let provider = test_provider(&url);
        let (start, end) = window();

        let records = provider.fetch_consumption(start, end, false).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let (url, hits) = serve(vec![usage_body("gpt-4o", 100, 10, false, None)]).await;
        let provider = test_provider(&url);
        let (start, end) = window();

        let first = provider.fetch_consumption(start, end, false).await.unwrap();
        let second = provider.fetch_consumption(start, end, false).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(first.len(), second.len());
    }

    #[tokio::test]
    async fn test_bypass_refreshes_cache() {
        let (url, hits) = serve(vec![
            usage_body("gpt-4o", 100, 10, false, None),
            usage_body("gpt-4o", 500, 50, false, None),
        ])
        .await;
        let provider = test_provider(&url);
        let (start, end) = window();

        let stale = provider.fetch_consumption(start, end, false).await.unwrap();
        assert_eq!(stale[0].total_tokens, 110);

        // Bypass hits the network and replaces the cached pages.
        let fresh = provider.fetch_consumption(start, end, true).await.unwrap();
        assert_eq!(fresh[0].total_tokens, 550);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // A later cached read sees the refreshed data without traffic.
        let cached = provider.fetch_consumption(start, end, false).await.unwrap();
        assert_eq!(cached[0].total_tokens, 550);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let (url, hits) = serve(vec![usage_body("gpt-4o", 100, 10, false, None)]).await;
        let provider = test_provider(&url);
        let (start, end) = window();

        provider.fetch_consumption(start, end, false).await.unwrap();
        provider.clear_cache();
        provider.fetch_consumption(start, end, false).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_page_aborts_fetch() {
        // First page succeeds and promises more, second page fails.
        let page1 = usage_body("gpt-4o", 100, 10, true, Some("t1"));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut n = 0;
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let response = if n == 0 {
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        page1.len(),
                        page1
                    )
                } else {
                    "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_string()
                };
                n += 1;
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        let provider = test_provider(&format!("http://{addr}"));
        let (start, end) = window();

        let err = provider
            .fetch_consumption(start, end, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UpstreamServer { status: 500 }));
    }

    #[tokio::test]
    async fn test_cost_records_parsed() {
        let body = r#"{"data":[{"start_time":1730419200,"end_time":1730505600,"results":[{"line_item":"gpt-4o, input","amount":{"value":3.25,"currency":"usd"}}]}],"has_more":false}"#;
        let (url, _hits) = serve(vec![body.to_string()]).await;
        let provider = test_provider(&url);
        let (start, end) = window();

        let records = provider.fetch_pricing(start, end, false).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, "gpt-4o");
        assert_eq!(records[0].line_item, "gpt-4o, input");
        assert!((records[0].amount - 3.25).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let (url, _hits) = serve(vec!["not json".to_string()]).await;
        let provider = test_provider(&url);
        let (start, end) = window();

        let err = provider
            .fetch_consumption(start, end, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn test_availability_requires_key() {
        let provider = OpenAiProvider::new(OpenAiConfig::new("")).unwrap();
        assert!(!provider.is_available());

        let provider = OpenAiProvider::new(OpenAiConfig::new("sk-admin-test")).unwrap();
        assert!(provider.is_available());
    }
}
