//! Short-lived typed response cache.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// Default cache TTL for near-real-time usage dashboards.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CacheEntry<T> {
    payload: T,
    expires_at: Instant,
}

/// An in-memory TTL cache keyed by [`CacheKey`] strings.
///
/// One `ResponseCache` holds one concrete response shape, so lookups never
/// need a runtime type assertion. Expired entries are purged lazily on
/// lookup; `put` unconditionally overwrites.
#[derive(Debug)]
pub struct ResponseCache<T> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> ResponseCache<T> {
    /// Creates a cache whose entries live for `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the payload for `key` if present and not expired.
    ///
    /// An expired entry is removed as a side effect and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().unwrap();

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.payload.clone()),
            Some(_) => {
                debug!(key, "cache entry expired, purging");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `payload` under `key`, replacing any existing entry.
    pub fn put(&self, key: impl Into<String>, payload: T) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.into(),
            CacheEntry {
                payload,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Empties the entire store.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Returns true if the store holds no entries (expired or not).
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl<T: Clone> Default for ResponseCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Builder for deterministic cache keys.
///
/// Parameters are sorted by name, so logically identical queries produce
/// identical keys regardless of construction order.
#[derive(Debug, Clone)]
pub struct CacheKey {
    endpoint: String,
    params: BTreeMap<String, String>,
}

impl CacheKey {
    /// Starts a key for the given logical endpoint name.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds a query parameter to the key.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Renders the key string: `endpoint:name=value:...` with names sorted.
    pub fn build(&self) -> String {
        let mut key = self.endpoint.clone();
        for (name, value) in &self.params {
            key.push(':');
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        key
    }
}
