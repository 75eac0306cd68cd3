//! Configuration management.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokenwatch_core::Platform;
use tracing::{debug, info};

use crate::error::StoreError;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys by platform name.
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    /// Organization ids by platform name.
    #[serde(default)]
    pub org_ids: HashMap<String, String>,
    /// Request and resilience settings.
    #[serde(default)]
    pub settings: Settings,
    /// Watch mode settings.
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Request and resilience settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Response cache lifetime in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Retries after the initial attempt.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Sustained outbound request rate.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
    /// Burst capacity above the sustained rate.
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Consecutive failures before the circuit opens.
    #[serde(default = "default_breaker_threshold")]
    pub breaker_failure_threshold: u32,
    /// Seconds the circuit stays open before probing.
    #[serde(default = "default_breaker_reset")]
    pub breaker_reset_secs: u64,
}

/// Watch mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between refreshes.
    #[serde(default = "default_watch_interval")]
    pub interval_secs: u64,
    /// Lower bound on the refresh interval; shorter requests are clamped.
    #[serde(default = "default_min_watch_interval")]
    pub min_interval_secs: u64,
    /// Whether refreshes skip the response cache.
    #[serde(default = "default_true")]
    pub bypass_cache: bool,
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_requests_per_second() -> f64 {
    1.0
}

fn default_burst() -> u32 {
    5
}

fn default_breaker_threshold() -> u32 {
    5
}

fn default_breaker_reset() -> u64 {
    60
}

fn default_watch_interval() -> u64 {
    30
}

fn default_min_watch_interval() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            request_timeout_secs: default_request_timeout(),
            retry_attempts: default_retry_attempts(),
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
            breaker_failure_threshold: default_breaker_threshold(),
            breaker_reset_secs: default_breaker_reset(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_watch_interval(),
            min_interval_secs: default_min_watch_interval(),
            bypass_cache: true,
        }
    }
}

impl Config {
    /// Returns the default configuration file path,
    /// `~/.tokenwatch/config.yaml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tokenwatch")
            .join("config.yaml")
    }

    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path. A missing file yields
    /// the defaults.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;

        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Saves configuration to the default path.
    pub fn save(&self) -> Result<(), StoreError> {
        self.save_to(&Self::default_path())
    }

    /// Saves configuration to a specific path, creating parent
    /// directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;

        info!(path = %path.display(), "saved configuration");
        Ok(())
    }

    /// Returns the API key for a platform, falling back to the
    /// platform's conventional environment variable (`OPENAI_API_KEY`
    /// and friends) when the config file has none.
    pub fn api_key(&self, platform: Platform) -> Option<String> {
        self.api_keys
            .get(platform.as_str())
            .filter(|k| !k.is_empty())
            .cloned()
            .or_else(|| {
                let var = format!("{}_API_KEY", platform.as_str().to_uppercase());
                std::env::var(var).ok().filter(|k| !k.is_empty())
            })
    }

    /// Returns the organization id for a platform, falling back to the
    /// `<PLATFORM>_ORG_ID` environment variable.
    pub fn org_id(&self, platform: Platform) -> Option<String> {
        self.org_ids
            .get(platform.as_str())
            .filter(|v| !v.is_empty())
            .cloned()
            .or_else(|| {
                let var = format!("{}_ORG_ID", platform.as_str().to_uppercase());
                std::env::var(var).ok().filter(|v| !v.is_empty())
            })
    }
}

/// Masks a credential for display, keeping the first and last four
/// characters. Short keys are fully masked.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.settings.cache_ttl_secs, 300);
        assert_eq!(config.settings.retry_attempts, 3);
        assert_eq!(config.settings.breaker_failure_threshold, 5);
        assert_eq!(config.watch.interval_secs, 30);
        assert!(config.watch.bypass_cache);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config.settings.cache_ttl_secs, 300);
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config
            .api_keys
            .insert("openai".to_string(), "sk-admin-test".to_string());
        config.watch.interval_secs = 45;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_keys.get("openai").unwrap(), "sk-admin-test");
        assert_eq!(loaded.watch.interval_secs, 45);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let yaml = "api_keys:\n  openai: sk-admin-test\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api_keys.get("openai").unwrap(), "sk-admin-test");
        assert_eq!(config.settings.request_timeout_secs, 30);
        assert_eq!(config.watch.min_interval_secs, 10);
    }

    #[test]
    fn test_api_key_prefers_config_over_env() {
        let mut config = Config::default();
        config
            .api_keys
            .insert("openai".to_string(), "sk-from-config".to_string());
        assert_eq!(
            config.api_key(Platform::OpenAi).as_deref(),
            Some("sk-from-config")
        );
    }

    #[test]
    fn test_api_key_env_fallback() {
        let config = Config::default();
        // No other test touches this variable.
        unsafe {
            std::env::set_var("OPENAI_API_KEY", "sk-from-env");
        }
        assert_eq!(
            config.api_key(Platform::OpenAi).as_deref(),
            Some("sk-from-env")
        );
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
        }
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-admin-1234567890abcd"), "sk-a...abcd");
        assert_eq!(mask_key("short"), "****");
        assert_eq!(mask_key(""), "****");
    }

    #[test]
    fn test_mask_key_multibyte() {
        // Keys are user-supplied via `config set` and may not be ASCII.
        assert_eq!(mask_key("ключ-секрет-ключ"), "ключ...ключ");
        assert_eq!(mask_key("密钥密钥"), "****");
    }
}
