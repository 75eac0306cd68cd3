//! CLI command implementations.

pub mod check;
pub mod config;
pub mod cost;
pub mod summary;
pub mod usage;
pub mod watch;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokenwatch_core::{Platform, Provider};
use tokenwatch_fetch::RetryPolicy;
use tokenwatch_providers::{OpenAiConfig, OpenAiProvider};
use tokenwatch_store::Config;
use tracing::debug;

/// Parses the `--platform` selection into concrete platforms.
pub fn parse_platform_selection(arg: Option<&String>) -> Result<Vec<Platform>> {
    match arg.map(|s| s.to_lowercase()).as_deref() {
        None | Some("all") => Ok(Platform::all().to_vec()),
        Some(names) => {
            let mut platforms = Vec::new();
            for name in names.split(',') {
                let name = name.trim();
                let platform: Platform = name
                    .parse()
                    .with_context(|| format!("unknown platform: {name}"))?;
                if !platforms.contains(&platform) {
                    platforms.push(platform);
                }
            }
            if platforms.is_empty() {
                bail!("no valid platforms specified");
            }
            Ok(platforms)
        }
    }
}

/// Builds a provider for one platform from the loaded configuration.
///
/// Fails with a setup hint when the platform has no credentials.
pub fn build_provider(config: &Config, platform: Platform) -> Result<Box<dyn Provider>> {
    match platform {
        Platform::OpenAi => {
            let api_key = config.api_key(platform).with_context(|| {
                format!(
                    "no API key for {}; set api_keys.{} in {} or export {}_API_KEY",
                    platform.display_name(),
                    platform.as_str(),
                    Config::default_path().display(),
                    platform.as_str().to_uppercase(),
                )
            })?;

            let settings = &config.settings;
            let mut provider_config = OpenAiConfig::new(api_key)
                .with_retry_policy(RetryPolicy::new(settings.retry_attempts));
            provider_config.cache_ttl = Duration::from_secs(settings.cache_ttl_secs);
            provider_config.request_timeout = Duration::from_secs(settings.request_timeout_secs);
            provider_config.requests_per_second = settings.requests_per_second;
            provider_config.burst = settings.burst;
            provider_config.breaker_failure_threshold = settings.breaker_failure_threshold;
            provider_config.breaker_reset_timeout =
                Duration::from_secs(settings.breaker_reset_secs);
            if let Some(org_id) = config.org_id(platform) {
                provider_config = provider_config.with_org_id(org_id);
            }

            debug!(platform = %platform, "built provider");
            Ok(Box::new(OpenAiProvider::new(provider_config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_platform_default_is_all() {
        let platforms = parse_platform_selection(None).unwrap();
        assert_eq!(platforms, Platform::all().to_vec());
    }

    #[test]
    fn test_parse_platform_single() {
        let platforms = parse_platform_selection(Some(&"openai".to_string())).unwrap();
        assert_eq!(platforms, vec![Platform::OpenAi]);
    }

    #[test]
    fn test_parse_platform_dedupes() {
        let platforms = parse_platform_selection(Some(&"openai,OpenAI".to_string())).unwrap();
        assert_eq!(platforms.len(), 1);
    }

    #[test]
    fn test_parse_platform_unknown() {
        assert!(parse_platform_selection(Some(&"acme".to_string())).is_err());
    }

    #[test]
    fn test_build_provider_without_key_fails() {
        let config = Config::default();
        // Force a clean environment view for the assertion.
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
        }
        assert!(build_provider(&config, Platform::OpenAi).is_err());
    }
}
