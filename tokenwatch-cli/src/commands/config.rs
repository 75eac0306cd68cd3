//! Config command - manage configuration.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use tokenwatch_core::Platform;
use tokenwatch_store::{mask_key, Config};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the resolved configuration (secrets masked).
    Show,

    /// Show the configuration file path.
    Path,

    /// Set a configuration value and save the file.
    Set {
        /// Dotted key, e.g. api_keys.openai or watch.interval_secs.
        key: String,
        /// Value to set.
        value: String,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => {
            println!("{}", Config::default_path().display());
            Ok(())
        }
        ConfigAction::Set { key, value } => set_value(key, value),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.format {
        OutputFormat::Text => {
            println!("tokenwatch Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("API keys:");
            for platform in Platform::all() {
                match config.api_key(*platform) {
                    Some(key) => {
                        println!("  {:<10} {}", platform.as_str(), mask_key(&key));
                    }
                    None => println!("  {:<10} (not set)", platform.as_str()),
                }
            }
            println!();
            println!("Settings:");
            println!("  cache_ttl_secs:            {}", config.settings.cache_ttl_secs);
            println!("  request_timeout_secs:      {}", config.settings.request_timeout_secs);
            println!("  retry_attempts:            {}", config.settings.retry_attempts);
            println!("  requests_per_second:       {}", config.settings.requests_per_second);
            println!("  burst:                     {}", config.settings.burst);
            println!("  breaker_failure_threshold: {}", config.settings.breaker_failure_threshold);
            println!("  breaker_reset_secs:        {}", config.settings.breaker_reset_secs);
            println!();
            println!("Watch:");
            println!("  interval_secs:     {}", config.watch.interval_secs);
            println!("  min_interval_secs: {}", config.watch.min_interval_secs);
            println!("  bypass_cache:      {}", config.watch.bypass_cache);
        }
        OutputFormat::Json => {
            // Mask secrets before serializing.
            let mut masked = config.clone();
            for key in masked.api_keys.values_mut() {
                *key = mask_key(key);
            }
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&masked)?);
        }
    }

    Ok(())
}

fn set_value(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;

    match key.split_once('.') {
        Some(("api_keys", platform)) => {
            let platform: Platform = platform.parse()?;
            config
                .api_keys
                .insert(platform.as_str().to_string(), value.to_string());
        }
        Some(("org_ids", platform)) => {
            let platform: Platform = platform.parse()?;
            config
                .org_ids
                .insert(platform.as_str().to_string(), value.to_string());
        }
        Some(("settings", field)) => set_settings_field(&mut config, field, value)?,
        Some(("watch", field)) => set_watch_field(&mut config, field, value)?,
        _ => bail!(
            "unknown key: {key}. Use api_keys.<platform>, org_ids.<platform>, \
             settings.<field>, or watch.<field>"
        ),
    }

    config.save()?;
    info!(key, "configuration updated");
    println!("Set {key}");

    Ok(())
}

fn set_settings_field(config: &mut Config, field: &str, value: &str) -> Result<()> {
    let settings = &mut config.settings;
    match field {
        "cache_ttl_secs" => settings.cache_ttl_secs = parse(field, value)?,
        "request_timeout_secs" => settings.request_timeout_secs = parse(field, value)?,
        "retry_attempts" => settings.retry_attempts = parse(field, value)?,
        "requests_per_second" => settings.requests_per_second = parse(field, value)?,
        "burst" => settings.burst = parse(field, value)?,
        "breaker_failure_threshold" => settings.breaker_failure_threshold = parse(field, value)?,
        "breaker_reset_secs" => settings.breaker_reset_secs = parse(field, value)?,
        _ => bail!("unknown settings field: {field}"),
    }
    Ok(())
}

fn set_watch_field(config: &mut Config, field: &str, value: &str) -> Result<()> {
    let watch = &mut config.watch;
    match field {
        "interval_secs" => watch.interval_secs = parse(field, value)?,
        "min_interval_secs" => watch.min_interval_secs = parse(field, value)?,
        "bypass_cache" => watch.bypass_cache = parse(field, value)?,
        _ => bail!("unknown watch field: {field}"),
    }
    Ok(())
}

fn parse<T>(field: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("invalid value for {field}: {value}"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_settings_field() {
        let mut config = Config::default();
        set_settings_field(&mut config, "retry_attempts", "5").unwrap();
        assert_eq!(config.settings.retry_attempts, 5);

        assert!(set_settings_field(&mut config, "retry_attempts", "abc").is_err());
        assert!(set_settings_field(&mut config, "nope", "1").is_err());
    }

    #[test]
    fn test_set_watch_field() {
        let mut config = Config::default();
        set_watch_field(&mut config, "bypass_cache", "false").unwrap();
        assert!(!config.watch.bypass_cache);
    }
}
