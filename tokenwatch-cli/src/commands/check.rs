//! Check command - verify which platforms are configured.
//!
//! Reports credential availability without any network traffic.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tokenwatch_store::Config;

use crate::commands::{build_provider, parse_platform_selection};
use crate::output::JsonFormatter;
use crate::{Cli, ExitCode, OutputFormat};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {}

#[derive(Serialize)]
struct CheckResult {
    platform: String,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Runs the check command.
pub async fn run(_args: &CheckArgs, cli: &Cli) -> Result<()> {
    let platforms = parse_platform_selection(cli.platform.as_ref())?;
    let config = Config::load()?;

    let results: Vec<CheckResult> = platforms
        .iter()
        .map(|&platform| match build_provider(&config, platform) {
            Ok(provider) => CheckResult {
                platform: platform.as_str().to_string(),
                available: provider.is_available(),
                error: None,
            },
            Err(e) => CheckResult {
                platform: platform.as_str().to_string(),
                available: false,
                error: Some(format!("{e:#}")),
            },
        })
        .collect();

    match cli.format {
        OutputFormat::Text => {
            println!("Platform availability:");
            for result in &results {
                let (mark, color) = if result.available {
                    ("✓", GREEN)
                } else {
                    ("✗", RED)
                };
                let mark = if cli.no_color {
                    mark.to_string()
                } else {
                    format!("{color}{mark}{RESET}")
                };
                match &result.error {
                    Some(e) => println!("  {mark} {:<10} {e}", result.platform),
                    None if result.available => {
                        println!("  {mark} {:<10} configured", result.platform);
                    }
                    None => println!("  {mark} {:<10} not configured", result.platform),
                }
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&results)?);
        }
    }

    if !results.iter().any(|r| r.available) {
        std::process::exit(ExitCode::PlatformMissing as i32);
    }
    Ok(())
}
