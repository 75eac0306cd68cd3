//! Usage command - per-model token consumption report.

use anyhow::Result;
use clap::Args;
use futures::future::join_all;
use tokenwatch_core::{
    summarize_consumption_by_model, Consumption, ConsumptionSummary, Period, Platform,
};
use tokenwatch_store::Config;
use tracing::info;

use crate::commands::{build_provider, parse_platform_selection};
use crate::output::{JsonFormatter, TextFormatter, UsageOutput};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the usage command.
#[derive(Args)]
pub struct UsageArgs {
    /// Reporting period (1d, 7d, 30d, 90d, 1y, all).
    #[arg(long, short = 'p', default_value = "7d")]
    pub period: Period,

    /// Skip the response cache and hit the API.
    #[arg(long)]
    pub no_cache: bool,
}

/// Runs the usage command.
pub async fn run(args: &UsageArgs, cli: &Cli) -> Result<()> {
    let platforms = parse_platform_selection(cli.platform.as_ref())?;
    let config = Config::load()?;

    info!(platforms = ?platforms, period = %args.period, "fetching usage");

    let results = fetch_all(&config, &platforms, args.period, args.no_cache).await;
    let has_success = results.iter().any(|(_, r)| r.is_ok());

    output_results(&results, args.period, cli)?;

    if !has_success {
        std::process::exit(ExitCode::PlatformMissing as i32);
    }
    Ok(())
}

/// Fetches consumption from every platform concurrently. A platform's
/// failure (missing key included) is captured per platform.
pub async fn fetch_all(
    config: &Config,
    platforms: &[Platform],
    period: Period,
    bypass_cache: bool,
) -> Vec<(Platform, Result<Vec<Consumption>, String>)> {
    let (start, end) = period.time_range();

    join_all(platforms.iter().map(|&platform| async move {
        let provider = match build_provider(config, platform) {
            Ok(provider) => provider,
            Err(e) => return (platform, Err(format!("{e:#}"))),
        };
        let result = provider
            .fetch_consumption(start, end, bypass_cache)
            .await
            .map_err(|e| e.to_string());
        (platform, result)
    }))
    .await
}

/// Folds records into the combined summary plus the per-model breakdown.
pub fn summarize(
    platform: Platform,
    period: Period,
    records: &[Consumption],
) -> (ConsumptionSummary, Vec<ConsumptionSummary>) {
    let (start, end) = period.time_range();
    let mut combined = ConsumptionSummary::new(platform, "", period, start, end);
    for record in records {
        combined.add_consumption(record);
    }
    let per_model = summarize_consumption_by_model(platform, period, (start, end), records);
    (combined, per_model)
}

fn output_results(
    results: &[(Platform, Result<Vec<Consumption>, String>)],
    period: Period,
    cli: &Cli,
) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            let mut first = true;
            for (platform, result) in results {
                if !first {
                    println!();
                }
                first = false;

                match result {
                    Ok(records) => {
                        let (combined, per_model) = summarize(*platform, period, records);
                        println!(
                            "{}",
                            formatter.format_usage(*platform, period, &combined, &per_model)
                        );
                    }
                    Err(e) => {
                        println!("{}", formatter.format_error(platform.display_name(), e));
                    }
                }
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let outputs: Vec<UsageOutput> = results
                .iter()
                .map(|(platform, result)| match result {
                    Ok(records) => {
                        let (combined, per_model) = summarize(*platform, period, records);
                        UsageOutput {
                            platform: platform.as_str().to_string(),
                            period: period.label().to_string(),
                            totals: Some(combined),
                            models: per_model,
                            error: None,
                        }
                    }
                    Err(e) => UsageOutput {
                        platform: platform.as_str().to_string(),
                        period: period.label().to_string(),
                        totals: None,
                        models: Vec::new(),
                        error: Some(e.clone()),
                    },
                })
                .collect();

            if outputs.len() == 1 {
                println!("{}", formatter.format(&outputs[0])?);
            } else {
                println!("{}", formatter.format(&outputs)?);
            }
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_summarize_combined_and_breakdown() {
        let start = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 11, 8, 0, 0, 0).unwrap();
        let records = vec![
            Consumption::new(Platform::OpenAi, "gpt-4o", 1552, 330, 12, start, end),
            Consumption::new(Platform::OpenAi, "gpt-4o-mini", 2000, 800, 1, start, end),
        ];

        let (combined, per_model) = summarize(Platform::OpenAi, Period::Week, &records);

        assert_eq!(combined.total_tokens, 4682);
        assert_eq!(combined.total_requests, 13);
        assert_eq!(per_model.len(), 2);
        assert_eq!(per_model[0].model, "gpt-4o");
        assert_eq!(per_model[0].total_tokens, 1882);
    }

    #[test]
    fn test_summarize_empty() {
        let (combined, per_model) = summarize(Platform::OpenAi, Period::Week, &[]);
        assert!(combined.is_empty());
        assert!(per_model.is_empty());
    }
}
