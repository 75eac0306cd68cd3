//! Cost command - per-model billed cost report.

use anyhow::Result;
use clap::Args;
use futures::future::join_all;
use tokenwatch_core::{summarize_costs_by_model, CostRecord, CostSummary, Period, Platform};
use tokenwatch_store::Config;
use tracing::info;

use crate::commands::{build_provider, parse_platform_selection};
use crate::output::{CostOutput, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the cost command.
#[derive(Args)]
pub struct CostArgs {
    /// Reporting period (1d, 7d, 30d, 90d, 1y, all).
    #[arg(long, short = 'p', default_value = "30d")]
    pub period: Period,

    /// Skip the response cache and hit the API.
    #[arg(long)]
    pub no_cache: bool,
}

/// Runs the cost command.
pub async fn run(args: &CostArgs, cli: &Cli) -> Result<()> {
    let platforms = parse_platform_selection(cli.platform.as_ref())?;
    let config = Config::load()?;

    info!(platforms = ?platforms, period = %args.period, "fetching costs");

    let results = fetch_all(&config, &platforms, args.period, args.no_cache).await;
    let has_success = results.iter().any(|(_, r)| r.is_ok());

    output_results(&results, args.period, cli)?;

    if !has_success {
        std::process::exit(ExitCode::PlatformMissing as i32);
    }
    Ok(())
}

/// Fetches cost records from every platform concurrently.
pub async fn fetch_all(
    config: &Config,
    platforms: &[Platform],
    period: Period,
    bypass_cache: bool,
) -> Vec<(Platform, Result<Vec<CostRecord>, String>)> {
    let (start, end) = period.time_range();

    join_all(platforms.iter().map(|&platform| async move {
        let provider = match build_provider(config, platform) {
            Ok(provider) => provider,
            Err(e) => return (platform, Err(format!("{e:#}"))),
        };
        let result = provider
            .fetch_pricing(start, end, bypass_cache)
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
    records: &[CostRecord],
) -> (CostSummary, Vec<CostSummary>) {
    let (start, end) = period.time_range();
    let mut combined = CostSummary::new(platform, "", period, start, end);
    for record in records {
        combined.add_cost(record);
    }
    let per_model = summarize_costs_by_model(platform, period, (start, end), records);
    (combined, per_model)
}

fn output_results(
    results: &[(Platform, Result<Vec<CostRecord>, String>)],
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
                            formatter.format_cost(*platform, period, &combined, &per_model)
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
            let outputs: Vec<CostOutput> = results
                .iter()
                .map(|(platform, result)| match result {
                    Ok(records) => {
                        let (combined, per_model) = summarize(*platform, period, records);
                        CostOutput {
                            platform: platform.as_str().to_string(),
                            period: period.label().to_string(),
                            totals: Some(combined),
                            models: per_model,
                            error: None,
                        }
                    }
                    Err(e) => CostOutput {
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
    fn test_summarize_keeps_line_items() {
        let start = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap();
        let records = vec![
            CostRecord::new(
                Platform::OpenAi,
                "gpt-4o",
                "gpt-4o, input",
                3.25,
                "usd",
                start,
                end,
            ),
            CostRecord::new(
                Platform::OpenAi,
                "gpt-4o",
                "gpt-4o, output",
                1.75,
                "usd",
                start,
                end,
            ),
        ];

        let (combined, per_model) = summarize(Platform::OpenAi, Period::Month, &records);

        assert!((combined.total_cost - 5.0).abs() < f64::EPSILON);
        assert_eq!(combined.currency, "usd");
        assert_eq!(combined.line_items.len(), 2);
        assert_eq!(per_model.len(), 1);
        assert_eq!(per_model[0].model, "gpt-4o");
    }
}
