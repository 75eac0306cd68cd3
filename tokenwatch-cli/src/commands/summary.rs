//! Summary command - combined usage and cost across platforms.

use anyhow::Result;
use clap::Args;
use futures::future::join_all;
use tokenwatch_core::{Period, Platform, Provider};
use tokenwatch_store::Config;
use tracing::info;

use crate::commands::{build_provider, parse_platform_selection};
use crate::output::{JsonFormatter, PlatformSummary, PlatformTotals, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// A platform paired with its provider, or the build failure rendered
/// as text (missing credentials, mostly).
pub type PlatformProvider = (Platform, Result<Box<dyn Provider>, String>);

/// Arguments for the summary command.
#[derive(Args, Default)]
pub struct SummaryArgs {
    /// Reporting period (1d, 7d, 30d, 90d, 1y, all).
    #[arg(long, short = 'p', default_value = "7d")]
    pub period: Period,

    /// Skip the response cache and hit the API.
    #[arg(long)]
    pub no_cache: bool,
}

/// Runs the summary command.
pub async fn run(args: &SummaryArgs, cli: &Cli) -> Result<()> {
    let platforms = parse_platform_selection(cli.platform.as_ref())?;
    let config = Config::load()?;

    info!(platforms = ?platforms, period = %args.period, "fetching summary");

    let providers = build_all(&config, &platforms);
    let summaries = fetch_summaries(&providers, args.period, args.no_cache).await;
    let has_success = summaries.iter().any(|s| s.result.is_ok());

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_summary(args.period, &summaries));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_summary(args.period, &summaries)?);
        }
    }

    if !has_success {
        std::process::exit(ExitCode::PlatformMissing as i32);
    }
    Ok(())
}

/// Builds a provider per platform, recording failures instead of
/// aborting so other platforms still report.
pub fn build_all(config: &Config, platforms: &[Platform]) -> Vec<PlatformProvider> {
    platforms
        .iter()
        .map(|&platform| {
            (
                platform,
                build_provider(config, platform).map_err(|e| format!("{e:#}")),
            )
        })
        .collect()
}

/// Fetches usage and cost totals for every platform concurrently, one
/// entry per platform with failures isolated. Providers are borrowed so
/// watch mode can reuse the same instances (and their breaker and cache
/// state) across refreshes.
pub async fn fetch_summaries(
    providers: &[PlatformProvider],
    period: Period,
    bypass_cache: bool,
) -> Vec<PlatformSummary> {
    join_all(providers.iter().map(|(platform, provider)| async move {
        let result = match provider {
            Ok(provider) => fetch_totals(provider.as_ref(), period, bypass_cache).await,
            Err(e) => Err(e.clone()),
        };
        PlatformSummary {
            platform: *platform,
            result,
        }
    }))
    .await
}

/// Fetches one platform's combined totals. Usage and costs are fetched
/// concurrently; either failing fails the platform.
async fn fetch_totals(
    provider: &dyn Provider,
    period: Period,
    bypass_cache: bool,
) -> Result<PlatformTotals, String> {
    let (start, end) = period.time_range();

    let (consumption, costs) = tokio::join!(
        provider.fetch_consumption(start, end, bypass_cache),
        provider.fetch_pricing(start, end, bypass_cache),
    );
    let consumption = consumption.map_err(|e| e.to_string())?;
    let costs = costs.map_err(|e| e.to_string())?;

    let mut totals = PlatformTotals {
        input_tokens: 0,
        output_tokens: 0,
        total_tokens: 0,
        requests: 0,
        total_cost: 0.0,
        currency: String::new(),
    };
    for record in &consumption {
        totals.input_tokens += record.input_tokens;
        totals.output_tokens += record.output_tokens;
        totals.total_tokens += record.total_tokens;
        totals.requests += record.request_count;
    }
    for record in &costs {
        totals.total_cost += record.amount;
        if totals.currency.is_empty() {
            totals.currency = record.currency.clone();
        }
    }

    Ok(totals)
}
