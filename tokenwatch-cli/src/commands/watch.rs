//! Watch command - continuous summary refresh.

use std::io::{stdout, Write};

use anyhow::Result;
use clap::Args;
use tokenwatch_core::Period;
use tokenwatch_store::Config;
use tokio::time::{interval, Duration};
use tracing::info;

use crate::commands::parse_platform_selection;
use crate::commands::summary::{build_all, fetch_summaries};
use crate::output::TextFormatter;
use crate::Cli;

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Reporting period (1d, 7d, 30d, 90d, 1y, all).
    #[arg(long, short = 'p', default_value = "7d")]
    pub period: Period,

    /// Refresh interval in seconds. Defaults to the configured value.
    #[arg(long, short)]
    pub interval: Option<u64>,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let platforms = parse_platform_selection(cli.platform.as_ref())?;
    let config = Config::load()?;

    // Interval comes from the flag, else config, and is clamped to the
    // configured minimum either way.
    let refresh_secs = args
        .interval
        .unwrap_or(config.watch.interval_secs)
        .max(config.watch.min_interval_secs);
    let bypass_cache = config.watch.bypass_cache;

    info!(
        interval = refresh_secs,
        bypass_cache, "starting watch mode"
    );

    // Providers live for the whole watch session; circuit breaker and
    // cache state carries across refreshes.
    let providers = build_all(&config, &platforms);
    let formatter = TextFormatter::new(!cli.no_color);

    let mut ticker = interval(Duration::from_secs(refresh_secs));

    loop {
        // First tick fires immediately.
        ticker.tick().await;

        // Clear screen
        print!("\x1b[2J\x1b[H");
        stdout().flush()?;

        let now = chrono::Local::now();
        println!(
            "tokenwatch Watch Mode - {} (refresh: {refresh_secs}s)",
            now.format("%H:%M:%S")
        );
        println!();

        let summaries = fetch_summaries(&providers, args.period, bypass_cache).await;
        println!("{}", formatter.format_summary(args.period, &summaries));
        println!();
        println!("Press Ctrl+C to exit");
    }
}
