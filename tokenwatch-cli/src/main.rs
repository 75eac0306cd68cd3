// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! tokenwatch CLI - LLM platform usage and cost reporting from the
//! command line.
//!
//! # Examples
//!
//! ```bash
//! # Token usage for the last 7 days
//! tokenwatch usage
//!
//! # Costs for the last 30 days
//! tokenwatch cost --period 30d
//!
//! # Combined usage and cost report
//! tokenwatch summary
//!
//! # JSON output
//! tokenwatch usage --format json --pretty
//!
//! # Continuous refresh
//! tokenwatch watch --interval 30
//!
//! # Configuration
//! tokenwatch config show
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{check, config, cost, summary, usage, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// tokenwatch CLI - LLM platform usage and cost reporting.
#[derive(Parser)]
#[command(name = "tokenwatch")]
#[command(about = "LLM platform usage and cost reporting CLI")]
#[command(long_about = r#"
tokenwatch queries LLM platform usage and billing APIs and prints
aggregated token and cost reports.

Supported platforms:
  • OpenAI (openai) - organization usage and costs, admin API key required

Examples:
  tokenwatch usage                 # Token usage, last 7 days
  tokenwatch usage --period 30d    # Last 30 days
  tokenwatch cost                  # Cost report
  tokenwatch summary               # Usage + cost, all platforms
  tokenwatch watch                 # Continuous refresh
  tokenwatch --format json usage   # JSON output
"#)]
#[command(version)]
#[command(author = "TokenWatch Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'summary' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Platform to query (or "all"). Can be comma-separated.
    #[arg(long, short = 'P', global = true)]
    pub platform: Option<String>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show token usage per model.
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// Show billed costs per model.
    #[command(visible_alias = "c")]
    Cost(cost::CostArgs),

    /// Show combined usage and cost totals for all platforms.
    #[command(visible_alias = "s")]
    Summary(summary::SummaryArgs),

    /// Continuously refresh the summary (like htop for token spend).
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),

    /// Check platform availability.
    Check(check::CheckArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// No platform configured or available.
    PlatformMissing = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("tokenwatch=debug,info")
    } else {
        EnvFilter::new("tokenwatch=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Usage(args)) => usage::run(args, &cli).await,
        Some(Commands::Cost(args)) => cost::run(args, &cli).await,
        Some(Commands::Summary(args)) => summary::run(args, &cli).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        Some(Commands::Check(args)) => check::run(args, &cli).await,
        None => summary::run(&summary::SummaryArgs::default(), &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
