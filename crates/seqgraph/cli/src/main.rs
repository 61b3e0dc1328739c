//! Seqgraph - sequence graphs from game telemetry
//!
//! Reads a directory of CSV game logs and writes one JSON graph per file or
//! per experimental condition, plus the `visualization_ids.json` index.

use clap::Parser;
use seqgraph_cli::{AppConfig, CliError, Grouping, Pipeline};
use seqgraph_reducer::Focus;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Seqgraph CLI
#[derive(Parser)]
#[command(name = "seqgraph")]
#[command(about = "Seqgraph - event logs to sequence graphs", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SEQGRAPH_CONFIG")]
    config: Option<String>,

    /// Input directory with CSV logs
    #[arg(short, long, env = "SEQGRAPH_INPUT")]
    input: Option<PathBuf>,

    /// Output directory for JSON graphs
    #[arg(short, long, env = "SEQGRAPH_OUTPUT")]
    output: Option<PathBuf>,

    /// Output grouping: per-file or by-condition
    #[arg(short, long, env = "SEQGRAPH_GROUPING")]
    grouping: Option<String>,

    /// Actor focus for per-file grouping: teams or players
    #[arg(short, long, env = "SEQGRAPH_FOCUS")]
    focus: Option<String>,

    /// Log level
    #[arg(long, env = "SEQGRAPH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "SEQGRAPH_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load(cli.config.as_deref()).map_err(CliError::from)?;

    // Initialize tracing
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Override with CLI args
    if let Some(input) = cli.input {
        config.input_dir = input;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if let Some(grouping) = cli.grouping.as_deref() {
        config.grouping = Grouping::parse(grouping)
            .ok_or_else(|| CliError::Config(format!("Unknown grouping: {}", grouping)))?;
    }
    if let Some(focus) = cli.focus.as_deref() {
        config.reducer.focus = match focus.to_lowercase().as_str() {
            "teams" | "team" => Focus::Teams,
            "players" | "player" | "single_players" => Focus::Players,
            other => {
                return Err(CliError::Config(format!("Unknown focus: {}", other)).into());
            }
        };
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        "Seqgraph starting"
    );

    let report = Pipeline::new(config).run().await?;

    for (path, reason) in &report.failed {
        warn!(file = %path.display(), reason = %reason, "Skipped file");
    }
    if !report.failed.is_empty() {
        anyhow::bail!(
            "{} of {} files failed; {} graphs written",
            report.failed.len(),
            report.files,
            report.written.len()
        );
    }
    Ok(())
}
