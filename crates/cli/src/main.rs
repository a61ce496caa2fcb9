//! tcsync CLI - Main Entry Point
//!
//! Reconciles a YAML test manifest with annotated test sources and exits
//! with a status CI pipelines can gate on.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tcsync_engine::config::{SyncConfig, DEFAULT_CONFIG_FILE};

mod commands;
mod output;

use commands::{scan, sync};

/// Exit status for fatal errors
const EXIT_FATAL: i32 = 2;

/// tcsync - keep the test manifest in step with the code
#[derive(Parser)]
#[command(name = "tcsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the manifest with the test sources
    Sync(sync::SyncArgs),

    /// List tests discovered in the sources without touching the manifest
    Scan(scan::ScanArgs),
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = SyncConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    tracing::debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Sync(args) => sync::execute(args, config, cli.format),
        Commands::Scan(args) => scan::execute(args, config, cli.format),
    }
}
