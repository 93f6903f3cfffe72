//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod analyze;
mod config_cmd;
mod dashboard;
mod latest;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "sustainlens")]
#[command(about = "Submit a URL or file for SDG classification and view the results")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Classification service base URL (overrides config and environment)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Write logs to this file (the dashboard otherwise discards them)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard (default)
    Dashboard,

    /// Submit a URL and/or file once and print the result
    Analyze {
        /// Webpage URL to analyze
        #[arg(short, long)]
        url: Option<String>,
        /// File to upload
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the most recently stored classification
    Latest {
        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file in use
    Path,
}

/// Initialize logging based on verbosity.
///
/// The dashboard owns the terminal, so its logs go to `log_file` or nowhere.
fn init_logging(verbose: bool, interactive: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let default_filter = if verbose {
        "sustainlens=info"
    } else {
        "sustainlens=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None if interactive => {}
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        endpoint: cli.endpoint,
        log_file: cli.log_file,
    };
    let (settings, config) = load_settings_with_options(options).await?;

    let command = cli.command.unwrap_or(Commands::Dashboard);
    let interactive = matches!(command, Commands::Dashboard);
    init_logging(cli.verbose, interactive, settings.log_file.as_deref())?;

    match command {
        Commands::Dashboard => dashboard::cmd_dashboard(&settings).await,
        Commands::Analyze { url, file, json } => {
            analyze::cmd_analyze(&settings, url, file.as_deref(), json).await
        }
        Commands::Latest { json } => latest::cmd_latest(&settings, json).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&settings),
            ConfigCommands::Path => config_cmd::cmd_config_path(&config),
        },
    }
}
