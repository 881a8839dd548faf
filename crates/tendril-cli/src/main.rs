//! Tendril CLI - Diff relation sets and apply write batches

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{apply, completions, config as config_cmd, diff, plan};
use config::{config_file_path, Config};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "tendril")]
#[command(author, version, about = "Keep entity relations in sync with a desired state")]
pub struct Cli {
    /// Config file
    #[arg(short, long, global = true, env = "TENDRIL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format: table, json
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the config file path
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config_file_path)
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from(self.format.as_str())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the relation changes between two relation sets
    Diff(diff::DiffArgs),
    /// Show the edge writes a relation change turns into
    Plan(plan::PlanArgs),
    /// Apply write batches to the in-memory bulk-write store
    Apply(apply::ApplyArgs),
    /// Manage configuration
    Config(config_cmd::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting tendril CLI");

    match &cli.command {
        Commands::Diff(args) => diff::run(args, &cli)?,
        Commands::Plan(args) => {
            let config = Config::load(&cli.config_path())?;
            plan::run(args, &cli, &config)?
        }
        Commands::Apply(args) => {
            let config = Config::load(&cli.config_path())?;
            apply::run(args, &cli, &config).await?
        }
        Commands::Config(args) => config_cmd::run(args, &cli)?,
        Commands::Completions(args) => completions::run(args)?,
    }

    Ok(())
}
