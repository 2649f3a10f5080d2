//! Command-line interface for pr-pilot
//!
//! Provides `collect`, `extract`, `apply` and `run` subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod apply;
mod collect;
mod extract;
mod run;
mod utils;

/// Turn a task description into a pull request
#[derive(Parser)]
#[command(name = "pr-pilot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (pr-pilot.toml or .pr-pilot.yml)
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect a repository and print its serialized contents
    Collect(collect::CollectArgs),

    /// Parse a saved model reply and print the extracted pull request
    Extract(extract::ExtractArgs),

    /// Publish a saved model reply as a branch and pull request
    Apply(apply::ApplyArgs),

    /// Collect, ask the model, and publish the result
    Run(Box<run::RunArgs>),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Collect(args) => collect::run(args, config_path),
        Commands::Extract(args) => extract::run(args),
        Commands::Apply(args) => apply::run(args, config_path),
        Commands::Run(args) => run::run(*args, config_path),
    }
}
