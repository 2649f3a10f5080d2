//! Run command implementation: the whole pipeline end to end.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use super::utils::{self, parse_csv};
use crate::model::CommandModel;
use crate::pipeline::{draft, DraftRequest};
use crate::publish::Publisher;
use crate::render::{write_report, RunSummary};

#[derive(Args)]
pub struct RunArgs {
    /// Target repository (owner/name or GitHub URL)
    #[arg(short = 'r', long, env = "PR_PILOT_REPO", value_name = "REPO")]
    pub repo: Option<String>,

    /// Branch the pull request targets (defaults to the repository default branch)
    #[arg(short, long, env = "PR_PILOT_BASE_BRANCH", value_name = "BRANCH")]
    pub base: Option<String>,

    /// Branch to create for the changes
    #[arg(short = 'n', long, env = "PR_PILOT_NEW_BRANCH", value_name = "BRANCH")]
    pub branch: Option<String>,

    /// What the pull request should accomplish
    #[arg(short, long, value_name = "TEXT")]
    pub task: String,

    /// Subdirectory to collect (defaults to the repository root)
    #[arg(long, value_name = "PATH")]
    pub root: Option<String>,

    /// Exclusion patterns, replacing the configured list (comma-separated)
    #[arg(short = 'e', long, value_name = "PATTERNS")]
    pub exclude: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

pub fn run(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let config = utils::load(config_path)?;
    let model = CommandModel::from_argv(&config.model.command)
        .context("Set `model.command` in the config file")?;
    let template = utils::system_template(&config)?;
    let exclude = parse_csv(&args.exclude).unwrap_or_else(|| config.exclude.clone());
    let root = args.root.unwrap_or_else(|| config.root_path.clone());

    let backend = utils::backend(args.repo, &config)?;
    let branches = utils::branches(&backend, args.base, args.branch, &config)?;

    let request = DraftRequest {
        root: &root,
        exclude: &exclude,
        git_ref: Some(branches.base_branch.as_str()),
        system_template: &template,
        task: &args.task,
    };

    let spinner = spinner("Collecting repository and asking the model...")?;
    let drafted = draft(&backend, &model, &request);
    spinner.finish_and_clear();
    let drafted = drafted?;

    if !drafted.collection.skipped.is_empty() {
        eprintln!("Skipped {} unreadable file(s) while collecting", drafted.collection.skipped.len());
    }
    if let Some(reasoning) = drafted.reasoning() {
        println!("{reasoning}");
    }

    utils::print_plan(backend.repo(), &branches, &drafted.extraction);
    utils::confirm(args.yes)?;

    let report = Publisher::new(&backend).apply(&drafted.extraction, drafted.reasoning(), &branches)?;
    utils::print_summary(&report);

    if let Some(path) = &args.report {
        let summary = RunSummary {
            repo: backend.repo(),
            branches: &branches,
            publish: &report,
            collection: Some(&drafted.collection),
        };
        write_report(path, &summary, true)?;
        info!(path = %path.display(), "report written");
    }

    Ok(())
}

fn spinner(message: &str) -> Result<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")?);
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    Ok(bar)
}
