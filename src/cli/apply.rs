//! Apply command implementation

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

use super::extract::read_reply;
use super::utils;
use crate::extract::{extract, split_reasoning};
use crate::publish::Publisher;
use crate::render::{write_report, RunSummary};

#[derive(Args)]
pub struct ApplyArgs {
    /// Target repository (owner/name or GitHub URL)
    #[arg(short = 'r', long, env = "PR_PILOT_REPO", value_name = "REPO")]
    pub repo: Option<String>,

    /// Branch the pull request targets (defaults to the repository default branch)
    #[arg(short, long, env = "PR_PILOT_BASE_BRANCH", value_name = "BRANCH")]
    pub base: Option<String>,

    /// Branch to create for the changes
    #[arg(short = 'n', long, env = "PR_PILOT_NEW_BRANCH", value_name = "BRANCH")]
    pub branch: Option<String>,

    /// File holding a raw model reply
    #[arg(long, value_name = "FILE")]
    pub response: PathBuf,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

pub fn run(args: ApplyArgs, config_path: Option<&Path>) -> Result<()> {
    let config = utils::load(config_path)?;

    // Validate the reply before touching the network.
    let raw = read_reply(&args.response)?;
    let split = split_reasoning(&raw);
    let result = extract(&split.response_text)?;

    let backend = utils::backend(args.repo, &config)?;
    let branches = utils::branches(&backend, args.base, args.branch, &config)?;

    utils::print_plan(backend.repo(), &branches, &result);
    utils::confirm(args.yes)?;

    let report =
        Publisher::new(&backend).apply(&result, split.reasoning_text.as_deref(), &branches)?;
    utils::print_summary(&report);

    if let Some(path) = &args.report {
        let summary =
            RunSummary { repo: backend.repo(), branches: &branches, publish: &report, collection: None };
        write_report(path, &summary, true)?;
        info!(path = %path.display(), "report written");
    }

    Ok(())
}
