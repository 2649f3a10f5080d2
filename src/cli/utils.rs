//! Shared CLI utilities.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::fs;
use std::io::IsTerminal;
use std::path::Path;

use crate::backend::{GhBackend, SourceControl};
use crate::config::{load_config, Config};
use crate::domain::{BranchSpec, ExtractionResult};
use crate::publish::{PublishReport, WriteStatus};
use crate::render::DEFAULT_SYSTEM_PROMPT;

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Load the config file from the working directory or `config_path`.
pub fn load(config_path: Option<&Path>) -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    load_config(&cwd, config_path)
}

/// Build the GitHub backend from the flag/env value or the config file.
pub fn backend(repo: Option<String>, config: &Config) -> Result<GhBackend> {
    let repo = repo.or_else(|| config.repo.clone()).context(
        "No repository specified (use --repo, PR_PILOT_REPO, or `repo` in the config file)",
    )?;
    GhBackend::new(&repo).with_context(|| format!("Invalid repository '{repo}'"))
}

/// Resolve base and new branch names. The base falls back to the
/// repository's default branch.
pub fn branches<B: SourceControl + ?Sized>(
    backend: &B,
    base: Option<String>,
    branch: Option<String>,
    config: &Config,
) -> Result<BranchSpec> {
    let new_branch = branch.or_else(|| config.new_branch.clone()).context(
        "No branch specified (use --branch, PR_PILOT_NEW_BRANCH, or `new_branch` in the config file)",
    )?;
    let base_branch = match base.or_else(|| config.base_branch.clone()) {
        Some(base) => base,
        None => backend.default_branch().context("Failed to look up the default branch")?,
    };
    if base_branch == new_branch {
        anyhow::bail!("Base and new branch are both '{new_branch}'");
    }
    Ok(BranchSpec::new(base_branch, new_branch))
}

/// Read the system prompt template from the configured file, or the built-in one.
pub fn system_template(config: &Config) -> Result<String> {
    match &config.system_prompt_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read system prompt: {}", path.display())),
        None => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
    }
}

pub fn print_plan(repo: &str, branches: &BranchSpec, result: &ExtractionResult) {
    println!();
    println!("{}", style(&result.metadata.title).bold());
    println!("  Repository: {repo}");
    println!("  Branch:     {} -> {}", branches.new_branch, branches.base_branch);
    println!("  Files:");
    for path in result.paths() {
        println!("    {path}");
    }
    println!();
}

/// Ask before mutating the repository. `--yes` skips the prompt; without it a
/// non-interactive terminal refuses.
pub fn confirm(assume_yes: bool) -> Result<()> {
    if assume_yes {
        return Ok(());
    }
    if !std::io::stdin().is_terminal() {
        anyhow::bail!("Refusing to publish without confirmation; pass --yes to proceed");
    }
    let proceed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Create the branch and open the pull request?")
        .default(false)
        .interact()?;
    if !proceed {
        anyhow::bail!("Aborted by user");
    }
    Ok(())
}

pub fn print_summary(report: &PublishReport) {
    let pr = &report.pull_request;
    println!("{} #{} {}", style("Pull request opened").green().bold(), pr.number, pr.url);
    for write in &report.writes {
        match &write.status {
            WriteStatus::Created => println!("  {} {}", style("created").green(), write.path),
            WriteStatus::Updated => println!("  {} {}", style("updated").cyan(), write.path),
            WriteStatus::Failed { reason } => {
                println!("  {} {} ({reason})", style("failed").red(), write.path)
            }
        }
    }
    if let Some(err) = &report.comment_error {
        println!("{} {err}", style("Comment not posted:").yellow());
    }
}
