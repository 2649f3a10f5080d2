//! Collect command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

use super::utils::{self, parse_csv};
use crate::render::{build_system_prompt, render_codebase};
use crate::scan::{ExclusionSet, TreeCollector};

#[derive(Args)]
pub struct CollectArgs {
    /// Repository to read (owner/name or GitHub URL)
    #[arg(short = 'r', long, env = "PR_PILOT_REPO", value_name = "REPO")]
    pub repo: Option<String>,

    /// Branch to read instead of the default branch
    #[arg(long = "ref", value_name = "REF")]
    pub ref_: Option<String>,

    /// Subdirectory to collect (defaults to the repository root)
    #[arg(long, value_name = "PATH")]
    pub root: Option<String>,

    /// Exclusion patterns, replacing the configured list (comma-separated)
    #[arg(short = 'e', long, value_name = "PATTERNS")]
    pub exclude: Option<String>,

    /// Print the full system prompt instead of the bare codebase
    #[arg(long)]
    pub prompt: bool,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: CollectArgs, config_path: Option<&Path>) -> Result<()> {
    let config = utils::load(config_path)?;
    let backend = utils::backend(args.repo, &config)?;
    let exclude = parse_csv(&args.exclude).unwrap_or_else(|| config.exclude.clone());
    let root = args.root.unwrap_or_else(|| config.root_path.clone());

    let collection = TreeCollector::new(&backend, ExclusionSet::new(&exclude))
        .git_ref(args.ref_)
        .collect(&root)
        .with_context(|| format!("Failed to collect {}", backend.repo()))?;

    let codebase = render_codebase(&collection.files);
    let text = if args.prompt {
        build_system_prompt(&utils::system_template(&config)?, &codebase)
    } else {
        codebase
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            eprintln!("Wrote {} file(s) to {}", collection.files.len(), path.display());
        }
        None => println!("{text}"),
    }

    if !collection.skipped.is_empty() {
        eprintln!("Skipped {} file(s):", collection.skipped.len());
        for skipped in &collection.skipped {
            eprintln!("  {} ({})", skipped.path, skipped.reason);
        }
    }

    Ok(())
}
