//! Extract command implementation

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use crate::extract::{extract, split_reasoning};
use crate::utils::decode_text;

#[derive(Args)]
pub struct ExtractArgs {
    /// File holding a raw model reply
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let raw = read_reply(&args.file)?;
    let split = split_reasoning(&raw);
    let result = extract(&split.response_text)?;

    let out = json!({
        "metadata": result.metadata,
        "files": result.files,
        "reasoning": split.reasoning_text,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Read a saved model reply, tolerating non-UTF-8 encodings.
pub(super) fn read_reply(path: &std::path::Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read model reply: {}", path.display()))?;
    decode_text(&bytes).with_context(|| format!("Unreadable model reply: {}", path.display()))
}
