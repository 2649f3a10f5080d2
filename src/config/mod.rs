//! Configuration loading
//!
//! Handles loading from config files; CLI flags and environment variables
//! are layered on top by the command modules (CLI > Env > File > Defaults).

use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

pub mod loader;

pub use loader::load_config;

use crate::domain::default_exclude_patterns;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Repository as `owner/name`.
    pub repo: Option<String>,
    pub base_branch: Option<String>,
    pub new_branch: Option<String>,
    /// Subdirectory to collect; empty for the whole repository.
    pub root_path: String,
    #[serde(deserialize_with = "string_or_list")]
    pub exclude: Vec<String>,
    /// File holding a system prompt template with a `{REPO_CONTENT}` placeholder.
    pub system_prompt_file: Option<PathBuf>,
    pub model: ModelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo: None,
            base_branch: None,
            new_branch: None,
            root_path: String::new(),
            exclude: default_exclude_patterns().iter().map(|s| s.to_string()).collect(),
            system_prompt_file: None,
            model: ModelConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Program and arguments; see [`crate::model::CommandModel`].
    pub command: Vec<String>,
}

/// Accept either a list of strings or one comma-separated string.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    let items = match Raw::deserialize(deserializer)? {
        Raw::One(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
        Raw::Many(v) => v,
    };
    Ok(items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}
