//! Core data types shared across the pipeline.

use serde::{Deserialize, Serialize};

/// Placeholder token replaced by the serialized codebase in the system prompt.
pub const REPO_CONTENT_PLACEHOLDER: &str = "{REPO_CONTENT}";

/// Schema version written into run reports.
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// A repository-relative path and its full text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

impl FileContent {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into() }
    }
}

/// Title and body of the pull request proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestMetadata {
    pub title: String,
    pub body: String,
}

/// Validated output of the response extractor.
///
/// `files` keeps the order in which the model listed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub metadata: PullRequestMetadata,
    pub files: Vec<FileContent>,
}

impl ExtractionResult {
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }
}

/// Branch the pull request targets and the branch created to hold the changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSpec {
    pub base_branch: String,
    pub new_branch: String,
}

impl BranchSpec {
    pub fn new(base_branch: impl Into<String>, new_branch: impl Into<String>) -> Self {
        Self { base_branch: base_branch.into(), new_branch: new_branch.into() }
    }
}

/// Pull request as reported back by the backend once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestResult {
    pub number: u64,
    pub url: String,
}

/// Raw model reply, split into the answer and the optional reasoning trace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelResponse {
    pub response_text: String,
    pub reasoning_text: Option<String>,
}

/// Exclusion list used when no configuration overrides it.
pub fn default_exclude_patterns() -> &'static [&'static str] {
    &[
        "README.md",
        "LICENSE",
        ".github",
        ".gitignore",
        ".pre-commit-config.yaml",
        "test",
        "ruff.toml",
        "requirements.txt",
        "public",
        "package.json",
        "package-lock.json",
        "vite.config.ts",
        "postcss.config.js",
        "src/components/ui",
        "components.json",
        "src/app/globals.css",
        "eslint.config.mjs",
        "postcss.config.mjs",
        "tsconfig.json",
        "next.config.ts",
        "prompts.ts",
        "src/lib/prompts.ts",
        "tailwind.config.ts",
    ]
}
