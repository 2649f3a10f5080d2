//! Source control backend abstraction.
//!
//! Defines the [`SourceControl`] trait the collector and the publisher talk
//! to, plus [`github::GhBackend`], the production implementation that shells
//! out to `gh api`. [`memory::MemoryBackend`] is an in-process implementation
//! for tests.

use thiserror::Error;

use crate::domain::PullRequestResult;

pub mod github;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use github::GhBackend;

/// Errors reported by a backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("backend command failed: {0}")]
    Command(String),

    #[error("failed to decode backend response: {0}")]
    Decode(String),
}

/// Kind of a directory listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules and anything else the pipeline does not follow.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: String,
    pub kind: EntryKind,
}

/// Result of a content lookup: either a blob with its version token or a
/// directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    File { path: String, bytes: Vec<u8>, sha: String },
    Dir(Vec<DirEntry>),
}

/// Full-content write of one path on one branch.
#[derive(Debug, Clone)]
pub struct ContentWrite<'a> {
    pub path: &'a str,
    pub content: &'a [u8],
    pub message: &'a str,
    /// Version token of the blob being replaced; `None` creates the file.
    pub sha: Option<&'a str>,
    pub branch: &'a str,
}

#[derive(Debug, Clone)]
pub struct NewPullRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

/// Operations the pipeline needs from a hosted repository.
///
/// Implementations must be `Send + Sync`: the collector queries sibling
/// entries from several threads at once.
pub trait SourceControl: Send + Sync {
    fn default_branch(&self) -> Result<String, BackendError>;

    /// Commit id the branch currently points at.
    fn get_ref(&self, branch: &str) -> Result<String, BackendError>;

    /// Creates `branch` pointing at `commit`. Fails with
    /// [`BackendError::AlreadyExists`] if the branch is already there.
    fn create_ref(&self, branch: &str, commit: &str) -> Result<(), BackendError>;

    /// Looks up a path. `git_ref` of `None` reads the default branch.
    fn get_content(&self, path: &str, git_ref: Option<&str>) -> Result<Content, BackendError>;

    fn put_content(&self, write: &ContentWrite<'_>) -> Result<(), BackendError>;

    fn create_pull_request(
        &self,
        request: &NewPullRequest<'_>,
    ) -> Result<PullRequestResult, BackendError>;

    fn create_issue_comment(&self, number: u64, body: &str) -> Result<(), BackendError>;
}
