//! Error types for the pipeline.
//!
//! `PipelineError` carries the error kinds a caller can observe. Only
//! `NotFound`, `MalformedResponse`, `BranchCreateFailed` and
//! `PullRequestCreateFailed` ever abort a run; the remaining kinds are
//! recorded on reports and logged as warnings.

use thiserror::Error;

use crate::backend::BackendError;
use crate::model::ModelError;

/// Error type for pipeline operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The root path or a branch does not exist upstream.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The model output lacks the required markers or fields.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// The new branch already exists or the base branch is missing.
    #[error("Failed to create branch '{branch}': {reason}")]
    BranchCreateFailed { branch: String, reason: String },

    /// A single file write was rejected by the backend.
    #[error("Failed to write {path}: {reason}")]
    FileWriteFailed { path: String, reason: String },

    /// The pull request could not be opened. Branch and file writes that
    /// already happened are left in place on the backend.
    #[error(
        "Failed to create pull request from '{head}': {reason} \
         (branch and file writes were not rolled back)"
    )]
    PullRequestCreateFailed { head: String, reason: String },

    /// The explanatory comment could not be posted.
    #[error("Failed to comment on pull request #{number}: {reason}")]
    CommentFailed { number: u64, reason: String },

    /// Any other backend failure surfaced while collecting.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The model could not be invoked or exited with an error.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PipelineError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        PipelineError::MalformedResponse(msg.into())
    }

    /// Whether the error stops the current run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PipelineError::FileWriteFailed { .. } | PipelineError::CommentFailed { .. })
    }
}
