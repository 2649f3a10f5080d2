//! Write-back of an extraction result as branch, commits, pull request and
//! comment.
//!
//! Steps run strictly in order:
//! 1. resolve the base branch head
//! 2. create the new branch at that commit (fatal on failure)
//! 3. write each file, looking up its version token first (per-file failures
//!    are recorded and the loop continues)
//! 4. open the pull request (fatal on failure, earlier writes stay in place)
//! 5. post the explanatory comment (failure is recorded, never fatal)

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, Content, ContentWrite, NewPullRequest, SourceControl};
use crate::domain::{BranchSpec, ExtractionResult, FileContent, PullRequestResult};
use crate::error::PipelineError;
use crate::render::comment::render_comment;

/// What happened to one proposed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteStatus {
    Created,
    Updated,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub path: String,
    #[serde(flatten)]
    pub status: WriteStatus,
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        !matches!(self.status, WriteStatus::Failed { .. })
    }
}

/// Result of a successful publish: the pull request exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub pull_request: PullRequestResult,
    /// One entry per proposed file, in proposal order.
    pub writes: Vec<WriteOutcome>,
    /// Set when the explanatory comment could not be posted.
    pub comment_error: Option<String>,
}

impl PublishReport {
    pub fn written(&self) -> impl Iterator<Item = &WriteOutcome> {
        self.writes.iter().filter(|w| w.is_written())
    }

    pub fn failed(&self) -> impl Iterator<Item = &WriteOutcome> {
        self.writes.iter().filter(|w| !w.is_written())
    }

    pub fn comment_posted(&self) -> bool {
        self.comment_error.is_none()
    }
}

/// Applies extraction results to a [`SourceControl`] backend.
pub struct Publisher<'a, B: SourceControl + ?Sized> {
    backend: &'a B,
}

impl<'a, B: SourceControl + ?Sized> Publisher<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Publish `result` on `branches.new_branch` and open a pull request
    /// into `branches.base_branch`.
    ///
    /// Nothing is rolled back: if the pull request cannot be created, the
    /// branch and every successful write remain on the backend.
    pub fn apply(
        &self,
        result: &ExtractionResult,
        reasoning: Option<&str>,
        branches: &BranchSpec,
    ) -> Result<PublishReport, PipelineError> {
        self.create_branch(branches)?;

        let writes: Vec<WriteOutcome> =
            result.files.iter().map(|file| self.write_file(file, &branches.new_branch)).collect();
        let written = writes.iter().filter(|w| w.is_written()).count();
        info!(written, failed = writes.len() - written, "file writes finished");

        let pull_request = self
            .backend
            .create_pull_request(&NewPullRequest {
                title: &result.metadata.title,
                body: &result.metadata.body,
                head: &branches.new_branch,
                base: &branches.base_branch,
            })
            .map_err(|e| PipelineError::PullRequestCreateFailed {
                head: branches.new_branch.clone(),
                reason: e.to_string(),
            })?;
        info!(number = pull_request.number, url = %pull_request.url, "pull request opened");

        let comment = render_comment(reasoning, &writes);
        let comment_error = match self.backend.create_issue_comment(pull_request.number, &comment)
        {
            Ok(()) => None,
            Err(e) => {
                let err =
                    PipelineError::CommentFailed { number: pull_request.number, reason: e.to_string() };
                warn!("{err}");
                Some(err.to_string())
            }
        };

        Ok(PublishReport { pull_request, writes, comment_error })
    }

    fn create_branch(&self, branches: &BranchSpec) -> Result<(), PipelineError> {
        let failed = |reason: String| PipelineError::BranchCreateFailed {
            branch: branches.new_branch.clone(),
            reason,
        };

        let head = self.backend.get_ref(&branches.base_branch).map_err(|e| match e {
            BackendError::NotFound(_) => {
                failed(format!("base branch '{}' not found", branches.base_branch))
            }
            other => failed(other.to_string()),
        })?;
        self.backend.create_ref(&branches.new_branch, &head).map_err(|e| failed(e.to_string()))?;
        info!(branch = %branches.new_branch, base = %branches.base_branch, commit = %head, "branch created");
        Ok(())
    }

    /// Looks up the current version token of `file.path` and writes the new
    /// content. Lookup and write for one path always happen back to back.
    fn write_file(&self, file: &FileContent, branch: &str) -> WriteOutcome {
        let outcome = |status| WriteOutcome { path: file.path.clone(), status };
        let fail = |reason: String| {
            warn!(
                "{}",
                PipelineError::FileWriteFailed { path: file.path.clone(), reason: reason.clone() }
            );
            outcome(WriteStatus::Failed { reason })
        };

        let sha = match self.backend.get_content(&file.path, Some(branch)) {
            Ok(Content::File { sha, .. }) => Some(sha),
            Ok(Content::Dir(_)) => return fail("path is a directory".to_string()),
            Err(BackendError::NotFound(_)) => None,
            Err(e) => return fail(format!("version lookup failed: {e}")),
        };

        let message = match sha {
            Some(_) => format!("Update {}", file.path),
            None => format!("Create {}", file.path),
        };
        debug!(path = %file.path, sha = ?sha, "writing");

        let write = ContentWrite {
            path: &file.path,
            content: file.content.as_bytes(),
            message: &message,
            sha: sha.as_deref(),
            branch,
        };
        match self.backend.put_content(&write) {
            Ok(()) if sha.is_some() => outcome(WriteStatus::Updated),
            Ok(()) => outcome(WriteStatus::Created),
            Err(e) => fail(e.to_string()),
        }
    }
}
