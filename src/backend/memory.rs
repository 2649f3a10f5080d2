//! In-process backend with fault injection.
//!
//! Branches point at commits, commits own a flat path → blob tree. Version
//! tokens are SHA-256 digests of the blob bytes unless seeded explicitly.
//! Every mutating call is recorded so tests can assert on the exact sequence
//! the publisher issued.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use sha2::{Digest, Sha256};

use super::{
    BackendError, Content, ContentWrite, DirEntry, EntryKind, NewPullRequest, SourceControl,
};
use crate::domain::PullRequestResult;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Blob {
    bytes: Vec<u8>,
    sha: String,
}

type Tree = BTreeMap<String, Blob>;

/// A recorded mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateRef { branch: String, commit: String },
    PutContent { path: String, branch: String, sha: Option<String>, message: String },
    CreatePullRequest { title: String, body: String, head: String, base: String },
    Comment { number: u64, body: String },
}

#[derive(Debug, Default)]
struct State {
    default_branch: String,
    branches: HashMap<String, String>,
    commits: HashMap<String, Tree>,
    next_commit: u64,
    next_pull: u64,
    calls: Vec<Call>,
    failing_writes: BTreeSet<String>,
    unreadable: BTreeSet<String>,
    fail_pull_requests: bool,
    fail_comments: bool,
}

impl State {
    fn commit(&mut self, tree: Tree) -> String {
        self.next_commit += 1;
        let id = format!("c{:04}", self.next_commit);
        self.commits.insert(id.clone(), tree);
        id
    }

    fn tree(&self, branch: &str) -> Result<&Tree, BackendError> {
        let commit = self
            .branches
            .get(branch)
            .ok_or_else(|| BackendError::NotFound(format!("branch '{branch}'")))?;
        self.commits
            .get(commit)
            .ok_or_else(|| BackendError::NotFound(format!("commit '{commit}'")))
    }
}

/// In-memory [`SourceControl`] implementation.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    /// Creates a repository with one empty branch that is also the default.
    pub fn new(default_branch: &str) -> Self {
        let mut state = State { default_branch: default_branch.to_string(), ..State::default() };
        let commit = state.commit(Tree::new());
        state.branches.insert(default_branch.to_string(), commit);
        Self { state: Mutex::new(state) }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a file to the default branch with a content-derived token.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        let sha = content_sha(content.as_bytes());
        self.with_file_token(path, content, &sha)
    }

    /// Adds a file to the default branch with an explicit version token.
    pub fn with_file_token(self, path: &str, content: &str, sha: &str) -> Self {
        {
            let mut state = self.lock();
            let branch = state.default_branch.clone();
            let mut tree = state.tree(&branch).cloned().unwrap_or_default();
            tree.insert(
                path.to_string(),
                Blob { bytes: content.as_bytes().to_vec(), sha: sha.to_string() },
            );
            let commit = state.commit(tree);
            state.branches.insert(branch, commit);
        }
        self
    }

    /// Adds a raw blob to the default branch.
    pub fn with_bytes(self, path: &str, bytes: &[u8]) -> Self {
        {
            let mut state = self.lock();
            let branch = state.default_branch.clone();
            let mut tree = state.tree(&branch).cloned().unwrap_or_default();
            tree.insert(path.to_string(), Blob { bytes: bytes.to_vec(), sha: content_sha(bytes) });
            let commit = state.commit(tree);
            state.branches.insert(branch, commit);
        }
        self
    }

    /// Creates another branch at the default branch head.
    pub fn with_branch(self, branch: &str) -> Self {
        {
            let mut state = self.lock();
            let head = state.branches.get(&state.default_branch).cloned();
            if let Some(head) = head {
                state.branches.insert(branch.to_string(), head);
            }
        }
        self
    }

    /// Makes every write to `path` fail.
    pub fn fail_writes_to(self, path: &str) -> Self {
        self.lock().failing_writes.insert(path.to_string());
        self
    }

    /// Makes reads of `path` fail with a non-`NotFound` error.
    pub fn unreadable(self, path: &str) -> Self {
        self.lock().unreadable.insert(path.to_string());
        self
    }

    pub fn fail_pull_requests(self) -> Self {
        self.lock().fail_pull_requests = true;
        self
    }

    pub fn fail_comments(self) -> Self {
        self.lock().fail_comments = true;
        self
    }

    /// Mutating calls in the order they were received.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Current text of `path` on `branch`, if present.
    pub fn file(&self, branch: &str, path: &str) -> Option<String> {
        let state = self.lock();
        let blob = state.tree(branch).ok()?.get(path)?;
        Some(String::from_utf8_lossy(&blob.bytes).into_owned())
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        self.lock().branches.contains_key(branch)
    }
}

impl SourceControl for MemoryBackend {
    fn default_branch(&self) -> Result<String, BackendError> {
        Ok(self.lock().default_branch.clone())
    }

    fn get_ref(&self, branch: &str) -> Result<String, BackendError> {
        self.lock()
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("branch '{branch}'")))
    }

    fn create_ref(&self, branch: &str, commit: &str) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(Call::CreateRef { branch: branch.to_string(), commit: commit.to_string() });
        if state.branches.contains_key(branch) {
            return Err(BackendError::AlreadyExists(format!("branch '{branch}'")));
        }
        if !state.commits.contains_key(commit) {
            return Err(BackendError::NotFound(format!("commit '{commit}'")));
        }
        state.branches.insert(branch.to_string(), commit.to_string());
        Ok(())
    }

    fn get_content(&self, path: &str, git_ref: Option<&str>) -> Result<Content, BackendError> {
        let state = self.lock();
        if state.unreadable.contains(path) {
            return Err(BackendError::Command(format!("read of '{path}' failed")));
        }
        let branch = git_ref.unwrap_or(state.default_branch.as_str());
        let tree = state.tree(branch)?;

        let path = path.trim_matches('/');
        if let Some(blob) = tree.get(path) {
            return Ok(Content::File {
                path: path.to_string(),
                bytes: blob.bytes.clone(),
                sha: blob.sha.clone(),
            });
        }

        let prefix = if path.is_empty() { String::new() } else { format!("{path}/") };
        let mut children: BTreeMap<String, EntryKind> = BTreeMap::new();
        for key in tree.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else { continue };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    children.insert(format!("{prefix}{dir}"), EntryKind::Dir);
                }
                None => {
                    children.insert(key.clone(), EntryKind::File);
                }
            }
        }

        if children.is_empty() && !path.is_empty() {
            return Err(BackendError::NotFound(format!("path '{path}'")));
        }
        Ok(Content::Dir(children.into_iter().map(|(path, kind)| DirEntry { path, kind }).collect()))
    }

    fn put_content(&self, write: &ContentWrite<'_>) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(Call::PutContent {
            path: write.path.to_string(),
            branch: write.branch.to_string(),
            sha: write.sha.map(str::to_string),
            message: write.message.to_string(),
        });
        if state.failing_writes.contains(write.path) {
            return Err(BackendError::Rejected(format!("write to '{}' refused", write.path)));
        }

        let mut tree = state.tree(write.branch)?.clone();
        let current = tree.get(write.path).map(|b| b.sha.clone());
        if current.as_deref() != write.sha {
            return Err(BackendError::Rejected(format!(
                "'{}' version token mismatch",
                write.path
            )));
        }
        tree.insert(
            write.path.to_string(),
            Blob { bytes: write.content.to_vec(), sha: content_sha(write.content) },
        );
        let commit = state.commit(tree);
        state.branches.insert(write.branch.to_string(), commit);
        Ok(())
    }

    fn create_pull_request(
        &self,
        request: &NewPullRequest<'_>,
    ) -> Result<PullRequestResult, BackendError> {
        let mut state = self.lock();
        state.calls.push(Call::CreatePullRequest {
            title: request.title.to_string(),
            body: request.body.to_string(),
            head: request.head.to_string(),
            base: request.base.to_string(),
        });
        if state.fail_pull_requests {
            return Err(BackendError::Rejected("pull request creation disabled".to_string()));
        }
        for branch in [request.head, request.base] {
            state.tree(branch)?;
        }
        state.next_pull += 1;
        let number = state.next_pull;
        Ok(PullRequestResult { number, url: format!("memory://pulls/{number}") })
    }

    fn create_issue_comment(&self, number: u64, body: &str) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(Call::Comment { number, body: body.to_string() });
        if state.fail_comments {
            return Err(BackendError::Rejected("comments disabled".to_string()));
        }
        Ok(())
    }
}

fn content_sha(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
