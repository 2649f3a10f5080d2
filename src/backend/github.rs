//! GitHub backend built on the `gh` CLI.
//!
//! Every call goes through `gh api`, so authentication, host selection and
//! enterprise configuration are whatever the local `gh` session provides.

use std::io::Write;
use std::process::{Command, Stdio};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    BackendError, Content, ContentWrite, DirEntry, EntryKind, NewPullRequest, SourceControl,
};
use crate::domain::PullRequestResult;

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct RefInfo {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    path: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlobInfo {
    content: String,
}

#[derive(Debug, Deserialize)]
struct PullInfo {
    number: u64,
    html_url: String,
}

/// [`SourceControl`] implementation for one GitHub repository.
#[derive(Debug, Clone)]
pub struct GhBackend {
    repo: String,
    program: String,
}

impl GhBackend {
    /// Creates a backend for `repo`, given as `owner/name` or a GitHub URL.
    pub fn new(repo: &str) -> Result<Self, BackendError> {
        let repo = normalize_repo_slug(repo).ok_or_else(|| {
            BackendError::Rejected(format!("'{repo}' is not an owner/name repository"))
        })?;
        Ok(Self { repo, program: "gh".to_string() })
    }

    /// Overrides the `gh` executable (useful for wrappers and tests).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn api(&self, method: &str, endpoint: &str, body: Option<&Value>) -> Result<Value, BackendError> {
        debug!(method, endpoint, "gh api");
        let mut cmd = Command::new(&self.program);
        cmd.args(["api", "-X", method, endpoint, "-H", "Accept: application/vnd.github+json"]);
        if body.is_some() {
            cmd.args(["--input", "-"]);
        }
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| BackendError::Command(format!("failed to spawn {}: {e}", self.program)))?;

        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(|e| BackendError::Decode(e.to_string()))?;
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(&payload)
                    .map_err(|e| BackendError::Command(format!("failed writing request: {e}")))?;
            }
        } else {
            drop(child.stdin.take());
        }

        let output = child
            .wait_with_output()
            .map_err(|e| BackendError::Command(format!("gh api {endpoint}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(classify_failure(endpoint, &stderr, &stdout));
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|e| BackendError::Decode(format!("gh api {endpoint}: {e}")))
    }

    fn fetch_blob(&self, sha: &str) -> Result<Vec<u8>, BackendError> {
        let value = self.api("GET", &format!("repos/{}/git/blobs/{sha}", self.repo), None)?;
        let blob: BlobInfo = from_value(value)?;
        decode_base64(&blob.content)
    }

    fn contents_endpoint(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("repos/{}/contents", self.repo)
        } else {
            format!("repos/{}/contents/{}", self.repo, encode_path(path))
        }
    }
}

impl SourceControl for GhBackend {
    fn default_branch(&self) -> Result<String, BackendError> {
        let info: RepoInfo = from_value(self.api("GET", &format!("repos/{}", self.repo), None)?)?;
        Ok(info.default_branch)
    }

    fn get_ref(&self, branch: &str) -> Result<String, BackendError> {
        let endpoint = format!("repos/{}/git/ref/heads/{}", self.repo, encode_path(branch));
        let info: RefInfo = from_value(self.api("GET", &endpoint, None).map_err(|e| match e {
            BackendError::NotFound(_) => BackendError::NotFound(format!("branch '{branch}'")),
            other => other,
        })?)?;
        Ok(info.object.sha)
    }

    fn create_ref(&self, branch: &str, commit: &str) -> Result<(), BackendError> {
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": commit });
        self.api("POST", &format!("repos/{}/git/refs", self.repo), Some(&body)).map_err(
            |e| match e {
                BackendError::AlreadyExists(_) => {
                    BackendError::AlreadyExists(format!("branch '{branch}'"))
                }
                other => other,
            },
        )?;
        Ok(())
    }

    fn get_content(&self, path: &str, git_ref: Option<&str>) -> Result<Content, BackendError> {
        let mut endpoint = self.contents_endpoint(path);
        if let Some(r) = git_ref {
            endpoint.push_str(&format!("?ref={}", encode_path(r)));
        }
        let value = self.api("GET", &endpoint, None).map_err(|e| match e {
            BackendError::NotFound(_) => BackendError::NotFound(display_path(path)),
            other => other,
        })?;

        if value.is_array() {
            let items: Vec<ContentItem> = from_value(value)?;
            let entries = items
                .into_iter()
                .map(|item| DirEntry { kind: entry_kind(&item.kind), path: item.path })
                .collect();
            return Ok(Content::Dir(entries));
        }

        let item: ContentItem = from_value(value)?;
        if entry_kind(&item.kind) != EntryKind::File {
            return Ok(Content::Dir(Vec::new()));
        }

        // Blobs above the contents API size limit come back without inline content.
        let bytes = match (item.encoding.as_deref(), item.content.as_deref()) {
            (Some("base64"), Some(encoded)) => decode_base64(encoded)?,
            _ => self.fetch_blob(&item.sha)?,
        };
        Ok(Content::File { path: item.path, bytes, sha: item.sha })
    }

    fn put_content(&self, write: &ContentWrite<'_>) -> Result<(), BackendError> {
        let mut body = json!({
            "message": write.message,
            "content": STANDARD.encode(write.content),
            "branch": write.branch,
        });
        if let Some(sha) = write.sha {
            body["sha"] = Value::String(sha.to_string());
        }
        self.api("PUT", &self.contents_endpoint(write.path), Some(&body))?;
        Ok(())
    }

    fn create_pull_request(
        &self,
        request: &NewPullRequest<'_>,
    ) -> Result<PullRequestResult, BackendError> {
        let body = json!({
            "title": request.title,
            "body": request.body,
            "head": request.head,
            "base": request.base,
        });
        let pull: PullInfo =
            from_value(self.api("POST", &format!("repos/{}/pulls", self.repo), Some(&body))?)?;
        Ok(PullRequestResult { number: pull.number, url: pull.html_url })
    }

    fn create_issue_comment(&self, number: u64, body: &str) -> Result<(), BackendError> {
        let payload = json!({ "body": body });
        self.api("POST", &format!("repos/{}/issues/{number}/comments", self.repo), Some(&payload))?;
        Ok(())
    }
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, BackendError> {
    // The API wraps base64 payloads at 60 columns.
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| BackendError::Decode(format!("invalid base64: {e}")))
}

fn entry_kind(kind: &str) -> EntryKind {
    match kind {
        "file" => EntryKind::File,
        "dir" => EntryKind::Dir,
        _ => EntryKind::Other,
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "repository root".to_string()
    } else {
        format!("path '{path}'")
    }
}

/// Maps a failed `gh api` invocation onto a [`BackendError`].
///
/// `gh` reports the HTTP status on stderr (`gh: Not Found (HTTP 404)`) and
/// prints the JSON error document on stdout.
fn classify_failure(endpoint: &str, stderr: &str, stdout: &str) -> BackendError {
    let message = serde_json::from_str::<Value>(stdout)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| stderr.trim().to_string());

    if stderr.contains("HTTP 404") {
        BackendError::NotFound(endpoint.to_string())
    } else if stderr.contains("HTTP 422") && message.contains("already exists") {
        BackendError::AlreadyExists(endpoint.to_string())
    } else if stderr.contains("HTTP 4") {
        BackendError::Rejected(format!("{endpoint}: {message}"))
    } else {
        BackendError::Command(format!("gh api {endpoint} failed: {message}"))
    }
}

/// Normalize a repository reference to `owner/name`.
///
/// Examples:
/// - `owner/repo`                          → `owner/repo`
/// - `https://github.com/owner/repo.git`   → `owner/repo`
/// - `git@github.com:owner/repo.git`       → `owner/repo`
fn normalize_repo_slug(input: &str) -> Option<String> {
    let trimmed = input.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let tail = if let Some(idx) = trimmed.find("github.com") {
        trimmed[idx + "github.com".len()..].trim_start_matches([':', '/'])
    } else {
        trimmed
    };

    let mut parts = tail.split('/');
    let owner = parts.next().filter(|p| !p.is_empty())?;
    let name = parts.next().filter(|p| !p.is_empty())?;
    if parts.next().is_some() {
        return None;
    }
    Some(format!("{owner}/{name}"))
}

/// Percent-encodes a repository path, keeping `/` separators intact.
fn encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
