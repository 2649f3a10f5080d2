//! Recursive repository content collection.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use super::exclude::ExclusionSet;
use crate::backend::{BackendError, Content, DirEntry, EntryKind, SourceControl};
use crate::domain::FileContent;
use crate::error::PipelineError;
use crate::utils::decode_text;

/// A path that was not collected because reading or decoding it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Files gathered from a repository snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub files: Vec<FileContent>,
    /// Paths dropped by non-fatal read failures.
    pub skipped: Vec<SkippedFile>,
    /// Number of entries pruned by exclusion patterns.
    pub excluded: usize,
}

impl Collection {
    fn merge(mut self, other: Collection) -> Collection {
        self.files.extend(other.files);
        self.skipped.extend(other.skipped);
        self.excluded += other.excluded;
        self
    }

    fn skip(path: &str, reason: impl Into<String>) -> Collection {
        let reason = reason.into();
        warn!(path, reason = %reason, "skipping file");
        Collection {
            skipped: vec![SkippedFile { path: path.to_string(), reason }],
            ..Collection::default()
        }
    }

    fn excluded_one() -> Collection {
        Collection { excluded: 1, ..Collection::default() }
    }
}

/// Walks a repository tree through a [`SourceControl`] backend.
///
/// Sibling entries are fetched in parallel. Each branch of the walk builds
/// its own partial [`Collection`]; partials are merged in listing order.
pub struct TreeCollector<'a, B: SourceControl + ?Sized> {
    backend: &'a B,
    exclusions: ExclusionSet,
    git_ref: Option<String>,
}

impl<'a, B: SourceControl + ?Sized> TreeCollector<'a, B> {
    pub fn new(backend: &'a B, exclusions: ExclusionSet) -> Self {
        Self { backend, exclusions, git_ref: None }
    }

    /// Reads from `git_ref` instead of the default branch.
    pub fn git_ref(mut self, git_ref: Option<String>) -> Self {
        self.git_ref = git_ref;
        self
    }

    /// Collect every non-excluded file under `root` (empty string for the
    /// repository root).
    ///
    /// Fails with [`PipelineError::NotFound`] when the root cannot be read.
    /// Failures on individual files below the root are recorded in
    /// [`Collection::skipped`] instead.
    pub fn collect(&self, root: &str) -> Result<Collection, PipelineError> {
        let root = root.trim_matches('/');
        if !root.is_empty() && self.exclusions.is_excluded(root) {
            debug!(root, "root path is excluded");
            return Ok(Collection::excluded_one());
        }

        let content = self.backend.get_content(root, self.git_ref.as_deref()).map_err(|e| {
            let what = if root.is_empty() { "repository root".to_string() } else { root.to_string() };
            match e {
                BackendError::NotFound(_) => PipelineError::NotFound(what),
                other => PipelineError::NotFound(format!("{what} is not accessible: {other}")),
            }
        })?;

        let collection = match content {
            Content::File { path, bytes, .. } => self.decode(&path, &bytes),
            Content::Dir(entries) => self.walk(&entries),
        };
        debug!(
            files = collection.files.len(),
            skipped = collection.skipped.len(),
            excluded = collection.excluded,
            "collection finished"
        );
        Ok(collection)
    }

    fn walk(&self, entries: &[DirEntry]) -> Collection {
        entries
            .par_iter()
            .map(|entry| self.visit(entry))
            .collect::<Vec<_>>()
            .into_iter()
            .fold(Collection::default(), Collection::merge)
    }

    fn visit(&self, entry: &DirEntry) -> Collection {
        if self.exclusions.is_excluded(&entry.path) {
            debug!(path = %entry.path, "excluded");
            return Collection::excluded_one();
        }

        match entry.kind {
            EntryKind::Dir => match self.backend.get_content(&entry.path, self.git_ref.as_deref()) {
                Ok(Content::Dir(children)) => self.walk(&children),
                Ok(Content::File { path, bytes, .. }) => self.decode(&path, &bytes),
                Err(e) => Collection::skip(&entry.path, format!("failed to list directory: {e}")),
            },
            EntryKind::File => match self.backend.get_content(&entry.path, self.git_ref.as_deref()) {
                Ok(Content::File { bytes, .. }) => self.decode(&entry.path, &bytes),
                Ok(Content::Dir(_)) => Collection::skip(&entry.path, "listed as a file but is a directory"),
                Err(e) => Collection::skip(&entry.path, format!("failed to fetch content: {e}")),
            },
            EntryKind::Other => Collection::default(),
        }
    }

    fn decode(&self, path: &str, bytes: &[u8]) -> Collection {
        match decode_text(bytes) {
            Ok(content) => {
                debug!(path, bytes = bytes.len(), "collected");
                Collection { files: vec![FileContent::new(path, content)], ..Collection::default() }
            }
            Err(e) => Collection::skip(path, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    fn paths(collection: &Collection) -> Vec<&str> {
        let mut paths: Vec<&str> = collection.files.iter().map(|f| f.path.as_str()).collect();
        paths.sort_unstable();
        paths
    }

    #[test]
    fn collects_nested_files() {
        let backend = MemoryBackend::new("main")
            .with_file("a.txt", "hi")
            .with_file("src/lib.rs", "pub fn x() {}")
            .with_file("src/deep/mod.rs", "// mod");

        let collection =
            TreeCollector::new(&backend, ExclusionSet::empty()).collect("").expect("collect");
        assert_eq!(paths(&collection), vec!["a.txt", "src/deep/mod.rs", "src/lib.rs"]);
        assert!(collection.skipped.is_empty());
    }

    #[test]
    fn excluded_directories_are_not_entered() {
        let backend = MemoryBackend::new("main")
            .with_file("a.txt", "hi")
            .with_file("node_modules/x.js", "ignore")
            .unreadable("node_modules");

        let collection = TreeCollector::new(&backend, ExclusionSet::new(&["node_modules/**", "node_modules"]))
            .collect("")
            .expect("collect");
        assert_eq!(collection.files, vec![FileContent::new("a.txt", "hi")]);
        assert!(collection.skipped.is_empty(), "excluded dir must not be fetched");
        assert_eq!(collection.excluded, 1);
    }

    #[test]
    fn directory_literal_prunes_the_subtree() {
        let backend = MemoryBackend::new("main")
            .with_file("src/components/ui/button.tsx", "export {}")
            .with_file("src/app/page.tsx", "export {}");

        let collection = TreeCollector::new(&backend, ExclusionSet::new(&["src/components/ui"]))
            .collect("")
            .expect("collect");
        assert_eq!(paths(&collection), vec!["src/app/page.tsx"]);
    }

    #[test]
    fn unreadable_file_is_skipped_not_fatal() {
        let backend = MemoryBackend::new("main")
            .with_file("a.txt", "hi")
            .with_file("b.txt", "bye")
            .unreadable("b.txt");

        let collection =
            TreeCollector::new(&backend, ExclusionSet::empty()).collect("").expect("collect");
        assert_eq!(paths(&collection), vec!["a.txt"]);
        assert_eq!(collection.skipped.len(), 1);
        assert_eq!(collection.skipped[0].path, "b.txt");
    }

    #[test]
    fn binary_blobs_are_skipped() {
        let backend = MemoryBackend::new("main")
            .with_file("a.txt", "hi")
            .with_bytes("logo.png", &[0x89, b'P', b'N', b'G', 0x00, 0x00]);

        let collection =
            TreeCollector::new(&backend, ExclusionSet::empty()).collect("").expect("collect");
        assert_eq!(paths(&collection), vec!["a.txt"]);
        assert_eq!(collection.skipped[0].reason, "binary content");
    }

    #[test]
    fn missing_root_is_not_found() {
        let backend = MemoryBackend::new("main").with_file("a.txt", "hi");
        let err = TreeCollector::new(&backend, ExclusionSet::empty()).collect("nope").unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn unreadable_root_is_not_found() {
        let backend = MemoryBackend::new("main").with_file("src/a.rs", "").unreadable("src");
        let err = TreeCollector::new(&backend, ExclusionSet::empty()).collect("src").unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(ref m) if m.contains("not accessible")));
    }

    #[test]
    fn single_file_root() {
        let backend = MemoryBackend::new("main").with_file("src/a.rs", "fn a() {}");
        let collection =
            TreeCollector::new(&backend, ExclusionSet::empty()).collect("src/a.rs").expect("collect");
        assert_eq!(collection.files, vec![FileContent::new("src/a.rs", "fn a() {}")]);
    }

    #[test]
    fn reads_from_requested_ref() {
        let backend = MemoryBackend::new("main").with_branch("old").with_file("new.txt", "x");
        let collection = TreeCollector::new(&backend, ExclusionSet::empty())
            .git_ref(Some("old".to_string()))
            .collect("")
            .expect("collect");
        assert!(collection.files.is_empty());
    }
}
