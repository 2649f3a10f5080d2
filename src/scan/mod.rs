//! Repository content collection with exclusion patterns

use crate::backend::SourceControl;
use crate::error::PipelineError;

pub mod collector;
pub mod exclude;

pub use collector::{Collection, SkippedFile, TreeCollector};
pub use exclude::{matches, ExclusionSet};

/// Collect `root` from the backend's default branch, skipping paths that
/// match any of `patterns`.
pub fn collect_repository<B, S>(
    backend: &B,
    root: &str,
    patterns: &[S],
) -> Result<Collection, PipelineError>
where
    B: SourceControl + ?Sized,
    S: AsRef<str>,
{
    TreeCollector::new(backend, ExclusionSet::new(patterns)).collect(root)
}
