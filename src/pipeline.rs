//! Drafting stage: everything before the repository is mutated.
//!
//! Collect the tree, serialize it into the system prompt, ask the model and
//! extract its proposal. Publishing is left to [`crate::publish::Publisher`]
//! so callers can inspect or confirm the draft first.

use tracing::info;

use crate::backend::SourceControl;
use crate::domain::{ExtractionResult, ModelResponse};
use crate::error::PipelineError;
use crate::extract::extract;
use crate::model::ModelService;
use crate::render::{build_system_prompt, render_codebase};
use crate::scan::{Collection, ExclusionSet, TreeCollector};

/// Inputs of one drafting run.
#[derive(Debug, Clone)]
pub struct DraftRequest<'a> {
    /// Subdirectory to collect; empty for the repository root.
    pub root: &'a str,
    pub exclude: &'a [String],
    /// Branch to read from; the default branch when `None`.
    pub git_ref: Option<&'a str>,
    /// System prompt template containing the repository placeholder.
    pub system_template: &'a str,
    /// What the pull request should accomplish.
    pub task: &'a str,
}

/// A validated proposal ready for publishing.
#[derive(Debug, Clone)]
pub struct Draft {
    pub collection: Collection,
    pub response: ModelResponse,
    pub extraction: ExtractionResult,
}

impl Draft {
    pub fn reasoning(&self) -> Option<&str> {
        self.response.reasoning_text.as_deref()
    }
}

pub fn draft<B, M>(backend: &B, model: &M, request: &DraftRequest<'_>) -> Result<Draft, PipelineError>
where
    B: SourceControl + ?Sized,
    M: ModelService + ?Sized,
{
    let collection = TreeCollector::new(backend, ExclusionSet::new(request.exclude))
        .git_ref(request.git_ref.map(str::to_string))
        .collect(request.root)?;
    info!(
        files = collection.files.len(),
        skipped = collection.skipped.len(),
        excluded = collection.excluded,
        "repository collected"
    );

    let codebase = render_codebase(&collection.files);
    let system_prompt = build_system_prompt(request.system_template, &codebase);

    let response = model.invoke(&system_prompt, request.task)?;
    let extraction = extract(&response.response_text)?;
    info!(
        title = %extraction.metadata.title,
        files = extraction.files.len(),
        "model proposal extracted"
    );

    Ok(Draft { collection, response, extraction })
}
