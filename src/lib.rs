//! pr-pilot: turn a task description into a pull request
//!
//! A repository snapshot is serialized into a model prompt, the model's
//! structured reply is validated, and the proposed files are written to a
//! new branch with a pull request opened against the base branch.

pub mod backend;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod scan;
pub mod utils;

pub use domain::{
    BranchSpec, ExtractionResult, FileContent, ModelResponse, PullRequestMetadata,
    PullRequestResult,
};
pub use error::PipelineError;
