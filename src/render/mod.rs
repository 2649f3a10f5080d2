//! Output rendering (codebase context, prompts, comments, reports)

pub mod codebase;
pub mod comment;
pub mod prompt;
pub mod report;

pub use codebase::render_codebase;
pub use comment::render_comment;
pub use prompt::{build_system_prompt, DEFAULT_SYSTEM_PROMPT};
pub use report::{write_report, RunSummary};
