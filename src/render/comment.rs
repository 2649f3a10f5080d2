//! Pull request comment rendering.

use crate::publish::{WriteOutcome, WriteStatus};

/// Render the comment posted on a freshly opened pull request.
///
/// Lists every proposed file in proposal order. Files whose write failed
/// stay in the list, annotated with the failure, so the comment never
/// hides a proposed change.
pub fn render_comment(reasoning: Option<&str>, writes: &[WriteOutcome]) -> String {
    let mut out = String::new();
    out.push_str("### Model reasoning\n\n");
    match reasoning.map(str::trim).filter(|r| !r.is_empty()) {
        Some(text) => {
            out.push_str(text);
            out.push('\n');
        }
        None => out.push_str("_The model did not return any reasoning._\n"),
    }

    out.push_str("\n### Files\n\n");
    for write in writes {
        match &write.status {
            WriteStatus::Created => out.push_str(&format!("- `{}` (created)\n", write.path)),
            WriteStatus::Updated => out.push_str(&format!("- `{}` (updated)\n", write.path)),
            WriteStatus::Failed { reason } => {
                out.push_str(&format!("- `{}` (**not written**: {})\n", write.path, reason));
            }
        }
    }
    out
}
