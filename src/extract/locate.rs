//! Locating the structured payload inside free-form model output.

use crate::error::PipelineError;

pub const START_MARKER: &str = "<response>";
pub const END_MARKER: &str = "</response>";

/// Return the slice from the first `<response>` through the first
/// `</response>` that follows it, markers included.
pub fn locate(raw: &str) -> Result<&str, PipelineError> {
    let start = raw.find(START_MARKER).ok_or_else(|| {
        PipelineError::malformed(format!("no {START_MARKER} marker in model output"))
    })?;
    let after_start = start + START_MARKER.len();
    let end = raw[after_start..].find(END_MARKER).ok_or_else(|| {
        PipelineError::malformed(format!("{START_MARKER} is never closed by {END_MARKER}"))
    })?;
    Ok(&raw[start..after_start + end + END_MARKER.len()])
}
