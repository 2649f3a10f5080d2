//! Extraction of pull request metadata and file changes from model output.

use crate::domain::ExtractionResult;
use crate::error::PipelineError;

pub mod locate;
pub mod parse;
pub mod reasoning;

pub use locate::locate;
pub use parse::parse;
pub use reasoning::split_reasoning;

/// Locate the `<response>` document in `raw` and parse it.
pub fn extract(raw: &str) -> Result<ExtractionResult, PipelineError> {
    parse(locate(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileContent;

    #[test]
    fn extracts_from_chatty_output() {
        let raw = "Here is the change you asked for.\n\n\
                   <response><pullRequest><title>T</title><body>B</body></pullRequest>\
                   <files><file><path>a.txt</path><content><![CDATA[v2]]></content></file></files>\
                   </response>\n\nLet me know!";
        let result = extract(raw).expect("extract");
        assert_eq!(result.metadata.title, "T");
        assert_eq!(result.files, vec![FileContent::new("a.txt", "v2")]);
    }

    #[test]
    fn reasoning_is_split_before_extraction() {
        let raw = "<think>plan</think><response><pullRequest><title>T</title><body>B</body>\
                   </pullRequest><files><file><path>a</path><content>x</content></file></files></response>";
        let split = split_reasoning(raw);
        assert_eq!(split.reasoning_text.as_deref(), Some("plan"));
        assert!(extract(&split.response_text).is_ok());
    }
}
