//! Separating a model's reasoning trace from its answer.

use super::locate::START_MARKER;
use crate::domain::ModelResponse;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Split a `<think>...</think>` block preceding the `<response>` document
/// out of `raw`.
///
/// The block's trimmed body becomes the reasoning text and the block is
/// removed from the response. Tags from the `<response>` marker onwards
/// belong to the payload and are never touched. Without a complete leading
/// block the text is returned unchanged and reasoning is `None`.
pub fn split_reasoning(raw: &str) -> ModelResponse {
    let preamble = &raw[..raw.find(START_MARKER).unwrap_or(raw.len())];
    let Some(open) = preamble.find(THINK_OPEN) else {
        return ModelResponse { response_text: raw.to_string(), reasoning_text: None };
    };
    let body_start = open + THINK_OPEN.len();
    let Some(close) = preamble[body_start..].find(THINK_CLOSE) else {
        return ModelResponse { response_text: raw.to_string(), reasoning_text: None };
    };

    let reasoning = raw[body_start..body_start + close].trim();
    let mut response = String::with_capacity(raw.len());
    response.push_str(&raw[..open]);
    response.push_str(&raw[body_start + close + THINK_CLOSE.len()..]);

    ModelResponse {
        response_text: response.trim().to_string(),
        reasoning_text: (!reasoning.is_empty()).then(|| reasoning.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_leading_think_block() {
        let split = split_reasoning("<think>\nNeed a helper.\n</think>\n<response></response>");
        assert_eq!(split.reasoning_text.as_deref(), Some("Need a helper."));
        assert_eq!(split.response_text, "<response></response>");
    }

    #[test]
    fn no_block_means_no_reasoning() {
        let split = split_reasoning("<response></response>");
        assert_eq!(split.reasoning_text, None);
        assert_eq!(split.response_text, "<response></response>");
    }

    #[test]
    fn unterminated_block_is_left_alone() {
        let raw = "<think>still thinking <response></response>";
        let split = split_reasoning(raw);
        assert_eq!(split.reasoning_text, None);
        assert_eq!(split.response_text, raw);
    }

    #[test]
    fn empty_block_yields_none() {
        let split = split_reasoning("<think>  </think>answer");
        assert_eq!(split.reasoning_text, None);
        assert_eq!(split.response_text, "answer");
    }

    #[test]
    fn tags_inside_the_response_are_payload() {
        let raw = "<response><files><file><path>a.ts</path><content><![CDATA[\
                   const OPEN = \"<think>\"; const CLOSE = \"</think>\";\
                   ]]></content></file></files></response>";
        let split = split_reasoning(raw);
        assert_eq!(split.reasoning_text, None);
        assert_eq!(split.response_text, raw);
    }

    #[test]
    fn leading_block_is_split_even_when_payload_has_tags() {
        let raw = "<think>plan</think><response><content><think>x</think></content></response>";
        let split = split_reasoning(raw);
        assert_eq!(split.reasoning_text.as_deref(), Some("plan"));
        assert_eq!(split.response_text, "<response><content><think>x</think></content></response>");
    }

    #[test]
    fn block_closed_only_inside_the_response_is_not_split() {
        let raw = "<think>never closed <response><content></think></content></response>";
        let split = split_reasoning(raw);
        assert_eq!(split.reasoning_text, None);
        assert_eq!(split.response_text, raw);
    }
}
