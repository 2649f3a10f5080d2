//! System prompt assembly.

use tracing::warn;

use crate::domain::REPO_CONTENT_PLACEHOLDER;

/// System prompt used when the configuration does not provide one.
///
/// The reply format it describes is the one [`crate::extract`] parses.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a software engineer who changes this repository by opening pull requests.
Implement the requested change: features, fixes, refactors or cleanups.

Rules:
- Answer in the exact XML format below, every time, without altering it.
- Close every CDATA section you open.
- For every file you touch, output its COMPLETE content. Never truncate or elide.
- Touch only the files and lines the change requires.
- Follow the conventions already used in the codebase.

Reply format:
<response>
<pullRequest>
<title>{Short description of the change}</title>
<body>{What changed and why, which files, notable details, how to test}</body>
</pullRequest>
<files>
<file>
<path>{Repository-relative path}</path>
<content><![CDATA[
{Complete file content}
]]></content>
</file>
</files>
</response>

Repository code for reference:
{REPO_CONTENT}
"#;

/// Substitute the serialized codebase into a system prompt template.
///
/// Every occurrence of the placeholder is replaced. A template without the
/// placeholder gets the codebase appended so the model still sees it.
pub fn build_system_prompt(template: &str, codebase: &str) -> String {
    if template.contains(REPO_CONTENT_PLACEHOLDER) {
        template.replace(REPO_CONTENT_PLACEHOLDER, codebase)
    } else {
        warn!(
            placeholder = REPO_CONTENT_PLACEHOLDER,
            "system prompt has no placeholder; appending repository content"
        );
        format!("{}\n\nRepository code for reference:\n{codebase}\n", template.trim_end())
    }
}
