//! Parsing and validation of the `<response>` document.
//!
//! The document shape is fixed:
//!
//! ```text
//! <response>
//!   <pullRequest><title>..</title><body>..</body></pullRequest>
//!   <files>
//!     <file><path>..</path><content><![CDATA[..]]></content></file>
//!     ...
//!   </files>
//! </response>
//! ```
//!
//! `title`, `body`, `path` and `content` are leaf fields read verbatim up to
//! their closing tag, so source code can carry `<`, `&` or markup without
//! escaping. CDATA sections inside a leaf are unwrapped; entities outside
//! CDATA are decoded. `<file>` is always collected as a list, even when
//! there is only one.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::domain::{ExtractionResult, FileContent, PullRequestMetadata};
use crate::error::PipelineError;

const LEAF_ELEMENTS: &[&str] = &["title", "body", "path", "content"];

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#x([0-9a-fA-F]+)|#([0-9]+)|(lt|gt|amp|quot|apos));").expect("valid regex")
});

#[derive(Debug, Default)]
struct Element<'a> {
    name: &'a str,
    children: Vec<Element<'a>>,
    text: String,
}

impl<'a> Element<'a> {
    fn child(&self, name: &str) -> Option<&Element<'a>> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s Element<'a>> + 's {
        self.children.iter().filter(move |c| c.name == name)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, msg: impl std::fmt::Display) -> PipelineError {
        PipelineError::malformed(format!("{msg} (at byte {})", self.pos))
    }

    /// Advance past `terminator`, failing if it never appears.
    fn skip_past(&mut self, terminator: &str, what: &str) -> Result<&'a str, PipelineError> {
        match self.rest().find(terminator) {
            Some(idx) => {
                let skipped = &self.rest()[..idx];
                self.pos += idx + terminator.len();
                Ok(skipped)
            }
            None => Err(self.error(format!("unterminated {what}"))),
        }
    }

    /// Skip whitespace, comments and processing instructions.
    fn skip_misc(&mut self) -> Result<(), PipelineError> {
        loop {
            let trimmed = self.rest().trim_start();
            self.pos = self.src.len() - trimmed.len();
            if trimmed.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if trimmed.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_document(&mut self) -> Result<Element<'a>, PipelineError> {
        self.skip_misc()?;
        if !starts_with_tag(self.rest()) {
            return Err(self.error("expected a root element"));
        }
        self.parse_element()
    }

    fn parse_element(&mut self) -> Result<Element<'a>, PipelineError> {
        // Caller guarantees `<` followed by a name start character.
        self.pos += 1;
        let name_len = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .ok_or_else(|| self.error("unterminated start tag"))?;
        let name = &self.rest()[..name_len];
        self.pos += name_len;

        let attrs = self.skip_past(">", &format!("<{name}> start tag"))?;
        let mut element = Element { name, ..Element::default() };
        if attrs.trim_end().ends_with('/') {
            return Ok(element);
        }

        if LEAF_ELEMENTS.contains(&name) {
            element.text = self.read_leaf(name)?;
            return Ok(element);
        }

        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(format!("<{name}> is never closed")));
            }
            if let Some(closing) = rest.strip_prefix("</") {
                let end = closing.find('>').ok_or_else(|| self.error("unterminated end tag"))?;
                let closing_name = closing[..end].trim();
                if closing_name != name {
                    return Err(self.error(format!("expected </{name}>, found </{closing_name}>")));
                }
                self.pos += 2 + end + 1;
                return Ok(element);
            }
            if rest.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if let Some(cdata) = rest.strip_prefix("<![CDATA[") {
                let end = cdata.find("]]>").ok_or_else(|| self.error("unterminated CDATA section"))?;
                element.text.push_str(&cdata[..end]);
                self.pos += "<![CDATA[".len() + end + "]]>".len();
            } else if rest.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else if starts_with_tag(rest) {
                let child = self.parse_element()?;
                element.children.push(child);
            } else {
                // Text runs up to the next markup; a stray `<` counts as text.
                let first = rest.chars().next().map_or(1, char::len_utf8);
                let next = rest[first..].find('<').map_or(rest.len(), |i| i + first);
                element.text.push_str(&decode_entities(&rest[..next]));
                self.pos += next;
            }
        }
    }

    /// Read a leaf element's content verbatim up to `</name>`.
    fn read_leaf(&mut self, name: &str) -> Result<String, PipelineError> {
        let closing = format!("</{name}>");
        let mut text = String::new();
        loop {
            let rest = self.rest();
            let cdata = rest.find("<![CDATA[");
            let close = rest.find(&closing);
            match (cdata, close) {
                (Some(c), Some(e)) if c < e => {
                    text.push_str(&decode_entities(&rest[..c]));
                    self.pos += c + "<![CDATA[".len();
                    let raw = self.skip_past("]]>", &format!("CDATA section in <{name}>"))?;
                    text.push_str(raw);
                }
                (Some(c), None) => {
                    text.push_str(&decode_entities(&rest[..c]));
                    self.pos += c + "<![CDATA[".len();
                    let raw = self.skip_past("]]>", &format!("CDATA section in <{name}>"))?;
                    text.push_str(raw);
                }
                (_, Some(e)) => {
                    text.push_str(&decode_entities(&rest[..e]));
                    self.pos += e + closing.len();
                    return Ok(text);
                }
                (None, None) => return Err(self.error(format!("<{name}> is never closed"))),
            }
        }
    }
}

fn starts_with_tag(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

/// Decode the five predefined XML entities and numeric character references.
/// Anything else is left as written.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let code = if let Some(hex) = caps.get(1) {
                u32::from_str_radix(hex.as_str(), 16).ok()
            } else if let Some(dec) = caps.get(2) {
                dec.as_str().parse::<u32>().ok()
            } else {
                return match &caps[3] {
                    "lt" => "<",
                    "gt" => ">",
                    "amp" => "&",
                    "quot" => "\"",
                    _ => "'",
                }
                .to_string();
            };
            code.and_then(char::from_u32).map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn required_leaf<'e>(parent: &'e Element<'_>, name: &str, context: &str) -> Result<&'e str, PipelineError> {
    parent
        .child(name)
        .map(|e| e.text.trim())
        .ok_or_else(|| PipelineError::malformed(format!("{context} has no <{name}>")))
}

/// Parse a located `<response>` document into a validated result.
///
/// Title, body, path and content are trimmed. Missing sections or fields are
/// errors; they are never defaulted to empty strings.
pub fn parse(document: &str) -> Result<ExtractionResult, PipelineError> {
    let root = Parser::new(document).parse_document()?;
    if root.name != "response" {
        return Err(PipelineError::malformed(format!(
            "root element is <{}>, expected <response>",
            root.name
        )));
    }

    let pr = root
        .child("pullRequest")
        .ok_or_else(|| PipelineError::malformed("missing <pullRequest> section"))?;
    let title = required_leaf(pr, "title", "<pullRequest>")?;
    if title.is_empty() {
        return Err(PipelineError::malformed("pull request title is empty"));
    }
    let body = required_leaf(pr, "body", "<pullRequest>")?;

    let files_section =
        root.child("files").ok_or_else(|| PipelineError::malformed("missing <files> section"))?;
    let mut files = Vec::new();
    for (idx, entry) in files_section.children_named("file").enumerate() {
        let context = format!("<file> #{}", idx + 1);
        let path = required_leaf(entry, "path", &context)?;
        if path.is_empty() {
            return Err(PipelineError::malformed(format!("{context} has an empty <path>")));
        }
        let content = required_leaf(entry, "content", &format!("{context} ({path})"))?;
        files.push(FileContent::new(path, content));
    }
    if files.is_empty() {
        return Err(PipelineError::malformed("<files> contains no <file> entries"));
    }

    Ok(ExtractionResult {
        metadata: PullRequestMetadata { title: title.to_string(), body: body.to_string() },
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"<response>
<pullRequest>
<title>  Add greeting  </title>
<body>
Adds a greeting helper.
</body>
</pullRequest>
<files>
<file>
<path> src/greet.rs </path>
<content><![CDATA[
pub fn greet() -> &'static str { "<hi>" }
]]></content>
</file>
<!-- Include additional <file> elements for each modified file -->
<file>
<path>README.md</path>
<content><![CDATA[# Demo]]></content>
</file>
</files>
</response>"#;

    fn malformed(doc: &str) -> String {
        match parse(doc) {
            Err(PipelineError::MalformedResponse(msg)) => msg,
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn parses_and_trims_fields() {
        let result = parse(WELL_FORMED).expect("parse");
        assert_eq!(result.metadata.title, "Add greeting");
        assert_eq!(result.metadata.body, "Adds a greeting helper.");
        assert_eq!(
            result.files,
            vec![
                FileContent::new("src/greet.rs", r#"pub fn greet() -> &'static str { "<hi>" }"#),
                FileContent::new("README.md", "# Demo"),
            ]
        );
    }

    #[test]
    fn single_file_is_still_a_list() {
        let doc = "<response><pullRequest><title>t</title><body>b</body></pullRequest>\
                   <files><file><path>a.txt</path><content>hi</content></file></files></response>";
        let result = parse(doc).expect("parse");
        assert_eq!(result.files, vec![FileContent::new("a.txt", "hi")]);
    }

    #[test]
    fn leaf_content_may_contain_markup_without_cdata() {
        let doc = "<response><pullRequest><title>Use Vec<T></title><body>a && b</body></pullRequest>\
                   <files><file><path>App.tsx</path><content>export const A = () => <div><br></div>;</content></file></files></response>";
        let result = parse(doc).expect("parse");
        assert_eq!(result.metadata.title, "Use Vec<T>");
        assert_eq!(result.files[0].content, "export const A = () => <div><br></div>;");
    }

    #[test]
    fn cdata_may_contain_closing_tags() {
        let doc = "<response><pullRequest><title>t</title><body>b</body></pullRequest>\
                   <files><file><path>x.xml</path><content><![CDATA[<a></content></a>]]></content></file></files></response>";
        assert_eq!(parse(doc).expect("parse").files[0].content, "<a></content></a>");
    }

    #[test]
    fn entities_are_decoded_outside_cdata() {
        let doc = "<response><pullRequest><title>a &amp; b &#x41;&#66;</title><body>&lt;ok&gt; &nbsp;</body></pullRequest>\
                   <files><file><path>a</path><content><![CDATA[&amp;]]></content></file></files></response>";
        let result = parse(doc).expect("parse");
        assert_eq!(result.metadata.title, "a & b AB");
        assert_eq!(result.metadata.body, "<ok> &nbsp;");
        assert_eq!(result.files[0].content, "&amp;");
    }

    #[test]
    fn missing_pull_request_section() {
        let msg = malformed("<response><files><file><path>a</path><content>x</content></file></files></response>");
        assert!(msg.contains("pullRequest"));
    }

    #[test]
    fn missing_title_or_body() {
        let msg = malformed("<response><pullRequest><body>b</body></pullRequest><files><file><path>a</path><content>x</content></file></files></response>");
        assert!(msg.contains("<title>"));
        let msg = malformed("<response><pullRequest><title>t</title></pullRequest><files><file><path>a</path><content>x</content></file></files></response>");
        assert!(msg.contains("<body>"));
    }

    #[test]
    fn empty_title_is_rejected_but_empty_body_is_not() {
        malformed("<response><pullRequest><title>  </title><body>b</body></pullRequest><files><file><path>a</path><content>x</content></file></files></response>");
        let result = parse("<response><pullRequest><title>t</title><body></body></pullRequest><files><file><path>a</path><content>x</content></file></files></response>").expect("parse");
        assert_eq!(result.metadata.body, "");
    }

    #[test]
    fn missing_files_section_or_entries() {
        let msg = malformed("<response><pullRequest><title>t</title><body>b</body></pullRequest></response>");
        assert!(msg.contains("<files>"));
        let msg = malformed("<response><pullRequest><title>t</title><body>b</body></pullRequest><files></files></response>");
        assert!(msg.contains("no <file>"));
    }

    #[test]
    fn file_without_path_or_content() {
        let msg = malformed("<response><pullRequest><title>t</title><body>b</body></pullRequest><files><file><content>x</content></file></files></response>");
        assert!(msg.contains("<path>"));
        let msg = malformed("<response><pullRequest><title>t</title><body>b</body></pullRequest><files><file><path>a.txt</path></file></files></response>");
        assert!(msg.contains("a.txt") && msg.contains("<content>"));
    }

    #[test]
    fn structural_errors_are_malformed() {
        malformed("<response><pullRequest><title>t</title>");
        malformed("<response><pullRequest></files></response>");
        malformed("<result></result>");
        malformed("<response><files><file><path>a</path><content><![CDATA[x</content></file></files></response>");
    }
}
