//! Codebase serialization for prompt embedding.

use crate::domain::FileContent;

const SEPARATOR: &str = "===============================================";

/// Render collected files as one text block.
///
/// Each file is framed by separator lines around a `File: <path>` header,
/// followed by its raw content. The output depends only on the input
/// sequence, so the model sees byte-identical context on every call.
pub fn render_codebase(files: &[FileContent]) -> String {
    files.iter().map(render_file).collect::<Vec<_>>().join("\n\n")
}

fn render_file(file: &FileContent) -> String {
    format!("{SEPARATOR}\nFile: {}\n{SEPARATOR}\n{}\n", file.path, file.content)
}
