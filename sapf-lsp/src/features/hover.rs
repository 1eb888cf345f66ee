use super::completion::documentation;
use super::words::word_at;
use sapf_parser::sapf::{FunctionEntry, KeywordIndex};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverResult {
    /// Byte range of the hovered word
    pub range: Range<usize>,
    /// Markdown
    pub contents: String,
}

/// Documentation for the catalog word under `offset`.
pub fn hover(index: &KeywordIndex, text: &str, offset: usize) -> Option<HoverResult> {
    let range = word_at(text, offset)?;
    let entry = index.get(&text[range.clone()])?;
    Some(HoverResult {
        range,
        contents: render(entry),
    })
}

fn render(entry: &FunctionEntry) -> String {
    let mut contents = format!("**{}**", entry.name);
    if let Some(detail) = entry.detail() {
        contents.push_str(&format!("\n\n```sapf\n{detail}\n```"));
    }
    contents.push_str("\n\n");
    contents.push_str(&documentation(entry));
    contents
}
