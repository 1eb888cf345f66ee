//! Word completion from the keyword index
//!
//!     The word fragment before the cursor is matched case-insensitively against the start
//!     of every catalog name. Candidates are sorted by name and replace the whole fragment.

use super::words::prefix_before;
use sapf_parser::sapf::{FunctionEntry, KeywordIndex};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub label: String,
    /// `@tag (sig)`
    pub detail: Option<String>,
    /// Markdown
    pub documentation: String,
    /// Byte range the label replaces
    pub replace: Range<usize>,
}

pub fn completion_items(
    index: &KeywordIndex,
    text: &str,
    offset: usize,
) -> Vec<CompletionCandidate> {
    let replace = prefix_before(text, offset);
    let prefix = &text[replace.clone()];
    index
        .complete(prefix)
        .into_iter()
        .map(|entry| CompletionCandidate {
            label: entry.name.clone(),
            detail: entry.detail(),
            documentation: documentation(entry),
            replace: replace.clone(),
        })
        .collect()
}

pub(crate) fn documentation(entry: &FunctionEntry) -> String {
    let category = format!("_Category: {}_", entry.category);
    if entry.description.is_empty() {
        category
    } else {
        format!("{}\n\n{category}", entry.description)
    }
}
