//! sapf word boundaries
//!
//!     sapf words are runs of anything but whitespace and brackets, so `.+`, `2*` and
//!     `sinosc` are all single words.

use sapf_parser::sapf::brackets::{is_close_bracket, is_open_bracket};
use sapf_parser::sapf::text::floor_char_boundary;
use std::ops::Range;

pub fn is_word_char(ch: char) -> bool {
    !(ch.is_whitespace() || is_open_bracket(ch) || is_close_bracket(ch))
}

/// Byte range of the word under or just before `offset`.
pub fn word_at(text: &str, offset: usize) -> Option<Range<usize>> {
    let offset = floor_char_boundary(text, offset);
    let start = word_start(text, offset);
    let end = offset
        + text[offset..]
            .find(|ch: char| !is_word_char(ch))
            .unwrap_or(text.len() - offset);
    (start < end).then_some(start..end)
}

/// Byte range from the start of the word to `offset`; empty when `offset` follows a
/// separator.
pub fn prefix_before(text: &str, offset: usize) -> Range<usize> {
    let offset = floor_char_boundary(text, offset);
    word_start(text, offset)..offset
}

fn word_start(text: &str, offset: usize) -> usize {
    text[..offset]
        .char_indices()
        .rev()
        .take_while(|(_, ch)| is_word_char(*ch))
        .last()
        .map_or(offset, |(idx, _)| idx)
}
