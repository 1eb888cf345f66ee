//! Bracket-depth indentation formatter
//!
//!     sapf has no statement syntax to speak of, so the only structure a formatter can see is
//!     bracket nesting. Indentation is re-derived from scratch on every run: existing leading
//!     whitespace is thrown away and replaced by `indent_size` spaces per open bracket.
//!
//! Rules
//!
//!     Lines are processed top to bottom with one running `level`, starting at 0:
//!
//!         1. Blank lines stay blank and leave `level` alone.
//!         2. Whitespace runs collapse to a single space, ends are trimmed.
//!         3. Comment lines are indented at `level` and are not counted.
//!         4. Other lines are indented at `level`, or one less when they start with a
//!            closing bracket.
//!         5. `level` moves by opens minus closes of all bracket kinds on the line, never
//!            below 0.
//!
//!     Because the bracket counts and the first character of a line survive normalization
//!     unchanged, formatting already formatted text is a no-op.
//!
//! Limitations
//!
//!     Brackets are counted lexically. A `(` inside a string literal moves the level like any
//!     other bracket.

use super::brackets::{is_close_bracket, is_open_bracket};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub const DEFAULT_INDENT_SIZE: usize = 4;
pub const DEFAULT_COMMENT_PREFIX: &str = ";";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Spaces per nesting level
    pub indent_size: usize,
    /// Lines starting with this marker are comments. Empty disables comment handling.
    pub comment_prefix: String,
}

impl FormatOptions {
    pub fn with_indent_size(mut self, indent_size: usize) -> Self {
        self.indent_size = indent_size;
        self
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_size: DEFAULT_INDENT_SIZE,
            comment_prefix: DEFAULT_COMMENT_PREFIX.to_string(),
        }
    }
}

/// Re-indent `text` from its bracket nesting.
///
/// Line count and a trailing newline are preserved; `\r\n` line endings come out as `\n`.
pub fn format_source(text: &str, options: &FormatOptions) -> String {
    let mut level = 0usize;
    let mut output = Vec::new();

    for raw in text.split('\n') {
        let line = normalize_whitespace(raw);
        if line.is_empty() {
            output.push(String::new());
            continue;
        }

        if is_comment(&line, options) {
            output.push(indent(&line, level, options));
            continue;
        }

        let starts_closed = line.chars().next().is_some_and(is_close_bracket);
        let line_level = if starts_closed {
            level.saturating_sub(1)
        } else {
            level
        };
        output.push(indent(&line, line_level, options));
        level = apply_delta(level, bracket_delta(&line));
    }

    output.join("\n")
}

/// Opens minus closes over all bracket kinds
pub fn bracket_delta(line: &str) -> isize {
    line.chars().fold(0, |delta, ch| {
        if is_open_bracket(ch) {
            delta + 1
        } else if is_close_bracket(ch) {
            delta - 1
        } else {
            delta
        }
    })
}

fn apply_delta(level: usize, delta: isize) -> usize {
    if delta < 0 {
        level.saturating_sub(delta.unsigned_abs())
    } else {
        level + delta as usize
    }
}

fn normalize_whitespace(line: &str) -> String {
    WHITESPACE_RUN.replace_all(line.trim(), " ").into_owned()
}

fn is_comment(line: &str, options: &FormatOptions) -> bool {
    !options.comment_prefix.is_empty() && line.starts_with(options.comment_prefix.as_str())
}

fn indent(line: &str, level: usize, options: &FormatOptions) -> String {
    let mut out = " ".repeat(level * options.indent_size);
    out.push_str(line);
    out
}
