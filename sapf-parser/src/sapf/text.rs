//! Positions, spans and offset conversion
//!
//! Every operation in this crate works on byte offsets into the full document text.
//! Editors talk in line/column pairs, so this module provides the conversions:
//!
//! - [`Position`] - a zero-based line:column position (column in bytes)
//! - [`TextSpan`] - a piece of text cut out of a document together with its byte offsets
//! - [`SourceLocation`] - line-start table for offset <-> position conversion
//!
//! LSP clients count columns in UTF-16 code units. [`SourceLocation::utf16_to_offset`] and
//! [`SourceLocation::offset_to_utf16`] do that translation, clamping to the line so that a
//! stale cursor never produces an offset outside the document.

use std::fmt;
use std::ops::Range as ByteRange;

/// Represents a position in source text (line and byte column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A piece of document text and where it came from.
///
/// For a located block, `start` and `end` are the offsets of the open and close brackets
/// and `text` is what lies between them. For line and selection fallbacks they bound `text`
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub struct TextSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Byte range covered by the span
    pub fn range(&self) -> ByteRange<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} {:?}", self.start, self.end, self.text)
    }
}

/// Provides fast conversion between byte offsets and line/column positions
#[derive(Debug, Clone)]
pub struct SourceLocation {
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
    len: usize,
}

impl SourceLocation {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];

        for (byte_pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(byte_pos + 1);
            }
        }

        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Convert a byte offset to a line/column position. Offsets past the end clamp to it.
    pub fn byte_to_position(&self, byte_offset: usize) -> Position {
        let byte_offset = byte_offset.min(self.len);
        let line = self
            .line_starts
            .binary_search(&byte_offset)
            .unwrap_or_else(|i| i - 1);

        Position::new(line, byte_offset - self.line_starts[line])
    }

    /// Convert a line/byte-column position to an offset, clamped to the document.
    pub fn position_to_byte(&self, position: Position) -> usize {
        match self.line_starts.get(position.line) {
            Some(start) => (start + position.column).min(self.len),
            None => self.len,
        }
    }

    /// Get the total number of lines in the source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the byte offset for the start of a line
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Byte range of the line containing `offset`, without its line terminator.
    pub fn line_bounds(&self, source: &str, offset: usize) -> ByteRange<usize> {
        let line = self.byte_to_position(offset).line;
        let start = self.line_starts[line];
        let mut end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        if end > start && source.as_bytes().get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        start..end
    }

    /// Convert an LSP-style position (UTF-16 column) to a byte offset.
    pub fn utf16_to_offset(&self, source: &str, line: usize, utf16_column: usize) -> usize {
        let Some(start) = self.line_start(line) else {
            return self.len;
        };
        let line_end = self.line_bounds(source, start).end;
        let mut units = 0;
        for (idx, ch) in source[start..line_end].char_indices() {
            if units >= utf16_column {
                return start + idx;
            }
            units += ch.len_utf16();
        }
        line_end
    }

    /// Convert a byte offset to an LSP-style (line, UTF-16 column) pair.
    pub fn offset_to_utf16(&self, source: &str, offset: usize) -> (usize, usize) {
        let position = self.byte_to_position(offset);
        let start = self.line_starts[position.line];
        let mut end = start + position.column;
        while end > start && !source.is_char_boundary(end) {
            end -= 1;
        }
        let column = source[start..end].chars().map(char::len_utf16).sum();
        (position.line, column)
    }
}

/// Snap `offset` to the closest char boundary at or before it.
pub fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while offset > 0 && !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
