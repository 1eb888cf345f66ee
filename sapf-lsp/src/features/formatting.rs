//! Formatting as minimal text edits
//!
//!     The indentation formatter rewrites whole documents. Editors expect edits, so the
//!     formatted text is diffed line by line against the original and each run of changed
//!     lines becomes one [`TextEditSpan`]. Range formatting formats the whole document and
//!     keeps only the edits inside the requested lines, since indentation depends on every
//!     line above the range.

use sapf_parser::sapf::{format_source, FormatOptions, SourceLocation};
use similar::{Algorithm, ChangeTag, TextDiff};

/// Text edit expressed as byte offsets over the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEditSpan {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

/// Inclusive/exclusive line range used for range formatting filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    fn clamp(self, line_count: usize) -> Self {
        let start = self.start.min(line_count);
        let mut end = self.end.min(line_count);
        if end <= start {
            end = (start + 1).min(line_count.max(1));
        }
        LineRange { start, end }
    }
}

/// Produce formatting edits for the entire document.
pub fn format_document(source: &str, options: &FormatOptions) -> Vec<TextEditSpan> {
    compute_edits(source, &format_source(source, options))
}

/// Produce formatting edits limited to the provided line range.
pub fn format_range(source: &str, options: &FormatOptions, range: LineRange) -> Vec<TextEditSpan> {
    let all_edits = format_document(source, options);
    if all_edits.is_empty() {
        return all_edits;
    }
    let locator = SourceLocation::new(source);
    let clamped = range.clamp(locator.line_count());
    all_edits
        .into_iter()
        .filter(|span| edit_within_range(span, &locator, clamped))
        .collect()
}

fn compute_edits(original: &str, formatted: &str) -> Vec<TextEditSpan> {
    if original == formatted {
        return Vec::new();
    }

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(original, formatted);

    let locator = SourceLocation::new(original);
    let mut edits = Vec::new();
    let mut builder: Option<EditBuilder> = None;
    let mut cursor = 0usize;

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Equal => {
                cursor += 1;
                flush_builder(&mut builder, &mut edits);
            }
            ChangeTag::Delete => {
                let line = cursor;
                cursor += 1;
                let start = offset_for_line(line, &locator, original.len());
                let end = offset_for_line(line + 1, &locator, original.len());
                extend_delete(&mut builder, &mut edits, start, end);
            }
            ChangeTag::Insert => {
                let line = cursor;
                let offset = offset_for_line(line, &locator, original.len());
                let text = change.value().to_string();
                if !text.is_empty() {
                    extend_insert(&mut builder, &mut edits, offset, text);
                }
            }
        }
    }

    flush_builder(&mut builder, &mut edits);
    edits
}

fn edit_within_range(span: &TextEditSpan, locator: &SourceLocation, range: LineRange) -> bool {
    if span.start == span.end {
        // Pure insertion
        let pos = locator.byte_to_position(span.start);
        return pos.line >= range.start && pos.line < range.end;
    }
    let start = locator.byte_to_position(span.start);
    let end = locator.byte_to_position(span.end);
    start.line >= range.start && end.line <= range.end
}

fn extend_delete(
    builder: &mut Option<EditBuilder>,
    edits: &mut Vec<TextEditSpan>,
    start: usize,
    end: usize,
) {
    match builder {
        Some(current) => {
            if start > current.end {
                flush_builder(builder, edits);
                *builder = Some(EditBuilder::new(start, end));
            } else if end > current.end {
                current.end = end;
            }
        }
        None => {
            *builder = Some(EditBuilder::new(start, end));
        }
    }
}

fn extend_insert(
    builder: &mut Option<EditBuilder>,
    edits: &mut Vec<TextEditSpan>,
    offset: usize,
    text: String,
) {
    match builder {
        Some(current) => {
            if offset < current.start || offset > current.end {
                flush_builder(builder, edits);
                *builder = Some(EditBuilder::at(offset));
            }
            if let Some(edit) = builder.as_mut() {
                if offset > edit.end {
                    edit.end = offset;
                }
                edit.new_text.push_str(&text);
            }
        }
        None => {
            let mut edit = EditBuilder::at(offset);
            edit.new_text.push_str(&text);
            *builder = Some(edit);
        }
    }
}

fn flush_builder(builder: &mut Option<EditBuilder>, edits: &mut Vec<TextEditSpan>) {
    if let Some(edit) = builder.take() {
        edits.push(edit.into_span());
    }
}

fn offset_for_line(line: usize, locator: &SourceLocation, text_len: usize) -> usize {
    locator.line_start(line).unwrap_or(text_len)
}

struct EditBuilder {
    start: usize,
    end: usize,
    new_text: String,
}

impl EditBuilder {
    fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            new_text: String::new(),
        }
    }

    fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    fn into_span(self) -> TextEditSpan {
        TextEditSpan {
            start: self.start,
            end: self.end,
            new_text: self.new_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_FIXTURE: &str = "{\n[300 301] 0 sinosc\n      .3 *\n}\n";
    const RANGE_FIXTURE: &str = "(\n  1\n)\n\n{\nx   y\n     z\n}\n";

    fn apply_spans(source: &str, edits: &[TextEditSpan]) -> String {
        let mut result = source.to_string();
        let mut sorted = edits.to_vec();
        sorted.sort_by_key(|edit| edit.start);
        for edit in sorted.into_iter().rev() {
            result.replace_range(edit.start..edit.end, &edit.new_text);
        }
        result
    }

    #[test]
    fn formats_entire_document() {
        let options = FormatOptions::default();
        let source = FULL_FIXTURE;
        let formatted = format_source(source, &options);
        assert_ne!(formatted, source);

        let edits = format_document(source, &options);
        assert!(!edits.is_empty());
        let applied = apply_spans(source, &edits);
        assert_eq!(applied, formatted);
    }

    #[test]
    fn edits_cover_only_changed_lines() {
        let edits = format_document(FULL_FIXTURE, &FormatOptions::default());
        assert_eq!(edits.len(), 1);
        let locator = SourceLocation::new(FULL_FIXTURE);
        assert_eq!(locator.byte_to_position(edits[0].start).line, 1);
        assert_eq!(locator.byte_to_position(edits[0].end).line, 3);
    }

    #[test]
    fn range_formatting_filters_edits_outside_selection() {
        let options = FormatOptions::default();
        let source = RANGE_FIXTURE;
        let range = LineRange { start: 4, end: 8 };
        let edits = format_range(source, &options, range);
        assert!(!edits.is_empty());

        let locator = SourceLocation::new(source);
        for edit in &edits {
            let start_line = locator.byte_to_position(edit.start).line;
            let end_line = locator.byte_to_position(edit.end).line;
            assert!(start_line >= range.start);
            assert!(end_line <= range.end);
        }

        let applied = apply_spans(source, &edits);
        assert!(applied.starts_with("(\n  1\n)\n\n"));
        assert!(applied.ends_with("{\n    x y\n    z\n}\n"));
    }

    #[test]
    fn no_edits_when_already_formatted() {
        let source = "(\n    1 2 +\n)\n";
        let edits = format_document(source, &FormatOptions::default());
        assert!(edits.is_empty());
    }

    #[test]
    fn honours_indent_size() {
        let options = FormatOptions::default().with_indent_size(2);
        let applied = apply_spans("(\n1\n)", &format_document("(\n1\n)", &options));
        assert_eq!(applied, "(\n  1\n)");
    }
}
