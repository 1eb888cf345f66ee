//! Block location for the evaluation commands
//!
//!     An evaluation command sends one "block" of sapf code to the REPL. A block is the text
//!     between a pair of brackets that encloses the cursor. When nothing encloses the cursor
//!     the command falls back to the selection, or to the current line.
//!
//! Scan
//!
//!     A single left-to-right pass keeps a stack of open brackets (offset and the depth they
//!     were pushed at). Each close bracket pops its open bracket; if `open < cursor < close`
//!     the pair is a candidate. Close brackets with an empty stack are skipped, and open
//!     brackets left on the stack at the end never become candidates.
//!
//! Policies
//!
//!     [`BlockPolicy::Outermost`] keeps the candidate with the smallest open offset, which is
//!     the widest enclosing block. [`BlockPolicy::Innermost`] keeps the candidate pushed at the
//!     greatest depth; on equal depth the candidate found last wins.
//!
//!     Example, cursor inside `(bar)`:
//!
//!         (foo (bar) baz)
//!
//!     Outermost yields `foo (bar) baz`, Innermost yields `bar`.

use super::brackets::BracketPair;
use super::text::{floor_char_boundary, SourceLocation, TextSpan};
use std::fmt;
use std::ops::Range as ByteRange;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockPolicy {
    /// Widest block that encloses the cursor
    #[default]
    Outermost,
    /// Most deeply nested block that encloses the cursor
    Innermost,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown block policy '{0}', expected outermost or innermost")]
pub struct PolicyError(pub String);

impl BlockPolicy {
    pub fn name(self) -> &'static str {
        match self {
            BlockPolicy::Outermost => "outermost",
            BlockPolicy::Innermost => "innermost",
        }
    }

    /// Parse a configuration value, falling back to [`BlockPolicy::Outermost`].
    pub fn resolve(value: &str) -> (BlockPolicy, Option<PolicyError>) {
        match value.parse() {
            Ok(policy) => (policy, None),
            Err(err) => {
                log::warn!("{err}; using outermost");
                (BlockPolicy::default(), Some(err))
            }
        }
    }
}

impl FromStr for BlockPolicy {
    type Err = PolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "outermost" => Ok(BlockPolicy::Outermost),
            "innermost" => Ok(BlockPolicy::Innermost),
            _ => Err(PolicyError(value.to_string())),
        }
    }
}

impl fmt::Display for BlockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenBracket {
    offset: usize,
    depth: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    open: usize,
    close: usize,
    depth: usize,
}

/// Find the block to evaluate at `cursor`.
///
/// `pair` is `None` when no usable bracket pair is configured; the result is then always
/// the selection/line fallback. `selection` is a byte range; an empty range counts as no
/// selection.
pub fn locate(
    text: &str,
    cursor: usize,
    selection: Option<ByteRange<usize>>,
    pair: Option<BracketPair>,
    policy: BlockPolicy,
) -> TextSpan {
    pair.and_then(|pair| enclosing_block(text, cursor, pair, policy))
        .unwrap_or_else(|| selection_or_line(text, cursor, selection))
}

/// The bracketed block enclosing `cursor`, if any.
pub fn enclosing_block(
    text: &str,
    cursor: usize,
    pair: BracketPair,
    policy: BlockPolicy,
) -> Option<TextSpan> {
    let candidate = scan_candidates(text, cursor, pair)
        .into_iter()
        .reduce(|best, next| match policy {
            BlockPolicy::Outermost => {
                if next.open < best.open {
                    next
                } else {
                    best
                }
            }
            BlockPolicy::Innermost => {
                if next.depth >= best.depth {
                    next
                } else {
                    best
                }
            }
        })?;

    let inner = &text[candidate.open + pair.open().len_utf8()..candidate.close];
    Some(TextSpan::new(inner, candidate.open, candidate.close))
}

/// The non-empty selection, or else the trimmed line holding `cursor`.
pub fn selection_or_line(
    text: &str,
    cursor: usize,
    selection: Option<ByteRange<usize>>,
) -> TextSpan {
    if let Some(range) = selection {
        let start = floor_char_boundary(text, range.start.min(range.end));
        let end = floor_char_boundary(text, range.start.max(range.end));
        if start < end {
            return TextSpan::new(&text[start..end], start, end);
        }
    }
    current_line(text, cursor)
}

/// The line holding `cursor`, trimmed, with offsets of the trimmed text.
pub fn current_line(text: &str, cursor: usize) -> TextSpan {
    let location = SourceLocation::new(text);
    let bounds = location.line_bounds(text, cursor);
    let line = &text[bounds.clone()];
    let leading = line.len() - line.trim_start().len();
    let trimmed = line.trim();
    let start = bounds.start + leading;
    TextSpan::new(trimmed, start, start + trimmed.len())
}

fn scan_candidates(text: &str, cursor: usize, pair: BracketPair) -> Vec<Candidate> {
    let mut stack: Vec<OpenBracket> = Vec::new();
    let mut candidates = Vec::new();

    for (offset, ch) in text.char_indices() {
        if ch == pair.open() {
            stack.push(OpenBracket {
                offset,
                depth: stack.len(),
            });
        } else if ch == pair.close() {
            let Some(open) = stack.pop() else {
                continue;
            };
            if open.offset < cursor && cursor < offset {
                candidates.push(Candidate {
                    open: open.offset,
                    close: offset,
                    depth: open.depth,
                });
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sapf::brackets::BracketKind;

    fn round() -> Option<BracketPair> {
        Some(BracketKind::Round.pair())
    }

    #[test]
    fn outermost_and_innermost_disagree_on_nested_blocks() {
        let text = "(foo (bar) baz)";
        let cursor = text.find("bar").unwrap() + 1;

        let outer = locate(text, cursor, None, round(), BlockPolicy::Outermost);
        assert_eq!(outer, TextSpan::new("foo (bar) baz", 0, 14));

        let inner = locate(text, cursor, None, round(), BlockPolicy::Innermost);
        assert_eq!(inner, TextSpan::new("bar", 5, 9));
    }

    #[test]
    fn boundaries_are_not_inside() {
        let text = "x (a b) y";
        // cursor just before the open bracket and just before the close bracket
        for cursor in [2, 6] {
            let span = locate(text, cursor, None, round(), BlockPolicy::Outermost);
            assert_eq!(span.text, "x (a b) y", "cursor {cursor}");
        }
        let span = locate(text, 3, None, round(), BlockPolicy::Outermost);
        assert_eq!(span.text, "a b");
    }

    #[test]
    fn stray_closers_are_ignored() {
        let text = ") ) (1 2 +) )";
        let cursor = text.find('1').unwrap();
        let span = locate(text, cursor, None, round(), BlockPolicy::Outermost);
        assert_eq!(span.text, "1 2 +");
        assert_eq!(span.start, 4);
        assert_eq!(span.end, 10);
    }

    #[test]
    fn unclosed_open_never_matches() {
        let text = "(1 2 +\n3 4 *";
        let span = locate(text, 9, None, round(), BlockPolicy::Outermost);
        assert_eq!(span, TextSpan::new("3 4 *", 7, 12));
    }

    #[test]
    fn only_the_configured_pair_counts() {
        let text = "[1 2 (3 4) 5]";
        let cursor = text.find('2').unwrap();
        let square = Some(BracketKind::Square.pair());
        let span = locate(text, cursor, None, square, BlockPolicy::Outermost);
        assert_eq!(span.text, "1 2 (3 4) 5");

        let span = locate(text, cursor, None, round(), BlockPolicy::Outermost);
        assert_eq!(span.text, "[1 2 (3 4) 5]");
    }

    #[test]
    fn innermost_picks_deepest_of_several_levels() {
        let text = "(a (b (c) d) e)";
        let cursor = text.find('c').unwrap();
        let span = locate(text, cursor, None, round(), BlockPolicy::Innermost);
        assert_eq!(span, TextSpan::new("c", 6, 8));

        let cursor = text.find('d').unwrap();
        let span = locate(text, cursor, None, round(), BlockPolicy::Innermost);
        assert_eq!(span.text, "b (c) d");
    }

    #[test]
    fn selection_wins_over_line_when_no_block() {
        let text = "1 2 +\n3 4 *";
        let span = locate(text, 1, Some(6..9), round(), BlockPolicy::Outermost);
        assert_eq!(span, TextSpan::new("3 4", 6, 9));

        let span = locate(text, 1, Some(4..4), round(), BlockPolicy::Outermost);
        assert_eq!(span, TextSpan::new("1 2 +", 0, 5));
    }

    #[test]
    fn block_wins_over_selection() {
        let text = "(1 2 +)";
        let span = locate(text, 2, Some(1..3), round(), BlockPolicy::Outermost);
        assert_eq!(span.text, "1 2 +");
    }

    #[test]
    fn missing_pair_falls_back_to_line() {
        let text = "  (1 2 +)  ";
        let span = locate(text, 4, None, None, BlockPolicy::Outermost);
        assert_eq!(span, TextSpan::new("(1 2 +)", 2, 9));
    }

    #[test]
    fn empty_document_yields_empty_line() {
        let span = locate("", 0, None, round(), BlockPolicy::Innermost);
        assert_eq!(span, TextSpan::new("", 0, 0));
    }

    #[test]
    fn policy_resolution_falls_back() {
        assert_eq!(BlockPolicy::resolve("Innermost").0, BlockPolicy::Innermost);
        let (policy, err) = BlockPolicy::resolve("widest");
        assert_eq!(policy, BlockPolicy::Outermost);
        assert_eq!(err, Some(PolicyError("widest".into())));
    }
}
