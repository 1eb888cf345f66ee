//! Text selection for the evaluation commands

use sapf_parser::sapf::locating::selection_or_line;
use sapf_parser::sapf::{locate, BlockPolicy, BracketPair, TextSpan};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Enclosing bracket block, else selection, else line
    Block,
    /// Selection, else line
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationSettings {
    /// `None` when the configured pair is unusable; blocks then degrade to lines.
    pub pair: Option<BracketPair>,
    pub policy: BlockPolicy,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            pair: Some(BracketPair::DEFAULT),
            policy: BlockPolicy::default(),
        }
    }
}

pub fn evaluation_span(
    text: &str,
    cursor: usize,
    selection: Option<Range<usize>>,
    mode: EvaluationMode,
    settings: EvaluationSettings,
) -> TextSpan {
    match mode {
        EvaluationMode::Block => locate(text, cursor, selection, settings.pair, settings.policy),
        EvaluationMode::Line => selection_or_line(text, cursor, selection),
    }
}
