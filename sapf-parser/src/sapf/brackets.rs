//! Bracket pair kinds
//!
//! sapf code uses three bracket kinds: `( )` for grouping, `[ ]` for lists and `{ }` for
//! functions. The block locator works on one configured kind at a time, the formatter
//! counts all of them.
//!
//! Configuration accepts either the kind name (`round`, `square`, `curly`) or the literal
//! two-character pair (`()`, `[]`, `{}`). Anything else is a [`BracketError`]; callers that
//! must not fail use [`BracketPair::resolve`], which falls back to [`BracketPair::DEFAULT`]
//! and hands back the error so it can be shown as a warning.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("unknown bracket pair '{0}', expected one of round, square, curly, (), [], {{}}")]
    UnknownKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BracketKind {
    Round,
    Square,
    Curly,
}

impl BracketKind {
    pub const ALL: [BracketKind; 3] = [BracketKind::Round, BracketKind::Square, BracketKind::Curly];

    pub fn pair(self) -> BracketPair {
        match self {
            BracketKind::Round => BracketPair { open: '(', close: ')' },
            BracketKind::Square => BracketPair { open: '[', close: ']' },
            BracketKind::Curly => BracketPair { open: '{', close: '}' },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BracketKind::Round => "round",
            BracketKind::Square => "square",
            BracketKind::Curly => "curly",
        }
    }
}

impl FromStr for BracketKind {
    type Err = BracketError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        for kind in BracketKind::ALL {
            let pair = kind.pair();
            if trimmed.eq_ignore_ascii_case(kind.name()) || trimmed == pair.as_config_str() {
                return Ok(kind);
            }
        }
        Err(BracketError::UnknownKind(value.to_string()))
    }
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An `(open, close)` character pair. Only constructible from a [`BracketKind`], so the two
/// characters are always distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BracketPair {
    open: char,
    close: char,
}

impl BracketPair {
    pub const DEFAULT: BracketPair = BracketPair { open: '(', close: ')' };

    pub fn open(&self) -> char {
        self.open
    }

    pub fn close(&self) -> char {
        self.close
    }

    /// Parse a configuration value, falling back to the default pair.
    pub fn resolve(value: &str) -> (BracketPair, Option<BracketError>) {
        match value.parse::<BracketKind>() {
            Ok(kind) => (kind.pair(), None),
            Err(err) => {
                log::warn!("{err}; using {}", BracketPair::DEFAULT.as_config_str());
                (BracketPair::DEFAULT, Some(err))
            }
        }
    }

    fn as_config_str(&self) -> String {
        format!("{}{}", self.open, self.close)
    }
}

impl Default for BracketPair {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<BracketKind> for BracketPair {
    fn from(kind: BracketKind) -> Self {
        kind.pair()
    }
}

/// True for any of the three opening brackets
pub fn is_open_bracket(ch: char) -> bool {
    matches!(ch, '(' | '[' | '{')
}

/// True for any of the three closing brackets
pub fn is_close_bracket(ch: char) -> bool {
    matches!(ch, ')' | ']' | '}')
}
