//! The description splitting rule
//!
//!     Every catalog description, whether it comes straight from the help dump or from a
//!     catalog file, goes through [`split_description`]. Using one rule for both sources is
//!     what makes an index built from a file identical to one built from a fresh dump.
//!
//! Grammar
//!
//!     description := ws? special? ws? signature? ws? text
//!     special     := '@' [a-z]+
//!     signature   := '(' not-close* '-->' not-close* ')'
//!     text        := anything, trimmed
//!
//!     Both optional parts are tried once, in that order, with no backtracking. A `(` that
//!     does not close into an arrow signature stays part of `text`.

/// Result of splitting a raw description
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitDescription {
    pub special: Option<String>,
    pub signature: Option<String>,
    pub description: String,
}

const ARROW: &str = "-->";

pub fn split_description(raw: &str) -> SplitDescription {
    let mut cursor = Cursor::new(raw);
    cursor.skip_whitespace();
    let special = cursor.special().map(str::to_string);
    cursor.skip_whitespace();
    let signature = cursor.signature().map(str::to_string);

    SplitDescription {
        special,
        signature,
        description: cursor.rest().trim().to_string(),
    }
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn rest(&self) -> &'a str {
        self.rest
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// `@tag`, returning the tag without the `@`
    fn special(&mut self) -> Option<&'a str> {
        let after_at = self.rest.strip_prefix('@')?;
        let len = after_at
            .find(|ch: char| !ch.is_ascii_lowercase())
            .unwrap_or(after_at.len());
        if len == 0 {
            return None;
        }
        let (tag, rest) = after_at.split_at(len);
        self.rest = rest;
        Some(tag)
    }

    /// `( ... --> ... )`, parentheses included
    fn signature(&mut self) -> Option<&'a str> {
        if !self.rest.starts_with('(') {
            return None;
        }
        let close = self.rest.find(')')?;
        if !self.rest[1..close].contains(ARROW) {
            return None;
        }
        let (signature, rest) = self.rest.split_at(close + 1);
        self.rest = rest;
        Some(signature)
    }
}
