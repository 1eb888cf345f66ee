//! Help dump parser
//!
//!     Turns the text printed by the sapf `helpall` command into a [`Catalog`].
//!
//! Input Shape
//!
//!     Arbitrary preamble, a marker line, then category banners each followed by one line
//!     per word:
//!
//!         BUILT IN FUNCTIONS
//!
//!         *** math ***
//!          + @zz (a b --> c) adds two numbers.
//!               .+ (a b --> c) operator variant.
//!          pi (--> pi)
//!          e - the constant e.
//!
//! States
//!
//!     SEEKING drops every line until the marker. LISTING reads banners and entry lines.
//!     A banner that was already seen reopens its category and entries already listed there
//!     are not added twice, so a dump that repeats a banner loses and duplicates nothing.
//!
//! Entry Rules
//!
//!     A line inside a category is tried against these rules in order; the first match
//!     wins and anything matching none is skipped:
//!
//!         0. argument auto-mapping note      skipped
//!         a. name [@tag] (sig) text          indented less than 6 columns
//!         b. name [@tag] (sig) text          indented 6+ columns (operator variants)
//!         c. name [@tag] (sig)               no text
//!         d. name - text                     no signature
//!
//!     The text after the name goes through the shared
//!     [`split_description`](super::description::split_description) rule.
//!
//!     The parser never fails. Text without the marker parses to an empty catalog.

use super::description::{split_description, SplitDescription};
use super::{Catalog, FunctionEntry};

/// Line that starts the function listing
pub const LISTING_MARKER: &str = "BUILT IN FUNCTIONS";

/// Indentation from which an entry line counts as an operator variant
pub const VARIANT_INDENT: usize = 6;

const BANNER_FENCE: &str = "***";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Seeking,
    Listing,
}

/// Which entry rule matched a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRule {
    Primary,
    OperatorVariant,
    SignatureOnly,
    DashDescription,
}

/// Classification of a single line seen in LISTING state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpLine<'a> {
    Blank,
    Banner(&'a str),
    AutoMappingNote,
    Entry {
        rule: EntryRule,
        name: &'a str,
        parts: SplitDescription,
    },
    Unrecognized,
}

/// What follows the name on a function line
struct EntryLine<'a> {
    indent: usize,
    rest: &'a str,
}

type RuleFn = fn(&EntryLine<'_>) -> Option<SplitDescription>;

const ENTRY_RULES: &[(EntryRule, RuleFn)] = &[
    (EntryRule::Primary, primary),
    (EntryRule::OperatorVariant, operator_variant),
    (EntryRule::SignatureOnly, signature_only),
    (EntryRule::DashDescription, dash_description),
];

/// Parse a full help dump.
pub fn parse_help(raw: &str) -> Catalog {
    let mut parser = HelpParser::new();
    for line in raw.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Line-at-a-time parser, for callers that stream the REPL output.
#[derive(Debug)]
pub struct HelpParser {
    state: ParserState,
    category: Option<String>,
    catalog: Catalog,
    skipped: usize,
}

impl HelpParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Seeking,
            category: None,
            catalog: Catalog::new(),
            skipped: 0,
        }
    }

    /// True once the listing marker has been seen
    pub fn found_listing(&self) -> bool {
        self.state == ParserState::Listing
    }

    pub fn feed(&mut self, line: &str) {
        match self.state {
            ParserState::Seeking => {
                if line.trim() == LISTING_MARKER {
                    self.state = ParserState::Listing;
                }
            }
            ParserState::Listing => self.feed_listing(line),
        }
    }

    fn feed_listing(&mut self, line: &str) {
        match classify_line(line) {
            HelpLine::Blank => {}
            HelpLine::Banner(name) => {
                self.catalog.open_category(name);
                self.category = Some(name.to_string());
            }
            HelpLine::Entry { name, parts, .. } => {
                let Some(category) = &self.category else {
                    log::trace!("entry before any category: {line:?}");
                    self.skipped += 1;
                    return;
                };
                self.catalog.insert(FunctionEntry {
                    name: name.to_string(),
                    signature: parts.signature,
                    special: parts.special,
                    description: parts.description,
                    category: category.clone(),
                });
            }
            HelpLine::AutoMappingNote | HelpLine::Unrecognized => {
                log::trace!("skipping help line: {line:?}");
                self.skipped += 1;
            }
        }
    }

    pub fn finish(self) -> Catalog {
        if self.found_listing() {
            log::debug!(
                "parsed {} entries in {} categories, skipped {} lines",
                self.catalog.len(),
                self.catalog.categories().len(),
                self.skipped
            );
        } else {
            log::debug!("help text has no '{LISTING_MARKER}' line");
        }
        self.catalog
    }
}

impl Default for HelpParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify one line of the listing section.
pub fn classify_line(line: &str) -> HelpLine<'_> {
    let body = line.trim();
    if body.is_empty() {
        return HelpLine::Blank;
    }
    if let Some(name) = banner_name(body) {
        return HelpLine::Banner(name);
    }
    if is_auto_mapping_note(body) {
        return HelpLine::AutoMappingNote;
    }

    let indent = line.len() - line.trim_start().len();
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => (body, ""),
    };
    let entry = EntryLine { indent, rest };

    ENTRY_RULES
        .iter()
        .find_map(|(rule, matcher)| {
            matcher(&entry).map(|parts| HelpLine::Entry {
                rule: *rule,
                name,
                parts,
            })
        })
        .unwrap_or(HelpLine::Unrecognized)
}

fn banner_name(body: &str) -> Option<&str> {
    let inner = body
        .strip_prefix(BANNER_FENCE)?
        .strip_suffix(BANNER_FENCE)?
        .trim();
    (!inner.is_empty()).then_some(inner)
}

fn is_auto_mapping_note(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.starts_with("argument")
        && ["automapping", "auto-mapping", "auto mapping"]
            .iter()
            .any(|needle| lower.contains(needle))
}

fn signed(entry: &EntryLine<'_>) -> Option<SplitDescription> {
    let parts = split_description(entry.rest);
    parts.signature.is_some().then_some(parts)
}

fn primary(entry: &EntryLine<'_>) -> Option<SplitDescription> {
    if entry.indent >= VARIANT_INDENT {
        return None;
    }
    signed(entry).filter(|parts| !parts.description.is_empty())
}

fn operator_variant(entry: &EntryLine<'_>) -> Option<SplitDescription> {
    if entry.indent < VARIANT_INDENT {
        return None;
    }
    signed(entry).filter(|parts| !parts.description.is_empty())
}

fn signature_only(entry: &EntryLine<'_>) -> Option<SplitDescription> {
    signed(entry).filter(|parts| parts.description.is_empty())
}

fn dash_description(entry: &EntryLine<'_>) -> Option<SplitDescription> {
    let text = entry.rest.strip_prefix('-')?;
    if !(text.is_empty() || text.starts_with(char::is_whitespace)) {
        return None;
    }
    Some(SplitDescription {
        special: None,
        signature: None,
        description: text.trim().to_string(),
    })
}
