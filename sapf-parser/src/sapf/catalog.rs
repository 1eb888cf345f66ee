//! The function catalog
//!
//!     The sapf REPL documents its built-in words in a help dump. This module turns that dump
//!     into a [`Catalog`]: categories in the order the REPL printed them, each holding its
//!     [`FunctionEntry`] values in order. A [`KeywordIndex`] flattens a catalog for
//!     case-insensitive lookups from completion and hover.
//!
//!     Submodules:
//!
//!         description  The shared `@tag (sig) text` splitting rule
//!         help         The help dump parser (SEEKING / LISTING state machine)
//!         index        The lower-cased lookup view
//!         file         The JSON catalog file format
//!
//!     Entries are values. Once built they are never changed; merging catalogs only adds
//!     entries and categories that are not there yet, so merging a catalog with itself is a
//!     no-op.

pub mod description;
pub mod file;
pub mod help;
pub mod index;

pub use description::{split_description, SplitDescription};
pub use file::CatalogFileError;
pub use help::{parse_help, LISTING_MARKER};
pub use index::KeywordIndex;

use serde::Serialize;

/// One documented sapf word
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionEntry {
    /// Name exactly as the REPL prints it
    pub name: String,
    /// `(inputs --> outputs)` notation, parentheses included
    pub signature: Option<String>,
    /// Argument mapping tag without the leading `@`
    pub special: Option<String>,
    pub description: String,
    pub category: String,
}

impl FunctionEntry {
    /// Build an entry from a raw `@tag (sig) text` description.
    pub fn from_raw(
        name: impl Into<String>,
        raw_description: &str,
        category: impl Into<String>,
    ) -> Self {
        let SplitDescription {
            special,
            signature,
            description,
        } = split_description(raw_description);
        Self {
            name: name.into(),
            signature,
            special,
            description,
            category: category.into(),
        }
    }

    /// The `@tag (sig) text` composite stored in catalog files.
    pub fn raw_description(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(tag) = self.detail() {
            parts.push(tag);
        }
        if !self.description.is_empty() {
            parts.push(self.description.clone());
        }
        parts.join(" ")
    }

    /// `@tag (sig)`, or whichever half is present.
    pub fn detail(&self) -> Option<String> {
        match (&self.special, &self.signature) {
            (Some(tag), Some(signature)) => Some(format!("@{tag} {signature}")),
            (Some(tag), None) => Some(format!("@{tag}")),
            (None, Some(signature)) => Some(signature.clone()),
            (None, None) => None,
        }
    }

    /// Key used by [`KeywordIndex`]
    pub fn lookup_key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// A named group of entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    entries: Vec<FunctionEntry>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[FunctionEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&FunctionEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Add `entry` unless an entry of the same name is already present. The first
    /// occurrence wins; returns whether the entry was added.
    fn insert(&mut self, entry: FunctionEntry) -> bool {
        if self.get(&entry.name).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no category holds any entry
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|category| category.entries.is_empty())
    }

    /// Number of entries over all categories
    pub fn len(&self) -> usize {
        self.categories.iter().map(|category| category.entries.len()).sum()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    /// Open `name`, creating it at the end if it does not exist yet.
    pub fn open_category(&mut self, name: &str) -> &mut Category {
        let position = match self.categories.iter().position(|c| c.name == name) {
            Some(position) => position,
            None => {
                self.categories.push(Category::new(name));
                self.categories.len() - 1
            }
        };
        &mut self.categories[position]
    }

    /// Add `entry` to its category. Returns false when the category already had an entry
    /// with that name.
    pub fn insert(&mut self, entry: FunctionEntry) -> bool {
        let category = entry.category.clone();
        self.open_category(&category).insert(entry)
    }

    /// Union `other` into `self`, keeping the existing entry on name clashes.
    pub fn merge(&mut self, other: Catalog) {
        for category in other.categories {
            let target = self.open_category(&category.name);
            for entry in category.entries {
                target.insert(entry);
            }
        }
    }

    /// All entries, category by category
    pub fn entries(&self) -> impl Iterator<Item = &FunctionEntry> {
        self.categories
            .iter()
            .flat_map(|category| category.entries.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, raw: &str, category: &str) -> FunctionEntry {
        FunctionEntry::from_raw(name, raw, category)
    }

    #[test]
    fn raw_description_round_trips() {
        for raw in [
            "@k (a b --> c) does X",
            "(a --> b) plain desc",
            "just text",
            "@z lonely tag",
            "(--> pi)",
            "",
        ] {
            let built = entry("w", raw, "c");
            assert_eq!(built.raw_description(), raw);
            assert_eq!(entry("w", &built.raw_description(), "c"), built);
        }
    }

    #[test]
    fn detail_combines_tag_and_signature() {
        assert_eq!(
            entry("+", "@zz (a b --> c) adds", "math").detail().as_deref(),
            Some("@zz (a b --> c)")
        );
        assert_eq!(entry("e", "the constant e", "math").detail(), None);
    }

    #[test]
    fn insert_keeps_first_entry_of_a_name() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(entry("dup", "(a --> a a) first", "stack")));
        assert!(!catalog.insert(entry("dup", "(a --> a a) second", "stack")));
        assert!(catalog.insert(entry("dup", "(a --> a a) elsewhere", "other")));

        assert_eq!(catalog.len(), 2);
        let stack = catalog.category("stack").unwrap();
        assert_eq!(stack.entries()[0].description, "first");
    }

    #[test]
    fn merge_unions_categories_in_order() {
        let mut left = Catalog::new();
        left.insert(entry("a", "one", "first"));
        left.insert(entry("b", "two", "second"));

        let mut right = Catalog::new();
        right.insert(entry("c", "three", "second"));
        right.insert(entry("a", "one again", "first"));
        right.insert(entry("d", "four", "third"));

        left.merge(right);

        let names: Vec<_> = left.categories().iter().map(Category::name).collect();
        assert_eq!(names, ["first", "second", "third"]);
        let words: Vec<_> = left.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(words, ["a", "b", "c", "d"]);
        assert_eq!(left.category("first").unwrap().entries()[0].description, "one");
    }

    #[test]
    fn merge_with_itself_is_a_no_op() {
        let mut catalog = Catalog::new();
        catalog.insert(entry("a", "(x --> y) one", "first"));
        catalog.insert(entry("b", "two", "second"));
        let copy = catalog.clone();
        catalog.merge(copy.clone());
        assert_eq!(catalog, copy);
    }

    #[test]
    fn empty_categories_count_as_empty() {
        let mut catalog = Catalog::new();
        catalog.open_category("nothing yet");
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
    }
}
