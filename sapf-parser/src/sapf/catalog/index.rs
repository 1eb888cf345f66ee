//! Case-insensitive lookup view over a catalog
//!
//!     The index is rebuilt from a whole [`Catalog`] every time the catalog changes. It has
//!     no mutating methods; holders swap in a new index instead of editing the old one.
//!
//!     When two categories define the same lower-cased name, the entry from the category
//!     listed first is kept.

use super::file::{self, CatalogFileError};
use super::{Catalog, FunctionEntry};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordIndex {
    entries: HashMap<String, FunctionEntry>,
}

impl KeywordIndex {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut entries = HashMap::with_capacity(catalog.len());
        for entry in catalog.entries() {
            let key = entry.lookup_key();
            if entries.contains_key(&key) {
                log::debug!(
                    "'{}' in '{}' shadowed by an earlier category",
                    entry.name,
                    entry.category
                );
                continue;
            }
            entries.insert(key, entry.clone());
        }
        Self { entries }
    }

    /// Build from catalog file JSON, splitting every description with the shared rule.
    pub fn from_json(json: &str) -> Result<Self, CatalogFileError> {
        Ok(Self::from_catalog(&file::from_json(json)?))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogFileError> {
        Ok(Self::from_catalog(&file::read(path)?))
    }

    pub fn get(&self, name: &str) -> Option<&FunctionEntry> {
        self.entries.get(&name.to_lowercase())
    }

    /// Entries whose lower-cased name starts with the lower-cased `prefix`, sorted by name.
    pub fn complete(&self, prefix: &str) -> Vec<&FunctionEntry> {
        let prefix = prefix.to_lowercase();
        let mut matches: Vec<_> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, entry)| entry)
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionEntry> {
        self.entries.values()
    }
}

impl From<&Catalog> for KeywordIndex {
    fn from(catalog: &Catalog) -> Self {
        Self::from_catalog(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sapf::testing::{sample_catalog, sample_index};

    #[test]
    fn lookups_ignore_case() {
        let mut catalog = Catalog::new();
        catalog.insert(FunctionEntry::from_raw("SinOsc", "(f --> o) sine", "ugens"));
        let index = KeywordIndex::from_catalog(&catalog);

        assert_eq!(index.get("sinosc").unwrap().name, "SinOsc");
        assert_eq!(index.get("SINOSC").unwrap().name, "SinOsc");
        assert!(index.get("sin").is_none());
    }

    #[test]
    fn first_category_wins_on_clashes() {
        let mut catalog = Catalog::new();
        catalog.insert(FunctionEntry::from_raw("mix", "first", "a"));
        catalog.insert(FunctionEntry::from_raw("MIX", "second", "b"));
        let index = KeywordIndex::from_catalog(&catalog);

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("mix").unwrap().category, "a");
    }

    #[test]
    fn indexes_every_sample_entry() {
        let index = sample_index();
        assert_eq!(index.len(), sample_catalog().len());
        let plus = index.get("+").unwrap();
        assert_eq!(plus.special.as_deref(), Some("zz"));
        assert_eq!(plus.category, "math");
    }

    #[test]
    fn completion_is_sorted_prefix_match() {
        let index = sample_index();
        let names: Vec<_> = index.complete("S").iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["sinosc", "swap"]);
        assert_eq!(index.complete("").len(), index.len());
        assert!(index.complete("zzz").is_empty());
    }

    #[test]
    fn file_and_fresh_parse_build_the_same_index() {
        let catalog = sample_catalog();
        let json = file::to_json(&catalog).unwrap();
        assert_eq!(KeywordIndex::from_json(&json).unwrap(), sample_index());
    }
}
