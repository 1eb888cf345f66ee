//! Catalog file format
//!
//!     A catalog file is a JSON object keyed by category name. Each category holds an
//!     `items` object mapping a function name to its raw `@tag (sig) text` description:
//!
//!         {
//!           "math": {
//!             "items": {
//!               "+": "@zz (a b --> c) adds two numbers."
//!             }
//!           }
//!         }
//!
//!     Descriptions are stored unsplit and go through the shared description rule on load.
//!     Category and item order follow the file, both ways.

use super::{Catalog, Category, FunctionEntry};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogFileError {
    #[error("failed to read catalog file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write catalog file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn to_json(catalog: &Catalog) -> Result<String, CatalogFileError> {
    Ok(serde_json::to_string_pretty(catalog)?)
}

pub fn from_json(json: &str) -> Result<Catalog, CatalogFileError> {
    Ok(serde_json::from_str(json)?)
}

pub fn read(path: impl AsRef<Path>) -> Result<Catalog, CatalogFileError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| CatalogFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    from_json(&json)
}

pub fn write(path: impl AsRef<Path>, catalog: &Catalog) -> Result<(), CatalogFileError> {
    let path = path.as_ref();
    let mut json = to_json(catalog)?;
    json.push('\n');
    fs::write(path, json).map_err(|source| CatalogFileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories().len()))?;
        for category in self.categories() {
            map.serialize_entry(category.name(), &CategoryItems(category))?;
        }
        map.end()
    }
}

struct CategoryItems<'a>(&'a Category);

impl Serialize for CategoryItems<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("Category", 1)?;
        record.serialize_field("items", &RawItemsRef(self.0.entries()))?;
        record.end()
    }
}

struct RawItemsRef<'a>(&'a [FunctionEntry]);

impl Serialize for RawItemsRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(&entry.name, &entry.raw_description())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CatalogVisitor)
    }
}

struct CatalogVisitor;

impl<'de> Visitor<'de> for CatalogVisitor {
    type Value = Catalog;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of categories")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Catalog, A::Error> {
        let mut catalog = Catalog::new();
        while let Some((name, record)) = access.next_entry::<String, CategoryRecord>()? {
            catalog.open_category(&name);
            for (function, raw) in record.items.0 {
                catalog.insert(FunctionEntry::from_raw(function, &raw, name.as_str()));
            }
        }
        Ok(catalog)
    }
}

#[derive(Deserialize)]
struct CategoryRecord {
    #[serde(default)]
    items: RawItems,
}

/// `items` object with its key order kept
#[derive(Default)]
struct RawItems(Vec<(String, String)>);

impl<'de> Deserialize<'de> for RawItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemsVisitor;

        impl<'de> Visitor<'de> for ItemsVisitor {
            type Value = RawItems;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of function descriptions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawItems, A::Error> {
                let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(item) = access.next_entry::<String, String>()? {
                    items.push(item);
                }
                Ok(RawItems(items))
            }
        }

        deserializer.deserialize_map(ItemsVisitor)
    }
}
