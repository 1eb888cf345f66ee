//! Main module for sapf text tooling

pub mod brackets;
pub mod catalog;
pub mod formatting;
pub mod locating;
pub mod text;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use brackets::{BracketKind, BracketPair};
pub use catalog::{Catalog, Category, FunctionEntry, KeywordIndex};
pub use formatting::{format_source, FormatOptions};
pub use locating::{locate, BlockPolicy};
pub use text::{Position, SourceLocation, TextSpan};
