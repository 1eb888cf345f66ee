//! Language Server Protocol (LSP) implementation for sapf
//!
//!     Editor support for sapf live coding: completion and hover from the function catalog,
//!     bracket-depth formatting, and commands that drive a sapf REPL process.
//!
//! Architecture
//!
//!     LSP Layer (tower-lsp):
//!         - JSON-RPC over stdio, capability negotiation, request routing
//!
//!     Server Layer ([`server`]):
//!         - Implements the LanguageServer trait
//!         - Keeps open documents and the configuration in effect
//!         - Converts LSP positions (UTF-16) to byte offsets and back
//!         - Thin; tests assert the right feature is called with the right input
//!
//!     Session ([`session`], [`repl`], [`generation`]):
//!         - Owns the REPL process and the active keyword index
//!         - The index is swapped whole on regenerate, load and remove
//!
//!     Feature Layer ([`features`]):
//!         - Plain functions over text, byte offsets and a KeywordIndex
//!         - All logic and dense unit tests
//!
//! Commands
//!
//!     sapf.startRepl          start the REPL if it is not running
//!     sapf.evaluateBlock      send the enclosing bracket block (or selection, or line)
//!     sapf.evaluateLine       send the selection or the current line
//!     sapf.stopSound          send the configured stop command to a running REPL
//!     sapf.stopRepl           dispose of the REPL
//!     sapf.regenerateCatalog  rebuild the catalog from the REPL's help output
//!     sapf.loadCatalog        load a catalog file
//!     sapf.removeCatalog      drop the active catalog
//!
//! Usage
//!
//!     $ sapf-lsp
//!     Starts the language server on stdin/stdout. Set RUST_LOG=debug for logs on stderr.

pub mod features;
pub mod generation;
pub mod repl;
pub mod server;
pub mod session;

pub use server::SapfLanguageServer;
