//! # sapf-parser
//!
//! Text-level tooling for sapf sources and the sapf REPL.
//!
//! Module Layout
//!
//!     Everything lives under the [`sapf`] module, one submodule per concern:
//!
//!         sapf
//!           ├── text        Positions, spans and byte offset <-> line/column conversion
//!           ├── brackets    Bracket pair kinds and their configuration names
//!           ├── locating    The block locator used by the evaluation commands
//!           ├── formatting  Bracket-depth indentation formatter
//!           └── catalog     Help text parsing, the description rule, the keyword index
//!                           and the catalog file format
//!
//!     None of these keep state between calls. The language server and the CLI own
//!     whatever state they need (the REPL, the active keyword index) and pass text in.
//!
//! Testing
//!
//!     Shared fixtures live in [`sapf::testing`], compiled for this crate's tests and for
//!     downstream crates that enable the `test-support` feature.

pub mod sapf;
