//! Shared fixtures for sapf tooling tests
//!
//! [`SAMPLE_HELP`] mirrors the shape of the REPL's `helpall` output: a preamble with the
//! argument automapping legend, the listing marker, and banners (one of them repeated).
//! It covers every entry rule of the help parser.

use super::catalog::{parse_help, Catalog, KeywordIndex};

pub const SAMPLE_HELP: &str = r"sapf version 0.1.21
Argument Automapping legend:
   a - as is. argument is not automapped.
   z - argument is expected to be a signal or scalar, streams are auto mapped.
   k - argument is expected to be a scalar, signals and streams are automapped.

BUILT IN FUNCTIONS

*** stack manipulation ***
 clear ( ... --> ) removes all items from the stack.
 dup (a --> a a) duplicate the top item.
 swap (a b --> b a) swap the top two items.

*** math ***
 + @zz (a b --> c) adds two numbers.
      .+ (a b --> c) adds two numbers, operator variant.
 neg @z (a --> b) negative.
 pi (--> pi)
 e - the constant e.
 sinosc @kk (freq phase --> out) sine wave oscillator.
   Argument automapping applies to freq and phase.

*** stack manipulation ***
 over (a b --> a b a) copy the second item to the top.
 dup (a --> a a) duplicate the top item.
";

/// A small sapf program with nested brackets of every kind
pub const SAMPLE_SOURCE: &str = "; a detuned pair of oscillators
{
    [300 301] 0 sinosc .3 *
    (0 1 2) neg
}
";

pub fn sample_catalog() -> Catalog {
    parse_help(SAMPLE_HELP)
}

pub fn sample_index() -> KeywordIndex {
    KeywordIndex::from_catalog(&sample_catalog())
}
