//! Quote- and depth-aware lexical scanners
//!
//! Foundation of the conditioning engine. Every extractor and rewrite rule
//! is built on these primitives instead of whole-string regex matching, so a
//! delimiter inside a quoted table label or a nested call can never be
//! mistaken for structure.
//!
//! Failure semantics: every scanner returns an explicit sentinel (`None`,
//! empty result) instead of an error. Callers treat absence of a match as
//! "leave the input unchanged"; malformed upstream text flows through the
//! pipeline untouched rather than aborting it.

mod balance;
mod call;
mod split;
mod state;

pub use balance::{extract_brace_block, find_matching_paren, strip_outer_parens};
pub use call::{extract_call_args, parse_top_level_call};
pub use split::{clause_at, split_top_level, split_top_level_comma};
pub use state::ScanState;
