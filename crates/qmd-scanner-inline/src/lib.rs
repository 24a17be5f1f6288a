//! # qmd-scanner-inline
//!
//! External scanner for QMD's inline layer: emphasis/strong-emphasis runs,
//! code and latex spans, strikeout/sub/superscript, smart quotes, inline
//! citations, shortcodes (and their escaped `{{{<...>}}}` form), the
//! `key=value` argument lexer used inside shortcodes, and HTML comments.
//!
//! Unlike the block scanner, this one carries no stack — just a handful of
//! depth/length counters in [`ScannerState`]. See [`scan::scan`] for the
//! dispatch and
//! `original_source/crates/tree-sitter-qmd/tree-sitter-markdown-inline/src/scanner.c`
//! for the C scanner this is ported from.

mod scan;
mod state;
mod token;

pub use scan::scan;
pub use state::{ScannerState, SERIALIZED_LEN};
pub use token::TokenKind;
