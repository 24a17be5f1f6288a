//! # qmd-scanner-block
//!
//! External scanner for QMD's block structure: the open-block stack (list
//! items, block quotes, fenced code blocks, fenced divs), line-ending
//! classification (hard vs. soft vs. pipe-table), ATX headings, thematic
//! breaks, ordered/unordered/example list markers, document metadata fences,
//! and pipe tables. This is the largest of the three scanners: most of the
//! grammar's structural ambiguity lives here, not in the generated tables.
//!
//! A handful of inline-level tokens (citations, shortcodes, quotes,
//! emphasis, code/latex spans) are re-lexed by this scanner too, scoped to
//! single lines, because the grammar needs them inside pipe table cells
//! where the inline scanner is never invoked. See [`scan::scan`] and
//! `original_source/crates/tree-sitter-qmd/tree-sitter-markdown/src/scanner.c`.

mod block;
mod scan;
mod state;
mod token;

pub use block::{BlockId, is_list_item, list_item_block, list_item_indentation};
pub use scan::scan;
pub use state::ScannerState;
pub use token::TokenKind;
