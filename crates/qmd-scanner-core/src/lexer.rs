//! The lexer handle interface every scanner is driven through.
//!
//! A real tree-sitter host hands scanners a `TSLexer*`: a C struct with
//! function pointers for `advance`/`mark_end`/`eof` and a `lookahead` field
//! read directly. [`Lexer`] is the safe Rust shape of that same contract;
//! `qmd-scanner-ffi` adapts the raw struct to it, and [`StrLexer`] gives unit
//! tests a lexer without any FFI involved.

/// The peek/advance/mark-end/eof interface a scanner consumes.
///
/// Implementations must guarantee:
///
/// - `lookahead` reflects the character at the current position without
///   consuming it; it keeps returning `'\0'` once [`eof`](Lexer::eof) is
///   true, rather than panicking or wrapping.
/// - `advance` moves exactly one character forward (UTF-8 codepoint, not
///   byte). The `skip` parameter marks the consumed character as outside
///   any token's text (used by scanners that skip leading whitespace before
///   committing to a token shape); implementations that don't distinguish
///   "skipped" from "consumed" text may ignore it.
/// - `mark_end` commits the current position as the end of the token the
///   scanner is about to emit. Calling it more than once just moves the
///   commit point; not calling it before emitting a token is a scanner bug.
pub trait Lexer {
    /// The codepoint at the current position, or `'\0'` at end of input.
    fn lookahead(&self) -> char;

    /// Consume the current codepoint and move to the next one.
    fn advance(&mut self, skip: bool);

    /// Commit the current position as the end of the token being produced.
    fn mark_end(&mut self);

    /// Whether the lexer has reached the end of input.
    fn eof(&self) -> bool;
}

/// A [`Lexer`] over an in-memory `&str`, for unit tests.
///
/// Tracks the live cursor (`pos`) and, once [`mark_end`](Lexer::mark_end)
/// has been called at least once, a committed token boundary (`mark`). This
/// mirrors the real `TSLexer` contract: a scanner that never calls
/// `mark_end` still produces a token whose end is wherever the cursor ended
/// up, not an empty span — `mark_end` only matters when a scanner needs to
/// keep looking ahead *past* the token it's about to emit (e.g. scanning
/// forward for a matching close delimiter before committing to an open).
#[derive(Debug, Clone)]
pub struct StrLexer<'a> {
    input: &'a str,
    pos: usize,
    mark: Option<usize>,
}

impl<'a> StrLexer<'a> {
    /// Start a new lexer at the beginning of `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            mark: None,
        }
    }

    /// The text consumed by the token as it would be emitted right now:
    /// up to the last committed [`mark_end`](Lexer::mark_end) call, or up
    /// to the live cursor if `mark_end` was never called.
    pub fn consumed(&self) -> &'a str {
        &self.input[..self.end_position()]
    }

    /// The text not yet looked at, starting from the live cursor.
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Byte offset of the live cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Byte offset the token would end at if emitted right now.
    pub fn end_position(&self) -> usize {
        self.mark.unwrap_or(self.pos)
    }

    /// Reset the live cursor back to the committed boundary (or the start,
    /// if `mark_end` was never called), as a generated parser does when it
    /// backtracks after a decline.
    pub fn rewind_to_mark(&mut self) {
        self.pos = self.mark.unwrap_or(0);
    }
}

impl<'a> Lexer for StrLexer<'a> {
    fn lookahead(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self, _skip: bool) {
        if let Some(c) = self.input[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
    }

    fn mark_end(&mut self) {
        self.mark = Some(self.pos);
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookahead_and_advance_walk_codepoints() {
        let mut lexer = StrLexer::new("a\u{00e9}b");
        assert_eq!(lexer.lookahead(), 'a');
        lexer.advance(false);
        assert_eq!(lexer.lookahead(), '\u{00e9}');
        lexer.advance(false);
        assert_eq!(lexer.lookahead(), 'b');
    }

    #[test]
    fn eof_reports_null_lookahead() {
        let mut lexer = StrLexer::new("x");
        assert!(!lexer.eof());
        lexer.advance(false);
        assert!(lexer.eof());
        assert_eq!(lexer.lookahead(), '\0');
    }

    #[test]
    fn mark_end_commits_token_boundary() {
        let mut lexer = StrLexer::new("abc");
        lexer.advance(false);
        lexer.advance(false);
        lexer.mark_end();
        assert_eq!(lexer.consumed(), "ab");
        assert_eq!(lexer.remaining(), "c");
    }

    #[test]
    fn rewind_to_mark_undoes_unmarked_progress() {
        let mut lexer = StrLexer::new("abc");
        lexer.advance(false);
        lexer.mark_end();
        lexer.advance(false);
        assert_eq!(lexer.lookahead(), 'c');
        lexer.rewind_to_mark();
        assert_eq!(lexer.lookahead(), 'b');
    }

    #[test]
    fn unmarked_end_defaults_to_the_live_cursor() {
        let mut lexer = StrLexer::new("abc");
        lexer.advance(false);
        lexer.advance(false);
        assert_eq!(lexer.consumed(), "ab");
    }
}
