/// External tokens (and external-token-shaped context signals) for the
/// markdown-inline scanner.
///
/// Variant order is the wire token id and mirrors
/// `original_source/crates/tree-sitter-qmd/tree-sitter-markdown-inline/src/scanner.c`
/// exactly — the comment there ("NB THESE NEED TO MATCH THE EXTERNS IN
/// GRAMMAR.JS") applies here too.
///
/// Two variants are never emitted: [`TokenKind::LastTokenWhitespace`] and
/// [`TokenKind::LastTokenPunctuation`] exist purely so the grammar can tell
/// the scanner, via the valid-symbol mask, whether the previous token was
/// whitespace or punctuation — information an external scanner has no other
/// way to recover. Treat `valid_symbols.is_valid(ordinal)` for these two as
/// read-only context, never as something to report back in `result_symbol`.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Error,
    TriggerError,
    CodeSpanStart,
    CodeSpanClose,
    EmphasisOpenStar,
    EmphasisOpenUnderscore,
    EmphasisCloseStar,
    EmphasisCloseUnderscore,
    /// Context signal only — see the type-level docs.
    LastTokenWhitespace,
    /// Context signal only — see the type-level docs.
    LastTokenPunctuation,
    StrikeoutOpen,
    StrikeoutClose,
    LatexSpanStart,
    LatexSpanClose,
    SingleQuoteOpen,
    SingleQuoteClose,
    DoubleQuoteOpen,
    DoubleQuoteClose,
    SuperscriptOpen,
    SuperscriptClose,
    SubscriptOpen,
    SubscriptClose,
    CiteAuthorInTextWithOpenBracket,
    CiteSuppressAuthorWithOpenBracket,
    CiteAuthorInText,
    CiteSuppressAuthor,
    ShortcodeOpenEscaped,
    ShortcodeCloseEscaped,
    ShortcodeOpen,
    ShortcodeClose,
    KeyNameAndEquals,
    UnclosedSpan,
    StrongEmphasisOpenStar,
    StrongEmphasisCloseStar,
    StrongEmphasisOpenUnderscore,
    StrongEmphasisCloseUnderscore,
    HtmlComment,
}

impl TokenKind {
    /// Number of distinct entries in this scanner's external-token
    /// alphabet, including the two context-only signals.
    pub const COUNT: usize = 37;

    /// The wire ordinal for this token.
    pub fn ordinal(self) -> usize {
        self as usize
    }
}
