/// External tokens produced by the doctemplate scanner.
///
/// The doctemplate mini-language recognizes six reserved words, each in two
/// bracket styles (`$for` vs `${for}`). The variant order is the wire token
/// id and must match the grammar's `externals` array exactly — see
/// `original_source/crates/tree-sitter-doctemplate/grammar/src/scanner.c`.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    KeywordFor1,
    KeywordFor2,
    KeywordEndfor1,
    KeywordEndfor2,
    KeywordIf1,
    KeywordIf2,
    KeywordElse1,
    KeywordElse2,
    KeywordElseif1,
    KeywordElseif2,
    KeywordEndif1,
    KeywordEndif2,
}

impl TokenKind {
    /// Number of distinct external tokens this scanner can emit.
    pub const COUNT: usize = 12;

    /// The wire ordinal for this token, i.e. its position in the grammar's
    /// `externals` array.
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Which bracket style a `$keyword` / `${keyword}` form used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// `$keyword`
    Bare,
    /// `${keyword}`
    Braced,
}

impl TokenKind {
    pub(crate) fn for_loop(style: Style) -> Self {
        match style {
            Style::Bare => Self::KeywordFor1,
            Style::Braced => Self::KeywordFor2,
        }
    }

    pub(crate) fn endfor(style: Style) -> Self {
        match style {
            Style::Bare => Self::KeywordEndfor1,
            Style::Braced => Self::KeywordEndfor2,
        }
    }

    pub(crate) fn if_branch(style: Style) -> Self {
        match style {
            Style::Bare => Self::KeywordIf1,
            Style::Braced => Self::KeywordIf2,
        }
    }

    pub(crate) fn else_branch(style: Style) -> Self {
        match style {
            Style::Bare => Self::KeywordElse1,
            Style::Braced => Self::KeywordElse2,
        }
    }

    pub(crate) fn elseif_branch(style: Style) -> Self {
        match style {
            Style::Bare => Self::KeywordElseif1,
            Style::Braced => Self::KeywordElseif2,
        }
    }

    pub(crate) fn endif(style: Style) -> Self {
        match style {
            Style::Bare => Self::KeywordEndif1,
            Style::Braced => Self::KeywordEndif2,
        }
    }
}
