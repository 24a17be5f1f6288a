use qmd_scanner_core::{Lexer, ScanOutcome, ValidSymbols};

use crate::state::ScannerState;
use crate::token::TokenKind;

fn is_lookahead_line_end(lexer: &impl Lexer) -> bool {
    matches!(lexer.lookahead(), '\n' | '\r') || lexer.eof()
}

fn is_lookahead_whitespace(lexer: &impl Lexer) -> bool {
    matches!(lexer.lookahead(), ' ' | '\t') || is_lookahead_line_end(lexer)
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn emit(lexer: &mut impl Lexer, token: TokenKind) -> ScanOutcome<TokenKind> {
    lexer.mark_end();
    ScanOutcome::Emit(token)
}

/// Shared close/open logic for backtick code spans and dollar latex spans.
///
/// Counts a run of `delimiter`. If it matches the currently-open run length
/// and a close is acceptable, closes it. Otherwise, if opening is
/// acceptable, scans ahead (without committing lexer position until a
/// decision is made) for a matching run of the same length; opens on
/// success, reports `UNCLOSED_SPAN` if the grammar will accept that instead,
/// or declines.
fn parse_leaf_delimiter(
    lexer: &mut impl Lexer,
    delimiter_length: &mut u8,
    inside_flag: &mut u8,
    valid_symbols: ValidSymbols<'_>,
    delimiter: char,
    open_token: TokenKind,
    close_token: TokenKind,
) -> ScanOutcome<TokenKind> {
    let mut level: u8 = 0;
    while lexer.lookahead() == delimiter {
        lexer.advance(false);
        level = level.saturating_add(1);
    }
    lexer.mark_end();

    if level == *delimiter_length && valid_symbols.is_valid(close_token.ordinal()) {
        *delimiter_length = 0;
        *inside_flag = 0;
        return ScanOutcome::Emit(close_token);
    }

    if valid_symbols.is_valid(open_token.ordinal()) {
        let mut close_level: usize = 0;
        while !lexer.eof() {
            if lexer.lookahead() == delimiter {
                close_level += 1;
            } else {
                if close_level == level as usize {
                    break;
                }
                close_level = 0;
            }
            lexer.advance(false);
        }
        if close_level == level as usize {
            *delimiter_length = level;
            *inside_flag = 1;
            // Note: mark_end deliberately not re-called here; the original
            // scanner emits the open token ending right after the opening
            // run, not after the lookahead scan, so the earlier mark_end
            // (taken before the lookahead loop) is the one that counts.
            return ScanOutcome::Emit(open_token);
        }
        if valid_symbols.is_valid(TokenKind::UnclosedSpan.ordinal()) {
            return ScanOutcome::Emit(TokenKind::UnclosedSpan);
        }
    }
    ScanOutcome::Decline
}

fn parse_backtick(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    parse_leaf_delimiter(
        lexer,
        &mut state.code_span_delimiter_length,
        &mut state.inside_code_span,
        valid_symbols,
        '`',
        TokenKind::CodeSpanStart,
        TokenKind::CodeSpanClose,
    )
}

fn parse_dollar(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    parse_leaf_delimiter(
        lexer,
        &mut state.latex_span_delimiter_length,
        &mut state.inside_latex_span,
        valid_symbols,
        '$',
        TokenKind::LatexSpanStart,
        TokenKind::LatexSpanClose,
    )
}

fn parse_single_quote(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    lexer.mark_end();
    if valid_symbols.is_valid(TokenKind::SingleQuoteClose.ordinal()) {
        state.inside_single_quote = 0;
        return ScanOutcome::Emit(TokenKind::SingleQuoteClose);
    }
    if valid_symbols.is_valid(TokenKind::SingleQuoteOpen.ordinal()) && !is_lookahead_whitespace(lexer) {
        state.inside_single_quote = 1;
        return ScanOutcome::Emit(TokenKind::SingleQuoteOpen);
    }
    ScanOutcome::Decline
}

fn parse_double_quote(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    lexer.mark_end();
    if valid_symbols.is_valid(TokenKind::DoubleQuoteClose.ordinal()) {
        state.inside_double_quote = 0;
        return ScanOutcome::Emit(TokenKind::DoubleQuoteClose);
    }
    if valid_symbols.is_valid(TokenKind::DoubleQuoteOpen.ordinal()) {
        state.inside_double_quote = 1;
        return ScanOutcome::Emit(TokenKind::DoubleQuoteOpen);
    }
    ScanOutcome::Decline
}

fn parse_caret(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    lexer.mark_end();
    if lexer.lookahead() == '[' {
        // `^[` is a footnote start, not superscript; let that token win.
        return ScanOutcome::Decline;
    }
    if valid_symbols.is_valid(TokenKind::SuperscriptClose.ordinal()) {
        state.inside_superscript = 0;
        return ScanOutcome::Emit(TokenKind::SuperscriptClose);
    }
    if valid_symbols.is_valid(TokenKind::SuperscriptOpen.ordinal()) {
        state.inside_superscript = 1;
        return ScanOutcome::Emit(TokenKind::SuperscriptOpen);
    }
    ScanOutcome::Decline
}

fn parse_strikeout(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    lexer.mark_end();
    if valid_symbols.is_valid(TokenKind::StrikeoutClose.ordinal()) {
        state.inside_strikeout = 0;
        return ScanOutcome::Emit(TokenKind::StrikeoutClose);
    }
    if valid_symbols.is_valid(TokenKind::StrikeoutOpen.ordinal()) {
        state.inside_strikeout = 1;
        return ScanOutcome::Emit(TokenKind::StrikeoutOpen);
    }
    ScanOutcome::Decline
}

fn parse_tilde(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    if lexer.lookahead() == '~' {
        return parse_strikeout(state, lexer, valid_symbols);
    }
    lexer.mark_end();
    if valid_symbols.is_valid(TokenKind::SubscriptClose.ordinal()) {
        state.inside_subscript = 0;
        return ScanOutcome::Emit(TokenKind::SubscriptClose);
    }
    if valid_symbols.is_valid(TokenKind::SubscriptOpen.ordinal()) {
        state.inside_subscript = 1;
        return ScanOutcome::Emit(TokenKind::SubscriptOpen);
    }
    ScanOutcome::Decline
}

fn parse_star(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    if lexer.lookahead() == '*' {
        lexer.advance(false);
        if valid_symbols.is_valid(TokenKind::StrongEmphasisCloseStar.ordinal()) {
            return emit(lexer, TokenKind::StrongEmphasisCloseStar);
        }
        if valid_symbols.is_valid(TokenKind::StrongEmphasisOpenStar.ordinal()) {
            return emit(lexer, TokenKind::StrongEmphasisOpenStar);
        }
        return ScanOutcome::Decline;
    }
    if valid_symbols.is_valid(TokenKind::EmphasisCloseStar.ordinal()) {
        return emit(lexer, TokenKind::EmphasisCloseStar);
    }
    if valid_symbols.is_valid(TokenKind::EmphasisOpenStar.ordinal()) {
        return emit(lexer, TokenKind::EmphasisOpenStar);
    }
    ScanOutcome::Decline
}

fn parse_underscore(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    if lexer.lookahead() == '_' {
        lexer.advance(false);
        if valid_symbols.is_valid(TokenKind::StrongEmphasisCloseUnderscore.ordinal()) {
            return emit(lexer, TokenKind::StrongEmphasisCloseUnderscore);
        }
        if valid_symbols.is_valid(TokenKind::StrongEmphasisOpenUnderscore.ordinal()) {
            return emit(lexer, TokenKind::StrongEmphasisOpenUnderscore);
        }
        return ScanOutcome::Decline;
    }
    if valid_symbols.is_valid(TokenKind::EmphasisCloseUnderscore.ordinal()) {
        return emit(lexer, TokenKind::EmphasisCloseUnderscore);
    }
    if valid_symbols.is_valid(TokenKind::EmphasisOpenUnderscore.ordinal()) {
        return emit(lexer, TokenKind::EmphasisOpenUnderscore);
    }
    ScanOutcome::Decline
}

fn parse_cite_author_in_text(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    if lexer.lookahead() == '{' && valid_symbols.is_valid(TokenKind::CiteAuthorInTextWithOpenBracket.ordinal()) {
        lexer.advance(false);
        return emit(lexer, TokenKind::CiteAuthorInTextWithOpenBracket);
    }
    if valid_symbols.is_valid(TokenKind::CiteAuthorInText.ordinal()) {
        return emit(lexer, TokenKind::CiteAuthorInText);
    }
    ScanOutcome::Decline
}

fn parse_cite_suppress_author(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    if lexer.lookahead() != '@' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if lexer.lookahead() == '{' && valid_symbols.is_valid(TokenKind::CiteSuppressAuthorWithOpenBracket.ordinal()) {
        lexer.advance(false);
        return emit(lexer, TokenKind::CiteSuppressAuthorWithOpenBracket);
    }
    if valid_symbols.is_valid(TokenKind::CiteSuppressAuthor.ordinal()) {
        return emit(lexer, TokenKind::CiteSuppressAuthor);
    }
    ScanOutcome::Decline
}

fn parse_shortcode_open(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    if lexer.lookahead() != '{' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if lexer.lookahead() == '<' && valid_symbols.is_valid(TokenKind::ShortcodeOpen.ordinal()) {
        lexer.advance(false);
        state.inside_shortcode += 1;
        return emit(lexer, TokenKind::ShortcodeOpen);
    }
    if lexer.lookahead() == '{' {
        lexer.advance(false);
        if lexer.lookahead() == '<' && valid_symbols.is_valid(TokenKind::ShortcodeOpenEscaped.ordinal()) {
            lexer.advance(false);
            state.inside_shortcode += 1;
            return emit(lexer, TokenKind::ShortcodeOpenEscaped);
        }
    }
    ScanOutcome::Decline
}

fn parse_shortcode_close(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    if lexer.lookahead() != '}' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if lexer.lookahead() != '}' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if lexer.lookahead() == '}' && valid_symbols.is_valid(TokenKind::ShortcodeCloseEscaped.ordinal()) {
        lexer.advance(false);
        state.inside_shortcode = state.inside_shortcode.saturating_sub(1);
        return emit(lexer, TokenKind::ShortcodeCloseEscaped);
    }
    if valid_symbols.is_valid(TokenKind::ShortcodeClose.ordinal()) {
        state.inside_shortcode = state.inside_shortcode.saturating_sub(1);
        return emit(lexer, TokenKind::ShortcodeClose);
    }
    ScanOutcome::Decline
}

/// `identifier [whitespace] =`, only attempted when the grammar offers it.
/// Resolves the ambiguity between a shortcode's positional and keyword
/// arguments.
fn parse_key_name_and_equals(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if !valid_symbols.is_valid(TokenKind::KeyNameAndEquals.ordinal()) {
        return ScanOutcome::Decline;
    }
    if !is_identifier_start(lexer.lookahead()) {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    while is_identifier_char(lexer.lookahead()) {
        lexer.advance(false);
    }
    while matches!(lexer.lookahead(), ' ' | '\t') {
        lexer.advance(false);
    }
    if lexer.lookahead() != '=' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    emit(lexer, TokenKind::KeyNameAndEquals)
}

/// Consumes `<!-- ... -->` atomically, including any markdown syntax
/// inside, and ignoring all normal delimiters until the closing `-->`.
fn parse_html_comment(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if !valid_symbols.is_valid(TokenKind::HtmlComment.ordinal()) {
        return ScanOutcome::Decline;
    }
    if lexer.lookahead() != '<' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    for expected in ['!', '-', '-'] {
        if lexer.lookahead() != expected {
            return ScanOutcome::Decline;
        }
        lexer.advance(false);
    }

    while !lexer.eof() {
        if lexer.lookahead() == '-' {
            lexer.advance(false);
            if lexer.lookahead() == '-' {
                lexer.advance(false);
                if lexer.lookahead() == '>' {
                    lexer.advance(false);
                    return emit(lexer, TokenKind::HtmlComment);
                }
            }
        } else {
            lexer.advance(false);
        }
    }
    // Unclosed comment: consumed to EOF, still reported as one token.
    emit(lexer, TokenKind::HtmlComment)
}

/// Entry point: lex one inline external token, or decline.
pub fn scan(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if valid_symbols.is_valid(TokenKind::TriggerError.ordinal()) {
        return ScanOutcome::Emit(TokenKind::Error);
    }

    match lexer.lookahead() {
        '<' => return parse_html_comment(lexer, valid_symbols),
        '{' => return parse_shortcode_open(state, lexer, valid_symbols),
        '>' => return parse_shortcode_close(state, lexer, valid_symbols),
        '@' => return parse_cite_author_in_text(lexer, valid_symbols),
        '-' => return parse_cite_suppress_author(lexer, valid_symbols),
        '^' => return parse_caret(state, lexer, valid_symbols),
        '`' => return parse_backtick(state, lexer, valid_symbols),
        '$' => return parse_dollar(state, lexer, valid_symbols),
        '*' => return parse_star(lexer, valid_symbols),
        '_' => return parse_underscore(lexer, valid_symbols),
        '~' => return parse_tilde(state, lexer, valid_symbols),
        _ => {}
    }

    // Single/double quotes are only prose "smart quotes" outside shortcodes;
    // inside a shortcode they're deferred to the grammar as string-literal
    // delimiters (parsed there, not here).
    if state.inside_shortcode == 0
        && (valid_symbols.is_valid(TokenKind::LastTokenWhitespace.ordinal()) || state.inside_single_quote > 0)
        && lexer.lookahead() == '\''
    {
        return parse_single_quote(state, lexer, valid_symbols);
    }
    if state.inside_shortcode == 0
        && (valid_symbols.is_valid(TokenKind::LastTokenWhitespace.ordinal()) || state.inside_double_quote > 0)
        && lexer.lookahead() == '"'
    {
        return parse_double_quote(state, lexer, valid_symbols);
    }

    if state.inside_shortcode > 0 && is_identifier_start(lexer.lookahead()) {
        return parse_key_name_and_equals(lexer, valid_symbols);
    }

    ScanOutcome::Decline
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmd_scanner_core::StrLexer;
    use rstest::rstest;

    fn all_valid() -> [bool; TokenKind::COUNT] {
        [true; TokenKind::COUNT]
    }

    fn scan_with(input: &str, valid: &[bool]) -> (ScanOutcome<TokenKind>, usize) {
        let mut state = ScannerState::new();
        let mut lexer = StrLexer::new(input);
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(valid));
        (outcome, lexer.end_position())
    }

    #[test]
    fn trigger_error_short_circuits_everything() {
        let mut valid = all_valid();
        valid[TokenKind::TriggerError.ordinal()] = true;
        let (outcome, _) = scan_with("*", &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::Error));
    }

    #[rstest]
    #[case("*", TokenKind::EmphasisOpenStar)]
    #[case("_", TokenKind::EmphasisOpenUnderscore)]
    fn single_delimiter_opens_emphasis(#[case] input: &str, #[case] expected: TokenKind) {
        let valid = all_valid();
        let (outcome, consumed) = scan_with(input, &valid);
        assert_eq!(outcome, ScanOutcome::Emit(expected));
        assert_eq!(consumed, 1);
    }

    #[test]
    fn double_star_opens_strong_emphasis() {
        let valid = all_valid();
        let (outcome, consumed) = scan_with("**", &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::StrongEmphasisOpenStar));
        assert_eq!(consumed, 2);
    }

    #[test]
    fn backtick_run_opens_code_span_when_closer_exists() {
        let valid = all_valid();
        let mut state = ScannerState::new();
        let mut lexer = StrLexer::new("``code``");
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(&valid));
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::CodeSpanStart));
        assert_eq!(state.code_span_delimiter_length, 2);
        assert_eq!(state.inside_code_span, 1);
    }

    #[test]
    fn backtick_run_closes_when_length_matches_open() {
        let valid = all_valid();
        let mut state = ScannerState {
            code_span_delimiter_length: 1,
            inside_code_span: 1,
            ..ScannerState::new()
        };
        let mut lexer = StrLexer::new("`");
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(&valid));
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::CodeSpanClose));
        assert_eq!(state.code_span_delimiter_length, 0);
        assert_eq!(state.inside_code_span, 0);
    }

    #[test]
    fn unclosed_backtick_run_reports_unclosed_span_when_offered() {
        let valid = all_valid();
        let mut state = ScannerState::new();
        let mut lexer = StrLexer::new("`no closer here");
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(&valid));
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::UnclosedSpan));
    }

    #[test]
    fn caret_declines_in_favor_of_footnote_bracket() {
        let valid = all_valid();
        let (outcome, _) = scan_with("^[note]", &valid);
        assert_eq!(outcome, ScanOutcome::Decline);
    }

    #[test]
    fn double_tilde_is_strikeout_not_subscript() {
        let valid = all_valid();
        let (outcome, consumed) = scan_with("~~", &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::StrikeoutOpen));
        assert_eq!(consumed, 2);
    }

    #[test]
    fn single_tilde_is_subscript() {
        let valid = all_valid();
        let (outcome, _) = scan_with("~2", &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::SubscriptOpen));
    }

    #[test]
    fn shortcode_open_and_close_track_depth() {
        let valid = all_valid();
        let mut state = ScannerState::new();
        let mut lexer = StrLexer::new("{{<");
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(&valid));
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::ShortcodeOpen));
        assert_eq!(state.inside_shortcode, 1);

        let mut lexer = StrLexer::new(">}}");
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(&valid));
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::ShortcodeClose));
        assert_eq!(state.inside_shortcode, 0);
    }

    #[test]
    fn escaped_shortcode_delimiters_are_distinct_tokens() {
        let valid = all_valid();
        let mut state = ScannerState::new();
        let mut lexer = StrLexer::new("{{{<");
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(&valid));
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::ShortcodeOpenEscaped));
    }

    #[test]
    fn key_name_and_equals_inside_shortcode() {
        let valid = all_valid();
        let mut state = ScannerState {
            inside_shortcode: 1,
            ..ScannerState::new()
        };
        let mut lexer = StrLexer::new("bar=1");
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(&valid));
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::KeyNameAndEquals));
        assert_eq!(lexer.consumed(), "bar=");
    }

    #[test]
    fn quotes_are_deferred_to_grammar_inside_shortcode() {
        let valid = all_valid();
        let mut state = ScannerState {
            inside_shortcode: 1,
            ..ScannerState::new()
        };
        let mut lexer = StrLexer::new("'literal'");
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(&valid));
        assert_eq!(outcome, ScanOutcome::Decline);
    }

    #[test]
    fn single_quote_prefers_close_over_open() {
        let mut valid = all_valid();
        let mut state = ScannerState {
            inside_single_quote: 1,
            ..ScannerState::new()
        };
        valid[TokenKind::LastTokenWhitespace.ordinal()] = false;
        let mut lexer = StrLexer::new("'");
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(&valid));
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::SingleQuoteClose));
    }

    #[test]
    fn single_quote_opens_only_after_whitespace_and_not_before_whitespace() {
        let valid = all_valid();
        let mut state = ScannerState::new();
        let mut lexer = StrLexer::new("'word'");
        let outcome = scan(&mut state, &mut lexer, ValidSymbols::new(&valid));
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::SingleQuoteOpen));
    }

    #[test]
    fn cite_author_in_text_with_open_bracket() {
        let valid = all_valid();
        let (outcome, _) = scan_with("@foo{", &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::CiteAuthorInTextWithOpenBracket));
    }

    #[test]
    fn cite_suppress_author_requires_at_sign() {
        let valid = all_valid();
        let (outcome, _) = scan_with("@foo", &valid);
        assert_eq!(outcome, ScanOutcome::Decline);
    }

    #[test]
    fn cite_suppress_author_minus_at() {
        let valid = all_valid();
        let (outcome, _) = scan_with("-@foo", &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::CiteSuppressAuthor));
    }

    #[test]
    fn html_comment_consumes_to_closer_atomically() {
        let valid = all_valid();
        let (outcome, consumed) = scan_with("<!-- - not a list -->", &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::HtmlComment));
        assert_eq!(consumed, "<!-- - not a list -->".len());
    }

    #[test]
    fn html_comment_unclosed_consumes_to_eof() {
        let valid = all_valid();
        let (outcome, consumed) = scan_with("<!-- unterminated", &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::HtmlComment));
        assert_eq!(consumed, "<!-- unterminated".len());
    }

    #[test]
    fn lookahead_that_is_not_bang_declines_html_comment() {
        let valid = all_valid();
        let (outcome, _) = scan_with("<a href=\"x\">", &valid);
        assert_eq!(outcome, ScanOutcome::Decline);
    }
}
