use qmd_scanner_core::{Lexer, ScanOutcome, ValidSymbols};

use crate::token::{Style, TokenKind};

/// Lex one `$keyword` / `${keyword}` form, starting at a `$`.
///
/// Unlike the other two scanners, the doctemplate scanner never consults
/// `valid_symbols`: the grammar only invokes it in positions where any of
/// the twelve keywords would be structurally valid, so the scanner just
/// tries to match one and declines if nothing fits. The parameter is kept
/// for interface symmetry with the other scanners.
pub fn scan(lexer: &mut impl Lexer, _valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if lexer.lookahead() != '$' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);

    let style = if lexer.lookahead() == '{' {
        lexer.advance(false);
        Style::Braced
    } else {
        Style::Bare
    };

    skip_horizontal_whitespace(lexer);

    if lexer.lookahead() == 'f' {
        return if consume_literal(lexer, "for") {
            emit(lexer, TokenKind::for_loop(style))
        } else {
            ScanOutcome::Decline
        };
    }

    if lexer.lookahead() == 'e' {
        lexer.advance(false);

        if lexer.lookahead() == 'l' {
            if !consume_literal(lexer, "lse") {
                return ScanOutcome::Decline;
            }
            return if lexer.lookahead() == 'i' {
                if consume_literal(lexer, "if") {
                    emit(lexer, TokenKind::elseif_branch(style))
                } else {
                    ScanOutcome::Decline
                }
            } else {
                emit(lexer, TokenKind::else_branch(style))
            };
        }

        if lexer.lookahead() == 'n' {
            if !consume_literal(lexer, "nd") {
                return ScanOutcome::Decline;
            }
            if lexer.lookahead() == 'i' {
                return if consume_literal(lexer, "if") {
                    emit(lexer, TokenKind::endif(style))
                } else {
                    ScanOutcome::Decline
                };
            }
            if lexer.lookahead() == 'f' {
                return if consume_literal(lexer, "for") {
                    emit(lexer, TokenKind::endfor(style))
                } else {
                    ScanOutcome::Decline
                };
            }
        }

        return ScanOutcome::Decline;
    }

    if lexer.lookahead() == 'i' {
        return if consume_literal(lexer, "if") {
            emit(lexer, TokenKind::if_branch(style))
        } else {
            ScanOutcome::Decline
        };
    }

    ScanOutcome::Decline
}

fn skip_horizontal_whitespace(lexer: &mut impl Lexer) {
    while matches!(lexer.lookahead(), ' ' | '\t') {
        lexer.advance(false);
    }
}

/// Consume `literal` one character at a time, stopping (and reporting
/// failure) at the first mismatch. Matches the original scanner's
/// `LEX_STRING` macro, which is itself a sequence of `LEX_CHARACTER` calls.
fn consume_literal(lexer: &mut impl Lexer, literal: &str) -> bool {
    for expected in literal.chars() {
        if lexer.lookahead() != expected {
            return false;
        }
        lexer.advance(false);
    }
    true
}

/// A keyword only matches up to a word boundary: `$foreach` must not be
/// mistaken for `$for` followed by more identifier characters.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn emit(lexer: &mut impl Lexer, token: TokenKind) -> ScanOutcome<TokenKind> {
    if is_word_char(lexer.lookahead()) {
        return ScanOutcome::Decline;
    }
    lexer.mark_end();
    ScanOutcome::Emit(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmd_scanner_core::StrLexer;
    use rstest::rstest;

    fn scan_all_valid(input: &str) -> ScanOutcome<TokenKind> {
        let mut lexer = StrLexer::new(input);
        let flags = [true; TokenKind::COUNT];
        scan(&mut lexer, ValidSymbols::new(&flags))
    }

    #[rstest]
    #[case("$for", TokenKind::KeywordFor1)]
    #[case("${for}", TokenKind::KeywordFor2)]
    #[case("$endfor", TokenKind::KeywordEndfor1)]
    #[case("${endfor}", TokenKind::KeywordEndfor2)]
    #[case("$if", TokenKind::KeywordIf1)]
    #[case("${if}", TokenKind::KeywordIf2)]
    #[case("$else", TokenKind::KeywordElse1)]
    #[case("${else}", TokenKind::KeywordElse2)]
    #[case("$elseif", TokenKind::KeywordElseif1)]
    #[case("${elseif}", TokenKind::KeywordElseif2)]
    #[case("$endif", TokenKind::KeywordEndif1)]
    #[case("${endif}", TokenKind::KeywordEndif2)]
    fn recognizes_every_keyword_and_style(#[case] input: &str, #[case] expected: TokenKind) {
        assert_eq!(scan_all_valid(input), ScanOutcome::Emit(expected));
    }

    #[test]
    fn skips_whitespace_between_brace_and_keyword() {
        assert_eq!(
            scan_all_valid("$ \t for"),
            ScanOutcome::Emit(TokenKind::KeywordFor1)
        );
    }

    #[test]
    fn declines_without_leading_dollar() {
        assert_eq!(scan_all_valid("for"), ScanOutcome::Decline);
    }

    #[test]
    fn declines_on_unknown_keyword() {
        assert_eq!(scan_all_valid("$foreach"), ScanOutcome::Decline);
    }

    #[test]
    fn declines_on_partial_else_keyword() {
        assert_eq!(scan_all_valid("$elsewhere"), ScanOutcome::Decline);
    }

    #[test]
    fn emit_marks_end_past_the_keyword() {
        let mut lexer = StrLexer::new("$for x");
        let flags = [true; TokenKind::COUNT];
        let outcome = scan(&mut lexer, ValidSymbols::new(&flags));
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::KeywordFor1));
        assert_eq!(lexer.consumed(), "$for");
    }
}
