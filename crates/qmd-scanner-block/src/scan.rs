use qmd_scanner_core::{Lexer, ScanOutcome, ValidSymbols};

use crate::block::{
    ANONYMOUS, BLOCK_QUOTE, BlockId, FENCED_CODE_BLOCK, FENCED_DIV, INDENTED_CHUNK, is_list_item,
    list_item_block, list_item_indentation,
};
use crate::state::{
    STATE_CLOSE_BLOCK, STATE_IN_DISPLAY_MATH, STATE_MATCHING, STATE_WAS_SOFT_LINE_BREAK,
    ScannerState,
};
use crate::token::TokenKind;

/// Advance one character, tracking `column` with a tab stop of 4 (see
/// <https://github.github.com/gfm/#tabs>). Returns how much `indentation`
/// grew by, which is 1 for every character except a tab stopping short of
/// the next stop.
fn advance(state: &mut ScannerState, lexer: &mut impl Lexer) -> u8 {
    let size = if lexer.lookahead() == '\t' {
        let s = 4 - state.column;
        state.column = 0;
        s
    } else {
        state.column = (state.column + 1) % 4;
        1
    };
    lexer.advance(false);
    size
}

fn is_punctuation(c: char) -> bool {
    matches!(c, '!'..='/' | ':'..='@' | '['..='`' | '{'..='~')
}

fn error(_lexer: &mut impl Lexer) -> ScanOutcome<TokenKind> {
    ScanOutcome::Emit(TokenKind::Error)
}

/// Consume whatever belongs to `block`'s continuation on the current line
/// (indentation for list items, `>` for block quotes). Returns 1 on a full
/// match, 2 if a line ending was hit before the block's requirement was
/// met (caller should advance past it and restart matching from the first
/// open block), 0 on failure.
fn match_indentation(state: &mut ScannerState, lexer: &mut impl Lexer, required: u8) -> u8 {
    while state.indentation < required {
        if matches!(lexer.lookahead(), ' ' | '\t') {
            state.indentation += advance(state, lexer);
        } else {
            break;
        }
    }
    if state.indentation >= required {
        state.indentation -= required;
        1
    } else if matches!(lexer.lookahead(), '\n' | '\r') {
        state.indentation = 0;
        2
    } else {
        0
    }
}

fn match_block(state: &mut ScannerState, lexer: &mut impl Lexer, block: BlockId) -> u8 {
    if is_list_item(block) {
        return match_indentation(state, lexer, list_item_indentation(block));
    }
    match block {
        INDENTED_CHUNK => match_indentation(state, lexer, 4),
        BLOCK_QUOTE => {
            while matches!(lexer.lookahead(), ' ' | '\t') {
                state.indentation += advance(state, lexer);
            }
            if lexer.lookahead() == '>' {
                advance(state, lexer);
                state.indentation = 0;
                if matches!(lexer.lookahead(), ' ' | '\t') {
                    state.indentation += advance(state, lexer) - 1;
                }
                1
            } else {
                0
            }
        }
        FENCED_DIV | FENCED_CODE_BLOCK | ANONYMOUS => 1,
        _ => 0,
    }
}

/// Bit 0: at least one open block matched something on this line. Bit 1
/// (value 2): no block flatly failed to match yet, so this line might still
/// turn out to be a soft line break rather than a block close.
fn match_line(state: &mut ScannerState, lexer: &mut impl Lexer) -> u8 {
    let mut might_be_soft_break = true;
    let mut partial_success = false;
    while (state.matched as usize) < state.open_blocks.len() {
        if state.matched as usize == state.open_blocks.len() - 1 && state.has_flag(STATE_CLOSE_BLOCK) {
            if !partial_success {
                state.clear_flag(STATE_CLOSE_BLOCK);
            }
            break;
        }
        let block = state.open_blocks[state.matched as usize];
        match match_block(state, lexer, block) {
            0 => {
                if state.has_flag(STATE_WAS_SOFT_LINE_BREAK) {
                    state.clear_flag(STATE_MATCHING);
                }
                return (partial_success as u8) | ((might_be_soft_break as u8) << 1);
            }
            1 => {
                partial_success = true;
                state.matched += 1;
            }
            _ => {
                might_be_soft_break = false;
                advance(state, lexer);
                state.matched = 0;
                partial_success = false;
            }
        }
    }
    (partial_success as u8) | ((might_be_soft_break as u8) << 1)
}

fn parse_fenced_div_marker(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    let mut level: u8 = 0;
    while lexer.lookahead() == ':' {
        advance(state, lexer);
        level += 1;
    }
    lexer.mark_end();
    if level < 3 {
        return ScanOutcome::Decline;
    }
    while !lexer.eof() && matches!(lexer.lookahead(), ' ' | '\t') {
        advance(state, lexer);
    }
    if (lexer.eof() || matches!(lexer.lookahead(), '\n' | '\r'))
        && valid_symbols.is_valid(TokenKind::FencedDivEnd.ordinal())
    {
        return ScanOutcome::Emit(TokenKind::FencedDivEnd);
    }
    if !lexer.eof() && valid_symbols.is_valid(TokenKind::FencedDivStart.ordinal()) {
        if !state.can_push_block() {
            return error(lexer);
        }
        state.push_block(FENCED_DIV);
        return ScanOutcome::Emit(TokenKind::FencedDivStart);
    }
    ScanOutcome::Decline
}

fn parse_fenced_code_block(
    state: &mut ScannerState,
    delimiter: char,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    let mut level: u8 = 0;
    while lexer.lookahead() == delimiter {
        advance(state, lexer);
        level += 1;
    }
    lexer.mark_end();

    if valid_symbols.is_valid(TokenKind::CodeSpanStart.ordinal()) && delimiter == '`' && level < 3 {
        state.code_span_delimiter_length = level;
        return ScanOutcome::Emit(TokenKind::CodeSpanStart);
    }
    if delimiter == '`'
        && valid_symbols.is_valid(TokenKind::FencedCodeBlockEndBacktick.ordinal())
        && state.indentation < 4
        && level >= state.fenced_code_block_delimiter_length
    {
        while matches!(lexer.lookahead(), ' ' | '\t') {
            advance(state, lexer);
        }
        if matches!(lexer.lookahead(), '\n' | '\r') {
            state.fenced_code_block_delimiter_length = 0;
            return ScanOutcome::Emit(TokenKind::FencedCodeBlockEndBacktick);
        }
    }
    if delimiter == '`' && valid_symbols.is_valid(TokenKind::FencedCodeBlockStartBacktick.ordinal()) && level >= 3 {
        let mut info_string_has_backtick = false;
        while !matches!(lexer.lookahead(), '\n' | '\r') && !lexer.eof() {
            if lexer.lookahead() == '`' {
                info_string_has_backtick = true;
                break;
            }
            advance(state, lexer);
        }
        if !info_string_has_backtick {
            if !state.can_push_block() {
                return error(lexer);
            }
            state.push_block(FENCED_CODE_BLOCK);
            state.fenced_code_block_delimiter_length = level;
            state.indentation = 0;
            return ScanOutcome::Emit(TokenKind::FencedCodeBlockStartBacktick);
        }
    }
    ScanOutcome::Decline
}

fn parse_star(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    advance(state, lexer);
    lexer.mark_end();
    let mut star_count: usize = 1;
    let mut extra_indentation: u8 = 0;
    // Emphasis-close takes priority while we're still counting; a list
    // marker can never close emphasis, so this short-circuit is safe.
    if valid_symbols.is_valid(TokenKind::EmphasisCloseStar.ordinal()) {
        return ScanOutcome::Emit(TokenKind::EmphasisCloseStar);
    }
    let mut could_be_close_strong_emphasis = valid_symbols.is_valid(TokenKind::StrongEmphasisCloseStar.ordinal());
    loop {
        if lexer.lookahead() == '*' {
            if star_count == 1 && extra_indentation >= 1 && valid_symbols.is_valid(TokenKind::ListMarkerStar.ordinal()) {
                lexer.mark_end();
            }
            star_count += 1;
            advance(state, lexer);
            if star_count == 2 && could_be_close_strong_emphasis {
                lexer.mark_end();
                return ScanOutcome::Emit(TokenKind::StrongEmphasisCloseStar);
            }
        } else if matches!(lexer.lookahead(), ' ' | '\t') {
            could_be_close_strong_emphasis = false;
            if star_count == 1 {
                extra_indentation += advance(state, lexer);
            } else {
                advance(state, lexer);
            }
        } else {
            break;
        }
    }
    let line_end = matches!(lexer.lookahead(), '\n' | '\r');
    let mut dont_interrupt = false;
    if star_count == 1 && line_end {
        extra_indentation = 1;
        dont_interrupt = state.matched as usize == state.open_blocks.len();
    }
    dont_interrupt = dont_interrupt || state.has_flag(STATE_IN_DISPLAY_MATH);
    let thematic_break = star_count >= 3 && line_end;
    let list_marker_star = star_count >= 1 && extra_indentation >= 1;
    if valid_symbols.is_valid(TokenKind::ThematicBreak.ordinal()) && thematic_break && state.indentation < 4 {
        lexer.mark_end();
        state.indentation = 0;
        return ScanOutcome::Emit(TokenKind::ThematicBreak);
    }
    let list_marker_symbol = if dont_interrupt {
        TokenKind::ListMarkerStarDontInterrupt
    } else {
        TokenKind::ListMarkerStar
    };
    if valid_symbols.is_valid(list_marker_symbol.ordinal()) && list_marker_star {
        if star_count == 1 {
            lexer.mark_end();
        }
        extra_indentation -= 1;
        if extra_indentation <= 3 {
            extra_indentation += state.indentation;
            state.indentation = 0;
        } else {
            std::mem::swap(&mut state.indentation, &mut extra_indentation);
        }
        if !state.can_push_block() {
            return error(lexer);
        }
        state.push_block(list_item_block(extra_indentation));
        return ScanOutcome::Emit(list_marker_symbol);
    }
    if star_count == 1 && valid_symbols.is_valid(TokenKind::EmphasisCloseStar.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::EmphasisCloseStar);
    }
    if star_count == 1 && valid_symbols.is_valid(TokenKind::EmphasisOpenStar.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::EmphasisOpenStar);
    }
    if star_count == 2 && valid_symbols.is_valid(TokenKind::StrongEmphasisCloseStar.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::StrongEmphasisCloseStar);
    }
    if star_count == 2 && valid_symbols.is_valid(TokenKind::StrongEmphasisOpenStar.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::StrongEmphasisOpenStar);
    }
    ScanOutcome::Decline
}

fn parse_thematic_break_underscore(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    advance(state, lexer);
    lexer.mark_end();
    let mut underscore_count: usize = 1;
    loop {
        if lexer.lookahead() == '_' {
            underscore_count += 1;
            advance(state, lexer);
        } else if matches!(lexer.lookahead(), ' ' | '\t') {
            advance(state, lexer);
        } else {
            break;
        }
    }
    let line_end = matches!(lexer.lookahead(), '\n' | '\r');
    if underscore_count >= 3 && line_end && valid_symbols.is_valid(TokenKind::ThematicBreak.ordinal()) {
        lexer.mark_end();
        state.indentation = 0;
        return ScanOutcome::Emit(TokenKind::ThematicBreak);
    }
    if underscore_count == 1 && valid_symbols.is_valid(TokenKind::EmphasisCloseUnderscore.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::EmphasisCloseUnderscore);
    }
    if underscore_count == 1 && valid_symbols.is_valid(TokenKind::EmphasisOpenUnderscore.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::EmphasisOpenUnderscore);
    }
    if underscore_count == 2 && valid_symbols.is_valid(TokenKind::StrongEmphasisCloseUnderscore.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::StrongEmphasisCloseUnderscore);
    }
    if underscore_count == 2 && valid_symbols.is_valid(TokenKind::StrongEmphasisOpenUnderscore.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::StrongEmphasisOpenUnderscore);
    }
    ScanOutcome::Decline
}

fn parse_block_quote(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if valid_symbols.is_valid(TokenKind::BlockQuoteStart.ordinal()) {
        advance(state, lexer);
        state.indentation = 0;
        if matches!(lexer.lookahead(), ' ' | '\t') {
            state.indentation += advance(state, lexer) - 1;
        }
        if !state.can_push_block() {
            return error(lexer);
        }
        state.push_block(BLOCK_QUOTE);
        return ScanOutcome::Emit(TokenKind::BlockQuoteStart);
    }
    ScanOutcome::Decline
}

fn parse_atx_heading(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if valid_symbols.is_valid(TokenKind::AtxH1Marker.ordinal()) && state.indentation <= 3 {
        lexer.mark_end();
        let mut level: u16 = 0;
        while lexer.lookahead() == '#' && level <= 6 {
            advance(state, lexer);
            level += 1;
        }
        if level <= 6 && matches!(lexer.lookahead(), ' ' | '\t' | '\n' | '\r') {
            state.indentation = 0;
            lexer.mark_end();
            return ScanOutcome::Emit(TokenKind::atx_marker(level as u8));
        }
    }
    ScanOutcome::Decline
}

fn parse_plus(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if state.indentation <= 3
        && (valid_symbols.is_valid(TokenKind::ListMarkerPlus.ordinal())
            || valid_symbols.is_valid(TokenKind::ListMarkerPlusDontInterrupt.ordinal())
            || valid_symbols.is_valid(TokenKind::PlusMetadata.ordinal()))
    {
        lexer.mark_end();
        let mut whitespace_after_plus = false;
        let mut plus_after_whitespace = false;
        let mut plus_count: usize = 0;
        let mut extra_indentation: u8 = 0;
        loop {
            if lexer.lookahead() == '+' {
                if plus_count == 1 && extra_indentation >= 1 {
                    lexer.mark_end();
                }
                plus_count += 1;
                advance(state, lexer);
                plus_after_whitespace = whitespace_after_plus;
            } else if matches!(lexer.lookahead(), ' ' | '\t') {
                whitespace_after_plus = true;
                if plus_count == 1 {
                    extra_indentation += advance(state, lexer);
                } else {
                    advance(state, lexer);
                }
            } else {
                break;
            }
        }
        let line_end = matches!(lexer.lookahead(), '\n' | '\r');
        let mut dont_interrupt = false;
        if plus_count == 1 && line_end {
            extra_indentation = 1;
            dont_interrupt = true;
        }
        dont_interrupt = (dont_interrupt && state.matched as usize == state.open_blocks.len()) || state.has_flag(STATE_IN_DISPLAY_MATH);
        let list_marker_plus = plus_count >= 1 && extra_indentation >= 1;
        let symbol = if dont_interrupt {
            TokenKind::ListMarkerPlusDontInterrupt
        } else {
            TokenKind::ListMarkerPlus
        };
        if list_marker_plus && valid_symbols.is_valid(symbol.ordinal()) {
            if plus_count == 1 {
                lexer.mark_end();
            }
            extra_indentation -= 1;
            if extra_indentation <= 3 {
                extra_indentation += state.indentation;
                state.indentation = 0;
            } else {
                std::mem::swap(&mut state.indentation, &mut extra_indentation);
            }
            if !state.can_push_block() {
                return error(lexer);
            }
            state.push_block(list_item_block(extra_indentation));
            return ScanOutcome::Emit(symbol);
        }
        if plus_count == 3 && !plus_after_whitespace && line_end && valid_symbols.is_valid(TokenKind::PlusMetadata.ordinal()) {
            if let ScanOutcome::Emit(token) = scan_metadata_fence('+', state, lexer, TokenKind::PlusMetadata) {
                return ScanOutcome::Emit(token);
            }
        }
    }
    ScanOutcome::Decline
}

fn parse_ordered_list_marker(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    if state.indentation <= 3
        && (valid_symbols.is_valid(TokenKind::ListMarkerParenthesis.ordinal())
            || valid_symbols.is_valid(TokenKind::ListMarkerDot.ordinal())
            || valid_symbols.is_valid(TokenKind::ListMarkerParenthesisDontInterrupt.ordinal())
            || valid_symbols.is_valid(TokenKind::ListMarkerDotDontInterrupt.ordinal()))
    {
        let mut digits: u8 = 1;
        let mut dont_interrupt = lexer.lookahead() != '1';
        advance(state, lexer);
        while lexer.lookahead().is_ascii_digit() {
            dont_interrupt = true;
            digits += 1;
            advance(state, lexer);
        }
        if (1..=9).contains(&digits) {
            let mut dot = false;
            let mut parenthesis = false;
            if lexer.lookahead() == '.' {
                advance(state, lexer);
                dot = true;
            } else if lexer.lookahead() == ')' {
                advance(state, lexer);
                parenthesis = true;
            }
            if dot || parenthesis {
                let mut extra_indentation: u8 = 0;
                while matches!(lexer.lookahead(), ' ' | '\t') {
                    extra_indentation += advance(state, lexer);
                }
                let line_end = matches!(lexer.lookahead(), '\n' | '\r');
                if line_end {
                    extra_indentation = 1;
                    dont_interrupt = true;
                }
                dont_interrupt = (dont_interrupt && state.matched as usize == state.open_blocks.len()) || state.has_flag(STATE_IN_DISPLAY_MATH);
                let valid_symbol = if dot {
                    if dont_interrupt {
                        TokenKind::ListMarkerDotDontInterrupt
                    } else {
                        TokenKind::ListMarkerDot
                    }
                } else if dont_interrupt {
                    TokenKind::ListMarkerParenthesisDontInterrupt
                } else {
                    TokenKind::ListMarkerParenthesis
                };
                if extra_indentation >= 1 && valid_symbols.is_valid(valid_symbol.ordinal()) {
                    extra_indentation -= 1;
                    if extra_indentation <= 3 {
                        extra_indentation += state.indentation;
                        state.indentation = 0;
                    } else {
                        std::mem::swap(&mut state.indentation, &mut extra_indentation);
                    }
                    if !state.can_push_block() {
                        return error(lexer);
                    }
                    state.push_block(list_item_block(extra_indentation + digits));
                    // Upstream always emits the interrupting variant here even
                    // when `valid_symbol` above was the dont-interrupt one —
                    // preserved as-is rather than silently diverging from it.
                    return ScanOutcome::Emit(if dot {
                        TokenKind::ListMarkerDot
                    } else {
                        TokenKind::ListMarkerParenthesis
                    });
                }
            }
        }
    }
    ScanOutcome::Decline
}

fn parse_example_list_marker(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> ScanOutcome<TokenKind> {
    if state.indentation <= 3
        && (valid_symbols.is_valid(TokenKind::ListMarkerExample.ordinal())
            || valid_symbols.is_valid(TokenKind::ListMarkerExampleDontInterrupt.ordinal()))
    {
        if lexer.lookahead() != '(' {
            return ScanOutcome::Decline;
        }
        advance(state, lexer);
        if lexer.lookahead() != '@' {
            return ScanOutcome::Decline;
        }
        advance(state, lexer);
        if lexer.lookahead() != ')' {
            return ScanOutcome::Decline;
        }
        advance(state, lexer);

        let mut extra_indentation: u8 = 0;
        while matches!(lexer.lookahead(), ' ' | '\t') {
            extra_indentation += advance(state, lexer);
        }
        let line_end = matches!(lexer.lookahead(), '\n' | '\r');
        let mut dont_interrupt = false;
        if line_end {
            extra_indentation = 1;
            dont_interrupt = true;
        }
        dont_interrupt = (dont_interrupt && state.matched as usize == state.open_blocks.len()) || state.has_flag(STATE_IN_DISPLAY_MATH);
        let symbol = if dont_interrupt {
            TokenKind::ListMarkerExampleDontInterrupt
        } else {
            TokenKind::ListMarkerExample
        };
        if extra_indentation >= 1 && valid_symbols.is_valid(symbol.ordinal()) {
            extra_indentation -= 1;
            if extra_indentation <= 3 {
                extra_indentation += state.indentation;
                state.indentation = 0;
            } else {
                std::mem::swap(&mut state.indentation, &mut extra_indentation);
            }
            if !state.can_push_block() {
                return error(lexer);
            }
            // `3` is the length of the marker text "(@)".
            state.push_block(list_item_block(extra_indentation + 3));
            return ScanOutcome::Emit(symbol);
        }
    }
    ScanOutcome::Decline
}

/// Shared by minus/plus metadata fences: having just consumed the opening
/// `---`/`+++` line (`delimiter_count == 3`, no interior whitespace, at line
/// end), peek forward for a closing line made of exactly three `delimiter`
/// and nothing else. A blank line immediately after the opening fence, or
/// reaching EOF without finding one, means this wasn't a metadata fence —
/// declines without having emitted anything, leaving the caller to fall
/// back to whatever else a `---`/`+++` line might be.
fn scan_metadata_fence(delimiter: char, state: &mut ScannerState, lexer: &mut impl Lexer, token: TokenKind) -> ScanOutcome<TokenKind> {
    if lexer.lookahead() == '\r' {
        advance(state, lexer);
        if lexer.lookahead() == '\n' {
            advance(state, lexer);
        }
    } else if lexer.lookahead() == '\n' {
        advance(state, lexer);
    }
    if matches!(lexer.lookahead(), '\r' | '\n') {
        return ScanOutcome::Decline;
    }
    let mut first_iteration = true;
    loop {
        if !first_iteration {
            if lexer.lookahead() == '\r' {
                advance(state, lexer);
                if lexer.lookahead() == '\n' {
                    advance(state, lexer);
                }
            } else {
                advance(state, lexer);
            }
        }
        first_iteration = false;
        let mut line_count = 0;
        while lexer.lookahead() == delimiter {
            line_count += 1;
            advance(state, lexer);
        }
        if line_count == 3 {
            while matches!(lexer.lookahead(), ' ' | '\t') {
                advance(state, lexer);
            }
            if matches!(lexer.lookahead(), '\r' | '\n') {
                if lexer.lookahead() == '\r' {
                    advance(state, lexer);
                    if lexer.lookahead() == '\n' {
                        advance(state, lexer);
                    }
                } else {
                    advance(state, lexer);
                }
                lexer.mark_end();
                return ScanOutcome::Emit(token);
            }
        }
        while !matches!(lexer.lookahead(), '\n' | '\r') && !lexer.eof() {
            advance(state, lexer);
        }
        if lexer.eof() {
            return ScanOutcome::Decline;
        }
    }
}

fn parse_cite_suppress_author_at_minus(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if lexer.lookahead() == '@' {
        lexer.advance(false);
        if lexer.lookahead() == '{' && valid_symbols.is_valid(TokenKind::CiteSuppressAuthorWithOpenBracket.ordinal()) {
            lexer.advance(false);
            lexer.mark_end();
            return ScanOutcome::Emit(TokenKind::CiteSuppressAuthorWithOpenBracket);
        } else if valid_symbols.is_valid(TokenKind::CiteSuppressAuthor.ordinal()) {
            lexer.mark_end();
            return ScanOutcome::Emit(TokenKind::CiteSuppressAuthor);
        }
    }
    ScanOutcome::Decline
}

fn parse_minus(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if state.indentation <= 3
        && (valid_symbols.is_valid(TokenKind::ListMarkerMinus.ordinal())
            || valid_symbols.is_valid(TokenKind::ListMarkerMinusDontInterrupt.ordinal())
            || valid_symbols.is_valid(TokenKind::ThematicBreak.ordinal())
            || valid_symbols.is_valid(TokenKind::CiteSuppressAuthorWithOpenBracket.ordinal())
            || valid_symbols.is_valid(TokenKind::MinusMetadata.ordinal())
            || valid_symbols.is_valid(TokenKind::SetextH2Underline.ordinal()))
    {
        lexer.mark_end();
        let mut whitespace_after_minus = false;
        let mut minus_after_whitespace = false;
        let mut minus_count: usize = 0;
        let mut extra_indentation: u8 = 0;

        loop {
            if lexer.lookahead() == '-' {
                if minus_count == 1 && extra_indentation >= 1 {
                    lexer.mark_end();
                }
                minus_count += 1;
                advance(state, lexer);
                minus_after_whitespace = whitespace_after_minus;
            } else if matches!(lexer.lookahead(), ' ' | '\t') {
                if minus_count == 1 {
                    extra_indentation += advance(state, lexer);
                } else {
                    advance(state, lexer);
                }
                whitespace_after_minus = true;
            } else {
                break;
            }
        }
        let line_end = matches!(lexer.lookahead(), '\n' | '\r');
        let mut dont_interrupt = false;
        if minus_count == 1 && line_end {
            extra_indentation = 1;
            dont_interrupt = true;
        }
        dont_interrupt = (dont_interrupt && state.matched as usize == state.open_blocks.len()) || state.has_flag(STATE_IN_DISPLAY_MATH);
        let thematic_break = minus_count >= 3 && line_end;
        let list_marker_minus = minus_count >= 1 && extra_indentation >= 1;
        let setext_h2_underline = minus_count >= 1 && !minus_after_whitespace && line_end;
        let mut maybe_thematic_break = false;
        let list_marker_symbol = if dont_interrupt {
            TokenKind::ListMarkerMinusDontInterrupt
        } else {
            TokenKind::ListMarkerMinus
        };
        if valid_symbols.is_valid(TokenKind::ThematicBreak.ordinal()) && thematic_break {
            maybe_thematic_break = true;
            lexer.mark_end();
            state.indentation = 0;
        } else if valid_symbols.is_valid(list_marker_symbol.ordinal()) && list_marker_minus {
            if minus_count == 1 {
                lexer.mark_end();
            }
            extra_indentation -= 1;
            if extra_indentation <= 3 {
                extra_indentation += state.indentation;
                state.indentation = 0;
            } else {
                std::mem::swap(&mut state.indentation, &mut extra_indentation);
            }
            if !state.can_push_block() {
                return error(lexer);
            }
            state.push_block(list_item_block(extra_indentation));
            return ScanOutcome::Emit(list_marker_symbol);
        }
        if minus_count == 3 && !minus_after_whitespace && line_end && valid_symbols.is_valid(TokenKind::MinusMetadata.ordinal()) {
            if let ScanOutcome::Emit(token) = scan_metadata_fence('-', state, lexer, TokenKind::MinusMetadata) {
                return ScanOutcome::Emit(token);
            }
        } else if minus_count == 1 && valid_symbols.is_valid(TokenKind::CiteSuppressAuthorWithOpenBracket.ordinal()) {
            return parse_cite_suppress_author_at_minus(lexer, valid_symbols);
        }
        if maybe_thematic_break {
            return ScanOutcome::Emit(TokenKind::ThematicBreak);
        }
        if setext_h2_underline && valid_symbols.is_valid(TokenKind::SetextH2Underline.ordinal()) {
            lexer.mark_end();
            state.indentation = 0;
            return ScanOutcome::Emit(TokenKind::SetextH2Underline);
        }
    }
    ScanOutcome::Decline
}

fn parse_pipe_table(state: &mut ScannerState, lexer: &mut impl Lexer, _valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    // PIPE_TABLE_START is zero-width.
    lexer.mark_end();
    let mut cell_count: usize = 0;
    let mut starting_pipe = false;
    let mut ending_pipe = false;
    if lexer.lookahead() == '|' {
        starting_pipe = true;
        advance(state, lexer);
    }
    while !matches!(lexer.lookahead(), '\r' | '\n') && !lexer.eof() {
        if lexer.lookahead() == '|' {
            cell_count += 1;
            ending_pipe = true;
            advance(state, lexer);
        } else {
            if !matches!(lexer.lookahead(), ' ' | '\t') {
                ending_pipe = false;
            }
            if lexer.lookahead() == '\\' {
                advance(state, lexer);
                if is_punctuation(lexer.lookahead()) {
                    advance(state, lexer);
                }
            } else {
                advance(state, lexer);
            }
        }
    }
    if cell_count == 0 && !(starting_pipe && ending_pipe) {
        return ScanOutcome::Decline;
    }
    if !ending_pipe {
        cell_count += 1;
    }

    if lexer.lookahead() == '\n' {
        advance(state, lexer);
    } else if lexer.lookahead() == '\r' {
        advance(state, lexer);
        if lexer.lookahead() == '\n' {
            advance(state, lexer);
        }
    } else {
        return ScanOutcome::Decline;
    }
    state.indentation = 0;
    state.column = 0;
    while matches!(lexer.lookahead(), ' ' | '\t') {
        state.indentation += advance(state, lexer);
    }

    // Check the delimiter row has the same cell count and at least one pipe.
    let mut delimiter_cell_count: usize = 0;
    if lexer.lookahead() == '|' {
        advance(state, lexer);
    }
    loop {
        while matches!(lexer.lookahead(), ' ' | '\t') {
            advance(state, lexer);
        }
        if lexer.lookahead() == '|' {
            delimiter_cell_count += 1;
            advance(state, lexer);
            continue;
        }
        if lexer.lookahead() == ':' {
            advance(state, lexer);
            if lexer.lookahead() != '-' {
                return ScanOutcome::Decline;
            }
        }
        let mut had_one_minus = false;
        while lexer.lookahead() == '-' {
            had_one_minus = true;
            advance(state, lexer);
        }
        if had_one_minus {
            delimiter_cell_count += 1;
        }
        if lexer.lookahead() == ':' {
            if !had_one_minus {
                return ScanOutcome::Decline;
            }
            advance(state, lexer);
        }
        while matches!(lexer.lookahead(), ' ' | '\t') {
            advance(state, lexer);
        }
        if lexer.lookahead() == '|' {
            if !had_one_minus {
                delimiter_cell_count += 1;
            }
            advance(state, lexer);
            continue;
        }
        if !matches!(lexer.lookahead(), '\r' | '\n') {
            return ScanOutcome::Decline;
        } else {
            break;
        }
    }
    if cell_count != delimiter_cell_count {
        return ScanOutcome::Decline;
    }
    ScanOutcome::Emit(TokenKind::PipeTableStart)
}

fn parse_ref_id_specifier(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if lexer.lookahead() != '^' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    // Footnote identifiers may not contain whitespace, '^', '[' or ']'.
    // https://pandoc.org/MANUAL.html#extension-footnotes
    while !matches!(lexer.lookahead(), ' ' | '\t' | '\n' | '^' | '[' | ']') {
        lexer.advance(false);
    }
    if lexer.lookahead() != ']' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if lexer.lookahead() == ':' && valid_symbols.is_valid(TokenKind::RefIdSpecifier.ordinal()) {
        lexer.advance(false);
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::RefIdSpecifier);
    }
    if !valid_symbols.is_valid(TokenKind::InlineNoteReference.ordinal()) {
        return ScanOutcome::Decline;
    }
    lexer.mark_end();
    ScanOutcome::Emit(TokenKind::InlineNoteReference)
}

/// Precondition: lookahead is `^`.
fn parse_fenced_div_note_id(state: &mut ScannerState, lexer: &mut impl Lexer) -> ScanOutcome<TokenKind> {
    advance(state, lexer);
    while !matches!(lexer.lookahead(), ' ' | '\t' | '\n' | '^' | '[' | ']') {
        advance(state, lexer);
    }
    lexer.mark_end();
    ScanOutcome::Emit(TokenKind::FencedDivNoteId)
}

/// Code span delimiters scoped to a single line, for pipe table cells.
fn parse_code_span(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    let mut level: u8 = 0;
    while lexer.lookahead() == '`' {
        lexer.advance(false);
        level += 1;
    }
    lexer.mark_end();

    if level == state.code_span_delimiter_length && valid_symbols.is_valid(TokenKind::CodeSpanClose.ordinal()) {
        state.code_span_delimiter_length = 0;
        return ScanOutcome::Emit(TokenKind::CodeSpanClose);
    }

    if valid_symbols.is_valid(TokenKind::CodeSpanStart.ordinal()) {
        let mut close_level: usize = 0;
        while !lexer.eof() && !matches!(lexer.lookahead(), '\n' | '\r') {
            if lexer.lookahead() == '`' {
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
            state.code_span_delimiter_length = level;
            return ScanOutcome::Emit(TokenKind::CodeSpanStart);
        }
    }
    ScanOutcome::Decline
}

/// Shared tail of `$...$` delimiter matching once the opening run's length
/// is known: close a span of the same length, or scan ahead for one.
fn finish_latex_span(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>, level: u8) -> ScanOutcome<TokenKind> {
    lexer.mark_end();

    if level == state.latex_span_delimiter_length && valid_symbols.is_valid(TokenKind::LatexSpanClose.ordinal()) {
        state.latex_span_delimiter_length = 0;
        return ScanOutcome::Emit(TokenKind::LatexSpanClose);
    }

    if valid_symbols.is_valid(TokenKind::LatexSpanStart.ordinal()) {
        let mut close_level: usize = 0;
        while !lexer.eof() && !matches!(lexer.lookahead(), '\n' | '\r') {
            if lexer.lookahead() == '$' {
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
            state.latex_span_delimiter_length = level;
            return ScanOutcome::Emit(TokenKind::LatexSpanStart);
        }
    }
    ScanOutcome::Decline
}

/// Latex span delimiters scoped to a single line, for pipe table cells.
fn parse_latex_span(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    let mut level: u8 = 0;
    while lexer.lookahead() == '$' {
        lexer.advance(false);
        level += 1;
    }
    finish_latex_span(state, lexer, valid_symbols, level)
}

/// Precondition: lookahead is `$`. `$$` toggles
/// [`STATE_IN_DISPLAY_MATH`] and emits the tracker token; a lone `$` emits
/// the inline companion token when the grammar wants only that and not a
/// latex span; anything else falls back to ordinary latex-span matching via
/// [`finish_latex_span`], sharing the single forward pass so the lexer
/// position is never re-read once advanced past.
fn parse_dollar(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    if lexer.lookahead() != '$' {
        if valid_symbols.is_valid(TokenKind::InlineMathStateTrackMarker.ordinal())
            && !valid_symbols.is_valid(TokenKind::LatexSpanStart.ordinal())
            && !valid_symbols.is_valid(TokenKind::LatexSpanClose.ordinal())
        {
            lexer.mark_end();
            return ScanOutcome::Emit(TokenKind::InlineMathStateTrackMarker);
        }
        return finish_latex_span(state, lexer, valid_symbols, 1);
    }
    if valid_symbols.is_valid(TokenKind::DisplayMathStateTrackMarker.ordinal()) {
        lexer.advance(false);
        lexer.mark_end();
        state.toggle_flag(STATE_IN_DISPLAY_MATH);
        return ScanOutcome::Emit(TokenKind::DisplayMathStateTrackMarker);
    }
    let mut level: u8 = 2;
    lexer.advance(false);
    while lexer.lookahead() == '$' {
        lexer.advance(false);
        level += 1;
    }
    finish_latex_span(state, lexer, valid_symbols, level)
}

/// Consumes `<!-- ... -->` atomically, including anything that would
/// otherwise read as block markers, so a comment can span block boundaries.
/// Precondition: `<` already consumed by [`parse_open_angle_brace`].
fn parse_html_comment(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if !valid_symbols.is_valid(TokenKind::HtmlComment.ordinal()) {
        return ScanOutcome::Decline;
    }
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
                    lexer.mark_end();
                    return ScanOutcome::Emit(TokenKind::HtmlComment);
                }
            }
        } else {
            lexer.advance(false);
        }
    }
    lexer.mark_end();
    ScanOutcome::Emit(TokenKind::HtmlComment)
}

fn parse_open_angle_brace(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if !valid_symbols.is_valid(TokenKind::Autolink.ordinal())
        && !valid_symbols.is_valid(TokenKind::RawSpecifier.ordinal())
        && !valid_symbols.is_valid(TokenKind::HtmlComment.ordinal())
    {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);

    if lexer.lookahead() == '!' {
        return parse_html_comment(lexer, valid_symbols);
    }

    let mut could_be_autolink = lexer.lookahead() != '/';
    let mut had_url_like_character = false;
    while !lexer.eof() {
        if matches!(lexer.lookahead(), ':' | '%') {
            had_url_like_character = true;
        } else if matches!(lexer.lookahead(), ' ' | '\t') {
            could_be_autolink = false;
        } else if valid_symbols.is_valid(TokenKind::RawSpecifier.ordinal()) && lexer.lookahead() == '}' {
            lexer.mark_end();
            return ScanOutcome::Emit(TokenKind::RawSpecifier);
        } else if valid_symbols.is_valid(TokenKind::Autolink.ordinal())
            && could_be_autolink
            && had_url_like_character
            && lexer.lookahead() == '>'
        {
            lexer.advance(false);
            return ScanOutcome::Emit(TokenKind::Autolink);
        } else if lexer.lookahead() == '>' {
            // Never grammar-valid; emitted anyway for a readable parse error.
            lexer.advance(false);
            return ScanOutcome::Emit(TokenKind::HtmlElement);
        }
        lexer.advance(false);
    }
    ScanOutcome::Decline
}

fn parse_raw_specifier(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if !valid_symbols.is_valid(TokenKind::RawSpecifier.ordinal()) {
        return ScanOutcome::Decline;
    }
    if lexer.lookahead() != '=' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    while !lexer.eof() && !matches!(lexer.lookahead(), ' ' | '\t') {
        if lexer.lookahead() == '}' {
            lexer.mark_end();
            return ScanOutcome::Emit(TokenKind::RawSpecifier);
        }
        lexer.advance(false);
    }
    ScanOutcome::Decline
}

fn parse_language_specifier(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if !valid_symbols.is_valid(TokenKind::LanguageSpecifier.ordinal())
        && !valid_symbols.is_valid(TokenKind::KeySpecifier.ordinal())
        && !valid_symbols.is_valid(TokenKind::NakedValueSpecifier.ordinal())
    {
        return ScanOutcome::Decline;
    }
    let naked_allowed = valid_symbols.is_valid(TokenKind::NakedValueSpecifier.ordinal());
    let first = lexer.lookahead();
    if !first.is_ascii_alphabetic() && !(naked_allowed && first.is_ascii_digit()) {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);

    loop {
        let c = lexer.lookahead();
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '%' | '-') {
            lexer.advance(false);
            if lexer.eof() {
                break;
            }
            continue;
        }
        if c == '}' {
            lexer.mark_end();
            return if naked_allowed {
                ScanOutcome::Emit(TokenKind::NakedValueSpecifier)
            } else {
                ScanOutcome::Emit(TokenKind::LanguageSpecifier)
            };
        }
        if c == '=' {
            lexer.mark_end();
            return ScanOutcome::Emit(TokenKind::KeySpecifier);
        }
        if matches!(c, ' ' | '\t') {
            lexer.mark_end();
            while !lexer.eof() && matches!(lexer.lookahead(), ' ' | '\t') {
                lexer.advance(false);
            }
            if lexer.eof() {
                return ScanOutcome::Emit(TokenKind::LanguageSpecifier);
            }
            if lexer.lookahead() == '=' {
                return ScanOutcome::Emit(TokenKind::KeySpecifier);
            }
            if naked_allowed {
                return ScanOutcome::Emit(TokenKind::NakedValueSpecifier);
            }
            return ScanOutcome::Emit(TokenKind::LanguageSpecifier);
        }
        return ScanOutcome::Decline;
    }
    ScanOutcome::Emit(TokenKind::LanguageSpecifier)
}

/// Precondition: `[` already consumed.
fn parse_open_square_brace(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if (valid_symbols.is_valid(TokenKind::RefIdSpecifier.ordinal()) || valid_symbols.is_valid(TokenKind::InlineNoteReference.ordinal()))
        && lexer.lookahead() == '^'
    {
        return parse_ref_id_specifier(lexer, valid_symbols);
    }

    for (marker, symbol) in [
        ('!', TokenKind::HighlightSpanStart),
        ('+', TokenKind::InsertSpanStart),
        ('-', TokenKind::DeleteSpanStart),
        ('>', TokenKind::CommentSpanStart),
    ] {
        if valid_symbols.is_valid(symbol.ordinal()) && lexer.lookahead() == marker {
            lexer.advance(false);
            if lexer.lookahead() != marker {
                return ScanOutcome::Decline;
            }
            lexer.advance(false);
            lexer.mark_end();
            while !lexer.eof() && matches!(lexer.lookahead(), ' ' | '\t') {
                lexer.advance(false);
            }
            return ScanOutcome::Emit(symbol);
        }
    }
    ScanOutcome::Decline
}

fn parse_single_quote(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if lexer.lookahead() != '\'' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    // Prioritize close over open so `'word'` reads as expected.
    if valid_symbols.is_valid(TokenKind::SingleQuoteClose.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::SingleQuoteClose);
    }
    if valid_symbols.is_valid(TokenKind::SingleQuoteOpen.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::SingleQuoteOpen);
    }
    ScanOutcome::Decline
}

fn parse_double_quote(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if lexer.lookahead() != '"' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if valid_symbols.is_valid(TokenKind::DoubleQuoteClose.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::DoubleQuoteClose);
    }
    if valid_symbols.is_valid(TokenKind::DoubleQuoteOpen.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::DoubleQuoteOpen);
    }
    ScanOutcome::Decline
}

fn parse_shortcode_close(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if lexer.lookahead() != '>' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if !valid_symbols.is_valid(TokenKind::ShortcodeClose.ordinal()) && !valid_symbols.is_valid(TokenKind::ShortcodeCloseEscaped.ordinal()) {
        return ScanOutcome::Decline;
    }
    if lexer.eof() || lexer.lookahead() != '}' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if lexer.eof() || lexer.lookahead() != '}' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if !lexer.eof() && lexer.lookahead() == '}' && valid_symbols.is_valid(TokenKind::ShortcodeCloseEscaped.ordinal()) {
        lexer.advance(false);
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::ShortcodeCloseEscaped);
    }
    if !valid_symbols.is_valid(TokenKind::ShortcodeClose.ordinal()) {
        return ScanOutcome::Decline;
    }
    lexer.mark_end();
    ScanOutcome::Emit(TokenKind::ShortcodeClose)
}

fn parse_shortcode_open(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if lexer.lookahead() != '{' {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if (!valid_symbols.is_valid(TokenKind::ShortcodeOpen.ordinal()) && !valid_symbols.is_valid(TokenKind::ShortcodeOpenEscaped.ordinal()))
        || lexer.eof()
        || lexer.lookahead() != '{'
    {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if !lexer.eof() && lexer.lookahead() == '<' && valid_symbols.is_valid(TokenKind::ShortcodeOpen.ordinal()) {
        lexer.advance(false);
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::ShortcodeOpen);
    }
    if lexer.eof() || lexer.lookahead() != '{' || !valid_symbols.is_valid(TokenKind::ShortcodeOpenEscaped.ordinal()) {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    if lexer.eof() || lexer.lookahead() != '<' || !valid_symbols.is_valid(TokenKind::ShortcodeOpen.ordinal()) {
        return ScanOutcome::Decline;
    }
    lexer.advance(false);
    lexer.mark_end();
    ScanOutcome::Emit(TokenKind::ShortcodeOpenEscaped)
}

fn parse_cite_author_in_text(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    if lexer.lookahead() == '{' && valid_symbols.is_valid(TokenKind::CiteAuthorInTextWithOpenBracket.ordinal()) {
        lexer.advance(false);
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::CiteAuthorInTextWithOpenBracket);
    }
    if valid_symbols.is_valid(TokenKind::CiteAuthorInText.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::CiteAuthorInText);
    }
    ScanOutcome::Decline
}

fn parse_tilde(lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    lexer.advance(false);
    if lexer.lookahead() == '~' && valid_symbols.is_valid(TokenKind::StrikeoutClose.ordinal()) {
        lexer.advance(false);
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::StrikeoutClose);
    }
    if lexer.lookahead() == '~' && valid_symbols.is_valid(TokenKind::StrikeoutOpen.ordinal()) {
        lexer.advance(false);
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::StrikeoutOpen);
    }
    if valid_symbols.is_valid(TokenKind::SubscriptClose.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::SubscriptClose);
    }
    if valid_symbols.is_valid(TokenKind::SubscriptOpen.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::SubscriptOpen);
    }
    ScanOutcome::Decline
}

fn parse_caret(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if valid_symbols.is_valid(TokenKind::FencedDivNoteId.ordinal()) {
        return parse_fenced_div_note_id(state, lexer);
    }
    lexer.advance(false);
    if lexer.lookahead() == '[' && valid_symbols.is_valid(TokenKind::InlineNoteStartToken.ordinal()) {
        lexer.advance(false);
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::InlineNoteStartToken);
    }
    if valid_symbols.is_valid(TokenKind::SuperscriptClose.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::SuperscriptClose);
    }
    if valid_symbols.is_valid(TokenKind::SuperscriptOpen.ordinal()) {
        lexer.mark_end();
        return ScanOutcome::Emit(TokenKind::SuperscriptOpen);
    }
    ScanOutcome::Decline
}

/// Entry point: lex one block-structure external token, or decline.
pub fn scan(state: &mut ScannerState, lexer: &mut impl Lexer, valid_symbols: ValidSymbols<'_>) -> ScanOutcome<TokenKind> {
    if valid_symbols.is_valid(TokenKind::TriggerError.ordinal()) {
        return error(lexer);
    }

    if valid_symbols.is_valid(TokenKind::CloseBlock.ordinal()) {
        state.set_flag(STATE_CLOSE_BLOCK);
        return ScanOutcome::Emit(TokenKind::CloseBlock);
    }

    if lexer.eof() {
        if valid_symbols.is_valid(TokenKind::TokenEof.ordinal()) {
            return ScanOutcome::Emit(TokenKind::TokenEof);
        }
        if !state.open_blocks.is_empty() {
            state.pop_block();
            return ScanOutcome::Emit(TokenKind::BlockClose);
        }
        return ScanOutcome::Decline;
    }

    if !state.has_flag(STATE_MATCHING) {
        while matches!(lexer.lookahead(), ' ' | '\t') {
            state.indentation += advance(state, lexer);
        }

        if state.indentation >= 4
            && !lexer.eof()
            && !matches!(lexer.lookahead(), '\n' | '\r')
            && valid_symbols.is_valid(TokenKind::IndentedChunkStart.ordinal())
            && !valid_symbols.is_valid(TokenKind::NoIndentedChunk.ordinal())
        {
            if !state.can_push_block() {
                return error(lexer);
            }
            state.push_block(INDENTED_CHUNK);
            state.indentation -= 4;
            lexer.mark_end();
            return ScanOutcome::Emit(TokenKind::IndentedChunkStart);
        }

        let mut fell_through_to_newline_case = false;
        match lexer.lookahead() {
            '<' => {
                if valid_symbols.is_valid(TokenKind::HtmlComment.ordinal())
                    || valid_symbols.is_valid(TokenKind::Autolink.ordinal())
                    || valid_symbols.is_valid(TokenKind::RawSpecifier.ordinal())
                {
                    return parse_open_angle_brace(lexer, valid_symbols);
                }
                fell_through_to_newline_case = true;
            }
            '\r' | '\n' => fell_through_to_newline_case = true,
            '$' => {
                if valid_symbols.is_valid(TokenKind::DisplayMathStateTrackMarker.ordinal())
                    || valid_symbols.is_valid(TokenKind::InlineMathStateTrackMarker.ordinal())
                    || valid_symbols.is_valid(TokenKind::LatexSpanStart.ordinal())
                    || valid_symbols.is_valid(TokenKind::LatexSpanClose.ordinal())
                {
                    return parse_dollar(state, lexer, valid_symbols);
                }
            }
            ':' => return parse_fenced_div_marker(state, lexer, valid_symbols),
            '`' => {
                if !valid_symbols.is_valid(TokenKind::FencedCodeBlockStartBacktick.ordinal())
                    && (valid_symbols.is_valid(TokenKind::CodeSpanStart.ordinal()) || valid_symbols.is_valid(TokenKind::CodeSpanClose.ordinal()))
                {
                    return parse_code_span(state, lexer, valid_symbols);
                }
                return parse_fenced_code_block(state, '`', lexer, valid_symbols);
            }
            '~' => return parse_tilde(lexer, valid_symbols),
            '*' => return parse_star(state, lexer, valid_symbols),
            '_' => return parse_thematic_break_underscore(state, lexer, valid_symbols),
            '>' => {
                if valid_symbols.is_valid(TokenKind::ShortcodeClose.ordinal()) || valid_symbols.is_valid(TokenKind::ShortcodeCloseEscaped.ordinal()) {
                    return parse_shortcode_close(lexer, valid_symbols);
                }
                return parse_block_quote(state, lexer, valid_symbols);
            }
            '#' => return parse_atx_heading(state, lexer, valid_symbols),
            '=' => {
                if valid_symbols.is_valid(TokenKind::RawSpecifier.ordinal()) {
                    return parse_raw_specifier(lexer, valid_symbols);
                }
            }
            '+' => return parse_plus(state, lexer, valid_symbols),
            '0'..='9' => {
                if !valid_symbols.is_valid(TokenKind::NakedValueSpecifier.ordinal()) {
                    return parse_ordered_list_marker(state, lexer, valid_symbols);
                }
            }
            '-' => return parse_minus(state, lexer, valid_symbols),
            '[' => {
                if valid_symbols.is_valid(TokenKind::HighlightSpanStart.ordinal())
                    || valid_symbols.is_valid(TokenKind::InsertSpanStart.ordinal())
                    || valid_symbols.is_valid(TokenKind::DeleteSpanStart.ordinal())
                    || valid_symbols.is_valid(TokenKind::CommentSpanStart.ordinal())
                    || valid_symbols.is_valid(TokenKind::InlineNoteReference.ordinal())
                    || valid_symbols.is_valid(TokenKind::RefIdSpecifier.ordinal())
                {
                    lexer.advance(false);
                    return parse_open_square_brace(lexer, valid_symbols);
                }
            }
            '^' => {
                if valid_symbols.is_valid(TokenKind::FencedDivNoteId.ordinal())
                    || valid_symbols.is_valid(TokenKind::SuperscriptClose.ordinal())
                    || valid_symbols.is_valid(TokenKind::SuperscriptOpen.ordinal())
                {
                    return parse_caret(state, lexer, valid_symbols);
                }
            }
            '(' => return parse_example_list_marker(state, lexer, valid_symbols),
            '\'' => return parse_single_quote(lexer, valid_symbols),
            '"' => return parse_double_quote(lexer, valid_symbols),
            '{' => {
                if valid_symbols.is_valid(TokenKind::ShortcodeOpen.ordinal()) || valid_symbols.is_valid(TokenKind::ShortcodeOpenEscaped.ordinal()) {
                    return parse_shortcode_open(lexer, valid_symbols);
                }
            }
            '@' => return parse_cite_author_in_text(lexer, valid_symbols),
            _ => {}
        }

        if fell_through_to_newline_case && valid_symbols.is_valid(TokenKind::BlankLineStart.ordinal()) {
            return ScanOutcome::Emit(TokenKind::BlankLineStart);
        }

        if !matches!(lexer.lookahead(), '\r' | '\n') && valid_symbols.is_valid(TokenKind::PipeTableStart.ordinal()) {
            return parse_pipe_table(state, lexer, valid_symbols);
        }
        if (valid_symbols.is_valid(TokenKind::LanguageSpecifier.ordinal())
            || valid_symbols.is_valid(TokenKind::KeySpecifier.ordinal())
            || valid_symbols.is_valid(TokenKind::NakedValueSpecifier.ordinal()))
            && lexer.lookahead().is_ascii_alphabetic()
        {
            return parse_language_specifier(lexer, valid_symbols);
        }
        if valid_symbols.is_valid(TokenKind::NakedValueSpecifier.ordinal()) && lexer.lookahead().is_ascii_digit() {
            return parse_language_specifier(lexer, valid_symbols);
        }
    } else {
        let match_line_return = match_line(state, lexer);
        let partial_success = match_line_return & 1 != 0;

        if partial_success {
            if state.matched as usize == state.open_blocks.len() {
                state.clear_flag(STATE_MATCHING);
            }
            return ScanOutcome::Emit(TokenKind::BlockContinuation);
        }

        if !state.has_flag(STATE_WAS_SOFT_LINE_BREAK) {
            state.pop_block();
            if state.matched as usize == state.open_blocks.len() {
                state.clear_flag(STATE_MATCHING);
            }
            return ScanOutcome::Emit(TokenKind::BlockClose);
        }
    }

    if (valid_symbols.is_valid(TokenKind::LineEnding.ordinal())
        || valid_symbols.is_valid(TokenKind::SoftLineEnding.ordinal())
        || valid_symbols.is_valid(TokenKind::PipeTableLineEnding.ordinal()))
        && matches!(lexer.lookahead(), '\n' | '\r')
    {
        // The line-ending handler below peeks at the *next* line's leading
        // whitespace and re-matches the open-block stack against it purely
        // to decide which line-ending token to emit; none of that is
        // committed unless a branch actually emits. Snapshot now and
        // restore on the one path that reaches the end without emitting,
        // so a declined scan never leaks the peek's mutations into the
        // persisted state.
        let snapshot = state.clone();
        if let Some(outcome) = scan_line_ending(state, lexer, valid_symbols) {
            return outcome;
        }
        *state = snapshot;
    }
    ScanOutcome::Decline
}

/// The line-ending / next-line lookahead portion of `scan`'s `MATCHING`-mode
/// tail (§4.1.13's "lookahead-simulate the next line" step). Returns `None`
/// when no line-ending token applies, in which case the caller restores its
/// pre-call snapshot rather than keeping this function's peek mutations.
fn scan_line_ending(
    state: &mut ScannerState,
    lexer: &mut impl Lexer,
    valid_symbols: ValidSymbols<'_>,
) -> Option<ScanOutcome<TokenKind>> {
    if lexer.lookahead() == '\r' {
        advance(state, lexer);
        if lexer.lookahead() == '\n' {
            advance(state, lexer);
        }
    } else {
        advance(state, lexer);
    }
    state.indentation = 0;
    state.column = 0;
    if !state.has_flag(STATE_CLOSE_BLOCK)
        && (valid_symbols.is_valid(TokenKind::SoftLineEnding.ordinal()) || valid_symbols.is_valid(TokenKind::PipeTableLineEnding.ordinal()))
    {
        lexer.mark_end();
        while matches!(lexer.lookahead(), ' ' | '\t') {
            state.indentation += advance(state, lexer);
        }

        if !matches!(lexer.lookahead(), '\n' | '\r') && valid_symbols.is_valid(TokenKind::PipeTableLineEnding.ordinal()) {
            return Some(ScanOutcome::Emit(TokenKind::PipeTableLineEnding));
        }
        // Upstream's condition here is `lookahead == '\n' || lookahead != '\r'`,
        // which reduces to `lookahead != '\r'`; preserved, including the
        // LINE_ENDING token it emits despite gating on PIPE_TABLE_LINE_ENDING.
        if lexer.lookahead() != '\r' && valid_symbols.is_valid(TokenKind::PipeTableLineEnding.ordinal()) {
            return Some(ScanOutcome::Emit(TokenKind::LineEnding));
        }

        if !matches!(lexer.lookahead(), '*' | '-' | '+' | '>' | ':' | '#' | '`')
            && lexer.lookahead() > ' '
            && !lexer.lookahead().is_ascii_digit()
        {
            state.set_flag(STATE_WAS_SOFT_LINE_BREAK);
            lexer.mark_end();
            return Some(ScanOutcome::Emit(TokenKind::SoftLineEnding));
        }

        state.matched = 0;
        let match_line_return = match_line(state, lexer);
        let might_be_soft_break = match_line_return & 2 != 0;
        let all_will_be_matched = state.matched as usize == state.open_blocks.len();

        if all_will_be_matched && valid_symbols.is_valid(TokenKind::PipeTableLineEnding.ordinal()) {
            return Some(ScanOutcome::Emit(TokenKind::PipeTableLineEnding));
        }
        if valid_symbols.is_valid(TokenKind::SoftLineEnding.ordinal())
            && might_be_soft_break
            && all_will_be_matched
            && !matches!(lexer.lookahead(), '*' | '-' | '+' | '>' | ':' | '#' | '`')
            && lexer.lookahead() > ' '
            && !lexer.lookahead().is_ascii_digit()
        {
            state.indentation = 0;
            state.column = 0;
            state.matched = 0;
            if !state.open_blocks.is_empty() {
                state.set_flag(STATE_MATCHING);
            } else {
                state.clear_flag(STATE_MATCHING);
            }
            state.set_flag(STATE_WAS_SOFT_LINE_BREAK);
            lexer.mark_end();
            return Some(ScanOutcome::Emit(TokenKind::SoftLineEnding));
        }
    }
    if valid_symbols.is_valid(TokenKind::LineEnding.ordinal()) {
        state.indentation = 0;
        state.column = 0;
        state.matched = 0;
        if !state.open_blocks.is_empty() {
            state.set_flag(STATE_MATCHING);
        } else {
            state.clear_flag(STATE_MATCHING);
        }
        state.clear_flag(STATE_WAS_SOFT_LINE_BREAK);
        return Some(ScanOutcome::Emit(TokenKind::LineEnding));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmd_scanner_core::StrLexer;
    use pretty_assertions::assert_eq;

    /// Every ordinary token valid, as a real host would offer. `TriggerError`
    /// is excluded: it's tree-sitter's own error-recovery signal and is never
    /// asserted alongside ordinary tokens, so including it here would make
    /// `scan`'s error short-circuit fire on every call.
    fn all_valid() -> Vec<bool> {
        let mut valid = vec![true; TokenKind::COUNT];
        valid[TokenKind::TriggerError.ordinal()] = false;
        valid
    }

    fn scan_with(input: &str, state: &mut ScannerState, valid: &[bool]) -> ScanOutcome<TokenKind> {
        let mut lexer = StrLexer::new(input);
        scan(state, &mut lexer, ValidSymbols::new(valid))
    }

    #[test]
    fn atx_heading_level_matches_hash_count() {
        let mut state = ScannerState::new();
        let outcome = scan_with("### heading", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::AtxH3Marker));
    }

    #[test]
    fn too_many_hashes_is_not_a_heading() {
        let mut state = ScannerState::new();
        let outcome = scan_with("####### not a heading", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Decline);
    }

    #[test]
    fn three_stars_on_their_own_line_is_a_thematic_break() {
        let mut state = ScannerState::new();
        let outcome = scan_with("***\n", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::ThematicBreak));
    }

    #[test]
    fn star_followed_by_space_and_text_is_a_list_marker() {
        let mut state = ScannerState::new();
        let outcome = scan_with("* item", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::ListMarkerStar));
        assert_eq!(state.open_blocks, vec![list_item_block(1)]);
    }

    #[test]
    fn block_quote_marker_pushes_a_block_quote() {
        let mut state = ScannerState::new();
        let outcome = scan_with("> quoted", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::BlockQuoteStart));
        assert_eq!(state.open_blocks, vec![BLOCK_QUOTE]);
    }

    #[test]
    fn fenced_code_block_start_tracks_delimiter_length() {
        let mut state = ScannerState::new();
        let outcome = scan_with("```rust\n", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::FencedCodeBlockStartBacktick));
        assert_eq!(state.fenced_code_block_delimiter_length, 3);
        assert_eq!(state.open_blocks, vec![FENCED_CODE_BLOCK]);
    }

    #[test]
    fn backtick_run_with_a_backtick_in_the_info_string_is_not_a_fence() {
        let mut state = ScannerState::new();
        let outcome = scan_with("```has`backtick\n", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Decline);
    }

    #[test]
    fn minus_metadata_fence_closes_on_its_own_triple_dash_line() {
        let mut state = ScannerState::new();
        let outcome = scan_with("---\ntitle: x\n---\n", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::MinusMetadata));
    }

    #[test]
    fn minus_metadata_declines_when_followed_by_a_blank_line() {
        let mut state = ScannerState::new();
        let outcome = scan_with("---\n\nnot metadata\n", &mut state, &all_valid());
        assert_ne!(outcome, ScanOutcome::Emit(TokenKind::MinusMetadata));
    }

    #[test]
    fn pipe_table_header_requires_matching_delimiter_row_cell_count() {
        let mut state = ScannerState::new();
        let outcome = scan_with("a | b\n--|--\n", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::PipeTableStart));
    }

    #[test]
    fn pipe_table_header_declines_on_cell_count_mismatch() {
        let mut state = ScannerState::new();
        let outcome = scan_with("a | b | c\n--|--\n", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Decline);
    }

    #[test]
    fn eof_closes_open_blocks_one_at_a_time() {
        let mut state = ScannerState {
            open_blocks: vec![BLOCK_QUOTE],
            ..ScannerState::new()
        };
        let mut valid = all_valid();
        valid[TokenKind::TokenEof.ordinal()] = false;
        let outcome = scan_with("", &mut state, &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::BlockClose));
        assert!(state.open_blocks.is_empty());
    }

    #[test]
    fn push_block_failure_emits_error_instead_of_silently_dropping_state() {
        let mut state = ScannerState::new();
        while state.push_block(ANONYMOUS) {}
        let outcome = scan_with("> quoted", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::Error));
    }

    #[test]
    fn html_comment_spans_would_be_block_markers() {
        let mut state = ScannerState::new();
        let outcome = scan_with("<!-- # not a heading -->", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::HtmlComment));
    }

    #[test]
    fn four_spaces_of_indentation_starts_an_indented_chunk() {
        let mut state = ScannerState::new();
        let mut valid = vec![false; TokenKind::COUNT];
        valid[TokenKind::IndentedChunkStart.ordinal()] = true;
        let outcome = scan_with("    code here\n", &mut state, &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::IndentedChunkStart));
        assert_eq!(state.open_blocks, vec![INDENTED_CHUNK]);
        assert_eq!(state.indentation, 0);
    }

    #[test]
    fn no_indented_chunk_symbol_suppresses_the_indented_chunk() {
        let mut state = ScannerState::new();
        let mut valid = vec![false; TokenKind::COUNT];
        valid[TokenKind::IndentedChunkStart.ordinal()] = true;
        valid[TokenKind::NoIndentedChunk.ordinal()] = true;
        let outcome = scan_with("    code here\n", &mut state, &valid);
        assert_ne!(outcome, ScanOutcome::Emit(TokenKind::IndentedChunkStart));
    }

    #[test]
    fn dashes_with_no_interior_whitespace_are_a_setext_underline() {
        let mut state = ScannerState::new();
        let mut valid = vec![false; TokenKind::COUNT];
        valid[TokenKind::SetextH2Underline.ordinal()] = true;
        let outcome = scan_with("--\n", &mut state, &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::SetextH2Underline));
    }

    #[test]
    fn triple_plus_fence_closes_on_its_own_triple_plus_line() {
        let mut state = ScannerState::new();
        let outcome = scan_with("+++\ntitle: x\n+++\n", &mut state, &all_valid());
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::PlusMetadata));
    }

    #[test]
    fn plus_metadata_declines_when_followed_by_a_blank_line() {
        let mut state = ScannerState::new();
        let outcome = scan_with("+++\n\nnot metadata\n", &mut state, &all_valid());
        assert_ne!(outcome, ScanOutcome::Emit(TokenKind::PlusMetadata));
    }

    #[test]
    fn double_dollar_toggles_display_math() {
        let mut state = ScannerState::new();
        let mut valid = vec![false; TokenKind::COUNT];
        valid[TokenKind::DisplayMathStateTrackMarker.ordinal()] = true;
        let outcome = scan_with("$$x+y$$\n", &mut state, &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::DisplayMathStateTrackMarker));
        assert!(state.has_flag(STATE_IN_DISPLAY_MATH));
    }

    #[test]
    fn list_marker_never_interrupts_inside_display_math() {
        let mut state = ScannerState {
            state: STATE_IN_DISPLAY_MATH,
            ..ScannerState::new()
        };
        let mut valid = vec![false; TokenKind::COUNT];
        valid[TokenKind::ListMarkerStarDontInterrupt.ordinal()] = true;
        let outcome = scan_with("* item", &mut state, &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::ListMarkerStarDontInterrupt));
    }

    #[test]
    fn line_ending_resets_indentation_and_enters_matching_when_blocks_are_open() {
        let mut state = ScannerState {
            open_blocks: vec![BLOCK_QUOTE],
            ..ScannerState::new()
        };
        let mut valid = vec![false; TokenKind::COUNT];
        valid[TokenKind::LineEnding.ordinal()] = true;
        let outcome = scan_with("\nnext", &mut state, &valid);
        assert_eq!(outcome, ScanOutcome::Emit(TokenKind::LineEnding));
        assert!(state.has_flag(STATE_MATCHING));
    }

    #[test]
    fn declined_line_ending_peek_does_not_leak_state_mutations() {
        let mut state = ScannerState {
            indentation: 9,
            column: 3,
            matched: 5,
            ..ScannerState::new()
        };
        let before = state.clone();
        let mut valid = vec![false; TokenKind::COUNT];
        valid[TokenKind::SoftLineEnding.ordinal()] = true;
        // Next line starts with leading spaces then `-`, which the peek
        // consumes into `indentation` before deciding `-` could start a
        // new block and declining to emit SOFT_LINE_ENDING; with neither
        // LINE_ENDING nor PIPE_TABLE_LINE_ENDING valid either, this must
        // fall all the way through to Decline.
        let outcome = scan_with("\n    - x\n", &mut state, &valid);
        assert_eq!(outcome, ScanOutcome::Decline);
        assert_eq!(state, before);
    }
}
