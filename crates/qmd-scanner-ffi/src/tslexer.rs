//! The raw `TSLexer` ABI every tree-sitter external scanner is driven
//! through, hand-declared rather than pulled in from the `tree-sitter` crate:
//! this crate only needs the five-function C ABI documented in
//! `tree_sitter/parser.h`, not the rest of that crate's surface.
//!
//! Field layout mirrors upstream exactly (`log` is omitted — it only exists
//! in tree-sitter's own internal builds, gated behind a macro no generated
//! parser defines).

use qmd_scanner_core::Lexer;

#[repr(C)]
pub struct TSLexer {
    pub lookahead: u32,
    pub result_symbol: u16,
    pub advance: unsafe extern "C" fn(*mut TSLexer, bool),
    pub mark_end: unsafe extern "C" fn(*mut TSLexer),
    pub get_column: unsafe extern "C" fn(*mut TSLexer) -> u32,
    pub is_at_included_range_start: unsafe extern "C" fn(*const TSLexer) -> bool,
    pub eof: unsafe extern "C" fn(*const TSLexer) -> bool,
}

/// Adapts a raw `*mut TSLexer` handed across the FFI boundary to
/// [`Lexer`]. Every method call dereferences the pointer and invokes one of
/// its function-pointer fields; the caller of [`FfiLexer::new`] is
/// responsible for the pointer staying valid for the lexer's lifetime,
/// which the generated parser guarantees for the duration of one `scan`
/// call.
pub struct FfiLexer {
    raw: *mut TSLexer,
}

impl FfiLexer {
    /// # Safety
    /// `raw` must be a valid, non-null `TSLexer*` as handed to
    /// `..._external_scanner_scan` by the host, valid for the lifetime of
    /// this `FfiLexer`.
    pub unsafe fn new(raw: *mut TSLexer) -> Self {
        Self { raw }
    }

    /// The raw pointer, for writing `result_symbol` once a token is chosen.
    pub fn raw(&self) -> *mut TSLexer {
        self.raw
    }
}

impl Lexer for FfiLexer {
    fn lookahead(&self) -> char {
        let code = unsafe { (*self.raw).lookahead };
        char::from_u32(code).unwrap_or('\0')
    }

    fn advance(&mut self, skip: bool) {
        unsafe {
            let advance = (*self.raw).advance;
            advance(self.raw, skip);
        }
    }

    fn mark_end(&mut self) {
        unsafe {
            let mark_end = (*self.raw).mark_end;
            mark_end(self.raw);
        }
    }

    fn eof(&self) -> bool {
        unsafe {
            let eof = (*self.raw).eof;
            eof(self.raw)
        }
    }
}
