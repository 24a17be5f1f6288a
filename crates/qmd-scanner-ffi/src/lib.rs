//! # qmd-scanner-ffi
//!
//! The C ABI surface a generated tree-sitter parser links against: five
//! `extern "C"` functions per scanner (`create`, `destroy`, `serialize`,
//! `deserialize`, `scan`), named the way `tree-sitter generate` expects —
//! `tree_sitter_<grammar>_external_scanner_<op>`. This crate owns no scanner
//! logic of its own; it only adapts the safe `qmd-scanner-core` /
//! `qmd-scanner-block` / `qmd-scanner-inline` / `qmd-scanner-doctemplate`
//! APIs to the raw pointers and fixed buffers the C side hands in.
//!
//! All five functions per scanner are `unsafe` by nature — the contract is
//! "the host calls these in the order tree-sitter's runtime guarantees, with
//! pointers it owns" — so this is the one crate in the workspace where raw
//! pointer handling is expected rather than a smell.

mod tslexer;

use std::ffi::c_void;
use std::os::raw::c_char;

use qmd_scanner_core::{ScanOutcome, ValidSymbols};
use tslexer::{FfiLexer, TSLexer};

/// Defines the four pointer-shuffling entry points plus `scan` for a
/// scanner whose `scan` function takes `(&mut State, &mut Lexer,
/// ValidSymbols)` — i.e. every scanner except doctemplate, which carries no
/// state and is wired up by hand below instead.
macro_rules! define_stateful_scanner {
    (
        $create:ident,
        $destroy:ident,
        $serialize:ident,
        $deserialize:ident,
        $scan:ident,
        state = $state:ty,
        token = $token:ty,
        scan_fn = $scan_fn:path,
    ) => {
        /// # Safety
        /// Called by the tree-sitter runtime with no arguments and expected
        /// to return an opaque payload pointer it will pass back unchanged
        /// to every other function below.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $create() -> *mut c_void {
            Box::into_raw(Box::new(<$state>::new())) as *mut c_void
        }

        /// # Safety
        /// `payload` must be a pointer this module's `create` returned,
        /// not already destroyed.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $destroy(payload: *mut c_void) {
            drop(unsafe { Box::from_raw(payload as *mut $state) });
        }

        /// # Safety
        /// `payload` must be live; `buffer` must point to at least
        /// [`qmd_scanner_core::budget::MAX_STATE_BYTES`] writable bytes, the
        /// fixed buffer tree-sitter allocates per scanner instance.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $serialize(payload: *mut c_void, buffer: *mut c_char) -> u32 {
            let state = unsafe { &*(payload as *const $state) };
            let buffer = unsafe {
                std::slice::from_raw_parts_mut(buffer as *mut u8, qmd_scanner_core::budget::MAX_STATE_BYTES)
            };
            state.serialize(buffer) as u32
        }

        /// # Safety
        /// `payload` must be live; `buffer` must point to at least `length`
        /// readable bytes (or be any value when `length == 0`).
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $deserialize(payload: *mut c_void, buffer: *const c_char, length: u32) {
            let state = unsafe { &mut *(payload as *mut $state) };
            let bytes: &[u8] = if length == 0 {
                &[]
            } else {
                unsafe { std::slice::from_raw_parts(buffer as *const u8, length as usize) }
            };
            *state = <$state>::deserialize(bytes).unwrap_or_default();
        }

        /// # Safety
        /// `payload` must be live; `lexer` must be a valid `TSLexer*` for
        /// the duration of this call; `valid_symbols` must point to at
        /// least `<$token>::COUNT` readable `bool`s.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $scan(payload: *mut c_void, lexer: *mut TSLexer, valid_symbols: *const bool) -> bool {
            let state = unsafe { &mut *(payload as *mut $state) };
            let mut lexer = unsafe { FfiLexer::new(lexer) };
            let valid_symbols = unsafe { std::slice::from_raw_parts(valid_symbols, <$token>::COUNT) };
            let valid_symbols = ValidSymbols::new(valid_symbols);
            match $scan_fn(state, &mut lexer, valid_symbols) {
                ScanOutcome::Emit(token) => {
                    unsafe {
                        (*lexer.raw()).result_symbol = token.ordinal() as u16;
                    }
                    true
                }
                ScanOutcome::Decline => false,
            }
        }
    };
}

define_stateful_scanner! {
    tree_sitter_markdown_external_scanner_create,
    tree_sitter_markdown_external_scanner_destroy,
    tree_sitter_markdown_external_scanner_serialize,
    tree_sitter_markdown_external_scanner_deserialize,
    tree_sitter_markdown_external_scanner_scan,
    state = qmd_scanner_block::ScannerState,
    token = qmd_scanner_block::TokenKind,
    scan_fn = qmd_scanner_block::scan,
}

define_stateful_scanner! {
    tree_sitter_markdown_inline_external_scanner_create,
    tree_sitter_markdown_inline_external_scanner_destroy,
    tree_sitter_markdown_inline_external_scanner_serialize,
    tree_sitter_markdown_inline_external_scanner_deserialize,
    tree_sitter_markdown_inline_external_scanner_scan,
    state = qmd_scanner_inline::ScannerState,
    token = qmd_scanner_inline::TokenKind,
    scan_fn = qmd_scanner_inline::scan,
}

// The doctemplate scanner carries no state between calls (see
// `qmd_scanner_doctemplate::ScannerState`'s doc comment), and its `scan`
// takes no state argument, so it doesn't fit `define_stateful_scanner!` and
// is wired up directly instead.

/// # Safety
/// Called by the tree-sitter runtime with no arguments.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tree_sitter_doctemplate_external_scanner_create() -> *mut c_void {
    Box::into_raw(Box::new(qmd_scanner_doctemplate::ScannerState::new())) as *mut c_void
}

/// # Safety
/// `payload` must be a pointer `create` returned, not already destroyed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tree_sitter_doctemplate_external_scanner_destroy(payload: *mut c_void) {
    drop(unsafe { Box::from_raw(payload as *mut qmd_scanner_doctemplate::ScannerState) });
}

/// # Safety
/// `payload` must be live; `buffer` must point to at least
/// [`qmd_scanner_core::budget::MAX_STATE_BYTES`] writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tree_sitter_doctemplate_external_scanner_serialize(payload: *mut c_void, buffer: *mut c_char) -> u32 {
    let state = unsafe { &*(payload as *const qmd_scanner_doctemplate::ScannerState) };
    let buffer = unsafe { std::slice::from_raw_parts_mut(buffer as *mut u8, qmd_scanner_core::budget::MAX_STATE_BYTES) };
    state.serialize(buffer) as u32
}

/// # Safety
/// `payload` must be live; `buffer` must point to at least `length` readable
/// bytes (or be any value when `length == 0`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tree_sitter_doctemplate_external_scanner_deserialize(payload: *mut c_void, buffer: *const c_char, length: u32) {
    let state = unsafe { &mut *(payload as *mut qmd_scanner_doctemplate::ScannerState) };
    let bytes: &[u8] = if length == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(buffer as *const u8, length as usize) }
    };
    *state = qmd_scanner_doctemplate::ScannerState::deserialize(bytes);
}

/// # Safety
/// `lexer` must be a valid `TSLexer*` for the duration of this call;
/// `valid_symbols` must point to at least
/// `qmd_scanner_doctemplate::TokenKind::COUNT` readable `bool`s.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tree_sitter_doctemplate_external_scanner_scan(
    _payload: *mut c_void,
    lexer: *mut TSLexer,
    valid_symbols: *const bool,
) -> bool {
    let mut lexer = unsafe { FfiLexer::new(lexer) };
    let valid_symbols = unsafe { std::slice::from_raw_parts(valid_symbols, qmd_scanner_doctemplate::TokenKind::COUNT) };
    let valid_symbols = ValidSymbols::new(valid_symbols);
    match qmd_scanner_doctemplate::scan(&mut lexer, valid_symbols) {
        ScanOutcome::Emit(token) => {
            unsafe {
                (*lexer.raw()).result_symbol = token.ordinal() as u16;
            }
            true
        }
        ScanOutcome::Decline => false,
    }
}
