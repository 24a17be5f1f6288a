use qmd_scanner_core::budget::within_push_budget;
use qmd_scanner_core::ScanError;

use crate::block::BlockId;

pub const STATE_MATCHING: u8 = 0x1;
pub const STATE_WAS_SOFT_LINE_BREAK: u8 = 0x1 << 1;
pub const STATE_CLOSE_BLOCK: u8 = 0x1 << 4;
/// Set while lexing inside a display-math span (`$$...$$`), toggled by
/// `DisplayMathStateTrackMarker`. Each list-marker parsing function in
/// `scan` checks this flag directly and refuses to interrupt a paragraph
/// while it's set, rather than through a shared dispatcher.
pub const STATE_IN_DISPLAY_MATH: u8 = 0x1 << 2;

/// Fixed per-instance byte cost of a serialized state, not counting the open
/// block stack: the 4-byte reserved prefix (see [`serialize`]) plus the 7
/// scalar fields.
const BASE_SERIALIZED_LEN: usize = 4 + 7;

/// Minimum length a non-empty buffer must have for [`ScannerState::deserialize`]
/// to read it: the 4-byte reserved prefix plus the 7 scalar fields. Anything
/// shorter is truncated mid-field and can't be read without indexing past
/// the end.
const MIN_DESERIALIZE_LEN: usize = 4 + 7;

/// Block structure being tracked across scan calls: the open-block stack,
/// the indentation/column bookkeeping `match_block` needs, and the few
/// delimiter-length counters shared between fenced code blocks and the pipe
/// table cell lexer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannerState {
    pub(crate) state: u8,
    pub(crate) matched: u8,
    pub(crate) indentation: u8,
    pub(crate) column: u8,
    pub(crate) fenced_code_block_delimiter_length: u8,
    pub(crate) code_span_delimiter_length: u8,
    pub(crate) latex_span_delimiter_length: u8,
    pub(crate) open_blocks: Vec<BlockId>,
}

impl ScannerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn has_flag(&self, flag: u8) -> bool {
        self.state & flag != 0
    }

    pub(crate) fn set_flag(&mut self, flag: u8) {
        self.state |= flag;
    }

    pub(crate) fn clear_flag(&mut self, flag: u8) {
        self.state &= !flag;
    }

    pub(crate) fn toggle_flag(&mut self, flag: u8) {
        self.state ^= flag;
    }

    /// Whether one more block can be pushed without the serialized state
    /// crossing 75% of tree-sitter's 1024-byte state size limit.
    pub(crate) fn can_push_block(&self) -> bool {
        within_push_budget(BASE_SERIALIZED_LEN + self.open_blocks.len() + 1)
    }

    pub(crate) fn push_block(&mut self, block: BlockId) -> bool {
        if !self.can_push_block() {
            return false;
        }
        self.open_blocks.push(block);
        true
    }

    pub(crate) fn pop_block(&mut self) -> BlockId {
        self.open_blocks
            .pop()
            .expect("pop_block called with no open blocks")
    }

    /// Write this state to `buffer`, returning the number of bytes written.
    pub fn serialize(&self, buffer: &mut [u8]) -> usize {
        let mut size = 0;
        for b in &mut buffer[..4] {
            *b = 0;
        }
        size += 4;
        buffer[size] = self.state;
        size += 1;
        buffer[size] = self.matched;
        size += 1;
        buffer[size] = self.indentation;
        size += 1;
        buffer[size] = self.column;
        size += 1;
        buffer[size] = self.fenced_code_block_delimiter_length;
        size += 1;
        buffer[size] = self.code_span_delimiter_length;
        size += 1;
        buffer[size] = self.latex_span_delimiter_length;
        size += 1;
        if !self.open_blocks.is_empty() {
            buffer[size..size + self.open_blocks.len()].copy_from_slice(&self.open_blocks);
            size += self.open_blocks.len();
        }
        size
    }

    /// Reconstruct state from a buffer. An empty buffer resets to the
    /// initial (all-zero, no open blocks) state. A non-empty buffer shorter
    /// than the fixed scalar-field prefix is truncated mid-field and can't
    /// be read; that's a host bug, not a document-parsing error, so it's
    /// reported as [`ScanError::CorruptState`] rather than panicking.
    pub fn deserialize(buffer: &[u8]) -> Result<Self, ScanError> {
        if buffer.is_empty() {
            return Ok(Self::default());
        }
        if buffer.len() < MIN_DESERIALIZE_LEN {
            return Err(ScanError::CorruptState {
                reason: "buffer shorter than the fixed scalar-field prefix",
            });
        }
        let mut size = 4;
        let state = buffer[size];
        size += 1;
        let matched = buffer[size];
        size += 1;
        let indentation = buffer[size];
        size += 1;
        let column = buffer[size];
        size += 1;
        let fenced_code_block_delimiter_length = buffer[size];
        size += 1;
        let code_span_delimiter_length = buffer[size];
        size += 1;
        let latex_span_delimiter_length = buffer[size];
        size += 1;
        let open_blocks = buffer[size..].to_vec();
        Ok(Self {
            state,
            matched,
            indentation,
            column,
            fenced_code_block_delimiter_length,
            code_span_delimiter_length,
            latex_span_delimiter_length,
            open_blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_through_serialize_deserialize() {
        let mut state = ScannerState {
            state: STATE_MATCHING,
            matched: 2,
            indentation: 4,
            column: 1,
            fenced_code_block_delimiter_length: 3,
            code_span_delimiter_length: 0,
            latex_span_delimiter_length: 0,
            open_blocks: vec![crate::block::BLOCK_QUOTE, crate::block::LIST_ITEM],
        };
        let mut buffer = [0u8; 64];
        let written = state.serialize(&mut buffer);
        assert_eq!(ScannerState::deserialize(&buffer[..written]).unwrap(), state);
        state.open_blocks.clear();
        assert_ne!(ScannerState::deserialize(&buffer[..written]).unwrap(), state);
    }

    #[test]
    fn empty_buffer_deserializes_to_default() {
        assert_eq!(ScannerState::deserialize(&[]).unwrap(), ScannerState::default());
    }

    #[test]
    fn truncated_buffer_is_reported_as_corrupt_state() {
        let buffer = [0u8; 5];
        assert_eq!(
            ScannerState::deserialize(&buffer),
            Err(ScanError::CorruptState {
                reason: "buffer shorter than the fixed scalar-field prefix",
            })
        );
    }

    #[test]
    fn can_push_block_respects_the_push_budget() {
        let mut state = ScannerState::new();
        while state.push_block(crate::block::ANONYMOUS) {}
        assert!(!state.can_push_block());
        // BASE_SERIALIZED_LEN(11) + N + 1 <= 768 => N <= 757
        assert_eq!(state.open_blocks.len(), 757);
    }
}
