/// Scanner state for the doctemplate scanner.
///
/// The doctemplate grammar doesn't need the scanner to remember anything
/// between calls — each `$keyword` is self-contained — so there's nothing
/// here to track. The field exists only because `serialize`/`deserialize`
/// must round-trip *something*, and the original C scanner's `Scanner`
/// struct keeps an `own_size` field for exactly this reason: it's a
/// placeholder that echoes the length it was given, "in case one is needed
/// in the future" (the upstream comment's own words).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScannerState {
    own_size: u32,
}

/// Number of reserved bytes `serialize` writes. The original C scanner
/// writes `sizeof(unsigned)` zero bytes; we mirror that as a 4-byte
/// reserved field rather than the 1-byte figure in the scanner's own prose
/// summary, since the C source is the more precise source of truth here
/// (see DESIGN.md).
const SERIALIZED_LEN: usize = 4;

impl ScannerState {
    /// A freshly created scanner's state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write this state to `buffer`, returning the number of bytes written.
    pub fn serialize(&self, buffer: &mut [u8]) -> usize {
        let len = SERIALIZED_LEN.min(buffer.len());
        buffer[..len].fill(0);
        len
    }

    /// Reconstruct state from a buffer. The doctemplate scanner doesn't
    /// interpret the buffer's contents at all — only its length, echoed
    /// back into `own_size` exactly as the original scanner did.
    pub fn deserialize(buffer: &[u8]) -> Self {
        Self {
            own_size: buffer.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fresh_state_serializes_to_four_zero_bytes() {
        let state = ScannerState::new();
        let mut buffer = [0xffu8; 8];
        let written = state.serialize(&mut buffer);
        assert_eq!(written, 4);
        assert_eq!(&buffer[..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn deserialize_of_empty_buffer_resets_state() {
        let state = ScannerState::deserialize(&[]);
        assert_eq!(state, ScannerState { own_size: 0 });
    }

    #[test]
    fn deserialize_echoes_buffer_length() {
        let state = ScannerState::deserialize(&[0, 0, 0, 0]);
        assert_eq!(state, ScannerState { own_size: 4 });
    }
}
