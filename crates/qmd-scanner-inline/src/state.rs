use qmd_scanner_core::ScanError;

/// Per-delimiter nesting state for the markdown-inline scanner.
///
/// Every field but the two delimiter lengths is a 0/1 flag (`inside_shortcode`
/// is the exception — shortcodes nest, so it's a depth counter). Kept as
/// individual `u8` fields rather than a bitset to match the serialized wire
/// layout byte-for-byte with the original C `Scanner` struct.
///
/// `state` and `num_emphasis_delimiters_left` are carried across calls but
/// never read or written by the scan logic itself — they exist in the
/// upstream C scanner as reserved/forward-compat fields, and are kept here
/// purely so serialize/deserialize round-trips match the original layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScannerState {
    pub(crate) state: u8,
    pub(crate) code_span_delimiter_length: u8,
    pub(crate) latex_span_delimiter_length: u8,
    pub(crate) num_emphasis_delimiters_left: u8,
    pub(crate) inside_shortcode: u8,
    pub(crate) inside_superscript: u8,
    pub(crate) inside_subscript: u8,
    pub(crate) inside_strikeout: u8,
    pub(crate) inside_single_quote: u8,
    pub(crate) inside_double_quote: u8,
    pub(crate) inside_latex_span: u8,
    pub(crate) inside_code_span: u8,
}

/// Number of bytes a fully-serialized inline scanner state occupies.
pub const SERIALIZED_LEN: usize = 12;

impl ScannerState {
    /// A freshly created scanner's state: every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write this state to `buffer`, returning the number of bytes written.
    /// `buffer` must be at least [`SERIALIZED_LEN`] bytes.
    pub fn serialize(&self, buffer: &mut [u8]) -> usize {
        let fields = [
            self.state,
            self.code_span_delimiter_length,
            self.latex_span_delimiter_length,
            self.num_emphasis_delimiters_left,
            self.inside_shortcode,
            self.inside_superscript,
            self.inside_subscript,
            self.inside_strikeout,
            self.inside_single_quote,
            self.inside_double_quote,
            self.inside_latex_span,
            self.inside_code_span,
        ];
        buffer[..SERIALIZED_LEN].copy_from_slice(&fields);
        SERIALIZED_LEN
    }

    /// Reconstruct state from a buffer. An empty buffer resets to the
    /// initial (all-zero) state, matching `length == 0` in the C contract. A
    /// non-empty buffer shorter than [`SERIALIZED_LEN`] is truncated
    /// mid-field and can't be read; that's a host bug, not a
    /// document-parsing error, so it's reported as
    /// [`ScanError::CorruptState`] rather than panicking.
    pub fn deserialize(buffer: &[u8]) -> Result<Self, ScanError> {
        if buffer.is_empty() {
            return Ok(Self::default());
        }
        if buffer.len() < SERIALIZED_LEN {
            return Err(ScanError::CorruptState {
                reason: "buffer shorter than the fixed-size field layout",
            });
        }
        Ok(Self {
            state: buffer[0],
            code_span_delimiter_length: buffer[1],
            latex_span_delimiter_length: buffer[2],
            num_emphasis_delimiters_left: buffer[3],
            inside_shortcode: buffer[4],
            inside_superscript: buffer[5],
            inside_subscript: buffer[6],
            inside_strikeout: buffer[7],
            inside_single_quote: buffer[8],
            inside_double_quote: buffer[9],
            inside_latex_span: buffer[10],
            inside_code_span: buffer[11],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_through_serialize_deserialize() {
        let state = ScannerState {
            state: 1,
            code_span_delimiter_length: 3,
            latex_span_delimiter_length: 2,
            num_emphasis_delimiters_left: 5,
            inside_shortcode: 2,
            inside_superscript: 1,
            inside_subscript: 0,
            inside_strikeout: 1,
            inside_single_quote: 0,
            inside_double_quote: 1,
            inside_latex_span: 0,
            inside_code_span: 1,
        };
        let mut buffer = [0u8; SERIALIZED_LEN];
        let written = state.serialize(&mut buffer);
        assert_eq!(written, SERIALIZED_LEN);
        assert_eq!(ScannerState::deserialize(&buffer).unwrap(), state);
    }

    #[test]
    fn empty_buffer_deserializes_to_default() {
        assert_eq!(ScannerState::deserialize(&[]).unwrap(), ScannerState::default());
    }

    #[test]
    fn truncated_buffer_is_reported_as_corrupt_state() {
        let buffer = [0u8; SERIALIZED_LEN - 1];
        assert_eq!(
            ScannerState::deserialize(&buffer),
            Err(ScanError::CorruptState {
                reason: "buffer shorter than the fixed-size field layout",
            })
        );
    }
}
