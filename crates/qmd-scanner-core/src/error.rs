/// Errors surfaced by the safe Rust API around a scanner.
///
/// Scanners never panic on malformed *input text* — an unrecognized
/// character just falls through to `Decline`. These errors are narrower:
/// they cover the two ways the state-serialization contract (§5/§6 of the
/// scanner design) can be violated by the *host*, not by the document being
/// parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScanError {
    /// Serializing the current state would exceed the host's fixed buffer.
    ///
    /// In practice this is unreachable for `serialize` itself (the push-time
    /// budget check in [`crate::budget`] keeps the state from ever growing
    /// this large), but `deserialize` can still be handed an oversized
    /// buffer by a misbehaving host, so the check is kept on both paths.
    #[error("serialized scanner state would be {actual} bytes, exceeding the {limit} byte limit")]
    StateTooLarge { actual: usize, limit: usize },

    /// `deserialize` was given a buffer whose shape doesn't match this
    /// scanner's layout (truncated mid-field, or a block-stack byte count
    /// that doesn't fit the declared length).
    #[error("corrupt scanner state: {reason}")]
    CorruptState { reason: &'static str },
}
