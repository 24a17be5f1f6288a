//! The serialization-size budget shared by every scanner.
//!
//! Tree-sitter allocates a fixed-size buffer for a scanner's serialized
//! state (1024 bytes, `TREE_SITTER_SERIALIZATION_BUFFER_SIZE` upstream) and
//! never grows it. A scanner that serializes past that limit corrupts
//! adjacent parser memory, so the rule is conservative: before growing state
//! that would need to be serialized (pushing a block onto the open-block
//! stack), a scanner checks that the *projected* size stays under 75% of the
//! hard limit, leaving headroom for whatever the grammar's other bookkeeping
//! needs. This is a constraint imposed by the host runtime, not a tuning
//! knob — the 1024 and 75% figures are mirrored exactly, not derived.

/// The hard limit tree-sitter imposes on a scanner's serialized state.
pub const MAX_STATE_BYTES: usize = 1024;

/// The fraction of [`MAX_STATE_BYTES`] a scanner may use before it must
/// refuse to grow further (by emitting the reserved `ERROR` token instead of
/// pushing a new block).
pub const PUSH_BUDGET_BYTES: usize = MAX_STATE_BYTES * 3 / 4;

/// Whether a serialized state of `projected_len` bytes stays inside the
/// push budget, i.e. whether it is still safe to grow the state further.
pub fn within_push_budget(projected_len: usize) -> bool {
    projected_len <= PUSH_BUDGET_BYTES
}

/// Whether a serialized state of `len` bytes fits tree-sitter's hard buffer
/// limit at all. Used as a last-resort guard in `serialize`/`deserialize`;
/// [`within_push_budget`] is the one that should stop growth long before
/// this would ever trip.
pub fn within_hard_limit(len: usize) -> bool {
    len <= MAX_STATE_BYTES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_budget_is_three_quarters_of_hard_limit() {
        assert_eq!(PUSH_BUDGET_BYTES, 768);
        assert!(within_push_budget(768));
        assert!(!within_push_budget(769));
    }

    #[test]
    fn hard_limit_is_1024_bytes() {
        assert!(within_hard_limit(1024));
        assert!(!within_hard_limit(1025));
    }
}
