//! The open-block stack.
//!
//! A [`BlockId`] is a plain byte rather than a Rust enum because the
//! original scanner treats list-item indentation as arithmetic on the
//! block's ordinal (`LIST_ITEM + extra_indentation`) — porting that to a
//! closed enum would mean re-deriving the same arithmetic through a match
//! anyway. Named constants cover the non-arithmetic blocks; list items are
//! addressed through [`list_item_block`] and [`list_item_indentation`].

pub type BlockId = u8;

pub const BLOCK_QUOTE: BlockId = 0;
pub const LIST_ITEM: BlockId = 1;
pub const LIST_ITEM_MAX_INDENTATION: BlockId = 16;
pub const FENCED_CODE_BLOCK: BlockId = 17;
pub const ANONYMOUS: BlockId = 18;
pub const FENCED_DIV: BlockId = 19;
/// An indented code chunk (4+ columns of leading whitespace outside any
/// container already claiming that indentation). Continuation requires the
/// same fixed 4-column indentation every line; see `match_indentation`.
pub const INDENTED_CHUNK: BlockId = 20;

pub fn is_list_item(block: BlockId) -> bool {
    (LIST_ITEM..=LIST_ITEM_MAX_INDENTATION).contains(&block)
}

/// Minimum indentation, in columns, content of this list item must have.
pub fn list_item_indentation(block: BlockId) -> u8 {
    debug_assert!(is_list_item(block));
    block - LIST_ITEM + 2
}

/// The list-item block for a marker followed by `extra_indentation` columns
/// of whitespace, clamped to [`LIST_ITEM_MAX_INDENTATION`] the way the
/// original's `LIST_ITEM_MAX_INDENTATION` variant caps indentation that
/// would otherwise read as an indented code block.
pub fn list_item_block(extra_indentation: u8) -> BlockId {
    LIST_ITEM + extra_indentation.min(LIST_ITEM_MAX_INDENTATION - LIST_ITEM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_item_indentation_follows_the_original_offset() {
        assert_eq!(list_item_indentation(LIST_ITEM), 2);
        assert_eq!(list_item_indentation(LIST_ITEM_MAX_INDENTATION), 17);
    }

    #[test]
    fn list_item_block_clamps_to_max_indentation() {
        assert_eq!(list_item_block(0), LIST_ITEM);
        assert_eq!(list_item_block(255), LIST_ITEM_MAX_INDENTATION);
    }
}
