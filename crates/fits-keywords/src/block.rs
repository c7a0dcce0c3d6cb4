/// FITS block size in bytes. Headers are always a whole number of blocks.
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Maximum keyword length; the first 8 bytes of every card.
pub const KEYWORD_LEN: usize = 8;

/// Length of the value field (bytes 10..80 of a card).
pub const VALUE_FIELD_LEN: usize = CARD_SIZE - KEYWORD_LEN - 2;

/// Longest string value that fits between the quotes of a value field.
pub const MAX_STRING_LEN: usize = VALUE_FIELD_LEN - 2;

/// Longest commentary text (COMMENT/HISTORY) that fits after the keyword.
pub const MAX_COMMENTARY_LEN: usize = CARD_SIZE - KEYWORD_LEN;

/// Padding byte used for header blocks (ASCII space).
pub const HEADER_PAD_BYTE: u8 = 0x20;

/// Returns the number of FITS blocks required to hold `num_cards` cards.
///
/// Zero cards need zero blocks; 1..=36 cards need one block, and so on.
pub const fn blocks_for_cards(num_cards: usize) -> usize {
    if num_cards == 0 {
        return 0;
    }
    num_cards.div_ceil(CARDS_PER_BLOCK)
}

/// Returns the byte length of a header holding `num_cards` cards, rounded up
/// to whole blocks.
pub const fn header_byte_len_for(num_cards: usize) -> usize {
    blocks_for_cards(num_cards) * BLOCK_SIZE
}
