//! The ordered card list produced by the encoder and consumed by the decoder.

use alloc::vec::Vec;

use crate::card::{parse_header_blocks, serialize_header, Card};
use crate::error::Result;
use crate::value::Value;

/// An ordered list of header cards, without the trailing END card.
///
/// Keywords need not be unique: COMMENT and HISTORY repeat by design.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordList {
    cards: Vec<Card>,
}

impl KeywordList {
    /// A list holding only `SIMPLE = T`, the card every primary header
    /// starts with.
    pub fn new() -> Self {
        KeywordList {
            cards: alloc::vec![Card::new(
                "SIMPLE",
                Value::Logical(true),
                Some(alloc::string::String::from("Standard FITS")),
            )],
        }
    }

    /// A list with no cards at all.
    pub fn empty() -> Self {
        KeywordList { cards: Vec::new() }
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    /// First card with the given (upper-case) keyword.
    pub fn find(&self, keyword: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.keyword_str() == keyword)
    }

    /// Serialize as FITS header blocks, END card and padding included.
    pub fn to_bytes(&self) -> Vec<u8> {
        serialize_header(&self.cards)
    }

    /// Parse header blocks up to and excluding the END card.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cards = parse_header_blocks(data)?;
        cards.retain(|c| !c.is_end());
        Ok(KeywordList { cards })
    }

    #[cfg(feature = "std")]
    pub fn write_to<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Read header blocks from `reader` until the END card.
    ///
    /// Reads block by block, so the reader is left positioned right after the
    /// header (at the start of any data unit).
    #[cfg(feature = "std")]
    pub fn read_from<R: std::io::Read>(mut reader: R) -> Result<Self> {
        use crate::block::{BLOCK_SIZE, CARD_SIZE, KEYWORD_LEN};

        let mut data = Vec::new();
        loop {
            let mut block = [0u8; BLOCK_SIZE];
            reader.read_exact(&mut block).map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => crate::Error::UnexpectedEof,
                _ => crate::Error::Io(e),
            })?;
            let has_end = block
                .chunks_exact(CARD_SIZE)
                .any(|card| &card[..KEYWORD_LEN] == b"END     ");
            data.extend_from_slice(&block);
            if has_end {
                return Self::from_bytes(&data);
            }
        }
    }
}

impl From<Vec<Card>> for KeywordList {
    fn from(cards: Vec<Card>) -> Self {
        KeywordList { cards }
    }
}

impl<'a> IntoIterator for &'a KeywordList {
    type Item = &'a Card;
    type IntoIter = core::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BLOCK_SIZE;
    use alloc::string::String;

    #[test]
    fn new_list_starts_with_simple() {
        let list = KeywordList::new();
        assert_eq!(list.len(), 1);
        let simple = list.find("SIMPLE").unwrap();
        assert_eq!(simple.value, Some(Value::Logical(true)));
    }

    #[test]
    fn empty_list_has_no_cards() {
        assert!(KeywordList::empty().is_empty());
    }

    #[test]
    fn bytes_round_trip_drops_end() {
        let mut list = KeywordList::new();
        list.push(Card::new("OBJECT", Value::String(String::from("M31")), None));
        list.push(Card::commentary("COMMENT", "two"));

        let bytes = list.to_bytes();
        assert_eq!(bytes.len(), BLOCK_SIZE);
        let back = KeywordList::from_bytes(&bytes).unwrap();
        assert_eq!(back, list);
    }

    #[cfg(feature = "std")]
    #[test]
    fn reader_stops_after_header() {
        let list = KeywordList::new();
        let mut bytes = list.to_bytes();
        bytes.extend_from_slice(&[0u8; BLOCK_SIZE]);

        let mut cursor = std::io::Cursor::new(bytes);
        let back = KeywordList::read_from(&mut cursor).unwrap();
        assert_eq!(back, list);
        assert_eq!(cursor.position(), BLOCK_SIZE as u64);
    }

    #[cfg(feature = "std")]
    #[test]
    fn reader_without_end_is_eof() {
        let cursor = std::io::Cursor::new(alloc::vec![b' '; BLOCK_SIZE]);
        assert!(matches!(
            KeywordList::read_from(cursor),
            Err(crate::Error::UnexpectedEof)
        ));
    }
}
