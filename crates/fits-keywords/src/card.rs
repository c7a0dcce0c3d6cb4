//! FITS header card parsing, writing, and header block framing.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::str;

use crate::block::{
    header_byte_len_for, BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE, HEADER_PAD_BYTE, KEYWORD_LEN,
    MAX_COMMENTARY_LEN, VALUE_FIELD_LEN,
};
use crate::error::{Error, Result};
use crate::value::{format_value, parse_value, Value};

/// One 80-byte keyword record.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// The 8-byte keyword name, ASCII, left-justified, space-padded.
    pub keyword: [u8; KEYWORD_LEN],
    /// The value, if this card has a value indicator (`= ` in bytes 8..10).
    pub value: Option<Value>,
    /// Trailing comment, or the free text of a commentary card.
    pub comment: Option<String>,
}

impl Card {
    /// A valued card. `keyword` is truncated to 8 bytes.
    pub fn new(keyword: &str, value: Value, comment: Option<String>) -> Self {
        Card {
            keyword: make_keyword(keyword),
            value: Some(value),
            comment,
        }
    }

    /// A COMMENT/HISTORY style card carrying free text.
    pub fn commentary(keyword: &str, text: &str) -> Self {
        Card {
            keyword: make_keyword(keyword),
            value: None,
            comment: Some(String::from(text)),
        }
    }

    /// Return the keyword as a trimmed UTF-8 string.
    pub fn keyword_str(&self) -> &str {
        let end = self
            .keyword
            .iter()
            .rposition(|&b| b != b' ')
            .map(|i| i + 1)
            .unwrap_or(0);
        str::from_utf8(&self.keyword[..end]).unwrap_or("")
    }

    /// Returns `true` if this card is the END keyword.
    pub fn is_end(&self) -> bool {
        &self.keyword == b"END     "
    }

    /// Returns `true` if this is a blank card (keyword is all spaces).
    pub fn is_blank(&self) -> bool {
        self.keyword.iter().all(|&b| b == b' ')
    }

    /// Returns `true` for COMMENT, HISTORY and blank-keyword cards.
    pub fn is_commentary(&self) -> bool {
        is_commentary_keyword(&self.keyword)
    }
}

/// Pad a keyword to 8 bytes with trailing spaces, truncating longer names.
pub fn make_keyword(name: &str) -> [u8; KEYWORD_LEN] {
    let mut kw = [b' '; KEYWORD_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(KEYWORD_LEN);
    kw[..len].copy_from_slice(&bytes[..len]);
    kw
}

/// Returns `true` if `b` may appear in a keyword name.
pub fn is_keyword_byte(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_')
}

// ── Parsing ──

/// Keywords that never carry a value indicator. Their bytes 8..80 are free-form text.
const COMMENTARY_KEYWORDS: [&[u8; KEYWORD_LEN]; 3] = [b"COMMENT ", b"HISTORY ", b"        "];

fn is_commentary_keyword(keyword: &[u8; KEYWORD_LEN]) -> bool {
    COMMENTARY_KEYWORDS.contains(&keyword)
}

fn free_text(bytes: &[u8]) -> Result<Option<String>> {
    let text = str::from_utf8(bytes)
        .map_err(|_| Error::InvalidHeader)?
        .trim_end();
    Ok((!text.is_empty()).then(|| String::from(text)))
}

/// Parse a single 80-byte FITS header card.
pub fn parse_card(card_bytes: &[u8; CARD_SIZE]) -> Result<Card> {
    let mut keyword = [b' '; KEYWORD_LEN];
    keyword.copy_from_slice(&card_bytes[..KEYWORD_LEN]);

    if !keyword.iter().all(|&b| b == b' ' || is_keyword_byte(b)) {
        return Err(Error::InvalidKeyword);
    }

    if &keyword == b"END     " {
        return Ok(Card {
            keyword,
            value: None,
            comment: None,
        });
    }

    let has_indicator = card_bytes[8] == b'=' && card_bytes[9] == b' ';
    if is_commentary_keyword(&keyword) || !has_indicator {
        return Ok(Card {
            keyword,
            value: None,
            comment: free_text(&card_bytes[KEYWORD_LEN..])?,
        });
    }

    let value_field = &card_bytes[10..CARD_SIZE];
    match parse_value(value_field) {
        Some((val, comment)) => Ok(Card {
            keyword,
            value: Some(val),
            comment: comment.map(String::from),
        }),
        None => {
            let field_str = str::from_utf8(value_field).map_err(|_| Error::InvalidHeader)?;
            let (value_text, comment) = field_str.split_once('/').unwrap_or((field_str, ""));
            if !value_text.trim().is_empty() {
                return Err(Error::InvalidValue);
            }
            let comment = comment.trim();
            Ok(Card {
                keyword,
                value: None,
                comment: (!comment.is_empty()).then(|| String::from(comment)),
            })
        }
    }
}

/// Parse consecutive 2880-byte header blocks until the END card is found.
///
/// The END card is included in the returned list. Trailing bytes shorter
/// than a full block are ignored.
pub fn parse_header_blocks(data: &[u8]) -> Result<Vec<Card>> {
    if data.len() < BLOCK_SIZE {
        return Err(Error::UnexpectedEof);
    }

    let mut cards = Vec::new();
    let num_cards = (data.len() / BLOCK_SIZE) * CARDS_PER_BLOCK;

    for card_idx in 0..num_cards {
        let start = card_idx * CARD_SIZE;
        let card_bytes: &[u8; CARD_SIZE] = data[start..start + CARD_SIZE]
            .try_into()
            .map_err(|_| Error::InvalidHeader)?;

        let card = parse_card(card_bytes)?;
        let is_end = card.is_end();
        cards.push(card);

        if is_end {
            return Ok(cards);
        }
    }

    Err(Error::UnexpectedEof)
}

// ── Writing ──

/// Serialize a [`Card`] into an 80-byte FITS card image.
///
/// Comments that do not fit in the remaining columns are cut.
pub fn format_card(card: &Card) -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..KEYWORD_LEN].copy_from_slice(&card.keyword);

    if let Some(ref value) = card.value {
        buf[8] = b'=';
        buf[9] = b' ';

        let mut field = format_value(value);
        if let Some(ref comment) = card.comment {
            insert_comment(&mut field, comment);
        }
        buf[10..CARD_SIZE].copy_from_slice(&field);
    } else if let Some(ref comment) = card.comment {
        let bytes = comment.as_bytes();
        let len = bytes.len().min(MAX_COMMENTARY_LEN);
        buf[KEYWORD_LEN..KEYWORD_LEN + len].copy_from_slice(&bytes[..len]);
    }

    buf
}

/// End of the value's text within a formatted value field.
fn content_end(field: &[u8; VALUE_FIELD_LEN]) -> usize {
    if field[0] == b'\'' {
        let mut i = 1;
        loop {
            if i >= VALUE_FIELD_LEN {
                break i;
            }
            if field[i] == b'\'' {
                if i + 1 < VALUE_FIELD_LEN && field[i + 1] == b'\'' {
                    i += 2;
                } else {
                    break i + 1;
                }
            } else {
                i += 1;
            }
        }
    } else {
        field
            .iter()
            .rposition(|&b| b != b' ')
            .map(|i| i + 1)
            .unwrap_or(0)
            .max(20)
    }
}

/// Where the comment text starts, after a space and the `/ ` separator.
/// `None` if no comment character fits.
fn comment_start(field: &[u8; VALUE_FIELD_LEN]) -> Option<usize> {
    let start = content_end(field) + 3;
    (start < VALUE_FIELD_LEN).then_some(start)
}

/// Number of comment characters a card holding `value` can carry.
pub fn comment_room(value: &Value) -> usize {
    comment_start(&format_value(value)).map_or(0, |start| VALUE_FIELD_LEN - start)
}

/// Insert a ` / comment` string into a value field after its content.
fn insert_comment(field: &mut [u8; VALUE_FIELD_LEN], comment: &str) {
    let Some(start) = comment_start(field) else {
        return;
    };
    field[start - 2] = b'/';
    field[start - 1] = b' ';

    let comment_bytes = comment.as_bytes();
    let len = comment_bytes.len().min(VALUE_FIELD_LEN - start);
    field[start..start + len].copy_from_slice(&comment_bytes[..len]);
}

/// Create the standard FITS END card.
pub fn format_end_card() -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..3].copy_from_slice(b"END");
    buf
}

/// Serialize header cards into complete FITS header blocks.
///
/// Appends the END card and pads the final block with blanks. The returned
/// length is always a multiple of [`BLOCK_SIZE`].
pub fn serialize_header(cards: &[Card]) -> Vec<u8> {
    let mut buf = vec![HEADER_PAD_BYTE; header_byte_len_for(cards.len() + 1)];

    for (i, card) in cards.iter().enumerate() {
        let offset = i * CARD_SIZE;
        buf[offset..offset + CARD_SIZE].copy_from_slice(&format_card(card));
    }

    let end_offset = cards.len() * CARD_SIZE;
    buf[end_offset..end_offset + CARD_SIZE].copy_from_slice(&format_end_card());

    buf
}

#[cfg(test)]
mod parse_tests {
    use super::*;

    fn make_card(s: &str) -> [u8; CARD_SIZE] {
        let mut buf = [b' '; CARD_SIZE];
        let bytes = s.as_bytes();
        let len = bytes.len().min(CARD_SIZE);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    #[test]
    fn parse_card_string_value() {
        let c = parse_card(&make_card("TELESCOP= 'Hubble  '           / telescope name")).unwrap();
        assert_eq!(c.keyword_str(), "TELESCOP");
        assert_eq!(c.value, Some(Value::String(String::from("Hubble"))));
        assert_eq!(c.comment.as_deref(), Some("telescope name"));
    }

    #[test]
    fn parse_card_integer_value() {
        let c = parse_card(&make_card("BITPIX  =                    16 / bits per pixel")).unwrap();
        assert_eq!(c.value, Some(Value::Integer(16)));
        assert_eq!(c.comment.as_deref(), Some("bits per pixel"));
    }

    #[test]
    fn parse_card_comment_keyword() {
        let c = parse_card(&make_card("COMMENT This is a comment about the FITS file.")).unwrap();
        assert_eq!(c.keyword_str(), "COMMENT");
        assert!(c.value.is_none());
        assert_eq!(
            c.comment.as_deref(),
            Some("This is a comment about the FITS file.")
        );
        assert!(c.is_commentary());
    }

    #[test]
    fn parse_card_history_with_equals_is_still_commentary() {
        let c = parse_card(&make_card("HISTORY = not a value")).unwrap();
        assert!(c.value.is_none());
        assert!(c.is_commentary());
    }

    #[test]
    fn parse_card_blank_keyword() {
        let c = parse_card(&[b' '; CARD_SIZE]).unwrap();
        assert!(c.is_blank());
        assert!(c.is_commentary());
        assert!(c.comment.is_none());
    }

    #[test]
    fn parse_card_end() {
        assert!(parse_card(&make_card("END")).unwrap().is_end());
    }

    #[test]
    fn parse_card_rejects_lowercase_keyword() {
        let card = make_card("bitpix  =                    16");
        assert!(matches!(parse_card(&card), Err(Error::InvalidKeyword)));
    }

    #[test]
    fn parse_card_rejects_special_chars() {
        assert!(parse_card(&make_card("FOO@BAR =                    16")).is_err());
    }

    #[test]
    fn parse_card_empty_value_with_comment() {
        let c = parse_card(&make_card("BLANK   =                      / undefined value")).unwrap();
        assert!(c.value.is_none());
        assert_eq!(c.comment.as_deref(), Some("undefined value"));
    }

    #[test]
    fn parse_card_unreadable_value() {
        let card = make_card("GAIN    =                 1.2.3 / e-/ADU");
        assert!(matches!(parse_card(&card), Err(Error::InvalidValue)));
        let card = make_card("GAIN    =               (1, x)");
        assert!(matches!(parse_card(&card), Err(Error::InvalidValue)));
    }

    #[test]
    fn parse_card_matrix_style_keyword() {
        let c = parse_card(&make_card("CD1_2   =                0.0D0")).unwrap();
        assert_eq!(c.keyword_str(), "CD1_2");
        assert_eq!(c.value, Some(Value::Double(0.0)));
    }

    #[test]
    fn parse_header_no_end_card() {
        let mut block = vec![b' '; BLOCK_SIZE];
        block[..CARD_SIZE].copy_from_slice(&make_card("SIMPLE  =                    T"));
        assert!(matches!(
            parse_header_blocks(&block),
            Err(Error::UnexpectedEof)
        ));
    }

    #[test]
    fn parse_header_too_small() {
        assert!(matches!(
            parse_header_blocks(&[b' '; 100]),
            Err(Error::UnexpectedEof)
        ));
    }

    #[test]
    fn parse_header_spanning_two_blocks() {
        let mut data = vec![b' '; 2 * BLOCK_SIZE];
        for i in 0..CARDS_PER_BLOCK {
            let card = make_card(&alloc::format!("KEY{i:<5}=                     {i}"));
            let start = i * CARD_SIZE;
            data[start..start + CARD_SIZE].copy_from_slice(&card);
        }
        data[BLOCK_SIZE..BLOCK_SIZE + CARD_SIZE].copy_from_slice(&make_card("END"));

        let parsed = parse_header_blocks(&data).unwrap();
        assert_eq!(parsed.len(), CARDS_PER_BLOCK + 1);
        assert!(parsed.last().unwrap().is_end());
    }
}

#[cfg(test)]
mod write_tests {
    use super::*;

    #[test]
    fn format_card_value_indicator_and_position() {
        let buf = format_card(&Card::new("NAXIS", Value::Integer(2), None));
        assert_eq!(&buf[0..10], b"NAXIS   = ");
        assert_eq!(buf[29], b'2');
    }

    #[test]
    fn format_card_with_comment() {
        let card = Card::new(
            "NAXIS",
            Value::Integer(2),
            Some(String::from("number of axes")),
        );
        let buf = format_card(&card);
        let s = str::from_utf8(&buf).unwrap();
        assert!(s.contains("/ number of axes"));
    }

    #[test]
    fn comment_after_string_value_survives_round_trip() {
        let card = Card::new(
            "OBJECT",
            Value::String(String::from("M31")),
            Some(String::from("Andromeda Galaxy")),
        );
        let parsed = parse_card(&format_card(&card)).unwrap();
        assert_eq!(parsed, card);
    }

    #[test]
    fn comment_after_wide_real_is_not_overwritten() {
        let card = Card::new(
            "CRVAL1",
            Value::Double(-1.234_567_890_123_456_7e-300),
            Some(String::from("reference value")),
        );
        let parsed = parse_card(&format_card(&card)).unwrap();
        assert_eq!(parsed, card);
    }

    #[test]
    fn comment_room_depends_on_the_value() {
        assert_eq!(comment_room(&Value::Integer(2)), 47);
        assert_eq!(comment_room(&Value::Double(-1.234_567_890_123_456_7e-100)), 43);
        assert_eq!(comment_room(&Value::String("x".repeat(68))), 0);
        assert_eq!(comment_room(&Value::String("x".repeat(64))), 1);
    }

    #[test]
    fn comment_filling_the_room_survives_round_trip() {
        let comment = "c".repeat(comment_room(&Value::Integer(300)));
        let card = Card::new("EXPTIME", Value::Integer(300), Some(comment));
        let parsed = parse_card(&format_card(&card)).unwrap();
        assert_eq!(parsed, card);
    }

    #[test]
    fn format_commentary_card() {
        let buf = format_card(&Card::commentary("COMMENT", "This is a comment."));
        assert_eq!(&buf[..8], b"COMMENT ");
        assert!(str::from_utf8(&buf[8..])
            .unwrap()
            .starts_with("This is a comment."));
    }

    #[test]
    fn make_keyword_truncates_and_pads() {
        assert_eq!(&make_keyword("ALONGNAME"), b"ALONGNAM");
        assert_eq!(&make_keyword("A"), b"A       ");
    }

    #[test]
    fn end_card_format() {
        let buf = format_end_card();
        assert_eq!(&buf[0..3], b"END");
        assert!(buf[3..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn serialize_header_empty_cards() {
        let header = serialize_header(&[]);
        assert_eq!(header.len(), BLOCK_SIZE);
        assert_eq!(&header[0..3], b"END");
    }

    #[test]
    fn serialize_header_spills_to_two_blocks() {
        let cards: Vec<Card> = (0..36)
            .map(|i| Card::new(&alloc::format!("KEY{i:05}"), Value::Integer(i), None))
            .collect();
        assert_eq!(serialize_header(&cards).len(), 2 * BLOCK_SIZE);
    }

    #[test]
    fn serialize_then_parse() {
        let cards = vec![
            Card::new(
                "SIMPLE",
                Value::Logical(true),
                Some(String::from("conforms to FITS")),
            ),
            Card::new("HELLO", Value::Double(6.5), None),
            Card::commentary("HISTORY", "tFITSUtil"),
        ];
        let parsed = parse_header_blocks(&serialize_header(&cards)).unwrap();

        assert_eq!(parsed.len(), 4);
        assert_eq!(&parsed[..3], &cards[..]);
        assert!(parsed[3].is_end());
    }
}
