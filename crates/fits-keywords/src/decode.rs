//! Card list → record.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use log::{debug, warn};

use crate::card::Card;
use crate::keywords::KeywordList;
use crate::mangle::{classify, KeywordClass, NAXIS};
use crate::record::{ArrayValue, Field, FieldValue, Record};
use crate::typemap::{array_from_cards, scalar_from_card};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey<'a> {
    Vector(&'a str),
    Matrix(&'a str),
}

/// Element cards sharing one base name. Vector elements use column 1.
struct Group<'a> {
    first: usize,
    cells: Vec<(usize, usize, &'a Card)>,
}

enum Resolution {
    /// The group becomes one array field, emitted at the group's first card.
    Field { first: usize, field: Option<Field> },
    /// The cards do not form an array; each is decoded as a scalar.
    Decayed,
}

/// Cards before END must start with `SIMPLE` or `XTENSION`, and nothing may
/// follow the END card.
fn is_well_formed(cards: &[Card]) -> bool {
    let Some(first) = cards.first() else {
        return false;
    };
    if !matches!(first.keyword_str(), "SIMPLE" | "XTENSION") {
        return false;
    }
    match cards.iter().position(Card::is_end) {
        Some(end) => end == cards.len() - 1,
        None => true,
    }
}

fn group_key(card: &Card) -> Option<(GroupKey<'_>, usize, usize)> {
    match classify(card.keyword_str()) {
        KeywordClass::Plain => None,
        KeywordClass::Indexed { base, index } => Some((GroupKey::Vector(base), index, 1)),
        KeywordClass::Matrix { base, row, col } => Some((GroupKey::Matrix(base), row, col)),
    }
}

/// Cards that can become fields: valued, non-commentary.
fn field_cards(cards: &[Card]) -> impl Iterator<Item = (usize, &Card, &Value)> {
    cards
        .iter()
        .take_while(|c| !c.is_end())
        .enumerate()
        .filter(|(_, c)| !c.is_commentary())
        .filter_map(|(pos, c)| c.value.as_ref().map(|v| (pos, c, v)))
}

fn field_comment(card: &Card) -> String {
    card.comment.clone().unwrap_or_default()
}

fn resolve_vector(base: &str, group: &mut Group<'_>) -> Option<Field> {
    group.cells.sort_by_key(|&(index, _, _)| index);
    let n = group.cells.len();
    let contiguous = group
        .cells
        .iter()
        .enumerate()
        .all(|(i, &(index, _, _))| index == i + 1);
    if !contiguous || (n < 2 && base != NAXIS) {
        return None;
    }

    let values: Vec<Option<&Value>> = group.cells.iter().map(|(_, _, c)| c.value.as_ref()).collect();
    let data = array_from_cards(&values)?;
    Some(Field {
        name: base.to_ascii_lowercase(),
        value: FieldValue::Array(ArrayValue::vector(data)),
        comment: String::new(),
    })
}

fn resolve_matrix(base: &str, group: &Group<'_>) -> Option<Field> {
    if group.cells.len() < 2 {
        return None;
    }
    let rows = group.cells.iter().map(|&(r, _, _)| r).max()?;
    let cols = group.cells.iter().map(|&(_, c, _)| c).max()?;
    let size = rows.checked_mul(cols)?;
    // Mostly-empty grids are more likely unrelated keywords than a matrix.
    if group.cells.len() * 2 < size {
        return None;
    }

    let mut values: Vec<Option<&Value>> = vec![None; size];
    for &(row, col, card) in &group.cells {
        let slot = &mut values[(row - 1) * cols + (col - 1)];
        if slot.is_some() {
            return None;
        }
        *slot = card.value.as_ref();
    }

    let data = array_from_cards(&values)?;
    Some(Field {
        name: base.to_ascii_lowercase(),
        value: FieldValue::Array(ArrayValue::new(vec![rows, cols], data)?),
        comment: String::new(),
    })
}

fn emit(out: &mut Record, ignore: &[&str], field: Field) {
    if ignore.iter().any(|i| i.eq_ignore_ascii_case(&field.name)) {
        return;
    }
    if out.contains(&field.name) {
        debug!("field '{}' already defined, skipping card", field.name);
        return;
    }
    let Field {
        name,
        value,
        comment,
    } = field;
    out.define_with_comment(&name, value, &comment);
}

fn emit_scalar(out: &mut Record, ignore: &[&str], card: &Card, value: &Value) {
    match scalar_from_card(value) {
        Some(scalar) => emit(
            out,
            ignore,
            Field {
                name: card.keyword_str().to_ascii_lowercase(),
                value: FieldValue::Scalar(scalar),
                comment: field_comment(card),
            },
        ),
        None => debug!("'{}' has no record representation, skipping", card.keyword_str()),
    }
}

/// Rebuild record fields from `list` into `out`.
///
/// Element cards (`NAME1..NAMEn`, `NAr_c`) are regrouped into vectors and
/// matrices; everything else becomes a scalar field named by the lower-cased
/// keyword. COMMENT, HISTORY and value-less cards are skipped, as are fields
/// whose name is in `ignore` (case-insensitive). Fields already present in
/// `out` are left alone.
///
/// Returns `false` only when the list itself is malformed, in which case `out`
/// is not touched.
pub fn get_keywords(out: &mut Record, list: &KeywordList, ignore: &[&str]) -> bool {
    let cards = list.cards();
    if !is_well_formed(cards) {
        warn!("card list does not start with SIMPLE or XTENSION, or has cards after END");
        return false;
    }

    let mut groups: BTreeMap<GroupKey<'_>, Group<'_>> = BTreeMap::new();
    for (pos, card, _) in field_cards(cards) {
        if let Some((key, row, col)) = group_key(card) {
            groups
                .entry(key)
                .or_insert_with(|| Group {
                    first: pos,
                    cells: Vec::new(),
                })
                .cells
                .push((row, col, card));
        }
    }

    let mut resolved: BTreeMap<GroupKey<'_>, Resolution> = BTreeMap::new();
    for (key, mut group) in groups {
        let field = match key {
            GroupKey::Vector(base) => resolve_vector(base, &mut group),
            GroupKey::Matrix(base) => resolve_matrix(base, &group),
        };
        let resolution = match field {
            Some(mut field) => {
                field.comment = field_comment(&cards[group.first]);
                Resolution::Field {
                    first: group.first,
                    field: Some(field),
                }
            }
            None => Resolution::Decayed,
        };
        resolved.insert(key, resolution);
    }

    // The axis count card is folded into the NAXIS vector and carries its comment.
    let naxis_grouped = match resolved.get_mut(&GroupKey::Vector(NAXIS)) {
        Some(Resolution::Field { field, .. }) => {
            let count = field_cards(cards).find(|(_, c, _)| c.keyword_str() == NAXIS);
            if let (Some(field), Some((_, count, _))) = (field.as_mut(), count) {
                if field.comment.is_empty() {
                    field.comment = field_comment(count);
                }
            }
            true
        }
        _ => false,
    };

    for (pos, card, value) in field_cards(cards) {
        let Some((key, _, _)) = group_key(card) else {
            if naxis_grouped && card.keyword_str() == NAXIS {
                continue;
            }
            emit_scalar(out, ignore, card, value);
            continue;
        };
        match resolved.get_mut(&key) {
            Some(Resolution::Field { first, field }) => {
                if *first == pos {
                    if let Some(field) = field.take() {
                        emit(out, ignore, field);
                    }
                }
            }
            Some(Resolution::Decayed) | None => emit_scalar(out, ignore, card, value),
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DataType, ElementKind};

    fn list_of(cards: Vec<Card>) -> KeywordList {
        let mut list = KeywordList::new();
        for card in cards {
            list.push(card);
        }
        list
    }

    fn int(kw: &str, n: i64) -> Card {
        Card::new(kw, Value::Integer(n), None)
    }

    #[test]
    fn scalars_are_lower_cased() {
        let list = list_of(vec![Card::new(
            "HELLO",
            Value::Double(6.5),
            Some(String::from("A comment for HELLO")),
        )]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert_eq!(out.len(), 1);
        assert_eq!(out.as_double("hello"), Some(6.5));
        assert_eq!(out.comment(0), Some("A comment for HELLO"));
    }

    #[test]
    fn ignore_list_is_case_insensitive() {
        let list = list_of(vec![Card::new("WORLD", Value::Logical(true), None)]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["World", "SIMPLE"]));
        assert!(out.is_empty());
    }

    #[test]
    fn ignore_list_is_not_a_pattern() {
        let list = list_of(vec![int("TARRAY", 1)]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["tarr*", "simple"]));
        assert_eq!(out.as_int("tarray"), Some(1));
    }

    #[test]
    fn naxis_cards_become_one_vector() {
        let list = list_of(vec![
            int("NAXIS", 2),
            int("NAXIS1", 128),
            int("NAXIS2", 64),
        ]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert_eq!(out.len(), 1);
        assert_eq!(out.as_array_int("naxis"), Some(&[128, 64][..]));
    }

    #[test]
    fn naxis_comment_comes_from_count_card() {
        let list = list_of(vec![
            Card::new("NAXIS", Value::Integer(2), Some(String::from("axes"))),
            int("NAXIS1", 4),
            int("NAXIS2", 4),
        ]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert_eq!(out.comment(0), Some("axes"));
    }

    #[test]
    fn single_naxis_axis_is_still_a_vector() {
        let list = list_of(vec![int("NAXIS", 1), int("NAXIS1", 10)]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &[]));
        assert_eq!(out.as_array_int("naxis"), Some(&[10][..]));
    }

    #[test]
    fn lone_indexed_keyword_stays_scalar() {
        let list = list_of(vec![Card::new("CRVAL1", Value::Double(1.5), None)]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert_eq!(out.as_double("crval1"), Some(1.5));
    }

    #[test]
    fn gapped_indices_stay_scalar() {
        let list = list_of(vec![int("TTYPE1", 1), int("TTYPE3", 3)]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert_eq!(out.name(0), Some("ttype1"));
        assert_eq!(out.name(1), Some("ttype3"));
    }

    #[test]
    fn mixed_value_kinds_stay_scalar() {
        let list = list_of(vec![
            Card::new("K1", Value::Logical(true), None),
            int("K2", 2),
        ]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert_eq!(out.as_bool("k1"), Some(true));
        assert_eq!(out.as_int("k2"), Some(2));
    }

    #[test]
    fn matrix_extents_come_from_largest_indices() {
        let list = list_of(vec![
            Card::new("MA1_1", Value::Double(1.0), Some(String::from("m"))),
            Card::new("MA1_2", Value::Double(2.0), None),
            Card::new("MA2_1", Value::Double(3.0), None),
            Card::new("MA2_2", Value::Double(4.0), None),
        ]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert_eq!(out.shape(0), Some(&[2usize, 2][..]));
        assert_eq!(out.as_array_double("ma"), Some(&[1.0, 2.0, 3.0, 4.0][..]));
        assert_eq!(out.comment(0), Some("m"));
    }

    #[test]
    fn wcs_matrix_keywords_stay_scalar() {
        let list = list_of(vec![
            Card::new("CD1_1", Value::Double(1.0), None),
            Card::new("CD1_2", Value::Double(0.0), None),
        ]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert_eq!(out.as_double("cd1_1"), Some(1.0));
        assert_eq!(out.data_type(1), Some(DataType::Scalar(ElementKind::Double)));
    }

    #[test]
    fn commentary_cards_are_not_fields() {
        let list = list_of(vec![
            Card::commentary("COMMENT", "hello"),
            Card::commentary("HISTORY", "world"),
        ]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert!(out.is_empty());
    }

    #[test]
    fn complex_cards_are_skipped() {
        let list = list_of(vec![Card::new("Z", Value::ComplexInt(1, 2), None)]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert!(out.is_empty());
    }

    #[test]
    fn first_definition_wins() {
        let list = list_of(vec![int("A", 1), int("A", 2)]);
        let mut out = Record::new();
        out.define("a", 0i32);
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert_eq!(out.as_int("a"), Some(0));
    }

    #[test]
    fn field_order_follows_first_card() {
        let list = list_of(vec![
            Card::new("V1", Value::Float(1.0), None),
            int("X", 0),
            Card::new("V2", Value::Float(2.0), None),
        ]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &["simple"]));
        assert_eq!(out.name(0), Some("v"));
        assert_eq!(out.name(1), Some("x"));
        assert_eq!(
            out.value(0).map(FieldValue::data_type),
            Some(DataType::Array(ElementKind::Double))
        );
    }

    #[test]
    fn malformed_lists_are_rejected() {
        let mut out = Record::new();
        assert!(!get_keywords(&mut out, &KeywordList::empty(), &[]));

        let headless = KeywordList::from(vec![int("BITPIX", 8)]);
        assert!(!get_keywords(&mut out, &headless, &[]));

        let mut trailing = KeywordList::new();
        trailing.push(Card {
            keyword: crate::card::make_keyword("END"),
            value: None,
            comment: None,
        });
        trailing.push(int("LATE", 1));
        assert!(!get_keywords(&mut out, &trailing, &[]));
        assert!(out.is_empty());
    }

    #[test]
    fn xtension_lists_are_accepted() {
        let list = KeywordList::from(vec![
            Card::new("XTENSION", Value::String(String::from("IMAGE")), None),
            int("BITPIX", 8),
        ]);
        let mut out = Record::new();
        assert!(get_keywords(&mut out, &list, &[]));
        assert_eq!(out.as_string("xtension"), Some("IMAGE"));
        assert!(matches!(out.value(1), Some(FieldValue::Scalar(_))));
    }
}
