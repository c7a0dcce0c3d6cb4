//! Record → card list.

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use log::{debug, warn};

use crate::card::{comment_room, Card};
use crate::keywords::KeywordList;
use crate::mangle::{mangle, NamingIssue};
use crate::record::{ElementKind, Field, FieldValue, Record, Scalar};
use crate::typemap::{card_value, card_values, comment_text, commentary_text, TypeIssue};
use crate::value::Value;

/// Why a field was not written losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldIssue {
    Naming(NamingIssue),
    Type(TypeIssue),
    /// The field comment was cut or cleaned to fit its card.
    Comment(TypeIssue),
    /// A card name was already taken by an earlier card; that card was skipped.
    Collision,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::Naming(NamingIssue::EmptyName) => write!(f, "empty field name"),
            FieldIssue::Naming(NamingIssue::InvalidCharacters) => {
                write!(f, "name has characters a keyword cannot hold")
            }
            FieldIssue::Naming(NamingIssue::NameTooLong) => {
                write!(f, "name truncated to fit the element index")
            }
            FieldIssue::Naming(NamingIssue::IndexTooLong) => {
                write!(f, "element index does not fit in 8 characters")
            }
            FieldIssue::Naming(NamingIssue::EmptyArray) => write!(f, "array has no elements"),
            FieldIssue::Naming(NamingIssue::TooManyDimensions) => {
                write!(f, "more than 2 dimensions, written as a vector")
            }
            FieldIssue::Type(TypeIssue::TextTruncated) => {
                write!(f, "string value truncated to 68 characters")
            }
            FieldIssue::Type(TypeIssue::NonAsciiText) => {
                write!(f, "non-ASCII characters replaced")
            }
            FieldIssue::Type(TypeIssue::Unsupported(kind)) => {
                write!(f, "{kind:?} values cannot be written to a card")
            }
            FieldIssue::Type(TypeIssue::NestedRecord) => {
                write!(f, "nested records cannot be written to a card")
            }
            FieldIssue::Type(TypeIssue::NonFinite) => {
                write!(f, "NaN and infinite reals cannot be written to a card")
            }
            FieldIssue::Comment(TypeIssue::TextTruncated) => {
                write!(f, "comment truncated to fit the card")
            }
            FieldIssue::Comment(TypeIssue::NonAsciiText) => {
                write!(f, "non-ASCII characters replaced in comment")
            }
            FieldIssue::Comment(issue) => write!(f, "comment not written: {issue:?}"),
            FieldIssue::Collision => write!(f, "card name already in use"),
        }
    }
}

/// A fresh card list holding the mandatory `SIMPLE = T` card.
pub fn make_keyword_list() -> KeywordList {
    KeywordList::new()
}

/// Append the cards for every field of `record` to `list`.
///
/// Returns `true` only if every field was written without loss. A failing
/// field never stops the conversion: whatever can be written is written, the
/// problem is logged, and the remaining fields are processed.
pub fn add_keywords(list: &mut KeywordList, record: &Record) -> bool {
    let mut used: BTreeSet<String> = list
        .iter()
        .filter(|c| !c.is_commentary() && !c.is_end())
        .map(|c| c.keyword_str().to_string())
        .collect();

    let mut ok = true;
    for field in record {
        if let Err(issue) = encode_field(list, &mut used, field) {
            warn!("keyword field '{}': {}", field.name, issue);
            ok = false;
        }
    }
    ok
}

/// `COMMENT`/`HISTORY` for the fields `add_comment`/`add_history` create.
fn commentary_keyword(name: &str) -> Option<&'static str> {
    let prefix = name.get(..7)?;
    if prefix.eq_ignore_ascii_case("comment") {
        Some("COMMENT")
    } else if prefix.eq_ignore_ascii_case("history") {
        Some("HISTORY")
    } else {
        None
    }
}

/// Write one field. `Err` reports a loss; some cards may still have been
/// written.
fn encode_field(
    list: &mut KeywordList,
    used: &mut BTreeSet<String>,
    field: &Field,
) -> Result<(), FieldIssue> {
    if let (Some(keyword), FieldValue::Scalar(Scalar::String(text))) =
        (commentary_keyword(&field.name), &field.value)
    {
        list.push(Card::commentary(keyword, &commentary_text(text)));
        return Ok(());
    }

    let mut integer_kind = false;
    let (values, shape, type_issue): (Vec<Value>, &[usize], _) = match &field.value {
        FieldValue::Record(_) => return Err(FieldIssue::Type(TypeIssue::NestedRecord)),
        FieldValue::Scalar(scalar) => {
            let (value, issue) = card_value(scalar).map_err(FieldIssue::Type)?;
            (alloc::vec![value], &[], issue)
        }
        FieldValue::Array(array) => {
            let (values, issue) = card_values(array.data()).map_err(FieldIssue::Type)?;
            integer_kind = matches!(
                array.data().kind(),
                ElementKind::UChar
                    | ElementKind::Short
                    | ElementKind::Int
                    | ElementKind::UInt
                    | ElementKind::Int64
            );
            (values, array.shape(), issue)
        }
    };

    let (mut names, naming_issue) = match mangle(&field.name, shape) {
        Ok(names) => (names, None),
        Err(failure) => (failure.fallback, Some(failure.issue)),
    };
    // Only integer axis lengths get the NAXIS count card.
    if !integer_kind {
        names.count_keyword = None;
    }
    let mut issue = naming_issue
        .map(FieldIssue::Naming)
        .or(type_issue.map(FieldIssue::Type));

    let mut comment = (!field.comment.is_empty()).then_some(field.comment.as_str());

    if let Some(count_keyword) = names.count_keyword {
        if used.insert(count_keyword.clone()) {
            let count = Value::Integer(values.len() as i64);
            let note = fitted_comment(comment.take(), &count, &mut issue);
            list.push(Card::new(&count_keyword, count, note));
        } else {
            debug!("'{count_keyword}' already written, skipping count card");
            issue.get_or_insert(FieldIssue::Collision);
        }
    }

    for (name, value) in names.names.into_iter().zip(values) {
        let Some(name) = name else { continue };
        if !used.insert(name.clone()) {
            debug!("'{name}' already written, skipping card of '{}'", field.name);
            issue.get_or_insert(FieldIssue::Collision);
            continue;
        }
        let note = fitted_comment(comment.take(), &value, &mut issue);
        list.push(Card::new(&name, value, note));
    }

    match issue {
        None => Ok(()),
        Some(issue) => Err(issue),
    }
}

/// The part of `comment` that fits on a card holding `value`.
fn fitted_comment(
    comment: Option<&str>,
    value: &Value,
    issue: &mut Option<FieldIssue>,
) -> Option<String> {
    let (text, lost) = comment_text(comment?, comment_room(value));
    if let Some(lost) = lost {
        issue.get_or_insert(FieldIssue::Comment(lost));
    }
    (!text.is_empty()).then_some(text)
}
