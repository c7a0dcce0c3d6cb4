//! Conversions between record values and card values.
//!
//! Writing widens every integer kind to the card integer and keeps the
//! precision of reals. Reading narrows card integers back to `Int` when they
//! fit, keeps single/double precision for scalars, and widens any real array
//! to `Double`.

use alloc::string::String;
use alloc::vec::Vec;

use crate::block::{MAX_COMMENTARY_LEN, MAX_STRING_LEN};
use crate::record::{ArrayData, ElementKind, Scalar};
use crate::value::Value;

/// Why a value could not be written to a card unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeIssue {
    /// The text did not fit in a card and was cut.
    TextTruncated,
    /// Characters outside printable ASCII were replaced by `?`.
    NonAsciiText,
    /// Cards cannot hold this element type; nothing is written.
    Unsupported(ElementKind),
    /// NaN or an infinity, which no card literal can express; nothing is
    /// written.
    NonFinite,
    /// A nested record; nothing is written.
    NestedRecord,
}

/// A converted value and the loss, if any, the conversion caused.
pub type Mapped<T> = (T, Option<TypeIssue>);

/// Replace characters a card cannot hold.
fn printable(text: &str) -> (String, bool) {
    let mut clean = true;
    let out = text
        .chars()
        .map(|c| {
            if c == ' ' || c.is_ascii_graphic() {
                c
            } else {
                clean = false;
                '?'
            }
        })
        .collect();
    (out, clean)
}

/// Fit `text` into a string card value.
///
/// Quotes count twice because the card image doubles them.
pub fn fit_text(text: &str) -> Mapped<String> {
    let (mut out, clean) = printable(text);
    let mut issue = (!clean).then_some(TypeIssue::NonAsciiText);

    let mut width = 0;
    let cut = out.char_indices().find_map(|(i, c)| {
        width += if c == '\'' { 2 } else { 1 };
        (width > MAX_STRING_LEN).then_some(i)
    });
    if let Some(cut) = cut {
        out.truncate(cut);
        issue = Some(TypeIssue::TextTruncated);
    }
    (out, issue)
}

/// Fit a field comment into the `room` columns its card leaves free.
///
/// Trailing blanks are dropped since a card cannot carry them.
pub fn comment_text(text: &str, room: usize) -> Mapped<String> {
    let (mut out, clean) = printable(text.trim_end());
    let mut issue = (!clean).then_some(TypeIssue::NonAsciiText);
    if out.len() > room {
        out.truncate(room);
        out.truncate(out.trim_end().len());
        issue = Some(TypeIssue::TextTruncated);
    }
    (out, issue)
}

/// Fit `text` into a COMMENT/HISTORY card. Overlong text is cut silently.
pub fn commentary_text(text: &str) -> String {
    let (mut out, _) = printable(text);
    out.truncate(MAX_COMMENTARY_LEN);
    out
}

/// Convert one record scalar to a card value.
///
/// `Err` means the value has no card representation and is dropped.
pub fn card_value(scalar: &Scalar) -> Result<Mapped<Value>, TypeIssue> {
    let value = match scalar {
        Scalar::Bool(b) => Value::Logical(*b),
        Scalar::UChar(v) => Value::Integer(i64::from(*v)),
        Scalar::Short(v) => Value::Integer(i64::from(*v)),
        Scalar::Int(v) => Value::Integer(i64::from(*v)),
        Scalar::UInt(v) => Value::Integer(i64::from(*v)),
        Scalar::Int64(v) => Value::Integer(*v),
        Scalar::Float(v) if v.is_finite() => Value::Float(*v),
        Scalar::Double(v) if v.is_finite() => Value::Double(*v),
        Scalar::Float(_) | Scalar::Double(_) => return Err(TypeIssue::NonFinite),
        Scalar::String(s) => {
            let (text, issue) = fit_text(s);
            return Ok((Value::String(text), issue));
        }
        Scalar::Complex(_) | Scalar::DComplex(_) => {
            return Err(TypeIssue::Unsupported(scalar.kind()));
        }
    };
    Ok((value, None))
}

/// Convert every element of an array, in storage order.
///
/// The whole array is rejected when its element type is unsupported.
pub fn card_values(data: &ArrayData) -> Result<Mapped<Vec<Value>>, TypeIssue> {
    if matches!(data, ArrayData::Complex(_) | ArrayData::DComplex(_)) {
        return Err(TypeIssue::Unsupported(data.kind()));
    }
    let mut issue = None;
    let mut values = Vec::with_capacity(data.len());
    for scalar in (0..data.len()).filter_map(|i| data.get(i)) {
        let (value, lost) = card_value(&scalar)?;
        issue = issue.or(lost);
        values.push(value);
    }
    Ok((values, issue))
}

/// Narrow a card integer to `Int` when it fits.
fn integer_scalar(n: i64) -> Scalar {
    match i32::try_from(n) {
        Ok(v) => Scalar::Int(v),
        Err(_) => Scalar::Int64(n),
    }
}

/// Reconstruct a record scalar from a card value. Complex values have no
/// record counterpart and yield `None`.
pub fn scalar_from_card(value: &Value) -> Option<Scalar> {
    match value {
        Value::Logical(b) => Some(Scalar::Bool(*b)),
        Value::Integer(n) => Some(integer_scalar(*n)),
        Value::Float(f) => Some(Scalar::Float(*f)),
        Value::Double(f) => Some(Scalar::Double(*f)),
        Value::String(s) => Some(Scalar::String(s.clone())),
        Value::ComplexInt(..) | Value::ComplexFloat(..) => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Family {
    Logical,
    Text,
    Integer,
    Real,
}

fn family(value: &Value) -> Option<Family> {
    match value {
        Value::Logical(_) => Some(Family::Logical),
        Value::String(_) => Some(Family::Text),
        Value::Integer(_) => Some(Family::Integer),
        Value::Float(_) | Value::Double(_) => Some(Family::Real),
        Value::ComplexInt(..) | Value::ComplexFloat(..) => None,
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Integer(n) => *n as f64,
        Value::Float(f) => f64::from(*f),
        Value::Double(f) => *f,
        _ => 0.0,
    }
}

/// Reconstruct array elements from per-element card values.
///
/// `None` entries are positions without a card and take the element type's
/// zero value. Returns `None` if no value is present or the values do not
/// share one element family. Any real makes the whole array `Double`.
pub fn array_from_cards(values: &[Option<&Value>]) -> Option<ArrayData> {
    let mut common: Option<Family> = None;
    for value in values.iter().flatten() {
        let f = family(value)?;
        common = Some(match (common, f) {
            (None, f) => f,
            (Some(a), b) if a == b => a,
            (Some(Family::Integer), Family::Real) | (Some(Family::Real), Family::Integer) => {
                Family::Real
            }
            _ => return None,
        });
    }

    let data = match common? {
        Family::Logical => ArrayData::Bool(
            values
                .iter()
                .map(|v| matches!(v, Some(Value::Logical(true))))
                .collect(),
        ),
        Family::Text => ArrayData::String(
            values
                .iter()
                .map(|v| match v {
                    Some(Value::String(s)) => s.clone(),
                    _ => String::new(),
                })
                .collect(),
        ),
        Family::Integer => {
            let ints: Vec<i64> = values
                .iter()
                .map(|v| match v {
                    Some(Value::Integer(n)) => *n,
                    _ => 0,
                })
                .collect();
            let narrowed: Option<Vec<i32>> =
                ints.iter().map(|&n| i32::try_from(n).ok()).collect();
            match narrowed {
                Some(v) => ArrayData::Int(v),
                None => ArrayData::Int64(ints),
            }
        }
        Family::Real => {
            ArrayData::Double(values.iter().map(|v| v.map_or(0.0, as_f64)).collect())
        }
    };
    Some(data)
}
