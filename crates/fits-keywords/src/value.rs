use alloc::format;
use alloc::string::String;
use alloc::string::ToString;
use core::str;

use crate::block::VALUE_FIELD_LEN;

/// Significant digits needed to round-trip any `f32`.
const SINGLE_PRECISION_DIGITS: usize = 9;

/// Width of the fixed-format numeric column (card columns 11-30).
const FIXED_WIDTH: usize = 20;

/// A FITS header card value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// FITS logical value (`T` or `F`).
    Logical(bool),
    /// FITS integer value.
    Integer(i64),
    /// Single-precision real, written with an `E` exponent.
    Float(f32),
    /// Double-precision real, written with a `D` exponent.
    Double(f64),
    /// FITS character string (content between single quotes).
    String(String),
    /// FITS complex integer `(real, imaginary)`.
    ComplexInt(i64, i64),
    /// FITS complex float `(real, imaginary)`.
    ComplexFloat(f64, f64),
}

/// Split a value field at the ` /` comment separator.
///
/// Writers such as IDL omit the space after the slash, so ` /` alone is
/// accepted.
fn split_comment(field: &[u8]) -> (&[u8], Option<&str>) {
    let len = field.len();
    let mut i = 0;
    while i + 1 < len {
        if field[i] == b' ' && field[i + 1] == b'/' {
            let value_part = &field[..i];
            let mut comment_start = i + 2;
            if comment_start < len && field[comment_start] == b' ' {
                comment_start += 1;
            }
            let comment = str::from_utf8(&field[comment_start..])
                .ok()
                .map(|s| s.trim_end());
            return (value_part, comment.filter(|s| !s.is_empty()));
        }
        i += 1;
    }
    (field, None)
}

/// Parse a quoted string value. Doubled quotes decode to one quote; trailing
/// blanks are insignificant.
fn parse_string(field: &[u8]) -> Option<(Value, Option<&str>)> {
    if field.first() != Some(&b'\'') {
        return None;
    }

    let mut value = String::new();
    let mut i = 1;
    let len = field.len();

    loop {
        if i >= len {
            // Unterminated string: keep what we have.
            break;
        }
        if field[i] == b'\'' {
            if i + 1 < len && field[i + 1] == b'\'' {
                value.push('\'');
                i += 2;
            } else {
                i += 1;
                break;
            }
        } else {
            value.push(field[i] as char);
            i += 1;
        }
    }

    let trimmed = value.trim_end().to_string();
    let (_, comment) = split_comment(&field[i..]);
    Some((Value::String(trimmed), comment))
}

fn parse_complex(text: &str) -> Option<Value> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    let (left, right) = inner.split_once(',')?;
    let (left, right) = (left.trim(), right.trim());

    if !left.contains('.') && !right.contains('.') {
        if let (Ok(re), Ok(im)) = (left.parse::<i64>(), right.parse::<i64>()) {
            return Some(Value::ComplexInt(re, im));
        }
    }

    let re = parse_double_str(left)?;
    let im = parse_double_str(right)?;
    Some(Value::ComplexFloat(re, im))
}

/// Parse a float string, handling FITS `D` exponent notation.
fn parse_double_str(s: &str) -> Option<f64> {
    let normalized = s.replace(['D', 'd'], "E");
    normalized.parse::<f64>().ok()
}

/// Count the significant digits of a real literal's mantissa.
fn significant_digits(text: &str) -> usize {
    let mantissa = text.split(['E', 'e', 'D', 'd']).next().unwrap_or("");
    let digits = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .skip_while(|&b| b == b'0');
    let mut count = 0;
    let mut pending_zeros = 0;
    for b in digits {
        if b == b'0' {
            pending_zeros += 1;
        } else {
            count += pending_zeros + 1;
            pending_zeros = 0;
        }
    }
    count
}

/// Parse a real literal. A `D` exponent, or more digits than a single-precision
/// value can carry, makes it a [`Value::Double`].
fn parse_real(text: &str) -> Option<Value> {
    let value = parse_double_str(text)?;
    let is_double =
        text.contains(['D', 'd']) || significant_digits(text) > SINGLE_PRECISION_DIGITS;
    if is_double {
        Some(Value::Double(value))
    } else {
        let normalized = text.replace(['D', 'd'], "E");
        normalized.parse::<f32>().ok().map(Value::Float)
    }
}

/// Parse a FITS header value from the 70-byte value portion of an 80-byte
/// card (bytes 10..80).
///
/// Returns the parsed [`Value`] and an optional comment. The caller checks the
/// `= ` value indicator first.
pub fn parse_value(value_bytes: &[u8]) -> Option<(Value, Option<&str>)> {
    let start = value_bytes.iter().position(|&b| b != b' ')?;
    if value_bytes[start] == b'\'' {
        return parse_string(&value_bytes[start..]);
    }

    let (val_part, comment) = split_comment(value_bytes);
    let val_text = str::from_utf8(val_part).ok()?.trim();
    if val_text.is_empty() {
        return None;
    }

    match val_text {
        "T" => return Some((Value::Logical(true), comment)),
        "F" => return Some((Value::Logical(false), comment)),
        _ => {}
    }

    if val_text.starts_with('(') {
        return parse_complex(val_text).map(|v| (v, comment));
    }

    if !val_text.contains(['.', 'E', 'e', 'D', 'd']) {
        if let Ok(n) = val_text.parse::<i64>() {
            return Some((Value::Integer(n), comment));
        }
    }

    parse_real(val_text).map(|v| (v, comment))
}

/// Serialize a [`Value`] into the 70-byte value field of a card.
///
/// Numeric and logical values are right-justified in the first 20 bytes
/// (columns 11-30 of the card). A double whose shortest round-trip form is
/// wider than that starts at byte 0 instead. Strings start at byte 0 with a
/// quote.
///
/// FITS has no literal for NaN or infinities; callers must not pass them.
pub fn format_value(value: &Value) -> [u8; VALUE_FIELD_LEN] {
    let mut buf = [b' '; VALUE_FIELD_LEN];

    match value {
        Value::Logical(b) => {
            buf[FIXED_WIDTH - 1] = if *b { b'T' } else { b'F' };
        }
        Value::Integer(n) => {
            right_justify(n.to_string().as_bytes(), &mut buf[..FIXED_WIDTH]);
        }
        Value::Float(f) => {
            let s = format_single(*f, FIXED_WIDTH);
            right_justify(s.as_bytes(), &mut buf[..FIXED_WIDTH]);
        }
        Value::Double(f) => {
            let s = format_double(*f, VALUE_FIELD_LEN);
            if s.len() <= FIXED_WIDTH {
                right_justify(s.as_bytes(), &mut buf[..FIXED_WIDTH]);
            } else {
                // Wider than the fixed column: free format, full precision.
                buf[..s.len()].copy_from_slice(s.as_bytes());
            }
        }
        Value::String(s) => write_string(s, &mut buf),
        Value::ComplexInt(re, im) => {
            let s = format!("({re}, {im})");
            right_justify(s.as_bytes(), &mut buf[..30]);
        }
        Value::ComplexFloat(re, im) => {
            let s = format!(
                "({}, {})",
                format_double(*re, FIXED_WIDTH),
                format_double(*im, FIXED_WIDTH)
            );
            right_justify(s.as_bytes(), &mut buf[..50]);
        }
    }

    buf
}

fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest.fill(b' ');
    dest[start..start + len].copy_from_slice(&src[..len]);
}

/// Make sure a formatted real carries a decimal point before its exponent,
/// so it can never be mistaken for an integer.
fn with_decimal_point(mut s: String) -> String {
    if let Some(pos) = s.find('E') {
        if !s[..pos].contains('.') {
            s.insert_str(pos, ".0");
        }
    }
    s
}

/// Shortest round-trip representation of `f`, `E` exponent.
fn format_single(f: f32, max_len: usize) -> String {
    let s = with_decimal_point(format!("{f:E}"));
    if s.len() <= max_len {
        return s;
    }
    let mut precision = SINGLE_PRECISION_DIGITS - 1;
    loop {
        let s = format!("{f:.precision$E}");
        if s.len() <= max_len || precision == 0 {
            return s;
        }
        precision -= 1;
    }
}

/// Shortest round-trip representation of `f`, `D` exponent.
fn format_double(f: f64, max_len: usize) -> String {
    let mut s = with_decimal_point(format!("{f:E}"));
    if s.len() > max_len {
        let mut precision = 16usize;
        loop {
            s = format!("{f:.precision$E}");
            if s.len() <= max_len || precision == 0 {
                break;
            }
            precision -= 1;
        }
    }
    s.replace('E', "D")
}

fn write_string(s: &str, buf: &mut [u8; VALUE_FIELD_LEN]) {
    let last = VALUE_FIELD_LEN - 1;
    let mut pos = 0;
    buf[pos] = b'\'';
    pos += 1;

    for ch in s.bytes() {
        if pos >= last {
            break;
        }
        if ch == b'\'' {
            if pos + 1 >= last {
                break;
            }
            buf[pos] = b'\'';
            buf[pos + 1] = b'\'';
            pos += 2;
        } else {
            buf[pos] = ch;
            pos += 1;
        }
    }

    // Strings are padded to at least 8 characters between the quotes.
    while pos < 9 {
        buf[pos] = b' ';
        pos += 1;
    }

    buf[pos] = b'\'';
}
