//! Keyword name derivation under the 8-character budget.
//!
//! [`mangle`] maps a field name and shape to the card names that hold the
//! field; [`classify`] is its inverse, used by the decoder to regroup element
//! cards into arrays.
//!
//! | shape        | card names                         |
//! |--------------|------------------------------------|
//! | scalar       | `HELLO`                            |
//! | `[n]`        | `TARRAY1` .. `TARRAYn`             |
//! | `[r, c]`     | `MA1_1`, `MA1_2`, .., `MAr_c`      |
//! | `[a, b, ..]` | flattened, then named as `[a*b*..]`|
//! | `naxis` `[n]`| `NAXIS` (= n), `NAXIS1` .. `NAXISn`|

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::block::KEYWORD_LEN;
use crate::card::is_keyword_byte;

/// Matrix keywords keep at most this many characters of the field name.
pub const MATRIX_BASE_LEN: usize = 2;

/// WCS keyword families spelled like matrix elements that are ordinary
/// scalar keywords (`CD1_1`, `PC2_1`, `PV1_3`, ...).
const RESERVED_MATRIX_FAMILIES: [&str; 4] = ["CD", "PC", "PV", "PS"];

/// Keyword of the axis-count card.
pub const NAXIS: &str = "NAXIS";

/// Card names for one field, one entry per element in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSet {
    /// Extra leading card holding the element count (`NAXIS`).
    pub count_keyword: Option<String>,
    /// `None` marks an element whose name does not fit in 8 characters.
    pub names: Vec<Option<String>>,
}

impl NameSet {
    fn scalar(name: String) -> Self {
        NameSet {
            count_keyword: None,
            names: alloc::vec![Some(name)],
        }
    }

    fn empty() -> Self {
        NameSet {
            count_keyword: None,
            names: Vec::new(),
        }
    }
}

/// Why a field could not be named losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingIssue {
    /// The field name has no characters at all.
    EmptyName,
    /// Characters outside `A-Z 0-9 - _` were replaced by `_`.
    InvalidCharacters,
    /// The array or matrix base had to be truncated.
    NameTooLong,
    /// Some element indices do not fit next to the base; those elements are dropped.
    IndexTooLong,
    /// Zero-element arrays have no cards.
    EmptyArray,
    /// Rank 3 or more; the array was flattened to a vector.
    TooManyDimensions,
}

/// A naming problem, with the names the encoder writes anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingFailure {
    pub issue: NamingIssue,
    pub fallback: NameSet,
}

/// Number of decimal digits in `n`.
pub fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

/// Upper-case `name`, replacing characters a keyword cannot hold.
///
/// Returns the keyword text and whether it was clean.
fn sanitize(name: &str) -> (String, bool) {
    let mut clean = true;
    let keyword = name
        .chars()
        .map(|c| {
            let up = c.to_ascii_uppercase();
            if up.is_ascii() && is_keyword_byte(up as u8) {
                up
            } else {
                clean = false;
                '_'
            }
        })
        .collect();
    (keyword, clean)
}

fn note(issue: &mut Option<NamingIssue>, found: NamingIssue) {
    issue.get_or_insert(found);
}

/// Derive the card names of a field called `name` with the given shape
/// (empty for scalars).
///
/// Scalar names longer than 8 characters are truncated without error. Every
/// other loss is reported as a [`NamingFailure`] carrying the best-effort
/// names.
pub fn mangle(name: &str, shape: &[usize]) -> Result<NameSet, NamingFailure> {
    let (base, clean) = sanitize(name);
    if base.is_empty() {
        return Err(NamingFailure {
            issue: NamingIssue::EmptyName,
            fallback: NameSet::empty(),
        });
    }

    let mut issue = None;
    if shape.len() > 2 {
        note(&mut issue, NamingIssue::TooManyDimensions);
    }
    if !clean {
        note(&mut issue, NamingIssue::InvalidCharacters);
    }

    let names = match shape {
        [] => NameSet::scalar(truncate(&base, KEYWORD_LEN)),
        [n] if base == NAXIS => NameSet {
            count_keyword: Some(String::from(NAXIS)),
            names: indexed_names(NAXIS, *n, &mut issue),
        },
        [n] => vector_names(&base, *n, &mut issue),
        [rows, cols] => matrix_names(&base, *rows, *cols, &mut issue),
        _ => vector_names(&base, shape.iter().product(), &mut issue),
    };

    match issue {
        None => Ok(names),
        Some(issue) => Err(NamingFailure {
            issue,
            fallback: names,
        }),
    }
}

fn truncate(s: &str, len: usize) -> String {
    // Sanitized keywords are pure ASCII, so byte slicing is safe.
    String::from(&s[..s.len().min(len)])
}

fn indexed_names(stem: &str, n: usize, issue: &mut Option<NamingIssue>) -> Vec<Option<String>> {
    if n == 0 {
        note(issue, NamingIssue::EmptyArray);
    }
    let names: Vec<Option<String>> = (1..=n)
        .map(|i| {
            let name = format!("{stem}{i}");
            (name.len() <= KEYWORD_LEN).then_some(name)
        })
        .collect();
    if names.iter().any(Option::is_none) {
        note(issue, NamingIssue::IndexTooLong);
    }
    names
}

/// Base length left beside the widest index of an `n`-element vector.
///
/// Never below one character, even when the index alone fills the keyword.
fn vector_budget(n: usize) -> usize {
    KEYWORD_LEN.saturating_sub(digits(n)).max(1)
}

fn vector_names(base: &str, n: usize, issue: &mut Option<NamingIssue>) -> NameSet {
    let budget = vector_budget(n);
    if base.len() > budget {
        note(issue, NamingIssue::NameTooLong);
    }
    NameSet {
        count_keyword: None,
        names: indexed_names(&truncate(base, budget), n, issue),
    }
}

fn matrix_names(base: &str, rows: usize, cols: usize, issue: &mut Option<NamingIssue>) -> NameSet {
    if base.len() > MATRIX_BASE_LEN {
        note(issue, NamingIssue::NameTooLong);
    }
    if rows * cols == 0 {
        note(issue, NamingIssue::EmptyArray);
    }
    let stem = truncate(base, MATRIX_BASE_LEN);

    let mut names = Vec::with_capacity(rows * cols);
    for row in 1..=rows {
        for col in 1..=cols {
            let name = format!("{stem}{row}_{col}");
            names.push((name.len() <= KEYWORD_LEN).then_some(name));
        }
    }
    if names.iter().any(Option::is_none) {
        note(issue, NamingIssue::IndexTooLong);
    }
    NameSet {
        count_keyword: None,
        names,
    }
}

// ── Inverse ──

/// How the decoder reads a keyword name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass<'a> {
    /// A standalone scalar keyword.
    Plain,
    /// Element `index` (1-based) of a vector named `base`.
    Indexed { base: &'a str, index: usize },
    /// Element `(row, col)` (1-based) of a matrix named `base`.
    Matrix {
        base: &'a str,
        row: usize,
        col: usize,
    },
}

/// Parse a 1-based decimal index with no sign and no leading zero.
fn parse_index(s: &str) -> Option<usize> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Classify a keyword as a plain scalar, a vector element or a matrix element.
pub fn classify(keyword: &str) -> KeywordClass<'_> {
    if let Some((left, right)) = keyword.split_once('_') {
        let letters = left.bytes().take_while(u8::is_ascii_uppercase).count();
        if (1..=MATRIX_BASE_LEN).contains(&letters) {
            let (base, row) = left.split_at(letters);
            if let (Some(row), Some(col)) = (parse_index(row), parse_index(right)) {
                if RESERVED_MATRIX_FAMILIES.contains(&base) {
                    return KeywordClass::Plain;
                }
                return KeywordClass::Matrix { base, row, col };
            }
        }
    }

    let stem_len = keyword.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if stem_len == 0 || stem_len == keyword.len() {
        return KeywordClass::Plain;
    }
    let (base, index) = keyword.split_at(stem_len);
    match parse_index(index) {
        Some(index) => KeywordClass::Indexed { base, index },
        None => KeywordClass::Plain,
    }
}
