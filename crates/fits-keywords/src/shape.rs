//! Dimension sequences as `(d0,d1,...)` text.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{Error, Result};

/// Parse `"(512, 128, 4)"` into `[512, 128, 4]`.
///
/// Whitespace around the parentheses and tokens is ignored. At least one
/// dimension is required.
pub fn parse_shape(text: &str) -> Result<Vec<usize>> {
    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or(Error::InvalidShape)?;

    inner
        .split(',')
        .map(|token| {
            let token = token.trim();
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::InvalidShape);
            }
            token.parse().map_err(|_| Error::InvalidShape)
        })
        .collect()
}

/// Format a dimension sequence; the inverse of [`parse_shape`].
pub fn format_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(ToString::to_string).collect();
    format!("({})", dims.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn formats_without_spaces() {
        assert_eq!(format_shape(&[512, 128, 4, 2]), "(512,128,4,2)");
        assert_eq!(format_shape(&[7]), "(7)");
        assert_eq!(format_shape(&[]), "()");
    }

    #[test]
    fn parses_with_whitespace() {
        assert_eq!(parse_shape("(128,4,2)").unwrap(), vec![128, 4, 2]);
        assert_eq!(parse_shape("  ( 3 , 0 )  ").unwrap(), vec![3, 0]);
    }

    #[test]
    fn parse_inverts_format() {
        let shape = [1, 20, 300];
        assert_eq!(parse_shape(&format_shape(&shape)).unwrap(), shape);
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in ["", "()", "128,4", "(128,4", "(a,2)", "(1,,2)", "(-1)", "(+1)", "(1.5)"] {
            assert!(
                matches!(parse_shape(bad), Err(Error::InvalidShape)),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn rejects_overflowing_dimensions() {
        assert!(parse_shape("(99999999999999999999999999)").is_err());
    }
}
