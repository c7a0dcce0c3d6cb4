/// Errors raised by the card codec, the shape codec and header I/O.
///
/// Keyword conversion itself never fails with an `Error`: field-level problems
/// are folded into the boolean returned by `add_keywords` / `get_keywords`.
#[derive(Debug)]
pub enum Error {
    /// Malformed FITS header block or card text.
    InvalidHeader,
    /// Premature end of data while reading a header.
    UnexpectedEof,
    /// Keyword name contains characters outside `A-Z 0-9 - _` or is lower-case.
    InvalidKeyword,
    /// A header value could not be parsed correctly.
    InvalidValue,
    /// A shape descriptor was not of the form `(d0,d1,...)`.
    InvalidShape,
    /// An I/O error from the standard library.
    #[cfg(feature = "std")]
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidHeader => write!(f, "invalid FITS header"),
            Error::UnexpectedEof => write!(f, "unexpected end of header data"),
            Error::InvalidKeyword => write!(f, "invalid keyword name"),
            Error::InvalidValue => write!(f, "invalid header value"),
            Error::InvalidShape => write!(f, "invalid shape descriptor"),
            #[cfg(feature = "std")]
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
