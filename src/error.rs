use std::io;
use std::result;
use std::str;
use std::sync::Arc;

use bstr::ByteSlice;
use csvline_core::ParseError;

#[cfg(feature = "serde")]
use crate::de::DeserializeError;

/// A type alias for `Result<T, csvline::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when processing CSV data.
///
/// This error can happen when writing or reading CSV data.
///
/// Parse errors and I/O errors are *sticky* on a `Reader`: once one is
/// returned, every later read returns a clone of it. All other errors leave
/// the reader usable.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error that occurred while reading or writing CSV data.
    #[error("{0}")]
    Io(#[source] Arc<io::Error>),
    /// Malformed quoting found while parsing in strict mode.
    #[error("CSV parse error: {0}")]
    Parse(#[from] ParseError),
    /// A field was not valid UTF-8.
    ///
    /// The raw bytes of the field are kept for a retry, so the next field
    /// read returns them again.
    #[error("invalid UTF-8 in field {:?} at line {line}", .field.as_bstr())]
    Utf8 {
        /// The line on which the field ended, not counting its terminator.
        line: u64,
        /// The raw field.
        field: Vec<u8>,
        /// The corresponding UTF-8 error.
        #[source]
        err: str::Utf8Error,
    },
    /// A field could not be converted into the requested type.
    ///
    /// The field is kept for a retry, so the next field read returns it
    /// again.
    #[error("could not convert field {field:?}: {reason}")]
    TypeConversion {
        /// The text of the field.
        field: String,
        /// Why the conversion failed.
        reason: String,
    },
    /// A row had more fields than there are headers.
    #[error("too many fields: found {fields} fields with {headers} headers")]
    TooManyFields {
        /// The number of headers.
        headers: usize,
        /// The number of fields in the offending row.
        fields: usize,
    },
    /// The header row was requested from input without any rows.
    #[error("can't get header row from empty CSV data")]
    MissingHeaders,
    /// A row could not be deserialized.
    #[cfg(feature = "serde")]
    #[error("CSV deserialize error: {0}")]
    Deserialize(#[from] DeserializeError),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(Arc::new(err))
    }
}

impl Error {
    /// Returns true if this is an I/O error from the underlying source or
    /// sink.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Returns true if this is a parse error.
    pub fn is_parse_error(&self) -> bool {
        self.parse_error().is_some()
    }

    /// Returns the parse error, if this is one.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match *self {
            Error::Parse(ref err) => Some(err),
            _ => None,
        }
    }

    /// Returns true if a `Reader` that produced this error will keep
    /// returning it.
    pub fn is_sticky(&self) -> bool {
        self.is_io_error() || self.is_parse_error()
    }
}
