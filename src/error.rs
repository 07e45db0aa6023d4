//! Error handling for the flatrec library.
//!
//! This module defines every error that can surface while opening, iterating,
//! or seeking a parser. Ordinary end-of-stream is *not* an error: it is the
//! `Ok(false)` return of [`Parser::advance`](crate::Parser::advance).

use std::error::Error as StdError;
use thiserror::Error;

/// A specialized `Result` type for flatrec operations.
///
/// It's equivalent to `std::result::Result<T, FlatError>`.
///
/// # Examples
///
/// ```rust
/// use flatrec::{Result, Strand};
///
/// fn parse_strand(symbol: &str) -> Result<i8> {
///     let strand = Strand::from_symbol(symbol)?;
///     Ok(strand.encode())
/// }
/// assert_eq!(parse_strand("-").unwrap(), -1);
/// ```
pub type Result<T> = std::result::Result<T, FlatError>;

/// Error types for flatrec operations.
///
/// The variants split into three groups:
/// - contract errors raised by the engine itself (`NotImplemented`,
///   `NotSupported`, `UnsupportedFormat`, `ParserClosed`),
/// - decode errors raised by format plugins (`Malformed`, `InvalidStrand`,
///   `InvalidMagicNumber`, `TruncatedBlock`, `InvalidIndex`),
/// - wrapped errors from the I/O layer.
///
/// # Examples
///
/// ```rust
/// use flatrec::{open_as, Config, FlatError, Input};
///
/// match open_as("not-a-real-format", Input::Bytes(Vec::new()), Config::default()) {
///     Err(FlatError::UnsupportedFormat(id)) => assert_eq!(id, "not-a-real-format"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum FlatError {
    /// I/O error from the underlying reader.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Compression detection error from niffler.
    #[cfg(feature = "niffler")]
    #[error("Niffler error")]
    Niffler(#[from] niffler::Error),

    /// A format plugin cannot honour one of the required primitives.
    ///
    /// This is fatal and is never retried by the engine.
    #[error("{format}: required primitive `{primitive}` is not implemented")]
    NotImplemented {
        format: &'static str,
        primitive: &'static str,
    },

    /// An optional capability was invoked on a format that lacks it.
    ///
    /// Recoverable: callers may fall back to a linear scan.
    #[error("{format}: `{capability}` is not supported")]
    NotSupported {
        format: &'static str,
        capability: &'static str,
    },

    /// The format factory received an identifier outside the supported set.
    #[error("Unsupported format: {0:?}")]
    UnsupportedFormat(String),

    /// A block could not be decoded by its format plugin.
    #[error("{format}: malformed input at line {line}: {reason}")]
    Malformed {
        format: &'static str,
        line: usize,
        reason: String,
    },

    /// A strand field held something other than `+`, `.`, or `-`.
    #[error("Invalid strand symbol ({0:?}), expected one of '+', '.', '-'")]
    InvalidStrand(String),

    /// A seek region could not be parsed or has `start > end`.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Invalid magic number in an indexed-binary structure.
    #[error("Invalid magic number for {what}, found ({actual:#x})")]
    InvalidMagicNumber { what: &'static str, actual: u32 },

    /// An indexed-binary structure ended before its declared size.
    #[error("Truncated {what} at offset {offset}")]
    TruncatedBlock { what: &'static str, offset: usize },

    /// An indexed-binary structure is internally inconsistent.
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// A configuration value could not be interpreted.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The parser was used after [`Parser::close`](crate::Parser::close).
    #[error("Parser has been closed")]
    ParserClosed,

    /// Error raised by consumer code while processing records.
    ///
    /// Custom error types are carried through this variant using
    /// [`IntoFlatError`].
    #[error("Processing error: {0}")]
    Process(Box<dyn StdError + Send + Sync>),
}
impl FlatError {
    /// Convenience constructor for [`FlatError::Malformed`].
    pub fn malformed(format: &'static str, line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            line,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error only signals an absent optional capability.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }
}

/// Trait for converting errors into `FlatError::Process` variants.
///
/// # Examples
///
/// ```rust
/// use flatrec::{FlatError, IntoFlatError};
///
/// let err = std::fmt::Error.into_flat_error();
/// assert!(matches!(err, FlatError::Process(_)));
/// ```
pub trait IntoFlatError {
    /// Converts the error into a `FlatError`.
    fn into_flat_error(self) -> FlatError;
}

/// Blanket implementation for all error types.
impl<E> IntoFlatError for E
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_flat_error(self) -> FlatError {
        FlatError::Process(self.into())
    }
}
