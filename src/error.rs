//! Error handling.

use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NefError {
    /// The file does not start with a valid `II*\0` or `MM\0*` header.
    #[error("Invalid header: {0}")]
    HeaderInvalid(String),

    /// An IFD violates a structural rule (tag ordering, sentinel count, offset cycle).
    #[error("Corrupt directory: {0}")]
    DirectoryCorrupt(String),

    /// A bounded read ran past the end of the buffer.
    #[error("Truncated read at offset {offset}: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Absolute offset of the read.
        offset: u64,
        /// Number of bytes requested.
        expected: u64,
        /// Number of bytes available.
        actual: u64,
    },

    /// A requested tag or directory is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The tag's type code has no value decoder.
    #[error("Unsupported tag type {0:#06x}")]
    UnsupportedType(u16),

    /// The photometric interpretation has no pixel reconstruction rule.
    #[error("Unsupported photometric interpretation {0}")]
    UnsupportedFormat(u16),

    /// The directory carries neither embedded JPEG nor strip tags.
    #[error("Directory does not contain an image")]
    NoImage,

    /// A tag descriptor is already registered for this family and id.
    #[error("Duplicate tag descriptor: {0}")]
    DuplicateTag(String),

    /// IO Error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Error while decoding JPEG data.
    #[error(transparent)]
    JPEGDecodingError(#[from] jpeg::Error),
}

impl NefError {
    pub(crate) fn truncated(offset: u64, expected: u64, actual: u64) -> Self {
        Self::Truncated {
            offset,
            expected,
            actual,
        }
    }
}

/// Crate-specific result type.
pub type NefResult<T> = std::result::Result<T, NefError>;
