//! Error types for codec operations.
//!
//! Every decode or encode failure is an [`IoError`]. [`IoError::kind`]
//! sorts them into the few classes callers act on: a malformed file, a
//! recognized but unsupported feature, a resource limit, or a broken
//! structural invariant.

use std::io;
use thiserror::Error;

/// Codec error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// The stream ended before a complete structure was read.
    #[error("unexpected end of stream while reading {0}")]
    Truncated(String),

    /// Invalid or corrupted file (bad magic, version, flags or sizes).
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Recognized but unimplemented format or feature.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Required EXR header attributes were absent.
    #[error("missing required attributes: {}", .0.join(", "))]
    MissingAttributes(Vec<String>),

    /// Decoding error (structural invariant violated).
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Pixel buffer error.
    #[error(transparent)]
    Core(#[from] hdrtex_core::Error),
}

/// Failure class of an [`IoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad magic, bad version or flags, truncated stream, missing attributes.
    Malformed,
    /// Recognized feature this codec does not implement.
    Unsupported,
    /// Buffer size overflow or negative dimensions.
    ResourceLimit,
    /// Zero images or mips, mixed channel types, writer preconditions.
    Invariant,
    /// Underlying reader or writer failed.
    Io,
}

impl IoError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IoError::Io(_) => ErrorKind::Io,
            IoError::Truncated(_) | IoError::InvalidFile(_) | IoError::MissingAttributes(_) => {
                ErrorKind::Malformed
            }
            IoError::UnsupportedFormat(_) => ErrorKind::Unsupported,
            IoError::DecodeError(_) | IoError::EncodeError(_) => ErrorKind::Invariant,
            IoError::Core(e) if e.is_allocation_error() => ErrorKind::ResourceLimit,
            IoError::Core(hdrtex_core::Error::UnsupportedFormat { .. }) => ErrorKind::Unsupported,
            IoError::Core(_) => ErrorKind::Invariant,
        }
    }

    /// Maps an end-of-stream read failure to [`IoError::Truncated`] naming `what`.
    pub(crate) fn reading(what: &str) -> impl FnOnce(io::Error) -> IoError + '_ {
        move |e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                IoError::Truncated(what.to_string())
            } else {
                IoError::Io(e)
            }
        }
    }
}

impl From<io::Error> for IoError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            IoError::Truncated("input".to_string())
        } else {
            IoError::Io(e)
        }
    }
}

/// Result type for codec operations.
pub type IoResult<T> = Result<T, IoError>;
