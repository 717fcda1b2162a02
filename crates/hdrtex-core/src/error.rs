//! Error types for hdrtex-core operations.
//!
//! The [`Error`] enum covers the failure modes of the pixel-buffer layer:
//! - Buffer allocation (overflowing or negative dimensions)
//! - Stride validation for planes built from raw bytes
//! - Pixel conversions into a layout that cannot hold them
//!
//! # Usage
//!
//! ```rust
//! use hdrtex_core::{Error, Rect, Plane, ColorModel};
//!
//! let err = Plane::new(ColorModel::Rgba32F, Rect::new(0, 0, -1, 4)).unwrap_err();
//! assert!(err.is_allocation_error());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation
//!
//! # Used By
//!
//! - [`crate::plane::Plane`] - Buffer allocation and raw construction
//! - `hdrtex-io` - Wrapped into `IoError::Core` as the resource-limit class

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while creating or converting pixel planes.
///
/// # Categories
///
/// - **Allocation errors**: [`AllocationFailed`](Error::AllocationFailed), [`InvalidDimensions`](Error::InvalidDimensions)
/// - **Layout errors**: [`InvalidStride`](Error::InvalidStride), [`BufferTooSmall`](Error::BufferTooSmall)
/// - **Format errors**: [`UnsupportedFormat`](Error::UnsupportedFormat)
#[derive(Debug, Error)]
pub enum Error {
    /// The pixel buffer size cannot be represented on this platform.
    ///
    /// Returned before any allocation is attempted, so a malformed header
    /// claiming a huge texture never reaches the allocator.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailed {
        /// Bytes requested (saturated at `u64::MAX` when the product overflowed)
        requested: u64,
        /// Failure reason
        reason: String,
    },

    /// Width or height is negative.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Stride is too small for the given width and pixel size.
    #[error("stride {stride} is less than minimum {min_stride} for width {width}")]
    InvalidStride {
        /// Provided stride
        stride: usize,
        /// Minimum required stride
        min_stride: usize,
        /// Plane width
        width: i32,
    },

    /// A raw byte buffer is shorter than the plane it should back.
    #[error("buffer of {got} bytes is smaller than the {expected} bytes required")]
    BufferTooSmall {
        /// Bytes required by bounds and stride
        expected: usize,
        /// Bytes provided
        got: usize,
    },

    /// Color model is not supported for this operation.
    #[error("unsupported color model: {format}")]
    UnsupportedFormat {
        /// Model name or description
        format: String,
    },

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(requested: u64, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            requested,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: i32, height: i32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::UnsupportedFormat`] error.
    #[inline]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates an [`Error::Other`] error.
    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Returns `true` if this error was raised while sizing a pixel buffer.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailed { .. } | Self::InvalidDimensions { .. }
        )
    }
}
