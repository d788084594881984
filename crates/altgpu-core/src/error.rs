//! Error types for altgpu.
//!
//! Split by layer: [`BufferError`] for resource failures inside the
//! coherent buffer, [`VectorError`] for handle resolution and accessor
//! checks, and [`ConfigError`] for rejected configuration.
//!
//! Misuse of the buffer protocol (double allocation, marking an empty
//! buffer) is not represented here: it is a programming error and panics.

use std::error::Error;
use std::fmt;

use crate::residency::{CopyDirection, Side};

/// Resource failures reported by the coherent buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// Host or device memory could not be allocated.
    AllocationFailed {
        /// Side on which the allocation was attempted.
        side: Side,
        /// Number of bytes requested.
        bytes: usize,
    },
    /// A synchronizing or explicit copy between sides failed.
    CopyFailed {
        /// Direction of the failed copy.
        direction: CopyDirection,
        /// Number of bytes that should have been copied.
        bytes: usize,
        /// Backend-provided description.
        reason: String,
    },
    /// A byte range falls outside the buffer.
    OutOfRange {
        /// Start of the requested range.
        offset: usize,
        /// Length of the requested range.
        len: usize,
        /// Size of the buffer.
        byte_size: usize,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { side, bytes } => {
                write!(f, "{side} allocation of {bytes} bytes failed")
            }
            Self::CopyFailed {
                direction,
                bytes,
                reason,
            } => {
                write!(f, "{direction} copy of {bytes} bytes failed: {reason}")
            }
            Self::OutOfRange {
                offset,
                len,
                byte_size,
            } => {
                write!(
                    f,
                    "byte range {offset}..{} is outside buffer of {byte_size} bytes",
                    offset.saturating_add(*len)
                )
            }
        }
    }
}

impl Error for BufferError {}

/// Errors surfaced by virtual vector accessors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VectorError {
    /// The handle's instance was already disposed.
    Freed,
    /// A non-empty vector has no host copy after synchronization.
    ///
    /// Indicates internal corruption rather than caller misuse.
    NullHostPointer,
    /// The underlying buffer reported a resource failure.
    Buffer(BufferError),
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Freed => write!(f, "virtual vector appears to have been freed"),
            Self::NullHostPointer => {
                write!(f, "virtual vector encountered a null host pointer")
            }
            Self::Buffer(e) => write!(f, "buffer error: {e}"),
        }
    }
}

impl Error for VectorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Buffer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BufferError> for VectorError {
    fn from(e: BufferError) -> Self {
        Self::Buffer(e)
    }
}

/// Rejected configuration values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Host alignment is not a power of two or is below the minimum.
    InvalidAlignment {
        /// The rejected alignment in bytes.
        alignment: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAlignment { alignment } => write!(
                f,
                "host alignment {alignment} must be a power of two and at least 8"
            ),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_error_source_is_exposed() {
        let e = VectorError::from(BufferError::AllocationFailed {
            side: Side::Device,
            bytes: 64,
        });
        assert!(e.source().is_some());
        assert_eq!(
            e.to_string(),
            "buffer error: device allocation of 64 bytes failed"
        );
    }

    #[test]
    fn freed_has_no_source() {
        assert!(VectorError::Freed.source().is_none());
    }

    #[test]
    fn out_of_range_message() {
        let e = BufferError::OutOfRange {
            offset: 8,
            len: 16,
            byte_size: 12,
        };
        assert_eq!(
            e.to_string(),
            "byte range 8..24 is outside buffer of 12 bytes"
        );
    }
}
