//! C-compatible status codes.
//!
//! [`AltgpuStatus`] is a `repr(i32)` enum covering every failure the C
//! surface can report. Conversions from [`VectorError`], [`BufferError`]
//! and [`RegistrationError`] are provided.

use altgpu_core::{BufferError, VectorError};
use altgpu_vector::RegistrationError;

/// C-compatible status code returned by FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AltgpuStatus {
    /// Success.
    Ok = 0,
    /// Handle was never issued or has been released.
    InvalidHandle = -1,
    /// The vector behind the handle was disposed.
    Freed = -2,
    /// The vector has no host copy to read.
    NullHostPointer = -3,
    /// Host or device allocation failed.
    AllocationFailed = -4,
    /// A host/device transfer failed.
    CopyFailed = -5,
    /// Index or range lies outside the vector.
    OutOfRange = -6,
    /// An argument is null or otherwise invalid.
    InvalidArgument = -7,
    /// `altgpu_init` has not run.
    NotInitialized = -8,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -9,
    /// The host refused a class registration.
    RegistrationFailed = -10,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&BufferError> for AltgpuStatus {
    fn from(e: &BufferError) -> Self {
        match e {
            BufferError::AllocationFailed { .. } => AltgpuStatus::AllocationFailed,
            BufferError::CopyFailed { .. } => AltgpuStatus::CopyFailed,
            BufferError::OutOfRange { .. } => AltgpuStatus::OutOfRange,
        }
    }
}

impl From<&VectorError> for AltgpuStatus {
    fn from(e: &VectorError) -> Self {
        match e {
            VectorError::Freed => AltgpuStatus::Freed,
            VectorError::NullHostPointer => AltgpuStatus::NullHostPointer,
            VectorError::Buffer(inner) => AltgpuStatus::from(inner),
        }
    }
}

impl From<VectorError> for AltgpuStatus {
    fn from(e: VectorError) -> Self {
        AltgpuStatus::from(&e)
    }
}

impl From<&RegistrationError> for AltgpuStatus {
    fn from(_e: &RegistrationError) -> Self {
        AltgpuStatus::RegistrationFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altgpu_core::{CopyDirection, Side};

    #[test]
    fn status_code_values_are_stable() {
        assert_eq!(AltgpuStatus::Ok as i32, 0);
        assert_eq!(AltgpuStatus::InvalidHandle as i32, -1);
        assert_eq!(AltgpuStatus::Freed as i32, -2);
        assert_eq!(AltgpuStatus::NullHostPointer as i32, -3);
        assert_eq!(AltgpuStatus::AllocationFailed as i32, -4);
        assert_eq!(AltgpuStatus::CopyFailed as i32, -5);
        assert_eq!(AltgpuStatus::OutOfRange as i32, -6);
        assert_eq!(AltgpuStatus::InvalidArgument as i32, -7);
        assert_eq!(AltgpuStatus::NotInitialized as i32, -8);
        assert_eq!(AltgpuStatus::InternalError as i32, -9);
        assert_eq!(AltgpuStatus::RegistrationFailed as i32, -10);
        assert_eq!(AltgpuStatus::Panicked as i32, -128);
    }

    #[test]
    fn buffer_error_to_status() {
        assert_eq!(
            AltgpuStatus::from(&BufferError::AllocationFailed {
                side: Side::Device,
                bytes: 8
            }),
            AltgpuStatus::AllocationFailed
        );
        assert_eq!(
            AltgpuStatus::from(&BufferError::CopyFailed {
                direction: CopyDirection::DeviceToHost,
                bytes: 8,
                reason: "x".into()
            }),
            AltgpuStatus::CopyFailed
        );
        assert_eq!(
            AltgpuStatus::from(&BufferError::OutOfRange {
                offset: 8,
                len: 8,
                byte_size: 8
            }),
            AltgpuStatus::OutOfRange
        );
    }

    #[test]
    fn vector_error_to_status() {
        assert_eq!(AltgpuStatus::from(&VectorError::Freed), AltgpuStatus::Freed);
        assert_eq!(
            AltgpuStatus::from(&VectorError::NullHostPointer),
            AltgpuStatus::NullHostPointer
        );
        assert_eq!(
            AltgpuStatus::from(&VectorError::Buffer(BufferError::AllocationFailed {
                side: Side::Host,
                bytes: 1
            })),
            AltgpuStatus::AllocationFailed
        );
    }

    #[test]
    fn registration_error_to_status() {
        let e = RegistrationError::Duplicate {
            name: "altvec_real".into(),
        };
        assert_eq!(AltgpuStatus::from(&e), AltgpuStatus::RegistrationFailed);
    }
}
