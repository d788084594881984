//! C FFI bindings for altgpu virtual vectors.
//!
//! Exposes a C-compatible API for the embedding host. Vectors live behind
//! opaque `u64` handles in per-kind slot+generation tables; every entry
//! point returns an [`AltgpuStatus`] code (or a plain value where noted)
//! and writes results through caller-provided out-pointers. This crate is
//! one of two that may contain `unsafe` code (along with `altgpu-buffer`).
//!
//! Call [`altgpu_init`](lifecycle::altgpu_init) once before creating
//! vectors.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run an FFI body, converting a panic into [`AltgpuStatus::Panicked`].
macro_rules! ffi_guard {
    ($body:block) => {
        ffi_guard_or!($crate::status::AltgpuStatus::Panicked as i32, $body)
    };
}

/// Run an FFI body, returning `$default` if it panics.
macro_rules! ffi_guard_or {
    ($default:expr, $body:block) => {
        match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $body)) {
            Ok(value) => value,
            Err(_) => $default,
        }
    };
}

/// Lock a mutex, returning [`AltgpuStatus::InternalError`] from the
/// enclosing body if it is poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::AltgpuStatus::InternalError as i32,
        }
    };
}

mod handle;

pub mod lifecycle;
pub mod status;
pub mod types;
pub mod vector;

pub use status::AltgpuStatus;
pub use types::{AltgpuElementKind, AltgpuInspect, AltgpuOption, AltgpuOptionKind, AltgpuResidency};
