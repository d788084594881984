//! altgpu: lazily-synchronized host/device vectors.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the altgpu sub-crates. The C surface lives in `altgpu-ffi`.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use altgpu::prelude::*;
//!
//! let device = Arc::new(EmulatedDevice::new());
//! let mut v = VirtualVector::<f64>::new(5, device).unwrap();
//! v.write_host(0, &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
//!
//! // Reads synchronize first: the device copy is now current too.
//! assert_eq!(v.elt(2).unwrap(), 3.0);
//! assert_eq!(v.residency(), Residency::Synced);
//!
//! // A device-side write makes the device authoritative until the next read.
//! v.write_device(0, &[99.0]).unwrap();
//! assert_eq!(v.elt(0).unwrap(), 99.0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `altgpu-core` | Element kinds, residency, errors, options, diagnostics |
//! | [`buffer`] | `altgpu-buffer` | Coherent dual buffer and device backends |
//! | [`vector`] | `altgpu-vector` | Virtual vectors, handles, class registration |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and the diagnostic switch (`altgpu-core`).
pub use altgpu_core as types;

/// Coherent dual buffers and device backends (`altgpu-buffer`).
///
/// Implement [`buffer::DeviceBackend`] to plug in a real accelerator
/// driver; [`buffer::EmulatedDevice`] is the built-in backend.
pub use altgpu_buffer as buffer;

/// Virtual vectors, host handles and class registration (`altgpu-vector`).
pub use altgpu_vector as vector;

pub use altgpu_core::debug_trace;

/// Common imports for typical altgpu usage.
///
/// ```rust
/// use altgpu::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use altgpu_core::{Element, ElementKind, Residency, Side};

    // Errors
    pub use altgpu_core::{BufferError, ConfigError, VectorError};

    // Options
    pub use altgpu_core::{EnvOptions, OptionSource, OptionValue, StaticOptions};

    // Buffers and devices
    pub use altgpu_buffer::{BufferConfig, CoherentBuffer, DeviceBackend, EmulatedDevice};

    // Vectors
    pub use altgpu_vector::{
        register_classes, ClassRegistrar, ClassRegistry, LazyVector, VectorHandle, VirtualVector,
    };
}
