//! Core types and traits for altgpu.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the buffer, vector and FFI crates: element
//! kinds, residency states, error types, host option values and the
//! process-wide diagnostic switch.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod diag;
pub mod element;
pub mod error;
pub mod options;
pub mod residency;

pub use element::{Element, ElementKind};
pub use error::{BufferError, ConfigError, VectorError};
pub use options::{
    flag_from_option, EnvOptions, OptionSource, OptionValue, StaticOptions, DEBUG_OPTION,
};
pub use residency::{CopyDirection, Residency, Side};
