//! Lazily-synchronized host/device dual buffers.
//!
//! A [`CoherentBuffer`] owns at most one host allocation and at most one
//! device allocation of the same byte size, and tracks which side holds
//! the newer data. Every read of either side goes through
//! [`CoherentBuffer::synchronize`], which allocates the missing side on
//! demand and copies in the direction of the authoritative copy. This
//! crate is the only one in the workspace that contains `unsafe` code
//! outside the FFI layer, confined to `raw.rs`.
//!
//! # Architecture
//!
//! ```text
//! CoherentBuffer
//! ├── HostAllocation (aligned, zero-initialised heap region)
//! ├── DevicePtr ──> Arc<dyn DeviceBackend>
//! │                  └── EmulatedDevice (host-resident device pool)
//! └── host_dirty / device_dirty (never both set)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod device;
mod raw;

pub use buffer::CoherentBuffer;
pub use config::BufferConfig;
pub use device::{DeviceBackend, DevicePtr, EmulatedDevice};
