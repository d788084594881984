//! Virtual vectors over lazily-synchronized host/device buffers.
//!
//! A [`VirtualVector`] is a fixed-length typed view that holds no data
//! of its own: it owns one [`CoherentBuffer`](altgpu_buffer::CoherentBuffer)
//! and funnels every element read, region read and materialization
//! through the buffer's synchronization gate. A [`VectorHandle`] is the
//! host environment's reference to one instance; disposing it releases
//! the buffer and turns every later access into
//! [`VectorError::Freed`](altgpu_core::VectorError::Freed).
//!
//! The host environment discovers the two vector classes through
//! [`register_classes`] and drives them through the [`LazyVector`]
//! protocol.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod class;
pub mod handle;
pub mod inspect;
pub mod vector;

pub use class::{
    class_name, is_virtual_vector_class, register_classes, ClassDescriptor, ClassId,
    ClassRegistrar, ClassRegistry, ProtocolMethod, RegistrationError, PACKAGE_NAME,
};
pub use handle::{LazyVector, VectorHandle};
pub use inspect::InspectReport;
pub use vector::VirtualVector;
