//! Host-held references to virtual vectors.
//!
//! A [`VectorHandle`] is what the host environment keeps for each vector
//! it creates. The host's finalizer calls [`dispose`](VectorHandle::dispose)
//! when the handle becomes unreachable; disposal is idempotent, and every
//! other operation on a disposed handle reports [`VectorError::Freed`]
//! instead of touching released memory.

use std::sync::Arc;

use altgpu_buffer::DeviceBackend;
use altgpu_core::{debug_trace, BufferError, Element, VectorError};

use crate::inspect::InspectReport;
use crate::vector::VirtualVector;

/// The host's lazy-vector materialization protocol.
///
/// The host may call these in any order and any number of times; each
/// call resolves the instance afresh.
pub trait LazyVector {
    /// Element type of the vector.
    type Elem: Element;

    /// Logical element count.
    fn length(&self) -> Result<usize, VectorError>;

    /// Single-element read.
    fn elt(&mut self, index: usize) -> Result<Self::Elem, VectorError>;

    /// Bulk read of up to `out.len()` elements starting at `start`;
    /// returns the number copied.
    fn get_region(&mut self, start: usize, out: &mut [Self::Elem]) -> Result<usize, VectorError>;

    /// Full materialization; `writable` makes the host copy authoritative.
    fn dataptr(&mut self, writable: bool) -> Result<*mut Self::Elem, VectorError>;

    /// Read-only materialization that yields null rather than failing
    /// when no host copy exists.
    fn dataptr_or_null(&mut self) -> Result<*const Self::Elem, VectorError>;

    /// Diagnostic description; never synchronizes.
    fn inspect(&self) -> Result<InspectReport, VectorError>;
}

/// Disposable reference to one [`VirtualVector`].
#[derive(Debug)]
pub struct VectorHandle<T: Element> {
    instance: Option<VirtualVector<T>>,
}

impl<T: Element> VectorHandle<T> {
    /// Create a vector of `length` elements and a handle to it.
    pub fn create(length: usize, device: Arc<dyn DeviceBackend>) -> Result<Self, BufferError> {
        debug_trace!("[VectorHandle::create] {} vector, length = {length}", T::KIND);
        Ok(Self::from_vector(VirtualVector::new(length, device)?))
    }

    /// Wrap an existing vector.
    pub fn from_vector(vector: VirtualVector<T>) -> Self {
        Self {
            instance: Some(vector),
        }
    }

    /// Release the vector and its buffer.
    ///
    /// Returns `true` if this call released it, `false` if the handle was
    /// already disposed.
    pub fn dispose(&mut self) -> bool {
        match self.instance.take() {
            Some(vector) => {
                debug_trace!(
                    "[VectorHandle::dispose] releasing instance at {:#x}",
                    vector.inspect().host_addr
                );
                drop(vector);
                true
            }
            None => {
                debug_trace!("[VectorHandle::dispose] instance was already released");
                false
            }
        }
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.instance.is_none()
    }

    /// Resolve to the live instance.
    pub fn resolve(&self) -> Result<&VirtualVector<T>, VectorError> {
        self.instance.as_ref().ok_or_else(freed)
    }

    /// Resolve to the live instance mutably.
    pub fn resolve_mut(&mut self) -> Result<&mut VirtualVector<T>, VectorError> {
        self.instance.as_mut().ok_or_else(freed)
    }
}

fn freed() -> VectorError {
    debug_trace!("[VectorHandle::resolve] ERROR: instance is null (already freed?)");
    VectorError::Freed
}

impl<T: Element> LazyVector for VectorHandle<T> {
    type Elem = T;

    fn length(&self) -> Result<usize, VectorError> {
        let len = self.resolve()?.len();
        debug_trace!("[VectorHandle::length] length = {len}");
        Ok(len)
    }

    fn elt(&mut self, index: usize) -> Result<T, VectorError> {
        self.resolve_mut()?.elt(index)
    }

    fn get_region(&mut self, start: usize, out: &mut [T]) -> Result<usize, VectorError> {
        self.resolve_mut()?.get_region(start, out)
    }

    fn dataptr(&mut self, writable: bool) -> Result<*mut T, VectorError> {
        self.resolve_mut()?.dataptr(writable)
    }

    fn dataptr_or_null(&mut self) -> Result<*const T, VectorError> {
        self.resolve_mut()?.dataptr_or_null()
    }

    fn inspect(&self) -> Result<InspectReport, VectorError> {
        Ok(self.resolve()?.inspect())
    }
}
