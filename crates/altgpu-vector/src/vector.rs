//! Fixed-length typed views over a coherent buffer.

use std::marker::PhantomData;
use std::sync::Arc;

use altgpu_buffer::{CoherentBuffer, DeviceBackend};
use altgpu_core::{debug_trace, BufferError, Element, ElementKind, Residency, Side, VectorError};

use crate::inspect::InspectReport;

/// A logical array of `T` backed by a [`CoherentBuffer`].
///
/// The vector holds no data of its own. Every accessor except
/// [`len`](Self::len) and [`inspect`](Self::inspect) synchronizes the
/// buffer first and then reads the host copy, so callers never observe
/// bytes that are older than the last write on either side.
#[derive(Debug)]
pub struct VirtualVector<T: Element> {
    length: usize,
    buffer: CoherentBuffer,
    _elem: PhantomData<T>,
}

impl<T: Element> VirtualVector<T> {
    /// Create a vector of `length` zeroed elements with its host side
    /// allocated and authoritative.
    pub fn new(length: usize, device: Arc<dyn DeviceBackend>) -> Result<Self, BufferError> {
        Self::from_buffer(length, CoherentBuffer::new(device))
    }

    /// Create a vector over an empty, possibly custom-configured buffer.
    ///
    /// # Panics
    ///
    /// Panics if `buffer` is already allocated.
    #[track_caller]
    pub fn from_buffer(length: usize, mut buffer: CoherentBuffer) -> Result<Self, BufferError> {
        debug_trace!("[VirtualVector::new] length = {length}");
        let bytes = length
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(BufferError::AllocationFailed {
                side: Side::Host,
                bytes: usize::MAX,
            })?;
        buffer.allocate_host(bytes)?;
        debug_trace!(
            "[VirtualVector::new] host buffer allocated at {:p}",
            buffer.host_ptr()
        );
        Ok(Self {
            length,
            buffer,
            _elem: PhantomData,
        })
    }

    /// Logical element count. Never synchronizes.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Element type tag.
    pub fn kind(&self) -> ElementKind {
        T::KIND
    }

    /// Bring the host and device copies into agreement.
    pub fn synchronize(&mut self) -> Result<(), VectorError> {
        self.buffer.synchronize().map_err(VectorError::from)
    }

    /// Read the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`; bounds are the caller's contract.
    pub fn elt(&mut self, index: usize) -> Result<T, VectorError> {
        debug_trace!("[VirtualVector::elt] index = {index}");
        self.synchronize()?;
        let value = self.host_view()?[index];
        debug_trace!(
            "[VirtualVector::elt] value at [{index}] = {}",
            value.to_f64()
        );
        Ok(value)
    }

    /// Copy up to `out.len()` elements starting at `start` into `out`.
    ///
    /// The count is clamped to `len() - start` (0 when `start >= len()`),
    /// and the number of elements actually copied is returned. Nothing
    /// past the end of the vector is read and nothing past the returned
    /// count is written.
    pub fn get_region(&mut self, start: usize, out: &mut [T]) -> Result<usize, VectorError> {
        debug_trace!(
            "[VirtualVector::get_region] start = {start}, size = {}",
            out.len()
        );
        self.synchronize()?;
        let count = self.length.saturating_sub(start).min(out.len());
        if count == 0 {
            return Ok(0);
        }
        let host = self.host_view()?;
        out[..count].copy_from_slice(&host[start..start + count]);
        debug_trace!("[VirtualVector::get_region] copied {count} elements");
        Ok(count)
    }

    /// Materialize the vector on the host and return a raw pointer to it.
    ///
    /// With `writable`, the host copy becomes authoritative, so the next
    /// device-side read will first pull the caller's writes over. An
    /// empty vector has nothing to mark and returns an aligned dangling
    /// pointer.
    pub fn dataptr(&mut self, writable: bool) -> Result<*mut T, VectorError> {
        debug_trace!("[VirtualVector::dataptr] writable = {writable}");
        self.synchronize()?;
        if writable && !self.is_empty() {
            debug_trace!("[VirtualVector::dataptr] marking host authoritative");
            self.buffer.mark_host_written();
        }
        let bytes = self
            .buffer
            .host_bytes_mut()
            .ok_or(VectorError::NullHostPointer)?;
        let ptr = bytemuck::cast_slice_mut::<u8, T>(bytes).as_mut_ptr();
        debug_trace!("[VirtualVector::dataptr] host_ptr = {ptr:p}");
        Ok(ptr)
    }

    /// Materialize read-only, returning null instead of failing when the
    /// host copy is missing.
    pub fn dataptr_or_null(&mut self) -> Result<*const T, VectorError> {
        self.synchronize()?;
        let ptr = self.buffer.host_ptr().cast::<T>();
        debug_trace!("[VirtualVector::dataptr_or_null] host_ptr = {ptr:p}");
        Ok(ptr)
    }

    /// Materialize read-only as a slice.
    pub fn as_slice(&mut self) -> Result<&[T], VectorError> {
        self.synchronize()?;
        self.host_view()
    }

    /// Materialize writable as a slice; the host copy becomes
    /// authoritative.
    pub fn as_mut_slice(&mut self) -> Result<&mut [T], VectorError> {
        self.synchronize()?;
        if !self.is_empty() {
            self.buffer.mark_host_written();
        }
        let bytes = self
            .buffer
            .host_bytes_mut()
            .ok_or(VectorError::NullHostPointer)?;
        Ok(bytemuck::cast_slice_mut(bytes))
    }

    /// Write `values` into the host copy starting at element `start`.
    pub fn write_host(&mut self, start: usize, values: &[T]) -> Result<(), VectorError> {
        let offset = Self::byte_offset(start, self.buffer.byte_size())?;
        self.buffer
            .write_host(offset, bytemuck::cast_slice(values))
            .map_err(VectorError::from)
    }

    /// Write `values` into the device copy starting at element `start`.
    ///
    /// This is the device-side write path: the device copy becomes
    /// authoritative and the next host read pulls it back.
    pub fn write_device(&mut self, start: usize, values: &[T]) -> Result<(), VectorError> {
        debug_trace!(
            "[VirtualVector::write_device] start = {start}, count = {}",
            values.len()
        );
        let offset = Self::byte_offset(start, self.buffer.byte_size())?;
        self.buffer
            .write_device(offset, bytemuck::cast_slice(values))
            .map_err(VectorError::from)
    }

    /// Synchronize, then copy device elements starting at `start` into `out`.
    pub fn read_device(&mut self, start: usize, out: &mut [T]) -> Result<(), VectorError> {
        let offset = Self::byte_offset(start, self.buffer.byte_size())?;
        self.buffer
            .read_device(offset, bytemuck::cast_slice_mut(out))
            .map_err(VectorError::from)
    }

    /// Current coherence state.
    pub fn residency(&self) -> Residency {
        self.buffer.residency()
    }

    /// The owned buffer.
    pub fn buffer(&self) -> &CoherentBuffer {
        &self.buffer
    }

    /// Describe the vector without synchronizing.
    pub fn inspect(&self) -> InspectReport {
        InspectReport {
            kind: T::KIND,
            length: self.length,
            host_addr: self.buffer.host_ptr() as usize,
            device_ptr: self.buffer.device_ptr(),
            residency: self.buffer.residency(),
        }
    }

    fn host_view(&self) -> Result<&[T], VectorError> {
        match self.buffer.host_bytes() {
            Some(bytes) => Ok(bytemuck::cast_slice(bytes)),
            None => {
                debug_trace!("[VirtualVector] ERROR: host pointer is null");
                Err(VectorError::NullHostPointer)
            }
        }
    }

    fn byte_offset(start: usize, byte_size: usize) -> Result<usize, BufferError> {
        start
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(BufferError::OutOfRange {
                offset: usize::MAX,
                len: 0,
                byte_size,
            })
    }
}
