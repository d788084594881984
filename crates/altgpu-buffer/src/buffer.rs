//! The coherent dual buffer.
//!
//! [`CoherentBuffer`] is a two-location coherence protocol over one
//! logical byte range. At most one of `host_dirty` / `device_dirty` is
//! ever set; when neither is, both allocated sides hold identical bytes.
//! Callers must go through [`synchronize`](CoherentBuffer::synchronize)
//! before reading either side.
//!
//! Protocol misuse (re-sizing an allocated buffer, marking an empty
//! buffer as written) panics. Resource failures (allocation, copy) are
//! returned as [`BufferError`] and leave the buffer's coherence state
//! unchanged.

use std::fmt;
use std::sync::Arc;

use altgpu_core::{debug_trace, BufferError, ConfigError, CopyDirection, Residency};

use crate::config::BufferConfig;
use crate::device::{DeviceBackend, DevicePtr};
use crate::raw::HostAllocation;

/// Owner of up to two copies (host and device) of one byte range.
///
/// Move-only: there is no `Clone`, so two owners can never free the same
/// allocation. [`take`](Self::take) transfers both allocations and leaves
/// the source empty. Both allocations are released on drop.
pub struct CoherentBuffer {
    device: Arc<dyn DeviceBackend>,
    host_alignment: usize,
    host: Option<HostAllocation>,
    device_ptr: Option<DevicePtr>,
    /// Fixed once allocated; 0 means empty.
    byte_size: usize,
    host_dirty: bool,
    device_dirty: bool,
}

impl CoherentBuffer {
    /// Create an empty buffer backed by `device`.
    pub fn new(device: Arc<dyn DeviceBackend>) -> Self {
        Self::empty(device, BufferConfig::DEFAULT_HOST_ALIGNMENT)
    }

    /// Create an empty buffer with a validated configuration.
    pub fn with_config(
        device: Arc<dyn DeviceBackend>,
        config: &BufferConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::empty(device, config.host_alignment))
    }

    fn empty(device: Arc<dyn DeviceBackend>, host_alignment: usize) -> Self {
        Self {
            device,
            host_alignment,
            host: None,
            device_ptr: None,
            byte_size: 0,
            host_dirty: false,
            device_dirty: false,
        }
    }

    /// Allocate the host side and make it authoritative.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is already sized.
    #[track_caller]
    pub fn allocate_host(&mut self, bytes: usize) -> Result<(), BufferError> {
        assert!(
            self.byte_size == 0,
            "buffer already allocated ({} bytes)",
            self.byte_size
        );
        // An unsized buffer can only hold zero-byte leftovers.
        self.release();
        self.host = Some(HostAllocation::zeroed(bytes, self.host_alignment)?);
        self.byte_size = bytes;
        self.host_dirty = true;
        self.device_dirty = false;
        debug_trace!("[CoherentBuffer::allocate_host] {bytes} bytes at {:p}", self.host_ptr());
        Ok(())
    }

    /// Allocate the device side (if absent) and make it authoritative.
    ///
    /// On an already-sized buffer `bytes` must match the fixed size; the
    /// existing device allocation, if any, is kept.
    ///
    /// # Panics
    ///
    /// Panics on a size mismatch with an already-sized buffer.
    #[track_caller]
    pub fn allocate_device(&mut self, bytes: usize) -> Result<(), BufferError> {
        assert!(
            self.byte_size == 0 || self.byte_size == bytes,
            "size mismatch: buffer holds {} bytes, requested {bytes}",
            self.byte_size
        );
        if self.byte_size == 0 && bytes != 0 {
            self.release();
            self.byte_size = bytes;
        }
        self.ensure_device()?;
        self.device_dirty = true;
        self.host_dirty = false;
        debug_trace!(
            "[CoherentBuffer::allocate_device] {bytes} bytes at {:?}",
            self.device_ptr
        );
        Ok(())
    }

    /// Record that the host copy now holds the newest data.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty or has no host side.
    #[track_caller]
    pub fn mark_host_written(&mut self) {
        assert!(self.byte_size != 0, "cannot mark host written: buffer is empty");
        assert!(
            self.host.is_some(),
            "cannot mark host written: host side is not allocated"
        );
        self.host_dirty = true;
        self.device_dirty = false;
    }

    /// Record that the device copy now holds the newest data.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty or has no device side.
    #[track_caller]
    pub fn mark_device_written(&mut self) {
        assert!(
            self.byte_size != 0,
            "cannot mark device written: buffer is empty"
        );
        assert!(
            self.device_ptr.is_some(),
            "cannot mark device written: device side is not allocated"
        );
        self.device_dirty = true;
        self.host_dirty = false;
    }

    /// Reconcile the two sides.
    ///
    /// No-op for an empty or already-coherent buffer. Otherwise allocates
    /// the stale side if it is missing, copies the authoritative bytes
    /// over it and clears both dirty flags. On error the flags are left
    /// untouched, so a later call retries the same copy.
    pub fn synchronize(&mut self) -> Result<(), BufferError> {
        if self.byte_size == 0 || self.is_synced() {
            return Ok(());
        }
        if self.host_newer() {
            let dst = self.ensure_device()?;
            if let Some(host) = &self.host {
                debug_trace!(
                    "[CoherentBuffer::synchronize] {} bytes host {:p} -> device {dst}",
                    self.byte_size,
                    host.as_ptr()
                );
                self.device.copy_to_device(dst, 0, host.as_bytes())?;
            }
        } else {
            let src = self.ensure_device()?;
            self.ensure_host()?;
            if let Some(host) = &mut self.host {
                debug_trace!(
                    "[CoherentBuffer::synchronize] {} bytes device {src} -> host {:p}",
                    self.byte_size,
                    host.as_ptr()
                );
                self.device.copy_to_host(host.as_bytes_mut(), src, 0)?;
            }
        }
        self.host_dirty = false;
        self.device_dirty = false;
        Ok(())
    }

    /// Write `src` into the host copy at `offset` and make the host
    /// authoritative.
    ///
    /// A partial write over a device-authoritative buffer first pulls the
    /// device copy, so bytes outside the written range keep their newest
    /// value.
    pub fn write_host(&mut self, offset: usize, src: &[u8]) -> Result<(), BufferError> {
        let end = self.check_range(offset, src.len())?;
        if src.is_empty() {
            return Ok(());
        }
        if src.len() != self.byte_size && self.device_newer() {
            self.synchronize()?;
        }
        self.ensure_host()?;
        if let Some(host) = &mut self.host {
            host.as_bytes_mut()[offset..end].copy_from_slice(src);
        }
        self.mark_host_written();
        Ok(())
    }

    /// Write `src` into the device copy at `offset` and make the device
    /// authoritative, allocating the device side if needed.
    ///
    /// A partial write over a host-authoritative buffer first pushes the
    /// host copy, so bytes outside the written range keep their newest
    /// value.
    pub fn write_device(&mut self, offset: usize, src: &[u8]) -> Result<(), BufferError> {
        self.check_range(offset, src.len())?;
        if src.is_empty() {
            return Ok(());
        }
        if src.len() != self.byte_size && self.host_newer() {
            self.synchronize()?;
        }
        let dst = self.ensure_device()?;
        self.device.copy_to_device(dst, offset, src)?;
        self.mark_device_written();
        Ok(())
    }

    /// Synchronize, then copy device bytes starting at `offset` into `out`.
    ///
    /// Pending host writes are pushed first, so the bytes returned are
    /// always the newest ones.
    pub fn read_device(&mut self, offset: usize, out: &mut [u8]) -> Result<(), BufferError> {
        self.check_range(offset, out.len())?;
        if out.is_empty() {
            return Ok(());
        }
        self.synchronize()?;
        let src = self.ensure_device()?;
        self.device.copy_to_host(out, src, offset)
    }

    /// Free both sides and return to the empty state. Idempotent.
    pub fn release(&mut self) {
        if let Some(ptr) = self.device_ptr.take() {
            self.device.free(ptr);
        }
        self.host = None;
        self.byte_size = 0;
        self.host_dirty = false;
        self.device_dirty = false;
    }

    /// Move both allocations into a new buffer, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        let empty = Self::empty(Arc::clone(&self.device), self.host_alignment);
        std::mem::replace(self, empty)
    }

    /// Fixed size in bytes (0 when empty).
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Whether a host allocation exists.
    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// Whether a device allocation exists.
    pub fn has_device(&self) -> bool {
        self.device_ptr.is_some()
    }

    /// Whether neither side holds unpropagated data.
    pub fn is_synced(&self) -> bool {
        !self.host_dirty && !self.device_dirty
    }

    /// Whether the host copy is the authoritative one.
    pub fn host_newer(&self) -> bool {
        self.host_dirty && !self.device_dirty
    }

    /// Whether the device copy is the authoritative one.
    pub fn device_newer(&self) -> bool {
        self.device_dirty && !self.host_dirty
    }

    /// Current coherence state.
    pub fn residency(&self) -> Residency {
        Residency::from_flags(
            self.has_host() || self.has_device(),
            self.host_dirty,
            self.device_dirty,
        )
    }

    /// Start of the host copy, or null if there is none.
    pub fn host_ptr(&self) -> *const u8 {
        self.host
            .as_ref()
            .map_or(std::ptr::null(), HostAllocation::as_ptr)
    }

    /// Device allocation, if any.
    pub fn device_ptr(&self) -> Option<DevicePtr> {
        self.device_ptr
    }

    /// Host bytes as they are now, without synchronizing.
    pub fn host_bytes(&self) -> Option<&[u8]> {
        self.host.as_ref().map(HostAllocation::as_bytes)
    }

    /// Mutable host bytes, without synchronizing or marking.
    ///
    /// Callers that write through this view must call
    /// [`mark_host_written`](Self::mark_host_written).
    pub fn host_bytes_mut(&mut self) -> Option<&mut [u8]> {
        self.host.as_mut().map(HostAllocation::as_bytes_mut)
    }

    /// Name of the device backend.
    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    fn ensure_host(&mut self) -> Result<(), BufferError> {
        if self.host.is_none() {
            self.host = Some(HostAllocation::zeroed(self.byte_size, self.host_alignment)?);
            debug_trace!(
                "[CoherentBuffer] lazily allocated {} host bytes",
                self.byte_size
            );
        }
        Ok(())
    }

    fn ensure_device(&mut self) -> Result<DevicePtr, BufferError> {
        if let Some(ptr) = self.device_ptr {
            return Ok(ptr);
        }
        let ptr = self.device.alloc(self.byte_size)?;
        debug_trace!(
            "[CoherentBuffer] allocated {} device bytes at {ptr} on {}",
            self.byte_size,
            self.device.name()
        );
        self.device_ptr = Some(ptr);
        Ok(ptr)
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<usize, BufferError> {
        offset
            .checked_add(len)
            .filter(|&end| end <= self.byte_size)
            .ok_or(BufferError::OutOfRange {
                offset,
                len,
                byte_size: self.byte_size,
            })
    }
}

impl Drop for CoherentBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for CoherentBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoherentBuffer")
            .field("byte_size", &self.byte_size)
            .field("residency", &self.residency())
            .field("host", &self.host_ptr())
            .field("device", &self.device_ptr)
            .field("backend", &self.device.name())
            .finish()
    }
}
