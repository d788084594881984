//! Owned, aligned host allocations.
//!
//! The only module in this crate allowed to use `unsafe`. Every block
//! carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;

use altgpu_core::{BufferError, Side};

/// A zero-initialised host region with a fixed size and alignment.
///
/// Zero-byte regions allocate nothing and point at an aligned dangling
/// address, so typed views of an empty region are still well-aligned.
/// The region is freed exactly once, on drop.
pub(crate) struct HostAllocation {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: the allocation is exclusively owned and has no interior
// mutability; access is mediated by `&self` / `&mut self`.
unsafe impl Send for HostAllocation {}
// SAFETY: shared references only permit reads of the owned bytes.
unsafe impl Sync for HostAllocation {}

impl HostAllocation {
    /// Allocate `bytes` zeroed bytes aligned to `align`.
    ///
    /// `align` must be a power of two (guaranteed by `BufferConfig::validate`).
    pub(crate) fn zeroed(bytes: usize, align: usize) -> Result<Self, BufferError> {
        let failed = BufferError::AllocationFailed {
            side: Side::Host,
            bytes,
        };
        let layout = Layout::from_size_align(bytes, align).map_err(|_| failed.clone())?;
        if bytes == 0 {
            let ptr = NonNull::new(std::ptr::without_provenance_mut::<u8>(layout.align()))
                .ok_or(failed)?;
            return Ok(Self { ptr, layout });
        }
        // SAFETY: `layout` has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(failed)?;
        Ok(Self { ptr, layout })
    }

    /// Size of the region in bytes.
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    /// Start of the region.
    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// The region as bytes.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        // SAFETY: `ptr` is non-null, aligned, and valid for `len()` initialised
        // bytes (zeroed at allocation); for a zero-length region any aligned
        // non-null pointer is valid.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    /// The region as mutable bytes.
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `as_bytes`, and `&mut self` guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
    }
}

impl Drop for HostAllocation {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: `ptr` was returned by `alloc_zeroed` with this exact layout
            // and is deallocated only here.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        }
    }
}

impl fmt::Debug for HostAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostAllocation")
            .field("ptr", &self.ptr)
            .field("len", &self.len())
            .field("align", &self.layout.align())
            .finish()
    }
}
