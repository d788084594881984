//! Device memory backends.
//!
//! A [`DeviceBackend`] allocates, frees and copies opaque device
//! regions addressed by [`DevicePtr`]. Device addresses are never
//! dereferenced on the host; all traffic goes through the copy calls.
//!
//! [`EmulatedDevice`] keeps "device" memory in a separate host-side pool.
//! It is the backend used when no accelerator driver is wired in, and it
//! behaves like a real driver in the ways the coherence protocol can
//! observe: distinct non-zero addresses, capacity exhaustion, and copy
//! failures on unknown addresses or out-of-range transfers.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use altgpu_core::{BufferError, CopyDirection, Side};
use indexmap::IndexMap;

/// Opaque address of a device allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DevicePtr(pub u64);

impl DevicePtr {
    /// Raw address value.
    pub fn addr(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Accelerator memory operations used by the coherent buffer.
///
/// Implementations must be thread-safe: a single backend is shared by
/// every buffer in the process.
pub trait DeviceBackend: Send + Sync + fmt::Debug {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Allocate `bytes` bytes of device memory.
    fn alloc(&self, bytes: usize) -> Result<DevicePtr, BufferError>;

    /// Release an allocation returned by [`alloc`](Self::alloc).
    ///
    /// Freeing an unknown pointer is a no-op.
    fn free(&self, ptr: DevicePtr);

    /// Copy `src` into the allocation at `dst`, starting `offset` bytes in.
    fn copy_to_device(&self, dst: DevicePtr, offset: usize, src: &[u8])
        -> Result<(), BufferError>;

    /// Copy `dst.len()` bytes out of the allocation at `src`, starting
    /// `offset` bytes in.
    fn copy_to_host(&self, dst: &mut [u8], src: DevicePtr, offset: usize)
        -> Result<(), BufferError>;
}

/// First address handed out by [`EmulatedDevice`].
const BASE_ADDRESS: u64 = 0x7f00_0000_0000;

/// Address granularity of [`EmulatedDevice`] allocations.
const ADDRESS_ALIGN: u64 = 256;

struct DeviceState {
    allocations: IndexMap<u64, Box<[u8]>>,
    next_addr: u64,
    bytes_in_use: usize,
}

/// Device memory emulated in a host-side pool.
pub struct EmulatedDevice {
    state: Mutex<DeviceState>,
    capacity: Option<usize>,
}

impl EmulatedDevice {
    /// Create an emulated device with unbounded capacity.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an emulated device that refuses allocations once
    /// `capacity` bytes are in use.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(Some(capacity))
    }

    fn build(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(DeviceState {
                allocations: IndexMap::new(),
                next_addr: BASE_ADDRESS,
                bytes_in_use: 0,
            }),
            capacity,
        }
    }

    /// Number of live allocations.
    pub fn live_allocations(&self) -> usize {
        self.lock().allocations.len()
    }

    /// Total bytes held by live allocations.
    pub fn bytes_in_use(&self) -> usize {
        self.lock().bytes_in_use
    }

    /// Whether `ptr` refers to a live allocation.
    pub fn is_live(&self, ptr: DevicePtr) -> bool {
        self.lock().allocations.contains_key(&ptr.0)
    }

    // The state is plain data with no invariants a panicking holder can
    // break halfway, so a poisoned lock is still usable.
    fn lock(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EmulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EmulatedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("EmulatedDevice")
            .field("live_allocations", &state.allocations.len())
            .field("bytes_in_use", &state.bytes_in_use)
            .field("capacity", &self.capacity)
            .finish()
    }
}

fn copy_failed(direction: CopyDirection, bytes: usize, reason: String) -> BufferError {
    BufferError::CopyFailed {
        direction,
        bytes,
        reason,
    }
}

fn region<'a>(
    allocations: &'a mut IndexMap<u64, Box<[u8]>>,
    ptr: DevicePtr,
    offset: usize,
    len: usize,
    direction: CopyDirection,
) -> Result<&'a mut [u8], BufferError> {
    let data = allocations
        .get_mut(&ptr.0)
        .ok_or_else(|| copy_failed(direction, len, format!("unknown device address {ptr}")))?;
    let size = data.len();
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= size)
        .ok_or_else(|| {
            copy_failed(
                direction,
                len,
                format!("range at offset {offset} exceeds device allocation of {size} bytes"),
            )
        })?;
    Ok(&mut data[offset..end])
}

impl DeviceBackend for EmulatedDevice {
    fn name(&self) -> &str {
        "emulated"
    }

    fn alloc(&self, bytes: usize) -> Result<DevicePtr, BufferError> {
        let failed = BufferError::AllocationFailed {
            side: Side::Device,
            bytes,
        };
        let mut state = self.lock();
        let in_use = state.bytes_in_use.checked_add(bytes).ok_or(failed.clone())?;
        if self.capacity.is_some_and(|cap| in_use > cap) {
            return Err(failed);
        }
        let span = (bytes as u64).max(1).div_ceil(ADDRESS_ALIGN) * ADDRESS_ALIGN;
        let addr = state.next_addr;
        state.next_addr = addr.checked_add(span).ok_or(failed)?;
        state
            .allocations
            .insert(addr, vec![0u8; bytes].into_boxed_slice());
        state.bytes_in_use = in_use;
        Ok(DevicePtr(addr))
    }

    fn free(&self, ptr: DevicePtr) {
        let mut state = self.lock();
        if let Some(data) = state.allocations.swap_remove(&ptr.0) {
            state.bytes_in_use -= data.len();
        }
    }

    fn copy_to_device(
        &self,
        dst: DevicePtr,
        offset: usize,
        src: &[u8],
    ) -> Result<(), BufferError> {
        let mut state = self.lock();
        region(
            &mut state.allocations,
            dst,
            offset,
            src.len(),
            CopyDirection::HostToDevice,
        )?
        .copy_from_slice(src);
        Ok(())
    }

    fn copy_to_host(
        &self,
        dst: &mut [u8],
        src: DevicePtr,
        offset: usize,
    ) -> Result<(), BufferError> {
        let mut state = self.lock();
        let data = region(
            &mut state.allocations,
            src,
            offset,
            dst.len(),
            CopyDirection::DeviceToHost,
        )?;
        dst.copy_from_slice(data);
        Ok(())
    }
}
