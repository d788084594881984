//! Physical locations of buffer data and the coherence state machine.

use std::fmt;

/// One of the two physical copies a buffer may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// General-purpose system memory.
    Host,
    /// Accelerator memory.
    Device,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Device => f.write_str("device"),
        }
    }
}

/// Direction of a synchronizing copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CopyDirection {
    /// Host copy is pushed to the device.
    HostToDevice,
    /// Device copy is pulled back to the host.
    DeviceToHost,
}

impl fmt::Display for CopyDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostToDevice => f.write_str("host->device"),
            Self::DeviceToHost => f.write_str("device->host"),
        }
    }
}

/// Coherence state of a buffer, derived from its allocations and dirty flags.
///
/// ```text
/// Unallocated --allocate_host--> HostAuthoritative <--host write--+
///      |                              |                          |
///      +--allocate_device--> DeviceAuthoritative   synchronize   |
///                                     |                |         |
///                                     +--synchronize-> Synced ---+
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Residency {
    /// Neither side is allocated.
    Unallocated,
    /// The host copy is newer than the device copy (or the device copy is absent).
    HostAuthoritative,
    /// The device copy is newer than the host copy (or the host copy is absent).
    DeviceAuthoritative,
    /// Both allocated sides hold identical bytes.
    Synced,
}

impl Residency {
    /// Derive the state from raw buffer flags.
    ///
    /// `host_dirty && device_dirty` is unreachable for a well-formed buffer;
    /// it resolves to `HostAuthoritative` so callers never observe `Synced`
    /// for an incoherent buffer.
    pub fn from_flags(allocated: bool, host_dirty: bool, device_dirty: bool) -> Self {
        if !allocated {
            Self::Unallocated
        } else if host_dirty {
            Self::HostAuthoritative
        } else if device_dirty {
            Self::DeviceAuthoritative
        } else {
            Self::Synced
        }
    }
}

impl fmt::Display for Residency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unallocated => f.write_str("unallocated"),
            Self::HostAuthoritative => f.write_str("host-authoritative"),
            Self::DeviceAuthoritative => f.write_str("device-authoritative"),
            Self::Synced => f.write_str("synced"),
        }
    }
}
