//! Side-effect-free introspection of a virtual vector.

use std::fmt;

use altgpu_buffer::DevicePtr;
use altgpu_core::{ElementKind, Residency};

/// Snapshot of a vector's layout, taken without synchronizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InspectReport {
    /// Element type.
    pub kind: ElementKind,
    /// Logical element count.
    pub length: usize,
    /// Address of the host copy, 0 if absent.
    pub host_addr: usize,
    /// Device allocation, if any.
    pub device_ptr: Option<DevicePtr>,
    /// Coherence state at the time of inspection.
    pub residency: Residency,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VirtualVector<{}> (len={}, host_ptr={:#x}, device_ptr=",
            self.kind, self.length, self.host_addr
        )?;
        match self.device_ptr {
            Some(ptr) => write!(f, "{ptr}")?,
            None => f.write_str("0x0")?,
        }
        write!(f, ", {})", self.residency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_pointers_and_state() {
        let report = InspectReport {
            kind: ElementKind::Real,
            length: 5,
            host_addr: 0x1000,
            device_ptr: None,
            residency: Residency::HostAuthoritative,
        };
        assert_eq!(
            report.to_string(),
            "VirtualVector<real> (len=5, host_ptr=0x1000, device_ptr=0x0, host-authoritative)"
        );
    }

    #[test]
    fn display_renders_device_address() {
        let report = InspectReport {
            kind: ElementKind::Integer,
            length: 3,
            host_addr: 0x40,
            device_ptr: Some(DevicePtr(0x7f00)),
            residency: Residency::Synced,
        };
        assert!(report.to_string().contains("device_ptr=0x7f00"));
    }
}
