//! C-compatible enums and structs for element kinds, residency, option
//! values and inspection reports.

use std::ffi::CStr;
use std::os::raw::c_char;

use altgpu_core::{ElementKind, OptionValue, Residency};
use altgpu_vector::InspectReport;

/// Element kind of a vector.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AltgpuElementKind {
    /// 32-bit signed integers.
    Integer = 0,
    /// 64-bit IEEE-754 floats.
    Real = 1,
}

impl From<ElementKind> for AltgpuElementKind {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Integer => AltgpuElementKind::Integer,
            ElementKind::Real => AltgpuElementKind::Real,
        }
    }
}

impl From<AltgpuElementKind> for ElementKind {
    fn from(kind: AltgpuElementKind) -> Self {
        match kind {
            AltgpuElementKind::Integer => ElementKind::Integer,
            AltgpuElementKind::Real => ElementKind::Real,
        }
    }
}

/// Parse an element kind tag passed from C.
///
/// Returns `None` for a value that is not an [`AltgpuElementKind`].
pub(crate) fn parse_element_kind(raw: i32) -> Option<ElementKind> {
    let kind = match raw {
        x if x == AltgpuElementKind::Integer as i32 => AltgpuElementKind::Integer,
        x if x == AltgpuElementKind::Real as i32 => AltgpuElementKind::Real,
        _ => return None,
    };
    Some(kind.into())
}

/// Coherence state of a vector's buffer.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AltgpuResidency {
    /// Neither side allocated.
    Unallocated = 0,
    /// Host copy is newer.
    HostAuthoritative = 1,
    /// Device copy is newer.
    DeviceAuthoritative = 2,
    /// Both sides agree.
    Synced = 3,
}

impl From<Residency> for AltgpuResidency {
    fn from(r: Residency) -> Self {
        match r {
            Residency::Unallocated => AltgpuResidency::Unallocated,
            Residency::HostAuthoritative => AltgpuResidency::HostAuthoritative,
            Residency::DeviceAuthoritative => AltgpuResidency::DeviceAuthoritative,
            Residency::Synced => AltgpuResidency::Synced,
        }
    }
}

/// Inspection snapshot written by `altgpu_*_inspect`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AltgpuInspect {
    /// Element kind.
    pub kind: AltgpuElementKind,
    /// Logical element count.
    pub length: usize,
    /// Host copy address, 0 if absent.
    pub host_addr: usize,
    /// Device allocation address, 0 if absent.
    pub device_addr: u64,
    /// Coherence state.
    pub residency: AltgpuResidency,
}

impl From<&InspectReport> for AltgpuInspect {
    fn from(report: &InspectReport) -> Self {
        Self {
            kind: report.kind.into(),
            length: report.length,
            host_addr: report.host_addr,
            device_addr: report.device_ptr.map_or(0, |p| p.addr()),
            residency: report.residency.into(),
        }
    }
}

/// Type tag of an [`AltgpuOption`].
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AltgpuOptionKind {
    /// Null value; no payload.
    Null = 0,
    /// Logical; payload in `logical` (0, 1, or the missing marker).
    Logical = 1,
    /// Integer; payload in `integer`.
    Integer = 2,
    /// Real; payload in `real`.
    Real = 3,
    /// Text; payload in `text` (NUL-terminated, may be null).
    Text = 4,
}

/// Missing-value marker for [`AltgpuOption::logical`].
pub const ALTGPU_LOGICAL_NA: i32 = i32::MIN;

/// A host option value passed across the C boundary.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct AltgpuOption {
    /// Which payload field is meaningful, as an [`AltgpuOptionKind`] value.
    pub kind: i32,
    /// Logical payload: 0 false, nonzero true, [`ALTGPU_LOGICAL_NA`] missing.
    pub logical: i32,
    /// Integer payload.
    pub integer: i32,
    /// Real payload.
    pub real: f64,
    /// Text payload.
    pub text: *const c_char,
}

impl AltgpuOption {
    /// Convert to an [`OptionValue`], or `None` if `kind` is not a known
    /// [`AltgpuOptionKind`] tag.
    ///
    /// # Safety
    ///
    /// For `Text`, `text` must be null or point to a NUL-terminated string
    /// valid for the duration of the call.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn to_value(&self) -> Option<OptionValue> {
        let value = match self.kind {
            x if x == AltgpuOptionKind::Null as i32 => OptionValue::Null,
            x if x == AltgpuOptionKind::Logical as i32 => OptionValue::Logical(match self.logical {
                ALTGPU_LOGICAL_NA => None,
                0 => Some(false),
                _ => Some(true),
            }),
            x if x == AltgpuOptionKind::Integer as i32 => OptionValue::Integer(self.integer),
            x if x == AltgpuOptionKind::Real as i32 => OptionValue::Real(self.real),
            x if x == AltgpuOptionKind::Text as i32 => {
                if self.text.is_null() {
                    OptionValue::Text(String::new())
                } else {
                    // SAFETY: non-null and NUL-terminated per caller contract.
                    let text = unsafe { CStr::from_ptr(self.text) };
                    OptionValue::Text(text.to_string_lossy().into_owned())
                }
            }
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altgpu_buffer::DevicePtr;

    fn option(kind: AltgpuOptionKind, logical: i32) -> AltgpuOption {
        AltgpuOption {
            kind: kind as i32,
            logical,
            integer: 1,
            real: 1.0,
            text: std::ptr::null(),
        }
    }

    #[test]
    #[allow(unsafe_code)]
    fn logical_payload_decoding() {
        let value = |o: AltgpuOption| unsafe { o.to_value() }.unwrap();
        assert_eq!(
            value(option(AltgpuOptionKind::Logical, 1)),
            OptionValue::Logical(Some(true))
        );
        assert_eq!(
            value(option(AltgpuOptionKind::Logical, 0)),
            OptionValue::Logical(Some(false))
        );
        assert_eq!(
            value(option(AltgpuOptionKind::Logical, ALTGPU_LOGICAL_NA)),
            OptionValue::Logical(None)
        );
        assert_eq!(
            value(option(AltgpuOptionKind::Integer, 1)),
            OptionValue::Integer(1)
        );
        assert_eq!(value(option(AltgpuOptionKind::Null, 1)), OptionValue::Null);
    }

    #[test]
    #[allow(unsafe_code)]
    fn text_payload_is_copied() {
        let raw = c"TRUE";
        let mut o = option(AltgpuOptionKind::Text, 0);
        o.text = raw.as_ptr();
        assert_eq!(unsafe { o.to_value() }, Some(OptionValue::Text("TRUE".into())));
    }

    #[test]
    #[allow(unsafe_code)]
    fn unknown_option_tag_is_rejected() {
        let mut o = option(AltgpuOptionKind::Logical, 1);
        o.kind = 42;
        assert_eq!(unsafe { o.to_value() }, None);
        o.kind = -1;
        assert_eq!(unsafe { o.to_value() }, None);
    }

    #[test]
    fn element_kind_tags() {
        assert_eq!(parse_element_kind(0), Some(ElementKind::Integer));
        assert_eq!(parse_element_kind(1), Some(ElementKind::Real));
        assert_eq!(parse_element_kind(2), None);
        assert_eq!(parse_element_kind(i32::MIN), None);
    }

    #[test]
    fn inspect_conversion() {
        let report = InspectReport {
            kind: ElementKind::Real,
            length: 4,
            host_addr: 0x40,
            device_ptr: Some(DevicePtr(0x7f00)),
            residency: Residency::Synced,
        };
        let c = AltgpuInspect::from(&report);
        assert_eq!(c.kind, AltgpuElementKind::Real);
        assert_eq!(c.length, 4);
        assert_eq!(c.device_addr, 0x7f00);
        assert_eq!(c.residency, AltgpuResidency::Synced);
    }
}
