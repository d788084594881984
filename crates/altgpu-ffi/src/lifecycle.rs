//! Library lifecycle FFI: initialization, class lookup and the debug option.
//!
//! `altgpu_init` registers the vector classes in the process-wide
//! [`ClassRegistry`] and reads the debug option from the environment.
//! Vector creation refuses to run until it has.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::{Arc, LazyLock, Mutex, OnceLock};

use altgpu_buffer::{DeviceBackend, EmulatedDevice};
use altgpu_core::{debug_trace, diag, flag_from_option, ElementKind, EnvOptions};
use altgpu_vector::{is_virtual_vector_class, register_classes, ClassRegistry};

use crate::status::AltgpuStatus;
use crate::types::{parse_element_kind, AltgpuOption};

static CLASSES: LazyLock<Mutex<ClassRegistry>> = LazyLock::new(|| Mutex::new(ClassRegistry::new()));

static DEVICE: OnceLock<Arc<EmulatedDevice>> = OnceLock::new();

/// The process-wide device shared by every vector.
pub(crate) fn device() -> Arc<dyn DeviceBackend> {
    DEVICE
        .get_or_init(|| Arc::new(EmulatedDevice::new()))
        .clone()
}

/// Whether the class for `kind` has been registered.
///
/// `None` if the registry lock is poisoned.
pub(crate) fn class_registered(kind: ElementKind) -> Option<bool> {
    Some(CLASSES.lock().ok()?.id_for_kind(kind).is_some())
}

// ── FFI functions ───────────────────────────────────────────────

/// Register the vector classes and read the debug option from the
/// environment. Only the first successful call has any effect.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_init() -> i32 {
    ffi_guard!({
        let mut classes = ffi_lock!(CLASSES);
        if !classes.is_empty() {
            return AltgpuStatus::Ok as i32;
        }
        let enabled = diag::refresh_debug_option(&EnvOptions);
        if let Err(e) = register_classes(&mut *classes) {
            return AltgpuStatus::from(&e) as i32;
        }
        debug_trace!(
            "[altgpu_init] {} classes registered, debug = {enabled}",
            classes.len()
        );
        AltgpuStatus::Ok as i32
    })
}

/// Set the debug flag from a host option value.
///
/// Only a logical `TRUE` enables logging; any other value disables it.
/// A null `value` means the option is unset. An unknown `kind` tag
/// returns `InvalidArgument` and leaves the flag alone.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_set_debug_option(value: *const AltgpuOption) -> i32 {
    ffi_guard!({
        let parsed = if value.is_null() {
            None
        } else {
            // SAFETY: non-null and valid per caller contract.
            match unsafe { (*value).to_value() } {
                Some(v) => Some(v),
                None => return AltgpuStatus::InvalidArgument as i32,
            }
        };
        diag::set_debug_enabled(flag_from_option(parsed.as_ref()));
        AltgpuStatus::Ok as i32
    })
}

/// Whether debug logging is enabled (1) or not (0).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_debug_enabled() -> u8 {
    ffi_guard_or!(0, { u8::from(diag::debug_enabled()) })
}

/// Whether `name` is a virtual vector class name (1) or not (0).
///
/// Returns 0 for a null pointer.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_is_vector_class(name: *const c_char) -> u8 {
    ffi_guard_or!(0, {
        if name.is_null() {
            return 0;
        }
        // SAFETY: non-null and NUL-terminated per caller contract.
        let name = unsafe { CStr::from_ptr(name) };
        u8::from(is_virtual_vector_class(&name.to_string_lossy()))
    })
}

/// Number of handles of `kind` (an `AltgpuElementKind` value) whose
/// vector is neither disposed nor released, written to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_live_handles(kind: i32, out: *mut usize) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return AltgpuStatus::InvalidArgument as i32;
        }
        let count = match parse_element_kind(kind) {
            Some(ElementKind::Integer) => ffi_lock!(crate::vector::table::<i32>()).len(),
            Some(ElementKind::Real) => ffi_lock!(crate::vector::table::<f64>()).len(),
            None => return AltgpuStatus::InvalidArgument as i32,
        };
        // SAFETY: out is valid per caller contract.
        unsafe { *out = count };
        AltgpuStatus::Ok as i32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AltgpuElementKind, AltgpuOptionKind};

    #[test]
    fn init_is_repeatable() {
        assert_eq!(altgpu_init(), AltgpuStatus::Ok as i32);
        assert_eq!(altgpu_init(), AltgpuStatus::Ok as i32);
        assert_eq!(class_registered(ElementKind::Integer), Some(true));
        assert_eq!(class_registered(ElementKind::Real), Some(true));
    }

    #[test]
    fn class_name_check() {
        assert_eq!(altgpu_is_vector_class(c"altvec_real".as_ptr()), 1);
        assert_eq!(altgpu_is_vector_class(c"numeric".as_ptr()), 0);
        assert_eq!(altgpu_is_vector_class(std::ptr::null()), 0);
    }

    #[test]
    fn debug_option_toggle() {
        altgpu_init();
        let mut option = AltgpuOption {
            kind: AltgpuOptionKind::Logical as i32,
            logical: 1,
            integer: 0,
            real: 0.0,
            text: std::ptr::null(),
        };
        assert_eq!(altgpu_set_debug_option(&option), AltgpuStatus::Ok as i32);
        assert_eq!(altgpu_debug_enabled(), 1);

        option.kind = AltgpuOptionKind::Integer as i32;
        altgpu_set_debug_option(&option);
        assert_eq!(altgpu_debug_enabled(), 0);

        option.kind = AltgpuOptionKind::Logical as i32;
        assert_eq!(altgpu_set_debug_option(&option), AltgpuStatus::Ok as i32);
        option.kind = 99;
        assert_eq!(
            altgpu_set_debug_option(&option),
            AltgpuStatus::InvalidArgument as i32
        );
        assert_eq!(altgpu_debug_enabled(), 1);

        altgpu_set_debug_option(std::ptr::null());
        assert_eq!(altgpu_debug_enabled(), 0);
    }

    #[test]
    fn live_handles_rejects_null() {
        assert_eq!(
            altgpu_live_handles(AltgpuElementKind::Real as i32, std::ptr::null_mut()),
            AltgpuStatus::InvalidArgument as i32
        );
    }

    #[test]
    fn live_handles_rejects_unknown_kind() {
        let mut count = usize::MAX;
        assert_eq!(
            altgpu_live_handles(7, &mut count),
            AltgpuStatus::InvalidArgument as i32
        );
        assert_eq!(count, usize::MAX);
    }
}
