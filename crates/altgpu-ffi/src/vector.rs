//! Vector FFI: create, dispose, release and the lazy-vector protocol for
//! integer and real vectors.
//!
//! Each element kind has its own handle table. The C functions are thin
//! per-kind wrappers over generic bodies that resolve the handle, run
//! one operation and translate the outcome into an [`AltgpuStatus`].
//!
//! Handle states, as the host sees them:
//!
//! - live: every call works.
//! - disposed (`altgpu_*_dispose`, the host's finalizer): the vector and
//!   its buffers are gone and the slot is queued for reuse; calls return
//!   `Freed` until another vector takes the slot.
//! - released (`altgpu_*_release`): the handle itself is gone; calls
//!   return `InvalidHandle`.

use std::sync::Mutex;

use altgpu_core::Element;
use altgpu_vector::{LazyVector, VectorHandle};

use crate::handle::HandleTable;
use crate::lifecycle::{class_registered, device};
use crate::status::AltgpuStatus;
use crate::types::{AltgpuInspect, AltgpuResidency};

static INT_VECTORS: Mutex<HandleTable<VectorHandle<i32>>> = Mutex::new(HandleTable::new());
static REAL_VECTORS: Mutex<HandleTable<VectorHandle<f64>>> = Mutex::new(HandleTable::new());

/// Element types with a handle table.
pub(crate) trait FfiElement: Element {
    fn vectors() -> &'static Mutex<HandleTable<VectorHandle<Self>>>;
}

impl FfiElement for i32 {
    fn vectors() -> &'static Mutex<HandleTable<VectorHandle<Self>>> {
        &INT_VECTORS
    }
}

impl FfiElement for f64 {
    fn vectors() -> &'static Mutex<HandleTable<VectorHandle<Self>>> {
        &REAL_VECTORS
    }
}

pub(crate) fn table<T: FfiElement>() -> &'static Mutex<HandleTable<VectorHandle<T>>> {
    T::vectors()
}

fn status_of(result: Result<(), AltgpuStatus>) -> i32 {
    match result {
        Ok(()) => AltgpuStatus::Ok as i32,
        Err(status) => status as i32,
    }
}

/// Resolve `handle` in `T`'s table and run `op` on it with the table locked.
fn with_vector<T: FfiElement>(
    handle: u64,
    op: impl FnOnce(&mut VectorHandle<T>) -> Result<(), AltgpuStatus>,
) -> i32 {
    let mut vectors = ffi_lock!(table::<T>());
    match vectors.get_mut(handle) {
        Ok(vector) => status_of(op(vector)),
        Err(stale) => stale.status() as i32,
    }
}

fn check_out<P>(out: *mut P) -> Result<(), AltgpuStatus> {
    if out.is_null() {
        Err(AltgpuStatus::InvalidArgument)
    } else {
        Ok(())
    }
}

// ── Generic bodies ──────────────────────────────────────────────

#[allow(unsafe_code)]
fn create<T: FfiElement>(length: usize, out: *mut u64) -> i32 {
    if out.is_null() {
        return AltgpuStatus::InvalidArgument as i32;
    }
    match class_registered(T::KIND) {
        Some(true) => {}
        Some(false) => return AltgpuStatus::NotInitialized as i32,
        None => return AltgpuStatus::InternalError as i32,
    }
    let vector = match VectorHandle::<T>::create(length, device()) {
        Ok(v) => v,
        Err(e) => return AltgpuStatus::from(&e) as i32,
    };
    let handle = ffi_lock!(table::<T>()).insert(vector);
    // SAFETY: out is non-null and valid per caller contract.
    unsafe { *out = handle };
    AltgpuStatus::Ok as i32
}

fn dispose<T: FfiElement>(handle: u64) -> i32 {
    let mut vectors = ffi_lock!(table::<T>());
    match vectors.dispose(handle) {
        Ok(Some(mut vector)) => {
            vector.dispose();
            AltgpuStatus::Ok as i32
        }
        Ok(None) => AltgpuStatus::Ok as i32,
        Err(stale) => stale.status() as i32,
    }
}

fn release<T: FfiElement>(handle: u64) -> i32 {
    match ffi_lock!(table::<T>()).remove(handle) {
        Ok(_) => AltgpuStatus::Ok as i32,
        Err(stale) => stale.status() as i32,
    }
}

#[allow(unsafe_code)]
fn length<T: FfiElement>(handle: u64, out: *mut usize) -> i32 {
    with_vector::<T>(handle, |vector| {
        check_out(out)?;
        let len = vector.length()?;
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = len };
        Ok(())
    })
}

#[allow(unsafe_code)]
fn elt<T: FfiElement>(handle: u64, index: usize, out: *mut T) -> i32 {
    with_vector::<T>(handle, |vector| {
        check_out(out)?;
        if index >= vector.length()? {
            return Err(AltgpuStatus::OutOfRange);
        }
        let value = vector.elt(index)?;
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = value };
        Ok(())
    })
}

#[allow(unsafe_code)]
fn get_region<T: FfiElement>(
    handle: u64,
    start: usize,
    buf: *mut T,
    size: usize,
    copied_out: *mut usize,
) -> i32 {
    with_vector::<T>(handle, |vector| {
        check_out(copied_out)?;
        if size > 0 {
            check_out(buf)?;
        }
        let out: &mut [T] = if size == 0 {
            &mut []
        } else {
            // SAFETY: buf points to `size` writable elements per caller contract.
            unsafe { std::slice::from_raw_parts_mut(buf, size) }
        };
        let copied = vector.get_region(start, out)?;
        // SAFETY: copied_out is non-null and valid per caller contract.
        unsafe { *copied_out = copied };
        Ok(())
    })
}

#[allow(unsafe_code)]
fn dataptr<T: FfiElement>(handle: u64, writable: u8, out: *mut *mut T) -> i32 {
    with_vector::<T>(handle, |vector| {
        check_out(out)?;
        let ptr = vector.dataptr(writable != 0)?;
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = ptr };
        Ok(())
    })
}

#[allow(unsafe_code)]
fn dataptr_or_null<T: FfiElement>(handle: u64, out: *mut *const T) -> i32 {
    with_vector::<T>(handle, |vector| {
        check_out(out)?;
        let ptr = vector.dataptr_or_null()?;
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = ptr };
        Ok(())
    })
}

#[allow(unsafe_code)]
fn inspect<T: FfiElement>(handle: u64, out: *mut AltgpuInspect) -> i32 {
    with_vector::<T>(handle, |vector| {
        check_out(out)?;
        let report = vector.inspect()?;
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = AltgpuInspect::from(&report) };
        Ok(())
    })
}

#[allow(unsafe_code)]
fn residency<T: FfiElement>(handle: u64, out: *mut AltgpuResidency) -> i32 {
    with_vector::<T>(handle, |vector| {
        check_out(out)?;
        let residency = vector.resolve()?.residency();
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = residency.into() };
        Ok(())
    })
}

/// Which copy a bulk write targets.
#[derive(Clone, Copy)]
enum Target {
    Host,
    Device,
}

#[allow(unsafe_code)]
fn write<T: FfiElement>(
    handle: u64,
    target: Target,
    start: usize,
    values: *const T,
    count: usize,
) -> i32 {
    with_vector::<T>(handle, |vector| {
        if count == 0 {
            vector.resolve()?;
            return Ok(());
        }
        if values.is_null() {
            return Err(AltgpuStatus::InvalidArgument);
        }
        // SAFETY: values points to `count` readable elements per caller contract.
        let values = unsafe { std::slice::from_raw_parts(values, count) };
        let v = vector.resolve_mut()?;
        match target {
            Target::Host => v.write_host(start, values)?,
            Target::Device => v.write_device(start, values)?,
        }
        Ok(())
    })
}

#[allow(unsafe_code)]
fn read_device<T: FfiElement>(handle: u64, start: usize, buf: *mut T, count: usize) -> i32 {
    with_vector::<T>(handle, |vector| {
        let v = vector.resolve_mut()?;
        if count == 0 {
            return Ok(());
        }
        check_out(buf)?;
        // SAFETY: buf points to `count` writable elements per caller contract.
        let out = unsafe { std::slice::from_raw_parts_mut(buf, count) };
        v.read_device(start, out)?;
        Ok(())
    })
}

fn sync<T: FfiElement>(handle: u64) -> i32 {
    with_vector::<T>(handle, |vector| {
        vector.resolve_mut()?.synchronize()?;
        Ok(())
    })
}

// ── Integer vectors ─────────────────────────────────────────────

/// Create an integer vector of `length` zeroed elements. Writes the
/// handle to `out`.
///
/// Returns `NotInitialized` if `altgpu_init` has not run.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_create(length: usize, out: *mut u64) -> i32 {
    ffi_guard!({ create::<i32>(length, out) })
}

/// Finalizer: free the vector and reclaim its slot. Later calls on the
/// handle return `Freed`; disposing twice is a no-op.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_dispose(handle: u64) -> i32 {
    ffi_guard!({ dispose::<i32>(handle) })
}

/// Forget the handle, freeing the vector if it was not disposed. Later
/// calls return `InvalidHandle`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_release(handle: u64) -> i32 {
    ffi_guard!({ release::<i32>(handle) })
}

/// Logical length, written to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_length(handle: u64, out: *mut usize) -> i32 {
    ffi_guard!({ length::<i32>(handle, out) })
}

/// Element at `index`, written to `out`. Synchronizes first.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_elt(handle: u64, index: usize, out: *mut i32) -> i32 {
    ffi_guard!({ elt::<i32>(handle, index, out) })
}

/// Copy up to `size` elements from `start` into `buf`; the count copied
/// is written to `copied_out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_get_region(
    handle: u64,
    start: usize,
    buf: *mut i32,
    size: usize,
    copied_out: *mut usize,
) -> i32 {
    ffi_guard!({ get_region::<i32>(handle, start, buf, size, copied_out) })
}

/// Materialize on the host; nonzero `writable` makes the host copy
/// authoritative.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_dataptr(handle: u64, writable: u8, out: *mut *mut i32) -> i32 {
    ffi_guard!({ dataptr::<i32>(handle, writable, out) })
}

/// Materialize read-only; writes null if there is no host copy.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_dataptr_or_null(handle: u64, out: *mut *const i32) -> i32 {
    ffi_guard!({ dataptr_or_null::<i32>(handle, out) })
}

/// Describe the vector without synchronizing.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_inspect(handle: u64, out: *mut AltgpuInspect) -> i32 {
    ffi_guard!({ inspect::<i32>(handle, out) })
}

/// Current coherence state.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_residency(handle: u64, out: *mut AltgpuResidency) -> i32 {
    ffi_guard!({ residency::<i32>(handle, out) })
}

/// Write `count` elements from `values` into the host copy at `start`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_write_host(
    handle: u64,
    start: usize,
    values: *const i32,
    count: usize,
) -> i32 {
    ffi_guard!({ write::<i32>(handle, Target::Host, start, values, count) })
}

/// Write `count` elements from `values` into the device copy at `start`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_write_device(
    handle: u64,
    start: usize,
    values: *const i32,
    count: usize,
) -> i32 {
    ffi_guard!({ write::<i32>(handle, Target::Device, start, values, count) })
}

/// Synchronize, then copy `count` device elements from `start` into
/// `buf`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_read_device(
    handle: u64,
    start: usize,
    buf: *mut i32,
    count: usize,
) -> i32 {
    ffi_guard!({ read_device::<i32>(handle, start, buf, count) })
}

/// Bring host and device copies into agreement.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_int_sync(handle: u64) -> i32 {
    ffi_guard!({ sync::<i32>(handle) })
}

// ── Real vectors ────────────────────────────────────────────────

/// Create a real vector of `length` zeroed elements. Writes the handle
/// to `out`.
///
/// Returns `NotInitialized` if `altgpu_init` has not run.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_create(length: usize, out: *mut u64) -> i32 {
    ffi_guard!({ create::<f64>(length, out) })
}

/// Finalizer: free the vector and reclaim its slot. Later calls on the
/// handle return `Freed`; disposing twice is a no-op.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_dispose(handle: u64) -> i32 {
    ffi_guard!({ dispose::<f64>(handle) })
}

/// Forget the handle, freeing the vector if it was not disposed. Later
/// calls return `InvalidHandle`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_release(handle: u64) -> i32 {
    ffi_guard!({ release::<f64>(handle) })
}

/// Logical length, written to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_length(handle: u64, out: *mut usize) -> i32 {
    ffi_guard!({ length::<f64>(handle, out) })
}

/// Element at `index`, written to `out`. Synchronizes first.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_elt(handle: u64, index: usize, out: *mut f64) -> i32 {
    ffi_guard!({ elt::<f64>(handle, index, out) })
}

/// Copy up to `size` elements from `start` into `buf`; the count copied
/// is written to `copied_out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_get_region(
    handle: u64,
    start: usize,
    buf: *mut f64,
    size: usize,
    copied_out: *mut usize,
) -> i32 {
    ffi_guard!({ get_region::<f64>(handle, start, buf, size, copied_out) })
}

/// Materialize on the host; nonzero `writable` makes the host copy
/// authoritative.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_dataptr(handle: u64, writable: u8, out: *mut *mut f64) -> i32 {
    ffi_guard!({ dataptr::<f64>(handle, writable, out) })
}

/// Materialize read-only; writes null if there is no host copy.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_dataptr_or_null(handle: u64, out: *mut *const f64) -> i32 {
    ffi_guard!({ dataptr_or_null::<f64>(handle, out) })
}

/// Describe the vector without synchronizing.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_inspect(handle: u64, out: *mut AltgpuInspect) -> i32 {
    ffi_guard!({ inspect::<f64>(handle, out) })
}

/// Current coherence state.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_residency(handle: u64, out: *mut AltgpuResidency) -> i32 {
    ffi_guard!({ residency::<f64>(handle, out) })
}

/// Write `count` elements from `values` into the host copy at `start`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_write_host(
    handle: u64,
    start: usize,
    values: *const f64,
    count: usize,
) -> i32 {
    ffi_guard!({ write::<f64>(handle, Target::Host, start, values, count) })
}

/// Write `count` elements from `values` into the device copy at `start`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_write_device(
    handle: u64,
    start: usize,
    values: *const f64,
    count: usize,
) -> i32 {
    ffi_guard!({ write::<f64>(handle, Target::Device, start, values, count) })
}

/// Synchronize, then copy `count` device elements from `start` into
/// `buf`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_read_device(
    handle: u64,
    start: usize,
    buf: *mut f64,
    count: usize,
) -> i32 {
    ffi_guard!({ read_device::<f64>(handle, start, buf, count) })
}

/// Bring host and device copies into agreement.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn altgpu_real_sync(handle: u64) -> i32 {
    ffi_guard!({ sync::<f64>(handle) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::altgpu_init;

    const OK: i32 = AltgpuStatus::Ok as i32;

    fn real_vector(values: &[f64]) -> u64 {
        assert_eq!(altgpu_init(), OK);
        let mut h = 0u64;
        assert_eq!(altgpu_real_create(values.len(), &mut h), OK);
        assert_eq!(
            altgpu_real_write_host(h, 0, values.as_ptr(), values.len()),
            OK
        );
        h
    }

    fn int_vector(values: &[i32]) -> u64 {
        assert_eq!(altgpu_init(), OK);
        let mut h = 0u64;
        assert_eq!(altgpu_int_create(values.len(), &mut h), OK);
        assert_eq!(
            altgpu_int_write_host(h, 0, values.as_ptr(), values.len()),
            OK
        );
        h
    }

    #[test]
    fn round_trip_elt() {
        let h = real_vector(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut value = 0.0;
        assert_eq!(altgpu_real_elt(h, 2, &mut value), OK);
        assert_eq!(value, 3.0);

        let mut state = AltgpuResidency::Unallocated;
        assert_eq!(altgpu_real_residency(h, &mut state), OK);
        assert_eq!(state, AltgpuResidency::Synced);
        assert_eq!(altgpu_real_release(h), OK);
    }

    #[test]
    fn device_write_visible_through_elt() {
        let h = int_vector(&[10, 20, 30]);
        assert_eq!(altgpu_int_sync(h), OK);
        assert_eq!(altgpu_int_write_device(h, 0, [99].as_ptr(), 1), OK);

        let mut value = 0;
        assert_eq!(altgpu_int_elt(h, 0, &mut value), OK);
        assert_eq!(value, 99);
        assert_eq!(altgpu_int_elt(h, 1, &mut value), OK);
        assert_eq!(value, 20);
        assert_eq!(altgpu_int_release(h), OK);
    }

    #[test]
    fn get_region_clamps_and_reports_count() {
        let h = int_vector(&[1, 2, 3, 4, 5]);
        let mut buf = [0; 4];
        let mut copied = 0usize;
        assert_eq!(
            altgpu_int_get_region(h, 3, buf.as_mut_ptr(), buf.len(), &mut copied),
            OK
        );
        assert_eq!(copied, 2);
        assert_eq!(&buf[..2], &[4, 5]);

        assert_eq!(
            altgpu_int_get_region(h, 9, std::ptr::null_mut(), 0, &mut copied),
            OK
        );
        assert_eq!(copied, 0);
        assert_eq!(altgpu_int_release(h), OK);
    }

    #[test]
    fn dispose_then_release() {
        let h = real_vector(&[1.0, 2.0]);
        assert_eq!(altgpu_real_dispose(h), OK);
        assert_eq!(altgpu_real_dispose(h), OK);

        let mut len = 0usize;
        assert_eq!(
            altgpu_real_length(h, &mut len),
            AltgpuStatus::Freed as i32
        );
        let mut value = 0.0;
        assert_eq!(
            altgpu_real_elt(h, 0, &mut value),
            AltgpuStatus::Freed as i32
        );

        assert_eq!(altgpu_real_release(h), OK);
        assert_eq!(
            altgpu_real_length(h, &mut len),
            AltgpuStatus::InvalidHandle as i32
        );
        assert_eq!(altgpu_real_release(h), AltgpuStatus::InvalidHandle as i32);
    }

    #[test]
    fn read_device_after_host_write_is_current() {
        let h = int_vector(&[1, 2, 3]);
        assert_eq!(altgpu_int_sync(h), OK);
        assert_eq!(altgpu_int_write_host(h, 0, [9].as_ptr(), 1), OK);

        let mut out = [0; 3];
        assert_eq!(altgpu_int_read_device(h, 0, out.as_mut_ptr(), 3), OK);
        assert_eq!(out, [9, 2, 3]);
        assert_eq!(altgpu_int_release(h), OK);
    }

    #[test]
    fn elt_out_of_range_is_reported() {
        let h = int_vector(&[1, 2]);
        let mut value = 0;
        assert_eq!(
            altgpu_int_elt(h, 2, &mut value),
            AltgpuStatus::OutOfRange as i32
        );
        assert_eq!(altgpu_int_release(h), OK);
    }

    #[test]
    fn write_past_end_is_out_of_range() {
        let h = int_vector(&[1, 2]);
        assert_eq!(
            altgpu_int_write_host(h, 1, [7, 8].as_ptr(), 2),
            AltgpuStatus::OutOfRange as i32
        );
        assert_eq!(altgpu_int_release(h), OK);
    }

    #[test]
    fn null_out_pointers_are_rejected() {
        let h = int_vector(&[1]);
        assert_eq!(
            altgpu_int_length(h, std::ptr::null_mut()),
            AltgpuStatus::InvalidArgument as i32
        );
        assert_eq!(
            altgpu_int_create(1, std::ptr::null_mut()),
            AltgpuStatus::InvalidArgument as i32
        );
        assert_eq!(
            altgpu_int_write_host(h, 0, std::ptr::null(), 1),
            AltgpuStatus::InvalidArgument as i32
        );
        assert_eq!(altgpu_int_release(h), OK);
    }

    #[test]
    fn inspect_reports_layout() {
        let h = real_vector(&[0.5; 3]);
        let mut report = AltgpuInspect {
            kind: crate::types::AltgpuElementKind::Integer,
            length: 0,
            host_addr: 0,
            device_addr: 0,
            residency: AltgpuResidency::Unallocated,
        };
        assert_eq!(altgpu_real_inspect(h, &mut report), OK);
        assert_eq!(report.kind, crate::types::AltgpuElementKind::Real);
        assert_eq!(report.length, 3);
        assert_ne!(report.host_addr, 0);
        assert_eq!(report.device_addr, 0);
        assert_eq!(report.residency, AltgpuResidency::HostAuthoritative);

        let mut ptr: *const f64 = std::ptr::null();
        assert_eq!(altgpu_real_dataptr_or_null(h, &mut ptr), OK);
        assert_eq!(ptr as usize, report.host_addr);
        assert_eq!(altgpu_real_release(h), OK);
    }

    #[test]
    fn writable_dataptr_then_device_read() {
        let h = int_vector(&[0, 0, 0]);
        let mut ptr: *mut i32 = std::ptr::null_mut();
        assert_eq!(altgpu_int_dataptr(h, 1, &mut ptr), OK);
        assert!(!ptr.is_null());
        #[allow(unsafe_code)]
        unsafe {
            *ptr.add(1) = 42;
        }
        assert_eq!(altgpu_int_sync(h), OK);
        let mut out = [0; 3];
        assert_eq!(altgpu_int_read_device(h, 0, out.as_mut_ptr(), 3), OK);
        assert_eq!(out, [0, 42, 0]);
        assert_eq!(altgpu_int_release(h), OK);
    }
}
