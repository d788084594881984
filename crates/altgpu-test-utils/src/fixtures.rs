//! Reusable vector fixtures.
//!
//! - [`filled`]: a vector whose host copy holds the given values.
//! - [`device_modified`]: a synced vector whose device copy was then
//!   overwritten, leaving the device side authoritative.

use std::sync::Arc;

use altgpu_buffer::DeviceBackend;
use altgpu_core::Element;
use altgpu_vector::VirtualVector;

/// Sample real data used by the round-trip scenarios.
pub const REAL_SAMPLE: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

/// Sample integer data used by the cross-side scenarios.
pub const INT_SAMPLE: [i32; 3] = [10, 20, 30];

/// A vector on `device` whose host copy holds `values`.
///
/// # Panics
///
/// Panics if the device refuses the allocation.
pub fn filled<T: Element>(device: Arc<dyn DeviceBackend>, values: &[T]) -> VirtualVector<T> {
    let mut vector = VirtualVector::new(values.len(), device).expect("host allocation");
    vector.write_host(0, values).expect("host write");
    vector
}

/// A vector holding `values` on both sides, then overwritten on the
/// device with `device_values` starting at element 0.
///
/// # Panics
///
/// Panics if any device operation fails.
pub fn device_modified<T: Element>(
    device: Arc<dyn DeviceBackend>,
    values: &[T],
    device_values: &[T],
) -> VirtualVector<T> {
    let mut vector = filled(device, values);
    vector.synchronize().expect("initial sync");
    vector
        .write_device(0, device_values)
        .expect("device write");
    vector
}
