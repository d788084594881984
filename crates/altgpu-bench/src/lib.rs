//! Benchmark profiles for altgpu virtual vectors.
//!
//! - [`BENCH_LENGTHS`]: vector lengths swept by every benchmark.
//! - [`ramp_vector`]: a real vector filled with `0.0, 1.0, 2.0, ...`.
//! - [`device_dirty_vector`]: the same, with the device copy authoritative.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use altgpu_buffer::EmulatedDevice;
use altgpu_core::VectorError;
use altgpu_vector::VirtualVector;

/// Vector lengths (in elements) used by the benchmarks.
pub const BENCH_LENGTHS: [usize; 3] = [1_000, 10_000, 100_000];

/// A real vector of `len` ascending values on a fresh emulated device,
/// synchronized so both sides hold the data.
pub fn ramp_vector(len: usize) -> Result<VirtualVector<f64>, VectorError> {
    let device = Arc::new(EmulatedDevice::new());
    let mut vector = VirtualVector::new(len, device)?;
    let values: Vec<f64> = (0..len).map(|i| i as f64).collect();
    vector.write_host(0, &values)?;
    vector.synchronize()?;
    Ok(vector)
}

/// A [`ramp_vector`] whose device copy was then fully rewritten, so the
/// next host read has to pull it back.
pub fn device_dirty_vector(len: usize) -> Result<VirtualVector<f64>, VectorError> {
    let mut vector = ramp_vector(len)?;
    let values: Vec<f64> = (0..len).rev().map(|i| i as f64).collect();
    vector.write_device(0, &values)?;
    Ok(vector)
}
