//! Test utilities and mock types for altgpu development.
//!
//! Provides a fault-injecting [`DeviceBackend`] ([`FaultyDevice`]), a
//! [`ClassRegistrar`] that records what it was asked to register
//! ([`RecordingRegistrar`]), and small vector fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};

use altgpu_buffer::{DeviceBackend, DevicePtr, EmulatedDevice};
use altgpu_core::{BufferError, CopyDirection, Side};
use altgpu_vector::{ClassDescriptor, ClassId, ClassRegistrar, RegistrationError};

/// Sentinel meaning "never fail".
const NEVER: usize = usize::MAX;

/// An [`EmulatedDevice`] that fails chosen operations on demand.
///
/// Each `fail_*` call arms a countdown: the operation succeeds `after`
/// more times and then fails exactly once. Successful calls are
/// forwarded to the wrapped device so allocation bookkeeping stays real.
#[derive(Debug)]
pub struct FaultyDevice {
    inner: EmulatedDevice,
    alloc_countdown: AtomicUsize,
    to_device_countdown: AtomicUsize,
    to_host_countdown: AtomicUsize,
    allocs: AtomicUsize,
    copies: AtomicUsize,
}

impl FaultyDevice {
    pub fn new() -> Self {
        Self {
            inner: EmulatedDevice::new(),
            alloc_countdown: AtomicUsize::new(NEVER),
            to_device_countdown: AtomicUsize::new(NEVER),
            to_host_countdown: AtomicUsize::new(NEVER),
            allocs: AtomicUsize::new(0),
            copies: AtomicUsize::new(0),
        }
    }

    /// Fail the allocation after `after` successful ones.
    pub fn fail_alloc_after(&self, after: usize) {
        self.alloc_countdown.store(after, Ordering::SeqCst);
    }

    /// Fail the host-to-device copy after `after` successful ones.
    pub fn fail_copy_to_device_after(&self, after: usize) {
        self.to_device_countdown.store(after, Ordering::SeqCst);
    }

    /// Fail the device-to-host copy after `after` successful ones.
    pub fn fail_copy_to_host_after(&self, after: usize) {
        self.to_host_countdown.store(after, Ordering::SeqCst);
    }

    /// Successful allocations so far.
    pub fn alloc_count(&self) -> usize {
        self.allocs.load(Ordering::SeqCst)
    }

    /// Successful copies in either direction so far.
    pub fn copy_count(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }

    /// The wrapped device, for allocation bookkeeping queries.
    pub fn inner(&self) -> &EmulatedDevice {
        &self.inner
    }
}

impl Default for FaultyDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrement an armed countdown; returns `true` when this call must fail.
fn trips(countdown: &AtomicUsize) -> bool {
    let previous = countdown
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
            NEVER => None,
            0 => Some(NEVER),
            n => Some(n - 1),
        })
        .unwrap_or(NEVER);
    previous == 0
}

fn injected(direction: CopyDirection, bytes: usize) -> BufferError {
    BufferError::CopyFailed {
        direction,
        bytes,
        reason: "injected fault".into(),
    }
}

impl DeviceBackend for FaultyDevice {
    fn name(&self) -> &str {
        "faulty"
    }

    fn alloc(&self, bytes: usize) -> Result<DevicePtr, BufferError> {
        if trips(&self.alloc_countdown) {
            return Err(BufferError::AllocationFailed {
                side: Side::Device,
                bytes,
            });
        }
        let ptr = self.inner.alloc(bytes)?;
        self.allocs.fetch_add(1, Ordering::SeqCst);
        Ok(ptr)
    }

    fn free(&self, ptr: DevicePtr) {
        self.inner.free(ptr);
    }

    fn copy_to_device(
        &self,
        dst: DevicePtr,
        offset: usize,
        src: &[u8],
    ) -> Result<(), BufferError> {
        if trips(&self.to_device_countdown) {
            return Err(injected(CopyDirection::HostToDevice, src.len()));
        }
        self.inner.copy_to_device(dst, offset, src)?;
        self.copies.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn copy_to_host(
        &self,
        dst: &mut [u8],
        src: DevicePtr,
        offset: usize,
    ) -> Result<(), BufferError> {
        if trips(&self.to_host_countdown) {
            return Err(injected(CopyDirection::DeviceToHost, dst.len()));
        }
        self.inner.copy_to_host(dst, src, offset)?;
        self.copies.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A [`ClassRegistrar`] that records every descriptor it receives.
///
/// Set [`reject`](RecordingRegistrar::reject) to make the next
/// registration of that class name fail.
#[derive(Debug, Default)]
pub struct RecordingRegistrar {
    pub registered: Vec<ClassDescriptor>,
    pub reject: Option<String>,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the registered classes, in order.
    pub fn names(&self) -> Vec<&str> {
        self.registered.iter().map(|d| d.name.as_str()).collect()
    }
}

impl ClassRegistrar for RecordingRegistrar {
    fn register_class(
        &mut self,
        descriptor: &ClassDescriptor,
    ) -> Result<ClassId, RegistrationError> {
        if self.reject.as_deref() == Some(descriptor.name.as_str()) {
            self.reject = None;
            return Err(RegistrationError::Rejected {
                reason: format!("host refused '{}'", descriptor.name),
            });
        }
        self.registered.push(descriptor.clone());
        Ok(ClassId(100 + self.registered.len() as u32))
    }
}
