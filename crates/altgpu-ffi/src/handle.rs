//! Per-kind tables mapping the host's opaque `u64` handles to vectors.
//!
//! A handle packs a slot index (high 32 bits) with the slot's generation
//! (low 32 bits). Each slot is in one of three states:
//!
//! - live: the handle resolves to its vector.
//! - disposed: the host's finalizer ran. The vector is gone and the slot
//!   is already queued for reuse, but until it is reused the old handle
//!   still reports [`Stale::Disposed`].
//! - vacant: released, or never reached by this handle.
//!
//! Handing a slot to a new vector bumps its generation, so no earlier
//! handle can reach the new occupant. Vacated slots are reused oldest
//! first, and only once more than [`REUSE_RESERVE`] of them are queued.
//! Under any create/dispose churn the table holds at most the live
//! vectors plus that reserve.

use std::collections::VecDeque;

use crate::status::AltgpuStatus;

/// Vacated slots kept out of circulation before the oldest is reused.
pub(crate) const REUSE_RESERVE: usize = 64;

/// Why a handle did not resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stale {
    /// Never issued, released, or its slot now belongs to another vector.
    Unknown,
    /// The vector behind the handle was disposed.
    Disposed,
}

impl Stale {
    /// Status code reported to the host.
    pub(crate) fn status(self) -> AltgpuStatus {
        match self {
            Stale::Unknown => AltgpuStatus::InvalidHandle,
            Stale::Disposed => AltgpuStatus::Freed,
        }
    }
}

fn pack(index: u32, generation: u32) -> u64 {
    (u64::from(index) << 32) | u64::from(generation)
}

fn unpack(handle: u64) -> (usize, u32) {
    ((handle >> 32) as usize, handle as u32)
}

#[derive(Debug)]
enum Entry<T> {
    Live(T),
    Disposed,
    Vacant,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    entry: Entry<T>,
}

/// Handle table with tombstoned disposal and delayed slot reuse.
#[derive(Debug)]
pub(crate) struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    reusable: VecDeque<u32>,
    live: usize,
}

impl<T> HandleTable<T> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            reusable: VecDeque::new(),
            live: 0,
        }
    }

    /// Store `value` and return its handle.
    pub fn insert(&mut self, value: T) -> u64 {
        self.live += 1;
        if self.reusable.len() > REUSE_RESERVE {
            if let Some(index) = self.reusable.pop_front() {
                let slot = &mut self.slots[index as usize];
                slot.generation += 1;
                slot.entry = Entry::Live(value);
                return pack(index, slot.generation);
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Entry::Live(value),
        });
        pack(index, 0)
    }

    fn slot_mut(&mut self, handle: u64) -> Result<&mut Slot<T>, Stale> {
        let (index, generation) = unpack(handle);
        match self.slots.get_mut(index) {
            Some(slot) if slot.generation == generation => Ok(slot),
            _ => Err(Stale::Unknown),
        }
    }

    /// The vector behind `handle`.
    pub fn get_mut(&mut self, handle: u64) -> Result<&mut T, Stale> {
        match &mut self.slot_mut(handle)?.entry {
            Entry::Live(value) => Ok(value),
            Entry::Disposed => Err(Stale::Disposed),
            Entry::Vacant => Err(Stale::Unknown),
        }
    }

    /// Finalize `handle`: take its value out, queue the slot for reuse and
    /// leave a tombstone behind.
    ///
    /// `Ok(None)` if the handle was already disposed.
    pub fn dispose(&mut self, handle: u64) -> Result<Option<T>, Stale> {
        let slot = self.slot_mut(handle)?;
        match std::mem::replace(&mut slot.entry, Entry::Disposed) {
            Entry::Live(value) => {
                self.vacate(unpack(handle).0);
                Ok(Some(value))
            }
            Entry::Disposed => Ok(None),
            Entry::Vacant => {
                self.slots[unpack(handle).0].entry = Entry::Vacant;
                Err(Stale::Unknown)
            }
        }
    }

    /// Forget `handle`, taking its value out if it was still live.
    ///
    /// `Ok(None)` if the handle had been disposed; afterwards it is
    /// unknown either way.
    pub fn remove(&mut self, handle: u64) -> Result<Option<T>, Stale> {
        let slot = self.slot_mut(handle)?;
        match std::mem::replace(&mut slot.entry, Entry::Vacant) {
            Entry::Live(value) => {
                self.vacate(unpack(handle).0);
                Ok(Some(value))
            }
            Entry::Disposed => Ok(None),
            Entry::Vacant => Err(Stale::Unknown),
        }
    }

    /// A slot at the last generation is retired instead of queued.
    fn vacate(&mut self, index: usize) {
        self.live -= 1;
        if self.slots[index].generation != u32::MAX {
            self.reusable.push_back(index as u32);
        }
    }

    /// Number of handles whose vector is still live.
    pub fn len(&self) -> usize {
        self.live
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
