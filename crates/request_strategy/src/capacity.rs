use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Free space of one storage pool.
///
/// Transfers that write to the same pool hold clones of the same handle. Reserving bytes
/// through one clone is visible through all of them. The scheduler never touches this: it reads
/// [`StorageCapacity::available`] once per round (through [`crate::Input::storage_capacity`])
/// and counts down a local copy. Reservations happen when requests are actually issued.
#[derive(Debug, Clone)]
pub struct StorageCapacity {
    available: Arc<AtomicU64>,
}

impl StorageCapacity {
    pub fn new(bytes: u64) -> Self {
        Self {
            available: Arc::new(AtomicU64::new(bytes)),
        }
    }

    pub fn available(&self) -> u64 {
        self.available.load(Ordering::Acquire)
    }

    /// Takes `bytes` out of the pool. Returns false (and takes nothing) if there isn't enough.
    pub fn reserve(&self, bytes: u64) -> bool {
        self.available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                cur.checked_sub(bytes)
            })
            .is_ok()
    }

    /// Returns previously reserved bytes to the pool.
    pub fn release(&self, bytes: u64) {
        self.available.fetch_add(bytes, Ordering::AcqRel);
    }

    pub fn set(&self, bytes: u64) {
        self.available.store(bytes, Ordering::Release);
    }

    /// True if both handles refer to the same pool.
    pub fn same_pool(&self, other: &StorageCapacity) -> bool {
        Arc::ptr_eq(&self.available, &other.available)
    }
}
