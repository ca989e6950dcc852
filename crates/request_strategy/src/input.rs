//! What the scheduler needs to know about the world outside the piece order.

use std::collections::{HashMap, HashSet};

use crate::{Error, PieceIndex, Result, SchedulerConfig, StorageCapacity, TransferId};

/// Per-transfer view the scheduler consults for each piece.
pub trait TransferView {
    /// Length in bytes of the pieces of this transfer.
    fn piece_length(&self) -> u64;

    /// True if the piece must not be requested this round, e.g. it's being hashed or
    /// already verified.
    fn ignore_piece(&self, index: PieceIndex) -> bool;
}

/// Supplied by the host for every scheduling round.
pub trait Input {
    type Transfer: TransferView;

    /// Looks up a transfer. Every transfer present in the piece order must resolve; a `None`
    /// is treated as a bug in the host.
    fn transfer(&self, id: &TransferId) -> Option<&Self::Transfer>;

    /// Free space of the storage pool shared by the transfers. None means unlimited.
    fn storage_capacity(&self) -> Option<u64>;

    /// Cap on bytes admitted in one round across all transfers. 0 means no cap.
    fn max_unverified_bytes(&self) -> u64;
}

#[derive(Debug, Clone)]
pub struct InMemoryTransfer {
    piece_length: u64,
    ignored: HashSet<PieceIndex>,
}

impl InMemoryTransfer {
    pub fn new(piece_length: u64) -> Self {
        Self {
            piece_length,
            ignored: HashSet::new(),
        }
    }

    pub fn set_ignored(&mut self, index: PieceIndex, ignored: bool) {
        if ignored {
            self.ignored.insert(index);
        } else {
            self.ignored.remove(&index);
        }
    }
}

impl TransferView for InMemoryTransfer {
    fn piece_length(&self) -> u64 {
        self.piece_length
    }

    fn ignore_piece(&self, index: PieceIndex) -> bool {
        self.ignored.contains(&index)
    }
}

/// An [`Input`] that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInput {
    transfers: HashMap<TransferId, InMemoryTransfer>,
    capacity: Option<StorageCapacity>,
    max_unverified_bytes: u64,
}

impl InMemoryInput {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            transfers: HashMap::new(),
            capacity: config.storage_capacity.map(StorageCapacity::new),
            max_unverified_bytes: config.max_unverified_bytes,
        }
    }

    /// Uses an existing pool, e.g. one shared with another input.
    pub fn with_capacity(mut self, capacity: StorageCapacity) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn add_transfer(&mut self, id: TransferId, transfer: InMemoryTransfer) -> Result<()> {
        if transfer.piece_length == 0 {
            return Err(Error::ZeroPieceLength(id));
        }
        if self.transfers.contains_key(&id) {
            return Err(Error::DuplicateTransfer(id));
        }
        self.transfers.insert(id, transfer);
        Ok(())
    }

    pub fn remove_transfer(&mut self, id: &TransferId) -> Option<InMemoryTransfer> {
        self.transfers.remove(id)
    }

    pub fn transfer_mut(&mut self, id: &TransferId) -> Option<&mut InMemoryTransfer> {
        self.transfers.get_mut(id)
    }

    pub fn capacity(&self) -> Option<&StorageCapacity> {
        self.capacity.as_ref()
    }

    pub fn set_max_unverified_bytes(&mut self, value: u64) {
        self.max_unverified_bytes = value;
    }
}

impl Input for InMemoryInput {
    type Transfer = InMemoryTransfer;

    fn transfer(&self, id: &TransferId) -> Option<&InMemoryTransfer> {
        self.transfers.get(id)
    }

    fn storage_capacity(&self) -> Option<u64> {
        self.capacity.as_ref().map(|c| c.available())
    }

    fn max_unverified_bytes(&self) -> u64 {
        self.max_unverified_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_transfer_validates() {
        let mut input = InMemoryInput::default();
        let id = TransferId::new([1; 20]);
        assert!(matches!(
            input.add_transfer(id, InMemoryTransfer::new(0)),
            Err(Error::ZeroPieceLength(_))
        ));
        input.add_transfer(id, InMemoryTransfer::new(16384)).unwrap();
        assert!(matches!(
            input.add_transfer(id, InMemoryTransfer::new(16384)),
            Err(Error::DuplicateTransfer(_))
        ));
        assert_eq!(input.transfer(&id).unwrap().piece_length(), 16384);
    }

    #[test]
    fn test_ignored_pieces() {
        let mut t = InMemoryTransfer::new(10);
        t.set_ignored(3, true);
        assert!(t.ignore_piece(3));
        assert!(!t.ignore_piece(4));
        t.set_ignored(3, false);
        assert!(!t.ignore_piece(3));
    }

    #[test]
    fn test_capacity_follows_the_shared_pool() {
        let pool = StorageCapacity::new(1000);
        let a = InMemoryInput::default().with_capacity(pool.clone());
        let b = InMemoryInput::default().with_capacity(pool.clone());
        assert!(pool.reserve(300));
        assert_eq!(a.storage_capacity(), Some(700));
        assert_eq!(b.storage_capacity(), Some(700));

        let unlimited = InMemoryInput::new(&SchedulerConfig::default());
        assert_eq!(unlimited.storage_capacity(), None);
        assert_eq!(unlimited.max_unverified_bytes(), 0);
    }
}
