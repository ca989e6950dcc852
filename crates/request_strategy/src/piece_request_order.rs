//! The ordered set of pieces that may be requested, across all transfers.
//!
//! Pieces are added when a transfer learns it needs them, updated whenever their priority,
//! partial state or availability changes, and removed once they complete, become unwanted, or
//! their transfer goes away.
//!
//! The tree is keyed by the full item (key and state), since the position depends on both. A
//! separate map from key to current state is used to find the tree entry on update/removal.
//! State is never mutated in place: an update removes the old item and inserts a new one.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::{
    PieceIndex, PieceKey, PieceRequestOrderItem, PieceState, TransferId,
    stats::PieceRequestOrderCounters,
};

/// Something that can be traversed in piece request order.
pub trait ScanOrder {
    /// Calls `visit` on items in ascending order until it returns `false` or items run out.
    fn scan<F>(&self, visit: F)
    where
        F: FnMut(&PieceRequestOrderItem) -> bool;
}

#[derive(Default)]
pub struct PieceRequestOrder {
    tree: BTreeSet<PieceRequestOrderItem>,
    states: HashMap<TransferId, HashMap<PieceIndex, PieceState>>,
    counters: Arc<PieceRequestOrderCounters>,
}

impl PieceRequestOrder {
    pub fn new(counters: Arc<PieceRequestOrderCounters>) -> Self {
        Self {
            tree: BTreeSet::new(),
            states: HashMap::new(),
            counters,
        }
    }

    /// Inserts the piece, or moves it to the position matching its new state.
    ///
    /// Returns false if the piece was already stored with exactly this state.
    pub fn upsert(&mut self, key: PieceKey, state: PieceState) -> bool {
        let states = self.states.entry(key.transfer).or_default();
        let old = states.insert(key.index, state);
        match old {
            Some(old) if old == state => {
                self.counters.unchanged(1);
                return false;
            }
            Some(old) => {
                let removed = self.tree.remove(&PieceRequestOrderItem { key, state: old });
                assert!(removed, "bug: {key:?} was in the state map but not in the tree");
                trace!(?key, ?old, new = ?state, "repositioning piece");
                self.counters.repositioned(1);
            }
            None => {
                trace!(?key, ?state, "inserting piece");
                self.counters.inserted(1);
            }
        }
        let inserted = self.tree.insert(PieceRequestOrderItem { key, state });
        assert!(inserted, "bug: {key:?} was in the tree but not in the state map");
        true
    }

    /// Removes the piece. Returns false if it wasn't there.
    pub fn remove(&mut self, key: &PieceKey) -> bool {
        let Some(states) = self.states.get_mut(&key.transfer) else {
            return false;
        };
        let Some(state) = states.remove(&key.index) else {
            return false;
        };
        if states.is_empty() {
            self.states.remove(&key.transfer);
        }
        let removed = self.tree.remove(&PieceRequestOrderItem { key: *key, state });
        assert!(removed, "bug: {key:?} was in the state map but not in the tree");
        trace!(?key, "removed piece");
        self.counters.removed(1);
        true
    }

    /// Removes every piece of the transfer, returning how many there were.
    pub fn remove_transfer(&mut self, transfer: &TransferId) -> usize {
        let Some(states) = self.states.remove(transfer) else {
            return 0;
        };
        for (index, state) in states.iter() {
            let key = PieceKey::new(*transfer, *index);
            let removed = self.tree.remove(&PieceRequestOrderItem { key, state: *state });
            assert!(removed, "bug: {key:?} was in the state map but not in the tree");
        }
        let count = states.len();
        self.counters.removed(count as u64);
        debug!(?transfer, count, "removed transfer from piece request order");
        count
    }

    pub fn get(&self, key: &PieceKey) -> Option<PieceState> {
        self.states.get(&key.transfer)?.get(&key.index).copied()
    }

    pub fn contains(&self, key: &PieceKey) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Number of pieces stored for one transfer.
    pub fn transfer_len(&self, transfer: &TransferId) -> usize {
        self.states.get(transfer).map(|s| s.len()).unwrap_or(0)
    }
}

impl ScanOrder for PieceRequestOrder {
    fn scan<F>(&self, mut visit: F)
    where
        F: FnMut(&PieceRequestOrderItem) -> bool,
    {
        for item in self.tree.iter() {
            if !visit(item) {
                return;
            }
        }
    }
}

/// A [`PieceRequestOrder`] shared between the tasks that update piece state and the one that
/// schedules requests.
///
/// Every mutation takes the write lock; a scan holds the read lock for its whole duration, so a
/// scheduling round always sees a consistent order.
#[derive(Clone, Default)]
pub struct SharedPieceRequestOrder {
    inner: Arc<RwLock<PieceRequestOrder>>,
}

impl SharedPieceRequestOrder {
    pub fn new(counters: Arc<PieceRequestOrderCounters>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(PieceRequestOrder::new(counters))),
        }
    }

    pub fn upsert(&self, key: PieceKey, state: PieceState) -> bool {
        self.inner.write().upsert(key, state)
    }

    pub fn remove(&self, key: &PieceKey) -> bool {
        self.inner.write().remove(key)
    }

    pub fn remove_transfer(&self, transfer: &TransferId) -> usize {
        self.inner.write().remove_transfer(transfer)
    }

    pub fn get(&self, key: &PieceKey) -> Option<PieceState> {
        self.inner.read().get(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl ScanOrder for SharedPieceRequestOrder {
    fn scan<F>(&self, visit: F)
    where
        F: FnMut(&PieceRequestOrderItem) -> bool,
    {
        self.inner.read().scan(visit)
    }
}
