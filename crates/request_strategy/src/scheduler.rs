//! Picks the pieces to request next, across all transfers.
//!
//! A round walks the piece order front to back and hands every admitted piece to a sink.
//! Two budgets apply:
//! - storage: consumed greedily in order. The first piece that doesn't fit ends the round,
//!   even if later pieces would fit. Ignored pieces are charged too.
//! - unverified bytes: a piece that would go over the cap is skipped, but the round goes on and
//!   a smaller piece further down may still be admitted.
//!
//! A round only observes: neither the order nor the host's storage pool is modified.

use std::{cmp::Ordering, ops::ControlFlow, sync::Arc};

use tracing::{debug, trace};

use crate::{
    Input, PieceIndex, PieceRequestOrderItem, PieceState, ScanOrder, TransferId, TransferView,
    order::piece_order, stats::SchedulerCounters,
};

#[derive(Default)]
pub struct PieceScheduler {
    counters: Arc<SchedulerCounters>,
}

impl PieceScheduler {
    pub fn new(counters: Arc<SchedulerCounters>) -> Self {
        Self { counters }
    }

    pub fn counters(&self) -> &SchedulerCounters {
        &self.counters
    }

    /// Runs one scheduling round, calling `f` with each admitted piece in request order.
    ///
    /// Returning `ControlFlow::Break` from `f` ends the round.
    ///
    /// # Panics
    /// If `order` yields items out of order, or contains a transfer that `input` doesn't know.
    /// Both mean the piece state is corrupt.
    pub fn schedule_round<O, I, F>(&self, order: &O, input: &I, mut f: F)
    where
        O: ScanOrder + ?Sized,
        I: Input + ?Sized,
        F: FnMut(TransferId, PieceIndex, PieceState) -> ControlFlow<()>,
    {
        let counters = &*self.counters;
        counters.rounds(1);

        let mut storage_left = input.storage_capacity();
        let max_unverified_bytes = input.max_unverified_bytes();
        let mut unverified_bytes: u64 = 0;
        let mut last_item: Option<PieceRequestOrderItem> = None;

        let mut scanned = 0u64;
        let mut admitted = 0u64;

        order.scan(|item| {
            if let Some(last) = &last_item {
                if piece_order(item, last) == Ordering::Less {
                    panic!("scan not in order: {item:?} after {last:?}");
                }
            }
            last_item = Some(*item);
            scanned += 1;

            let transfer_id = item.key.transfer;
            let index = item.key.index;
            let transfer = match input.transfer(&transfer_id) {
                Some(t) => t,
                None => {
                    panic!("bug: transfer {transfer_id:?} is in the piece order but not in input")
                }
            };

            let piece_length = transfer.piece_length();
            if let Some(left) = storage_left.as_mut() {
                if *left < piece_length {
                    debug!(
                        ?transfer_id,
                        index,
                        piece_length,
                        storage_left = *left,
                        "out of storage, ending round"
                    );
                    counters.storage_halts(1);
                    return false;
                }
                *left -= piece_length;
            }

            // Pieces being hashed are ignored here but still hold their storage.
            if transfer.ignore_piece(index) {
                trace!(?transfer_id, index, "ignoring piece");
                counters.ignored(1);
                return true;
            }

            let unverified_after = unverified_bytes.saturating_add(piece_length);
            if max_unverified_bytes != 0 && unverified_after > max_unverified_bytes {
                trace!(
                    ?transfer_id,
                    index,
                    piece_length,
                    unverified_bytes,
                    "over unverified bytes limit, skipping piece"
                );
                counters.skipped_unverified(1);
                return true;
            }
            unverified_bytes = unverified_after;

            admitted += 1;
            counters.admitted(1);
            counters.admitted_bytes(piece_length);
            trace!(?transfer_id, index, state = ?item.state, "admitting piece");
            match f(transfer_id, index, item.state) {
                ControlFlow::Continue(()) => true,
                ControlFlow::Break(()) => {
                    counters.sink_stops(1);
                    false
                }
            }
        });

        counters.scanned(scanned);
        debug!(
            scanned,
            admitted,
            unverified_bytes,
            storage_left = ?storage_left,
            "scheduling round done"
        );
    }
}

/// [`PieceScheduler::schedule_round`] without counters.
pub fn get_requestable_pieces<O, I, F>(order: &O, input: &I, f: F)
where
    O: ScanOrder + ?Sized,
    I: Input + ?Sized,
    F: FnMut(TransferId, PieceIndex, PieceState) -> ControlFlow<()>,
{
    PieceScheduler::default().schedule_round(order, input, f)
}
