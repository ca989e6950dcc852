//! The global piece ordering.
//!
//! Pieces from all transfers are sorted by, in order of precedence:
//! 1. priority, most urgent first;
//! 2. partially downloaded pieces first, so fewer pieces are open at a time;
//! 3. availability, rarest first;
//! 4. piece index, lowest first;
//! 5. transfer id, lexical byte order.
//!
//! No two distinct items compare equal, which lets [`crate::PieceRequestOrder`] use the order as
//! the key of its tree.

use std::cmp::Ordering;

use crate::PieceRequestOrderItem;

/// Compares two items. `Ordering::Less` means `a` should be requested before `b`.
///
/// The transfer id comparison is the last step and is only evaluated when every other step ties.
pub fn piece_order(a: &PieceRequestOrderItem, b: &PieceRequestOrderItem) -> Ordering {
    b.state
        .priority
        .cmp(&a.state.priority)
        .then_with(|| b.state.partial.cmp(&a.state.partial))
        .then_with(|| a.state.availability.cmp(&b.state.availability))
        .then_with(|| a.key.index.cmp(&b.key.index))
        .then_with(|| a.key.transfer.cmp(&b.key.transfer))
}
