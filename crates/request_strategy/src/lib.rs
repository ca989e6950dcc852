//!
//! Decides in which order pieces get requested, across all torrents of a session.
//!
//! Every piece that still needs downloading lives in a [`PieceRequestOrder`], sorted by
//! priority, then partially downloaded pieces first, then rarest first. Once per scheduling
//! round a [`PieceScheduler`] walks that order and hands out the pieces that fit into the storage
//! and unverified-bytes budgets reported by the host through [`Input`].
//!
//! # Quick usage example
//!
//! ```
//! use std::ops::ControlFlow;
//! use request_strategy::*;
//!
//! let info_hash: TransferId = "cab507494d02ebb1178b38f2e9d7be299c86b862".parse().unwrap();
//!
//! let mut input = InMemoryInput::new(&SchedulerConfig::default());
//! input.add_transfer(info_hash, InMemoryTransfer::new(16384)).unwrap();
//!
//! let order = SharedPieceRequestOrder::default();
//! order.upsert(
//!     PieceKey::new(info_hash, 0),
//!     PieceState { priority: PiecePriority::High, partial: false, availability: 3 },
//! );
//!
//! get_requestable_pieces(&order, &input, |ih, index, _state| {
//!     assert_eq!((ih, index), (info_hash, 0));
//!     ControlFlow::Continue(())
//! });
//! ```

mod capacity;
mod config;
mod error;
mod input;
pub mod order;
mod piece_request_order;
mod scheduler;
pub mod stats;
mod transfer_id;
mod types;

pub use capacity::StorageCapacity;
pub use config::SchedulerConfig;
pub use error::{Error, Result};
pub use input::{InMemoryInput, InMemoryTransfer, Input, TransferView};
pub use piece_request_order::{PieceRequestOrder, ScanOrder, SharedPieceRequestOrder};
pub use scheduler::{PieceScheduler, get_requestable_pieces};
pub use stats::RequestStrategyStats;
pub use transfer_id::TransferId;
pub use types::{PieceIndex, PieceKey, PiecePriority, PieceRequestOrderItem, PieceState};


/// The cargo version of this crate.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
