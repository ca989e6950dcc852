use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, TransferId};

pub type PieceIndex = u32;

/// How urgently a piece is wanted. Variants are declared from least to most urgent, so the
/// derived `Ord` is the urgency order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PiecePriority {
    /// Not wanted at all.
    None,
    #[default]
    Normal,
    High,
    /// Inside the readahead window of a reader (e.g. a stream).
    Readahead,
    /// The piece right after the one a reader is blocked on.
    Next,
    /// A reader is blocked on this piece.
    Now,
}

impl PiecePriority {
    pub fn is_wanted(&self) -> bool {
        *self != PiecePriority::None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PiecePriority::None => "none",
            PiecePriority::Normal => "normal",
            PiecePriority::High => "high",
            PiecePriority::Readahead => "readahead",
            PiecePriority::Next => "next",
            PiecePriority::Now => "now",
        }
    }
}

impl std::fmt::Display for PiecePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PiecePriority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p = match s.to_ascii_lowercase().as_str() {
            "none" => PiecePriority::None,
            "normal" => PiecePriority::Normal,
            "high" => PiecePriority::High,
            "readahead" => PiecePriority::Readahead,
            "next" => PiecePriority::Next,
            "now" => PiecePriority::Now,
            _ => return Err(Error::UnknownPriority(s.to_owned())),
        };
        Ok(p)
    }
}

/// The mutable part of a piece that decides where it sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PieceState {
    pub priority: PiecePriority,
    /// Some chunks of the piece are already downloaded.
    pub partial: bool,
    /// Number of connected peers that have the piece. Lower is rarer.
    pub availability: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceKey {
    pub transfer: TransferId,
    pub index: PieceIndex,
}

impl PieceKey {
    pub fn new(transfer: TransferId, index: PieceIndex) -> Self {
        Self { transfer, index }
    }
}

/// A piece as stored in [`crate::PieceRequestOrder`]. Its position is a function of both the
/// key and the state, so the state is never changed in place while the item is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceRequestOrderItem {
    pub key: PieceKey,
    pub state: PieceState,
}

impl Ord for PieceRequestOrderItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        crate::order::piece_order(self, other)
    }
}

impl PartialOrd for PieceRequestOrderItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
