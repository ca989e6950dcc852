use crate::{PieceIndex, TransferId};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("expected a hex string of length {expected}, got {actual}")]
    TransferIdWrongLength { expected: usize, actual: usize },
    #[error("invalid transfer id: {0:#}")]
    InvalidTransferId(#[from] hex::FromHexError),
    #[error("unknown piece priority {0:?}")]
    UnknownPriority(String),

    #[error("transfer {0:?} has zero piece length")]
    ZeroPieceLength(TransferId),
    #[error("transfer {0:?} added twice")]
    DuplicateTransfer(TransferId),
    #[error("piece {index} of transfer {transfer:?} listed twice")]
    DuplicatePiece {
        transfer: TransferId,
        index: PieceIndex,
    },
}

pub type Result<T> = core::result::Result<T, Error>;
