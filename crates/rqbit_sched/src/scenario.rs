//! A JSON description of a set of torrents and the state of their pieces.
//!
//! ```json
//! {
//!   "config": { "storage_capacity": 140 },
//!   "transfers": [
//!     {
//!       "info_hash": "a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0",
//!       "piece_length": 100,
//!       "ignored": [3],
//!       "pieces": [{ "index": 0, "priority": "high", "availability": 2 }]
//!     }
//!   ]
//! }
//! ```

use std::{collections::HashSet, path::Path};

use anyhow::Context;
use request_strategy::{
    InMemoryInput, InMemoryTransfer, PieceIndex, PieceKey, PiecePriority, PieceRequestOrder,
    PieceState, SchedulerConfig, TransferId,
};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: SchedulerConfig,
    pub transfers: Vec<ScenarioTransfer>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioTransfer {
    pub info_hash: TransferId,
    pub piece_length: u64,
    #[serde(default)]
    pub ignored: Vec<PieceIndex>,
    pub pieces: Vec<ScenarioPiece>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioPiece {
    pub index: PieceIndex,
    #[serde(default)]
    pub priority: PiecePriority,
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub availability: u32,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("error opening scenario {:?}", path))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("error parsing scenario {:?}", path))
    }

    /// Builds the piece order and the input for it. Pieces with priority "none" aren't wanted
    /// and are left out of the order.
    pub fn build(
        &self,
        config: &SchedulerConfig,
        order: &mut PieceRequestOrder,
    ) -> request_strategy::Result<InMemoryInput> {
        let mut input = InMemoryInput::new(config);
        for t in self.transfers.iter() {
            let mut transfer = InMemoryTransfer::new(t.piece_length);
            for index in t.ignored.iter().copied() {
                transfer.set_ignored(index, true);
            }
            input.add_transfer(t.info_hash, transfer)?;

            let mut seen = HashSet::new();
            for p in t.pieces.iter() {
                if !seen.insert(p.index) {
                    return Err(request_strategy::Error::DuplicatePiece {
                        transfer: t.info_hash,
                        index: p.index,
                    });
                }
                if !p.priority.is_wanted() {
                    continue;
                }
                order.upsert(
                    PieceKey::new(t.info_hash, p.index),
                    PieceState {
                        priority: p.priority,
                        partial: p.partial,
                        availability: p.availability,
                    },
                );
            }
            debug!(info_hash = ?t.info_hash, pieces = t.pieces.len(), "loaded transfer");
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use request_strategy::{Error, ScanOrder};

    use super::*;

    const SCENARIO: &str = r#"{
        "config": { "storage_capacity": 140 },
        "transfers": [
            {
                "info_hash": "a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0",
                "piece_length": 100,
                "pieces": [
                    { "index": 0, "priority": "high", "availability": 2 },
                    { "index": 1, "priority": "normal" },
                    { "index": 2, "priority": "none" }
                ]
            },
            {
                "info_hash": "b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0",
                "piece_length": 50,
                "ignored": [1],
                "pieces": [
                    { "index": 0, "priority": "high", "availability": 1 },
                    { "index": 1, "priority": "high", "partial": true }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_load_and_build() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENARIO.as_bytes()).unwrap();
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.config.storage_capacity, Some(140));

        let mut order = PieceRequestOrder::default();
        let input = scenario.build(&scenario.config, &mut order).unwrap();
        // The "none" piece is not in the order.
        assert_eq!(order.len(), 4);

        let mut indices = Vec::new();
        order.scan(|item| {
            indices.push((item.key.transfer.0[0], item.key.index));
            true
        });
        assert_eq!(indices, vec![(0xb0, 1), (0xb0, 0), (0xa0, 0), (0xa0, 1)]);

        use request_strategy::{Input, TransferView};
        let b: TransferId = "b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0".parse().unwrap();
        assert!(input.transfer(&b).unwrap().ignore_piece(1));
    }

    #[test]
    fn test_duplicate_piece_rejected() {
        let scenario: Scenario = serde_json::from_str(
            r#"{"transfers": [{
                "info_hash": "0101010101010101010101010101010101010101",
                "piece_length": 1,
                "pieces": [{"index": 3}, {"index": 3}]
            }]}"#,
        )
        .unwrap();
        let mut order = PieceRequestOrder::default();
        assert!(matches!(
            scenario.build(&SchedulerConfig::default(), &mut order),
            Err(Error::DuplicatePiece { index: 3, .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Scenario::load(Path::new("/nonexistent/scenario.json")).unwrap_err();
        assert!(format!("{err:#}").contains("error opening scenario"));
    }
}
