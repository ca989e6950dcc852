use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Cap on the bytes of pieces admitted in one round across all transfers, i.e. bytes that
    /// will sit unverified until hashed. 0 means no cap.
    pub max_unverified_bytes: u64,

    /// Free space of the storage pool shared by all transfers. None means unlimited.
    pub storage_capacity: Option<u64>,
}
