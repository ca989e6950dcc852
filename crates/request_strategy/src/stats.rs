//! Counters owned by whoever constructs the order and the scheduler.
//!
//! Nothing here is process-global: every [`crate::PieceRequestOrder`] and
//! [`crate::PieceScheduler`] gets its counters passed in, so independent instances (e.g. in
//! tests) never see each other's numbers.

use std::sync::Arc;

macro_rules! gen_stats {
    ($atomic_name:ident $snapshot_name:ident, [$($stat_name:ident),*]) => {
        #[derive(Debug, Default)]
        pub struct $atomic_name {
            $(
                pub $stat_name: std::sync::atomic::AtomicU64,
            )*
        }

        impl $atomic_name {
            pub fn snapshot(&self) -> $snapshot_name {
                $snapshot_name {
                    $(
                        $stat_name: self.$stat_name.load(std::sync::atomic::Ordering::Relaxed),
                    )*
                }
            }

            $(
                pub fn $stat_name(&self, value: u64) {
                    self.$stat_name.fetch_add(value, std::sync::atomic::Ordering::Relaxed);
                }
            )*
        }

        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
        pub struct $snapshot_name {
            $(
                pub $stat_name: u64,
            )*
        }
    };
}

gen_stats!(PieceRequestOrderCounters PieceRequestOrderCountersSnapshot, [
    inserted,
    repositioned,
    unchanged,
    removed
]);

gen_stats!(SchedulerCounters SchedulerCountersSnapshot, [
    rounds,
    scanned,
    admitted,
    admitted_bytes,
    ignored,
    skipped_unverified,
    storage_halts,
    sink_stops
]);

#[derive(Debug, Default)]
pub struct RequestStrategyStats {
    pub order: Arc<PieceRequestOrderCounters>,
    pub scheduler: Arc<SchedulerCounters>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RequestStrategyStatsSnapshot {
    pub order: PieceRequestOrderCountersSnapshot,
    pub scheduler: SchedulerCountersSnapshot,
}

impl RequestStrategyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RequestStrategyStatsSnapshot {
        RequestStrategyStatsSnapshot {
            order: self.order.snapshot(),
            scheduler: self.scheduler.snapshot(),
        }
    }
}
