//! ## minne-core::stats
//! **Traversal snapshots and running operation counters**

use serde::Serialize;

/// Point-in-time view of the block directory, produced by one full
/// traversal in [`Heap::stats`](crate::Heap::stats).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeapStats {
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Number of allocated blocks.
    pub allocated_blocks: usize,
    /// Sum of free payload bytes, header overhead excluded.
    pub free_bytes: usize,
    /// Largest single free payload, 0 if no block is free.
    pub biggest_free_block: usize,
}

/// Running totals over the heap's lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpCounters {
    pub allocations: usize,
    pub frees: usize,
    /// Requests rejected for capacity exhaustion.
    pub failed_allocations: usize,
}

impl OpCounters {
    pub(crate) fn record_allocation(&mut self) {
        self.allocations += 1;
    }

    pub(crate) fn record_free(&mut self) {
        self.frees += 1;
    }

    pub(crate) fn record_failed_allocation(&mut self) {
        self.failed_allocations += 1;
    }
}
