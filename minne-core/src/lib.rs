//! # minne-core
//!
//! Fixed-arena sub-allocator with pluggable placement strategies.
//! Built with safety, determinism, and maintainability as primary design constraints.
//!
//! ### Expectations (Production):
//! - Zero calls into the host allocator after arena acquisition
//! - O(1) space overhead per block (one 8-byte in-band header)
//! - Deterministic, single-threaded operation with no suspension points
//!
//! ### Key Submodules:
//! - `arena`: ownership of the raw fixed-size byte region
//! - `block`: the intrusive, address-derived block directory
//! - `strategy`: first/best/worst/next-fit placement searches
//! - `heap`: the allocator object tying placement, split and coalesce together
//! - `stats`: traversal snapshots and running operation counters

pub mod arena;
mod block;
pub mod error;
pub mod heap;
pub mod stats;
pub mod strategy;

pub mod prelude {
    pub use crate::error::AllocError;
    pub use crate::heap::Heap;
    pub use crate::stats::{HeapStats, OpCounters};
    pub use crate::strategy::Strategy;
}

pub use block::HEADER_SIZE;
pub use error::AllocError;
pub use heap::Heap;
pub use stats::{HeapStats, OpCounters};
pub use strategy::Strategy;
