use thiserror::Error;

/// Errors reported by the allocator to its immediate caller.
///
/// Capacity exhaustion is the only condition the allocator detects and
/// reports; it never mutates state on failure. Passing a foreign pointer to
/// [`Heap::free`](crate::Heap::free) is a contract violation, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("out of memory: no free block can hold {requested} bytes")]
    OutOfMemory { requested: usize },
}
