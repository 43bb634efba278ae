//! ## minne-core::heap
//! **The allocator object**
//!
//! Ties the arena, the block directory and the placement strategies
//! together: `allocate` searches and splits, `free` coalesces and repairs
//! back-links, and the introspection operations answer by full traversal.
//! One `Heap` per arena; independent instances never share state.

use std::fmt;
use std::ptr::NonNull;

use tracing::debug;

use crate::arena::Arena;
use crate::block::{self, BlockHeader, HEADER_SIZE, MAX_PAYLOAD};
use crate::error::AllocError;
use crate::stats::{HeapStats, OpCounters};
use crate::strategy::{self, Strategy};

/// Fixed-arena sub-allocator with a pluggable placement strategy.
///
/// The arena is acquired once at construction and released on drop; all
/// bookkeeping lives inside the arena's bytes. Not thread-safe: a heap must
/// be driven from a single thread.
pub struct Heap {
    arena: Arena,
    strategy: Strategy,
    /// Next-fit resume offset; `None` means "start at the first block".
    cursor: Option<u32>,
    counters: OpCounters,
}

impl Heap {
    /// Creates a heap managing `length` bytes under `strategy`, installing a
    /// single free block spanning the entire arena.
    ///
    /// # Panics
    ///
    /// Panics unless `length` can hold at least one block header.
    pub fn new(length: usize, strategy: Strategy) -> Self {
        assert!(
            length >= HEADER_SIZE,
            "arena length must fit at least one block header"
        );

        let mut arena = Arena::new(length);
        block::install_initial(&mut arena);

        debug!(length, %strategy, "heap initialized");
        Heap {
            arena,
            strategy,
            cursor: None,
            counters: OpCounters::default(),
        }
    }

    /// The arena length in bytes.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Allocates `size` payload bytes and returns the payload pointer.
    ///
    /// Fails with [`AllocError::OutOfMemory`] when no free block can satisfy
    /// the request under the active strategy; no state is mutated in that
    /// case.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        assert!(size > 0, "allocation size must be greater than zero");

        let found = if size <= MAX_PAYLOAD {
            strategy::locate(&self.arena, self.strategy, size as u32, self.cursor)
        } else {
            None
        };
        let Some(offset) = found else {
            self.counters.record_failed_allocation();
            debug!(size, "allocation rejected, capacity exhausted");
            return Err(AllocError::OutOfMemory { requested: size });
        };

        self.commit(offset, size as u32);
        self.counters.record_allocation();

        let payload = self.arena.ptr_at(BlockHeader::payload_offset(offset));
        debug!(size, offset, "allocated block");
        // Payload starts strictly inside the arena, so never null.
        Ok(unsafe { NonNull::new_unchecked(payload) })
    }

    /// Carves an allocation of `size` payload bytes out of the free block at
    /// `offset`, splitting off the remainder as a new free block unless the
    /// remainder is too small to host a header.
    fn commit(&mut self, offset: u32, size: u32) {
        let header = block::read(&self.arena, offset);
        debug_assert!(header.is_free && header.payload_size >= size);

        let spare = header.payload_size - size;
        if (spare as usize) < HEADER_SIZE {
            // Hand the whole block over; a split would leave a fragment too
            // small to ever host a header.
            block::write(
                &mut self.arena,
                offset,
                BlockHeader {
                    is_free: false,
                    ..header
                },
            );
        } else {
            let allocated = BlockHeader {
                previous: header.previous,
                payload_size: size,
                is_free: false,
            };
            block::write(&mut self.arena, offset, allocated);

            let remainder_offset = offset + allocated.extent();
            let remainder = BlockHeader {
                previous: Some(offset),
                payload_size: spare - HEADER_SIZE as u32,
                is_free: true,
            };
            block::write(&mut self.arena, remainder_offset, remainder);

            if let Some(successor) = block::next_offset(&self.arena, remainder_offset, &remainder)
            {
                let header = block::read(&self.arena, successor);
                block::write(
                    &mut self.arena,
                    successor,
                    BlockHeader {
                        previous: Some(remainder_offset),
                        ..header
                    },
                );
            }
        }

        if self.strategy == Strategy::NextFit {
            let committed = block::read(&self.arena, offset);
            self.cursor = block::next_offset(&self.arena, offset, &committed);
        }
    }

    /// Releases the allocation whose payload pointer is `ptr`, coalescing
    /// the block with free neighbors.
    ///
    /// `ptr` must be a payload pointer previously returned by
    /// [`allocate`](Heap::allocate) on this heap and not yet freed; anything
    /// else is a contract violation with undefined behavior.
    pub fn free(&mut self, ptr: NonNull<u8>) {
        let Some(payload_offset) = self.arena.offset_of(ptr.as_ptr()) else {
            debug_assert!(false, "pointer does not belong to this heap");
            return;
        };
        let offset = payload_offset - HEADER_SIZE as u32;

        let mut header = block::read(&self.arena, offset);
        debug_assert!(!header.is_free, "double free");
        header.is_free = true;
        block::write(&mut self.arena, offset, header);
        self.counters.record_free();

        // Absorb a free successor first, then let a free predecessor absorb
        // the result; a free-prev + free-this + free-next run collapses into
        // one block.
        if let Some(next) = block::next_offset(&self.arena, offset, &header) {
            if block::read(&self.arena, next).is_free {
                self.absorb(offset, next);
            }
        }

        let mut surviving = offset;
        let header = block::read(&self.arena, offset);
        if let Some(previous) = header.previous {
            if block::read(&self.arena, previous).is_free {
                self.absorb(previous, offset);
                surviving = previous;
            }
        }

        // A stale next-fit cursor inside the coalesced region would dangle;
        // park it on the surviving block.
        if let Some(cursor) = self.cursor {
            let survivor = block::read(&self.arena, surviving);
            if cursor > surviving && cursor < surviving + survivor.extent() {
                self.cursor = Some(surviving);
            }
        }

        debug!(offset = surviving, "freed block");
    }

    /// Merges the free block at `right` into the adjacent free block at
    /// `left`, repointing the follower's back-link.
    fn absorb(&mut self, left: u32, right: u32) {
        let left_header = block::read(&self.arena, left);
        let right_header = block::read(&self.arena, right);
        debug_assert!(left_header.is_free && right_header.is_free);
        debug_assert_eq!(left + left_header.extent(), right);

        let merged = BlockHeader {
            previous: left_header.previous,
            payload_size: left_header.payload_size + right_header.extent(),
            is_free: true,
        };
        block::write(&mut self.arena, left, merged);

        if let Some(follower) = block::next_offset(&self.arena, left, &merged) {
            let header = block::read(&self.arena, follower);
            block::write(
                &mut self.arena,
                follower,
                BlockHeader {
                    previous: Some(left),
                    ..header
                },
            );
        }
    }

    pub fn free_block_count(&self) -> usize {
        block::free_blocks(&self.arena).count()
    }

    pub fn allocated_block_count(&self) -> usize {
        block::allocated_blocks(&self.arena).count()
    }

    /// Sum of free payload bytes, header overhead excluded.
    pub fn free_bytes(&self) -> usize {
        block::free_blocks(&self.arena)
            .map(|(_, header)| header.payload_size as usize)
            .sum()
    }

    /// Largest free payload, or 0 when nothing is free.
    pub fn biggest_free_block_size(&self) -> usize {
        block::free_blocks(&self.arena)
            .map(|(_, header)| header.payload_size as usize)
            .max()
            .unwrap_or(0)
    }

    /// Number of free blocks with a payload strictly under `max_bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `max_bytes` is zero.
    pub fn count_small_free_blocks(&self, max_bytes: usize) -> usize {
        assert!(max_bytes > 0, "threshold must be greater than zero");
        block::free_blocks(&self.arena)
            .filter(|(_, header)| (header.payload_size as usize) < max_bytes)
            .count()
    }

    /// Whether `ptr` points inside a currently allocated payload.
    ///
    /// Answers correctly for arbitrary addresses: payload interiors are
    /// allocated; header bytes, free blocks and anything outside the arena
    /// are not.
    pub fn is_allocated(&self, ptr: *const u8) -> bool {
        let Some(offset) = self.arena.offset_of(ptr) else {
            return false;
        };
        block::allocated_blocks(&self.arena).any(|(block_offset, header)| {
            let payload = BlockHeader::payload_offset(block_offset);
            offset >= payload && offset < payload + header.payload_size
        })
    }

    /// One full-traversal snapshot of the directory.
    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats::default();
        for (_, header) in block::blocks(&self.arena) {
            if header.is_free {
                stats.free_blocks += 1;
                stats.free_bytes += header.payload_size as usize;
                stats.biggest_free_block =
                    stats.biggest_free_block.max(header.payload_size as usize);
            } else {
                stats.allocated_blocks += 1;
            }
        }
        stats
    }

    pub fn counters(&self) -> OpCounters {
        self.counters
    }

    /// Compact textual dump: one `A<size>`/`F<size>` token per block in
    /// address order, space-separated.
    pub fn state_string(&self) -> String {
        block::blocks(&self.arena)
            .map(|(_, header)| {
                let tag = if header.is_free { 'F' } else { 'A' };
                format!("{tag}{}", header.payload_size)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.state_string())
    }
}
