//! ## minne-core::arena
//! **Ownership of the raw fixed-size byte region**
//!
//! The arena is acquired from the process heap exactly once, at construction,
//! and released when the arena is dropped. Every other structure in this
//! crate lives *inside* the arena's bytes; nothing here calls back into the
//! host allocator.

use std::alloc::{self, Layout};
use std::mem;
use std::ptr::NonNull;

use tracing::debug;

/// Upper bound on arena length so that byte offsets always fit the 31-bit
/// payload field of a block header.
pub const MAX_ARENA_LEN: usize = i32::MAX as usize;

/// One contiguous byte region of fixed length.
///
/// The base address is stable for the arena's lifetime and the region is
/// exclusively owned by the allocator from construction to drop.
pub struct Arena {
    base: NonNull<u8>,
    len: usize,
    layout: Layout,
}

impl Arena {
    /// Acquires a byte region of exactly `len` bytes from the process heap.
    ///
    /// # Panics
    ///
    /// Panics if `len` is zero or exceeds [`MAX_ARENA_LEN`]. Aborts via
    /// [`alloc::handle_alloc_error`] if the region cannot be acquired.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "arena length must be greater than zero");
        assert!(len <= MAX_ARENA_LEN, "arena length exceeds {MAX_ARENA_LEN}");

        let layout = Layout::from_size_align(len, mem::align_of::<u64>())
            .expect("arena layout within isize::MAX");
        let raw = unsafe { alloc::alloc(layout) };
        let Some(base) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };

        debug!(len, base = ?base, "arena acquired");
        Arena { base, len, layout }
    }

    /// The length of the managed region in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `ptr` points inside the managed region.
    pub fn contains(&self, ptr: *const u8) -> bool {
        let base = self.base.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= base && addr < base + self.len
    }

    /// Converts an in-arena pointer to its byte offset, or `None` if the
    /// pointer lies outside the region.
    pub(crate) fn offset_of(&self, ptr: *const u8) -> Option<u32> {
        if self.contains(ptr) {
            Some((ptr as usize - self.base.as_ptr() as usize) as u32)
        } else {
            None
        }
    }

    /// Pointer to the byte at `offset`.
    pub(crate) fn ptr_at(&self, offset: u32) -> *mut u8 {
        debug_assert!((offset as usize) < self.len);
        unsafe { self.base.as_ptr().add(offset as usize) }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_bounds() {
        let arena = Arena::new(64);
        assert_eq!(arena.len(), 64);

        let inside = arena.ptr_at(0) as *const u8;
        assert!(arena.contains(inside));
        assert_eq!(arena.offset_of(inside), Some(0));

        let last = arena.ptr_at(63) as *const u8;
        assert_eq!(arena.offset_of(last), Some(63));

        let one_past = unsafe { arena.ptr_at(0).add(64) } as *const u8;
        assert!(!arena.contains(one_past));
        assert_eq!(arena.offset_of(one_past), None);
    }

    #[test]
    #[should_panic]
    fn test_arena_zero_length() {
        Arena::new(0);
    }
}
