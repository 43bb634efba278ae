//! ## minne-core::block
//! **The intrusive, address-derived block directory**
//!
//! Block headers are materialized in-band at the start of the region they
//! describe. Only the backward link is stored; the forward link is derived
//! by address arithmetic, so the directory costs exactly one header per
//! block and nothing else. Headers land at arbitrary byte offsets, hence
//! all header IO is unaligned.

use std::mem;
use std::ptr;

use crate::arena::Arena;

/// Bytes of in-band overhead per block. Constant across the whole suite.
pub const HEADER_SIZE: usize = mem::size_of::<RawHeader>();

/// Offset of the first block's header. Always valid after initialization.
pub(crate) const FIRST: u32 = 0;

const NO_PREVIOUS: u32 = u32::MAX;
const FREE_BIT: u32 = 1 << 31;

/// Largest payload a single block can describe.
pub(crate) const MAX_PAYLOAD: usize = (FREE_BIT - 1) as usize;

/// On-disk... rather, in-arena shape of a header: predecessor offset plus a
/// size word carrying the free flag in its top bit.
#[repr(C)]
#[derive(Clone, Copy)]
struct RawHeader {
    previous: u32,
    size_flags: u32,
}

/// Decoded view of one block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockHeader {
    /// Offset of the immediately preceding block's header, `None` for the
    /// first block.
    pub previous: Option<u32>,
    /// Caller-visible bytes in this block, header excluded.
    pub payload_size: u32,
    pub is_free: bool,
}

impl BlockHeader {
    /// Total bytes this block occupies, header included.
    pub fn extent(&self) -> u32 {
        HEADER_SIZE as u32 + self.payload_size
    }

    /// Offset of this block's payload, given its own offset.
    pub fn payload_offset(offset: u32) -> u32 {
        offset + HEADER_SIZE as u32
    }
}

pub(crate) fn read(arena: &Arena, offset: u32) -> BlockHeader {
    debug_assert!(offset as usize + HEADER_SIZE <= arena.len());
    let raw = unsafe { ptr::read_unaligned(arena.ptr_at(offset) as *const RawHeader) };
    BlockHeader {
        previous: (raw.previous != NO_PREVIOUS).then_some(raw.previous),
        payload_size: raw.size_flags & !FREE_BIT,
        is_free: raw.size_flags & FREE_BIT != 0,
    }
}

pub(crate) fn write(arena: &mut Arena, offset: u32, header: BlockHeader) {
    debug_assert!(offset as usize + HEADER_SIZE + header.payload_size as usize <= arena.len());
    let raw = RawHeader {
        previous: header.previous.unwrap_or(NO_PREVIOUS),
        size_flags: header.payload_size | if header.is_free { FREE_BIT } else { 0 },
    };
    unsafe { ptr::write_unaligned(arena.ptr_at(offset) as *mut RawHeader, raw) };
}

/// Offset of the block following `header`, or `None` at the end of the list.
pub(crate) fn next_offset(arena: &Arena, offset: u32, header: &BlockHeader) -> Option<u32> {
    let candidate = offset + header.extent();
    ((candidate as usize) < arena.len()).then_some(candidate)
}

/// Installs the single free block spanning the entire arena.
pub(crate) fn install_initial(arena: &mut Arena) {
    let payload = (arena.len() - HEADER_SIZE) as u32;
    write(
        arena,
        FIRST,
        BlockHeader {
            previous: None,
            payload_size: payload,
            is_free: true,
        },
    );
}

/// Lazy forward-only traversal of all blocks in address order.
pub(crate) struct Blocks<'a> {
    arena: &'a Arena,
    cursor: Option<u32>,
}

impl Iterator for Blocks<'_> {
    type Item = (u32, BlockHeader);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.cursor?;
        let header = read(self.arena, offset);
        self.cursor = next_offset(self.arena, offset, &header);
        Some((offset, header))
    }
}

pub(crate) fn blocks(arena: &Arena) -> Blocks<'_> {
    Blocks {
        arena,
        cursor: Some(FIRST),
    }
}

/// Traversal starting at `offset` instead of the first block.
pub(crate) fn blocks_from(arena: &Arena, offset: u32) -> Blocks<'_> {
    Blocks {
        arena,
        cursor: Some(offset),
    }
}

pub(crate) fn free_blocks(arena: &Arena) -> impl Iterator<Item = (u32, BlockHeader)> + '_ {
    blocks(arena).filter(|(_, header)| header.is_free)
}

pub(crate) fn allocated_blocks(arena: &Arena) -> impl Iterator<Item = (u32, BlockHeader)> + '_ {
    blocks(arena).filter(|(_, header)| !header.is_free)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let mut arena = Arena::new(2048);
        let header = BlockHeader {
            previous: Some(17),
            payload_size: 1000,
            is_free: true,
        };
        // Odd offset on purpose: headers must survive unaligned IO.
        write(&mut arena, 3, header);
        assert_eq!(read(&arena, 3), header);

        let first = BlockHeader {
            previous: None,
            payload_size: 0,
            is_free: false,
        };
        write(&mut arena, 0, first);
        assert_eq!(read(&arena, 0), first);
    }

    #[test]
    fn test_initial_block_spans_arena() {
        let mut arena = Arena::new(128);
        install_initial(&mut arena);

        let header = read(&arena, FIRST);
        assert_eq!(header.previous, None);
        assert!(header.is_free);
        assert_eq!(header.extent() as usize, arena.len());
        assert_eq!(next_offset(&arena, FIRST, &header), None);
    }

    #[test]
    fn test_traversal_is_gapless() {
        let mut arena = Arena::new(100);
        // Hand-built directory: 20 + 8, 30 + 8, 26 + 8 bytes.
        write(
            &mut arena,
            0,
            BlockHeader {
                previous: None,
                payload_size: 20,
                is_free: false,
            },
        );
        write(
            &mut arena,
            28,
            BlockHeader {
                previous: Some(0),
                payload_size: 30,
                is_free: true,
            },
        );
        write(
            &mut arena,
            66,
            BlockHeader {
                previous: Some(28),
                payload_size: 26,
                is_free: false,
            },
        );

        let offsets: Vec<u32> = blocks(&arena).map(|(offset, _)| offset).collect();
        assert_eq!(offsets, vec![0, 28, 66]);

        assert_eq!(free_blocks(&arena).count(), 1);
        assert_eq!(allocated_blocks(&arena).count(), 2);

        let from_middle: Vec<u32> = blocks_from(&arena, 28).map(|(offset, _)| offset).collect();
        assert_eq!(from_middle, vec![28, 66]);
    }
}
