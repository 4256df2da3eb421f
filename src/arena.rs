use super::{ARENA_ALIGN, ARENA_SIZE};
use core::cell::UnsafeCell;
use core::ptr::NonNull;

// keep in sync with ARENA_ALIGN
#[repr(C, align(4096))]
pub struct Arena {
    arena: UnsafeCell<[u8; ARENA_SIZE]>,
}

const _: () = assert!(core::mem::align_of::<Arena>() == ARENA_ALIGN);

// The bytes are only touched through pointers handed out per block; each
// block is owned either by its size class (under the class lock) or by the
// caller that allocated it.
unsafe impl Sync for Arena {}

impl Arena {
    pub const fn new() -> Self {
        Self {
            arena: UnsafeCell::new([0x00; ARENA_SIZE]),
        }
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.arena.get() as usize
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.start() + ARENA_SIZE
    }

    #[inline(always)]
    pub const fn size(&self) -> usize {
        ARENA_SIZE
    }

    /// Byte offset of `addr` inside the arena, if it lies inside at all.
    #[inline]
    pub fn offset_of(&self, addr: usize) -> Option<usize> {
        addr.checked_sub(self.start())
            .filter(|&offset| offset < ARENA_SIZE)
    }

    /// Pointer to the byte at `offset`.
    ///
    /// # Panics
    ///
    /// If `offset` is outside the arena.
    #[inline]
    pub fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset < ARENA_SIZE, "offset {offset} outside the arena");

        // SAFETY: offset is in bounds of the backing array, so the result is
        // derived from a non-null pointer and stays inside the allocation
        unsafe { NonNull::new_unchecked(self.arena.get().cast::<u8>().add(offset)) }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

/// A contiguous run of equally sized blocks inside the arena.
///
/// Everything is expressed as offsets from the arena start, so a zone stays
/// valid when the arena that holds it moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Zone {
    start: usize,
    block_size: usize,
    block_count: usize,
}

impl Zone {
    pub const fn new(start: usize, zone_size: usize, block_size: usize) -> Self {
        Self {
            start,
            block_size,
            block_count: zone_size / block_size,
        }
    }

    #[inline(always)]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[inline(always)]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline(always)]
    pub const fn block_count(&self) -> usize {
        self.block_count
    }

    /// One past the last byte that belongs to a block.
    #[inline]
    pub const fn end(&self) -> usize {
        self.start + self.block_count * self.block_size
    }

    #[inline]
    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end()
    }

    /// Index of the block holding `offset`. Interior offsets map to the
    /// block they fall in.
    #[inline]
    pub const fn slot_of(&self, offset: usize) -> Option<usize> {
        if self.contains(offset) {
            Some((offset - self.start) / self.block_size)
        } else {
            None
        }
    }

    #[inline]
    pub const fn offset_of(&self, slot: usize) -> usize {
        self.start + slot * self.block_size
    }
}

/// Splits the arena into `count` equal zones and pairs each with a block size.
///
/// `block_sizes` must already be validated and sorted.
pub(crate) fn partition(block_sizes: &[usize]) -> impl Iterator<Item = Zone> + '_ {
    let zone_size = ARENA_SIZE / block_sizes.len().max(1);

    block_sizes
        .iter()
        .enumerate()
        .map(move |(i, &block_size)| Zone::new(i * zone_size, zone_size, block_size))
}
