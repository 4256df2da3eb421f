use super::arena::{Arena, Zone};
use core::mem::size_of;

/// Bytes a free block needs to hold its link.
pub const LINK_SIZE: usize = size_of::<usize>();

const NIL: usize = usize::MAX;

/// The link kept in the first word of a free block: the slot index of the
/// next free block of the same zone.
///
/// A block in use carries no node, its bytes belong to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeNode {
    pub next: Option<usize>,
}

impl FreeNode {
    #[inline]
    fn encode(self) -> usize {
        self.next.unwrap_or(NIL)
    }

    #[inline]
    fn decode(raw: usize) -> Self {
        Self {
            next: (raw != NIL).then_some(raw),
        }
    }

    /// Reads the node stored in `slot` of `zone`.
    ///
    /// # Safety
    ///
    /// `slot` must be a free block of `zone` and the caller must hold the lock
    /// of the class that owns `zone`.
    #[inline]
    pub unsafe fn read(arena: &Arena, zone: &Zone, slot: usize) -> Self {
        let ptr = arena.ptr_at(zone.offset_of(slot)).cast::<usize>();
        Self::decode(ptr.as_ptr().read_unaligned())
    }

    /// Threads `slot` of `zone` into a free list by writing this node into it.
    ///
    /// # Safety
    ///
    /// Nobody else may be reading or writing the block: either it was just
    /// handed back by its user or the zone is still under construction, and
    /// the caller holds the lock of the class that owns `zone`.
    #[inline]
    pub unsafe fn write(self, arena: &Arena, zone: &Zone, slot: usize) {
        let ptr = arena.ptr_at(zone.offset_of(slot)).cast::<usize>();
        ptr.as_ptr().write_unaligned(self.encode());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_fits_minimum_block() {
        assert!(LINK_SIZE <= crate::MIN_BLOCK_SIZE);
    }

    #[test]
    fn write_then_read_back() {
        let arena = Arena::new();
        let zone = Zone::new(0, 1024, 64);

        unsafe {
            FreeNode { next: Some(7) }.write(&arena, &zone, 3);
            FreeNode { next: None }.write(&arena, &zone, 4);

            assert_eq!(FreeNode::read(&arena, &zone, 3).next, Some(7));
            assert_eq!(FreeNode::read(&arena, &zone, 4).next, None);
        }
    }

    #[test]
    fn node_lives_at_block_start() {
        let arena = Arena::new();
        let zone = Zone::new(2048, 2048, 256);

        unsafe { FreeNode { next: Some(1) }.write(&arena, &zone, 2) };

        let raw = unsafe {
            arena
                .ptr_at(2048 + 2 * 256)
                .cast::<usize>()
                .as_ptr()
                .read_unaligned()
        };
        assert_eq!(raw, 1);
    }
}
