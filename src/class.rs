use super::arena::{Arena, Zone};
use super::node::FreeNode;
use super::SpinLock;

/// Result of handing a block back to a size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Give {
    /// The block was threaded back onto the free list.
    Accepted { slot: usize },
    /// The offset is not inside this class's zone.
    NotMine,
    /// The block is already on the free list; nothing changed.
    AlreadyFree { slot: usize },
}

/// Snapshot of one size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassStats {
    pub block_size: usize,
    pub block_count: usize,
    /// Offset of the class's zone inside the arena.
    pub zone_offset: usize,
    pub free_blocks: usize,
}

impl ClassStats {
    #[inline]
    pub fn in_use(&self) -> usize {
        self.block_count - self.free_blocks
    }
}

/// Free-list allocator for a single block size over one zone of the arena.
///
/// The class never owns the arena; the pool passes it in on every call, and
/// the class only deals in offsets.
pub struct SizeClass {
    zone: Zone,
    // slot index of the first free block
    head: SpinLock<Option<usize>>,
}

impl SizeClass {
    /// Threads every block of `zone` into one free list, lowest block first.
    pub(crate) fn new(arena: &Arena, zone: Zone) -> Self {
        let count = zone.block_count();

        for slot in 0..count {
            let next = (slot + 1 < count).then_some(slot + 1);
            // SAFETY: the zone is being built and nothing has been handed out
            unsafe { FreeNode { next }.write(arena, &zone, slot) };
        }

        tracing::debug!(
            block_size = zone.block_size(),
            blocks = count,
            zone_offset = zone.start(),
            "size class ready"
        );

        Self {
            zone,
            head: SpinLock::new((count > 0).then_some(0)),
        }
    }

    #[inline(always)]
    pub fn block_size(&self) -> usize {
        self.zone.block_size()
    }

    #[inline(always)]
    pub fn block_count(&self) -> usize {
        self.zone.block_count()
    }

    #[inline(always)]
    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Unlinks the first free block and returns its arena offset.
    pub(crate) fn take(&self, arena: &Arena) -> Option<usize> {
        let mut head = self.head.lock();

        let slot = (*head)?;
        // SAFETY: slot is the head of our free list and we hold the lock
        *head = unsafe { FreeNode::read(arena, &self.zone, slot) }.next;

        Some(self.zone.offset_of(slot))
    }

    /// Threads the block at `offset` back onto the free list.
    ///
    /// With `check` set the free list is walked first and a block that is
    /// already free is refused instead of being linked in twice.
    pub(crate) fn give(&self, arena: &Arena, offset: usize, check: bool) -> Give {
        let Some(slot) = self.zone.slot_of(offset) else {
            return Give::NotMine;
        };

        let mut head = self.head.lock();

        if check && self.is_free(arena, *head, slot) {
            return Give::AlreadyFree { slot };
        }

        // SAFETY: the caller is done with the block and we hold the lock
        unsafe { FreeNode { next: *head }.write(arena, &self.zone, slot) };
        *head = Some(slot);

        Give::Accepted { slot }
    }

    /// Number of blocks currently on the free list.
    pub(crate) fn free_count(&self, arena: &Arena) -> usize {
        let head = self.head.lock();
        self.walk(arena, *head).count()
    }

    pub(crate) fn stats(&self, arena: &Arena) -> ClassStats {
        ClassStats {
            block_size: self.block_size(),
            block_count: self.block_count(),
            zone_offset: self.zone.start(),
            free_blocks: self.free_count(arena),
        }
    }

    fn is_free(&self, arena: &Arena, head: Option<usize>, slot: usize) -> bool {
        self.walk(arena, head).any(|free| free == slot)
    }

    // Must be called with the lock held. Stops after `block_count` steps so a
    // list corrupted by a double release cannot loop forever.
    fn walk<'a>(&'a self, arena: &'a Arena, head: Option<usize>) -> impl Iterator<Item = usize> + 'a {
        let mut cursor = head;

        core::iter::from_fn(move || {
            let slot = cursor?;
            // SAFETY: slot is on our free list and the caller holds the lock
            cursor = unsafe { FreeNode::read(arena, &self.zone, slot) }.next;
            Some(slot)
        })
        .take(self.block_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(arena: &Arena, start: usize, zone_size: usize, block_size: usize) -> SizeClass {
        SizeClass::new(arena, Zone::new(start, zone_size, block_size))
    }

    #[test]
    fn test_init() {
        let arena = Arena::new();
        let class = class(&arena, 0, 16384, 2048);

        assert_eq!(class.block_count(), 8);
        assert_eq!(class.free_count(&arena), 8);

        // blocks come out in address order on a fresh class
        let offsets: Vec<usize> = (0..8).map(|_| class.take(&arena).unwrap()).collect();
        assert_eq!(offsets, (0..8).map(|i| i * 2048).collect::<Vec<_>>());
    }

    #[test]
    fn take_until_exhausted() {
        let arena = Arena::new();
        let class = class(&arena, 32768, 16384, 8192);

        assert_eq!(class.take(&arena), Some(32768));
        assert_eq!(class.take(&arena), Some(40960));
        assert_eq!(class.take(&arena), None);
        assert_eq!(class.take(&arena), None);
        assert_eq!(class.free_count(&arena), 0);
    }

    #[test]
    fn give_is_lifo() {
        let arena = Arena::new();
        let class = class(&arena, 0, 4096, 512);

        let first = class.take(&arena).unwrap();
        let second = class.take(&arena).unwrap();

        assert_eq!(class.give(&arena, first, false), Give::Accepted { slot: 0 });
        assert_eq!(class.give(&arena, second, false), Give::Accepted { slot: 1 });

        assert_eq!(class.take(&arena), Some(second));
        assert_eq!(class.take(&arena), Some(first));
    }

    #[test]
    fn give_outside_zone() {
        let arena = Arena::new();
        let class = class(&arena, 16384, 16384, 4096);

        assert_eq!(class.give(&arena, 0, false), Give::NotMine);
        assert_eq!(class.give(&arena, 16383, false), Give::NotMine);
        assert_eq!(class.give(&arena, 32768, false), Give::NotMine);
        assert_eq!(class.free_count(&arena), 4);
    }

    #[test]
    fn interior_offset_returns_whole_block() {
        let arena = Arena::new();
        let class = class(&arena, 0, 4096, 1024);

        let block = class.take(&arena).unwrap();
        assert_eq!(class.give(&arena, block + 100, false), Give::Accepted { slot: 0 });
        assert_eq!(class.take(&arena), Some(block));
    }

    #[test]
    fn checked_give_refuses_free_block() {
        let arena = Arena::new();
        let class = class(&arena, 0, 4096, 1024);

        let block = class.take(&arena).unwrap();
        assert_eq!(class.give(&arena, block, true), Give::Accepted { slot: 0 });
        assert_eq!(class.give(&arena, block, true), Give::AlreadyFree { slot: 0 });

        // a never-allocated block is already free too
        assert_eq!(class.give(&arena, 3072, true), Give::AlreadyFree { slot: 3 });
        assert_eq!(class.free_count(&arena), 4);
    }

    #[test]
    fn unchecked_double_give_corrupts_but_terminates() {
        let arena = Arena::new();
        let class = class(&arena, 0, 4096, 1024);

        let block = class.take(&arena).unwrap();
        class.give(&arena, block, false);
        class.give(&arena, block, false);

        // the block now links to itself; walking stays bounded
        assert_eq!(class.free_count(&arena), 4);
        assert_eq!(class.take(&arena), Some(block));
        assert_eq!(class.take(&arena), Some(block));
    }

    #[test]
    fn stats_track_loans() {
        let arena = Arena::new();
        let class = class(&arena, 49152, 16384, 2048);

        class.take(&arena);
        class.take(&arena);
        class.take(&arena);

        let stats = class.stats(&arena);
        assert_eq!(
            stats,
            ClassStats {
                block_size: 2048,
                block_count: 8,
                zone_offset: 49152,
                free_blocks: 5,
            }
        );
        assert_eq!(stats.in_use(), 3);
    }
}
