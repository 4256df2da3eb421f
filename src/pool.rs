use super::arena::{partition, Arena};
use super::class::{ClassStats, Give, SizeClass};
use super::config::PoolConfig;
use super::error::{ConfigError, PoolError};
use super::utils::{align_forward, is_power_of_two};
use super::{ARENA_ALIGN, ARENA_SIZE, MAX_CLASSES, MIN_BLOCK_SIZE};
use core::alloc::{GlobalAlloc, Layout};
use core::fmt;
use core::ptr::{self, NonNull};

/// A fixed arena split into equal zones, one per configured block size.
///
/// Requests are served by the smallest class whose blocks are large enough,
/// falling back to larger classes while the smaller ones are exhausted.
///
/// Pointers returned by [`Pool::allocate`] point into the pool itself, so the
/// pool must stay put (a `static`, a `Box`, ...) while blocks are out.
pub struct Pool {
    arena: Arena,
    // ascending by block size; empty when the configuration was refused
    classes: Box<[SizeClass]>,
    config: PoolConfig,
    init_error: Option<ConfigError>,
}

impl Pool {
    /// Builds a pool. An invalid configuration still yields a pool, but one
    /// that reports [`Pool::is_initialized`] as false and has no classes.
    pub fn new(config: PoolConfig) -> Self {
        let arena = Arena::new();

        let (classes, init_error) = match validate(&config.block_sizes) {
            Ok(sizes) => {
                tracing::debug!(block_sizes = ?sizes, "building memory pool");

                let classes = partition(&sizes)
                    .map(|zone| SizeClass::new(&arena, zone))
                    .collect();
                (classes, None)
            }
            Err(err) => {
                tracing::warn!(error = %err, "refusing pool configuration");
                (Box::default(), Some(err))
            }
        };

        Self {
            arena,
            classes,
            config,
            init_error,
        }
    }

    pub fn with_block_sizes(block_sizes: &[usize]) -> Self {
        Self::new(PoolConfig::from(block_sizes))
    }

    /// Like [`Pool::new`], but refuses an invalid configuration outright.
    pub fn try_new(config: PoolConfig) -> Result<Self, ConfigError> {
        let pool = Self::new(config);
        match pool.init_error {
            Some(err) => Err(err),
            None => Ok(pool),
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.init_error.is_none()
    }

    /// Why construction failed, if it did.
    pub fn init_error(&self) -> Option<&ConfigError> {
        self.init_error.as_ref()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Block sizes of the classes, ascending.
    pub fn block_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.classes.iter().map(SizeClass::block_size)
    }

    /// Hands out a block of at least `n` bytes, or `None` when every class
    /// that could hold `n` bytes is exhausted.
    pub fn allocate(&self, n: usize) -> Option<NonNull<u8>> {
        for class in self.classes.iter().filter(|class| class.block_size() >= n) {
            if let Some(offset) = class.take(&self.arena) {
                tracing::trace!(
                    requested = n,
                    block_size = class.block_size(),
                    offset,
                    "allocated block"
                );
                return Some(self.arena.ptr_at(offset));
            }
        }

        tracing::debug!(requested = n, "memory pool exhausted");
        None
    }

    pub fn try_allocate(&self, n: usize) -> Result<NonNull<u8>, PoolError> {
        if let Some(err) = &self.init_error {
            return Err(PoolError::Uninitialized(err.clone()));
        }
        self.allocate(n)
            .ok_or(PoolError::Exhausted { requested: n })
    }

    /// Returns a block to the pool. Addresses outside the arena are ignored.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`Pool::allocate`] on this pool and must not be
    /// used after this call: the pool writes its free-list link into the
    /// block and may hand it out again. Each block may be released once,
    /// unless the pool was configured with `check_double_release`. Pointers
    /// outside the arena are always fine.
    pub unsafe fn release(&self, ptr: *const u8) {
        // outcome is already logged
        let _ = self.try_release(ptr);
    }

    /// Returns a block to the pool, reporting addresses it does not own and,
    /// with the release check enabled, blocks that are already free.
    ///
    /// On success yields the block size of the class that took the block.
    ///
    /// # Safety
    ///
    /// Same contract as [`Pool::release`].
    pub unsafe fn try_release(&self, ptr: *const u8) -> Result<usize, PoolError> {
        let address = ptr as usize;
        let foreign = PoolError::ForeignAddress { address };

        let Some(offset) = self.arena.offset_of(address) else {
            tracing::trace!(address, "ignoring release of foreign address");
            return Err(foreign);
        };

        for class in self.classes.iter() {
            match class.give(&self.arena, offset, self.config.check_double_release) {
                Give::NotMine => continue,
                Give::Accepted { slot } => {
                    tracing::trace!(block_size = class.block_size(), slot, "released block");
                    return Ok(class.block_size());
                }
                Give::AlreadyFree { slot } => {
                    tracing::warn!(
                        address,
                        block_size = class.block_size(),
                        slot,
                        "refusing to release a block that is already free"
                    );
                    return Err(PoolError::DoubleRelease { address });
                }
            }
        }

        // inside the arena but past the last block of a zone, or no classes
        tracing::trace!(address, "ignoring release of address outside every zone");
        Err(foreign)
    }

    /// Whether `ptr` lies inside a zone of this pool.
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.class_of(ptr).is_some()
    }

    /// Block size of the class whose zone holds `ptr`.
    pub fn usable_size(&self, ptr: *const u8) -> Option<usize> {
        self.class_of(ptr).map(SizeClass::block_size)
    }

    pub fn class_stats(&self) -> Vec<ClassStats> {
        self.classes
            .iter()
            .map(|class| class.stats(&self.arena))
            .collect()
    }

    /// Free blocks across every class.
    pub fn free_blocks(&self) -> usize {
        self.classes
            .iter()
            .map(|class| class.free_count(&self.arena))
            .sum()
    }

    fn class_of(&self, ptr: *const u8) -> Option<&SizeClass> {
        let offset = self.arena.offset_of(ptr as usize)?;
        self.classes
            .iter()
            .find(|class| class.zone().contains(offset))
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("arena", &format_args!("{:#x}..{:#x}", self.arena.start(), self.arena.end()))
            .field("classes", &self.class_stats())
            .field("init_error", &self.init_error)
            .finish()
    }
}

/// Checks a block-size table and returns it sorted ascending.
fn validate(block_sizes: &[usize]) -> Result<Vec<usize>, ConfigError> {
    let count = block_sizes.len();

    if !is_power_of_two(count) {
        return Err(ConfigError::ClassCountNotPowerOfTwo { count });
    }

    if count > MAX_CLASSES {
        return Err(ConfigError::TooManyClasses {
            count,
            max: MAX_CLASSES,
        });
    }

    let zone = ARENA_SIZE / count;
    for (index, &size) in block_sizes.iter().enumerate() {
        if !is_power_of_two(size) {
            return Err(ConfigError::BlockSizeNotPowerOfTwo { index, size });
        }

        if size > zone {
            return Err(ConfigError::BlockSizeTooLarge { index, size, zone });
        }

        if size < MIN_BLOCK_SIZE {
            return Err(ConfigError::BlockSizeTooSmall {
                index,
                size,
                min: MIN_BLOCK_SIZE,
            });
        }
    }

    let mut sorted = block_sizes.to_vec();
    sorted.sort();
    Ok(sorted)
}

// Blocks of size B sit at multiples of B from an arena aligned to ARENA_ALIGN,
// so asking for at least `align` bytes is enough to honor the layout.
unsafe impl GlobalAlloc for Pool {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ARENA_ALIGN {
            return ptr::null_mut();
        }

        let request = align_forward(layout.size(), layout.align()).max(layout.align());

        match self.allocate(request) {
            Some(block) => block.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        self.release(ptr);
    }
}
