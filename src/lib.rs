//! Fixed-size-class memory pool.
//!
//! A static arena is split into equal zones, one per configured block size.
//! Every zone is carved into blocks of its size and served by its own
//! free-list allocator, so allocation and release are constant time and never
//! touch the system heap.
//!
//! ```
//! use rspool::Pool;
//!
//! let pool = Box::new(Pool::with_block_sizes(&[2048, 4096, 8192, 16384]));
//! assert!(pool.is_initialized());
//!
//! let block = pool.allocate(3000).unwrap();
//! assert_eq!(pool.usable_size(block.as_ptr()), Some(4096));
//! // SAFETY: the block came from this pool and is not used again.
//! unsafe { pool.release(block.as_ptr()) };
//! ```

mod arena;
mod class;
mod config;
mod error;
pub mod ffi;
pub mod global;
mod node;
mod pool;
mod spin_lock;
mod utils;

pub use arena::Arena;
pub use class::ClassStats;
pub use config::PoolConfig;
pub use error::{ConfigError, PoolError};
pub use global::get_pool;
pub use pool::Pool;
pub use spin_lock::{SpinGuard, SpinLock};

/// Bytes in the arena shared by all size classes.
pub const ARENA_SIZE: usize = 64 * 1024;

/// Alignment of the arena, and so the largest alignment a block can promise.
pub const ARENA_ALIGN: usize = 4096;

/// Most size classes a pool can be configured with.
pub const MAX_CLASSES: usize = 16;

/// Smallest block: a free block must hold its free-list link.
pub const MIN_BLOCK_SIZE: usize = node::LINK_SIZE;

const _: () = assert!(ARENA_SIZE / MAX_CLASSES >= ARENA_ALIGN);
