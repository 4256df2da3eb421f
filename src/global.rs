//! The process-wide pool.
//!
//! The first caller decides the configuration for the lifetime of the
//! process; every later call gets the same pool back and its arguments are
//! ignored.

use super::{Pool, PoolConfig};
use core::ptr::{self, NonNull};
use std::sync::OnceLock;

static POOL: OnceLock<Pool> = OnceLock::new();

/// Returns the process-wide pool, building it from `block_sizes` on the
/// first call.
pub fn get_pool(block_sizes: &[usize]) -> &'static Pool {
    get_pool_with(PoolConfig::from(block_sizes))
}

/// Like [`get_pool`] with a full configuration.
pub fn get_pool_with(config: PoolConfig) -> &'static Pool {
    if let Some(pool) = POOL.get() {
        if pool.config() != &config {
            tracing::debug!(
                requested = ?config.block_sizes,
                active = ?pool.config().block_sizes,
                "memory pool already built, ignoring new configuration"
            );
        }
        return pool;
    }

    POOL.get_or_init(|| Pool::new(config))
}

/// The process-wide pool, if anyone has built it yet.
pub fn pool() -> Option<&'static Pool> {
    POOL.get()
}

/// Builds the process-wide pool and reports whether it is usable.
pub fn init(block_sizes: &[usize]) -> bool {
    get_pool(block_sizes).is_initialized()
}

/// Allocates from the process-wide pool; null when it is exhausted or was
/// never built.
pub fn alloc(n: usize) -> *mut u8 {
    pool()
        .and_then(|pool| pool.allocate(n))
        .map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// Releases to the process-wide pool. Foreign addresses, and any address
/// before the pool is built, are ignored.
///
/// # Safety
///
/// `ptr` must come from [`alloc`] (or be outside the pool's arena) and must
/// not be used afterwards. See [`Pool::release`].
pub unsafe fn free(ptr: *const u8) {
    if let Some(pool) = pool() {
        pool.release(ptr);
    }
}
