//! C entry points over the process-wide pool.

use super::global;
use core::ffi::c_void;
use core::slice;

/// Builds the process-wide pool from `block_size_count` sizes at
/// `block_sizes`. Returns whether the pool is usable.
///
/// # Safety
///
/// `block_sizes` must point to `block_size_count` readable sizes, or be null
/// with a count of zero.
#[no_mangle]
pub unsafe extern "C" fn pool_init(block_sizes: *const usize, block_size_count: usize) -> bool {
    let sizes = if block_sizes.is_null() {
        &[][..]
    } else {
        slice::from_raw_parts(block_sizes, block_size_count)
    };

    global::init(sizes)
}

/// Allocates `n` bytes, or returns null.
#[no_mangle]
pub extern "C" fn pool_malloc(n: usize) -> *mut c_void {
    global::alloc(n).cast()
}

/// Releases a block from [`pool_malloc`]. Pointers outside the pool are
/// ignored.
///
/// # Safety
///
/// `ptr` must come from [`pool_malloc`] and must not be used afterwards, or
/// lie outside the pool's arena.
#[no_mangle]
pub unsafe extern "C" fn pool_free(ptr: *mut c_void) {
    global::free(ptr.cast_const().cast());
}
