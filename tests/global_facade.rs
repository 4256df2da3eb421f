// The process-wide pool is built once per process, so everything that
// touches it lives in a single test.

use rspool::global;

#[test]
fn first_configuration_wins() {
    // nothing built yet
    assert!(global::pool().is_none());
    assert!(global::alloc(32).is_null());
    unsafe { global::free(std::ptr::null()) };

    assert!(global::init(&[2048, 8192, 4096, 16384]));

    // a later, different (even invalid) configuration is ignored
    let pool = rspool::get_pool(&[3, 5, 7]);
    assert!(pool.is_initialized());
    assert_eq!(pool.block_sizes().collect::<Vec<_>>(), vec![2048, 4096, 8192, 16384]);
    assert!(std::ptr::eq(pool, rspool::get_pool(&[64])));

    let a = global::alloc(16384);
    assert!(!a.is_null());
    assert!(global::alloc(16384).is_null());

    unsafe { global::free(a) };
    assert_eq!(global::alloc(9000), a);

    let local = 0u8;
    let before = pool.free_blocks();
    unsafe { global::free(&local) };
    assert_eq!(pool.free_blocks(), before);
}
