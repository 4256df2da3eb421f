pub fn is_power_of_two(x: usize) -> bool {
    // zero has no bits set but is not a power of two
    x != 0 && (x & (x - 1)) == 0
}

pub fn align_forward(mut addr: usize, alignment: usize) -> usize {
    assert!(is_power_of_two(alignment));

    // Same as (addr % alignment) but faster as 'alignment' is a power of two
    let modulo = addr & (alignment - 1);

    if modulo != 0 {
        addr += alignment - modulo;
    }

    addr
}
