//! Errors reported by the pool.

use thiserror::Error;

/// Why a block-size table was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The number of size classes is zero or not a power of two.
    #[error("number of block sizes {count} is not a power of two")]
    ClassCountNotPowerOfTwo {
        /// Number of sizes supplied.
        count: usize,
    },

    /// More size classes than the pool has room for.
    #[error("number of block sizes {count} is larger than the maximum {max}")]
    TooManyClasses {
        /// Number of sizes supplied.
        count: usize,
        /// Compile-time limit.
        max: usize,
    },

    /// A block size is not a power of two.
    #[error("block size [{index}]: {size} is not a power of two")]
    BlockSizeNotPowerOfTwo {
        /// Position in the supplied table.
        index: usize,
        /// The offending size.
        size: usize,
    },

    /// A block size cannot hold a free-list link.
    #[error("block size [{index}]: {size} is less than the minimum block size {min}")]
    BlockSizeTooSmall {
        /// Position in the supplied table.
        index: usize,
        /// The offending size.
        size: usize,
        /// Smallest accepted block size.
        min: usize,
    },

    /// A block size does not fit even once in its zone.
    #[error("block size [{index}]: {size} is larger than the bytes per zone {zone}")]
    BlockSizeTooLarge {
        /// Position in the supplied table.
        index: usize,
        /// The offending size.
        size: usize,
        /// Bytes available to each class.
        zone: usize,
    },

    /// A configuration file could not be parsed.
    #[error("invalid pool configuration: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Failures of the fallible pool operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool was built from an invalid configuration and has no classes.
    #[error("pool is not initialized: {0}")]
    Uninitialized(ConfigError),

    /// No class large enough has a free block.
    #[error("no free block for a request of {requested} bytes")]
    Exhausted {
        /// Bytes requested.
        requested: usize,
    },

    /// The address is not inside any zone of the pool.
    #[error("address {address:#x} does not belong to the pool")]
    ForeignAddress {
        /// The released address.
        address: usize,
    },

    /// The block is already free; releasing it again was refused.
    #[error("block at {address:#x} is already free")]
    DoubleRelease {
        /// The released address.
        address: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_culprit() {
        let err = ConfigError::BlockSizeTooSmall {
            index: 0,
            size: 2,
            min: 8,
        };
        assert_eq!(
            err.to_string(),
            "block size [0]: 2 is less than the minimum block size 8"
        );

        let err = PoolError::ForeignAddress { address: 0x1000 };
        assert_eq!(err.to_string(), "address 0x1000 does not belong to the pool");

        let err = PoolError::Uninitialized(ConfigError::ClassCountNotPowerOfTwo { count: 3 });
        assert_eq!(
            err.to_string(),
            "pool is not initialized: number of block sizes 3 is not a power of two"
        );
    }
}
