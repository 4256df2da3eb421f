use super::error::ConfigError;
use serde::{Deserialize, Serialize};

/// How a pool is built: its block-size table and optional release checking.
///
/// ```toml
/// block_sizes = [2048, 4096, 8192, 16384]
/// check_double_release = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// One entry per size class, in any order.
    pub block_sizes: Vec<usize>,

    /// Walk the free list on every release and refuse blocks that are
    /// already free. Costs O(free blocks) per release.
    #[serde(default)]
    pub check_double_release: bool,
}

impl PoolConfig {
    pub fn new(block_sizes: impl Into<Vec<usize>>) -> Self {
        Self {
            block_sizes: block_sizes.into(),
            check_double_release: false,
        }
    }

    pub fn with_double_release_check(mut self, enabled: bool) -> Self {
        self.check_double_release = enabled;
        self
    }

    /// Parses a configuration file. The sizes are validated when the pool is
    /// built, not here.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

impl From<&[usize]> for PoolConfig {
    fn from(block_sizes: &[usize]) -> Self {
        Self::new(block_sizes)
    }
}
