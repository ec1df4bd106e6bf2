//! Index configuration.
//!
//! All tuning knobs for an [`ItemIndex`](crate::ItemIndex) live here.
//! Delta versions inherit the configuration of their base.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::error::GraphError;

/// Default number of leading characters used to bucket names.
pub const DEFAULT_NAME_PREFIX_LEN: usize = 18;

/// Default number of base items processed per delta construction batch.
pub const DEFAULT_DELTA_BATCH_SIZE: usize = 1_000;

/// Default threshold above which a name-index build is logged as slow.
pub const DEFAULT_SLOW_INDEX_BUILD_MS: u64 = 250;

/// Tuning parameters for an item index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Characters of a name used as the name-index bucket key.
    pub name_prefix_len: usize,
    /// Base items per parallel batch when building a delta version.
    pub delta_batch_size: usize,
    /// Name-index builds slower than this are logged at warn level.
    pub slow_index_build_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name_prefix_len: DEFAULT_NAME_PREFIX_LEN,
            delta_batch_size: DEFAULT_DELTA_BATCH_SIZE,
            slow_index_build_ms: DEFAULT_SLOW_INDEX_BUILD_MS,
        }
    }
}

impl IndexConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// - `GRAPH_NAME_PREFIX_LEN`
    /// - `GRAPH_DELTA_BATCH_SIZE`
    /// - `GRAPH_SLOW_INDEX_BUILD_MS`
    pub fn from_env() -> Result<Self, GraphError> {
        let defaults = Self::default();
        let config = Self {
            name_prefix_len: env_or("GRAPH_NAME_PREFIX_LEN", defaults.name_prefix_len)?,
            delta_batch_size: env_or("GRAPH_DELTA_BATCH_SIZE", defaults.delta_batch_size)?,
            slow_index_build_ms: env_or("GRAPH_SLOW_INDEX_BUILD_MS", defaults.slow_index_build_ms)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the index unusable.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.name_prefix_len == 0 {
            return Err(GraphError::InvalidConfig("name_prefix_len must be > 0".into()));
        }
        if self.delta_batch_size == 0 {
            return Err(GraphError::InvalidConfig("delta_batch_size must be > 0".into()));
        }
        Ok(())
    }

    /// Deterministic hash of the parameters.
    pub fn params_hash(&self) -> Result<String, GraphError> {
        canonical_hash_hex(self)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, GraphError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| GraphError::InvalidConfig(format!("{key}={raw} is not a valid number"))),
        Err(_) => Ok(default),
    }
}
