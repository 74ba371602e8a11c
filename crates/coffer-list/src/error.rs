//! Map configuration errors.

use thiserror::Error;

/// Errors raised while validating a [`MapConfig`](crate::MapConfig).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A map needs at least one bucket to index into.
    #[error("map must start with at least one bucket")]
    ZeroBuckets,
    /// The load factor threshold must be finite and no smaller than
    /// [`MapConfig::MIN_MAX_LOAD_FACTOR`](crate::MapConfig::MIN_MAX_LOAD_FACTOR).
    #[error("max load factor {value} must be finite and at least 1/256")]
    InvalidLoadFactor {
        /// The rejected threshold.
        value: f32,
    },
}
