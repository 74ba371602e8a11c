//! Hash map configuration parameters.

use crate::error::ConfigError;

/// Configuration for an [`UnorderedMap`](crate::UnorderedMap).
#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
    /// Bucket count of an empty map.
    ///
    /// Default: 8. Must be non-zero.
    pub initial_buckets: usize,

    /// Largest `len / bucket_count` tolerated before an insertion grows
    /// the bucket index.
    ///
    /// Default: 0.8. Must be finite and at least
    /// [`MIN_MAX_LOAD_FACTOR`](Self::MIN_MAX_LOAD_FACTOR).
    pub max_load_factor: f32,
}

impl MapConfig {
    /// Default initial bucket count.
    pub const DEFAULT_INITIAL_BUCKETS: usize = 8;

    /// Default load factor threshold.
    pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 0.8;

    /// Smallest accepted load factor threshold: at most 256 buckets per
    /// entry.
    pub const MIN_MAX_LOAD_FACTOR: f32 = 1.0 / 256.0;

    /// A config with `initial_buckets` and the default load factor.
    pub fn new(initial_buckets: usize) -> Self {
        Self {
            initial_buckets,
            max_load_factor: Self::DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    /// Override the load factor threshold.
    pub fn with_max_load_factor(mut self, max_load_factor: f32) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_buckets == 0 {
            return Err(ConfigError::ZeroBuckets);
        }
        validate_load_factor(self.max_load_factor)
    }
}

pub(crate) fn validate_load_factor(value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= MapConfig::MIN_MAX_LOAD_FACTOR {
        Ok(())
    } else {
        Err(ConfigError::InvalidLoadFactor { value })
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_BUCKETS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MapConfig::default();
        assert_eq!(config.initial_buckets, 8);
        assert_eq!(config.max_load_factor, 0.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_buckets_rejected() {
        assert_eq!(MapConfig::new(0).validate(), Err(ConfigError::ZeroBuckets));
    }

    #[test]
    fn bad_load_factors_rejected() {
        for value in [0.0, -1.0, 1e-30, 0.001, f32::NAN, f32::INFINITY] {
            let result = MapConfig::default().with_max_load_factor(value).validate();
            assert!(matches!(result, Err(ConfigError::InvalidLoadFactor { .. })));
        }
        let floor = MapConfig::default().with_max_load_factor(MapConfig::MIN_MAX_LOAD_FACTOR);
        assert!(floor.validate().is_ok());
    }
}
