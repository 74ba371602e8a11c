//! Arena configuration parameters.

use std::alloc::Layout;

use crate::error::ArenaError;

/// Configuration for a fixed-capacity [`Arena`](crate::Arena).
///
/// Controls the byte capacity and the largest alignment the arena can
/// serve. Validated at construction; the arena never grows afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total arena size in bytes.
    ///
    /// Default: 65_536 (64KB). Must be non-zero.
    pub capacity: usize,

    /// Alignment of the arena's base address, and therefore the largest
    /// alignment any single allocation may request.
    ///
    /// Default: 16, enough for every primitive type on mainstream targets.
    /// Must be a power of two.
    pub max_align: usize,
}

impl ArenaConfig {
    /// Default capacity: 64KB.
    pub const DEFAULT_CAPACITY: usize = 64 * 1024;

    /// Default maximum alignment.
    pub const DEFAULT_MAX_ALIGN: usize = 16;

    /// Create a config for an arena of `capacity` bytes.
    ///
    /// Uses the default maximum alignment.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            max_align: Self::DEFAULT_MAX_ALIGN,
        }
    }

    /// Override the maximum alignment.
    pub fn with_max_align(mut self, max_align: usize) -> Self {
        self.max_align = max_align;
        self
    }

    /// Check the config and produce the layout of the backing buffer.
    pub fn validate(&self) -> Result<Layout, ArenaError> {
        if self.capacity == 0 {
            return Err(ArenaError::ZeroCapacity);
        }
        if !self.max_align.is_power_of_two() {
            return Err(ArenaError::InvalidAlignment {
                align: self.max_align,
            });
        }
        Layout::from_size_align(self.capacity, self.max_align).map_err(|_| {
            ArenaError::CapacityOverflow {
                capacity: self.capacity,
            }
        })
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
