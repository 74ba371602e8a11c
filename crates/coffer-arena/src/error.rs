//! Arena-specific error types.

use thiserror::Error;

/// Errors raised while building an [`Arena`](crate::Arena) from its config.
///
/// Allocation failures at runtime are reported through
/// [`coffer_core::AllocError`] instead, since they cross the
/// [`RawAlloc`](coffer_core::RawAlloc) seam.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// A zero-byte arena can never satisfy a request.
    #[error("arena capacity must be non-zero")]
    ZeroCapacity,
    /// The maximum alignment is not a power of two.
    #[error("arena max alignment {align} is not a power of two")]
    InvalidAlignment {
        /// The rejected alignment.
        align: usize,
    },
    /// Capacity rounded up to the alignment overflows `isize`.
    #[error("arena capacity {capacity} bytes is too large")]
    CapacityOverflow {
        /// The rejected capacity.
        capacity: usize,
    },
}
