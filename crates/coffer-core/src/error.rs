//! Error types shared by every coffer container.
//!
//! Two families: [`AllocError`] for storage that could not be obtained,
//! and [`AccessError`] for bounds-checked lookups that found nothing.

use thiserror::Error;

/// Errors raised when an allocator cannot satisfy a request.
///
/// The infallible container API treats these as fatal; the `try_*`
/// variants surface them to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
    /// A fixed-capacity arena has no room left for the request.
    #[error("arena exhausted: requested {requested} bytes, {remaining} bytes remaining")]
    Exhausted {
        /// Bytes requested, including alignment padding.
        requested: usize,
        /// Bytes left between the cursor and the end of the arena.
        remaining: usize,
    },
    /// The requested alignment exceeds what the allocator was built for.
    #[error("alignment {align} exceeds allocator maximum {max_align}")]
    UnsupportedAlignment {
        /// Alignment requested by the layout.
        align: usize,
        /// Largest alignment the allocator can honour.
        max_align: usize,
    },
    /// The backing allocator returned no memory.
    #[error("allocator refused a request of {size} bytes")]
    Refused {
        /// Size of the refused request in bytes.
        size: usize,
    },
    /// The element count overflowed the addressable layout size.
    #[error("allocation size overflows the address space")]
    CapacityOverflow,
}

/// Errors raised by bounds-checked element access.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AccessError {
    /// An index past the end of a sequence.
    #[error("index {index} out of range for length {len}")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The sequence length at the time of access.
        len: usize,
    },
    /// A key that is not present in a map.
    #[error("key not found")]
    KeyNotFound,
}
