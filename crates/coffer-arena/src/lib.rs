//! Fixed-capacity stack arena and uninitialized slot storage.
//!
//! Provides the two storage layers the coffer containers are built on:
//! a bump-allocated byte arena with LIFO rollback, and typed blocks of
//! uninitialized slots with explicit construct/destroy. This crate is
//! one of the few in the workspace that contain `unsafe` code; every
//! unsafe block carries a `// SAFETY:` comment.
//!
//! # Architecture
//!
//! ```text
//! Arena (owns one max-aligned byte buffer + cursor)
//! └── ArenaAlloc<'a, T> × N (Copy views, compare equal iff same arena)
//!     └── RawAlloc impl → usable by List, UnorderedMap, SharedPtr
//!
//! RawSlots<T> (Box<[MaybeUninit<T>]>, liveness tracked by the owner)
//! └── SlotRange (half-open live range bookkeeping)
//! ```
//!
//! # Reclamation
//!
//! The arena never frees in general. Releasing exactly the most recent
//! allocation rewinds the cursor (stack discipline); any other release is
//! a no-op. Exhaustion is reported as [`AllocError::Exhausted`] and the
//! cursor is left untouched.
//!
//! [`AllocError::Exhausted`]: coffer_core::AllocError::Exhausted

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arena;
pub mod config;
pub mod error;
pub mod raw;
pub mod view;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use raw::{RawSlots, SlotRange};
pub use view::ArenaAlloc;
