//! Allocator trait and error types shared by the coffer containers.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the allocation seam every container allocates through ([`RawAlloc`]),
//! the process-wide default allocator ([`Global`]), and the error
//! taxonomy used across the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod alloc;
pub mod error;

pub use alloc::{handle_alloc_error, Global, RawAlloc};
pub use error::{AccessError, AllocError};
