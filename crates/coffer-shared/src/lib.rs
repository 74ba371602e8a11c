//! Single-threaded shared ownership with weak references.
//!
//! A [`SharedPtr`] owns an object together with every other `SharedPtr`
//! cloned from it; a [`WeakPtr`] observes the object without keeping it
//! alive. Both point at a control block that carries the two reference
//! counts and knows how to destroy the object and free itself:
//!
//! ```text
//!            ┌──────── control block ─────────┐
//! SharedPtr ─┤ Counter { strong, weak }       │
//! WeakPtr  ──┤ &'static BlockOps              │
//!            │ payload: value | ptr + deleter │
//!            └────────────────────────────────┘
//! ```
//!
//! The object is destroyed when the strong count drops to zero; the block
//! is released when the weak count (which holds one extra reference on
//! behalf of all strong owners) drops to zero.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

mod block;
pub mod counter;
pub mod deleter;
pub mod shared;
pub mod weak;

pub use counter::{Counter, StrongRelease};
pub use deleter::{DefaultDelete, Deleter};
pub use shared::SharedPtr;
pub use weak::WeakPtr;
