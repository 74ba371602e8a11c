//! Bucketed double-ended queue.
//!
//! [`Deque`] stores its elements in fixed-size buckets of
//! [`BUCKET_SIZE`] uninitialized slots, reached through an indirection
//! array. Pushing at either end is amortized O(1), indexing is O(1), and
//! elements never move when the indirection array is reallocated.
//!
//! ```text
//! indirection: [ b0 | b1 | b2 | b3 | b4 | b5 ]
//!                     └─live──────────┘
//!                     start          end   (flat slot indices)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod cursor;
pub mod deque;
pub mod iter;

pub use cursor::Cursor;
pub use deque::{Deque, BUCKET_SIZE};
pub use iter::{IntoIter, Iter, IterMut};
