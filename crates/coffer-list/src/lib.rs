//! Allocator-aware linked list and the hash map built on it.
//!
//! [`List`] is a circular doubly-linked list closed through a sentinel
//! node. Every node, the sentinel included, is allocated through the
//! list's [`RawAlloc`](coffer_core::RawAlloc), so a list can live entirely
//! inside a fixed-capacity arena.
//!
//! [`UnorderedMap`] keeps all of its entries in one such list, ordered so
//! that entries of the same bucket are adjacent. The bucket index only
//! stores where each run starts:
//!
//! ```text
//! buckets:  [0]──┐   [1]: empty   [2]──────────┐
//!                v                              v
//! list:  S ⇄ (k3,b0) ⇄ (k7,b0) ⇄ (k1,b2) ⇄ (k9,b2) ⇄ S
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod iter;
pub mod list;
pub mod map;
mod node;

pub use config::MapConfig;
pub use cursor::CursorMut;
pub use error::ConfigError;
pub use iter::{IntoIter, Iter, IterMut};
pub use list::List;
pub use map::UnorderedMap;
