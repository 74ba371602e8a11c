//! Coffer: allocator-aware containers and ownership primitives.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Coffer sub-crates. For most users, adding `coffer` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use coffer::prelude::*;
//!
//! // A deque that grows at both ends.
//! let mut queue: Deque<u32> = (1..=3).collect();
//! queue.push_front(0);
//! assert_eq!(queue[0], 0);
//! assert_eq!(queue.len(), 4);
//!
//! // A list whose nodes come from a bump arena.
//! let arena = Arena::with_capacity(4096).unwrap();
//! let mut list = List::new_in(ArenaAlloc::<&str>::new(&arena));
//! list.push_back("bump");
//! list.push_back("allocated");
//! assert_eq!(list.len(), 2);
//! assert!(arena.used() > 0);
//!
//! // A map that keeps each bucket's entries adjacent in one list.
//! let mut map = UnorderedMap::new();
//! map.insert("heat", 1.5);
//! assert_eq!(map.get("heat"), Some(&1.5));
//!
//! // Shared ownership with weak observers.
//! let owner = SharedPtr::new(String::from("payload"));
//! let watcher = owner.downgrade();
//! assert_eq!(owner.use_count(), 1);
//! drop(owner);
//! assert!(watcher.expired());
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`memory`] | `coffer-core` | `RawAlloc`, `Global`, error types |
//! | [`arena`] | `coffer-arena` | Bump arena, `ArenaAlloc`, raw slot storage |
//! | [`deque`] | `coffer-deque` | `Deque`, cursors and iterators |
//! | [`list`] | `coffer-list` | `List`, `UnorderedMap`, map configuration |
//! | [`shared`] | `coffer-shared` | `SharedPtr`, `WeakPtr`, deleters, counters |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Allocator protocol and error types (`coffer-core`).
///
/// Implement [`memory::RawAlloc`] to plug a custom allocator into any
/// container in this crate.
pub use coffer_core as memory;

/// Fixed-capacity bump arena and uninitialized slot storage (`coffer-arena`).
///
/// [`arena::ArenaAlloc`] is the allocator view that containers accept.
pub use coffer_arena as arena;

/// Bucketed double-ended queue (`coffer-deque`).
pub use coffer_deque as deque;

/// Sentinel-ring linked list and the chained hash map built on it
/// (`coffer-list`).
///
/// See [`list::UnorderedMap`] and [`list::MapConfig`].
pub use coffer_list as list;

/// Reference-counted shared and weak pointers (`coffer-shared`).
pub use coffer_shared as shared;

/// Common imports for typical Coffer usage.
///
/// ```rust
/// use coffer::prelude::*;
/// ```
pub mod prelude {
    // Allocation
    pub use coffer_core::{AccessError, AllocError, Global, RawAlloc};
    pub use coffer_arena::{Arena, ArenaAlloc, ArenaConfig};

    // Containers
    pub use coffer_deque::Deque;
    pub use coffer_list::{List, MapConfig, UnorderedMap};

    // Ownership
    pub use coffer_shared::{SharedPtr, WeakPtr};
}
