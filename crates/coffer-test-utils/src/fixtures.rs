//! Allocator fixtures.
//!
//! - [`CountingAlloc`]: forwards to [`Global`] and counts every call.
//! - [`FailingAlloc`]: succeeds a fixed number of times, then refuses.

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use coffer_core::{AllocError, Global, RawAlloc};

#[derive(Debug, Default)]
struct Stats {
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
    bytes_live: Cell<usize>,
}

/// Counts allocations and deallocations made through it.
///
/// Clones share the counters, and only clones of the same handle are
/// [`same_source`](RawAlloc::same_source), so tests can catch storage
/// being released through the wrong allocator.
#[derive(Clone, Debug, Default)]
pub struct CountingAlloc {
    stats: Rc<Stats>,
}

impl CountingAlloc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocations(&self) -> usize {
        self.stats.allocations.get()
    }

    pub fn deallocations(&self) -> usize {
        self.stats.deallocations.get()
    }

    /// Allocations not yet returned.
    pub fn outstanding(&self) -> usize {
        self.allocations() - self.deallocations()
    }

    /// Bytes currently held by callers.
    pub fn bytes_live(&self) -> usize {
        self.stats.bytes_live.get()
    }
}

impl PartialEq for CountingAlloc {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.stats, &other.stats)
    }
}

impl RawAlloc for CountingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let ptr = Global.allocate(layout)?;
        let s = &self.stats;
        s.allocations.set(s.allocations.get() + 1);
        s.bytes_live.set(s.bytes_live.get() + layout.size());
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let s = &self.stats;
        s.deallocations.set(s.deallocations.get() + 1);
        s.bytes_live.set(s.bytes_live.get() - layout.size());
        // SAFETY: forwarded caller contract; every pointer we hand out came
        // from Global with the same layout.
        unsafe { Global.deallocate(ptr, layout) }
    }

    fn same_source(&self, other: &Self) -> bool {
        self == other
    }
}

/// Grants a fixed budget of allocations, then fails every request.
///
/// Useful for driving the error path of node and control-block
/// allocation. Clones share the budget.
#[derive(Clone, Debug)]
pub struct FailingAlloc {
    budget: Rc<Cell<usize>>,
    inner: CountingAlloc,
}

impl FailingAlloc {
    /// An allocator that succeeds `succeed_count` times, then refuses.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            budget: Rc::new(Cell::new(succeed_count)),
            inner: CountingAlloc::new(),
        }
    }

    /// Successful allocations not yet returned.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding()
    }

    /// Grant `n` more successful allocations.
    pub fn refill(&self, n: usize) {
        self.budget.set(self.budget.get() + n);
    }
}

impl RawAlloc for FailingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let left = self.budget.get();
        if left == 0 {
            return Err(AllocError::Refused {
                size: layout.size(),
            });
        }
        self.budget.set(left - 1);
        self.inner.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { self.inner.deallocate(ptr, layout) }
    }

    fn same_source(&self, other: &Self) -> bool {
        self.inner.same_source(&other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_balances() {
        let alloc = CountingAlloc::new();
        let p = alloc.allocate_one::<u64>().unwrap();
        assert_eq!(alloc.outstanding(), 1);
        assert_eq!(alloc.bytes_live(), 8);
        unsafe { alloc.deallocate_one(p) };
        assert_eq!(alloc.outstanding(), 0);
        assert!(alloc.same_source(&alloc.clone()));
        assert!(!alloc.same_source(&CountingAlloc::new()));
    }

    #[test]
    fn failing_refuses_after_budget() {
        let alloc = FailingAlloc::new(1);
        let p = alloc.allocate_one::<u32>().unwrap();
        assert!(matches!(
            alloc.allocate_one::<u32>(),
            Err(AllocError::Refused { size: 4 })
        ));
        unsafe { alloc.deallocate_one(p) };
        assert_eq!(alloc.outstanding(), 0);
    }
}
