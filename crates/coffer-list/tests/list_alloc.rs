//! List behaviour under instrumented allocators and panicking clones.

use std::panic::{catch_unwind, AssertUnwindSafe};

use coffer_arena::{Arena, ArenaAlloc, ArenaConfig};
use coffer_core::RawAlloc;
use coffer_list::List;
use coffer_test_utils::{CloneBomb, CountingAlloc, DropCounter, FailingAlloc, Fuse};

#[test]
fn clone_rolls_back_on_panicking_clone() {
    let alloc = CountingAlloc::new();
    let counter = DropCounter::new();
    let fuse = Fuse::new(6);
    let mut source = List::new_in(alloc.clone());
    for i in 0..10 {
        source.push_back(CloneBomb::new(i, &counter, &fuse));
    }
    let before = alloc.outstanding();

    let outcome = catch_unwind(AssertUnwindSafe(|| source.clone()));

    assert!(outcome.is_err());
    assert_eq!(counter.live(), 10, "partial copies destroyed");
    assert_eq!(alloc.outstanding(), before, "partial copy's nodes released");
}

#[test]
fn clone_from_failure_leaves_destination_untouched() {
    let counter = DropCounter::new();
    let fuse = Fuse::new(2);
    let source: List<_> = (0..5).map(|i| CloneBomb::new(i, &counter, &fuse)).collect();
    let mut destination: List<_> = (10..12)
        .map(|i| CloneBomb::new(i, &counter, &Fuse::new(0)))
        .collect();

    let outcome = catch_unwind(AssertUnwindSafe(|| destination.clone_from(&source)));

    assert!(outcome.is_err());
    let ids: Vec<_> = destination.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert_eq!(counter.live(), 7);
}

#[test]
fn arena_backed_list_round_trip() {
    let arena = Arena::new(ArenaConfig::new(8 * 1024)).unwrap();
    let alloc = ArenaAlloc::<String>::new(&arena);
    let mut list = List::new_in(alloc);
    for word in ["stack", "backed", "list"] {
        list.push_back(word.to_string());
    }
    let copy = list.clone();
    assert!(copy.allocator().same_source(list.allocator()));
    assert_eq!(copy, list);
    assert_eq!(list.pop_back().as_deref(), Some("list"));
}

#[test]
fn lifo_pops_rewind_the_arena() {
    let arena = Arena::new(ArenaConfig::new(1024)).unwrap();
    let mut list = List::new_in(ArenaAlloc::<u32>::new(&arena));
    let empty = arena.used();
    list.push_back(1);
    list.push_back(2);
    list.pop_back();
    list.pop_back();
    assert_eq!(arena.used(), empty, "popping the newest nodes rewinds the cursor");
}

#[test]
fn lists_sharing_an_arena_never_overlap() {
    let arena = Arena::new(ArenaConfig::new(4096)).unwrap();
    let mut a = List::new_in(ArenaAlloc::<u64>::new(&arena));
    a.push_back(1);
    let mut b = List::new_in(ArenaAlloc::<u64>::new(&arena));
    b.push_back(2);

    // `a`'s node is buried under `b`'s allocations, so freeing it must not
    // rewind the cursor into storage `b` still owns.
    a.pop_back();
    let used = arena.used();
    a.push_back(3);
    assert!(arena.used() > used);
    b.push_back(4);

    assert_eq!(a.iter().copied().collect::<Vec<_>>(), vec![3]);
    assert_eq!(b.iter().copied().collect::<Vec<_>>(), vec![2, 4]);
    drop(a);
    assert_eq!(b.front(), Some(&2));
}

#[test]
fn clone_has_independent_storage() {
    let mut list: List<String> = (0..5).map(|i| i.to_string()).collect();
    let mut copy = list.clone();
    for (a, b) in list.iter().zip(copy.iter()) {
        assert!(!std::ptr::eq(a, b));
    }

    *copy.front_mut().unwrap() = String::from("zero");
    copy.push_back(String::from("5"));

    let original: Vec<_> = list.iter().map(String::as_str).collect();
    assert_eq!(original, ["0", "1", "2", "3", "4"]);
    assert_eq!(copy.len(), 6);

    list.clear();
    assert_eq!(copy.front().map(String::as_str), Some("zero"));
    assert_eq!(copy.back().map(String::as_str), Some("5"));
}

#[test]
fn failing_allocator_reports_and_recovers() {
    let alloc = FailingAlloc::new(3);
    let mut list = List::new_in(alloc.clone());
    assert!(list.try_push_back(1).is_ok());
    assert!(list.try_push_back(2).is_ok());
    assert!(list.try_push_back(3).is_err());
    alloc.refill(1);
    assert!(list.try_push_front(0).is_ok());
    assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
}
