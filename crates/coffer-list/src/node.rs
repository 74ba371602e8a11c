//! Ring nodes and the raw link surgery shared by the list and the map.

use std::ptr::NonNull;

/// What a ring node carries.
pub(crate) enum Slot<T> {
    /// The list head. Never holds a value.
    Sentinel,
    Value(T),
}

pub(crate) struct Node<T> {
    pub(crate) prev: NodePtr<T>,
    pub(crate) next: NodePtr<T>,
    pub(crate) slot: Slot<T>,
}

pub(crate) type NodePtr<T> = NonNull<Node<T>>;

impl<T> Node<T> {
    /// # Safety
    ///
    /// `node` must be live and not the target of an outstanding `&mut`.
    pub(crate) unsafe fn next(node: NodePtr<T>) -> NodePtr<T> {
        // SAFETY: caller contract.
        unsafe { node.as_ref().next }
    }

    /// # Safety
    ///
    /// As for [`Node::next`].
    pub(crate) unsafe fn prev(node: NodePtr<T>) -> NodePtr<T> {
        // SAFETY: caller contract.
        unsafe { node.as_ref().prev }
    }

    /// The value in `node`, or `None` for the sentinel.
    ///
    /// # Safety
    ///
    /// `node` must be live for `'a` and not mutably aliased during it.
    pub(crate) unsafe fn value<'a>(node: NodePtr<T>) -> Option<&'a T> {
        // SAFETY: caller contract.
        match unsafe { &(*node.as_ptr()).slot } {
            Slot::Value(value) => Some(value),
            Slot::Sentinel => None,
        }
    }

    /// # Safety
    ///
    /// `node` must be live for `'a` and not otherwise aliased during it.
    pub(crate) unsafe fn value_mut<'a>(node: NodePtr<T>) -> Option<&'a mut T> {
        // SAFETY: caller contract.
        match unsafe { &mut (*node.as_ptr()).slot } {
            Slot::Value(value) => Some(value),
            Slot::Sentinel => None,
        }
    }

    /// Splice the detached `node` into the ring just before `pos`.
    ///
    /// # Safety
    ///
    /// `pos` must be in a live ring, `node` must be live and not in any ring.
    pub(crate) unsafe fn link_before(node: NodePtr<T>, pos: NodePtr<T>) {
        // SAFETY: all three nodes are live; no references into them are held.
        unsafe {
            let prev = (*pos.as_ptr()).prev;
            (*node.as_ptr()).prev = prev;
            (*node.as_ptr()).next = pos;
            (*prev.as_ptr()).next = node;
            (*pos.as_ptr()).prev = node;
        }
    }

    /// Detach `node` from its ring, closing the gap.
    ///
    /// # Safety
    ///
    /// `node` must be a value node in a live ring.
    pub(crate) unsafe fn unlink(node: NodePtr<T>) {
        // SAFETY: the neighbours are live members of the same ring.
        unsafe {
            let prev = (*node.as_ptr()).prev;
            let next = (*node.as_ptr()).next;
            (*prev.as_ptr()).next = next;
            (*next.as_ptr()).prev = prev;
        }
    }
}
