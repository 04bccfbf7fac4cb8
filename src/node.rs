//! Tree node: key, child links and the per-node lock.
//!
//! Links are `AtomicPtr`s so the Locator and `contains` can follow them
//! without locks. Every link and key *write* goes through a [`NodeGuard`],
//! which can only be obtained by locking the node that owns the field.

use std::ptr as StdPtr;
use std::sync::atomic::{AtomicI32, AtomicPtr};

use seize::{Guard, LocalGuard};

use crate::nodelock::{LockGuard, NodeLock};
use crate::ordering::{READ_ORD, RELAXED, WRITE_ORD};

// ============================================================================
//  Side
// ============================================================================

/// Which child link of a node a key belongs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Keys strictly less than the node key.
    Left,
    /// Keys greater than or equal to the node key.
    Right,
}

impl Side {
    /// The side of a node with key `node_key` that `key` descends to.
    #[inline]
    #[must_use]
    pub const fn of(key: i32, node_key: i32) -> Self {
        if key < node_key { Self::Left } else { Self::Right }
    }
}

// ============================================================================
//  Node
// ============================================================================

/// A tree cell.
///
/// Allocated with `Box::into_raw` and shared by raw pointer; see
/// [`crate::reclaim`] for how unlinked nodes are freed.
#[derive(Debug)]
pub struct Node {
    /// Mutable only under `lock`: the two-child remove copies the successor
    /// key in here.
    key: AtomicI32,
    left: AtomicPtr<Self>,
    right: AtomicPtr<Self>,
    lock: NodeLock,
}

impl Node {
    /// Create a detached leaf.
    #[must_use]
    pub const fn new(key: i32) -> Self {
        Self {
            key: AtomicI32::new(key),
            left: AtomicPtr::new(StdPtr::null_mut()),
            right: AtomicPtr::new(StdPtr::null_mut()),
            lock: NodeLock::new(),
        }
    }

    /// Current key, read lock-free.
    #[inline]
    #[must_use]
    pub fn key(&self) -> i32 {
        self.key.load(READ_ORD)
    }

    /// Whether the node has been logically deleted.
    #[inline]
    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.lock.is_marked()
    }

    #[inline]
    const fn link(&self, side: Side) -> &AtomicPtr<Self> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Load a child link under the protection of `guard`.
    #[inline]
    pub fn child_ptr(&self, side: Side, guard: &LocalGuard<'_>) -> *mut Self {
        guard.protect(self.link(side), READ_ORD)
    }

    /// Load a child link and borrow the child for the guard's lifetime.
    #[inline]
    #[must_use]
    pub fn child<'g>(&self, side: Side, guard: &'g LocalGuard<'_>) -> Option<&'g Self> {
        let ptr: *mut Self = self.child_ptr(side, guard);

        // SAFETY: non-null links point to nodes allocated by `reclaim::alloc_node`.
        // A node is only freed after being retired, and retirement waits for
        // every guard that was active when the node could still be reached.
        unsafe { ptr.as_ref() }
    }

    /// Lock the node.
    #[inline]
    pub fn lock(&self) -> NodeGuard<'_> {
        NodeGuard {
            node: self,
            lock: self.lock.lock(),
        }
    }

    /// Plain load of a child link for quiescent or exclusive access
    /// (diagnostics, teardown).
    #[inline]
    pub(crate) fn child_ptr_unguarded(&self, side: Side) -> *mut Self {
        self.link(side).load(READ_ORD)
    }
}

// ============================================================================
//  NodeGuard
// ============================================================================

/// A locked node. All writes to a node's key and links go through here.
#[derive(Debug)]
#[must_use = "releasing a lock without using the guard is a logic error"]
pub struct NodeGuard<'a> {
    node: &'a Node,
    lock: LockGuard<'a>,
}

impl<'a> NodeGuard<'a> {
    /// The locked node.
    #[inline]
    pub const fn node(&self) -> &'a Node {
        self.node
    }

    /// Key of the locked node. Stable while the guard lives.
    #[inline]
    #[must_use]
    pub fn key(&self) -> i32 {
        self.node.key.load(RELAXED)
    }

    /// Child link of the locked node. Stable while the guard lives.
    #[inline]
    #[must_use]
    pub fn child_ptr(&self, side: Side) -> *mut Node {
        self.node.link(side).load(RELAXED)
    }

    /// Borrow a child of the locked node.
    #[inline]
    #[must_use]
    pub fn child<'g>(&self, side: Side, guard: &'g LocalGuard<'_>) -> Option<&'g Node> {
        self.node.child(side, guard)
    }

    /// Whether the locked node is logically deleted.
    #[inline]
    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.lock.is_marked()
    }

    /// Logically delete the locked node.
    #[inline]
    pub fn mark(&mut self) {
        self.lock.mark();
    }

    /// Publish `child` under `side`.
    #[inline]
    #[expect(
        clippy::needless_pass_by_ref_mut,
        reason = "`&mut` keeps link writes behind an exclusive guard borrow"
    )]
    pub fn set_child(&mut self, side: Side, child: *mut Node) {
        self.node.link(side).store(child, WRITE_ORD);
    }

    /// Overwrite the key (two-child remove only).
    #[inline]
    #[expect(
        clippy::needless_pass_by_ref_mut,
        reason = "`&mut` keeps key writes behind an exclusive guard borrow"
    )]
    pub fn set_key(&mut self, key: i32) {
        self.node.key.store(key, WRITE_ORD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seize::Collector;

    #[test]
    fn test_side_of() {
        assert_eq!(Side::of(1, 5), Side::Left);
        assert_eq!(Side::of(5, 5), Side::Right);
        assert_eq!(Side::of(9, 5), Side::Right);
        assert_eq!(Side::of(i32::MAX - 1, i32::MAX), Side::Left);
    }

    #[test]
    fn test_new_node_is_detached() {
        let node = Node::new(7);

        assert_eq!(node.key(), 7);
        assert!(!node.is_marked());
        assert!(node.child_ptr_unguarded(Side::Left).is_null());
        assert!(node.child_ptr_unguarded(Side::Right).is_null());
    }

    #[test]
    fn test_guard_writes_are_visible() {
        let collector = Collector::new();
        let guard = collector.enter();

        let parent = Node::new(10);
        let mut child = Node::new(4);

        {
            let mut locked = parent.lock();
            locked.set_child(Side::Left, StdPtr::from_mut(&mut child));
            locked.set_key(11);
            assert_eq!(locked.key(), 11);
            assert!(!locked.child_ptr(Side::Left).is_null());
        }

        assert_eq!(parent.key(), 11);
        let seen = parent.child(Side::Left, &guard).map(Node::key);
        assert_eq!(seen, Some(4));
        assert!(parent.child(Side::Right, &guard).is_none());

        // Unhook before `child` goes out of scope
        parent.lock().set_child(Side::Left, StdPtr::null_mut());
    }

    #[test]
    fn test_mark_through_guard() {
        let node = Node::new(3);

        {
            let mut locked = node.lock();
            locked.mark();
            assert!(locked.is_marked());
        }

        assert!(node.is_marked());
    }
}
