//! Node allocation and `seize`-based reclamation.
//!
//! This module provides:
//! - Allocation of boxed nodes with stable addresses
//! - A single-node reclaimer for `guard.defer_retire()`
//! - Subtree traversal for tree teardown

use seize::{Collector, Guard, LocalGuard};

use crate::node::{Node, Side};

/// Allocate a detached node and return a stable raw pointer.
///
/// The pointer stays valid until it is retired with [`retire_node`] (and the
/// collector decides no reader can hold it), or freed by [`reclaim_subtree`].
#[inline]
#[must_use]
pub fn alloc_node(key: i32) -> *mut Node {
    Box::into_raw(Box::new(Node::new(key)))
}

/// Reclaim a boxed node (seize callback).
///
/// # Safety
///
/// - `ptr` must point to a valid `Node` allocated via [`alloc_node`].
/// - Must only be called after seize determines it's safe (no readers).
pub unsafe fn reclaim_node_boxed(ptr: *mut Node, _collector: &Collector) {
    // SAFETY: Caller guarantees ptr is valid and from Box::into_raw.
    // Seize ensures no readers remain.
    unsafe { drop(Box::from_raw(ptr)) };
}

/// Retire a node that has been unlinked from the tree.
///
/// The node is freed once every guard that was active at the time of the call
/// (including `guard` itself) has been dropped, so references the caller
/// still holds stay valid until then.
///
/// # Safety
///
/// - `ptr` must come from [`alloc_node`] and be retired at most once.
/// - `ptr` must be unreachable from the tree by any new traversal.
#[inline]
pub unsafe fn retire_node(ptr: *mut Node, guard: &LocalGuard<'_>) {
    // SAFETY: Caller ensures ptr is valid, unlinked, and retired once.
    unsafe { guard.defer_retire(ptr, reclaim_node_boxed) };
}

/// Free every node reachable from `root`.
///
/// Iterative DFS: a degenerate tree is a linked list, so recursion depth would
/// be unbounded.
///
/// # Safety
///
/// - Every reachable node must come from [`alloc_node`] and not be retired.
/// - No other thread may access the subtree, now or later.
pub unsafe fn reclaim_subtree(root: *mut Node) {
    let mut stack: Vec<*mut Node> = Vec::with_capacity(64);
    stack.push(root);

    while let Some(ptr) = stack.pop() {
        if ptr.is_null() {
            continue;
        }

        // SAFETY: Caller guarantees exclusive access to a tree of valid nodes.
        let node: &Node = unsafe { &*ptr };

        // Collect children BEFORE dropping the node.
        stack.push(node.child_ptr_unguarded(Side::Left));
        stack.push(node.child_ptr_unguarded(Side::Right));

        // SAFETY: ptr is a valid node from Box::into_raw, visited exactly once
        // because the structure is a tree.
        unsafe { drop(Box::from_raw(ptr)) };
    }
}
