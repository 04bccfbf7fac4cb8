//! Whole-tree folds, invariant checks and retry counters.
//!
//! Every fold here walks the tree without locks. Results are exact only when
//! no mutator is running; under concurrency they are a best-effort snapshot
//! and may miss or double-count keys that move during the walk.
//!
//! All walks are iterative. A tree fed sorted keys degenerates into a list,
//! so recursion depth would be unbounded.

use std::sync::atomic::AtomicU64;

use seize::LocalGuard;
use thiserror::Error;

use crate::key::SENTINEL_KEY;
use crate::node::{Node, Side};
use crate::ordering::RELAXED;

use super::ConcurrentBst;

// ============================================================================
//  Types
// ============================================================================

/// A structural invariant that does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A reachable key lies outside the range its position allows.
    ///
    /// `lower` is exclusive, `upper` is exclusive; `None` means unbounded.
    #[error("key {key} is out of order (expected within ({lower:?}, {upper:?}))")]
    OrderViolation {
        /// The misplaced key.
        key: i32,
        /// Exclusive lower bound from the ancestors, if any.
        lower: Option<i32>,
        /// Exclusive upper bound from the ancestors, if any.
        upper: Option<i32>,
    },

    /// A logically deleted node is still linked into the tree.
    #[error("marked node with key {key} is still reachable")]
    MarkedReachable {
        /// Key of the marked node.
        key: i32,
    },

    /// The sentinel lost its key, was marked, or grew a right child.
    #[error("sentinel node is corrupted")]
    SentinelCorrupted,
}

/// Snapshot of the tree's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    /// Number of unmarked reachable keys.
    pub size: usize,
    /// Nodes on the longest root-to-leaf path; 0 for an empty tree.
    pub height: usize,
    /// Sum of all unmarked reachable keys.
    pub key_sum: i64,
}

/// How many times each protocol step had to start over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryStats {
    /// Insert attempts that failed validation.
    pub insert_retries: u64,
    /// Remove attempts that failed validation (including successor failures).
    pub remove_retries: u64,
    /// Two-child removes whose successor chain changed under them.
    pub successor_retries: u64,
}

#[derive(Debug, Default)]
pub struct RetryCounters {
    pub insert: AtomicU64,
    pub remove: AtomicU64,
    pub successor: AtomicU64,
}

impl RetryCounters {
    fn snapshot(&self) -> RetryStats {
        RetryStats {
            insert_retries: self.insert.load(RELAXED),
            remove_retries: self.remove.load(RELAXED),
            successor_retries: self.successor.load(RELAXED),
        }
    }

    fn reset(&self) {
        self.insert.store(0, RELAXED);
        self.remove.store(0, RELAXED);
        self.successor.store(0, RELAXED);
    }
}

// ============================================================================
//  Folds
// ============================================================================

impl ConcurrentBst {
    fn root<'g>(&self, guard: &'g LocalGuard<'_>) -> Option<&'g Node> {
        self.sentinel().child(Side::Left, guard)
    }

    /// Visit every reachable node (marked or not) in pre-order.
    fn for_each_node<F>(&self, guard: &LocalGuard<'_>, mut visit: F)
    where
        F: FnMut(&Node),
    {
        let mut stack: Vec<&Node> = Vec::with_capacity(64);
        stack.extend(self.root(guard));

        while let Some(node) = stack.pop() {
            visit(node);
            stack.extend(node.child(Side::Right, guard));
            stack.extend(node.child(Side::Left, guard));
        }
    }

    /// Number of keys in the tree.
    ///
    /// Exact only while no other thread is mutating the tree.
    #[must_use]
    pub fn size(&self) -> usize {
        let guard = self.guard();
        let mut count: usize = 0;
        self.for_each_node(&guard, |node| {
            if !node.is_marked() {
                count += 1;
            }
        });
        count
    }

    /// Sum of all keys in the tree, widened so it cannot overflow.
    ///
    /// Exact only while no other thread is mutating the tree.
    #[must_use]
    pub fn key_sum(&self) -> i64 {
        let guard = self.guard();
        let mut sum: i64 = 0;
        self.for_each_node(&guard, |node| {
            if !node.is_marked() {
                sum += i64::from(node.key());
            }
        });
        sum
    }

    /// Whether the tree holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let guard = self.guard();
        let mut empty: bool = true;
        self.for_each_node(&guard, |node| {
            empty &= node.is_marked();
        });
        empty
    }

    /// All keys in ascending order.
    #[must_use]
    pub fn keys(&self) -> Vec<i32> {
        let guard = self.guard();
        let mut out: Vec<i32> = Vec::new();
        let mut stack: Vec<&Node> = Vec::with_capacity(64);
        let mut curr: Option<&Node> = self.root(&guard);

        loop {
            while let Some(node) = curr {
                stack.push(node);
                curr = node.child(Side::Left, &guard);
            }

            let Some(node) = stack.pop() else {
                break;
            };
            if !node.is_marked() {
                out.push(node.key());
            }
            curr = node.child(Side::Right, &guard);
        }

        out
    }

    /// Number of nodes on the longest root-to-leaf path.
    #[must_use]
    pub fn height(&self) -> usize {
        let guard = self.guard();
        let mut stack: Vec<(&Node, usize)> = Vec::with_capacity(64);
        let mut max_depth: usize = 0;

        if let Some(root) = self.root(&guard) {
            stack.push((root, 1));
        }

        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for side in [Side::Left, Side::Right] {
                if let Some(child) = node.child(side, &guard) {
                    stack.push((child, depth + 1));
                }
            }
        }

        max_depth
    }

    /// Size, height and key sum in one call.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            size: self.size(),
            height: self.height(),
            key_sum: self.key_sum(),
        }
    }

    /// Verify the structural invariants of a quiescent tree.
    ///
    /// Checks that the sentinel is intact, that every reachable key sits
    /// strictly between the bounds its ancestors impose, and that no
    /// reachable node is marked.
    ///
    /// # Errors
    ///
    /// The first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let sentinel: &Node = self.sentinel();
        if sentinel.key() != SENTINEL_KEY
            || sentinel.is_marked()
            || !sentinel.child_ptr_unguarded(Side::Right).is_null()
        {
            return Err(InvariantViolation::SentinelCorrupted);
        }

        let guard = self.guard();
        let mut stack: Vec<(&Node, Option<i32>, Option<i32>)> = Vec::with_capacity(64);
        if let Some(root) = self.root(&guard) {
            stack.push((root, None, None));
        }

        while let Some((node, lower, upper)) = stack.pop() {
            let key: i32 = node.key();

            if node.is_marked() {
                return Err(InvariantViolation::MarkedReachable { key });
            }

            let above_lower: bool = lower.is_none_or(|low| key > low);
            let below_upper: bool = upper.is_none_or(|high| key < high);
            if !above_lower || !below_upper || key == SENTINEL_KEY {
                return Err(InvariantViolation::OrderViolation { key, lower, upper });
            }

            if let Some(left) = node.child(Side::Left, &guard) {
                stack.push((left, lower, Some(key)));
            }
            if let Some(right) = node.child(Side::Right, &guard) {
                stack.push((right, Some(key), upper));
            }
        }

        Ok(())
    }

    /// Cumulative retry counts since construction or the last reset.
    #[must_use]
    pub fn retry_stats(&self) -> RetryStats {
        self.counters.snapshot()
    }

    /// Zero the retry counters.
    pub fn reset_retry_stats(&self) {
        self.counters.reset();
    }
}
