//! `ConcurrentBst` - a concurrent unbalanced binary search tree.
//!
//! This module holds the tree type, construction and teardown. The operations
//! live in submodules:
//!
//! | Module | Contents |
//! |--------|----------|
//! | `locate` | Locator (`find`) and Validator |
//! | `insert` | `insert`, `try_insert` |
//! | `remove` | `remove` (0/1-child and 2-child protocols) |
//! | `contains` | `contains` without node locks |
//! | `rekey` | version that flags in-flight key swaps to readers |
//! | `diagnostics` | quiescent folds, invariant checks, retry counters |

use std::fmt as StdFmt;

use seize::{Collector, LocalGuard};

use crate::config::TreeConfig;
use crate::key::SENTINEL_KEY;
use crate::node::{Node, Side};
use crate::reclaim::reclaim_subtree;

mod contains;
mod diagnostics;
mod insert;
mod locate;
mod rekey;
mod remove;


pub use diagnostics::{InvariantViolation, RetryStats, TreeStats};

use diagnostics::RetryCounters;
use rekey::RekeyVersion;

/// A concurrent binary search tree over `i32` keys.
///
/// All operations take `&self`; share the tree between threads with `Arc`.
/// Mutators lock at most the nodes on the path they modify, readers take no
/// locks at all.
///
/// # Example
///
/// ```rust
/// use optimistic_bst::ConcurrentBst;
///
/// let tree = ConcurrentBst::new();
///
/// assert!(tree.insert(5));
/// assert!(!tree.insert(5)); // duplicate
/// assert!(tree.contains(5));
///
/// assert!(tree.remove(5));
/// assert!(!tree.contains(5));
/// assert_eq!(tree.size(), 0);
/// ```
pub struct ConcurrentBst {
    /// Memory reclamation collector for unlinked nodes.
    ///
    /// Declared first so it drops (and frees retired nodes) right after the
    /// reachable nodes have been torn down in `Drop`.
    collector: Collector,

    /// Never removed, never marked. Its left link is the root.
    ///
    /// Boxed so its address is stable across moves of the tree value.
    sentinel: Box<Node>,

    /// Bumped around every two-child key swap.
    rekey: RekeyVersion,

    config: TreeConfig,

    counters: RetryCounters,
}

impl StdFmt::Debug for ConcurrentBst {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        let guard = self.guard();
        f.debug_struct("ConcurrentBst")
            .field("root", &self.sentinel.child_ptr(Side::Left, &guard))
            .field("config", &self.config)
            .field("retries", &self.retry_stats())
            .finish_non_exhaustive()
    }
}

impl ConcurrentBst {
    /// Create an empty tree with the default [`TreeConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty tree with an explicit configuration.
    #[must_use]
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            collector: Collector::new(),
            sentinel: Box::new(Node::new(SENTINEL_KEY)),
            rekey: RekeyVersion::default(),
            config,
            counters: RetryCounters::default(),
        }
    }

    /// Enter a protected region and return a guard.
    ///
    /// The guard keeps every node loaded during its lifetime from being
    /// reclaimed. Pass it to the `*_with_guard` methods to amortize the
    /// cost of entering across many operations.
    #[must_use]
    #[inline]
    pub fn guard(&self) -> LocalGuard<'_> {
        self.collector.enter()
    }

    /// The configuration this tree was built with.
    #[must_use]
    #[inline]
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[inline]
    pub(crate) fn sentinel(&self) -> &Node {
        &self.sentinel
    }
}

impl Default for ConcurrentBst {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConcurrentBst {
    fn drop(&mut self) {
        // No concurrent access is possible here (Drop requires unique access).
        // Retired nodes are unreachable, so the two sets never overlap: the
        // reachable ones are freed here, the retired ones by the collector.
        let root: *mut Node = self.sentinel.child_ptr_unguarded(Side::Left);

        // SAFETY: every reachable node came from `alloc_node` and none of them
        // has been retired; `&mut self` rules out other accessors.
        unsafe { reclaim_subtree(root) };
    }
}
