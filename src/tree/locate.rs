//! Locator and Validator.
//!
//! # Protocol
//!
//! ```text
//! 1. find(key): walk from the sentinel without locks -> (target, pred)
//! 2. lock pred (and target, for remove)
//! 3. validate(pred, target, key) under the lock(s)
//! 4. false -> release everything, go to 1
//! ```
//!
//! The Locator's answer is only a hint: nodes may be unlinked, marked or
//! re-keyed while it runs. The Validator is what mutators trust. A missing
//! target is additionally checked against the rekey version (see the
//! `rekey` module).

use std::ptr as StdPtr;

use seize::LocalGuard;

use crate::node::{Node, NodeGuard, Side};
use crate::tracing_helpers::trace_log;

use super::ConcurrentBst;

/// Result of a lock-free descent.
#[derive(Debug, Clone, Copy)]
pub struct Located<'g> {
    /// Node whose key matched, if the descent found one.
    pub target: Option<&'g Node>,
    /// Last node visited before `target` (or before the null link).
    pub pred: &'g Node,
    /// Rekey version taken before the descent.
    pub version: u64,
}

impl ConcurrentBst {
    /// Lock-free optimistic descent from the sentinel.
    ///
    /// Stops at the first node whose key equals `key`, or at a null link.
    /// Marked nodes are walked through like any other.
    #[inline]
    pub(crate) fn find<'g>(&'g self, key: i32, guard: &'g LocalGuard<'_>) -> Located<'g> {
        let version: u64 = self.rekey.stable();
        let mut pred: &'g Node = self.sentinel();
        let mut curr: Option<&'g Node> = pred.child(Side::Left, guard);

        while let Some(node) = curr {
            let node_key: i32 = node.key();
            if node_key == key {
                return Located {
                    target: Some(node),
                    pred,
                    version,
                };
            }

            pred = node;
            curr = node.child(Side::of(key, node_key), guard);
        }

        Located {
            target: None,
            pred,
            version,
        }
    }

    /// Whether a key swap may have overlapped the descent that produced
    /// `located`. Negative Locator answers are only trusted when this is
    /// false.
    #[inline]
    pub(crate) fn rekeyed_since(&self, located: &Located<'_>) -> bool {
        self.rekey.has_changed(located.version)
    }
}

/// Re-check an observed `(pred, target)` link with `pred` locked.
///
/// For removals `target` must be locked too; inserts only lock `pred`.
///
/// Passes when:
/// - `pred` is not marked,
/// - `target`, if any, is not marked and still carries `key`,
/// - `pred`'s link on `key`'s side still points at `target` (or is null).
///
/// The key check matters because a two-child remove re-keys its target in
/// place; a node found under one key may since have taken over another.
#[inline]
pub fn validate(pred: &NodeGuard<'_>, target: Option<&Node>, key: i32) -> bool {
    if pred.is_marked() {
        trace_log!(key, "validate: predecessor marked");
        return false;
    }

    if let Some(node) = target {
        if node.is_marked() {
            trace_log!(key, "validate: target marked");
            return false;
        }
        if node.key() != key {
            trace_log!(key, now = node.key(), "validate: target re-keyed");
            return false;
        }
    }

    let expected: *mut Node = target.map_or(StdPtr::null_mut(), |node| {
        StdPtr::from_ref(node).cast_mut()
    });
    let side: Side = Side::of(key, pred.key());

    if pred.child_ptr(side) != expected {
        trace_log!(key, ?side, "validate: link changed");
        return false;
    }

    true
}
