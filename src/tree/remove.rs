//! Remove.
//!
//! # Protocol
//!
//! ```text
//! 1. find(key); no target -> false (unless a key swap overlapped: restart)
//! 2. lock pred, lock target, validate (else restart)
//! 3. target has <= 1 child:
//!      mark target                      <- linearization point
//!      pred.link[side(key)] = sole child
//! 4. target has 2 children:
//!      lock target.right, walk the left spine hand-over-hand
//!      (never releasing target) down to succ
//!      validate (succ_pred, succ)       (else restart)
//!      open rekey window
//!      mark succ                        <- linearization point
//!      target.key = succ.key
//!      unlink succ (target.right or succ_pred.left = succ.right)
//!      close rekey window
//! 5. release locks in reverse order, retire the unlinked node
//! ```
//!
//! Locks are always taken ancestor before descendant. Nodes never move above
//! their ancestors, so two removers can never wait on each other in a cycle.

use std::ptr as StdPtr;

use seize::LocalGuard;

use crate::node::{Node, NodeGuard, Side};
use crate::ordering::RELAXED;
use crate::reclaim::retire_node;
use crate::retry::{Attempt, retry_loop};
use crate::tracing_helpers::{debug_log, trace_log};

use super::ConcurrentBst;
use super::locate::{Located, validate};

impl ConcurrentBst {
    /// Remove `key`.
    ///
    /// # Returns
    ///
    /// `true` if the key was present and has been removed, `false` otherwise.
    #[inline]
    pub fn remove(&self, key: i32) -> bool {
        let guard = self.guard();
        self.remove_with_guard(key, &guard)
    }

    /// Remove `key` using an explicit guard.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip(self, guard))
    )]
    pub fn remove_with_guard(&self, key: i32, guard: &LocalGuard<'_>) -> bool {
        retry_loop(self.config.backoff, &self.counters.remove, || {
            self.remove_attempt(key, guard)
        })
    }

    fn remove_attempt(&self, key: i32, guard: &LocalGuard<'_>) -> Attempt<bool> {
        let located: Located<'_> = self.find(key, guard);
        let Located { target, pred, .. } = located;
        let Some(target) = target else {
            if self.rekeyed_since(&located) {
                return Attempt::Retry;
            }
            return Attempt::Done(false);
        };

        // Ancestor first. Guards drop in reverse declaration order.
        let mut pred_guard: NodeGuard<'_> = pred.lock();
        let mut target_guard: NodeGuard<'_> = target.lock();

        if !validate(&pred_guard, Some(target), key) {
            return Attempt::Retry;
        }

        let left: *mut Node = target_guard.child_ptr(Side::Left);
        let right: *mut Node = target_guard.child_ptr(Side::Right);

        if !left.is_null() && !right.is_null() {
            return self.remove_two_children(&mut target_guard, guard);
        }

        let child: *mut Node = if left.is_null() { right } else { left };
        let side: Side = Side::of(key, pred_guard.key());

        target_guard.mark();
        pred_guard.set_child(side, child);
        trace_log!(key, parent = pred_guard.key(), "remove: spliced");

        drop(target_guard);
        drop(pred_guard);

        // SAFETY: target came from alloc_node, is now unreachable, and only
        // the thread that marked it retires it.
        unsafe { retire_node(StdPtr::from_ref(target).cast_mut(), guard) };

        Attempt::Done(true)
    }

    /// Replace a two-child target's key with its in-order successor's and
    /// unlink the successor.
    ///
    /// `target_guard` is validated and stays locked throughout; the caller
    /// releases it (and the predecessor) afterwards.
    fn remove_two_children<'g>(
        &self,
        target_guard: &mut NodeGuard<'g>,
        guard: &'g LocalGuard<'_>,
    ) -> Attempt<bool> {
        let Some(first) = target_guard.child(Side::Right, guard) else {
            // Not reachable with target locked; restart rather than assume.
            return Attempt::Retry;
        };

        // `None` means the successor's parent is the target itself, whose
        // lock is owned by the caller and must never be released here.
        let mut succ_pred_guard: Option<NodeGuard<'g>> = None;
        let mut succ_guard: NodeGuard<'g> = first.lock();

        while let Some(next) = succ_guard.child(Side::Left, guard) {
            let next_guard: NodeGuard<'g> = next.lock();
            // Assigning drops the previous successor parent: child locked,
            // then ancestor released.
            succ_pred_guard = Some(std::mem::replace(&mut succ_guard, next_guard));
        }

        let succ: &'g Node = succ_guard.node();
        let succ_ptr: *mut Node = StdPtr::from_ref(succ).cast_mut();

        let still_linked: bool = succ_pred_guard.as_ref().map_or_else(
            || !target_guard.is_marked() && target_guard.child_ptr(Side::Right) == succ_ptr,
            |parent| !parent.is_marked() && parent.child_ptr(Side::Left) == succ_ptr,
        );

        if !still_linked || succ_guard.is_marked() {
            debug_log!(
                node = target_guard.key(),
                "remove: successor chain changed"
            );
            self.counters.successor.fetch_add(1, RELAXED);
            return Attempt::Retry;
        }

        self.rekey.begin();

        succ_guard.mark();
        let succ_key: i32 = succ_guard.key();
        target_guard.set_key(succ_key);

        let succ_right: *mut Node = succ_guard.child_ptr(Side::Right);
        match succ_pred_guard.as_mut() {
            None => target_guard.set_child(Side::Right, succ_right),
            Some(parent) => parent.set_child(Side::Left, succ_right),
        }

        self.rekey.end();
        trace_log!(succ_key, "remove: successor promoted");

        drop(succ_guard);
        drop(succ_pred_guard);

        // SAFETY: succ came from alloc_node, is now unreachable, and only the
        // thread that marked it retires it.
        unsafe { retire_node(succ_ptr, guard) };

        Attempt::Done(true)
    }
}
