//! Insert.
//!
//! Only the predecessor is locked. The new node is fully built before the
//! single link store that publishes it, which is the linearization point, so
//! it never needs a lock of its own.
//!
//! An insertion point found while a key swap was in flight is discarded even
//! if it validates: the descent may have taken the wrong side of the swapped
//! key on its way down.

use seize::LocalGuard;

use crate::key::{KeyError, check_key};
use crate::node::{NodeGuard, Side};
use crate::reclaim::alloc_node;
use crate::retry::{Attempt, retry_loop};
use crate::tracing_helpers::trace_log;

use super::ConcurrentBst;
use super::locate::{Located, validate};

impl ConcurrentBst {
    /// Insert `key`.
    ///
    /// # Returns
    ///
    /// `true` if the key was added, `false` if it was already present.
    ///
    /// # Panics
    ///
    /// Panics if `key` is [`SENTINEL_KEY`](crate::key::SENTINEL_KEY). Use
    /// [`try_insert`](Self::try_insert) to get an error instead.
    #[inline]
    pub fn insert(&self, key: i32) -> bool {
        let guard = self.guard();
        self.insert_with_guard(key, &guard)
    }

    /// Insert `key`, rejecting the reserved sentinel key with an error.
    ///
    /// # Errors
    ///
    /// [`KeyError::Reserved`] if `key` is the sentinel key.
    #[inline]
    pub fn try_insert(&self, key: i32) -> Result<bool, KeyError> {
        let key: i32 = check_key(key)?;
        let guard = self.guard();
        Ok(self.insert_checked(key, &guard))
    }

    /// Insert `key` using an explicit guard.
    ///
    /// # Panics
    ///
    /// Panics if `key` is the sentinel key.
    #[inline]
    pub fn insert_with_guard(&self, key: i32, guard: &LocalGuard<'_>) -> bool {
        if let Err(err) = check_key(key) {
            panic!("{err}");
        }
        self.insert_checked(key, guard)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip(self, guard))
    )]
    fn insert_checked(&self, key: i32, guard: &LocalGuard<'_>) -> bool {
        retry_loop(self.config.backoff, &self.counters.insert, || {
            self.insert_attempt(key, guard)
        })
    }

    fn insert_attempt(&self, key: i32, guard: &LocalGuard<'_>) -> Attempt<bool> {
        let located: Located<'_> = self.find(key, guard);
        let Located { target, pred, .. } = located;

        let mut pred_guard: NodeGuard<'_> = pred.lock();
        if !validate(&pred_guard, target, key) {
            return Attempt::Retry;
        }

        if target.is_some() {
            return Attempt::Done(false);
        }

        // The null link is current, but the path to it may mix keys from
        // before a swap with links from after it.
        if self.rekeyed_since(&located) {
            return Attempt::Retry;
        }

        let side: Side = Side::of(key, pred_guard.key());
        pred_guard.set_child(side, alloc_node(key));
        trace_log!(key, parent = pred_guard.key(), ?side, "insert: linked");

        Attempt::Done(true)
    }
}
