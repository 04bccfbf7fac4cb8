//! Membership test without node locks.

use seize::LocalGuard;

use super::ConcurrentBst;
use super::locate::Located;

impl ConcurrentBst {
    /// Check whether `key` is present.
    ///
    /// Takes no node locks. The answer reflects some state of the tree
    /// between the call and its return.
    ///
    /// # Blocking
    ///
    /// While a two-child remove anywhere in the tree is swapping keys, this
    /// call spins until the swap finishes. A swap that overlaps the descent
    /// also makes it start over. A remover descheduled mid-swap therefore
    /// stalls every `contains`.
    #[must_use]
    #[inline]
    pub fn contains(&self, key: i32) -> bool {
        let guard = self.guard();
        self.contains_with_guard(key, &guard)
    }

    /// Check whether `key` is present using an explicit guard.
    #[must_use]
    #[inline]
    pub fn contains_with_guard(&self, key: i32, guard: &LocalGuard<'_>) -> bool {
        loop {
            let located: Located<'_> = self.find(key, guard);

            // The key is re-read: a two-child remove may have re-keyed the
            // node after the Locator matched it.
            let present: bool = located
                .target
                .is_some_and(|node| node.key() == key && !node.is_marked());

            if !self.rekeyed_since(&located) {
                return present;
            }
        }
    }
}
