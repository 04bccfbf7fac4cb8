//! Tree-wide version for key swaps.
//!
//! A two-child remove rewrites a key in place and unlinks a node further
//! down. A lock-free descent that reads the old key above and the new link
//! below sees a tree that never existed, and may report a present key as
//! absent or pick an insertion point on the wrong side of the new key.
//!
//! Swaps bracket their writes with [`RekeyVersion::begin`] and
//! [`RekeyVersion::end`]. A descent takes [`RekeyVersion::stable`] before it
//! starts and trusts a negative answer only if
//! [`RekeyVersion::has_changed`] is false afterwards. Positive answers come
//! from validated nodes and never need this check.
//!
//! Swaps in disjoint subtrees share the version, so a reader may retry
//! because of a swap it never touched. The bracketed window holds no lock
//! waits, so it is short.

use std::hint;
use std::sync::atomic::AtomicU64;

use crate::ordering::MARK_ORD;

/// Started/finished swap counters. Equal counters mean no swap in flight.
#[derive(Debug, Default)]
pub struct RekeyVersion {
    started: AtomicU64,
    finished: AtomicU64,
}

impl RekeyVersion {
    /// Wait until no swap is in flight and return the version.
    #[inline]
    pub fn stable(&self) -> u64 {
        loop {
            let started: u64 = self.started.load(MARK_ORD);
            if self.finished.load(MARK_ORD) == started {
                return started;
            }
            hint::spin_loop();
        }
    }

    /// Whether a swap started since `old` was taken.
    #[inline]
    #[must_use]
    pub fn has_changed(&self, old: u64) -> bool {
        self.started.load(MARK_ORD) != old
    }

    /// Open a swap window. Call with every lock of the swap already held.
    #[inline]
    pub fn begin(&self) {
        self.started.fetch_add(1, MARK_ORD);
    }

    /// Close the window opened by [`begin`](Self::begin).
    #[inline]
    pub fn end(&self) {
        self.finished.fetch_add(1, MARK_ORD);
    }
}
