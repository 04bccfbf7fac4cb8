//! Per-node lock and logical-deletion flag.
//!
//! [`NodeLock`] pairs a blocking mutex with the node's `marked` flag. Writers
//! acquire a [`LockGuard`]; lock-free readers (the Locator and `contains`)
//! only ever look at [`NodeLock::is_marked`].
//!
//! # Concurrency Model
//! 1. Readers: call `is_marked()` at any time, no lock needed.
//! 2. Writers: call `lock()` to get a [`LockGuard`], modify the node, let the
//!    guard drop.
//!
//! # Type-State Pattern
//! Marking takes `&mut LockGuard` as proof that the lock is held, so a node
//! can only be logically deleted by the thread that owns its lock. The guard
//! unlocks on drop (panic-safe).
//!
//! ```rust,ignore
//! let mut guard = lock.lock();
//! guard.mark();
//! // Lock released when guard drops
//! ```

use std::marker::PhantomData;
use std::sync::atomic::AtomicBool;

use parking_lot::RawMutex;
use parking_lot::lock_api::RawMutex as RawMutexApi;

use crate::ordering::{MARK_ORD, MARK_READ_ORD};



// ============================================================================
//  NodeLock
// ============================================================================

/// A blocking lock plus the logical-deletion mark of one tree node.
///
/// The mark is monotonic: once set it is never cleared for the lifetime of
/// the node.
///
/// # Example
///
/// ```rust
/// use optimistic_bst::nodelock::NodeLock;
///
/// let lock = NodeLock::new();
/// assert!(!lock.is_locked());
/// assert!(!lock.is_marked());
///
/// {
///     let mut guard = lock.lock();
///     guard.mark();
/// }
///
/// assert!(lock.is_marked());
/// assert!(!lock.is_locked());
/// ```
pub struct NodeLock {
    raw: RawMutex,
    marked: AtomicBool,
}

impl std::fmt::Debug for NodeLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeLock")
            .field("locked", &self.is_locked())
            .field("marked", &self.is_marked())
            .finish()
    }
}

// ============================================================================
//  LockGuard (Type-State Pattern)
// ============================================================================

/// Proof that a node lock is held.
///
/// Cannot be constructed except by [`NodeLock::lock()`] or
/// [`NodeLock::try_lock()`]. The lock is released when the guard drops.
///
/// Guards are `!Send` and `!Sync` via `PhantomData<*mut ()>`: the underlying
/// mutex must be unlocked by the thread that locked it.
#[must_use = "releasing a lock without using the guard is a logic error"]
pub struct LockGuard<'a> {
    lock: &'a NodeLock,
    _marker: PhantomData<*mut ()>,
}

impl std::fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("marked", &self.lock.is_marked())
            .finish_non_exhaustive()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: a LockGuard exists only while this thread holds `raw`.
        unsafe { self.lock.raw.unlock() };
    }
}

impl LockGuard<'_> {
    /// Logically delete the node.
    ///
    /// Published with sequentially consistent ordering: this store is the
    /// linearization point of a successful remove.
    #[inline]
    pub fn mark(&mut self) {
        self.lock.marked.store(true, MARK_ORD);
    }

    /// Check the mark while holding the lock.
    #[inline]
    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.lock.is_marked()
    }
}

impl NodeLock {
    /// Create an unlocked, unmarked lock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            raw: RawMutex::INIT,
            marked: AtomicBool::new(false),
        }
    }

    /// Check if the node is logically deleted.
    #[inline]
    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.marked.load(MARK_READ_ORD)
    }

    /// Check if some thread currently holds the lock.
    ///
    /// Only meaningful as a diagnostic; the answer may be stale immediately.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Acquire the lock, blocking (parking) the thread until it is free.
    #[inline]
    pub fn lock(&self) -> LockGuard<'_> {
        self.raw.lock();

        LockGuard {
            lock: self,
            _marker: PhantomData,
        }
    }

    /// Try to acquire the lock without blocking.
    ///
    /// # Returns
    /// `Some(guard)` if the lock was free, `None` otherwise.
    #[inline]
    #[must_use]
    pub fn try_lock(&self) -> Option<LockGuard<'_>> {
        // `then`, not `then_some`: a guard built eagerly would unlock on drop.
        self.raw.try_lock().then(|| LockGuard {
            lock: self,
            _marker: PhantomData,
        })
    }
}

impl Default for NodeLock {
    fn default() -> Self {
        Self::new()
    }
}
