//! Standard memory orderings for concurrent node access.
//!
//! These constants keep ordering usage consistent across the Locator, the
//! Validator and the mutators, and make the intent clear at each access point.

use std::sync::atomic::Ordering;

/// Ordering for reading links, keys and marks during lock-free traversal.
/// Pairs with writer's Release stores.
pub const READ_ORD: Ordering = Ordering::Acquire;

/// Ordering for writing links and keys under a node lock.
/// Pairs with reader's Acquire loads.
pub const WRITE_ORD: Ordering = Ordering::Release;

/// Ordering for setting the logical-deletion mark.
///
/// The mark is a linearization point, so it must be ordered with every other
/// linearization point (child publication, key swap) across all threads.
pub const MARK_ORD: Ordering = Ordering::SeqCst;

/// Ordering for reading the logical-deletion mark.
pub const MARK_READ_ORD: Ordering = Ordering::SeqCst;

/// Ordering for relaxed counters and loads within a locked region.
/// Safe because the lock provides synchronization.
pub const RELAXED: Ordering = Ordering::Relaxed;
