//! # `optimistic-bst`
//!
//! A concurrent, unbalanced binary search tree over `i32` keys.
//!
//! Lookups descend the tree without taking any lock. Mutators descend the
//! same way, then lock only the nodes they are about to change and re-check
//! under those locks that what they saw is still true. If the check fails
//! they start over.
//!
//! ## Status
//!
//! | Feature | Status |
//! |---------|--------|
//! | Concurrent `contains` | Works (no node locks; waits out key swaps) |
//! | Concurrent `insert` | Works (locks the parent only) |
//! | Concurrent `remove` | Works (0/1-child splice, 2-child successor swap) |
//! | Memory reclamation | Works (`seize`, unlinked nodes retired) |
//! | `size` / `key_sum` / `keys` | Quiescent only |
//! | Balancing | Not implemented (sorted input degrades to a list) |
//! | Range queries | Not implemented |
//!
//! ## Thread Safety
//!
//! [`ConcurrentBst`] is `Send + Sync` and every operation takes `&self`.
//! Share it with `Arc`; to amortize guard setup across many calls, use the
//! guard-based API:
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//!
//! use optimistic_bst::ConcurrentBst;
//!
//! let tree = Arc::new(ConcurrentBst::new());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let tree = Arc::clone(&tree);
//!         thread::spawn(move || {
//!             let guard = tree.guard();
//!             for key in (t * 100)..(t * 100 + 100) {
//!                 tree.insert_with_guard(key, &guard);
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(tree.size(), 400);
//! assert!(tree.contains(399));
//! ```
//!
//! ## Key Constraints
//!
//! - [`SENTINEL_KEY`] (`i32::MAX`) is reserved. `insert` panics on it,
//!   [`ConcurrentBst::try_insert`] returns [`KeyError::Reserved`].
//! - `size`, `key_sum`, `keys`, `height`, `stats` and `check_invariants`
//!   assume no mutator is running. They stay memory safe under concurrency
//!   but their answers are then only approximate.
//!
//! ## Design
//!
//! ```text
//!   sentinel (i32::MAX)
//!      /
//!    root
//!   /    \
//!  ...   ...
//! ```
//!
//! Every traversal starts at a permanent sentinel whose left link is the
//! root, so every real node has a parent to lock. Each node carries a lock
//! and a logical-deletion mark. A node with two children is removed by
//! copying its in-order successor's key into it and unlinking the successor.

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod key;
pub mod nodelock;
pub mod ordering;
pub mod tree;

mod node;
mod reclaim;
mod retry;
mod tracing_helpers;

// Re-export main types for convenience
pub use config::{Backoff, TreeConfig};
pub use key::{KeyError, SENTINEL_KEY};
pub use tree::{ConcurrentBst, InvariantViolation, RetryStats, TreeStats};
