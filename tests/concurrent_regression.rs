//! Concurrent operation regression tests.
//!
//! These tests cover the concrete scenarios the tree must always get right,
//! plus an operation-log oracle: every thread records which of its
//! inserts/removes succeeded, and the final tree must match what those
//! successes imply.
//!
//! Run with: `cargo test --test concurrent_regression`
//! Run with release: `cargo test --test concurrent_regression --release`
//!
//! ## Tracing
//!
//! Enable tracing to debug race conditions:
//!
//! ```bash
//! # Debug events from the tree, shown for every test
//! RUST_LOG=optimistic_bst=debug cargo test --features tracing --test concurrent_regression -- --nocapture
//!
//! # Remove-path traces as flat JSON, one object per line
//! OPTBST_LOG=json RUST_LOG=optimistic_bst::tree::remove=trace \
//!     cargo test --features tracing --test concurrent_regression -- --nocapture
//! ```

#![allow(clippy::pedantic)]
#![expect(clippy::unwrap_used)]

mod common;

use optimistic_bst::ConcurrentBst;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

// =============================================================================
// Sequential Scenarios
// =============================================================================

#[test]
fn scenario_seven_keys_then_remove_root() {
    common::init_tracing();

    let tree = ConcurrentBst::new();
    for key in [5, 3, 8, 1, 4, 7, 9] {
        assert!(tree.insert(key));
    }
    assert_eq!(tree.size(), 7);
    assert_eq!(tree.key_sum(), 37);

    // 5 has two children
    assert!(tree.remove(5));
    assert!(!tree.contains(5));
    assert_eq!(tree.size(), 6);
    assert_eq!(tree.key_sum(), 32);
    assert_eq!(tree.keys(), vec![1, 3, 4, 7, 8, 9]);
    tree.check_invariants().unwrap();
}

#[test]
fn scenario_empty_and_duplicate() {
    common::init_tracing();

    let tree = ConcurrentBst::new();
    assert!(!tree.remove(42));

    assert!(tree.insert(10));
    assert!(!tree.insert(10));
    assert_eq!(tree.size(), 1);
}

#[test]
fn scenario_insert_contains_remove_contains() {
    let tree = ConcurrentBst::new();

    for key in [-7, 0, 7, i32::MIN, i32::MAX - 1] {
        assert!(tree.insert(key));
        assert!(tree.contains(key));
        assert!(tree.remove(key));
        assert!(!tree.contains(key));
        assert!(tree.insert(key));
        assert!(tree.contains(key));
    }
    assert_eq!(tree.size(), 5);
}

// =============================================================================
// Same-Key Races
// =============================================================================

#[test]
fn concurrent_insert_same_key_exactly_one_wins() {
    common::init_tracing();

    const NUM_THREADS: usize = 8;
    const ROUNDS: i32 = 200;

    let tree = Arc::new(ConcurrentBst::new());
    let barrier = Arc::new(Barrier::new(NUM_THREADS));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let tree = Arc::clone(&tree);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut wins = Vec::new();
                for key in 0..ROUNDS {
                    barrier.wait();
                    if tree.insert(key) {
                        wins.push(key);
                    }
                }
                wins
            })
        })
        .collect();

    let mut all_wins: Vec<i32> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    all_wins.sort_unstable();

    let expected: Vec<i32> = (0..ROUNDS).collect();
    assert_eq!(all_wins, expected, "every key must be won exactly once");
    assert_eq!(tree.size(), ROUNDS as usize);
}

#[test]
fn concurrent_remove_same_key_exactly_one_wins() {
    common::init_tracing();

    const NUM_THREADS: usize = 8;
    const ROUNDS: i32 = 200;

    let tree = Arc::new(ConcurrentBst::new());
    // Shuffle-free bushy shape: insert middle-out so removes hit every case
    for key in (0..ROUNDS).map(|i| (i * 73) % ROUNDS) {
        tree.insert(key);
    }
    let barrier = Arc::new(Barrier::new(NUM_THREADS));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let tree = Arc::clone(&tree);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut wins = 0usize;
                for key in 0..ROUNDS {
                    barrier.wait();
                    if tree.remove(key) {
                        wins += 1;
                    }
                }
                wins
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, ROUNDS as usize);
    assert!(tree.is_empty());
}

// =============================================================================
// Operation-Log Oracle
// =============================================================================

/// Per-thread log of successful mutations, as net presence change per key.
struct OpLog {
    net: Vec<i64>,
}

impl OpLog {
    fn new(range: usize) -> Self {
        Self {
            net: vec![0; range],
        }
    }
}

/// Run random insert/remove/contains from several threads and return the
/// summed per-key net change of all successful mutations.
fn run_logged(tree: &Arc<ConcurrentBst>, threads: usize, ops: usize, range: i32, seed: u64) -> Vec<i64> {
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let tree = Arc::clone(tree);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed + t as u64);
                let mut log = OpLog::new(range as usize);
                let guard = tree.guard();

                for _ in 0..ops {
                    let key = rng.gen_range(0..range);
                    match rng.gen_range(0..10) {
                        0..=3 => {
                            if tree.insert_with_guard(key, &guard) {
                                log.net[key as usize] += 1;
                            }
                        }
                        4..=7 => {
                            if tree.remove_with_guard(key, &guard) {
                                log.net[key as usize] -= 1;
                            }
                        }
                        _ => {
                            let _ = tree.contains_with_guard(key, &guard);
                        }
                    }
                }
                log
            })
        })
        .collect();

    let mut total = vec![0i64; range as usize];
    for h in handles {
        let log = h.join().unwrap();
        for (sum, delta) in total.iter_mut().zip(log.net) {
            *sum += delta;
        }
    }
    total
}

/// Check the tree against the net presence changes.
///
/// Starting from `initial`, each key's successful inserts and removes must
/// alternate, so its net change is -1, 0 or +1 and determines whether it is
/// present at the end.
fn assert_matches_log(tree: &ConcurrentBst, initial: &BTreeSet<i32>, net: &[i64]) {
    let mut expected: BTreeSet<i32> = BTreeSet::new();

    for (key, &delta) in net.iter().enumerate() {
        let key = key as i32;
        let before = i64::from(initial.contains(&key));
        let after = before + delta;
        assert!(
            after == 0 || after == 1,
            "key {key}: started {before}, net change {delta} is not linearizable"
        );
        if after == 1 {
            expected.insert(key);
        }
    }

    tree.check_invariants().unwrap();
    assert_eq!(tree.size(), expected.len());
    assert_eq!(tree.key_sum(), expected.iter().map(|&k| i64::from(k)).sum::<i64>());
    assert_eq!(tree.keys(), expected.into_iter().collect::<Vec<_>>());
}

#[test]
fn oracle_from_empty_tree() {
    common::init_tracing();

    let tree = Arc::new(ConcurrentBst::new());
    let net = run_logged(&tree, 8, 20_000, 500, 7);

    assert_matches_log(&tree, &BTreeSet::new(), &net);
}

#[test]
fn oracle_from_populated_tree() {
    common::init_tracing();

    const RANGE: i32 = 300;

    let tree = Arc::new(ConcurrentBst::new());
    let mut rng = StdRng::seed_from_u64(99);
    let mut initial = BTreeSet::new();
    for _ in 0..RANGE {
        let key = rng.gen_range(0..RANGE);
        if tree.insert(key) {
            initial.insert(key);
        }
    }

    let net = run_logged(&tree, 8, 20_000, RANGE, 1_234);

    assert_matches_log(&tree, &initial, &net);
}

#[test]
fn oracle_tiny_range_high_contention() {
    common::init_tracing();

    for seed in 0..10 {
        let tree = Arc::new(ConcurrentBst::new());
        let net = run_logged(&tree, 8, 5_000, 16, seed * 100);
        assert_matches_log(&tree, &BTreeSet::new(), &net);
    }
}

// =============================================================================
// Guard Lifetime
// =============================================================================

#[test]
fn long_lived_guard_survives_concurrent_removes() {
    common::init_tracing();

    let tree = Arc::new(ConcurrentBst::new());
    for key in 0..1_000 {
        tree.insert((key * 617) % 1_000);
    }

    let reader = {
        let tree = Arc::clone(&tree);
        thread::spawn(move || {
            // One guard across the whole run: nodes unlinked meanwhile must
            // stay readable until it drops.
            let guard = tree.guard();
            let mut seen = 0usize;
            for _ in 0..20 {
                for key in 0..1_000 {
                    if tree.contains_with_guard(key, &guard) {
                        seen += 1;
                    }
                }
            }
            seen
        })
    };

    let remover = {
        let tree = Arc::clone(&tree);
        thread::spawn(move || {
            for key in 0..1_000 {
                assert!(tree.remove(key));
            }
        })
    };

    remover.join().unwrap();
    let _seen = reader.join().unwrap();

    assert!(tree.is_empty());
}

// =============================================================================
// Logging
// =============================================================================

#[test]
fn tracing_init_is_idempotent() {
    common::init_tracing();
    common::init_tracing();

    tracing::info!(key = 16, node = 20, "structured fields reach the subscriber");

    let tree = ConcurrentBst::new();
    assert!(tree.insert(16));
    assert!(tree.remove(16));
}
