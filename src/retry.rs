//! The validate-or-restart loop shared by the mutators.
//!
//! Each attempt runs Locator → lock → Validator and reports either a final
//! answer or a validation failure. [`retry_loop`] keeps calling it until it
//! gets an answer; there is no retry limit and no error path.

use std::hint;
use std::sync::atomic::AtomicU64;
use std::thread;

use crate::config::Backoff;
use crate::ordering::RELAXED;

/// Outcome of one optimistic attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Attempt<T> {
    /// The operation committed (or found a definite answer).
    Done(T),
    /// Validation failed; all locks of this attempt are already released.
    Retry,
}

/// Per-call backoff state driven by a [`Backoff`] policy.
#[derive(Debug)]
struct BackoffState {
    policy: Backoff,
    step: u32,
}

impl BackoffState {
    const fn new(policy: Backoff) -> Self {
        Self { policy, step: 0 }
    }

    fn wait(&mut self) {
        match self.policy {
            Backoff::None => {}

            Backoff::Spin { max_shift } => {
                Self::spin(self.step.min(max_shift));
            }

            Backoff::SpinThenYield { max_shift } => {
                if self.step < max_shift {
                    Self::spin(self.step);
                } else {
                    thread::yield_now();
                }
            }
        }

        self.step = self.step.saturating_add(1);
    }

    fn spin(shift: u32) {
        for _ in 0..(1_u32 << shift) {
            hint::spin_loop();
        }
    }
}

/// Run `attempt` until it returns [`Attempt::Done`].
///
/// Every [`Attempt::Retry`] bumps `retries` and waits according to `policy`.
#[inline]
pub fn retry_loop<T, F>(policy: Backoff, retries: &AtomicU64, mut attempt: F) -> T
where
    F: FnMut() -> Attempt<T>,
{
    let mut backoff = BackoffState::new(policy);

    loop {
        match attempt() {
            Attempt::Done(value) => return value,
            Attempt::Retry => {
                retries.fetch_add(1, RELAXED);
                backoff.wait();
            }
        }
    }
}
