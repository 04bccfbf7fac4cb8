//! Tree configuration.
//!
//! The only tunable is how a mutator waits after a failed validation before
//! it restarts from the Locator. Backoff never affects correctness: every
//! policy retries until the operation commits.

use std::env;

use crate::tracing_helpers::warn_log;

/// Environment variable selecting the [`Backoff`] policy
/// (`none`, `spin` or `yield`).
pub const BACKOFF_ENV: &str = "OPTBST_BACKOFF";

/// Environment variable overriding the backoff `max_shift`.
pub const BACKOFF_SHIFT_ENV: &str = "OPTBST_BACKOFF_SHIFT";

/// Default exponent cap: at most `1 << 6` spin iterations per retry.
pub const DEFAULT_MAX_SHIFT: u32 = 6;

/// Largest accepted exponent cap.
const MAX_SHIFT_LIMIT: u32 = 16;

/// What a mutator does between a failed validation and its next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Restart immediately.
    None,

    /// Spin `1 << min(attempt, max_shift)` times with `spin_loop` hints.
    Spin {
        /// Exponent cap for the spin count.
        max_shift: u32,
    },

    /// Spin like [`Backoff::Spin`] until the cap is reached, then yield the
    /// thread on every further retry.
    SpinThenYield {
        /// Exponent cap for the spin count.
        max_shift: u32,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::SpinThenYield {
            max_shift: DEFAULT_MAX_SHIFT,
        }
    }
}

/// Configuration for [`ConcurrentBst`](crate::ConcurrentBst).
///
/// # Example
///
/// ```rust
/// use optimistic_bst::{Backoff, ConcurrentBst, TreeConfig};
///
/// let config = TreeConfig {
///     backoff: Backoff::Spin { max_shift: 4 },
/// };
/// let tree = ConcurrentBst::with_config(config);
/// assert!(tree.insert(1));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeConfig {
    /// Retry backoff policy.
    pub backoff: Backoff,
}

impl TreeConfig {
    /// Build a config from [`BACKOFF_ENV`] and [`BACKOFF_SHIFT_ENV`].
    ///
    /// Unset or unparsable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let shift: Option<String> = env::var(BACKOFF_SHIFT_ENV).ok();
        let policy: Option<String> = env::var(BACKOFF_ENV).ok();
        Self::from_values(policy.as_deref(), shift.as_deref())
    }

    /// Build a config from raw policy and shift strings.
    fn from_values(policy: Option<&str>, shift: Option<&str>) -> Self {
        let max_shift: u32 = match shift.map(str::parse::<u32>) {
            Some(Ok(s)) if s <= MAX_SHIFT_LIMIT => s,
            Some(_) => {
                warn_log!(value = ?shift, "ignoring invalid backoff shift");
                DEFAULT_MAX_SHIFT
            }
            None => DEFAULT_MAX_SHIFT,
        };

        let backoff: Backoff = match policy.map(str::to_ascii_lowercase).as_deref() {
            Some("none" | "0") => Backoff::None,
            Some("spin") => Backoff::Spin { max_shift },
            Some("yield") | None => Backoff::SpinThenYield { max_shift },
            Some(_other) => {
                warn_log!(value = _other, "unknown backoff policy, using default");
                Backoff::SpinThenYield { max_shift }
            }
        };

        Self { backoff }
    }
}
