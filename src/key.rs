//! Key domain for [`ConcurrentBst`](crate::ConcurrentBst).
//!
//! Keys are plain `i32`s. The largest representable value is reserved for the
//! sentinel node that sits above the real root, so it can never be stored.

use thiserror::Error;

/// The key carried by the sentinel node.
///
/// Every user key compares strictly less than this, so the real root always
/// hangs off the sentinel's left link.
pub const SENTINEL_KEY: i32 = i32::MAX;

/// Errors produced when a key cannot be stored in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The key collides with the sentinel key.
    #[error("key {0} is reserved for the tree sentinel")]
    Reserved(i32),
}

/// Check that `key` is a legal user key.
///
/// # Errors
///
/// Returns [`KeyError::Reserved`] for [`SENTINEL_KEY`].
///
/// # Example
///
/// ```rust
/// use optimistic_bst::key::{check_key, KeyError, SENTINEL_KEY};
///
/// assert!(check_key(42).is_ok());
/// assert_eq!(check_key(SENTINEL_KEY), Err(KeyError::Reserved(SENTINEL_KEY)));
/// ```
#[inline]
pub const fn check_key(key: i32) -> Result<i32, KeyError> {
    if key == SENTINEL_KEY {
        Err(KeyError::Reserved(key))
    } else {
        Ok(key)
    }
}
