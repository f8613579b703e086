//! Digest nonce derivation.
//!
//! A nonce is `SHA-256(seconds ++ random)`. The function is deterministic in
//! its inputs; unpredictability comes from the random component, which the
//! server draws fresh on every rotation.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::hash::sha256_hex;

/// Abstraction over the wall clock so rotation can be driven in tests.
pub trait ClockSource: Send + Sync {
    /// Current time as whole seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

/// Clock source backed by `std::time::SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}

/// Derives a nonce from a second-resolution timestamp and a random value.
///
/// # Examples
///
/// ```
/// use xacml_core::nonce::compute_nonce;
///
/// assert_eq!(compute_nonce(1_700_000_000, 42), compute_nonce(1_700_000_000, 42));
/// assert_ne!(compute_nonce(1_700_000_000, 42), compute_nonce(1_700_000_000, 43));
/// ```
#[must_use]
pub fn compute_nonce(timestamp_secs: u64, random: u64) -> String {
    sha256_hex(format!("{timestamp_secs}{random}"))
}
