//! Millisecond time base shared by every timer-driven component.
//!
//! Components never read the wall clock themselves; callers pass `now` into
//! each event handler so state machines stay deterministic under test.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type Millis = u64;

pub const SECOND_MS: Millis = 1_000;
pub const DAY_MS: Millis = 24 * 60 * 60 * SECOND_MS;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as Millis)
        .unwrap_or(0)
}
