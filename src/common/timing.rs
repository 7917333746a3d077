// src/common/timing.rs

use core::time::Duration;

// === Parser Defaults ===

/// Default time budget for a whole command: writing it, waiting for the echo
/// and waiting for the final result code.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(90_000);

/// Default inter-byte timeout for stream reads and writes.
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Clamps `wait` to the remaining `budget`.
#[inline]
pub(crate) fn clamp_wait(wait: Duration, budget: Duration) -> Duration {
    if budget < wait {
        budget
    } else {
        wait
    }
}
