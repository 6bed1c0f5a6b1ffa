// Countdown contract: derived time, never a ticking counter.

use chrono::{DateTime, Utc};

/// Seconds left on the clock for the current pick.
///
/// Pure arithmetic over the shared `pick_started_at` timestamp, so every
/// client (including one that just reconnected) computes the same value.
/// Never negative.
pub fn remaining_seconds(
    started_at: DateTime<Utc>,
    duration_seconds: u32,
    now: DateTime<Utc>,
) -> u32 {
    let elapsed = (now - started_at).num_seconds().max(0);
    (duration_seconds as i64 - elapsed).max(0) as u32
}

/// Whether the current pick's budget has run out. Expiry is a signal for
/// a notification; it never advances the cursor on its own.
pub fn is_expired(started_at: DateTime<Utc>, duration_seconds: u32, now: DateTime<Utc>) -> bool {
    remaining_seconds(started_at, duration_seconds, now) == 0
}

/// Render seconds as `MM:SS` for display.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
