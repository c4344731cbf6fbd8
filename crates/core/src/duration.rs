//! Elapsed-time helpers for render notifications.

use std::time::Duration;

use crate::types::Timestamp;

/// Time elapsed between `started_at` and `now`.
///
/// An absent start time counts as zero, as does a start time in the future
/// (clock adjustments between the two readings).
pub fn elapsed_since(started_at: Option<Timestamp>, now: Timestamp) -> Duration {
    started_at
        .and_then(|start| (now - start).to_std().ok())
        .unwrap_or_default()
}

/// Format a duration as `HH:MM:SS`.
///
/// Hours are not wrapped at 24, so a 25-hour render reads `25:00:00`.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
