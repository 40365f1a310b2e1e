use std::time::Duration;

use chrono::{DateTime, Utc};

/// Whether item payloads stamped at `refresh_timestamp` need re-fetching.
///
/// A missing timestamp is always stale. Otherwise the data is stale once it
/// is strictly older than `window`.
pub fn is_stale(
    refresh_timestamp: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    let Some(refreshed_at) = refresh_timestamp else {
        return true;
    };
    match chrono::Duration::from_std(window) {
        Ok(window) => now.signed_duration_since(refreshed_at) > window,
        // A window too large to represent never expires.
        Err(_) => false,
    }
}
