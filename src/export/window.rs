//! Time range planning for chunked history requests.

use chrono::{DateTime, Utc};
use std::fmt;

pub const MS_PER_HOUR: i64 = 60 * 60 * 1000;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// A closed interval `[start, end]` in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// The first 24 hours after `start`, clipped to `now`.
    pub fn probe(start: i64, now: i64) -> Self {
        Self::new(start, start.saturating_add(MS_PER_DAY).min(now))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", format_ms(self.start), format_ms(self.end))
    }
}

/// Split `[start, end)` into consecutive windows of `chunk_days` days.
///
/// Each window is closed on both ends because the upstream treats `startTime`
/// and `endTime` as inclusive, so window `k + 1` starts one millisecond after
/// window `k` ends. The last window is clipped to `end - 1`. An empty or
/// inverted range yields no windows.
pub fn plan_windows(start: i64, end: i64, chunk_days: u32) -> Vec<TimeWindow> {
    let chunk_ms = i64::from(chunk_days.max(1)) * MS_PER_DAY;
    let mut windows = Vec::new();

    let mut cursor = start;
    while cursor < end {
        let next = cursor.saturating_add(chunk_ms).min(end);
        windows.push(TimeWindow::new(cursor, next - 1));
        cursor = next;
    }

    windows
}

/// Render Unix milliseconds as `YYYY-MM-DD HH:MM:SS` UTC.
pub fn format_ms(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}
