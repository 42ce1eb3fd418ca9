//! Epoch-millisecond arithmetic and calendar bucketing.
//!
//! All timestamps in playstat are `i64` milliseconds since the Unix epoch.
//! Bucketing functions take a fixed UTC offset in minutes so that "a day"
//! means a day on the server operator's wall clock.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// One second in milliseconds.
pub const SECOND: i64 = 1000;
/// One minute in milliseconds.
pub const MINUTE: i64 = 60 * SECOND;
/// One hour in milliseconds.
pub const HOUR: i64 = 60 * MINUTE;
/// One day in milliseconds.
pub const DAY: i64 = 24 * HOUR;
/// One week in milliseconds.
pub const WEEK: i64 = 7 * DAY;

/// Source of the current time.
///
/// Session and AFK logic never read the wall clock directly; the clock is
/// injected so that tests can drive time explicitly.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Set the current time.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `delta` milliseconds and return the new time.
    pub fn advance(&self, delta: i64) -> i64 {
        self.now.fetch_add(delta, Ordering::SeqCst) + delta
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

fn offset_ms(utc_offset_minutes: i32) -> i64 {
    i64::from(utc_offset_minutes) * MINUTE
}

fn fixed_offset(utc_offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
}

/// Start of the local day containing `timestamp`.
pub fn day_start(timestamp: i64, utc_offset_minutes: i32) -> i64 {
    let local = timestamp + offset_ms(utc_offset_minutes);
    timestamp - local.rem_euclid(DAY)
}

/// Day of the week for `timestamp`, 0 = Monday through 6 = Sunday.
pub fn weekday(timestamp: i64, utc_offset_minutes: i32) -> u32 {
    let local_days = (timestamp + offset_ms(utc_offset_minutes)).div_euclid(DAY);
    // 1970-01-01 was a Thursday
    (local_days + 3).rem_euclid(7) as u32
}

/// Hour of the local day for `timestamp`, 0..=23.
pub fn hour_of_day(timestamp: i64, utc_offset_minutes: i32) -> u32 {
    let local = timestamp + offset_ms(utc_offset_minutes);
    (local.rem_euclid(DAY) / HOUR) as u32
}

/// Start of the local week (Monday 00:00) containing `timestamp`.
pub fn week_start(timestamp: i64, utc_offset_minutes: i32) -> i64 {
    day_start(timestamp, utc_offset_minutes)
        - i64::from(weekday(timestamp, utc_offset_minutes)) * DAY
}

/// Start of the local month containing `timestamp`.
///
/// Falls back to the day start for timestamps chrono cannot represent.
pub fn month_start(timestamp: i64, utc_offset_minutes: i32) -> i64 {
    let offset = fixed_offset(utc_offset_minutes);
    let Some(utc) = DateTime::<Utc>::from_timestamp_millis(timestamp) else {
        return day_start(timestamp, utc_offset_minutes);
    };
    let local = utc.with_timezone(&offset);
    NaiveDate::from_ymd_opt(local.year(), local.month(), 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| offset.from_local_datetime(&midnight).single())
        .map(|start| start.timestamp_millis())
        .unwrap_or_else(|| day_start(timestamp, utc_offset_minutes))
}

/// Local day starts covering the half-open range `[after, before)`.
///
/// The first bucket is the day containing `after`; empty when `before <= after`.
pub fn day_buckets(after: i64, before: i64, utc_offset_minutes: i32) -> Vec<i64> {
    if before <= after {
        return Vec::new();
    }
    let mut buckets = Vec::new();
    let mut current = day_start(after, utc_offset_minutes);
    while current < before {
        buckets.push(current);
        current += DAY;
    }
    buckets
}

/// Format a local date as `YYYY-MM-DD`.
pub fn format_date(timestamp: i64, utc_offset_minutes: i32) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .map(|utc| {
            utc.with_timezone(&fixed_offset(utc_offset_minutes))
                .format("%Y-%m-%d")
                .to_string()
        })
        .unwrap_or_else(|| timestamp.to_string())
}

/// Format a duration in milliseconds as `1d 2h 3m 4s`, omitting zero units.
pub fn format_duration(ms: i64) -> String {
    if ms < SECOND {
        return "0s".to_string();
    }
    let days = ms / DAY;
    let hours = (ms % DAY) / HOUR;
    let minutes = (ms % HOUR) / MINUTE;
    let seconds = (ms % MINUTE) / SECOND;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // 2025-01-15T13:45:00Z, a Wednesday
    const WEDNESDAY: i64 = 1_736_948_700_000;

    #[test]
    fn test_day_start_utc() {
        let start = day_start(WEDNESDAY, 0);
        assert_eq!(start, 1_736_899_200_000);
        assert_eq!(day_start(start, 0), start);
    }

    #[test]
    fn test_day_start_with_offset() {
        // 13:45Z is 23:45 at +10:00, so the local day began at 14:00Z the day before
        let start = day_start(WEDNESDAY, 600);
        assert_eq!(start, 1_736_899_200_000 - 10 * HOUR);
    }

    #[test]
    fn test_day_start_before_epoch() {
        assert_eq!(day_start(-1, 0), -DAY);
    }

    #[rstest]
    #[case(0, 2)]
    #[case(600, 2)]
    #[case(-840, 1)]
    #[case(660, 3)]
    fn test_weekday(#[case] offset: i32, #[case] expected: u32) {
        assert_eq!(weekday(WEDNESDAY, offset), expected);
    }

    #[test]
    fn test_week_start_is_monday() {
        let start = week_start(WEDNESDAY, 0);
        assert_eq!(weekday(start, 0), 0);
        assert_eq!(WEDNESDAY - start, 2 * DAY + 13 * HOUR + 45 * MINUTE);
    }

    #[test]
    fn test_month_start() {
        // 2025-01-01T00:00:00Z
        assert_eq!(month_start(WEDNESDAY, 0), 1_735_689_600_000);
    }

    #[test]
    fn test_hour_of_day() {
        assert_eq!(hour_of_day(WEDNESDAY, 0), 13);
        assert_eq!(hour_of_day(WEDNESDAY, 120), 15);
    }

    #[test]
    fn test_day_buckets() {
        let start = day_start(WEDNESDAY, 0);
        let buckets = day_buckets(WEDNESDAY, start + 3 * DAY, 0);
        assert_eq!(buckets, vec![start, start + DAY, start + 2 * DAY]);
        assert!(day_buckets(10, 10, 0).is_empty());
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(WEDNESDAY, 0), "2025-01-15");
        assert_eq!(format_date(WEDNESDAY, 660), "2025-01-16");
    }

    #[rstest]
    #[case(0, "0s")]
    #[case(999, "0s")]
    #[case(61_000, "1m 1s")]
    #[case(DAY + 2 * HOUR + 4 * SECOND, "1d 2h 4s")]
    fn test_format_duration(#[case] ms: i64, #[case] expected: &str) {
        assert_eq!(format_duration(ms), expected);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_ms(), 100);
        assert_eq!(clock.advance(50), 150);
        clock.set(10);
        assert_eq!(clock.now_ms(), 10);
    }
}
