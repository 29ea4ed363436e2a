//! Frame-grid quantization and timestamp formats
//!
//! All times are integer milliseconds on a shared absolute axis starting at
//! zero. The target player renders at 29.97 fps, so a frame lasts
//! [`FRAME_DURATION_MS`] milliseconds. A frame's "start time" sits 16 ms
//! before its nominal timestamp and its "end time" 16 ms after, which places
//! every snapped boundary near the center of a frame.

use crate::utils::errors::{CoreError, Result};

/// Duration of one video frame in milliseconds
pub const FRAME_DURATION_MS: f64 = 33.366_666_666_666_67;

/// Index of the first frame that a line starting at `time` is visible on
#[must_use]
pub fn start_time_to_frame(time: i64) -> i64 {
    if time <= 0 {
        return 0;
    }
    end_time_to_frame(time) + 1
}

/// Index of the last frame that a line ending at `time` is visible on
#[must_use]
pub fn end_time_to_frame(time: i64) -> i64 {
    ((time + 1) as f64 / FRAME_DURATION_MS) as i64
}

/// Start boundary of `frame`
#[must_use]
pub fn frame_to_start_time(frame: i64) -> i64 {
    if frame <= 0 {
        return 0;
    }
    frame_to_time(frame) - 16
}

/// End boundary of `frame`
#[must_use]
pub fn frame_to_end_time(frame: i64) -> i64 {
    frame_to_time(frame) + 16
}

/// Nominal timestamp of `frame`
#[must_use]
pub fn frame_to_time(frame: i64) -> i64 {
    if frame == 0 {
        return 0;
    }
    (frame as f64 * FRAME_DURATION_MS) as i64
}

/// Snap `time` to the frame boundary it falls into
///
/// Idempotent: snapping an already snapped time returns it unchanged.
#[must_use]
pub fn round_time_to_frame_center(time: i64) -> i64 {
    if time <= 0 {
        return 0;
    }
    frame_to_start_time(start_time_to_frame(time))
}

/// Half-open time interval `[start, end)`
///
/// Ordering compares `start` first, which is what cluster tables key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeRange {
    /// Inclusive start in milliseconds
    pub start: i64,
    /// Exclusive end in milliseconds
    pub end: i64,
}

impl TimeRange {
    /// Create a range from its bounds
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Length of the range, zero for inverted ranges
    #[must_use]
    pub const fn duration(&self) -> i64 {
        if self.end > self.start {
            self.end - self.start
        } else {
            0
        }
    }

    /// Whether `point` lies inside the range
    #[must_use]
    pub const fn contains(&self, point: i64) -> bool {
        point >= self.start && point < self.end
    }

    /// Whether the ranges share at least one instant
    ///
    /// Ranges that merely touch do not overlap.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Smallest range covering both ranges
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Common part of both ranges, `None` if they do not overlap
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        self.overlaps(other)
            .then(|| Self::new(self.start.max(other.start), self.end.min(other.end)))
    }
}

/// Parse ASS time format (`H:MM:SS.CC`) to milliseconds
///
/// # Example
///
/// ```rust
/// # use ytsub_core::utils::time::parse_ass_time;
/// assert_eq!(parse_ass_time("0:01:30.50")?, 90_500);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Errors
///
/// Returns an error if the time format is invalid or cannot be parsed.
pub fn parse_ass_time(time_str: &str) -> Result<i64> {
    let trimmed = time_str.trim();
    let mut parts = trimmed.split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CoreError::invalid_time(time_str, "expected H:MM:SS.CC"));
    };

    let parse = |value: &str| -> Result<i64> {
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| CoreError::invalid_time(time_str, "non-numeric component"))
    };

    let (whole_seconds, fraction) = seconds.split_once('.').unwrap_or((seconds, "0"));
    let mut fraction_ms = 0;
    let mut scale = 100;
    for digit in fraction.chars().take(3) {
        let digit = digit
            .to_digit(10)
            .ok_or_else(|| CoreError::invalid_time(time_str, "non-numeric fraction"))?;
        fraction_ms += i64::from(digit) * scale;
        scale /= 10;
    }

    Ok(((parse(hours)? * 60 + parse(minutes)?) * 60 + parse(whole_seconds)?) * 1000 + fraction_ms)
}

/// Format milliseconds as ASS time (`H:MM:SS.CC`), truncating to centiseconds
#[must_use]
pub fn format_ass_time(ms: i64) -> String {
    let ms = ms.max(0);
    let centis = (ms / 10) % 100;
    let seconds = (ms / 1000) % 60;
    let minutes = (ms / 60_000) % 60;
    let hours = ms / 3_600_000;
    format!("{hours}:{minutes:02}:{seconds:02}.{centis:02}")
}

/// Format milliseconds as `HH:MM:SS,mmm`
#[must_use]
pub fn format_srt_time(ms: i64) -> String {
    let ms = ms.max(0);
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        (ms / 60_000) % 60,
        (ms / 1000) % 60,
        ms % 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_conversions() {
        assert_eq!(start_time_to_frame(0), 0);
        assert_eq!(start_time_to_frame(-5), 0);
        assert_eq!(end_time_to_frame(32), 0);
        assert_eq!(end_time_to_frame(33), 1);
        assert_eq!(frame_to_start_time(1), 17);
        assert_eq!(frame_to_end_time(1), 49);
        assert_eq!(frame_to_time(3), 100);
    }

    #[test]
    fn rounding_to_frame_center() {
        assert_eq!(round_time_to_frame_center(0), 0);
        assert_eq!(round_time_to_frame_center(1010), 1018);
        assert_eq!(round_time_to_frame_center(1018), 1018);
        for time in [1, 17, 250, 999, 5000, 123_456] {
            let snapped = round_time_to_frame_center(time);
            assert_eq!(round_time_to_frame_center(snapped), snapped);
        }
    }

    #[test]
    fn time_range_relations() {
        let a = TimeRange::new(0, 100);
        let b = TimeRange::new(50, 150);
        let c = TimeRange::new(100, 200);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.union(&b), TimeRange::new(0, 150));
        assert_eq!(a.intersection(&b), Some(TimeRange::new(50, 100)));
        assert_eq!(a.intersection(&c), None);
        assert!(a.contains(0));
        assert!(!a.contains(100));
    }

    #[test]
    fn ass_time_round_trip() {
        assert_eq!(parse_ass_time("0:00:05.00").unwrap(), 5000);
        assert_eq!(parse_ass_time("1:02:03.45").unwrap(), 3_723_450);
        assert_eq!(format_ass_time(3_723_456), "1:02:03.45");
        assert!(parse_ass_time("00:05").is_err());
        assert!(parse_ass_time("a:00:05.00").is_err());
    }

    #[test]
    fn srt_time_format() {
        assert_eq!(format_srt_time(3_723_456), "01:02:03,456");
    }
}
