use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::LinearScale;
use crate::core::primitives::{datetime_to_millis, millis_to_datetime};
use crate::error::ChartResult;

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

/// Calendar-friendly tick steps, smallest first.
const TIME_TICK_STEPS_MS: [f64; 19] = [
    SECOND,
    5.0 * SECOND,
    15.0 * SECOND,
    30.0 * SECOND,
    MINUTE,
    5.0 * MINUTE,
    15.0 * MINUTE,
    30.0 * MINUTE,
    HOUR,
    3.0 * HOUR,
    6.0 * HOUR,
    12.0 * HOUR,
    DAY,
    2.0 * DAY,
    7.0 * DAY,
    14.0 * DAY,
    30.0 * DAY,
    90.0 * DAY,
    365.0 * DAY,
];

/// Continuous `DateTime<Utc>` to pixel mapping.
///
/// Internally a [`LinearScale`] over epoch milliseconds; cheap to copy so every
/// pane gets its own copy of the shared time axis on each redraw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    linear: LinearScale,
}

impl TimeScale {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> ChartResult<Self> {
        Self::from_millis(datetime_to_millis(start), datetime_to_millis(end))
    }

    pub fn from_millis(start_ms: f64, end_ms: f64) -> ChartResult<Self> {
        Ok(Self {
            linear: LinearScale::new(start_ms, end_ms)?,
        })
    }

    #[must_use]
    pub fn from_linear(linear: LinearScale) -> Self {
        Self { linear }
    }

    #[must_use]
    pub fn linear(self) -> LinearScale {
        self.linear
    }

    #[must_use]
    pub fn with_range(self, range_start: f64, range_end: f64) -> Self {
        Self {
            linear: self.linear.with_range(range_start, range_end),
        }
    }

    pub fn with_domain_millis(self, start_ms: f64, end_ms: f64) -> ChartResult<Self> {
        Ok(Self {
            linear: self.linear.with_domain(start_ms, end_ms)?,
        })
    }

    #[must_use]
    pub fn domain_millis(self) -> (f64, f64) {
        self.linear.domain()
    }

    /// Domain as timestamps; `None` when the domain left chrono's range.
    #[must_use]
    pub fn domain(self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let (start, end) = self.linear.domain();
        Some((millis_to_datetime(start)?, millis_to_datetime(end)?))
    }

    #[must_use]
    pub fn span_millis(self) -> f64 {
        let (start, end) = self.linear.domain();
        end - start
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        self.linear.range()
    }

    #[must_use]
    pub fn range_contains(self, pixel: f64) -> bool {
        self.linear.range_contains(pixel)
    }

    #[must_use]
    pub fn map(self, time: DateTime<Utc>) -> f64 {
        self.linear.map(datetime_to_millis(time))
    }

    #[must_use]
    pub fn map_millis(self, millis: f64) -> f64 {
        self.linear.map(millis)
    }

    #[must_use]
    pub fn invert_millis(self, pixel: f64) -> f64 {
        self.linear.invert(pixel)
    }

    #[must_use]
    pub fn invert(self, pixel: f64) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.invert_millis(pixel))
    }

    /// Pixel width of `duration_ms` at the current zoom.
    #[must_use]
    pub fn pixels_per(self, duration_ms: f64) -> f64 {
        let (r0, r1) = self.linear.range();
        (r1 - r0).abs() * duration_ms / self.span_millis().abs()
    }

    /// Calendar-aligned tick step for roughly `count` ticks.
    #[must_use]
    pub fn tick_step_millis(self, count: usize) -> f64 {
        let target = self.span_millis().abs() / count.max(1) as f64;
        TIME_TICK_STEPS_MS
            .iter()
            .copied()
            .find(|step| *step >= target)
            .unwrap_or(TIME_TICK_STEPS_MS[TIME_TICK_STEPS_MS.len() - 1])
    }

    /// Tick positions (epoch milliseconds) aligned to multiples of the step.
    #[must_use]
    pub fn ticks_millis(self, count: usize) -> Vec<f64> {
        let step = self.tick_step_millis(count);
        let (start, end) = self.linear.domain();
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let first = (lo / step).ceil();
        let last = (hi / step).floor();
        if !(last >= first) || last - first > 1_000.0 {
            return Vec::new();
        }
        let n = (last - first) as usize + 1;
        (0..n).map(|i| (first + i as f64) * step).collect()
    }
}

/// `chrono` format for axis tick labels at the given step.
#[must_use]
pub fn tick_label_format(step_ms: f64) -> &'static str {
    if step_ms < MINUTE {
        "%H:%M:%S"
    } else if step_ms < DAY {
        "%H:%M"
    } else if step_ms < 30.0 * DAY {
        "%d %b"
    } else if step_ms < 365.0 * DAY {
        "%b %Y"
    } else {
        "%Y"
    }
}

#[cfg(test)]
mod tests {
    use super::{HOUR, TimeScale, tick_label_format};

    #[test]
    fn ticks_align_to_calendar_steps() {
        let scale = TimeScale::from_millis(0.5 * HOUR, 10.2 * HOUR)
            .expect("valid scale")
            .with_range(0.0, 800.0);
        let ticks = scale.ticks_millis(4);
        assert_eq!(scale.tick_step_millis(4), 3.0 * HOUR);
        assert_eq!(ticks, vec![3.0 * HOUR, 6.0 * HOUR, 9.0 * HOUR]);
        assert_eq!(tick_label_format(3.0 * HOUR), "%H:%M");
    }

    #[test]
    fn pixels_per_interval_tracks_zoom() {
        let scale = TimeScale::from_millis(0.0, 100.0 * HOUR)
            .expect("valid scale")
            .with_range(0.0, 1_000.0);
        assert!((scale.pixels_per(HOUR) - 10.0).abs() <= 1e-9);
    }
}
