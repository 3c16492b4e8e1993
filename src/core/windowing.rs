use crate::core::{Record, TimeScale};

/// Index range of records whose time falls inside `[start_ms, end_ms]`.
///
/// `margin` extra records are included on each side so connected marks
/// (lines, areas) reach the pane edges.
#[must_use]
pub fn visible_index_range(
    records: &[Record],
    start_ms: f64,
    end_ms: f64,
    margin: usize,
) -> std::ops::Range<usize> {
    let (lo, hi) = if start_ms <= end_ms {
        (start_ms, end_ms)
    } else {
        (end_ms, start_ms)
    };
    let first = records.partition_point(|record| record.time_millis() < lo);
    let last = records.partition_point(|record| record.time_millis() <= hi);
    first.saturating_sub(margin)..(last + margin).min(records.len())
}

/// Records whose time falls inside the inclusive window.
#[must_use]
pub fn records_in_time_window(records: &[Record], start_ms: f64, end_ms: f64) -> &[Record] {
    &records[visible_index_range(records, start_ms, end_ms, 0)]
}

/// `(min, max)` over every finite value of `fields`; `None` when nothing
/// contributes.
#[must_use]
pub fn value_extent<S: AsRef<str>>(records: &[Record], fields: &[S]) -> Option<(f64, f64)> {
    let mut extent: Option<(f64, f64)> = None;
    for record in records {
        for field in fields {
            let Some(value) = record.value(field.as_ref()) else {
                continue;
            };
            extent = Some(match extent {
                Some((lo, hi)) => (lo.min(value), hi.max(value)),
                None => (value, value),
            });
        }
    }
    extent
}

/// Expands a raw extent by `bottom_ratio`/`top_ratio` of its span.
///
/// A zero-width extent is first widened around its value so the result is
/// always a usable scale domain.
#[must_use]
pub fn padded_extent(extent: (f64, f64), bottom_ratio: f64, top_ratio: f64) -> (f64, f64) {
    let (mut lo, mut hi) = extent;
    if hi - lo <= f64::EPSILON * lo.abs().max(1.0) {
        let half = (lo.abs() * 0.005).max(0.5);
        lo -= half;
        hi += half;
    }
    let span = hi - lo;
    (lo - span * bottom_ratio, hi + span * top_ratio)
}

/// Index of the record nearest to `time_ms` by actual time distance.
///
/// Queries before the first record resolve to `0`, after the last to
/// `len - 1`; ties prefer the earlier record. `None` only for empty data.
#[must_use]
pub fn nearest_index(records: &[Record], time_ms: f64) -> Option<usize> {
    if records.is_empty() || time_ms.is_nan() {
        return None;
    }
    let right = records.partition_point(|record| record.time_millis() < time_ms);
    if right == 0 {
        return Some(0);
    }
    if right >= records.len() {
        return Some(records.len() - 1);
    }
    let left = right - 1;
    let left_distance = time_ms - records[left].time_millis();
    let right_distance = records[right].time_millis() - time_ms;
    Some(if right_distance < left_distance {
        right
    } else {
        left
    })
}

/// Nearest record under a pixel column, or `None` when the pixel lies outside
/// the scale's range.
#[must_use]
pub fn index_at_pixel(records: &[Record], scale: TimeScale, pixel: f64) -> Option<usize> {
    if !scale.range_contains(pixel) {
        return None;
    }
    nearest_index(records, scale.invert_millis(pixel))
}
