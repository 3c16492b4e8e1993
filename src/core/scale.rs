use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

const MAX_TICKS: usize = 1_000;

/// Continuous linear mapping from a data domain onto a pixel range.
///
/// The range may be inverted (`range_start > range_end`), which is how value
/// axes map larger values towards the top of a pane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    range_start: f64,
    range_end: f64,
}

impl LinearScale {
    /// Creates a scale over `[domain_start, domain_end]` with the unit range.
    pub fn new(domain_start: f64, domain_end: f64) -> ChartResult<Self> {
        validate_domain(domain_start, domain_end)?;
        Ok(Self {
            domain_start,
            domain_end,
            range_start: 0.0,
            range_end: 1.0,
        })
    }

    #[must_use]
    pub fn with_range(mut self, range_start: f64, range_end: f64) -> Self {
        self.range_start = range_start;
        self.range_end = range_end;
        self
    }

    pub fn with_domain(mut self, domain_start: f64, domain_end: f64) -> ChartResult<Self> {
        validate_domain(domain_start, domain_end)?;
        self.domain_start = domain_start;
        self.domain_end = domain_end;
        Ok(self)
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    /// Maps a domain value to the range.
    #[must_use]
    pub fn map(self, value: f64) -> f64 {
        let t = (value - self.domain_start) / (self.domain_end - self.domain_start);
        self.range_start + t * (self.range_end - self.range_start)
    }

    /// Maps a range value back to the domain.
    ///
    /// A zero-width range maps everything to `domain_start`.
    #[must_use]
    pub fn invert(self, pixel: f64) -> f64 {
        let range_span = self.range_end - self.range_start;
        if range_span == 0.0 {
            return self.domain_start;
        }
        let t = (pixel - self.range_start) / range_span;
        self.domain_start + t * (self.domain_end - self.domain_start)
    }

    /// Whether `pixel` lies inside the range, regardless of its orientation.
    #[must_use]
    pub fn range_contains(self, pixel: f64) -> bool {
        let (lo, hi) = ordered(self.range_start, self.range_end);
        pixel.is_finite() && pixel >= lo && pixel <= hi
    }

    /// Round-number ticks covering the domain, roughly `count` of them.
    #[must_use]
    pub fn ticks(self, count: usize) -> Vec<f64> {
        let (lo, hi) = ordered(self.domain_start, self.domain_end);
        let step = tick_step(lo, hi, count);
        if !step.is_finite() || step <= 0.0 {
            return Vec::new();
        }

        let first = (lo / step).ceil();
        let last = (hi / step).floor();
        if !(last >= first) || last - first > MAX_TICKS as f64 {
            return Vec::new();
        }

        let n = (last - first) as usize + 1;
        (0..n).map(|i| (first + i as f64) * step).collect()
    }

    /// Step used by [`Self::ticks`] for the same `count`.
    #[must_use]
    pub fn tick_step(self, count: usize) -> f64 {
        let (lo, hi) = ordered(self.domain_start, self.domain_end);
        tick_step(lo, hi, count)
    }
}

/// Nearest 1-2-5 multiple of a power of ten for `count` steps over `[lo, hi]`.
#[must_use]
pub fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let raw = (hi - lo) / count.max(1) as f64;
    if !raw.is_finite() || raw <= 0.0 {
        return f64::NAN;
    }
    let power = raw.log10().floor();
    let base = 10f64.powf(power);
    let error = raw / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * base
}

fn validate_domain(start: f64, end: f64) -> ChartResult<()> {
    if !start.is_finite() || !end.is_finite() || start == end {
        return Err(ChartError::InvalidData(
            "scale domain must be finite and non-zero".to_owned(),
        ));
    }
    Ok(())
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::LinearScale;

    #[test]
    fn inverted_range_maps_larger_values_up() {
        let scale = LinearScale::new(10.0, 110.0)
            .expect("valid scale")
            .with_range(600.0, 0.0);
        assert_eq!(scale.map(110.0), 0.0);
        assert_eq!(scale.map(10.0), 600.0);
        assert!((scale.invert(300.0) - 60.0).abs() <= 1e-9);
    }

    #[test]
    fn ticks_use_round_steps() {
        let scale = LinearScale::new(0.3, 9.7).expect("valid scale");
        assert_eq!(scale.ticks(5), vec![2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn zero_width_domain_is_rejected() {
        assert!(LinearScale::new(1.0, 1.0).is_err());
        assert!(LinearScale::new(f64::NAN, 1.0).is_err());
    }
}
