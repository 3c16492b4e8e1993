use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

use crate::core::{LinearScale, TimeScale};
use crate::error::{ChartError, ChartResult};

/// Immutable view transform `(x, y, k)`: `apply(p) = p * k + (x, y)`.
///
/// Every interaction replaces the current value wholesale; no operation
/// mutates a transform in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(f64, f64, f64)", into = "(f64, f64, f64)")]
pub struct ZoomTransform {
    x: f64,
    y: f64,
    k: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> ChartResult<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ChartError::InvalidData(
                "zoom translation must be finite".to_owned(),
            ));
        }
        if !k.is_finite() || k <= 0.0 {
            return Err(ChartError::InvalidData(
                "zoom scale must be finite and > 0".to_owned(),
            ));
        }
        Ok(Self { x, y, k })
    }

    #[must_use]
    pub fn x(self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn k(self) -> f64 {
        self.k
    }

    #[must_use]
    pub fn to_tuple(self) -> (f64, f64, f64) {
        (self.x, self.y, self.k)
    }

    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    #[must_use]
    pub fn apply(self, point: Point) -> Point {
        Point::new(self.apply_x(point.x), self.apply_y(point.y))
    }

    #[must_use]
    pub fn apply_x(self, x: f64) -> f64 {
        x * self.k + self.x
    }

    #[must_use]
    pub fn apply_y(self, y: f64) -> f64 {
        y * self.k + self.y
    }

    #[must_use]
    pub fn invert(self, point: Point) -> Point {
        Point::new(self.invert_x(point.x), self.invert_y(point.y))
    }

    #[must_use]
    pub fn invert_x(self, x: f64) -> f64 {
        (x - self.x) / self.k
    }

    #[must_use]
    pub fn invert_y(self, y: f64) -> f64 {
        (y - self.y) / self.k
    }

    /// Multiplies the scale, keeping the translation. Non-positive or
    /// non-finite factors leave the transform unchanged.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        let k = self.k * factor;
        if !k.is_finite() || k <= 0.0 {
            return self;
        }
        Self { k, ..self }
    }

    /// Translates by `(dx, dy)` in the transform's local units, i.e. by
    /// `(dx * k, dy * k)` pixels.
    #[must_use]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        let moved = Self {
            x: self.x + self.k * dx,
            y: self.y + self.k * dy,
            k: self.k,
        };
        if moved.x.is_finite() && moved.y.is_finite() {
            moved
        } else {
            self
        }
    }

    /// `self ∘ other`: applying the result equals applying `other` first,
    /// then `self`.
    #[must_use]
    pub fn compose(self, other: Self) -> Self {
        Self {
            x: self.x + self.k * other.x,
            y: self.y + self.k * other.y,
            k: self.k * other.k,
        }
    }

    /// Rescaled copy of `scale` whose domain is what the scale's range
    /// shows through this transform.
    pub fn rescale_x(self, scale: LinearScale) -> ChartResult<LinearScale> {
        let (r0, r1) = scale.range();
        scale.with_domain(
            scale.invert(self.invert_x(r0)),
            scale.invert(self.invert_x(r1)),
        )
    }

    pub fn rescale_y(self, scale: LinearScale) -> ChartResult<LinearScale> {
        let (r0, r1) = scale.range();
        scale.with_domain(
            scale.invert(self.invert_y(r0)),
            scale.invert(self.invert_y(r1)),
        )
    }

    pub fn rescale_time(self, scale: TimeScale) -> ChartResult<TimeScale> {
        self.rescale_x(scale.linear()).map(TimeScale::from_linear)
    }

    #[must_use]
    pub fn to_affine(self) -> Affine {
        Affine::new([self.k, 0.0, 0.0, self.k, self.x, self.y])
    }
}

impl TryFrom<(f64, f64, f64)> for ZoomTransform {
    type Error = ChartError;

    fn try_from((x, y, k): (f64, f64, f64)) -> Result<Self, Self::Error> {
        Self::new(x, y, k)
    }
}

impl From<ZoomTransform> for (f64, f64, f64) {
    fn from(value: ZoomTransform) -> Self {
        value.to_tuple()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use kurbo::Point;

    use super::ZoomTransform;
    use crate::core::LinearScale;

    #[test]
    fn translate_is_scaled_by_current_k() {
        let t = ZoomTransform::new(10.0, 0.0, 2.0).expect("transform");
        let moved = t.translate(5.0, 1.0);
        assert_eq!(moved.to_tuple(), (20.0, 2.0, 2.0));
    }

    #[test]
    fn compose_matches_sequential_application() {
        let a = ZoomTransform::new(3.0, -4.0, 2.0).expect("a");
        let b = ZoomTransform::new(-1.0, 7.0, 0.5).expect("b");
        let p = Point::new(12.0, -3.0);
        let composed = a.compose(b).apply(p);
        let sequential = a.apply(b.apply(p));
        assert_relative_eq!(composed.x, sequential.x);
        assert_relative_eq!(composed.y, sequential.y);
    }

    #[test]
    fn rescale_x_shows_the_zoomed_window() {
        let scale = LinearScale::new(0.0, 100.0)
            .expect("scale")
            .with_range(0.0, 200.0);
        let zoomed = ZoomTransform::new(-200.0, 0.0, 2.0).expect("transform");
        let (d0, d1) = zoomed.rescale_x(scale).expect("rescale").domain();
        assert_relative_eq!(d0, 50.0);
        assert_relative_eq!(d1, 100.0);
    }

    #[test]
    fn invalid_scale_is_rejected() {
        assert!(ZoomTransform::new(0.0, 0.0, 0.0).is_err());
        assert!(ZoomTransform::new(f64::NAN, 0.0, 1.0).is_err());
        assert!(ZoomTransform::try_from((0.0, 0.0, -1.0)).is_err());
    }
}
