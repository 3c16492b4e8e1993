use crate::core::LinearScale;
use crate::interaction::{ScaleExtent, ZoomTransform};

/// How a pane's value axis reaches a new target domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueFit {
    /// Keep the base scale and move the zoom transform.
    Transform(ZoomTransform),
    /// The transform would leave the scale extent; replace the base domain
    /// and reset the transform to identity.
    Rebase(LinearScale),
}

/// Solves for the y-transform that makes `base` (range `[h, 0]`) show
/// exactly `target` once rescaled.
///
/// With `p0 = base(lo)` and `p1 = base(hi)` the transform must send `p0`
/// to `h` and `p1` to `0`, giving `k = h / (p0 - p1)` and `y = -k * p1`.
#[must_use]
pub fn solve_value_fit(
    base: LinearScale,
    target: (f64, f64),
    scale_extent: ScaleExtent,
) -> Option<ValueFit> {
    let (lo, hi) = target;
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return None;
    }
    let (r0, r1) = base.range();
    let height = r0 - r1;
    if !height.is_finite() || height <= 0.0 {
        return None;
    }

    let p0 = base.map(lo);
    let p1 = base.map(hi);
    let k = height / (p0 - p1);
    if k.is_finite() && k > 0.0 && scale_extent.contains(k) {
        if let Ok(transform) = ZoomTransform::new(0.0, r1 - k * p1, k) {
            return Some(ValueFit::Transform(transform));
        }
    }
    base.with_domain(lo, hi).ok().map(ValueFit::Rebase)
}
