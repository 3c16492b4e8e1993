use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::error::{ChartError, ChartResult};
use crate::interaction::{Debounce, WheelInput, ZoomTransform};

/// Allowed range of the zoom scale `k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleExtent {
    min: f64,
    max: f64,
}

impl ScaleExtent {
    pub const UNBOUNDED: Self = Self {
        min: f64::MIN_POSITIVE,
        max: f64::INFINITY,
    };

    pub fn new(min: f64, max: f64) -> ChartResult<Self> {
        if !min.is_finite() || min <= 0.0 || max.is_nan() || max < min {
            return Err(ChartError::InvalidExtent(format!(
                "scale extent must satisfy 0 < min <= max, got [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn clamp(self, k: f64) -> f64 {
        k.clamp(self.min, self.max)
    }

    #[must_use]
    pub fn contains(self, k: f64) -> bool {
        k >= self.min && k <= self.max
    }
}

impl Default for ScaleExtent {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// World-space rectangle the viewport may not be panned beyond.
/// Infinite bounds disable the constraint on that side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TranslateExtent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl TranslateExtent {
    pub const UNBOUNDED: Self = Self {
        x0: f64::NEG_INFINITY,
        y0: f64::NEG_INFINITY,
        x1: f64::INFINITY,
        y1: f64::INFINITY,
    };

    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> ChartResult<Self> {
        if [x0, y0, x1, y1].iter().any(|value| value.is_nan()) || x1 < x0 || y1 < y0 {
            return Err(ChartError::InvalidExtent(format!(
                "translate extent must be ordered, got [[{x0}, {y0}], [{x1}, {y1}]]"
            )));
        }
        Ok(Self { x0, y0, x1, y1 })
    }
}

impl Default for TranslateExtent {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Which translation axes a drag may move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomAxis {
    X,
    Y,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomSource {
    Pointer,
    Wheel,
    Touch,
    Programmatic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomEvent {
    Start {
        source: ZoomSource,
    },
    Zoom {
        transform: ZoomTransform,
        source: ZoomSource,
    },
    End {
        source: ZoomSource,
    },
}

pub type ZoomEvents = SmallVec<[ZoomEvent; 3]>;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TouchGesture {
    origin: ZoomTransform,
    centroid: Point,
    local_centroid: Point,
    distance: Option<f64>,
}

impl TouchGesture {
    fn begin(origin: ZoomTransform, touches: &[Point]) -> Option<Self> {
        let (centroid, distance) = touch_geometry(touches)?;
        Some(Self {
            origin,
            centroid,
            local_centroid: origin.invert(centroid),
            distance,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Pointer { last: Point },
    Wheel,
    Touch(TouchGesture),
}

impl Gesture {
    fn source(self) -> Option<ZoomSource> {
        match self {
            Gesture::Idle => None,
            Gesture::Pointer { .. } => Some(ZoomSource::Pointer),
            Gesture::Wheel => Some(ZoomSource::Wheel),
            Gesture::Touch(_) => Some(ZoomSource::Touch),
        }
    }
}

/// Current zoom transform of one interactive surface plus the gesture state
/// machine that turns raw input into constrained transform updates.
///
/// `Idle -> Active` emits [`ZoomEvent::Start`], every committed update while
/// active emits [`ZoomEvent::Zoom`], and `Active -> Idle` emits
/// [`ZoomEvent::End`]. Transforms carried by events are always already
/// constrained.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomBehavior {
    transform: ZoomTransform,
    scale_extent: ScaleExtent,
    translate_extent: TranslateExtent,
    extent: Rect,
    axis: ZoomAxis,
    wheel_settle: Debounce,
    gesture: Gesture,
}

impl ZoomBehavior {
    pub const DEFAULT_WHEEL_SETTLE_MS: f64 = 150.0;

    /// `extent` is the viewport rectangle in the surface's local pixels.
    #[must_use]
    pub fn new(extent: Rect, axis: ZoomAxis) -> Self {
        Self {
            transform: ZoomTransform::IDENTITY,
            scale_extent: ScaleExtent::UNBOUNDED,
            translate_extent: TranslateExtent::UNBOUNDED,
            extent,
            axis,
            wheel_settle: Debounce::new(Self::DEFAULT_WHEEL_SETTLE_MS),
            gesture: Gesture::Idle,
        }
    }

    #[must_use]
    pub fn with_scale_extent(mut self, scale_extent: ScaleExtent) -> Self {
        self.scale_extent = scale_extent;
        self.transform = self.constrain(self.transform);
        self
    }

    #[must_use]
    pub fn with_translate_extent(mut self, translate_extent: TranslateExtent) -> Self {
        self.translate_extent = translate_extent;
        self.transform = self.constrain(self.transform);
        self
    }

    #[must_use]
    pub fn with_wheel_settle_ms(mut self, delay_ms: f64) -> Self {
        self.wheel_settle = Debounce::new(delay_ms);
        self
    }

    #[must_use]
    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    #[must_use]
    pub fn scale_extent(&self) -> ScaleExtent {
        self.scale_extent
    }

    #[must_use]
    pub fn translate_extent(&self) -> TranslateExtent {
        self.translate_extent
    }

    #[must_use]
    pub fn extent(&self) -> Rect {
        self.extent
    }

    #[must_use]
    pub fn axis(&self) -> ZoomAxis {
        self.axis
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Replaces the viewport rectangle and re-constrains the current
    /// transform without emitting events.
    pub fn set_extent(&mut self, extent: Rect) {
        self.extent = extent;
        self.transform = self.constrain(self.transform);
    }

    /// Clamps `k` into the scale extent, then shifts the translation so the
    /// translate extent seen through the transform covers the viewport as
    /// far as possible (centered when it is smaller than the viewport).
    #[must_use]
    pub fn constrain(&self, transform: ZoomTransform) -> ZoomTransform {
        let k = self.scale_extent.clamp(transform.k());
        let clamped = if k == transform.k() {
            transform
        } else {
            transform.scale(k / transform.k())
        };

        let extent = self.extent;
        let limits = self.translate_extent;
        let dx0 = clamped.invert_x(extent.x0) - limits.x0;
        let dx1 = clamped.invert_x(extent.x1) - limits.x1;
        let dy0 = clamped.invert_y(extent.y0) - limits.y0;
        let dy1 = clamped.invert_y(extent.y1) - limits.y1;
        clamped.translate(constrain_offset(dx0, dx1), constrain_offset(dy0, dy1))
    }

    /// Transform scaled by `factor` about `anchor` (surface pixels), so the
    /// world point under `anchor` stays put.
    #[must_use]
    pub fn scaled_about(&self, from: ZoomTransform, factor: f64, anchor: Point) -> ZoomTransform {
        let k1 = self.scale_extent.clamp(from.k() * factor);
        let local = from.invert(anchor);
        let Ok(scaled) = ZoomTransform::new(anchor.x - local.x * k1, anchor.y - local.y * k1, k1) else {
            return self.constrain(from);
        };
        self.constrain(scaled)
    }

    /// Commits a transform without emitting events. Returns what was
    /// actually committed after constraining.
    pub fn commit(&mut self, transform: ZoomTransform) -> ZoomTransform {
        self.transform = self.constrain(transform);
        self.transform
    }

    /// Pans by `(dx, dy)` surface pixels, masked by the drag axis, without
    /// emitting events.
    pub fn pan_pixels(&mut self, dx: f64, dy: f64) -> ZoomTransform {
        let (dx, dy) = self.mask(dx, dy);
        let k = self.transform.k();
        self.commit(self.transform.translate(dx / k, dy / k))
    }

    pub fn set_transform(&mut self, transform: ZoomTransform) -> ZoomEvents {
        self.programmatic(transform)
    }

    /// Multiplies the scale by `factor` about `anchor`, or about the
    /// viewport center when no anchor is given.
    pub fn scale_by(&mut self, factor: f64, anchor: Option<Point>) -> ZoomEvents {
        let anchor = anchor.unwrap_or_else(|| self.extent.center());
        let next = self.scaled_about(self.transform, factor, anchor);
        self.programmatic(next)
    }

    /// Translates by `(dx, dy)` in local units (`dx * k` pixels).
    pub fn translate_by(&mut self, dx: f64, dy: f64) -> ZoomEvents {
        let next = self.transform.translate(dx, dy);
        self.programmatic(next)
    }

    pub fn pointer_down(&mut self, point: Point) -> ZoomEvents {
        let mut events = self.finish_gesture();
        self.gesture = Gesture::Pointer { last: point };
        events.push(ZoomEvent::Start {
            source: ZoomSource::Pointer,
        });
        events
    }

    pub fn pointer_move(&mut self, point: Point) -> ZoomEvents {
        let mut events = ZoomEvents::new();
        let Gesture::Pointer { last } = self.gesture else {
            return events;
        };
        self.gesture = Gesture::Pointer { last: point };
        let transform = self.pan_pixels(point.x - last.x, point.y - last.y);
        trace!(x = transform.x(), y = transform.y(), k = transform.k(), "drag zoom update");
        events.push(ZoomEvent::Zoom {
            transform,
            source: ZoomSource::Pointer,
        });
        events
    }

    pub fn pointer_up(&mut self) -> ZoomEvents {
        if matches!(self.gesture, Gesture::Pointer { .. }) {
            self.finish_gesture()
        } else {
            ZoomEvents::new()
        }
    }

    /// Scales about the wheel position. Consecutive wheel events within the
    /// settle delay share one gesture; [`Self::tick`] ends it.
    pub fn wheel(&mut self, input: WheelInput, now_ms: f64) -> ZoomEvents {
        let mut events = ZoomEvents::new();
        match self.gesture {
            Gesture::Pointer { .. } | Gesture::Touch(_) => return events,
            Gesture::Idle => {
                self.gesture = Gesture::Wheel;
                events.push(ZoomEvent::Start {
                    source: ZoomSource::Wheel,
                });
            }
            Gesture::Wheel => {}
        }
        self.wheel_settle.arm(now_ms);

        let factor = input.zoom_delta().exp2();
        let next = self.scaled_about(self.transform, factor, input.point);
        if next != self.transform {
            self.transform = next;
            trace!(k = next.k(), "wheel zoom update");
            events.push(ZoomEvent::Zoom {
                transform: next,
                source: ZoomSource::Wheel,
            });
        }
        events
    }

    /// Advances host-clocked timers; ends a settled wheel gesture.
    pub fn tick(&mut self, now_ms: f64) -> ZoomEvents {
        if self.wheel_settle.poll(now_ms) && self.gesture == Gesture::Wheel {
            return self.finish_gesture();
        }
        ZoomEvents::new()
    }

    pub fn touch_start(&mut self, touches: &[Point]) -> ZoomEvents {
        let mut events = ZoomEvents::new();
        let Some(gesture) = TouchGesture::begin(self.transform, touches) else {
            return events;
        };
        if !matches!(self.gesture, Gesture::Touch(_)) {
            events = self.finish_gesture();
            events.push(ZoomEvent::Start {
                source: ZoomSource::Touch,
            });
        }
        self.gesture = Gesture::Touch(gesture);
        events
    }

    /// Pinch scale comes from the ratio of current to initial two-finger
    /// distance; panning follows the centroid.
    pub fn touch_move(&mut self, touches: &[Point]) -> ZoomEvents {
        let mut events = ZoomEvents::new();
        let Gesture::Touch(gesture) = self.gesture else {
            return events;
        };
        let Some((centroid, distance)) = touch_geometry(touches) else {
            return events;
        };

        let factor = match (gesture.distance, distance) {
            (Some(d0), Some(d1)) if d0 > 0.0 => d1 / d0,
            _ => 1.0,
        };
        let scaled = self.scaled_about(gesture.origin, factor, gesture.centroid);
        let (dx, dy) = self.mask(centroid.x - gesture.centroid.x, centroid.y - gesture.centroid.y);
        let k = scaled.k();
        let transform = self.commit(scaled.translate(dx / k, dy / k));
        events.push(ZoomEvent::Zoom {
            transform,
            source: ZoomSource::Touch,
        });
        events
    }

    /// `remaining` are the touches still down; the gesture ends when none
    /// are left and restarts from the current transform otherwise.
    pub fn touch_end(&mut self, remaining: &[Point]) -> ZoomEvents {
        if !matches!(self.gesture, Gesture::Touch(_)) {
            return ZoomEvents::new();
        }
        match TouchGesture::begin(self.transform, remaining) {
            Some(gesture) => {
                self.gesture = Gesture::Touch(gesture);
                ZoomEvents::new()
            }
            None => self.finish_gesture(),
        }
    }

    /// Doubles the scale about `point`.
    pub fn double_click(&mut self, point: Point) -> ZoomEvents {
        let mut events = self.finish_gesture();
        let next = self.scaled_about(self.transform, 2.0, point);
        self.transform = next;
        events.push(ZoomEvent::Start {
            source: ZoomSource::Pointer,
        });
        events.push(ZoomEvent::Zoom {
            transform: next,
            source: ZoomSource::Pointer,
        });
        events.push(ZoomEvent::End {
            source: ZoomSource::Pointer,
        });
        events
    }

    /// Ends any gesture in progress and cancels pending timers.
    pub fn cancel(&mut self) -> ZoomEvents {
        self.finish_gesture()
    }

    fn programmatic(&mut self, transform: ZoomTransform) -> ZoomEvents {
        let transform = self.commit(transform);
        let mut events = ZoomEvents::new();
        let zoom = ZoomEvent::Zoom {
            transform,
            source: ZoomSource::Programmatic,
        };
        if self.is_active() {
            events.push(zoom);
        } else {
            events.push(ZoomEvent::Start {
                source: ZoomSource::Programmatic,
            });
            events.push(zoom);
            events.push(ZoomEvent::End {
                source: ZoomSource::Programmatic,
            });
        }
        events
    }

    fn finish_gesture(&mut self) -> ZoomEvents {
        let mut events = ZoomEvents::new();
        self.wheel_settle.cancel();
        if let Some(source) = self.gesture.source() {
            events.push(ZoomEvent::End { source });
        }
        self.gesture = Gesture::Idle;
        events
    }

    fn mask(&self, dx: f64, dy: f64) -> (f64, f64) {
        match self.axis {
            ZoomAxis::X => (dx, 0.0),
            ZoomAxis::Y => (0.0, dy),
            ZoomAxis::Both => (dx, dy),
        }
    }
}

fn constrain_offset(d0: f64, d1: f64) -> f64 {
    if d1 > d0 {
        return (d0 + d1) / 2.0;
    }
    let low = d0.min(0.0);
    if low != 0.0 { low } else { d1.max(0.0) }
}

/// Centroid of the first two touches and their distance (if two exist).
fn touch_geometry(touches: &[Point]) -> Option<(Point, Option<f64>)> {
    match touches {
        [] => None,
        [only] => Some((*only, None)),
        [a, b, ..] => Some((a.midpoint(*b), Some(a.distance(*b)))),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use kurbo::{Point, Rect};

    use super::{ScaleExtent, TranslateExtent, ZoomAxis, ZoomBehavior, ZoomEvent, ZoomSource};
    use crate::interaction::{WheelDeltaMode, WheelInput, ZoomTransform};

    fn behavior() -> ZoomBehavior {
        ZoomBehavior::new(Rect::new(0.0, 0.0, 100.0, 100.0), ZoomAxis::Both)
    }

    #[test]
    fn scale_by_holds_the_anchor_fixed() {
        let mut zoom = behavior();
        let anchor = Point::new(30.0, 70.0);
        let before = zoom.transform().invert(anchor);
        zoom.scale_by(3.0, Some(anchor));
        let after = zoom.transform().invert(anchor);
        assert_relative_eq!(before.x, after.x, epsilon = 1e-9);
        assert_relative_eq!(before.y, after.y, epsilon = 1e-9);
        assert_relative_eq!(zoom.transform().k(), 3.0);
    }

    #[test]
    fn scale_is_clamped_to_the_extent() {
        let mut zoom = behavior().with_scale_extent(ScaleExtent::new(0.5, 4.0).expect("extent"));
        zoom.scale_by(100.0, None);
        assert_relative_eq!(zoom.transform().k(), 4.0);
        zoom.scale_by(1e-6, None);
        assert_relative_eq!(zoom.transform().k(), 0.5);
    }

    #[test]
    fn translate_extent_keeps_world_bounds_on_screen() {
        let mut zoom = behavior()
            .with_translate_extent(TranslateExtent::new(0.0, 0.0, 100.0, 100.0).expect("extent"));
        zoom.translate_by(50.0, 0.0);
        assert_relative_eq!(zoom.transform().x(), 0.0);

        zoom.scale_by(2.0, Some(Point::new(0.0, 0.0)));
        zoom.translate_by(-80.0, 0.0);
        // world x in [0, 100] at k = 2 spans 200px; the right edge stops at 100px
        assert_relative_eq!(zoom.transform().x(), -100.0);
    }

    #[test]
    fn smaller_translate_extent_is_centered() {
        let zoom = behavior()
            .with_translate_extent(TranslateExtent::new(0.0, 0.0, 50.0, 50.0).expect("extent"));
        let centered = zoom.constrain(ZoomTransform::new(-30.0, 10.0, 1.0).expect("transform"));
        assert_relative_eq!(centered.x(), 25.0);
        assert_relative_eq!(centered.y(), 25.0);
    }

    #[test]
    fn drag_emits_start_zoom_end_and_respects_axis_mask() {
        let mut zoom = ZoomBehavior::new(Rect::new(0.0, 0.0, 100.0, 100.0), ZoomAxis::X);
        let start = zoom.pointer_down(Point::new(10.0, 10.0));
        assert_eq!(
            start.as_slice(),
            &[ZoomEvent::Start {
                source: ZoomSource::Pointer
            }]
        );
        let moved = zoom.pointer_move(Point::new(25.0, 40.0));
        let ZoomEvent::Zoom { transform, .. } = moved[0] else {
            panic!("expected zoom event");
        };
        assert_eq!(transform.to_tuple(), (15.0, 0.0, 1.0));
        let end = zoom.pointer_up();
        assert_eq!(
            end.as_slice(),
            &[ZoomEvent::End {
                source: ZoomSource::Pointer
            }]
        );
        assert!(!zoom.is_active());
    }

    #[test]
    fn wheel_events_coalesce_until_settled() {
        let mut zoom = behavior();
        let input = WheelInput::new(Point::new(50.0, 50.0), -100.0, WheelDeltaMode::Pixel);
        let first = zoom.wheel(input, 0.0);
        assert_eq!(first.len(), 2);
        let second = zoom.wheel(input, 100.0);
        assert_eq!(second.len(), 1);
        assert!(zoom.tick(200.0).is_empty());
        let end = zoom.tick(260.0);
        assert_eq!(
            end.as_slice(),
            &[ZoomEvent::End {
                source: ZoomSource::Wheel
            }]
        );
        // two pulses of 2^0.2 each
        assert_relative_eq!(zoom.transform().k(), 0.4_f64.exp2(), epsilon = 1e-12);
    }

    #[test]
    fn pinch_scales_by_distance_ratio_about_the_centroid() {
        let mut zoom = behavior();
        zoom.touch_start(&[Point::new(40.0, 50.0), Point::new(60.0, 50.0)]);
        zoom.touch_move(&[Point::new(30.0, 50.0), Point::new(70.0, 50.0)]);
        let t = zoom.transform();
        assert_relative_eq!(t.k(), 2.0);
        assert_relative_eq!(t.apply_x(50.0), 50.0);
        let end = zoom.touch_end(&[]);
        assert_eq!(end.len(), 1);
    }

    #[test]
    fn programmatic_update_during_gesture_only_emits_zoom() {
        let mut zoom = behavior();
        zoom.pointer_down(Point::ORIGIN);
        let events = zoom.translate_by(1.0, 1.0);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ZoomEvent::Zoom { .. }));
        assert_eq!(zoom.cancel().len(), 1);
    }

    #[test]
    fn double_click_zooms_in_about_the_point() {
        let mut zoom = behavior();
        let events = zoom.double_click(Point::new(20.0, 20.0));
        assert_eq!(events.len(), 3);
        assert_relative_eq!(zoom.transform().k(), 2.0);
        assert_relative_eq!(zoom.transform().apply_x(20.0), 20.0);
    }

    #[test]
    fn malformed_extents_are_rejected() {
        assert!(ScaleExtent::new(0.0, 1.0).is_err());
        assert!(ScaleExtent::new(2.0, 1.0).is_err());
        assert!(TranslateExtent::new(1.0, 0.0, 0.0, 1.0).is_err());
    }
}
