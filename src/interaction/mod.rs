mod debounce;
mod inertia;
mod zoom_behavior;
mod zoom_transform;

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::core::PaneId;

pub use debounce::Debounce;
pub use inertia::{Inertia, InertiaConfig, InertiaEvent, InertiaEvents};
pub use zoom_behavior::{
    ScaleExtent, TranslateExtent, ZoomAxis, ZoomBehavior, ZoomEvent, ZoomEvents, ZoomSource,
};
pub use zoom_transform::ZoomTransform;

/// Unit of a wheel delta, mirroring DOM `WheelEvent.deltaMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WheelDeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

/// One wheel pulse at `point` (surface pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelInput {
    pub point: Point,
    pub delta_y: f64,
    pub delta_mode: WheelDeltaMode,
    /// Pinch-zoom trackpads report as ctrl+wheel and get a steeper curve.
    pub ctrl_key: bool,
}

impl WheelInput {
    #[must_use]
    pub fn new(point: Point, delta_y: f64, delta_mode: WheelDeltaMode) -> Self {
        Self {
            point,
            delta_y,
            delta_mode,
            ctrl_key: false,
        }
    }

    #[must_use]
    pub fn with_ctrl(mut self, ctrl_key: bool) -> Self {
        self.ctrl_key = ctrl_key;
        self
    }

    /// Base-2 exponent of the zoom factor this pulse applies.
    #[must_use]
    pub fn zoom_delta(self) -> f64 {
        let unit = match self.delta_mode {
            WheelDeltaMode::Pixel => 0.002,
            WheelDeltaMode::Line => 0.05,
            WheelDeltaMode::Page => 1.0,
        };
        let boost = if self.ctrl_key { 10.0 } else { 1.0 };
        let delta = -self.delta_y * unit * boost;
        if delta.is_finite() { delta } else { 0.0 }
    }
}

/// Shared crosshair column resolved from the hovered pane.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrosshairState {
    pub visible: bool,
    /// Pane the pointer is over.
    pub pane: Option<PaneId>,
    /// Resolved record index in the hovered pane's data.
    pub index: Option<usize>,
    pub time_ms: Option<f64>,
    /// Value under the pointer in the hovered pane.
    pub value: Option<f64>,
    /// Snapped column (x) and raw pointer row (y) in chart pixels.
    pub x: f64,
    pub y: f64,
}

impl CrosshairState {
    pub fn hide(&mut self) {
        *self = Self::default();
    }
}
