use crate::core::{PaneId, Viewport};
use crate::interaction::{CrosshairState, Debounce};

use super::ChartListener;
use super::data_fetch::FetchGate;

/// Element that owns the pointer between a press and its release.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum PointerCapture {
    /// Plot area or time axis: drags pan the shared time axis.
    TimeAxis,
    ValueAxis(PaneId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PendingResize {
    pub(super) viewport: Viewport,
    pub(super) pixel_ratio: f64,
}

/// Runtime orchestration state grouped separately from model/presentation.
pub(super) struct ChartRuntimeState {
    pub(super) listeners: Vec<Box<dyn ChartListener>>,
    pub(super) fetch: FetchGate,
    pub(super) capture: Option<PointerCapture>,
    pub(super) resize_throttle: Debounce,
    pub(super) pending_resize: Option<PendingResize>,
    pub(super) crosshair: CrosshairState,
    pub(super) needs_redraw: bool,
    pub(super) last_visible_window: Option<(f64, f64)>,
}

impl ChartRuntimeState {
    #[must_use]
    pub(super) fn new(resize_throttle_ms: f64) -> Self {
        Self {
            listeners: Vec::new(),
            fetch: FetchGate::default(),
            capture: None,
            resize_throttle: Debounce::new(resize_throttle_ms),
            pending_resize: None,
            crosshair: CrosshairState::default(),
            needs_redraw: true,
            last_visible_window: None,
        }
    }
}
