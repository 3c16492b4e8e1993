use tracing::debug;

use crate::core::{ChartLayout, PaneId, TimeScale, Viewport};
use crate::interaction::{CrosshairState, ZoomTransform};
use crate::pane::Pane;
use crate::render::RasterContext;

use super::{ChartEngineConfig, engine_core::EngineCore};

/// Multi-pane chart orchestrator consumed by host applications.
///
/// `ChartEngine` owns the shared time axis, the pane stack, input routing and
/// the raster context everything is painted onto.
pub struct ChartEngine<C: RasterContext> {
    pub(super) context: C,
    pub(super) core: EngineCore,
}

impl<C: RasterContext> ChartEngine<C> {
    #[must_use]
    pub fn config(&self) -> &ChartEngineConfig {
        &self.core.model.config
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.core.model.viewport
    }

    #[must_use]
    pub fn pixel_ratio(&self) -> f64 {
        self.core.model.pixel_ratio
    }

    #[must_use]
    pub fn layout(&self) -> &ChartLayout {
        &self.core.model.layout
    }

    #[must_use]
    pub fn panes(&self) -> impl Iterator<Item = &Pane> {
        self.core.model.panes.values()
    }

    #[must_use]
    pub fn pane(&self, pane_id: &PaneId) -> Option<&Pane> {
        self.core.model.panes.get(pane_id)
    }

    #[must_use]
    pub fn pane_count(&self) -> usize {
        self.core.model.panes.len()
    }

    /// `true` while the newest record is held at a fixed right offset.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.core.model.is_pinned
    }

    #[must_use]
    pub fn time_transform(&self) -> ZoomTransform {
        self.core.model.time_zoom.transform()
    }

    #[must_use]
    pub fn base_time_scale(&self) -> TimeScale {
        self.core.model.base_time_scale
    }

    /// Shared time scale after zoom/pan, range `[0, plot_width]`.
    #[must_use]
    pub fn time_scale(&self) -> TimeScale {
        self.core.model.visible_time_scale()
    }

    #[must_use]
    pub fn visible_time_window(&self) -> (f64, f64) {
        self.time_scale().domain_millis()
    }

    #[must_use]
    pub fn interval_px(&self) -> f64 {
        self.core.model.interval_px()
    }

    #[must_use]
    pub fn crosshair(&self) -> &CrosshairState {
        &self.core.runtime.crosshair
    }

    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.core.runtime.needs_redraw
    }

    /// `true` while a gesture, wheel burst or inertia animation is running.
    #[must_use]
    pub fn is_interacting(&self) -> bool {
        self.core.model.is_interacting()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.core.model.disposed
    }

    #[must_use]
    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    #[must_use]
    pub fn into_context(self) -> C {
        self.context
    }

    /// Cancels gestures and timers, disposes every pane and releases the
    /// raster context. Every later call is a no-op.
    pub fn dispose(&mut self) {
        if self.core.model.disposed {
            return;
        }
        let model = &mut self.core.model;
        model.time_zoom.cancel();
        model.time_inertia.stop();
        for pane in model.panes.values_mut() {
            pane.dispose();
        }
        model.disposed = true;

        let runtime = &mut self.core.runtime;
        runtime.capture = None;
        runtime.resize_throttle.cancel();
        runtime.pending_resize = None;
        runtime.crosshair.hide();
        runtime.needs_redraw = false;

        self.context.release();
        debug!("dispose chart engine");
    }
}
