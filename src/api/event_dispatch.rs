use tracing::warn;

use crate::render::RasterContext;

use super::{ChartContext, ChartEngine, ChartEvent};

impl<C: RasterContext> ChartEngine<C> {
    pub(super) fn chart_context(&self) -> ChartContext {
        ChartContext {
            viewport: self.core.model.viewport,
            pixel_ratio: self.core.model.pixel_ratio,
            visible_time_window: self.visible_time_window(),
            is_pinned: self.core.model.is_pinned,
            pane_count: self.core.model.panes.len(),
            crosshair: self.core.runtime.crosshair.clone(),
        }
    }

    /// Delivers `event` to every listener in registration order. A failing
    /// listener is logged and does not stop delivery to the others.
    pub(super) fn emit(&mut self, event: ChartEvent) {
        if self.core.runtime.listeners.is_empty() {
            return;
        }
        let context = self.chart_context();
        for listener in &mut self.core.runtime.listeners {
            if let Err(err) = listener.on_event(&event, &context) {
                warn!(listener = listener.id(), error = %err, "chart listener failed");
            }
        }
    }
}
