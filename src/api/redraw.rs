use tracing::trace;

use crate::error::ChartResult;
use crate::render::RasterContext;

use super::{ChartEngine, ChartEvent};

impl<C: RasterContext> ChartEngine<C> {
    /// Paints one frame.
    ///
    /// Order: resolve the time transform (re-pin), refit every pane that is
    /// not in free-pan, paint the plot scene, paint the axis scene on top,
    /// then notify listeners and check whether older data is needed.
    pub fn redraw(&mut self) -> ChartResult<()> {
        if self.core.model.disposed || self.context.is_released() {
            return Ok(());
        }

        self.resolve_time_transform();
        let window = self.visible_time_window();
        for pane in self.core.model.panes.values_mut() {
            pane.recalculate(window);
        }

        self.refresh_scene()?;
        let presentation = &self.core.presentation;
        let plot = presentation
            .renderer
            .render(&mut self.context, &presentation.plot_scene)?;
        let axes = presentation
            .renderer
            .render_overlay(&mut self.context, &presentation.axis_scene)?;
        trace!(
            nodes = plot.nodes_visited + axes.nodes_visited,
            fills = plot.fills + axes.fills,
            strokes = plot.strokes + axes.strokes,
            texts = plot.texts + axes.texts,
            "redraw"
        );
        self.core.runtime.needs_redraw = false;

        self.emit(ChartEvent::Redraw);
        if self.core.runtime.last_visible_window != Some(window) {
            self.core.runtime.last_visible_window = Some(window);
            self.emit(ChartEvent::ViewportChanged {
                start_ms: window.0,
                end_ms: window.1,
                is_pinned: self.core.model.is_pinned,
            });
        }
        self.maybe_request_fetch();
        Ok(())
    }
}
