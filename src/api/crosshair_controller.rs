use kurbo::Point;

use crate::core::{Record, index_at_pixel};
use crate::interaction::CrosshairState;
use crate::pane::PaneCrosshair;
use crate::render::RasterContext;

use super::{ChartEngine, ChartEvent, HitTarget};

impl<C: RasterContext> ChartEngine<C> {
    /// Resolves the record under the pointer in the hovered pane and
    /// broadcasts its time to every pane.
    ///
    /// Outside any plot area the crosshair is hidden. Empty data or a
    /// pointer outside the time range yields no index and no crosshair.
    pub(super) fn update_crosshair(&mut self, point: Point) {
        let Some(HitTarget::PlotArea(pane_id)) = self.hit_test(point) else {
            if self.core.runtime.crosshair.pane.is_some() {
                self.clear_crosshair();
                self.emit(ChartEvent::MouseOut);
            }
            return;
        };
        let time = self.time_scale();
        let model = &self.core.model;
        let Some(pane) = model.panes.get(&pane_id) else {
            return;
        };
        let data = if pane.data().is_empty() {
            model.axis_data.as_slice()
        } else {
            pane.data()
        };
        let bounds = pane.bounds();
        let index = index_at_pixel(data, time, point.x - bounds.x);
        let time_ms = index.and_then(|index| data.get(index)).map(Record::time_millis);
        let value = pane.value_at(point.y - bounds.y);
        let x = time_ms.map_or(point.x, |time_ms| bounds.x + time.map_millis(time_ms));

        self.core.runtime.crosshair = CrosshairState {
            visible: index.is_some(),
            pane: Some(pane_id.clone()),
            index,
            time_ms,
            value: Some(value),
            x,
            y: point.y,
        };
        for pane in self.core.model.panes.values_mut() {
            let hovered = pane.id() == &pane_id;
            pane.set_crosshair(PaneCrosshair {
                time_ms,
                value: hovered.then_some(value),
            });
        }
        self.core.runtime.needs_redraw = true;
        self.emit(ChartEvent::MouseMove {
            pane: pane_id,
            index,
            time_ms,
            value,
            x,
            y: point.y,
        });
    }

    pub(super) fn clear_crosshair(&mut self) {
        self.core.runtime.crosshair.hide();
        for pane in self.core.model.panes.values_mut() {
            pane.set_crosshair(PaneCrosshair::default());
        }
        self.core.runtime.needs_redraw = true;
    }
}
