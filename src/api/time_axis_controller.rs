use kurbo::Point;
use tracing::{debug, trace};

use crate::interaction::{InertiaEvent, InertiaEvents, ZoomEvent, ZoomEvents, ZoomSource, ZoomTransform};
use crate::render::RasterContext;

use super::ChartEngine;

impl<C: RasterContext> ChartEngine<C> {
    /// Shows the newest `initial_visible_intervals` intervals with the latest
    /// record pinned at the right offset, and refits every pane.
    pub fn reset(&mut self) {
        if self.core.model.disposed {
            return;
        }
        let model = &mut self.core.model;
        model.time_zoom.cancel();
        model.time_inertia.stop();

        let interval_ms = model.config.interval.duration_ms();
        let span = interval_ms * model.config.initial_visible_intervals as f64;
        if let Some(latest) = model.latest_time_ms() {
            let end = latest + model.config.right_offset_intervals * interval_ms;
            match model.base_time_scale.with_domain_millis(end - span, end) {
                Ok(scale) => model.base_time_scale = scale,
                Err(err) => trace!(error = %err, "time domain reset skipped"),
            }
        }
        model.time_zoom.commit(ZoomTransform::IDENTITY);
        self.set_pinned(true);

        let window = self.visible_time_window();
        for pane in self.core.model.panes.values_mut() {
            pane.reset_value_axis(window);
        }
        self.core.runtime.fetch.settle();
        self.core.runtime.needs_redraw = true;
        debug!(start_ms = window.0, end_ms = window.1, "reset chart view");
    }

    /// Shifts the time axis by `intervals` candle intervals; positive values
    /// move towards newer data. Moving back in time unpins.
    pub fn pan_by(&mut self, intervals: f64) {
        if self.core.model.disposed || !intervals.is_finite() || intervals == 0.0 {
            return;
        }
        if intervals < 0.0 {
            self.set_pinned(false);
        }
        let model = &mut self.core.model;
        model.time_inertia.stop();
        let dx = -intervals * model.interval_px();
        let before = model.time_zoom.transform();
        let events = model.time_zoom.translate_by(dx / before.k(), 0.0);
        self.handle_time_zoom_events(events, before);
    }

    /// Zooms the time axis in by `2^delta`, anchored on the latest record
    /// while pinned and on the plot center otherwise.
    pub fn zoom_in(&mut self, delta: f64) {
        self.zoom_time_by(2f64.powf(delta));
    }

    pub fn zoom_out(&mut self, delta: f64) {
        self.zoom_time_by(2f64.powf(-delta));
    }

    fn zoom_time_by(&mut self, factor: f64) {
        if self.core.model.disposed || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let model = &mut self.core.model;
        model.time_inertia.stop();
        let anchor_x = match model.latest_time_ms() {
            Some(latest) if model.is_pinned => model.visible_time_scale().map_millis(latest),
            _ => model.layout.plot_width / 2.0,
        };
        let before = model.time_zoom.transform();
        let events = model.time_zoom.scale_by(factor, Some(Point::new(anchor_x, 0.0)));
        self.handle_time_zoom_events(events, before);
    }

    /// While pinned, translates the time transform so the newest record sits
    /// `right_offset_intervals` from the right edge at the current zoom.
    pub(super) fn resolve_time_transform(&mut self) {
        let model = &mut self.core.model;
        if !model.is_pinned {
            return;
        }
        let Some(latest) = model.latest_time_ms() else {
            return;
        };
        let current = model.time_zoom.transform();
        let k = current.k();
        let base = model.base_time_scale;
        let offset_px =
            model.config.right_offset_intervals * k * base.pixels_per(model.config.interval.duration_ms());
        let x = model.layout.plot_width - offset_px - k * base.map_millis(latest);
        match ZoomTransform::new(x, current.y(), k) {
            Ok(pinned) if pinned != current => {
                model.time_zoom.commit(pinned);
            }
            Ok(_) => {}
            Err(err) => trace!(error = %err, "pinned transform skipped"),
        }
    }

    pub(super) fn set_pinned(&mut self, pinned: bool) {
        if self.core.model.is_pinned != pinned {
            debug!(pinned, "time axis pin changed");
            self.core.model.is_pinned = pinned;
        }
    }

    /// Reacts to time zoom events; `before` is the transform before the
    /// input that produced them. A pointer or touch zoom that keeps `k` but
    /// moves `x` is a pure pan and unpins the axis.
    pub(super) fn handle_time_zoom_events(&mut self, events: ZoomEvents, before: ZoomTransform) {
        for event in events {
            match event {
                ZoomEvent::Start { source } => {
                    trace!(?source, "time zoom start");
                }
                ZoomEvent::Zoom { transform, source } => {
                    trace!(
                        x = transform.x(),
                        k = transform.k(),
                        ?source,
                        "time zoom"
                    );
                    if matches!(source, ZoomSource::Pointer | ZoomSource::Touch)
                        && transform.k() == before.k()
                        && transform.x() != before.x()
                    {
                        self.set_pinned(false);
                    }
                    self.core.runtime.needs_redraw = true;
                }
                ZoomEvent::End { source } => {
                    trace!(?source, "time zoom end");
                    self.core.runtime.fetch.settle();
                    self.core.runtime.needs_redraw = true;
                }
            }
        }
    }

    pub(super) fn handle_time_inertia_events(&mut self, events: InertiaEvents) {
        for event in events {
            match event {
                InertiaEvent::Render { dx, .. } => {
                    if dx != 0.0 {
                        self.core.model.time_zoom.pan_pixels(dx, 0.0);
                        self.set_pinned(false);
                        self.core.runtime.needs_redraw = true;
                    }
                }
                InertiaEvent::Finish => {
                    trace!("time inertia finished");
                    self.core.runtime.fetch.settle();
                    self.core.runtime.needs_redraw = true;
                }
                InertiaEvent::Stop => {
                    trace!("time inertia stopped");
                }
            }
        }
    }
}
