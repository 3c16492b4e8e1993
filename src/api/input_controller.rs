use kurbo::Point;
use tracing::{debug, trace};

use crate::core::{PaneId, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::interaction::{WheelInput, ZoomEvents};
use crate::render::RasterContext;
use crate::scene::hit_test;

use super::chart_runtime::{PendingResize, PointerCapture};
use super::{ChartEngine, ChartEvent, HitTarget};

impl<C: RasterContext> ChartEngine<C> {
    /// Interactive region under `point` (chart pixels). Axis strips sit on
    /// top of the plot areas.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<HitTarget> {
        let presentation = &self.core.presentation;
        hit_test(&presentation.axis_scene, point)
            .or_else(|| hit_test(&presentation.plot_scene, point))
            .map(|hit| hit.payload)
    }

    pub fn pointer_down(&mut self, point: Point, now_ms: f64) {
        if self.core.model.disposed {
            return;
        }
        match self.hit_test(point) {
            Some(HitTarget::PlotArea(_) | HitTarget::TimeAxis) => {
                let model = &mut self.core.model;
                if model.time_inertia.start(point, now_ms).is_some() {
                    trace!("time inertia interrupted by pointer");
                }
                let before = model.time_zoom.transform();
                let events = model.time_zoom.pointer_down(point);
                self.core.runtime.capture = Some(PointerCapture::TimeAxis);
                self.handle_time_zoom_events(events, before);
            }
            Some(HitTarget::ValueAxis(pane_id)) => {
                let Some(local) = self.pane_local_point(&pane_id, point) else {
                    return;
                };
                let events = match self.core.model.panes.get_mut(&pane_id) {
                    Some(pane) => pane.value_axis_pointer_down(local, now_ms),
                    None => return,
                };
                self.core.runtime.capture = Some(PointerCapture::ValueAxis(pane_id));
                self.handle_value_zoom_events(&events);
            }
            None => {}
        }
    }

    /// Routes a move to the captured element, then updates the crosshair.
    pub fn pointer_move(&mut self, point: Point, now_ms: f64) {
        if self.core.model.disposed {
            return;
        }
        match self.core.runtime.capture.clone() {
            Some(PointerCapture::TimeAxis) => {
                let model = &mut self.core.model;
                model.time_inertia.track(point, now_ms);
                let before = model.time_zoom.transform();
                let events = model.time_zoom.pointer_move(point);
                self.handle_time_zoom_events(events, before);
            }
            Some(PointerCapture::ValueAxis(pane_id)) => {
                if let Some(local) = self.pane_local_point(&pane_id, point) {
                    if let Some(pane) = self.core.model.panes.get_mut(&pane_id) {
                        let events = pane.value_axis_pointer_move(local, now_ms);
                        self.handle_value_zoom_events(&events);
                    }
                }
            }
            None => {}
        }
        self.update_crosshair(point);
    }

    /// Releases the pointer capture; a fast time-axis drag hands over to
    /// inertia.
    pub fn pointer_up(&mut self, now_ms: f64) {
        if self.core.model.disposed {
            return;
        }
        match self.core.runtime.capture.take() {
            Some(PointerCapture::TimeAxis) => {
                let model = &mut self.core.model;
                if model.time_inertia.release(now_ms) {
                    trace!("time inertia started");
                }
                let before = model.time_zoom.transform();
                let events = model.time_zoom.pointer_up();
                self.handle_time_zoom_events(events, before);
            }
            Some(PointerCapture::ValueAxis(pane_id)) => {
                if let Some(pane) = self.core.model.panes.get_mut(&pane_id) {
                    let events = pane.value_axis_pointer_up(now_ms);
                    self.handle_value_zoom_events(&events);
                }
            }
            None => {}
        }
    }

    /// Pointer left the surface: hides the crosshair. A drag in progress
    /// keeps its capture until `pointer_up`.
    pub fn pointer_leave(&mut self) {
        if self.core.model.disposed {
            return;
        }
        self.clear_crosshair();
        self.emit(ChartEvent::MouseOut);
    }

    pub fn wheel(&mut self, input: WheelInput, now_ms: f64) {
        if self.core.model.disposed {
            return;
        }
        match self.hit_test(input.point) {
            Some(HitTarget::PlotArea(_) | HitTarget::TimeAxis) => {
                let model = &mut self.core.model;
                model.time_inertia.stop();
                let before = model.time_zoom.transform();
                let events = model.time_zoom.wheel(input, now_ms);
                self.handle_time_zoom_events(events, before);
            }
            Some(HitTarget::ValueAxis(pane_id)) => {
                let Some(local) = self.pane_local_point(&pane_id, input.point) else {
                    return;
                };
                if let Some(pane) = self.core.model.panes.get_mut(&pane_id) {
                    let events = pane.value_axis_wheel(
                        WheelInput {
                            point: local,
                            ..input
                        },
                        now_ms,
                    );
                    self.handle_value_zoom_events(&events);
                }
            }
            None => {}
        }
    }

    /// Touches inside a plot area or the time axis pan and pinch-zoom time.
    pub fn touch_start(&mut self, touches: &[Point], now_ms: f64) {
        if self.core.model.disposed {
            return;
        }
        let Some(first) = touches.first() else {
            return;
        };
        if self.core.runtime.capture.is_none()
            && !matches!(
                self.hit_test(*first),
                Some(HitTarget::PlotArea(_) | HitTarget::TimeAxis)
            )
        {
            return;
        }
        let model = &mut self.core.model;
        if let [only] = touches {
            model.time_inertia.start(*only, now_ms);
        } else {
            model.time_inertia.stop();
        }
        let before = model.time_zoom.transform();
        let events = model.time_zoom.touch_start(touches);
        self.core.runtime.capture = Some(PointerCapture::TimeAxis);
        self.handle_time_zoom_events(events, before);
    }

    pub fn touch_move(&mut self, touches: &[Point], now_ms: f64) {
        if self.core.model.disposed || self.core.runtime.capture != Some(PointerCapture::TimeAxis) {
            return;
        }
        let model = &mut self.core.model;
        if let [only] = touches {
            model.time_inertia.track(*only, now_ms);
        }
        let before = model.time_zoom.transform();
        let events = model.time_zoom.touch_move(touches);
        self.handle_time_zoom_events(events, before);
    }

    /// `remaining` are the touches still down after the release.
    pub fn touch_end(&mut self, remaining: &[Point], now_ms: f64) {
        if self.core.model.disposed || self.core.runtime.capture != Some(PointerCapture::TimeAxis) {
            return;
        }
        let model = &mut self.core.model;
        if remaining.is_empty() {
            if model.time_inertia.release(now_ms) {
                trace!("time inertia started");
            }
        } else {
            model.time_inertia.stop();
        }
        let before = model.time_zoom.transform();
        let events = model.time_zoom.touch_end(remaining);
        if remaining.is_empty() {
            self.core.runtime.capture = None;
        }
        self.handle_time_zoom_events(events, before);
    }

    /// Double-click on a pane or its value axis leaves free-pan and refits
    /// that pane; on the time axis it zooms time in about the click.
    pub fn double_click(&mut self, point: Point) {
        if self.core.model.disposed {
            return;
        }
        let pane = match self.hit_test(point) {
            Some(HitTarget::PlotArea(pane_id) | HitTarget::ValueAxis(pane_id)) => {
                if let Err(err) = self.reset_pane(&pane_id) {
                    trace!(error = %err, "double click reset skipped");
                }
                Some(pane_id)
            }
            Some(HitTarget::TimeAxis) => {
                let model = &mut self.core.model;
                model.time_inertia.stop();
                let before = model.time_zoom.transform();
                let events = model.time_zoom.double_click(point);
                self.handle_time_zoom_events(events, before);
                None
            }
            None => None,
        };
        self.emit(ChartEvent::DblClick {
            pane,
            x: point.x,
            y: point.y,
        });
    }

    pub fn context_menu(&mut self, point: Point) {
        if self.core.model.disposed {
            return;
        }
        let pane = match self.hit_test(point) {
            Some(HitTarget::PlotArea(pane_id) | HitTarget::ValueAxis(pane_id)) => Some(pane_id),
            Some(HitTarget::TimeAxis) | None => None,
        };
        self.emit(ChartEvent::ContextMenu {
            pane,
            x: point.x,
            y: point.y,
        });
    }

    /// Leaves free-pan on one pane and refits its value axis to the visible
    /// time window.
    pub fn reset_pane(&mut self, pane_id: &PaneId) -> ChartResult<()> {
        let window = self.visible_time_window();
        let pane = self
            .core
            .model
            .panes
            .get_mut(pane_id)
            .ok_or_else(|| ChartError::UnknownPane(pane_id.to_string()))?;
        pane.reset_value_axis(window);
        if self.core.runtime.capture == Some(PointerCapture::ValueAxis(pane_id.clone())) {
            self.core.runtime.capture = None;
        }
        self.core.runtime.needs_redraw = true;
        Ok(())
    }

    /// Resizes the surface. The first call in a burst applies at once; later
    /// calls within `resize_throttle_ms` are folded into one trailing resize
    /// applied by [`Self::tick`].
    pub fn resize(&mut self, viewport: Viewport, pixel_ratio: f64, now_ms: f64) -> ChartResult<()> {
        if self.core.model.disposed {
            return Ok(());
        }
        if !viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
            return Err(ChartError::InvalidExtent(
                "device pixel ratio must be finite and > 0".to_owned(),
            ));
        }
        self.core.model.config.axis_strips().validate(viewport)?;

        let pending = PendingResize {
            viewport,
            pixel_ratio,
        };
        let runtime = &mut self.core.runtime;
        if runtime.resize_throttle.is_armed() {
            runtime.pending_resize = Some(pending);
            return Ok(());
        }
        runtime.resize_throttle.arm(now_ms);
        self.apply_resize(pending)
    }

    /// Advances wheel-settle timers, inertia animations and the resize
    /// throttle to `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> ChartResult<()> {
        if self.core.model.disposed {
            return Ok(());
        }
        let model = &mut self.core.model;
        let before = model.time_zoom.transform();
        let zoom_events = model.time_zoom.tick(now_ms);
        let inertia_events = model.time_inertia.tick(now_ms);
        let mut panes_changed = false;
        for pane in model.panes.values_mut() {
            panes_changed |= pane.tick(now_ms);
        }
        self.handle_time_zoom_events(zoom_events, before);
        self.handle_time_inertia_events(inertia_events);
        if panes_changed {
            self.core.runtime.needs_redraw = true;
        }

        let runtime = &mut self.core.runtime;
        if runtime.resize_throttle.poll(now_ms) {
            if let Some(pending) = runtime.pending_resize.take() {
                runtime.resize_throttle.arm(now_ms);
                self.apply_resize(pending)?;
            }
        }
        Ok(())
    }

    /// Ticks, then redraws when anything changed. Returns `true` when a
    /// frame was painted.
    pub fn frame(&mut self, now_ms: f64) -> ChartResult<bool> {
        self.tick(now_ms)?;
        if !self.core.runtime.needs_redraw || self.core.model.disposed {
            return Ok(false);
        }
        self.redraw()?;
        Ok(true)
    }

    fn apply_resize(&mut self, pending: PendingResize) -> ChartResult<()> {
        let PendingResize {
            viewport,
            pixel_ratio,
        } = pending;
        self.core.presentation.renderer.resize(
            &mut self.context,
            f64::from(viewport.width),
            f64::from(viewport.height),
            pixel_ratio,
        )?;
        let model = &mut self.core.model;
        model.viewport = viewport;
        model.pixel_ratio = pixel_ratio;
        model.relayout();
        debug!(
            width = viewport.width,
            height = viewport.height,
            pixel_ratio,
            "resize chart"
        );

        self.sync_scene_nodes()?;
        self.clear_crosshair();
        self.core.runtime.fetch.settle();
        self.core.runtime.needs_redraw = true;
        self.emit(ChartEvent::BoundsChanged {
            width: viewport.width,
            height: viewport.height,
            pixel_ratio,
        });
        Ok(())
    }

    /// Converts a chart point into the pane's local frame (origin at the
    /// pane's top-left, x relative to its value axis).
    fn pane_local_point(&self, pane_id: &PaneId, point: Point) -> Option<Point> {
        let pane = self.core.model.panes.get(pane_id)?;
        Some(Point::new(
            point.x - pane.value_axis_bounds().x,
            point.y - pane.bounds().y,
        ))
    }

    fn handle_value_zoom_events(&mut self, events: &ZoomEvents) {
        if !events.is_empty() {
            self.core.runtime.needs_redraw = true;
        }
    }
}
