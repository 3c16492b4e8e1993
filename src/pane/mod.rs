//! One plotting region: a value axis of its own, a data slice and the
//! elements drawn from it, sharing the chart's time axis.

mod fit;

use kurbo::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::layout::validate_stretch_factor;
use crate::core::record::{RealtimeUpdate, push_realtime};
use crate::core::windowing::records_in_time_window;
use crate::core::{
    Bounds, LinearScale, PaneId, PaneLayoutRegion, Record, TimeScale, canonicalize_records,
    padded_extent, value_extent,
};
use crate::elements::{DrawContext, RenderableElement};
use crate::error::ChartResult;
use crate::interaction::{
    Inertia, InertiaConfig, InertiaEvent, ScaleExtent, WheelInput, ZoomAxis, ZoomBehavior,
    ZoomEvent, ZoomEvents, ZoomSource, ZoomTransform,
};
use crate::scene::Geometry;

pub use fit::{ValueFit, solve_value_fit};

fn default_stretch_factor() -> f64 {
    1.0
}

/// Pane description handed over by the panel compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneSpec {
    pub id: PaneId,
    #[serde(default)]
    pub elements: Vec<RenderableElement>,
    #[serde(default)]
    pub data: Vec<Record>,
    /// Fields that drive the auto-fit value domain; empty means every field
    /// the elements plot.
    #[serde(default)]
    pub y_encoding_fields: Vec<String>,
    #[serde(default = "default_stretch_factor")]
    pub stretch_factor: f64,
}

impl PaneSpec {
    #[must_use]
    pub fn new(id: impl Into<PaneId>) -> Self {
        Self {
            id: id.into(),
            elements: Vec::new(),
            data: Vec::new(),
            y_encoding_fields: Vec::new(),
            stretch_factor: default_stretch_factor(),
        }
    }

    #[must_use]
    pub fn with_element(mut self, element: impl Into<RenderableElement>) -> Self {
        self.elements.push(element.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Vec<Record>) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn with_y_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.y_encoding_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_stretch_factor(mut self, stretch_factor: f64) -> Self {
        self.stretch_factor = stretch_factor;
        self
    }

    /// Explicit y fields, or the union of the elements' plotted fields.
    #[must_use]
    pub fn resolved_y_fields(&self) -> Vec<String> {
        if !self.y_encoding_fields.is_empty() {
            return self.y_encoding_fields.clone();
        }
        let mut fields: Vec<String> = Vec::new();
        for element in &self.elements {
            for field in element.value_fields() {
                if !fields.iter().any(|known| known == field) {
                    fields.push(field.to_owned());
                }
            }
        }
        fields
    }
}

/// Per-pane knobs taken from the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneOptions {
    pub value_scale_extent: ScaleExtent,
    pub wheel_settle_ms: f64,
    pub inertia: InertiaConfig,
    pub padding_bottom: f64,
    pub padding_top: f64,
}

impl Default for PaneOptions {
    fn default() -> Self {
        Self {
            value_scale_extent: ScaleExtent::UNBOUNDED,
            wheel_settle_ms: ZoomBehavior::DEFAULT_WHEEL_SETTLE_MS,
            inertia: InertiaConfig::default(),
            padding_bottom: 0.1,
            padding_top: 0.2,
        }
    }
}

/// Pane-local crosshair coordinates; `None` means "not drawn".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaneCrosshair {
    pub time_ms: Option<f64>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Pane {
    id: PaneId,
    bounds: Bounds,
    value_axis_bounds: Bounds,
    base_value_scale: LinearScale,
    value_zoom: ZoomBehavior,
    elements: Vec<RenderableElement>,
    data: Vec<Record>,
    y_fields: Vec<String>,
    stretch_factor: f64,
    crosshair: PaneCrosshair,
    free_pan: bool,
    inertia: Inertia,
    options: PaneOptions,
    disposed: bool,
}

impl Pane {
    pub fn new(spec: PaneSpec, region: &PaneLayoutRegion, options: PaneOptions) -> ChartResult<Self> {
        validate_stretch_factor(spec.stretch_factor)?;
        let y_fields = spec.resolved_y_fields();
        let base_value_scale = LinearScale::new(0.0, 1.0)?.with_range(region.plot.height, 0.0);
        let value_zoom = ZoomBehavior::new(region.plot.local_rect(), ZoomAxis::Y)
            .with_scale_extent(options.value_scale_extent)
            .with_wheel_settle_ms(options.wheel_settle_ms);

        Ok(Self {
            id: spec.id,
            bounds: region.plot,
            value_axis_bounds: region.value_axis,
            base_value_scale,
            value_zoom,
            elements: spec.elements,
            data: canonicalize_records(spec.data),
            y_fields,
            stretch_factor: spec.stretch_factor,
            crosshair: PaneCrosshair::default(),
            free_pan: false,
            inertia: Inertia::new(options.inertia),
            options,
            disposed: false,
        })
    }

    #[must_use]
    pub fn id(&self) -> &PaneId {
        &self.id
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[must_use]
    pub fn value_axis_bounds(&self) -> Bounds {
        self.value_axis_bounds
    }

    #[must_use]
    pub fn data(&self) -> &[Record] {
        &self.data
    }

    #[must_use]
    pub fn elements(&self) -> &[RenderableElement] {
        &self.elements
    }

    #[must_use]
    pub fn y_fields(&self) -> &[String] {
        &self.y_fields
    }

    #[must_use]
    pub fn stretch_factor(&self) -> f64 {
        self.stretch_factor
    }

    #[must_use]
    pub fn is_free_pan(&self) -> bool {
        self.free_pan
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[must_use]
    pub fn crosshair(&self) -> PaneCrosshair {
        self.crosshair
    }

    pub fn set_crosshair(&mut self, crosshair: PaneCrosshair) {
        self.crosshair = crosshair;
    }

    #[must_use]
    pub fn value_transform(&self) -> ZoomTransform {
        self.value_zoom.transform()
    }

    #[must_use]
    pub fn base_value_scale(&self) -> LinearScale {
        self.base_value_scale
    }

    /// Base value scale seen through the value zoom transform.
    #[must_use]
    pub fn value_scale(&self) -> LinearScale {
        self.value_zoom
            .transform()
            .rescale_y(self.base_value_scale)
            .unwrap_or(self.base_value_scale)
    }

    #[must_use]
    pub fn value_domain(&self) -> (f64, f64) {
        self.value_scale().domain()
    }

    /// Value under a pane-local y coordinate.
    #[must_use]
    pub fn value_at(&self, local_y: f64) -> f64 {
        self.value_scale().invert(local_y)
    }

    #[must_use]
    pub fn is_interacting(&self) -> bool {
        self.value_zoom.is_active() || self.inertia.is_animating()
    }

    /// Time of the newest record.
    #[must_use]
    pub fn latest_time_ms(&self) -> Option<f64> {
        self.data.last().map(Record::time_millis)
    }

    #[must_use]
    pub fn earliest_time_ms(&self) -> Option<f64> {
        self.data.first().map(Record::time_millis)
    }

    /// Moves the pane to a new layout slot; the value transform is kept.
    pub fn set_layout(&mut self, region: &PaneLayoutRegion) {
        self.bounds = region.plot;
        self.value_axis_bounds = region.value_axis;
        self.base_value_scale = self.base_value_scale.with_range(region.plot.height, 0.0);
        self.value_zoom.set_extent(region.plot.local_rect());
    }

    /// Replaces elements and data from a fresh description; free-pan state
    /// and the value transform survive.
    pub fn update(&mut self, spec: PaneSpec) -> ChartResult<()> {
        if self.disposed {
            trace!(pane = %self.id, "update on disposed pane ignored");
            return Ok(());
        }
        validate_stretch_factor(spec.stretch_factor)?;
        self.y_fields = spec.resolved_y_fields();
        self.stretch_factor = spec.stretch_factor;
        self.elements = spec.elements;
        self.data = canonicalize_records(spec.data);
        debug!(pane = %self.id, records = self.data.len(), "replace pane data");
        Ok(())
    }

    /// Streams one record in: newer appends, same time replaces the newest,
    /// older is rejected.
    pub fn append_record(&mut self, record: Record) -> ChartResult<Option<RealtimeUpdate>> {
        if self.disposed {
            trace!(pane = %self.id, "append on disposed pane ignored");
            return Ok(None);
        }
        let update = push_realtime(&mut self.data, record)?;
        trace!(pane = %self.id, ?update, records = self.data.len(), "append pane record");
        Ok(Some(update))
    }

    /// Padded extent of the y fields over records inside the time window.
    #[must_use]
    pub fn auto_fit_domain(&self, time_window: (f64, f64)) -> Option<(f64, f64)> {
        let (start, end) = time_window;
        let visible = records_in_time_window(&self.data, start, end);
        value_extent(visible, &self.y_fields).map(|extent| {
            padded_extent(extent, self.options.padding_bottom, self.options.padding_top)
        })
    }

    /// Refits the value axis to the visible window unless the pane is in
    /// free-pan. Returns `true` when the visible domain changed.
    pub fn recalculate(&mut self, time_window: (f64, f64)) -> bool {
        if self.disposed || self.free_pan {
            return false;
        }
        self.fit_to_window(time_window)
    }

    /// Leaves free-pan and refits to the visible window.
    pub fn reset_value_axis(&mut self, time_window: (f64, f64)) -> bool {
        if self.disposed {
            return false;
        }
        if self.free_pan {
            debug!(pane = %self.id, "leave free pan");
        }
        self.free_pan = false;
        self.inertia.stop();
        self.value_zoom.cancel();
        self.fit_to_window(time_window)
    }

    fn fit_to_window(&mut self, time_window: (f64, f64)) -> bool {
        let Some(target) = self.auto_fit_domain(time_window) else {
            trace!(pane = %self.id, "no visible values; value domain kept");
            return false;
        };
        let before = self.value_domain();
        match solve_value_fit(self.base_value_scale, target, self.options.value_scale_extent) {
            Some(ValueFit::Transform(transform)) => {
                self.value_zoom.commit(transform);
            }
            Some(ValueFit::Rebase(scale)) => {
                trace!(pane = %self.id, lo = target.0, hi = target.1, "rebase value scale");
                self.base_value_scale = scale;
                self.value_zoom.commit(ZoomTransform::IDENTITY);
            }
            None => {
                trace!(pane = %self.id, "degenerate value fit skipped");
                return false;
            }
        }
        self.value_domain() != before
    }

    pub fn value_axis_pointer_down(&mut self, point: Point, now_ms: f64) -> ZoomEvents {
        if self.disposed {
            return ZoomEvents::new();
        }
        self.inertia.start(point, now_ms);
        self.value_zoom.pointer_down(point)
    }

    pub fn value_axis_pointer_move(&mut self, point: Point, now_ms: f64) -> ZoomEvents {
        if self.disposed {
            return ZoomEvents::new();
        }
        self.inertia.track(point, now_ms);
        let events = self.value_zoom.pointer_move(point);
        self.note_manual_zoom(&events);
        events
    }

    pub fn value_axis_pointer_up(&mut self, now_ms: f64) -> ZoomEvents {
        if self.disposed {
            return ZoomEvents::new();
        }
        if self.inertia.release(now_ms) {
            trace!(pane = %self.id, "value axis inertia started");
        }
        self.value_zoom.pointer_up()
    }

    pub fn value_axis_wheel(&mut self, input: WheelInput, now_ms: f64) -> ZoomEvents {
        if self.disposed {
            return ZoomEvents::new();
        }
        self.inertia.stop();
        let events = self.value_zoom.wheel(input, now_ms);
        self.note_manual_zoom(&events);
        events
    }

    /// Advances the wheel-settle timer and inertia. Returns `true` when the
    /// value transform moved or a gesture ended.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        if self.disposed {
            return false;
        }
        let mut changed = !self.value_zoom.tick(now_ms).is_empty();
        for event in self.inertia.tick(now_ms) {
            if let InertiaEvent::Render { dx, dy } = event {
                self.value_zoom.pan_pixels(dx, dy);
                changed = true;
            }
        }
        changed
    }

    /// Paints every element into `geometry` against the shared time scale
    /// (range in pane-local pixels).
    pub fn draw(&self, geometry: &mut Geometry, time: TimeScale, pixel_ratio: f64, interval_px: f64) {
        if self.disposed || self.bounds.is_empty() {
            return;
        }
        let context = DrawContext {
            time,
            value: self.value_scale(),
            pixel_ratio,
            width: self.bounds.width,
            height: self.bounds.height,
            interval_px,
            data: &self.data,
        };
        for element in &self.elements {
            element.draw(geometry, &context);
        }
    }

    /// Stops timers and gestures; further operations are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.value_zoom.cancel();
        self.inertia.stop();
        self.crosshair = PaneCrosshair::default();
        self.disposed = true;
        debug!(pane = %self.id, "dispose pane");
    }

    fn note_manual_zoom(&mut self, events: &ZoomEvents) {
        let manual = events.iter().any(|event| {
            matches!(
                event,
                ZoomEvent::Zoom {
                    source: ZoomSource::Pointer | ZoomSource::Wheel | ZoomSource::Touch,
                    ..
                }
            )
        });
        if manual && !self.free_pan {
            self.free_pan = true;
            debug!(pane = %self.id, "enter free pan");
        }
    }
}
