use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use crate::core::{ChartLayout, PaneId, Record, TimeScale, Viewport, layout_panes};
use crate::error::ChartResult;
use crate::interaction::{Inertia, ZoomAxis, ZoomBehavior};
use crate::pane::{Pane, PaneOptions};

use super::ChartEngineConfig;

/// Data and view state owned by the engine.
pub(super) struct ChartModel {
    pub(super) config: ChartEngineConfig,
    pub(super) viewport: Viewport,
    pub(super) pixel_ratio: f64,
    pub(super) layout: ChartLayout,
    /// Time scale before the time zoom transform; range `[0, plot_width]`.
    pub(super) base_time_scale: TimeScale,
    pub(super) time_zoom: ZoomBehavior,
    pub(super) time_inertia: Inertia,
    pub(super) panes: IndexMap<PaneId, Pane>,
    /// Records that define the time axis independently of any pane.
    pub(super) axis_data: Vec<Record>,
    pub(super) is_pinned: bool,
    pub(super) disposed: bool,
}

impl ChartModel {
    pub(super) fn new(config: ChartEngineConfig) -> ChartResult<Self> {
        let layout = layout_panes(config.viewport, config.axis_strips(), &[]);
        let span = config.interval.duration_ms() * config.initial_visible_intervals as f64;
        let base_time_scale =
            TimeScale::from_millis(0.0, span)?.with_range(0.0, layout.plot_width);
        let time_zoom = ZoomBehavior::new(time_zoom_extent(&layout), ZoomAxis::X)
            .with_scale_extent(config.time_scale_extent()?)
            .with_wheel_settle_ms(config.wheel_settle_ms);

        Ok(Self {
            viewport: config.viewport,
            pixel_ratio: config.pixel_ratio,
            layout,
            base_time_scale,
            time_zoom,
            time_inertia: Inertia::new(config.inertia),
            panes: IndexMap::new(),
            axis_data: Vec::new(),
            is_pinned: true,
            disposed: false,
            config,
        })
    }

    pub(super) fn pane_options(&self) -> ChartResult<PaneOptions> {
        Ok(PaneOptions {
            value_scale_extent: self.config.value_scale_extent()?,
            wheel_settle_ms: self.config.wheel_settle_ms,
            inertia: self.config.inertia,
            padding_bottom: self.config.value_padding_bottom,
            padding_top: self.config.value_padding_top,
        })
    }

    /// Recomputes pane rectangles and pushes them into panes and the time
    /// zoom extent. The base time domain is kept.
    pub(super) fn relayout(&mut self) {
        let weights: Vec<(PaneId, f64)> = self
            .panes
            .values()
            .map(|pane| (pane.id().clone(), pane.stretch_factor()))
            .collect();
        self.layout = layout_panes(self.viewport, self.config.axis_strips(), &weights);
        for region in &self.layout.panes {
            if let Some(pane) = self.panes.get_mut(&region.pane_id) {
                pane.set_layout(region);
            }
        }
        self.base_time_scale = self.base_time_scale.with_range(0.0, self.layout.plot_width);
        self.time_zoom.set_extent(time_zoom_extent(&self.layout));
    }

    /// Newest record time across the axis data and every pane.
    #[must_use]
    pub(super) fn latest_time_ms(&self) -> Option<f64> {
        self.axis_data
            .last()
            .map(Record::time_millis)
            .into_iter()
            .chain(self.panes.values().filter_map(Pane::latest_time_ms))
            .map(OrderedFloat)
            .max()
            .map(OrderedFloat::into_inner)
    }

    #[must_use]
    pub(super) fn earliest_time_ms(&self) -> Option<f64> {
        self.axis_data
            .first()
            .map(Record::time_millis)
            .into_iter()
            .chain(self.panes.values().filter_map(Pane::earliest_time_ms))
            .map(OrderedFloat)
            .min()
            .map(OrderedFloat::into_inner)
    }

    /// Base time scale seen through the current time zoom transform.
    #[must_use]
    pub(super) fn visible_time_scale(&self) -> TimeScale {
        self.time_zoom
            .transform()
            .rescale_time(self.base_time_scale)
            .unwrap_or(self.base_time_scale)
    }

    /// Pixel width of one interval at the current zoom.
    #[must_use]
    pub(super) fn interval_px(&self) -> f64 {
        self.visible_time_scale()
            .pixels_per(self.config.interval.duration_ms())
    }

    #[must_use]
    pub(super) fn is_interacting(&self) -> bool {
        self.time_zoom.is_active()
            || self.time_inertia.is_animating()
            || self.panes.values().any(Pane::is_interacting)
    }
}

fn time_zoom_extent(layout: &ChartLayout) -> kurbo::Rect {
    kurbo::Rect::new(0.0, 0.0, layout.plot_width, layout.time_axis.y)
}
