use serde::{Deserialize, Serialize};

use crate::core::{AxisStrips, Interval, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::interaction::{InertiaConfig, ScaleExtent};
use crate::render::{Color, LineStyle, TextHAlign, TextStyle};

/// Paint used for axes, grid, crosshair and tooltips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub background: Color,
    pub grid_line: LineStyle,
    pub axis_line: LineStyle,
    pub axis_text: TextStyle,
    pub pane_separator: LineStyle,
    pub crosshair_line: LineStyle,
    pub tooltip_fill: Color,
    pub tooltip_text: TextStyle,
}

impl Default for ChartStyle {
    fn default() -> Self {
        let muted = Color::from_rgb8(0x78, 0x7b, 0x86);
        Self {
            background: Color::WHITE,
            grid_line: LineStyle::solid(Color::from_rgb8(0xf0, 0xf3, 0xfa), 1.0),
            axis_line: LineStyle::solid(muted, 1.0),
            axis_text: TextStyle::new(11.0, muted, TextHAlign::Left),
            pane_separator: LineStyle::solid(Color::from_rgb8(0xe0, 0xe3, 0xeb), 1.0),
            crosshair_line: LineStyle::dashed(muted, 1.0, &[4.0, 4.0]),
            tooltip_fill: Color::from_rgb8(0x13, 0x17, 0x22),
            tooltip_text: TextStyle::new(11.0, Color::WHITE, TextHAlign::Center),
        }
    }
}

fn default_pixel_ratio() -> f64 {
    1.0
}

fn default_initial_visible_intervals() -> usize {
    100
}

fn default_right_offset_intervals() -> f64 {
    4.0
}

fn default_time_scale_extent() -> (f64, f64) {
    (0.05, 20.0)
}

fn default_value_scale_extent() -> (f64, f64) {
    (1e-3, 1e3)
}

fn default_time_axis_height() -> f64 {
    24.0
}

fn default_value_axis_width() -> f64 {
    64.0
}

fn default_wheel_settle_ms() -> f64 {
    150.0
}

fn default_resize_throttle_ms() -> f64 {
    100.0
}

fn default_value_padding_bottom() -> f64 {
    0.1
}

fn default_value_padding_top() -> f64 {
    0.2
}

/// Public engine bootstrap configuration.
///
/// Serializable so hosts can persist and reload chart setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEngineConfig {
    pub viewport: Viewport,
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f64,
    #[serde(default)]
    pub interval: Interval,
    /// Intervals shown by [`crate::ChartEngine::reset`].
    #[serde(default = "default_initial_visible_intervals")]
    pub initial_visible_intervals: usize,
    /// Gap between the newest record and the right edge while pinned.
    #[serde(default = "default_right_offset_intervals")]
    pub right_offset_intervals: f64,
    #[serde(default = "default_time_scale_extent")]
    pub time_scale_extent: (f64, f64),
    #[serde(default = "default_value_scale_extent")]
    pub value_scale_extent: (f64, f64),
    #[serde(default = "default_time_axis_height")]
    pub time_axis_height: f64,
    #[serde(default = "default_value_axis_width")]
    pub value_axis_width: f64,
    #[serde(default = "default_wheel_settle_ms")]
    pub wheel_settle_ms: f64,
    #[serde(default = "default_resize_throttle_ms")]
    pub resize_throttle_ms: f64,
    #[serde(default)]
    pub inertia: InertiaConfig,
    #[serde(default = "default_value_padding_bottom")]
    pub value_padding_bottom: f64,
    #[serde(default = "default_value_padding_top")]
    pub value_padding_top: f64,
    #[serde(default)]
    pub style: ChartStyle,
}

impl ChartEngineConfig {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            pixel_ratio: default_pixel_ratio(),
            interval: Interval::default(),
            initial_visible_intervals: default_initial_visible_intervals(),
            right_offset_intervals: default_right_offset_intervals(),
            time_scale_extent: default_time_scale_extent(),
            value_scale_extent: default_value_scale_extent(),
            time_axis_height: default_time_axis_height(),
            value_axis_width: default_value_axis_width(),
            wheel_settle_ms: default_wheel_settle_ms(),
            resize_throttle_ms: default_resize_throttle_ms(),
            inertia: InertiaConfig::default(),
            value_padding_bottom: default_value_padding_bottom(),
            value_padding_top: default_value_padding_top(),
            style: ChartStyle::default(),
        }
    }

    #[must_use]
    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_initial_visible_intervals(mut self, count: usize) -> Self {
        self.initial_visible_intervals = count;
        self
    }

    #[must_use]
    pub fn with_right_offset_intervals(mut self, intervals: f64) -> Self {
        self.right_offset_intervals = intervals;
        self
    }

    #[must_use]
    pub fn with_time_scale_extent(mut self, min: f64, max: f64) -> Self {
        self.time_scale_extent = (min, max);
        self
    }

    #[must_use]
    pub fn with_value_scale_extent(mut self, min: f64, max: f64) -> Self {
        self.value_scale_extent = (min, max);
        self
    }

    #[must_use]
    pub fn with_axis_strips(mut self, time_axis_height: f64, value_axis_width: f64) -> Self {
        self.time_axis_height = time_axis_height;
        self.value_axis_width = value_axis_width;
        self
    }

    #[must_use]
    pub fn with_inertia(mut self, inertia: InertiaConfig) -> Self {
        self.inertia = inertia;
        self
    }

    #[must_use]
    pub fn with_value_padding(mut self, bottom: f64, top: f64) -> Self {
        self.value_padding_bottom = bottom;
        self.value_padding_top = top;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn axis_strips(&self) -> AxisStrips {
        AxisStrips {
            time_axis_height: self.time_axis_height,
            value_axis_width: self.value_axis_width,
        }
    }

    pub fn time_scale_extent(&self) -> ChartResult<ScaleExtent> {
        ScaleExtent::new(self.time_scale_extent.0, self.time_scale_extent.1)
    }

    pub fn value_scale_extent(&self) -> ChartResult<ScaleExtent> {
        ScaleExtent::new(self.value_scale_extent.0, self.value_scale_extent.1)
    }

    /// Rejects configurations that would break scale or layout invariants.
    pub fn validate(&self) -> ChartResult<()> {
        if !self.viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        if !self.pixel_ratio.is_finite() || self.pixel_ratio <= 0.0 {
            return Err(ChartError::InvalidExtent(
                "device pixel ratio must be finite and > 0".to_owned(),
            ));
        }
        self.time_scale_extent()?;
        self.value_scale_extent()?;
        self.axis_strips().validate(self.viewport)?;
        if self.initial_visible_intervals == 0 {
            return Err(ChartError::InvalidExtent(
                "initial visible interval count must be > 0".to_owned(),
            ));
        }
        let non_negative = [
            ("right_offset_intervals", self.right_offset_intervals),
            ("wheel_settle_ms", self.wheel_settle_ms),
            ("resize_throttle_ms", self.resize_throttle_ms),
            ("value_padding_bottom", self.value_padding_bottom),
            ("value_padding_top", self.value_padding_top),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::InvalidExtent(format!(
                    "`{name}` must be finite and >= 0"
                )));
            }
        }
        self.inertia.validate()?;
        Ok(())
    }
}
