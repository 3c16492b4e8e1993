use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::core::primitives::millis_to_datetime;
use crate::core::time_scale::tick_label_format;
use crate::elements::DrawContext;
use crate::render::{LineStyle, TextHAlign, TextStyle};
use crate::scene::Geometry;

const TIME_TICK_SPACING_PX: f64 = 80.0;
const VALUE_TICK_SPACING_PX: f64 = 40.0;
const MIN_TICKS: usize = 2;
const MAX_TICKS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickAxis {
    Time,
    Value,
}

fn default_label_gap() -> f64 {
    4.0
}

/// Ticks, grid lines and tick labels along one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTickElement {
    pub axis: TickAxis,
    /// Requested tick count; `None` derives it from the axis length.
    #[serde(default)]
    pub count: Option<usize>,
    /// Tick mark length; `None` draws a grid line across the whole pane.
    #[serde(default)]
    pub tick_length: Option<f64>,
    pub line: LineStyle,
    #[serde(default)]
    pub label: Option<TextStyle>,
    #[serde(default = "default_label_gap")]
    pub label_gap: f64,
}

impl AxisTickElement {
    #[must_use]
    pub fn grid(axis: TickAxis, line: LineStyle) -> Self {
        Self {
            axis,
            count: None,
            tick_length: None,
            line,
            label: None,
            label_gap: default_label_gap(),
        }
    }

    #[must_use]
    pub fn labelled(axis: TickAxis, tick_length: f64, line: LineStyle, label: TextStyle) -> Self {
        Self {
            tick_length: Some(tick_length),
            label: Some(label),
            ..Self::grid(axis, line)
        }
    }

    pub fn draw(&self, geometry: &mut Geometry, context: &DrawContext<'_>) {
        match self.axis {
            TickAxis::Value => self.draw_value_ticks(geometry, context),
            TickAxis::Time => self.draw_time_ticks(geometry, context),
        }
    }

    fn draw_value_ticks(&self, geometry: &mut Geometry, context: &DrawContext<'_>) {
        let count = self
            .count
            .unwrap_or_else(|| tick_count_for_span(context.height, VALUE_TICK_SPACING_PX));
        let step = context.value.tick_step(count);
        let length = self.tick_length.unwrap_or(context.width);

        for value in context.value.ticks(count) {
            let y = context.y(value);
            if !(0.0..=context.height).contains(&y) {
                continue;
            }
            let y = context.crisp(y, self.line.width);
            geometry.line(Point::new(0.0, y), Point::new(length, y), self.line.clone());
            if let Some(style) = self.label {
                geometry.text(
                    format_value_tick(value, step),
                    Point::new(length + self.label_gap, y),
                    TextStyle {
                        h_align: TextHAlign::Left,
                        ..style
                    },
                );
            }
        }
    }

    fn draw_time_ticks(&self, geometry: &mut Geometry, context: &DrawContext<'_>) {
        let count = self
            .count
            .unwrap_or_else(|| tick_count_for_span(context.width, TIME_TICK_SPACING_PX));
        let step = context.time.tick_step_millis(count);
        let length = self.tick_length.unwrap_or(context.height);

        for time_ms in context.time.ticks_millis(count) {
            let x = context.time.map_millis(time_ms);
            if !(0.0..=context.width).contains(&x) {
                continue;
            }
            let x = context.crisp(x, self.line.width);
            geometry.line(Point::new(x, 0.0), Point::new(x, length), self.line.clone());
            if let Some(style) = self.label {
                geometry.text(
                    format_time_tick(time_ms, step),
                    Point::new(x, length + self.label_gap + style.font_size_px / 2.0),
                    TextStyle {
                        h_align: TextHAlign::Center,
                        ..style
                    },
                );
            }
        }
    }
}

/// Tick count giving roughly `spacing_px` between ticks.
#[must_use]
pub fn tick_count_for_span(span_px: f64, spacing_px: f64) -> usize {
    if !span_px.is_finite() || span_px <= 0.0 || !spacing_px.is_finite() || spacing_px <= 0.0 {
        return MIN_TICKS;
    }
    ((span_px / spacing_px).floor() as usize + 1).clamp(MIN_TICKS, MAX_TICKS)
}

/// Formats a value with as many decimals as the tick step needs.
#[must_use]
pub fn format_value_tick(value: f64, step: f64) -> String {
    let mut decimals = 0usize;
    if step.is_finite() && step > 0.0 {
        let mut scaled = step;
        while decimals < 8 && (scaled - scaled.round()).abs() > 1e-9 * scaled.abs().max(1.0) {
            scaled *= 10.0;
            decimals += 1;
        }
    }
    let text = format!("{value:.decimals$}");
    // "-0", "-0.00"
    if text.starts_with('-') && text.trim_start_matches(['-', '0', '.']).is_empty() {
        text[1..].to_owned()
    } else {
        text
    }
}

/// Formats a tick timestamp with a pattern chosen from the tick step.
#[must_use]
pub fn format_time_tick(time_ms: f64, step_ms: f64) -> String {
    millis_to_datetime(time_ms)
        .map(|time| time.format(tick_label_format(step_ms)).to_string())
        .unwrap_or_default()
}
