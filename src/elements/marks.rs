use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::elements::{DrawContext, format_value_tick};
use crate::render::{LineStyle, TextHAlign, TextStyle};
use crate::scene::Geometry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RulePosition {
    /// Horizontal rule at a fixed value.
    Value { value: f64 },
    /// Vertical rule at a timestamp (epoch milliseconds).
    Time { time_ms: f64 },
    /// Horizontal rule at the newest record's `field` (last-price line).
    Latest { field: String },
}

/// Full-width or full-height reference line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleElement {
    pub position: RulePosition,
    pub line: LineStyle,
    /// Prints the rule's value at the right edge.
    #[serde(default)]
    pub label: Option<TextStyle>,
}

impl RuleElement {
    #[must_use]
    pub fn new(position: RulePosition, line: LineStyle) -> Self {
        Self {
            position,
            line,
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, style: TextStyle) -> Self {
        self.label = Some(style);
        self
    }

    pub fn draw(&self, geometry: &mut Geometry, context: &DrawContext<'_>) {
        let value = match &self.position {
            RulePosition::Time { time_ms } => {
                let x = context.time.map_millis(*time_ms);
                if (0.0..=context.width).contains(&x) {
                    let x = context.crisp(x, self.line.width);
                    geometry.line(
                        Point::new(x, 0.0),
                        Point::new(x, context.height),
                        self.line.clone(),
                    );
                }
                return;
            }
            RulePosition::Value { value } => *value,
            RulePosition::Latest { field } => {
                match context.data.last().and_then(|record| record.value(field)) {
                    Some(value) => value,
                    None => return,
                }
            }
        };

        let y = context.y(value);
        if !(0.0..=context.height).contains(&y) {
            return;
        }
        let y = context.crisp(y, self.line.width);
        geometry.line(Point::new(0.0, y), Point::new(context.width, y), self.line.clone());
        if let Some(style) = self.label {
            let (d0, d1) = context.value.domain();
            let step = crate::core::scale::tick_step(d0.min(d1), d0.max(d1), 5);
            geometry.text(
                format_value_tick(value, step),
                Point::new(context.width - 2.0, y - style.font_size_px * 0.6),
                TextStyle {
                    h_align: TextHAlign::Right,
                    ..style
                },
            );
        }
    }
}

/// Free text anchored at a data coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelElement {
    pub text: String,
    /// Anchor time; `None` pins the label to the pane's right edge.
    #[serde(default)]
    pub time_ms: Option<f64>,
    pub value: f64,
    pub style: TextStyle,
    /// Pixel offset applied after projection.
    #[serde(default)]
    pub offset: (f64, f64),
}

impl LabelElement {
    #[must_use]
    pub fn new(text: impl Into<String>, value: f64, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            time_ms: None,
            value,
            style,
            offset: (0.0, 0.0),
        }
    }

    #[must_use]
    pub fn at_time(mut self, time_ms: f64) -> Self {
        self.time_ms = Some(time_ms);
        self
    }

    pub fn draw(&self, geometry: &mut Geometry, context: &DrawContext<'_>) {
        let x = self
            .time_ms
            .map_or(context.width, |time_ms| context.time.map_millis(time_ms));
        let origin = Point::new(x + self.offset.0, context.y(self.value) + self.offset.1);
        if origin.x.is_finite() && origin.y.is_finite() {
            geometry.text(self.text.clone(), origin, self.style);
        }
    }
}
