use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::core::record::{FIELD_CLOSE, FIELD_HIGH, FIELD_LOW, FIELD_OPEN, FIELD_VOLUME};
use crate::elements::DrawContext;
use crate::render::{Color, FillStyle, LineStyle};
use crate::scene::Geometry;

fn default_body_width_ratio() -> f64 {
    0.7
}

fn default_wick_width() -> f64 {
    1.0
}

/// OHLC candle: a wick from high to low and a body from open to close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleElement {
    pub open_field: String,
    pub high_field: String,
    pub low_field: String,
    pub close_field: String,
    pub up_color: Color,
    pub down_color: Color,
    /// Body width as a fraction of one interval.
    #[serde(default = "default_body_width_ratio")]
    pub body_width_ratio: f64,
    #[serde(default = "default_wick_width")]
    pub wick_width: f64,
}

impl Default for CandleElement {
    fn default() -> Self {
        Self {
            open_field: FIELD_OPEN.to_owned(),
            high_field: FIELD_HIGH.to_owned(),
            low_field: FIELD_LOW.to_owned(),
            close_field: FIELD_CLOSE.to_owned(),
            up_color: Color::from_rgb8(0x26, 0xa6, 0x9a),
            down_color: Color::from_rgb8(0xef, 0x53, 0x50),
            body_width_ratio: default_body_width_ratio(),
            wick_width: default_wick_width(),
        }
    }
}

impl CandleElement {
    pub fn draw(&self, geometry: &mut Geometry, context: &DrawContext<'_>) {
        let device_pixel = context.device_pixel();
        let body_width = (context.interval_px * self.body_width_ratio).max(device_pixel);

        for record in context.visible_records(1) {
            let (Some(open), Some(high), Some(low), Some(close)) = (
                record.value(&self.open_field),
                record.value(&self.high_field),
                record.value(&self.low_field),
                record.value(&self.close_field),
            ) else {
                continue;
            };
            let color = if close >= open {
                self.up_color
            } else {
                self.down_color
            };
            let x = context.crisp(context.x(record), self.wick_width);

            geometry.line(
                Point::new(x, context.y(high)),
                Point::new(x, context.y(low)),
                LineStyle::solid(color, self.wick_width),
            );

            let top = context.y(open.max(close));
            let bottom = context.y(open.min(close)).max(top + device_pixel);
            let left = x - body_width / 2.0;
            geometry.fill_rect(
                Rect::new(left, top, left + body_width, bottom),
                FillStyle::solid(color),
            );
        }
    }
}

/// Vertical bars from a baseline to `field` (volume, histograms).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarElement {
    pub field: String,
    pub color: Color,
    /// When set, bars whose close is below their open use this color.
    #[serde(default)]
    pub down_color: Option<Color>,
    /// Baseline value; `None` draws from the pane bottom.
    #[serde(default)]
    pub base: Option<f64>,
    #[serde(default = "default_body_width_ratio")]
    pub width_ratio: f64,
}

impl BarElement {
    #[must_use]
    pub fn new(field: impl Into<String>, color: Color) -> Self {
        Self {
            field: field.into(),
            color,
            down_color: None,
            base: None,
            width_ratio: default_body_width_ratio(),
        }
    }

    #[must_use]
    pub fn volume(up_color: Color, down_color: Color) -> Self {
        Self {
            down_color: Some(down_color),
            ..Self::new(FIELD_VOLUME, up_color)
        }
    }

    #[must_use]
    pub fn with_base(mut self, base: f64) -> Self {
        self.base = Some(base);
        self
    }

    pub fn draw(&self, geometry: &mut Geometry, context: &DrawContext<'_>) {
        let width = (context.interval_px * self.width_ratio).max(context.device_pixel());
        let baseline = self.base.map_or(context.height, |base| context.y(base));

        for record in context.visible_records(1) {
            let Some(value) = record.value(&self.field) else {
                continue;
            };
            let falling = matches!(
                (record.value(FIELD_OPEN), record.value(FIELD_CLOSE)),
                (Some(open), Some(close)) if close < open
            );
            let color = match self.down_color {
                Some(down) if falling => down,
                _ => self.color,
            };
            let x = context.crisp(context.x(record), 1.0);
            let left = x - width / 2.0;
            let y = context.y(value);
            let rect = Rect::new(left, y.min(baseline), left + width, y.max(baseline));
            if rect.height() > 0.0 {
                geometry.fill_rect(rect, FillStyle::solid(color));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BarElement, CandleElement};
    use crate::elements::test_support::{candles, context};
    use crate::render::Color;
    use crate::scene::{Geometry, Shape};

    #[test]
    fn candles_paint_a_wick_then_a_body_per_record() {
        let data = candles();
        let mut geometry = Geometry::new();
        let element = CandleElement::default();
        element.draw(&mut geometry, &context(&data));

        assert_eq!(geometry.len(), 10);
        assert!(matches!(geometry.items()[0].shape, Shape::Polyline(_)));
        let body = &geometry.items()[1];
        let Shape::Rect(rect) = body.shape else {
            panic!("expected a body rect");
        };
        // 0.7 of a 25px interval
        assert!((rect.width() - 17.5).abs() < 1e-9);
        assert_eq!(body.fill.map(|fill| fill.color), Some(element.up_color));
    }

    #[test]
    fn volume_bars_take_the_down_color_for_falling_records() {
        let mut data = candles();
        data[0] = data[0].clone().with_value("close", 5.0);
        let mut geometry = Geometry::new();
        let down = Color::rgb(1.0, 0.0, 0.0);
        BarElement::volume(Color::BLACK, down)
            .with_base(0.0)
            .draw(&mut geometry, &context(&data));
        assert_eq!(geometry.len(), 5);
        assert_eq!(geometry.items()[0].fill.map(|fill| fill.color), Some(down));
        assert_eq!(geometry.items()[1].fill.map(|fill| fill.color), Some(Color::BLACK));
    }
}
