//! Closed set of drawable marks a pane can carry.
//!
//! Every element paints into a node's [`Geometry`] in pane-local CSS pixels
//! given the shared time scale, the pane's value scale and the device pixel
//! ratio carried by [`DrawContext`].

mod axis_tick;
mod candle;
mod marks;
mod series;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::windowing::visible_index_range;
use crate::core::{LinearScale, Record, TimeScale};
use crate::scene::Geometry;

pub use axis_tick::{
    AxisTickElement, TickAxis, format_time_tick, format_value_tick, tick_count_for_span,
};
pub use candle::{BarElement, CandleElement};
pub use marks::{LabelElement, RuleElement, RulePosition};
pub use series::{AreaBaseline, AreaElement, LineElement};

/// Snaps a coordinate so a line of `line_width` CSS pixels covers whole
/// device pixels: odd device widths land on pixel centers, even ones on
/// pixel edges.
#[must_use]
pub fn crisp_coordinate(coordinate: f64, line_width: f64, pixel_ratio: f64) -> f64 {
    let ratio = if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
    let device_width = (line_width * ratio).round().max(1.0);
    let device = coordinate * ratio;
    if device_width as i64 % 2 == 1 {
        (device.floor() + 0.5) / ratio
    } else {
        device.round() / ratio
    }
}

/// Scales and data an element draws against.
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    /// Time scale with its range in pane-local pixels.
    pub time: TimeScale,
    /// Value scale with range `[height, 0]`.
    pub value: LinearScale,
    pub pixel_ratio: f64,
    pub width: f64,
    pub height: f64,
    /// Pixel width of one candle interval at the current zoom.
    pub interval_px: f64,
    pub data: &'a [Record],
}

impl<'a> DrawContext<'a> {
    /// Records inside the visible time window plus `margin` on each side.
    #[must_use]
    pub fn visible_records(&self, margin: usize) -> &'a [Record] {
        let (start, end) = self.time.domain_millis();
        &self.data[visible_index_range(self.data, start, end, margin)]
    }

    #[must_use]
    pub fn x(&self, record: &Record) -> f64 {
        self.time.map_millis(record.time_millis())
    }

    #[must_use]
    pub fn y(&self, value: f64) -> f64 {
        self.value.map(value)
    }

    /// Snaps a coordinate so a line of `line_width` CSS pixels covers whole
    /// device pixels.
    #[must_use]
    pub fn crisp(&self, coordinate: f64, line_width: f64) -> f64 {
        crisp_coordinate(coordinate, line_width, self.pixel_ratio)
    }

    /// One device pixel in CSS pixels.
    #[must_use]
    pub fn device_pixel(&self) -> f64 {
        if self.pixel_ratio > 0.0 {
            1.0 / self.pixel_ratio
        } else {
            1.0
        }
    }
}

/// Drawable mark dispatched through one tagged union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderableElement {
    Rule(RuleElement),
    Bar(BarElement),
    Candle(CandleElement),
    Line(LineElement),
    Area(AreaElement),
    Label(LabelElement),
    AxisTick(AxisTickElement),
}

impl RenderableElement {
    pub fn draw(&self, geometry: &mut Geometry, context: &DrawContext<'_>) {
        match self {
            RenderableElement::Rule(element) => element.draw(geometry, context),
            RenderableElement::Bar(element) => element.draw(geometry, context),
            RenderableElement::Candle(element) => element.draw(geometry, context),
            RenderableElement::Line(element) => element.draw(geometry, context),
            RenderableElement::Area(element) => element.draw(geometry, context),
            RenderableElement::Label(element) => element.draw(geometry, context),
            RenderableElement::AxisTick(element) => element.draw(geometry, context),
        }
    }

    /// Record fields the element plots on the value axis.
    #[must_use]
    pub fn value_fields(&self) -> SmallVec<[&str; 4]> {
        match self {
            RenderableElement::Candle(element) => SmallVec::from_slice(&[
                element.high_field.as_str(),
                element.low_field.as_str(),
            ]),
            RenderableElement::Bar(element) => SmallVec::from_slice(&[element.field.as_str()]),
            RenderableElement::Line(element) => SmallVec::from_slice(&[element.field.as_str()]),
            RenderableElement::Area(element) => SmallVec::from_slice(&[element.field.as_str()]),
            RenderableElement::Rule(_)
            | RenderableElement::Label(_)
            | RenderableElement::AxisTick(_) => SmallVec::new(),
        }
    }
}

impl From<CandleElement> for RenderableElement {
    fn from(value: CandleElement) -> Self {
        Self::Candle(value)
    }
}

impl From<LineElement> for RenderableElement {
    fn from(value: LineElement) -> Self {
        Self::Line(value)
    }
}

impl From<AreaElement> for RenderableElement {
    fn from(value: AreaElement) -> Self {
        Self::Area(value)
    }
}

impl From<BarElement> for RenderableElement {
    fn from(value: BarElement) -> Self {
        Self::Bar(value)
    }
}

impl From<RuleElement> for RenderableElement {
    fn from(value: RuleElement) -> Self {
        Self::Rule(value)
    }
}

impl From<LabelElement> for RenderableElement {
    fn from(value: LabelElement) -> Self {
        Self::Label(value)
    }
}

impl From<AxisTickElement> for RenderableElement {
    fn from(value: AxisTickElement) -> Self {
        Self::AxisTick(value)
    }
}
