use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::elements::DrawContext;
use crate::render::{FillStyle, LineStyle};
use crate::scene::Geometry;

/// Poly-line through `field`; records missing the field break the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineElement {
    pub field: String,
    pub line: LineStyle,
}

impl LineElement {
    #[must_use]
    pub fn new(field: impl Into<String>, line: LineStyle) -> Self {
        Self {
            field: field.into(),
            line,
        }
    }

    pub fn draw(&self, geometry: &mut Geometry, context: &DrawContext<'_>) {
        for run in point_runs(&self.field, context) {
            if run.len() >= 2 {
                geometry.stroke_polyline(run, self.line.clone());
            }
        }
    }
}

/// Where an area's fill stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AreaBaseline {
    /// Bottom edge of the pane.
    #[default]
    Bottom,
    Value(f64),
}

/// Region under `field` filled down to a baseline; only the curve is
/// stroked, which gives depth and price charts their half-filled look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaElement {
    pub field: String,
    #[serde(default)]
    pub baseline: AreaBaseline,
    pub fill: FillStyle,
    #[serde(default)]
    pub line: Option<LineStyle>,
}

impl AreaElement {
    #[must_use]
    pub fn new(field: impl Into<String>, fill: FillStyle) -> Self {
        Self {
            field: field.into(),
            baseline: AreaBaseline::Bottom,
            fill,
            line: None,
        }
    }

    #[must_use]
    pub fn with_line(mut self, line: LineStyle) -> Self {
        self.line = Some(line);
        self
    }

    #[must_use]
    pub fn with_baseline(mut self, baseline: AreaBaseline) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn draw(&self, geometry: &mut Geometry, context: &DrawContext<'_>) {
        let baseline = match self.baseline {
            AreaBaseline::Bottom => context.height,
            AreaBaseline::Value(value) => context.y(value),
        };
        for run in point_runs(&self.field, context) {
            if run.len() >= 2 {
                geometry.area(run, baseline, self.fill, self.line.clone());
            }
        }
    }
}

fn point_runs(field: &str, context: &DrawContext<'_>) -> Vec<Vec<Point>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for record in context.visible_records(1) {
        match record.value(field) {
            Some(value) => current.push(Point::new(context.x(record), context.y(value))),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}
