use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Bounds, Viewport};
use crate::error::{ChartError, ChartResult};

/// Identifier of a pane, as named by the panel description (`"main"`,
/// `"volume"`, `"macd"`...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaneId(String);

impl PaneId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaneId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Fixed strips reserved around the pane stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisStrips {
    pub time_axis_height: f64,
    pub value_axis_width: f64,
}

impl AxisStrips {
    pub fn validate(self, viewport: Viewport) -> ChartResult<Self> {
        let fits = |size: f64, total: u32| size.is_finite() && size >= 0.0 && size < f64::from(total);
        if !fits(self.time_axis_height, viewport.height)
            || !fits(self.value_axis_width, viewport.width)
        {
            return Err(ChartError::InvalidExtent(
                "axis strips must be finite, >= 0 and smaller than the viewport".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Resolved rectangles for one pane: its plot area and its value-axis strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneLayoutRegion {
    pub pane_id: PaneId,
    pub plot: Bounds,
    pub value_axis: Bounds,
}

/// Full chart layout: panes stacked top to bottom above the time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLayout {
    pub panes: Vec<PaneLayoutRegion>,
    pub time_axis: Bounds,
    pub plot_width: f64,
}

impl ChartLayout {
    #[must_use]
    pub fn region(&self, pane_id: &PaneId) -> Option<&PaneLayoutRegion> {
        self.panes.iter().find(|region| &region.pane_id == pane_id)
    }
}

pub fn validate_stretch_factor(stretch_factor: f64) -> ChartResult<()> {
    if !stretch_factor.is_finite() || stretch_factor <= 0.0 {
        return Err(ChartError::InvalidData(
            "pane stretch factor must be finite and > 0".to_owned(),
        ));
    }
    Ok(())
}

/// Splits the plot area between panes proportionally to their stretch
/// factors. Non-positive weights collapse to zero height; if every weight is
/// unusable the panes share the height equally.
#[must_use]
pub fn layout_panes(viewport: Viewport, strips: AxisStrips, panes: &[(PaneId, f64)]) -> ChartLayout {
    let width = f64::from(viewport.width);
    let height = f64::from(viewport.height);
    let plot_width = (width - strips.value_axis_width).max(0.0);
    let plot_bottom = (height - strips.time_axis_height).max(0.0);
    let time_axis = Bounds::new(0.0, plot_bottom, width, height - plot_bottom);

    let mut weights: Vec<f64> = panes
        .iter()
        .map(|(_, weight)| {
            if weight.is_finite() && *weight > 0.0 {
                *weight
            } else {
                0.0
            }
        })
        .collect();
    let weight_sum: f64 = weights.iter().sum();
    if !weight_sum.is_finite() || weight_sum <= 0.0 {
        let equal = 1.0 / (panes.len().max(1) as f64);
        weights.fill(equal);
    } else {
        for weight in &mut weights {
            *weight /= weight_sum;
        }
    }

    let mut regions = Vec::with_capacity(panes.len());
    let mut cursor = 0.0;
    let last_index = panes.len().saturating_sub(1);
    for (index, (pane_id, _)) in panes.iter().enumerate() {
        let next = if index == last_index {
            plot_bottom
        } else {
            (cursor + plot_bottom * weights[index]).clamp(cursor, plot_bottom)
        };
        regions.push(PaneLayoutRegion {
            pane_id: pane_id.clone(),
            plot: Bounds::new(0.0, cursor, plot_width, next - cursor),
            value_axis: Bounds::new(plot_width, cursor, strips.value_axis_width, next - cursor),
        });
        cursor = next;
    }

    ChartLayout {
        panes: regions,
        time_axis,
        plot_width,
    }
}

#[cfg(test)]
mod tests {
    use super::{AxisStrips, PaneId, layout_panes};
    use crate::core::Viewport;

    #[test]
    fn panes_split_plot_height_by_weight_above_time_axis() {
        let strips = AxisStrips {
            time_axis_height: 20.0,
            value_axis_width: 60.0,
        };
        let layout = layout_panes(
            Viewport::new(860, 320),
            strips,
            &[(PaneId::new("main"), 2.0), (PaneId::new("volume"), 1.0)],
        );
        assert_eq!(layout.plot_width, 800.0);
        assert!((layout.panes[0].plot.height - 200.0).abs() <= 1e-9);
        assert!((layout.panes[1].plot.y - 200.0).abs() <= 1e-9);
        assert!((layout.panes[1].plot.bottom() - 300.0).abs() <= 1e-9);
        assert_eq!(layout.panes[1].value_axis.x, 800.0);
        assert_eq!(layout.time_axis.y, 300.0);
    }

    #[test]
    fn strips_larger_than_viewport_are_rejected() {
        let strips = AxisStrips {
            time_axis_height: 400.0,
            value_axis_width: 60.0,
        };
        assert!(strips.validate(Viewport::new(800, 300)).is_err());
    }
}
