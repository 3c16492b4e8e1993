use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::PaneId;
use crate::error::ChartResult;
use crate::scene::{NodeId, Renderer, SceneGraph};

use super::ChartEngineConfig;

/// Interactive regions the engine routes pointer input to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pane", rename_all = "snake_case")]
pub enum HitTarget {
    PlotArea(PaneId),
    ValueAxis(PaneId),
    TimeAxis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct PaneNodes {
    pub(super) plot: NodeId,
    pub(super) value_axis: NodeId,
}

/// Retained display trees and the renderer that paints them.
///
/// The plot scene clears the surface; the axis scene is painted over it so
/// axes, tooltips and the crosshair always sit on top of the series.
pub(super) struct ChartPresentationState {
    pub(super) renderer: Renderer,
    pub(super) plot_scene: SceneGraph<HitTarget>,
    pub(super) axis_scene: SceneGraph<HitTarget>,
    pub(super) pane_nodes: IndexMap<PaneId, PaneNodes>,
    /// Parent of every value-axis node, painted below the crosshair.
    pub(super) value_axes_layer: NodeId,
    pub(super) time_axis_node: NodeId,
    pub(super) crosshair_node: NodeId,
}

impl ChartPresentationState {
    pub(super) fn new(config: &ChartEngineConfig) -> ChartResult<Self> {
        let renderer = Renderer::new(
            f64::from(config.viewport.width),
            f64::from(config.viewport.height),
            config.pixel_ratio,
        )?
        .with_background(config.style.background);
        let plot_scene = SceneGraph::new();
        let mut axis_scene = SceneGraph::new();
        let value_axes_layer = axis_scene.create_child(axis_scene.root())?;
        let time_axis_node = axis_scene.create_child(axis_scene.root())?;
        axis_scene.set_interactive(time_axis_node, Some(HitTarget::TimeAxis));
        let crosshair_node = axis_scene.create_child(axis_scene.root())?;

        Ok(Self {
            renderer,
            plot_scene,
            axis_scene,
            pane_nodes: IndexMap::new(),
            value_axes_layer,
            time_axis_node,
            crosshair_node,
        })
    }
}
