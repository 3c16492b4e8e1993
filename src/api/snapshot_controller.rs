use serde::{Deserialize, Serialize};

use crate::core::{Interval, PaneId};
use crate::error::{ChartError, ChartResult};
use crate::interaction::{CrosshairState, ZoomTransform};
use crate::render::{RasterContext, RasterImage};

use super::ChartEngine;

/// Serializable per-pane view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneState {
    pub id: PaneId,
    pub free_pan: bool,
    pub value_domain: (f64, f64),
    pub value_transform: ZoomTransform,
    pub records: usize,
}

/// Serializable engine view state for host persistence and debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub is_pinned: bool,
    pub interval: Interval,
    pub visible_time_window: (f64, f64),
    pub time_transform: ZoomTransform,
    pub panes: Vec<PaneState>,
    pub crosshair: CrosshairState,
}

impl<C: RasterContext> ChartEngine<C> {
    #[must_use]
    pub fn state(&self) -> EngineState {
        EngineState {
            is_pinned: self.core.model.is_pinned,
            interval: self.core.model.config.interval,
            visible_time_window: self.visible_time_window(),
            time_transform: self.time_transform(),
            panes: self
                .core
                .model
                .panes
                .values()
                .map(|pane| PaneState {
                    id: pane.id().clone(),
                    free_pan: pane.is_free_pan(),
                    value_domain: pane.value_domain(),
                    value_transform: pane.value_transform(),
                    records: pane.data().len(),
                })
                .collect(),
            crosshair: self.core.runtime.crosshair.clone(),
        }
    }

    pub fn state_json(&self) -> ChartResult<String> {
        serde_json::to_string(&self.state())
            .map_err(|e| ChartError::InvalidData(format!("failed to serialize state: {e}")))
    }

    pub fn state_json_pretty(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(&self.state())
            .map_err(|e| ChartError::InvalidData(format!("failed to serialize state: {e}")))
    }

    /// Paints any pending frame and copies the surface pixels out.
    pub fn snapshot(&mut self) -> ChartResult<RasterImage> {
        if self.context.is_released() {
            return Err(ChartError::Backend(
                "cannot snapshot a released surface".to_owned(),
            ));
        }
        if self.core.runtime.needs_redraw {
            self.redraw()?;
        }
        self.context.snapshot()
    }
}
