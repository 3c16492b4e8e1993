use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::layout::validate_stretch_factor;
use crate::core::record::push_realtime;
use crate::core::{PaneId, Record, canonicalize_records, layout_panes};
use crate::error::{ChartError, ChartResult};
use crate::pane::{Pane, PaneSpec};
use crate::render::RasterContext;

use super::ChartEngine;
use super::chart_runtime::PointerCapture;

/// Records defining the shared time axis on their own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisSpec {
    #[serde(default)]
    pub data: Vec<Record>,
}

impl AxisSpec {
    #[must_use]
    pub fn new(data: Vec<Record>) -> Self {
        Self { data }
    }
}

impl<C: RasterContext> ChartEngine<C> {
    /// Replaces the pane stack and axis data.
    ///
    /// Panes whose id survives keep their free-pan flag and value transform;
    /// panes missing from `panes` are disposed. The first update that brings
    /// data in resets the view to the newest intervals.
    pub fn update(&mut self, panes: Vec<PaneSpec>, axis: AxisSpec) -> ChartResult<()> {
        if self.core.model.disposed {
            return Ok(());
        }
        let mut seen = HashSet::with_capacity(panes.len());
        for spec in &panes {
            validate_stretch_factor(spec.stretch_factor)?;
            if !seen.insert(spec.id.clone()) {
                return Err(ChartError::InvalidData(format!(
                    "duplicate pane id `{}`",
                    spec.id
                )));
            }
        }

        let had_data = self.core.model.latest_time_ms().is_some();
        let model = &mut self.core.model;
        let options = model.pane_options()?;
        let weights: Vec<(PaneId, f64)> = panes
            .iter()
            .map(|spec| (spec.id.clone(), spec.stretch_factor))
            .collect();
        let layout = layout_panes(model.viewport, model.config.axis_strips(), &weights);

        let mut previous = std::mem::take(&mut model.panes);
        let mut next = IndexMap::with_capacity(panes.len());
        for (spec, region) in panes.into_iter().zip(&layout.panes) {
            let pane = match previous.shift_remove(&spec.id) {
                Some(mut pane) => {
                    pane.update(spec)?;
                    pane
                }
                None => Pane::new(spec, region, options)?,
            };
            next.insert(pane.id().clone(), pane);
        }
        for (_, mut pane) in previous {
            pane.dispose();
        }
        model.panes = next;
        model.axis_data = canonicalize_records(axis.data);
        model.relayout();
        debug!(
            panes = model.panes.len(),
            axis_records = model.axis_data.len(),
            "update chart data"
        );

        self.release_stale_capture();
        self.sync_scene_nodes()?;
        if !had_data && self.core.model.latest_time_ms().is_some() {
            self.reset();
        } else {
            self.core.runtime.fetch.settle();
            self.core.runtime.needs_redraw = true;
        }
        Ok(())
    }

    /// Mounts one more pane below the existing ones.
    pub fn add_pane(&mut self, spec: PaneSpec) -> ChartResult<()> {
        if self.core.model.disposed {
            return Ok(());
        }
        if self.core.model.panes.contains_key(&spec.id) {
            return Err(ChartError::InvalidData(format!(
                "duplicate pane id `{}`",
                spec.id
            )));
        }
        let model = &mut self.core.model;
        let options = model.pane_options()?;
        let mut weights: Vec<(PaneId, f64)> = model
            .panes
            .values()
            .map(|pane| (pane.id().clone(), pane.stretch_factor()))
            .collect();
        weights.push((spec.id.clone(), spec.stretch_factor));
        let layout = layout_panes(model.viewport, model.config.axis_strips(), &weights);
        let Some(region) = layout.region(&spec.id) else {
            return Err(ChartError::UnknownPane(spec.id.to_string()));
        };
        let pane = Pane::new(spec, region, options)?;
        debug!(pane = %pane.id(), records = pane.data().len(), "add pane");
        model.panes.insert(pane.id().clone(), pane);
        model.relayout();

        self.sync_scene_nodes()?;
        self.core.runtime.fetch.settle();
        self.core.runtime.needs_redraw = true;
        Ok(())
    }

    /// Disposes and unmounts a pane. Returns `false` for unknown ids.
    pub fn remove_pane(&mut self, pane_id: &PaneId) -> bool {
        let model = &mut self.core.model;
        let Some(pane) = model.panes.get_mut(pane_id) else {
            return false;
        };
        pane.dispose();
        model.panes.shift_remove(pane_id);
        model.relayout();
        debug!(pane = %pane_id, "remove pane");

        if self.core.runtime.crosshair.pane.as_ref() == Some(pane_id) {
            self.core.runtime.crosshair.hide();
        }
        self.release_stale_capture();
        if let Err(err) = self.sync_scene_nodes() {
            warn!(error = %err, "failed to rebuild scene after pane removal");
        }
        self.core.runtime.needs_redraw = true;
        true
    }

    /// Streams one record into a pane.
    ///
    /// Newer time appends, equal time replaces the newest record, older time
    /// is rejected. While pinned the next redraw keeps the newest record at
    /// the fixed right offset.
    pub fn append_record(&mut self, pane_id: &PaneId, record: Record) -> ChartResult<()> {
        if self.core.model.disposed {
            return Ok(());
        }
        let had_data = self.core.model.latest_time_ms().is_some();
        let pane = self
            .core
            .model
            .panes
            .get_mut(pane_id)
            .ok_or_else(|| ChartError::UnknownPane(pane_id.to_string()))?;
        if pane.append_record(record)?.is_some() {
            self.after_append(had_data);
        }
        Ok(())
    }

    /// Streams one record into the axis data.
    pub fn append_axis_record(&mut self, record: Record) -> ChartResult<()> {
        if self.core.model.disposed {
            return Ok(());
        }
        let had_data = self.core.model.latest_time_ms().is_some();
        let update = push_realtime(&mut self.core.model.axis_data, record)?;
        trace!(?update, "append axis record");
        self.after_append(had_data);
        Ok(())
    }

    fn after_append(&mut self, had_data: bool) {
        if !had_data {
            self.reset();
            return;
        }
        self.core.runtime.needs_redraw = true;
    }

    pub(super) fn release_stale_capture(&mut self) {
        if let Some(PointerCapture::ValueAxis(pane_id)) = &self.core.runtime.capture {
            if !self.core.model.panes.contains_key(pane_id) {
                self.core.runtime.capture = None;
            }
        }
    }
}
