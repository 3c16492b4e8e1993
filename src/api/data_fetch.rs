use tracing::debug;

use crate::render::RasterContext;

use super::{ChartEngine, ChartEvent, FetchRequest};

/// Fires at most one fetch per settled view state.
///
/// Every zoom end, inertia finish, data update or reset opens a new epoch;
/// a request is only emitted once per epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct FetchGate {
    epoch: u64,
    fired_epoch: Option<u64>,
}

impl FetchGate {
    pub(super) fn settle(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    #[must_use]
    pub(super) fn is_spent(self) -> bool {
        self.fired_epoch == Some(self.epoch)
    }

    pub(super) fn mark_fired(&mut self) {
        self.fired_epoch = Some(self.epoch);
    }
}

impl<C: RasterContext> ChartEngine<C> {
    /// Older data to request for the current view, if any.
    ///
    /// Triggers when the visible window starts within one window-span of the
    /// earliest loaded record; asks for one span before that record.
    #[must_use]
    pub fn pending_fetch(&self) -> Option<FetchRequest> {
        let earliest = self.core.model.earliest_time_ms()?;
        let (start, end) = self.visible_time_window();
        let span = end - start;
        if !span.is_finite() || span <= 0.0 || start >= earliest + span {
            return None;
        }
        Some(FetchRequest {
            interval: self.core.model.config.interval,
            from_ms: earliest - span,
            to_ms: earliest,
        })
    }

    pub(super) fn maybe_request_fetch(&mut self) {
        if self.core.runtime.fetch.is_spent() || self.core.model.is_interacting() {
            return;
        }
        let Some(request) = self.pending_fetch() else {
            return;
        };
        self.core.runtime.fetch.mark_fired();
        debug!(
            from_ms = request.from_ms,
            to_ms = request.to_ms,
            interval = %request.interval,
            "request older data"
        );
        self.emit(ChartEvent::FetchData(request));
    }
}
