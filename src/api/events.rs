use std::sync::mpsc::Sender;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::primitives::millis_to_datetime;
use crate::core::{Interval, PaneId, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::interaction::CrosshairState;

/// Request for older data emitted when the visible window nears the start
/// of the loaded records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub interval: Interval,
    pub from_ms: f64,
    pub to_ms: f64,
}

impl FetchRequest {
    #[must_use]
    pub fn from(self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.from_ms)
    }

    #[must_use]
    pub fn to(self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.to_ms)
    }
}

/// Host-facing notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartEvent {
    Redraw,
    BoundsChanged {
        width: u32,
        height: u32,
        pixel_ratio: f64,
    },
    ViewportChanged {
        start_ms: f64,
        end_ms: f64,
        is_pinned: bool,
    },
    MouseMove {
        pane: PaneId,
        index: Option<usize>,
        time_ms: Option<f64>,
        value: f64,
        x: f64,
        y: f64,
    },
    MouseOut,
    FetchData(FetchRequest),
    DblClick {
        pane: Option<PaneId>,
        x: f64,
        y: f64,
    },
    ContextMenu {
        pane: Option<PaneId>,
        x: f64,
        y: f64,
    },
}

/// Read-only engine state passed along with every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartContext {
    pub viewport: Viewport,
    pub pixel_ratio: f64,
    pub visible_time_window: (f64, f64),
    pub is_pinned: bool,
    pub pane_count: usize,
    pub crosshair: CrosshairState,
}

/// Typed observer of chart events.
pub trait ChartListener {
    fn id(&self) -> &str;
    fn on_event(&mut self, event: &ChartEvent, context: &ChartContext) -> ChartResult<()>;
}

/// Forwards every event into an `mpsc` channel.
#[derive(Debug)]
pub struct ChannelListener {
    id: String,
    sender: Sender<ChartEvent>,
}

impl ChannelListener {
    #[must_use]
    pub fn new(id: impl Into<String>, sender: Sender<ChartEvent>) -> Self {
        Self {
            id: id.into(),
            sender,
        }
    }
}

impl ChartListener for ChannelListener {
    fn id(&self) -> &str {
        &self.id
    }

    fn on_event(&mut self, event: &ChartEvent, _context: &ChartContext) -> ChartResult<()> {
        self.sender
            .send(event.clone())
            .map_err(|_| ChartError::InvalidData(format!("listener `{}` channel closed", self.id)))
    }
}
