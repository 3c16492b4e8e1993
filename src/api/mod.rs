mod chart_model;
mod chart_presentation;
mod chart_runtime;
mod crosshair_controller;
mod data_fetch;
mod engine;
mod engine_config;
mod engine_core;
mod engine_init;
mod event_dispatch;
mod events;
mod input_controller;
mod listener_registry;
mod pane_controller;
mod redraw;
mod scene_builder;
mod snapshot_controller;
mod time_axis_controller;

pub use chart_presentation::HitTarget;
pub use engine::ChartEngine;
pub use engine_config::{ChartEngineConfig, ChartStyle};
pub use events::{ChannelListener, ChartContext, ChartEvent, ChartListener, FetchRequest};
pub use pane_controller::AxisSpec;
pub use snapshot_controller::{EngineState, PaneState};
