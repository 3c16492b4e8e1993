//! pane-chart: multi-pane financial charting core.
//!
//! The crate turns pane descriptions (renderable elements plus time-series
//! records) into zoomable, pannable candlestick/depth/price panes painted on a
//! raster surface. It is split into:
//!
//! - [`scene`]: retained display-object tree, geometry, hit-testing and the
//!   immediate-draw renderer.
//! - [`interaction`]: zoom transforms, constrained zoom behaviors, gesture
//!   interpretation and inertia.
//! - [`pane`]: one plotting region with its own value axis.
//! - [`api`]: the `ChartEngine` orchestrator keeping every pane on one shared
//!   time axis.

pub mod api;
pub mod core;
pub mod elements;
pub mod error;
pub mod interaction;
pub mod pane;
pub mod render;
pub mod scene;
pub mod telemetry;

pub use api::{ChartEngine, ChartEngineConfig};
pub use error::{ChartError, ChartResult};
