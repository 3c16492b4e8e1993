pub mod interval;
pub mod layout;
pub mod primitives;
pub mod record;
pub mod scale;
pub mod time_scale;
pub mod types;
pub mod windowing;

pub use interval::Interval;
pub use layout::{AxisStrips, ChartLayout, PaneId, PaneLayoutRegion, layout_panes};
pub use record::{Record, canonicalize_records};
pub use scale::LinearScale;
pub use time_scale::TimeScale;
pub use types::{Bounds, Viewport};
pub use windowing::{index_at_pixel, nearest_index, padded_extent, value_extent};
