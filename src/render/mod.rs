mod context;
mod primitives;
mod recording;

pub use context::{RasterContext, RasterImage, TextRun};
pub use primitives::{Color, FillStyle, LineStyle, TextHAlign, TextStyle};
pub use recording::{DrawCommand, RecordingContext};

#[cfg(feature = "cairo-backend")]
mod cairo_backend;
#[cfg(feature = "cairo-backend")]
pub use cairo_backend::CairoContext;
