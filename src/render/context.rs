use kurbo::{Affine, BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::error::ChartResult;
use crate::render::{Color, FillStyle, LineStyle, TextStyle};

/// One positioned text label in user space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub origin: Point,
    pub style: TextStyle,
}

/// Captured surface pixels, RGBA8, row-major, not premultiplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl RasterImage {
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        let px = self.rgba.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Immediate-mode 2D drawing surface.
///
/// The scene renderer walks the display tree and issues these calls; backends
/// never see chart-domain types. Once [`RasterContext::release`] has been
/// called every drawing call must be a silent no-op.
pub trait RasterContext {
    /// Resizes the backing store to device pixels.
    fn resize(&mut self, width_px: u32, height_px: u32) -> ChartResult<()>;

    /// Backing store size in device pixels.
    fn size(&self) -> (u32, u32);

    /// Fills the whole surface, ignoring the current transform.
    fn clear(&mut self, color: Color) -> ChartResult<()>;

    /// Replaces the user-space to device-space transform.
    fn set_transform(&mut self, transform: Affine);

    fn fill_path(&mut self, path: &BezPath, style: &FillStyle) -> ChartResult<()>;

    fn stroke_path(&mut self, path: &BezPath, style: &LineStyle) -> ChartResult<()>;

    fn fill_text(&mut self, run: &TextRun<'_>) -> ChartResult<()>;

    /// Saves the clip region and intersects it with `rect`, given in the
    /// current user space. Survives later [`RasterContext::set_transform`]
    /// calls until the matching [`RasterContext::pop_clip`].
    fn push_clip(&mut self, rect: Rect) -> ChartResult<()>;

    /// Restores the clip region saved by the innermost `push_clip`.
    fn pop_clip(&mut self);

    /// Copies the current pixels out of the surface.
    fn snapshot(&self) -> ChartResult<RasterImage>;

    /// Tears the surface down; later calls become no-ops.
    fn release(&mut self);

    fn is_released(&self) -> bool;
}
