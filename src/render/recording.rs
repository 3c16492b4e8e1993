use kurbo::{Affine, BezPath, Point, Rect, Shape};

use crate::error::{ChartError, ChartResult};
use crate::render::{Color, FillStyle, LineStyle, RasterContext, RasterImage, TextRun, TextStyle};
use crate::scene::text_bounds;

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Resize { width_px: u32, height_px: u32 },
    Clear(Color),
    SetTransform(Affine),
    /// Active clip after the push, in device pixels.
    PushClip(Rect),
    PopClip,
    Fill { path: BezPath, style: FillStyle },
    Stroke { path: BezPath, style: LineStyle },
    Text {
        text: String,
        origin: Point,
        style: TextStyle,
    },
}

/// Headless surface used by tests and by hosts that only need interaction.
///
/// Every call is validated and appended to a command log so callers can
/// assert paint order, transforms and styles without a real raster backend.
/// Marks whose device-space bounds fall entirely outside the active clip are
/// dropped, as a rasterizer would leave them unpainted.
#[derive(Debug, Default)]
pub struct RecordingContext {
    width_px: u32,
    height_px: u32,
    commands: Vec<DrawCommand>,
    transform: Affine,
    clips: Vec<Rect>,
    released: bool,
}

impl RecordingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands recorded since the most recent clear (i.e. the last frame).
    #[must_use]
    pub fn last_frame(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|command| matches!(command, DrawCommand::Clear(_)))
            .unwrap_or(0);
        &self.commands[start..]
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    #[must_use]
    pub fn count_fills(&self) -> usize {
        self.last_frame()
            .iter()
            .filter(|command| matches!(command, DrawCommand::Fill { .. }))
            .count()
    }

    #[must_use]
    pub fn count_strokes(&self) -> usize {
        self.last_frame()
            .iter()
            .filter(|command| matches!(command, DrawCommand::Stroke { .. }))
            .count()
    }

    /// Text of every label drawn in the last frame, in paint order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.last_frame()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Active clip in device pixels, if any.
    #[must_use]
    pub fn clip(&self) -> Option<Rect> {
        self.clips.last().copied()
    }

    fn record(&mut self, command: DrawCommand) {
        if !self.released {
            self.commands.push(command);
        }
    }

    fn clipped_out(&self, user_bounds: Rect) -> bool {
        let Some(clip) = self.clip() else {
            return false;
        };
        let bounds = self.transform.transform_rect_bbox(user_bounds);
        bounds.x1 < clip.x0 || bounds.x0 > clip.x1 || bounds.y1 < clip.y0 || bounds.y0 > clip.y1
    }
}

impl RasterContext for RecordingContext {
    fn resize(&mut self, width_px: u32, height_px: u32) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        if width_px == 0 || height_px == 0 {
            return Err(ChartError::InvalidViewport {
                width: width_px,
                height: height_px,
            });
        }
        self.width_px = width_px;
        self.height_px = height_px;
        self.record(DrawCommand::Resize {
            width_px,
            height_px,
        });
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    fn clear(&mut self, color: Color) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        color.validate()?;
        self.record(DrawCommand::Clear(color));
        Ok(())
    }

    fn set_transform(&mut self, transform: Affine) {
        if self.released {
            return;
        }
        self.transform = transform;
        self.record(DrawCommand::SetTransform(transform));
    }

    fn fill_path(&mut self, path: &BezPath, style: &FillStyle) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        style.color.validate()?;
        if self.clipped_out(path.bounding_box()) {
            return Ok(());
        }
        self.record(DrawCommand::Fill {
            path: path.clone(),
            style: *style,
        });
        Ok(())
    }

    fn stroke_path(&mut self, path: &BezPath, style: &LineStyle) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        style.color.validate()?;
        if !style.width.is_finite() || style.width <= 0.0 {
            return Err(ChartError::InvalidData(
                "line stroke width must be finite and > 0".to_owned(),
            ));
        }
        if self.clipped_out(path.bounding_box().inflate(style.width / 2.0, style.width / 2.0)) {
            return Ok(());
        }
        self.record(DrawCommand::Stroke {
            path: path.clone(),
            style: style.clone(),
        });
        Ok(())
    }

    fn fill_text(&mut self, run: &TextRun<'_>) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        if run.text.is_empty() {
            return Err(ChartError::InvalidData(
                "text run must not be empty".to_owned(),
            ));
        }
        if !run.origin.x.is_finite() || !run.origin.y.is_finite() {
            return Err(ChartError::InvalidData(
                "text coordinates must be finite".to_owned(),
            ));
        }
        run.style.color.validate()?;
        if self.clipped_out(text_bounds(run.text, run.origin, &run.style)) {
            return Ok(());
        }
        self.record(DrawCommand::Text {
            text: run.text.to_owned(),
            origin: run.origin,
            style: run.style,
        });
        Ok(())
    }

    fn push_clip(&mut self, rect: Rect) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        if !(rect.x0.is_finite() && rect.y0.is_finite() && rect.x1.is_finite() && rect.y1.is_finite()) {
            return Err(ChartError::InvalidData(
                "clip rectangle must be finite".to_owned(),
            ));
        }
        let device = self.transform.transform_rect_bbox(rect.abs());
        let clip = match self.clip() {
            Some(outer) => outer.intersect(device),
            None => device,
        };
        self.clips.push(clip);
        self.record(DrawCommand::PushClip(clip));
        Ok(())
    }

    fn pop_clip(&mut self) {
        if self.released {
            return;
        }
        if self.clips.pop().is_some() {
            self.record(DrawCommand::PopClip);
        }
    }

    fn snapshot(&self) -> ChartResult<RasterImage> {
        Err(ChartError::Backend(
            "recording surface holds no pixels to snapshot".to_owned(),
        ))
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn is_released(&self) -> bool {
        self.released
    }
}
