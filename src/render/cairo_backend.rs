use cairo::{Context, Format, ImageSurface, Matrix};
use kurbo::{Affine, BezPath, PathEl, Rect};
use pango::FontDescription;

use crate::error::{ChartError, ChartResult};
use crate::render::{
    Color, FillStyle, LineStyle, RasterContext, RasterImage, TextHAlign, TextRun,
};

/// Cairo + Pango raster surface.
///
/// Owns an ARGB32 image surface and a drawing context bound to it; `resize`
/// recreates both.
#[derive(Debug)]
pub struct CairoContext {
    surface: ImageSurface,
    context: Context,
    released: bool,
}

impl CairoContext {
    pub fn new(width_px: u32, height_px: u32) -> ChartResult<Self> {
        let (surface, context) = create_surface(width_px, height_px)?;
        Ok(Self {
            surface,
            context,
            released: false,
        })
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        "cairo+pango+pangocairo"
    }

    #[must_use]
    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    fn append_path(&self, path: &BezPath) {
        self.context.new_path();
        for element in path.elements() {
            match *element {
                PathEl::MoveTo(p) => self.context.move_to(p.x, p.y),
                PathEl::LineTo(p) => self.context.line_to(p.x, p.y),
                PathEl::QuadTo(c, p) => self.context.curve_to(c.x, c.y, c.x, c.y, p.x, p.y),
                PathEl::CurveTo(c1, c2, p) => {
                    self.context.curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y);
                }
                PathEl::ClosePath => self.context.close_path(),
            }
        }
    }
}

impl RasterContext for CairoContext {
    fn resize(&mut self, width_px: u32, height_px: u32) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        let (surface, context) = create_surface(width_px, height_px)?;
        self.surface = surface;
        self.context = context;
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (
            u32::try_from(self.surface.width()).unwrap_or(0),
            u32::try_from(self.surface.height()).unwrap_or(0),
        )
    }

    fn clear(&mut self, color: Color) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        color.validate()?;
        self.context.save().map_err(|err| map_backend_error("failed to save state", err))?;
        self.context.identity_matrix();
        self.context.set_operator(cairo::Operator::Source);
        apply_color(&self.context, color);
        let painted = self.context.paint();
        self.context
            .restore()
            .map_err(|err| map_backend_error("failed to restore state", err))?;
        painted.map_err(|err| map_backend_error("failed to clear surface", err))
    }

    fn set_transform(&mut self, transform: Affine) {
        if self.released {
            return;
        }
        let [a, b, c, d, e, f] = transform.as_coeffs();
        self.context.set_matrix(Matrix::new(a, b, c, d, e, f));
    }

    fn fill_path(&mut self, path: &BezPath, style: &FillStyle) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        style.color.validate()?;
        self.append_path(path);
        apply_color(&self.context, style.effective_color());
        self.context
            .fill()
            .map_err(|err| map_backend_error("failed to fill path", err))
    }

    fn stroke_path(&mut self, path: &BezPath, style: &LineStyle) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        style.color.validate()?;
        self.append_path(path);
        apply_color(&self.context, style.effective_color());
        self.context.set_line_width(style.width);
        self.context.set_dash(&style.dash, 0.0);
        self.context
            .stroke()
            .map_err(|err| map_backend_error("failed to stroke path", err))
    }

    fn fill_text(&mut self, run: &TextRun<'_>) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        run.style.color.validate()?;
        let layout = pangocairo::functions::create_layout(&self.context);
        let font_description =
            FontDescription::from_string(&format!("Sans {}px", run.style.font_size_px));
        layout.set_font_description(Some(&font_description));
        layout.set_text(run.text);

        let (text_width, text_height) = layout.pixel_size();
        let x = match run.style.h_align {
            TextHAlign::Left => run.origin.x,
            TextHAlign::Center => run.origin.x - f64::from(text_width) / 2.0,
            TextHAlign::Right => run.origin.x - f64::from(text_width),
        };

        apply_color(&self.context, run.style.color);
        // Origin is the vertical center of the run.
        self.context.move_to(x, run.origin.y - f64::from(text_height) / 2.0);
        pangocairo::functions::show_layout(&self.context, &layout);
        Ok(())
    }

    fn push_clip(&mut self, rect: Rect) -> ChartResult<()> {
        if self.released {
            return Ok(());
        }
        self.context
            .save()
            .map_err(|err| map_backend_error("failed to save clip state", err))?;
        let rect = rect.abs();
        self.context.new_path();
        self.context.rectangle(rect.x0, rect.y0, rect.width(), rect.height());
        self.context.clip();
        Ok(())
    }

    fn pop_clip(&mut self) {
        if self.released {
            return;
        }
        // Restores the matrix too.
        if let Err(err) = self.context.restore() {
            tracing::warn!(error = %err, "failed to restore clip state");
        }
    }

    fn snapshot(&self) -> ChartResult<RasterImage> {
        let (width, height) = self.size();
        let mut copy = ImageSurface::create(Format::ARgb32, width as i32, height as i32)
            .map_err(|err| map_backend_error("failed to create snapshot surface", err))?;
        {
            let context = Context::new(&copy)
                .map_err(|err| map_backend_error("failed to create snapshot context", err))?;
            context
                .set_source_surface(&self.surface, 0.0, 0.0)
                .map_err(|err| map_backend_error("failed to set snapshot source", err))?;
            context
                .paint()
                .map_err(|err| map_backend_error("failed to copy surface", err))?;
        }
        copy.flush();
        let stride = copy.stride() as usize;
        let data = copy
            .data()
            .map_err(|err| ChartError::Backend(format!("failed to borrow snapshot data: {err}")))?;

        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for row in 0..height as usize {
            for column in 0..width as usize {
                let offset = row * stride + column * 4;
                // ARGB32 is native-endian premultiplied BGRA on little-endian hosts.
                let pixel = u32::from_ne_bytes([
                    data[offset],
                    data[offset + 1],
                    data[offset + 2],
                    data[offset + 3],
                ]);
                let alpha = (pixel >> 24) & 0xff;
                let unpremultiply = |channel: u32| -> u8 {
                    if alpha == 0 {
                        0
                    } else {
                        ((channel * 255 + alpha / 2) / alpha).min(255) as u8
                    }
                };
                rgba.push(unpremultiply((pixel >> 16) & 0xff));
                rgba.push(unpremultiply((pixel >> 8) & 0xff));
                rgba.push(unpremultiply(pixel & 0xff));
                rgba.push(alpha as u8);
            }
        }

        Ok(RasterImage {
            width,
            height,
            rgba,
        })
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

fn create_surface(width_px: u32, height_px: u32) -> ChartResult<(ImageSurface, Context)> {
    if width_px == 0 || height_px == 0 {
        return Err(ChartError::InvalidViewport {
            width: width_px,
            height: height_px,
        });
    }
    let width = i32::try_from(width_px)
        .map_err(|_| ChartError::InvalidData("surface width exceeds i32".to_owned()))?;
    let height = i32::try_from(height_px)
        .map_err(|_| ChartError::InvalidData("surface height exceeds i32".to_owned()))?;
    let surface = ImageSurface::create(Format::ARgb32, width, height)
        .map_err(|err| map_backend_error("failed to create cairo surface", err))?;
    let context = Context::new(&surface)
        .map_err(|err| map_backend_error("failed to create cairo context", err))?;
    Ok((surface, context))
}

fn apply_color(context: &Context, color: Color) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha);
}

fn map_backend_error(prefix: &str, err: cairo::Error) -> ChartError {
    ChartError::Backend(format!("{prefix}: {err}"))
}
