use kurbo::Affine;
use tracing::trace;

use crate::error::{ChartError, ChartResult};
use crate::render::{Color, RasterContext, TextRun};
use crate::scene::{DisplayObject, GeometryItem, NodeId, SceneGraph, Shape};

/// Counters for one draw pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub nodes_visited: usize,
    pub fills: usize,
    pub strokes: usize,
    pub texts: usize,
}

impl RenderStats {
    fn merge(&mut self, other: RenderStats) {
        self.nodes_visited += other.nodes_visited;
        self.fills += other.fills;
        self.strokes += other.strokes;
        self.texts += other.texts;
    }
}

/// Walks a display tree depth-first and paints it onto a raster context.
///
/// Sizes are in CSS pixels; the backing store is `size * pixel_ratio` device
/// pixels and every transform is pre-multiplied by the pixel ratio so drawing
/// code never deals with device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    width: f64,
    height: f64,
    pixel_ratio: f64,
    background: Color,
}

impl Renderer {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> ChartResult<Self> {
        validate_size(width, height, pixel_ratio)?;
        Ok(Self {
            width,
            height,
            pixel_ratio,
            background: Color::WHITE,
        })
    }

    #[must_use]
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Device-space transform applied beneath every node transform.
    #[must_use]
    pub fn base_transform(&self) -> Affine {
        Affine::scale(self.pixel_ratio)
    }

    /// Resizes the backing surface and re-applies the pixel ratio.
    pub fn resize<C: RasterContext + ?Sized>(
        &mut self,
        context: &mut C,
        width: f64,
        height: f64,
        pixel_ratio: f64,
    ) -> ChartResult<()> {
        validate_size(width, height, pixel_ratio)?;
        let width_px = (width * pixel_ratio).round().max(1.0) as u32;
        let height_px = (height * pixel_ratio).round().max(1.0) as u32;
        context.resize(width_px, height_px)?;
        self.width = width;
        self.height = height;
        self.pixel_ratio = pixel_ratio;
        context.set_transform(self.base_transform());
        trace!(width, height, pixel_ratio, width_px, height_px, "resize raster surface");
        Ok(())
    }

    /// Clears the surface, then paints the tree.
    pub fn render<T, C: RasterContext + ?Sized>(
        &self,
        context: &mut C,
        graph: &SceneGraph<T>,
    ) -> ChartResult<RenderStats> {
        if context.is_released() {
            return Ok(RenderStats::default());
        }
        context.clear(self.background)?;
        self.render_overlay(context, graph)
    }

    /// Paints the tree over whatever the surface already holds.
    pub fn render_overlay<T, C: RasterContext + ?Sized>(
        &self,
        context: &mut C,
        graph: &SceneGraph<T>,
    ) -> ChartResult<RenderStats> {
        if context.is_released() {
            return Ok(RenderStats::default());
        }
        self.render_node(context, graph, graph.root(), self.base_transform())
    }

    fn render_node<T, C: RasterContext + ?Sized>(
        &self,
        context: &mut C,
        graph: &SceneGraph<T>,
        node: NodeId,
        parent_transform: Affine,
    ) -> ChartResult<RenderStats> {
        let Some(entry) = graph.get(node) else {
            return Ok(RenderStats::default());
        };
        if !entry.visible {
            return Ok(RenderStats::default());
        }

        let transform = parent_transform * entry.transform.to_affine();
        let Some(clip) = entry.clip else {
            return self.paint_subtree(context, graph, entry, transform);
        };
        context.set_transform(transform);
        context.push_clip(clip)?;
        let painted = self.paint_subtree(context, graph, entry, transform);
        context.pop_clip();
        painted
    }

    fn paint_subtree<T, C: RasterContext + ?Sized>(
        &self,
        context: &mut C,
        graph: &SceneGraph<T>,
        entry: &DisplayObject<T>,
        transform: Affine,
    ) -> ChartResult<RenderStats> {
        let mut stats = RenderStats {
            nodes_visited: 1,
            ..RenderStats::default()
        };

        if !entry.geometry.is_empty() {
            context.set_transform(transform);
            for item in entry.geometry.items() {
                paint_item(context, item, &mut stats)?;
            }
        }

        for child in entry.children() {
            stats.merge(self.render_node(context, graph, *child, transform)?);
        }
        Ok(stats)
    }
}

/// Paints one geometry record: fill first, then stroke.
fn paint_item<C: RasterContext + ?Sized>(
    context: &mut C,
    item: &GeometryItem,
    stats: &mut RenderStats,
) -> ChartResult<()> {
    if let Shape::Text {
        text,
        origin,
        style,
    } = &item.shape
    {
        if !text.is_empty() {
            context.fill_text(&TextRun {
                text,
                origin: *origin,
                style: *style,
            })?;
            stats.texts += 1;
        }
        return Ok(());
    }

    if let Some(fill) = item.fill.as_ref().filter(|fill| fill.is_paintable()) {
        if let Some(path) = item.shape.fill_path() {
            context.fill_path(&path, fill)?;
            stats.fills += 1;
        }
    }
    if let Some(line) = item.line.as_ref().filter(|line| line.is_paintable()) {
        if let Some(path) = item.shape.stroke_path() {
            context.stroke_path(&path, line)?;
            stats.strokes += 1;
        }
    }
    Ok(())
}

fn validate_size(width: f64, height: f64, pixel_ratio: f64) -> ChartResult<()> {
    if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
        return Err(ChartError::InvalidExtent(
            "device pixel ratio must be finite and > 0".to_owned(),
        ));
    }
    if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
        return Err(ChartError::InvalidViewport {
            width: width.max(0.0) as u32,
            height: height.max(0.0) as u32,
        });
    }
    Ok(())
}
