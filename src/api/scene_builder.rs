use kurbo::{Point, Rect};

use crate::core::primitives::millis_to_datetime;
use crate::core::{Bounds, Interval, LinearScale, TimeScale};
use crate::elements::{
    AxisTickElement, DrawContext, TickAxis, crisp_coordinate as crisp, format_value_tick,
};
use crate::error::ChartResult;
use crate::pane::Pane;
use crate::render::{FillStyle, RasterContext, TextHAlign, TextStyle};
use crate::scene::{Geometry, NodeTransform, Shape};

use super::chart_presentation::{ChartPresentationState, PaneNodes};
use super::{ChartEngine, ChartStyle, HitTarget};

const VALUE_TICK_LENGTH: f64 = 4.0;
const TIME_TICK_LENGTH: f64 = 4.0;
const TOOLTIP_PADDING: f64 = 4.0;

impl<C: RasterContext> ChartEngine<C> {
    /// Mirrors the pane stack into the display trees: one plot node and one
    /// value-axis node per pane, in pane order, placed at their layout
    /// rectangles and clipped to them.
    pub(super) fn sync_scene_nodes(&mut self) -> ChartResult<()> {
        let model = &self.core.model;
        let ChartPresentationState {
            plot_scene,
            axis_scene,
            pane_nodes,
            value_axes_layer,
            time_axis_node,
            ..
        } = &mut self.core.presentation;

        pane_nodes.retain(|pane_id, nodes| {
            let mounted = model.panes.contains_key(pane_id);
            if !mounted {
                plot_scene.destroy(nodes.plot);
                axis_scene.destroy(nodes.value_axis);
            }
            mounted
        });

        let plot_root = plot_scene.root();
        for pane in model.panes.values() {
            let nodes = match pane_nodes.get(pane.id()) {
                Some(nodes) => *nodes,
                None => {
                    let nodes = PaneNodes {
                        plot: plot_scene.create_child(plot_root)?,
                        value_axis: axis_scene.create_child(*value_axes_layer)?,
                    };
                    plot_scene.set_interactive(nodes.plot, Some(HitTarget::PlotArea(pane.id().clone())));
                    axis_scene
                        .set_interactive(nodes.value_axis, Some(HitTarget::ValueAxis(pane.id().clone())));
                    pane_nodes.insert(pane.id().clone(), nodes);
                    nodes
                }
            };
            // re-append in pane order
            plot_scene.add_child(plot_root, nodes.plot)?;
            axis_scene.add_child(*value_axes_layer, nodes.value_axis)?;

            let bounds = pane.bounds();
            plot_scene.set_transform(nodes.plot, NodeTransform::at(bounds.x, bounds.y));
            plot_scene.set_clip(nodes.plot, Some(bounds.local_rect()));
            plot_scene.set_geometry(nodes.plot, hit_area(bounds));
            let axis_bounds = pane.value_axis_bounds();
            axis_scene.set_transform(nodes.value_axis, NodeTransform::at(axis_bounds.x, axis_bounds.y));
            axis_scene.set_clip(nodes.value_axis, Some(axis_bounds.local_rect()));
            axis_scene.set_geometry(nodes.value_axis, hit_area(axis_bounds));
        }

        let time_axis = model.layout.time_axis;
        axis_scene.set_transform(*time_axis_node, NodeTransform::at(time_axis.x, time_axis.y));
        axis_scene.set_geometry(*time_axis_node, hit_area(time_axis));
        Ok(())
    }

    /// Rebuilds every node's geometry for the current scales, data and
    /// crosshair.
    pub(super) fn refresh_scene(&mut self) -> ChartResult<()> {
        let model = &self.core.model;
        let time = model.visible_time_scale();
        let interval_px = model.interval_px();
        let pixel_ratio = model.pixel_ratio;
        let style = &model.config.style;
        let crosshair = &self.core.runtime.crosshair;
        let crosshair_time = crosshair.time_ms.filter(|_| crosshair.visible);
        let presentation = &mut self.core.presentation;

        for (index, pane) in model.panes.values().enumerate() {
            let Some(nodes) = presentation.pane_nodes.get(pane.id()).copied() else {
                continue;
            };
            let bounds = pane.bounds();
            let value = pane.value_scale();
            let context = DrawContext {
                time,
                value,
                pixel_ratio,
                width: bounds.width,
                height: bounds.height,
                interval_px,
                data: pane.data(),
            };

            let mut plot = hit_area(bounds);
            AxisTickElement::grid(TickAxis::Time, style.grid_line.clone()).draw(&mut plot, &context);
            AxisTickElement::grid(TickAxis::Value, style.grid_line.clone()).draw(&mut plot, &context);
            pane.draw(&mut plot, time, pixel_ratio, interval_px);
            if index > 0 {
                let y = context.crisp(0.0, style.pane_separator.width);
                plot.line(
                    Point::new(0.0, y),
                    Point::new(bounds.width, y),
                    style.pane_separator.clone(),
                );
            }
            presentation.plot_scene.set_geometry(nodes.plot, plot);

            let axis_bounds = pane.value_axis_bounds();
            let axis_context = DrawContext {
                width: axis_bounds.width,
                ..context
            };
            let mut axis = hit_area(axis_bounds);
            let x = axis_context.crisp(0.0, style.axis_line.width);
            axis.line(
                Point::new(x, 0.0),
                Point::new(x, axis_bounds.height),
                style.axis_line.clone(),
            );
            AxisTickElement::labelled(
                TickAxis::Value,
                VALUE_TICK_LENGTH,
                style.axis_line.clone(),
                style.axis_text,
            )
            .draw(&mut axis, &axis_context);
            presentation.axis_scene.set_geometry(nodes.value_axis, axis);
        }

        let time_axis = model.layout.time_axis;
        let time_context = DrawContext {
            time,
            value: LinearScale::new(0.0, 1.0)?.with_range(time_axis.height, 0.0),
            pixel_ratio,
            width: model.layout.plot_width,
            height: time_axis.height,
            interval_px,
            data: &model.axis_data,
        };
        let mut axis = hit_area(time_axis);
        let y = time_context.crisp(0.0, style.axis_line.width);
        axis.line(
            Point::new(0.0, y),
            Point::new(time_axis.width, y),
            style.axis_line.clone(),
        );
        AxisTickElement::labelled(
            TickAxis::Time,
            TIME_TICK_LENGTH,
            style.axis_line.clone(),
            style.axis_text,
        )
        .draw(&mut axis, &time_context);
        presentation.axis_scene.set_geometry(presentation.time_axis_node, axis);

        let mut overlay = Geometry::new();
        if let Some(time_ms) = crosshair_time {
            draw_crosshair(
                &mut overlay,
                CrosshairFrame {
                    time,
                    time_ms,
                    style,
                    pixel_ratio,
                    plot_bottom: time_axis.y,
                    time_axis,
                    interval: model.config.interval,
                },
            );
            if let Some(pane) = crosshair.pane.as_ref().and_then(|id| model.panes.get(id)) {
                if let Some(value) = pane.crosshair().value {
                    draw_value_marker(&mut overlay, pane, value, style, pixel_ratio);
                }
            }
        }
        presentation
            .axis_scene
            .set_geometry(presentation.crosshair_node, overlay);
        Ok(())
    }
}

/// Invisible rectangle covering `bounds` in node-local space; it makes the
/// node hit-testable without painting anything.
fn hit_area(bounds: Bounds) -> Geometry {
    let mut geometry = Geometry::new();
    geometry.push(Shape::Rect(bounds.local_rect()), None, None);
    geometry
}

struct CrosshairFrame<'a> {
    time: TimeScale,
    time_ms: f64,
    style: &'a ChartStyle,
    pixel_ratio: f64,
    plot_bottom: f64,
    time_axis: Bounds,
    interval: Interval,
}

/// Vertical crosshair line through every pane plus the time tooltip.
fn draw_crosshair(geometry: &mut Geometry, frame: CrosshairFrame<'_>) {
    let x = frame.time.map_millis(frame.time_ms);
    let (r0, r1) = frame.time.range();
    if !(r0.min(r1)..=r0.max(r1)).contains(&x) {
        return;
    }
    let x = crisp(x, frame.style.crosshair_line.width, frame.pixel_ratio);
    geometry.line(
        Point::new(x, 0.0),
        Point::new(x, frame.plot_bottom),
        frame.style.crosshair_line.clone(),
    );

    let Some(time) = millis_to_datetime(frame.time_ms) else {
        return;
    };
    let text = time.format(frame.interval.tooltip_format()).to_string();
    let text_style = TextStyle {
        h_align: TextHAlign::Center,
        ..frame.style.tooltip_text
    };
    let half_width = text_style.estimated_width(&text) / 2.0 + TOOLTIP_PADDING;
    let center_x = x.clamp(half_width, (r0.max(r1) - half_width).max(half_width));
    let box_rect = Rect::new(
        center_x - half_width,
        frame.time_axis.y,
        center_x + half_width,
        frame.time_axis.bottom(),
    );
    geometry.fill_rect(box_rect, FillStyle::solid(frame.style.tooltip_fill));
    geometry.text(text, Point::new(center_x, box_rect.center().y), text_style);
}

/// Horizontal crosshair line across the hovered pane and its value label.
fn draw_value_marker(
    geometry: &mut Geometry,
    pane: &Pane,
    value: f64,
    style: &ChartStyle,
    pixel_ratio: f64,
) {
    let (plot, axis, scale) = (pane.bounds(), pane.value_axis_bounds(), pane.value_scale());
    let local_y = scale.map(value);
    if !(0.0..=plot.height).contains(&local_y) {
        return;
    }
    let y = crisp(plot.y + local_y, style.crosshair_line.width, pixel_ratio);
    geometry.line(
        Point::new(plot.x, y),
        Point::new(plot.right(), y),
        style.crosshair_line.clone(),
    );

    let text = format_value_tick(value, scale.tick_step(5));
    let half_height = style.tooltip_text.font_size_px / 2.0 + TOOLTIP_PADDING;
    let center_y = y.clamp(plot.y + half_height, (plot.bottom() - half_height).max(plot.y + half_height));
    geometry.fill_rect(
        Rect::new(axis.x, center_y - half_height, axis.right(), center_y + half_height),
        FillStyle::solid(style.tooltip_fill),
    );
    geometry.text(
        text,
        Point::new(axis.x + TOOLTIP_PADDING, center_y),
        TextStyle {
            h_align: TextHAlign::Left,
            ..style.tooltip_text
        },
    );
}
