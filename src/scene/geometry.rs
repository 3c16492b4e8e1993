//! Shape primitives, their styles and exact point-containment tests.
//!
//! All coordinates are in the owning node's local space.

use kurbo::{BezPath, Point, Rect};

use crate::render::{FillStyle, LineStyle, TextStyle};

/// Drawable shape primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect(Rect),
    Circle { center: Point, radius: f64 },
    /// Open poly-line through the points.
    Polyline(Vec<Point>),
    /// Closed polygon through the points.
    Polygon(Vec<Point>),
    /// Region between a curve through `points` and the horizontal line
    /// `y = baseline`. Only the curve is stroked.
    Area { points: Vec<Point>, baseline: f64 },
    /// Text run vertically centered on `origin`.
    Text {
        text: String,
        origin: Point,
        style: TextStyle,
    },
}

impl Shape {
    /// Point containment for the shape interior.
    ///
    /// `line_width` widens open shapes: a point is on a poly-line only within
    /// half the line width of one of its segments.
    #[must_use]
    pub fn contains_point(&self, point: Point, line_width: f64) -> bool {
        let half_width = (line_width * 0.5).max(0.0);
        match self {
            Shape::Rect(rect) => {
                let rect = rect.abs();
                point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
            }
            Shape::Circle { center, radius } => {
                let dx = point.x - center.x;
                let dy = point.y - center.y;
                dx * dx + dy * dy <= radius * radius
            }
            Shape::Polyline(points) => polyline_contains(points, point, half_width),
            Shape::Polygon(points) => polygon_contains(points, point),
            Shape::Area { points, baseline } => {
                area_contains(points, *baseline, point) || polyline_contains(points, point, half_width)
            }
            Shape::Text {
                text,
                origin,
                style,
            } => text_bounds(text, *origin, style).contains(point),
        }
    }

    /// Closed outline used for filling.
    #[must_use]
    pub fn fill_path(&self) -> Option<BezPath> {
        match self {
            Shape::Rect(rect) => {
                let rect = rect.abs();
                Some(closed_path(&[
                    Point::new(rect.x0, rect.y0),
                    Point::new(rect.x1, rect.y0),
                    Point::new(rect.x1, rect.y1),
                    Point::new(rect.x0, rect.y1),
                ]))
            }
            Shape::Circle { center, radius } => Some(circle_path(*center, *radius)),
            Shape::Polygon(points) if points.len() >= 3 => Some(closed_path(points)),
            Shape::Area { points, baseline } if points.len() >= 2 => {
                let mut outline = points.clone();
                if let (Some(first), Some(last)) = (points.first(), points.last()) {
                    outline.push(Point::new(last.x, *baseline));
                    outline.push(Point::new(first.x, *baseline));
                }
                Some(closed_path(&outline))
            }
            _ => None,
        }
    }

    /// Outline used for stroking. For areas this is only the top curve.
    #[must_use]
    pub fn stroke_path(&self) -> Option<BezPath> {
        match self {
            Shape::Polyline(points) | Shape::Area { points, .. } if points.len() >= 2 => {
                Some(open_path(points))
            }
            Shape::Polyline(_) | Shape::Area { .. } | Shape::Text { .. } => None,
            _ => self.fill_path(),
        }
    }
}

/// One entry of a geometry list.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryItem {
    pub shape: Shape,
    pub fill: Option<FillStyle>,
    pub line: Option<LineStyle>,
}

impl GeometryItem {
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        let line_width = self
            .line
            .as_ref()
            .filter(|line| line.visible)
            .map_or(0.0, |line| line.width);
        self.shape.contains_point(point, line_width)
    }
}

/// Ordered list of styled shapes painted by one display object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    items: Vec<GeometryItem>,
}

impl Geometry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[GeometryItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, shape: Shape, fill: Option<FillStyle>, line: Option<LineStyle>) {
        self.items.push(GeometryItem { shape, fill, line });
    }

    pub fn fill_rect(&mut self, rect: Rect, fill: FillStyle) {
        self.push(Shape::Rect(rect), Some(fill), None);
    }

    pub fn stroke_polyline(&mut self, points: Vec<Point>, line: LineStyle) {
        self.push(Shape::Polyline(points), None, Some(line));
    }

    pub fn line(&mut self, from: Point, to: Point, line: LineStyle) {
        self.stroke_polyline(vec![from, to], line);
    }

    pub fn area(
        &mut self,
        points: Vec<Point>,
        baseline: f64,
        fill: FillStyle,
        line: Option<LineStyle>,
    ) {
        self.push(Shape::Area { points, baseline }, Some(fill), line);
    }

    pub fn text(&mut self, text: impl Into<String>, origin: Point, style: TextStyle) {
        self.push(
            Shape::Text {
                text: text.into(),
                origin,
                style,
            },
            None,
            None,
        );
    }

    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        self.items.iter().any(|item| item.contains_point(point))
    }
}

/// Approximate bounding box of a text run.
#[must_use]
pub fn text_bounds(text: &str, origin: Point, style: &TextStyle) -> Rect {
    use crate::render::TextHAlign;

    let width = style.estimated_width(text);
    let x0 = match style.h_align {
        TextHAlign::Left => origin.x,
        TextHAlign::Center => origin.x - width / 2.0,
        TextHAlign::Right => origin.x - width,
    };
    let half_height = style.font_size_px / 2.0;
    Rect::new(x0, origin.y - half_height, x0 + width, origin.y + half_height)
}

fn polyline_contains(points: &[Point], point: Point, half_width: f64) -> bool {
    if half_width <= 0.0 {
        return false;
    }
    let limit = half_width * half_width;
    match points {
        [] => false,
        [only] => only.distance_squared(point) <= limit,
        _ => points
            .windows(2)
            .any(|segment| segment_distance_squared(segment[0], segment[1], point) <= limit),
    }
}

fn segment_distance_squared(a: Point, b: Point, p: Point) -> f64 {
    let ab = b - a;
    let length_squared = ab.hypot2();
    if length_squared == 0.0 {
        return a.distance_squared(p);
    }
    let t = ((p - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    (a + ab * t).distance_squared(p)
}

/// Even-odd crossing-number test.
fn polygon_contains(points: &[Point], point: Point) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut previous = points[points.len() - 1];
    for &current in points {
        if (current.y > point.y) != (previous.y > point.y) {
            let x_at_y =
                (previous.x - current.x) * (point.y - current.y) / (previous.y - current.y) + current.x;
            if point.x < x_at_y {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

fn area_contains(points: &[Point], baseline: f64, point: Point) -> bool {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return false;
    };
    let mut outline = points.to_vec();
    outline.push(Point::new(last.x, baseline));
    outline.push(Point::new(first.x, baseline));
    polygon_contains(&outline, point)
}

fn open_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
    }
    for point in iter {
        path.line_to(*point);
    }
    path
}

fn closed_path(points: &[Point]) -> BezPath {
    let mut path = open_path(points);
    path.close_path();
    path
}

fn circle_path(center: Point, radius: f64) -> BezPath {
    const SEGMENTS: usize = 32;
    let points: Vec<Point> = (0..SEGMENTS)
        .map(|i| {
            let angle = i as f64 / SEGMENTS as f64 * std::f64::consts::TAU;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect();
    closed_path(&points)
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect};

    use super::Shape;

    #[test]
    fn rect_and_circle_containment_are_exact_on_the_boundary() {
        let rect = Shape::Rect(Rect::new(0.0, 0.0, 10.0, 5.0));
        assert!(rect.contains_point(Point::new(10.0, 5.0), 0.0));
        assert!(!rect.contains_point(Point::new(10.01, 5.0), 0.0));

        let circle = Shape::Circle {
            center: Point::new(0.0, 0.0),
            radius: 5.0,
        };
        assert!(circle.contains_point(Point::new(3.0, 4.0), 0.0));
        assert!(!circle.contains_point(Point::new(3.0, 4.1), 0.0));
    }

    #[test]
    fn polyline_hits_only_within_half_the_line_width() {
        let line = Shape::Polyline(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert!(line.contains_point(Point::new(5.0, 1.9), 4.0));
        assert!(!line.contains_point(Point::new(5.0, 2.1), 4.0));
        assert!(!line.contains_point(Point::new(5.0, 0.0), 0.0));
    }

    #[test]
    fn concave_polygon_uses_even_odd_rule() {
        let notch = Shape::Polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(5.0, 5.0),
            Point::new(0.0, 10.0),
        ]);
        assert!(notch.contains_point(Point::new(2.0, 2.0), 0.0));
        assert!(!notch.contains_point(Point::new(5.0, 8.0), 0.0));
    }

    #[test]
    fn area_fills_under_curve_and_strokes_only_the_curve() {
        let area = Shape::Area {
            points: vec![Point::new(0.0, 10.0), Point::new(10.0, 0.0), Point::new(20.0, 10.0)],
            baseline: 20.0,
        };
        assert!(area.contains_point(Point::new(10.0, 15.0), 0.0));
        assert!(!area.contains_point(Point::new(1.0, 1.0), 0.0));

        let stroke = area.stroke_path().expect("stroke path");
        assert_eq!(stroke.elements().len(), 3);
        let fill = area.fill_path().expect("fill path");
        // curve + two baseline corners + close
        assert_eq!(fill.elements().len(), 6);
    }
}
