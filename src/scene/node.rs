use kurbo::{Affine, Point, Rect, Vec2};

use crate::scene::Geometry;

slotmap::new_key_type! {
    /// Stable handle of a display object inside a [`crate::scene::SceneGraph`].
    pub struct NodeId;
}

/// Local transform of a display object: scale about the local origin, then
/// translate to `position` in the parent's space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub position: Point,
    pub scale: Vec2,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            position: Point::ORIGIN,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl NodeTransform {
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scale(mut self, sx: f64, sy: f64) -> Self {
        self.scale = Vec2::new(sx, sy);
        self
    }

    #[must_use]
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.position.to_vec2()) * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }
}

/// Node of the display tree.
///
/// Every node may both paint its own geometry and own children; children are
/// painted after (on top of) the node's own geometry. `parent` is a
/// non-owning back-reference maintained by the scene graph.
#[derive(Debug, Clone)]
pub struct DisplayObject<T> {
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub transform: NodeTransform,
    pub visible: bool,
    /// Hit-test payload; `None` makes the node transparent to hit-testing
    /// (its children are still tested).
    pub interactive: Option<T>,
    /// Local-space rectangle bounding everything this node and its subtree
    /// paint or hit.
    pub clip: Option<Rect>,
    pub geometry: Geometry,
}

impl<T> Default for DisplayObject<T> {
    fn default() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: NodeTransform::default(),
            visible: true,
            interactive: None,
            clip: None,
            geometry: Geometry::default(),
        }
    }
}

impl<T> DisplayObject<T> {
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
