//! Retained display tree: nodes with local transforms and geometry lists,
//! a depth-first renderer and a topmost-first hit tester.

mod geometry;
mod graph;
mod node;
mod renderer;

pub use geometry::{Geometry, GeometryItem, Shape, text_bounds};
pub use graph::SceneGraph;
pub use hit_test::{Hit, hit_test};
pub use node::{DisplayObject, NodeId, NodeTransform};
pub use renderer::{RenderStats, Renderer};
