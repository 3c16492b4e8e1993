use kurbo::{Affine, Rect};
use slotmap::SlotMap;

use crate::error::{ChartError, ChartResult};
use crate::scene::{DisplayObject, Geometry, NodeId, NodeTransform};

/// Arena-backed display tree.
///
/// The graph owns every node; a container owns its children, so destroying a
/// node destroys its whole subtree. A node has at most one parent and
/// re-parenting detaches it from the old container first.
#[derive(Debug, Clone)]
pub struct SceneGraph<T> {
    nodes: SlotMap<NodeId, DisplayObject<T>>,
    root: NodeId,
}

impl<T> Default for SceneGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SceneGraph<T> {
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(DisplayObject::default());
        Self { nodes, root }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&DisplayObject<T>> {
        self.nodes.get(node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut DisplayObject<T>> {
        self.nodes.get_mut(node)
    }

    /// Creates a detached node.
    pub fn create_node(&mut self) -> NodeId {
        self.nodes.insert(DisplayObject::default())
    }

    /// Creates a node and appends it to `parent`.
    pub fn create_child(&mut self, parent: NodeId) -> ChartResult<NodeId> {
        let child = self.create_node();
        if let Err(err) = self.add_child(parent, child) {
            self.nodes.remove(child);
            return Err(err);
        }
        Ok(child)
    }

    /// Appends `child` as the last (topmost) child of `parent`, detaching it
    /// from its previous parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> ChartResult<()> {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return Err(ChartError::InvalidData(
                "scene node does not exist".to_owned(),
            ));
        }
        if child == self.root {
            return Err(ChartError::InvalidData(
                "root node cannot be re-parented".to_owned(),
            ));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(ChartError::InvalidData(
                "scene node cannot become a child of its own subtree".to_owned(),
            ));
        }

        self.detach(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Removes `node` from its parent without destroying it.
    ///
    /// Returns `true` when the node had a parent.
    pub fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes.get_mut(node).and_then(|entry| entry.parent.take()) else {
            return false;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|child| *child != node);
        }
        true
    }

    /// Destroys `node` and its whole subtree. The root is never destroyed;
    /// destroying it clears its children instead.
    pub fn destroy(&mut self, node: NodeId) {
        if node == self.root {
            self.clear_children(node);
            return;
        }
        if !self.nodes.contains_key(node) {
            return;
        }
        self.detach(node);
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            if let Some(removed) = self.nodes.remove(current) {
                pending.extend(removed.children);
            }
        }
    }

    /// Destroys every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = match self.nodes.get_mut(node) {
            Some(entry) => std::mem::take(&mut entry.children),
            None => return,
        };
        for child in children {
            if let Some(entry) = self.nodes.get_mut(child) {
                entry.parent = None;
            }
            self.destroy(child);
        }
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        match self.nodes.get(node) {
            Some(entry) => &entry.children,
            None => &[],
        }
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|entry| entry.parent)
    }

    pub fn set_transform(&mut self, node: NodeId, transform: NodeTransform) {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.transform = transform;
        }
    }

    pub fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.visible = visible;
        }
    }

    pub fn set_interactive(&mut self, node: NodeId, payload: Option<T>) {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.interactive = payload;
        }
    }

    pub fn set_clip(&mut self, node: NodeId, clip: Option<Rect>) {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.clip = clip;
        }
    }

    /// Replaces a node's geometry list.
    pub fn set_geometry(&mut self, node: NodeId, geometry: Geometry) {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.geometry = geometry;
        }
    }

    /// Local-to-root transform: ancestors' transforms composed outermost
    /// first.
    #[must_use]
    pub fn world_transform(&self, node: NodeId) -> Affine {
        let mut transform = Affine::IDENTITY;
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(entry) = self.nodes.get(id) else {
                break;
            };
            transform = entry.transform.to_affine() * transform;
            current = entry.parent;
        }
        transform
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}
