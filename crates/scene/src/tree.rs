use slotmap::{SecondaryMap, SlotMap};
use stagehand_common::{NodeId, Transform};
use stagehand_ecs::{ComponentError, ComponentKind, component_from_data};

use crate::document::NodeDocument;
use crate::node::Node;

/// Errors from structural scene operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
    #[error("no node at path {0:?}")]
    PathNotFound(String),
    #[error("{parent} already has a child named {name:?}")]
    DuplicateName { parent: String, name: String },
    #[error("invalid node name {0:?}")]
    InvalidName(String),
    #[error("the root node cannot be removed")]
    RootRemoval,
    #[error(transparent)]
    Component(#[from] ComponentError),
}

fn validate_name(name: &str) -> Result<(), SceneError> {
    if name.is_empty() || name.contains('/') {
        return Err(SceneError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Arena-backed node tree with a single root.
///
/// Children are owned through handles in their parent's name map; the parent
/// link is a plain handle and never keeps anything alive.
#[derive(Debug)]
pub struct SceneTree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl SceneTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(root_name, None, Transform::default()));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// All nodes in arena order. Use [`pre_order`](Self::pre_order) when
    /// traversal order matters.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Create a child under `parent`. Names must be unique among siblings.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        let name = name.into();
        validate_name(&name)?;
        let parent_node = self.node(parent)?;
        if parent_node.children.contains_key(&name) {
            return Err(SceneError::DuplicateName {
                parent: parent_node.name.clone(),
                name,
            });
        }

        let frame = parent_node.resolved();
        let mut node = Node::new(name.clone(), Some(parent), transform);
        node.compose(Some(frame), false);
        let id = self.nodes.insert(node);
        self.node_mut(parent)?.children.insert(name, id);
        Ok(id)
    }

    /// Recompose one node's matrices from its parent's last resolved ones,
    /// so a node that was never synced does not sit at its local pose.
    fn recompose(&mut self, id: NodeId) -> Result<(), SceneError> {
        let frame = match self.node(id)?.parent {
            Some(parent) => Some(self.node(parent)?.resolved()),
            None => None,
        };
        self.node_mut(id)?.compose(frame, false);
        Ok(())
    }

    /// Detach `id` and its subtree from the tree.
    ///
    /// Returns the removed nodes in pre-order so the caller can unload and
    /// quit their components.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<Node>, SceneError> {
        if id == self.root {
            return Err(SceneError::RootRemoval);
        }
        let node = self.node(id)?;
        let name = node.name.clone();
        if let Some(parent) = node.parent {
            self.node_mut(parent)?.children.shift_remove(&name);
        }

        let order = self.subtree_pre_order(id);
        Ok(order
            .into_iter()
            .filter_map(|n| self.nodes.remove(n))
            .collect())
    }

    /// Rename a node, keeping its position among its siblings. Returns the
    /// previous name.
    pub fn rename(&mut self, id: NodeId, new_name: impl Into<String>) -> Result<String, SceneError> {
        let new_name = new_name.into();
        validate_name(&new_name)?;
        let node = self.node(id)?;
        let old_name = node.name.clone();
        if old_name == new_name {
            return Ok(old_name);
        }

        if let Some(parent) = node.parent {
            let parent_node = self.node_mut(parent)?;
            if parent_node.children.contains_key(&new_name) {
                return Err(SceneError::DuplicateName {
                    parent: parent_node.name.clone(),
                    name: new_name,
                });
            }
            let index = parent_node
                .children
                .get_index_of(&old_name)
                .unwrap_or(parent_node.children.len());
            parent_node.children.shift_remove(&old_name);
            let index = index.min(parent_node.children.len());
            parent_node.children.shift_insert(index, new_name.clone(), id);
        }
        self.node_mut(id)?.name = new_name;
        Ok(old_name)
    }

    /// Position of `id` among its siblings. The root is at 0.
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let node = self.nodes.get(id)?;
        match node.parent {
            Some(parent) => self.nodes.get(parent)?.children.get_index_of(&node.name),
            None => Some(0),
        }
    }

    /// Move the child `name` of `parent` to `index` among its siblings.
    /// Out-of-range indices move it last.
    pub fn move_child(&mut self, parent: NodeId, name: &str, index: usize) -> Result<(), SceneError> {
        let node = self.node_mut(parent)?;
        let Some(from) = node.children.get_index_of(name) else {
            return Err(SceneError::PathNotFound(name.to_string()));
        };
        let to = index.min(node.children.len() - 1);
        node.children.move_index(from, to);
        Ok(())
    }

    /// Replace a node's local transform. Returns the previous one.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<Transform, SceneError> {
        let node = self.node_mut(id)?;
        Ok(std::mem::replace(&mut node.transform, transform))
    }

    /// Resolve a `/`-separated path of child names, relative to the root.
    /// The empty path is the root itself.
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = self.nodes.get(current)?.child(part)?;
        }
        Some(current)
    }

    /// Path of `id` relative to the root, as accepted by `find_path`.
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        let mut parts = Vec::new();
        let mut current = self.nodes.get(id)?;
        while let Some(parent) = current.parent {
            parts.push(current.name.as_str());
            current = self.nodes.get(parent)?;
        }
        parts.reverse();
        Some(parts.join("/"))
    }

    /// Every node, parents before children, siblings in insertion order.
    /// This is the logic traversal order.
    pub fn pre_order(&self) -> Vec<NodeId> {
        self.subtree_pre_order(self.root)
    }

    fn subtree_pre_order(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.values().rev().copied());
        }
        order
    }

    /// Every node, parents before children, siblings ordered by descending
    /// local z. Ties keep insertion order. This is the draw traversal order.
    pub fn render_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        let mut siblings = Vec::new();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            order.push(id);

            siblings.clear();
            siblings.extend(node.children.values().copied());
            siblings.sort_by(|a, b| {
                let za = self.nodes[*a].transform.position.z;
                let zb = self.nodes[*b].transform.position.z;
                zb.total_cmp(&za)
            });
            stack.extend(siblings.iter().rev().copied());
        }
        order
    }

    /// First node in pre-order matching `predicate`.
    pub fn find_first(&self, predicate: impl Fn(&Node) -> bool) -> Option<NodeId> {
        self.pre_order()
            .into_iter()
            .find(|id| self.nodes.get(*id).is_some_and(&predicate))
    }

    /// Start the selection pulse on `id`. Returns false for unknown nodes.
    pub fn start_bounce(&mut self, id: NodeId) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.bounce = Some(crate::node::Bounce { elapsed: 0.0 });
                true
            }
            None => false,
        }
    }

    /// Deep copy. Field values and resolved matrices are copied; every
    /// component in the copy is unloaded and holds no resources.
    pub fn duplicate(&self) -> SceneTree {
        let mut nodes: SlotMap<NodeId, Node> = SlotMap::with_capacity_and_key(self.nodes.len());
        let mut mapped: SecondaryMap<NodeId, NodeId> = SecondaryMap::new();
        let mut root = None;

        for id in self.pre_order() {
            let source = &self.nodes[id];
            let parent = source.parent.and_then(|p| mapped.get(p).copied());
            let mut copy = Node::new(source.name.clone(), parent, source.transform);
            copy.components = source.components.duplicate();
            copy.matrix = source.matrix;
            copy.rotation_matrix = source.rotation_matrix;
            copy.world = source.world;
            copy.world_rotation = source.world_rotation;
            copy.visual = source.visual;

            let new_id = nodes.insert(copy);
            mapped.insert(id, new_id);
            match parent {
                Some(p) => {
                    nodes[p].children.insert(source.name.clone(), new_id);
                }
                None => root = Some(new_id),
            }
        }

        // pre_order always yields the root first
        let root = root.unwrap_or_else(|| nodes.insert(Node::new("Root", None, Transform::default())));
        SceneTree { nodes, root }
    }

    /// Encode the whole tree.
    pub fn to_document(&self) -> Result<NodeDocument, SceneError> {
        self.subtree_document(self.root)
    }

    /// Encode the subtree rooted at `id`.
    pub fn subtree_document(&self, id: NodeId) -> Result<NodeDocument, SceneError> {
        let node = self.node(id)?;
        let mut doc = NodeDocument::new(node.name.clone());
        let transform = serde_json::to_value(node.transform).map_err(|e| ComponentError::InvalidData {
            kind: ComponentKind::Transform,
            message: e.to_string(),
        })?;
        doc.components.insert(ComponentKind::Transform, transform);
        for (kind, slot) in node.components.iter() {
            doc.components.insert(kind, slot.component().save()?);
        }
        for (name, child) in &node.children {
            doc.children
                .insert(name.clone(), self.subtree_document(*child)?);
        }
        Ok(doc)
    }

    /// Build a tree from its document. Components start unloaded.
    pub fn from_document(doc: &NodeDocument) -> Result<Self, SceneError> {
        let mut tree = Self::new(doc.name.clone());
        let root = tree.root;
        tree.apply_components(root, doc)?;
        for (name, child) in &doc.children {
            tree.insert_document(root, name, child)?;
        }
        Ok(tree)
    }

    /// Recreate an encoded subtree under `parent`, named `name`.
    pub fn insert_document(
        &mut self,
        parent: NodeId,
        name: &str,
        doc: &NodeDocument,
    ) -> Result<NodeId, SceneError> {
        let id = self.add_child(parent, name, Transform::default())?;
        self.apply_components(id, doc)?;
        for (child_name, child) in &doc.children {
            self.insert_document(id, child_name, child)?;
        }
        Ok(id)
    }

    fn apply_components(&mut self, id: NodeId, doc: &NodeDocument) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        for (kind, data) in &doc.components {
            if *kind == ComponentKind::Transform {
                node.transform =
                    serde_json::from_value(data.clone()).map_err(|e| ComponentError::InvalidData {
                        kind: *kind,
                        message: e.to_string(),
                    })?;
                continue;
            }
            let component = component_from_data(*kind, data.clone())?;
            node.components.insert(component);
        }
        self.recompose(id)
    }
}
