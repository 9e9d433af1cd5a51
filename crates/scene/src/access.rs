use glam::Vec3;
use stagehand_common::{NodeId, Transform};
use stagehand_ecs::SceneAccess;

use crate::node::Node;
use crate::tree::SceneTree;

/// A level's tree exposed to component logic.
pub struct LevelScene<'a> {
    name: &'a str,
    tree: &'a mut SceneTree,
    camera: Option<NodeId>,
}

impl<'a> LevelScene<'a> {
    pub fn new(name: &'a str, tree: &'a mut SceneTree, camera: Option<NodeId>) -> Self {
        Self { name, tree, camera }
    }
}

impl SceneAccess for LevelScene<'_> {
    fn level_name(&self) -> &str {
        self.name
    }

    fn find_path(&self, path: &str) -> Option<NodeId> {
        self.tree.find_path(path)
    }

    fn node_name(&self, id: NodeId) -> Option<&str> {
        self.tree.get(id).map(Node::name)
    }

    fn transform(&self, id: NodeId) -> Option<Transform> {
        self.tree.get(id).map(|n| n.transform)
    }

    fn set_transform(&mut self, id: NodeId, transform: Transform) -> bool {
        self.tree.set_transform(id, transform).is_ok()
    }

    fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.tree.get(id).map(Node::world_position)
    }

    fn camera(&self) -> Option<NodeId> {
        self.camera.filter(|id| self.tree.contains(*id))
    }
}
