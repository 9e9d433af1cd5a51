//! Game camera resolution.

use stagehand_common::NodeId;
use stagehand_ecs::ComponentKind;
use stagehand_render::CameraView;
use stagehand_scene::{Node, SceneTree};

/// Child of the root that is preferred as the game camera.
pub const CAMERA_NODE_NAME: &str = "Camera";

fn has_camera(node: &Node) -> bool {
    node.components.contains(ComponentKind::Camera)
}

/// Pick the level's game camera: the root's child named `Camera` if it holds
/// a camera component, otherwise the first camera component in pre-order.
pub fn resolve_game_camera(tree: &SceneTree) -> Option<NodeId> {
    let named = tree
        .node(tree.root())
        .ok()
        .and_then(|root| root.child(CAMERA_NODE_NAME))
        .filter(|&id| tree.get(id).is_some_and(has_camera));
    named.or_else(|| tree.find_first(has_camera))
}

/// View through the camera component on `id`, from its last resolved pose.
pub fn camera_view(tree: &SceneTree, id: NodeId) -> Option<CameraView> {
    let node = tree.get(id)?;
    let params = node
        .components
        .get(ComponentKind::Camera)?
        .component()
        .camera()?;
    Some(CameraView::from_world(
        node.world_matrix(),
        node.world_rotation(),
        params,
    ))
}
