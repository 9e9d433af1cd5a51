use glam::Mat4;
use stagehand_assets::AssetServer;
use stagehand_common::{Mode, NodeId, Transform};
use stagehand_physics::{PhysicsWorld, Shape};
use stagehand_render::{CameraView, RenderBackend, RenderSettings};

use crate::scripting::{SceneAccess, ScriptHost};

/// Read-only facts about the owning node, gathered before a load attempt.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    pub id: NodeId,
    pub name: &'a str,
    pub world_matrix: Mat4,
    /// Shapes of the node's colliders that are already loaded.
    pub collider_shapes: &'a [Shape],
    /// True while some collider on the node has not loaded yet.
    pub pending_colliders: bool,
}

/// Collaborators available to `Component::load`.
pub struct LoadContext<'a> {
    pub mode: Mode,
    pub node: NodeView<'a>,
    pub assets: &'a mut AssetServer,
    pub physics: &'a mut dyn PhysicsWorld,
    pub scripts: &'a mut dyn ScriptHost,
}

/// Collaborators available to `Component::unload`.
pub struct UnloadContext<'a> {
    pub physics: &'a mut dyn PhysicsWorld,
    pub scripts: &'a mut dyn ScriptHost,
}

/// Per-frame state handed to `Component::logic`.
pub struct LogicContext<'a> {
    pub mode: Mode,
    pub dt: f32,
    pub node: NodeId,
    pub node_name: &'a str,
    /// The owning node's local transform. Writes land before the hierarchy sync.
    pub transform: &'a mut Transform,
    pub parent_world: Mat4,
    pub world_matrix: Mat4,
    pub camera: Option<CameraView>,
    /// The rest of the active level. The owning node's components are
    /// detached while they run.
    pub scene: &'a mut dyn SceneAccess,
    pub settings: &'a mut RenderSettings,
    pub assets: &'a mut AssetServer,
    pub physics: &'a mut dyn PhysicsWorld,
    pub scripts: &'a mut dyn ScriptHost,
}

/// State handed to the render hooks.
pub struct RenderContext<'a> {
    pub mode: Mode,
    pub node: NodeId,
    pub world_matrix: Mat4,
    /// Render-time pose. Equals `world_matrix` unless the editor is animating
    /// a selection.
    pub visual_matrix: Mat4,
    pub backend: &'a mut dyn RenderBackend,
}
