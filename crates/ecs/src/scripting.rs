use glam::Vec3;
use stagehand_common::{NodeId, Transform};
use stagehand_render::{CameraView, RenderSettings};

/// Handle to a compiled script owned by a [`ScriptHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptHandle(pub u64);

/// Errors raised by the scripting runtime.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to compile {name}: {message}")]
    Compile { name: String, message: String },
    #[error("script {name} raised: {message}")]
    Runtime { name: String, message: String },
    #[error("unknown script handle {0:?}")]
    UnknownHandle(ScriptHandle),
}

/// The active level as scripts see it during the logic pass.
///
/// Nodes are addressed by `/`-separated paths from the level root. Transform
/// writes land before the hierarchy sync, so they show in the same frame.
pub trait SceneAccess {
    fn level_name(&self) -> &str;

    fn find_path(&self, path: &str) -> Option<NodeId>;

    fn node_name(&self, id: NodeId) -> Option<&str>;

    /// Local transform of a node.
    fn transform(&self, id: NodeId) -> Option<Transform>;

    /// Replace a node's local transform. False when the node does not exist.
    fn set_transform(&mut self, id: NodeId, transform: Transform) -> bool;

    /// World position as of the last hierarchy sync.
    fn world_position(&self, id: NodeId) -> Option<Vec3>;

    /// The scene node this frame renders from, if it is one.
    fn camera(&self) -> Option<NodeId>;
}

/// The slice of engine state a script can reach during its loop callback.
pub struct ScriptBindings<'a> {
    pub node: NodeId,
    pub node_name: &'a str,
    /// The script node's own local transform.
    pub transform: &'a mut Transform,
    /// The view the frame started with.
    pub camera: Option<&'a CameraView>,
    pub scene: &'a mut dyn SceneAccess,
    pub settings: &'a mut RenderSettings,
    pub dt: f32,
}

impl ScriptBindings<'_> {
    pub fn level_name(&self) -> &str {
        self.scene.level_name()
    }

    pub fn camera_transform(&self) -> Option<Transform> {
        if self.scene.camera() == Some(self.node) {
            return Some(*self.transform);
        }
        self.scene.camera().and_then(|id| self.scene.transform(id))
    }

    /// Move the camera node. The frame renders from the new pose.
    pub fn set_camera_transform(&mut self, transform: Transform) -> bool {
        match self.scene.camera() {
            Some(id) if id == self.node => {
                *self.transform = transform;
                true
            }
            Some(id) => self.scene.set_transform(id, transform),
            None => false,
        }
    }
}

/// Embedded scripting runtime contract.
///
/// A script exposes an optional per-frame loop entry point. Hosts report a
/// missing loop by returning `Ok(None)` from `compile`; such scripts are never
/// called.
pub trait ScriptHost {
    fn compile(&mut self, name: &str, source: &str) -> Result<Option<ScriptHandle>, ScriptError>;

    fn call_loop(
        &mut self,
        handle: ScriptHandle,
        bindings: &mut ScriptBindings<'_>,
    ) -> Result<(), ScriptError>;

    fn release(&mut self, handle: ScriptHandle);

    /// Runs once per simulated frame before any script loop.
    fn begin_frame(&mut self, _dt: f32) {}
}

/// Host with no language runtime. Every script compiles to a loop that does
/// nothing, which keeps headless runs and tests deterministic.
#[derive(Debug, Default)]
pub struct NullScriptHost {
    next: u64,
    live: Vec<ScriptHandle>,
    calls: u64,
}

impl NullScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of loop calls made so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl ScriptHost for NullScriptHost {
    fn compile(&mut self, _name: &str, _source: &str) -> Result<Option<ScriptHandle>, ScriptError> {
        self.next += 1;
        let handle = ScriptHandle(self.next);
        self.live.push(handle);
        Ok(Some(handle))
    }

    fn call_loop(
        &mut self,
        handle: ScriptHandle,
        _bindings: &mut ScriptBindings<'_>,
    ) -> Result<(), ScriptError> {
        if !self.live.contains(&handle) {
            return Err(ScriptError::UnknownHandle(handle));
        }
        self.calls += 1;
        Ok(())
    }

    fn release(&mut self, handle: ScriptHandle) {
        self.live.retain(|h| *h != handle);
    }
}

/// A flat list of named nodes standing in for a level in unit tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FixedScene {
    pub nodes: Vec<(NodeId, String, Transform)>,
    pub camera: Option<NodeId>,
}

#[cfg(test)]
impl SceneAccess for FixedScene {
    fn level_name(&self) -> &str {
        "fixed"
    }

    fn find_path(&self, path: &str) -> Option<NodeId> {
        self.nodes.iter().find(|(_, name, _)| name == path).map(|(id, _, _)| *id)
    }

    fn node_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.iter().find(|(n, _, _)| *n == id).map(|(_, name, _)| name.as_str())
    }

    fn transform(&self, id: NodeId) -> Option<Transform> {
        self.nodes.iter().find(|(n, _, _)| *n == id).map(|(_, _, t)| *t)
    }

    fn set_transform(&mut self, id: NodeId, transform: Transform) -> bool {
        match self.nodes.iter_mut().find(|(n, _, _)| *n == id) {
            Some(entry) => {
                entry.2 = transform;
                true
            }
            None => false,
        }
    }

    fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.transform(id).map(|t| t.position)
    }

    fn camera(&self) -> Option<NodeId> {
        self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_host_tracks_handles() {
        let mut host = NullScriptHost::new();
        let a = host.compile("a.lua", "").unwrap().unwrap();
        let b = host.compile("b.lua", "").unwrap().unwrap();
        assert_ne!(a, b);
        assert_eq!(host.live_count(), 2);

        let mut transform = Transform::default();
        let mut settings = RenderSettings::default();
        let mut scene = FixedScene::default();
        let mut bindings = ScriptBindings {
            node: NodeId::default(),
            node_name: "n",
            transform: &mut transform,
            camera: None,
            scene: &mut scene,
            settings: &mut settings,
            dt: 0.016,
        };
        host.call_loop(a, &mut bindings).unwrap();
        host.release(a);
        assert!(matches!(
            host.call_loop(a, &mut bindings),
            Err(ScriptError::UnknownHandle(_))
        ));
        assert_eq!(host.calls(), 1);
        assert_eq!(host.live_count(), 1);
    }

    #[test]
    fn camera_binding_writes_through_the_scene() {
        let cam = NodeId::from(slotmap::KeyData::from_ffi(1));
        let mut scene = FixedScene {
            nodes: vec![(cam, "Camera".into(), Transform::default())],
            camera: Some(cam),
        };
        let mut own = Transform::default();
        let mut settings = RenderSettings::default();
        let mut bindings = ScriptBindings {
            node: NodeId::default(),
            node_name: "driver",
            transform: &mut own,
            camera: None,
            scene: &mut scene,
            settings: &mut settings,
            dt: 0.016,
        };
        let moved = Transform::from_position(Vec3::new(0.0, 2.0, 8.0));
        assert!(bindings.set_camera_transform(moved));
        assert_eq!(bindings.camera_transform(), Some(moved));
        assert_eq!(bindings.level_name(), "fixed");
        assert_eq!(own, Transform::default());
        assert_eq!(scene.transform(cam), Some(moved));
    }

    #[test]
    fn camera_script_moves_its_own_transform() {
        let cam = NodeId::from(slotmap::KeyData::from_ffi(1));
        let mut scene = FixedScene {
            nodes: vec![(cam, "Camera".into(), Transform::default())],
            camera: Some(cam),
        };
        let mut own = Transform::default();
        let mut settings = RenderSettings::default();
        let mut bindings = ScriptBindings {
            node: cam,
            node_name: "Camera",
            transform: &mut own,
            camera: None,
            scene: &mut scene,
            settings: &mut settings,
            dt: 0.016,
        };
        let moved = Transform::from_position(Vec3::Y);
        assert!(bindings.set_camera_transform(moved));
        assert_eq!(own, moved);
    }
}
