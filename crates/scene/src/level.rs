use std::path::{Path, PathBuf};

use stagehand_common::{EditorCameraPose, LevelId};

use crate::document::{LEVEL_FORMAT_VERSION, LevelDocument};
use crate::tree::{SceneError, SceneTree};

/// Whether a level is backed by a file or is a play-mode sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    Persisted,
    /// Produced only when entering play mode. Never written to disk.
    RuntimeClone,
}

/// A scene tree plus session metadata.
#[derive(Debug)]
pub struct Level {
    id: LevelId,
    name: String,
    path: Option<PathBuf>,
    kind: LevelKind,
    dirty: bool,
    pub editor_camera: Option<EditorCameraPose>,
    tree: SceneTree,
}

impl Level {
    /// An empty persisted level with a single root node.
    pub fn new(name: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self {
            id: LevelId::new(),
            name: name.into(),
            path,
            kind: LevelKind::Persisted,
            dirty: false,
            editor_camera: None,
            tree: SceneTree::new("Root"),
        }
    }

    pub fn from_document(doc: &LevelDocument, path: Option<PathBuf>) -> Result<Self, SceneError> {
        let tree = SceneTree::from_document(&doc.root)?;
        Ok(Self {
            id: LevelId::new(),
            name: doc.name.clone(),
            path,
            kind: LevelKind::Persisted,
            dirty: false,
            editor_camera: doc.editor_camera,
            tree,
        })
    }

    pub fn to_document(&self) -> Result<LevelDocument, SceneError> {
        Ok(LevelDocument {
            format: LEVEL_FORMAT_VERSION,
            name: self.name.clone(),
            editor_camera: self.editor_camera,
            root: self.tree.to_document()?,
        })
    }

    /// Deep copy for play mode: a new identity, the same field values, and
    /// every component unloaded.
    pub fn runtime_clone(&self) -> Self {
        tracing::debug!(level = %self.name, nodes = self.tree.node_count(), "cloning level for play");
        Self {
            id: LevelId::new(),
            name: self.name.clone(),
            path: self.path.clone(),
            kind: LevelKind::RuntimeClone,
            dirty: false,
            editor_camera: self.editor_camera,
            tree: self.tree.duplicate(),
        }
    }

    pub fn id(&self) -> LevelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    pub fn kind(&self) -> LevelKind {
        self.kind
    }

    pub fn is_runtime_clone(&self) -> bool {
        self.kind == LevelKind::RuntimeClone
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use stagehand_common::Transform;
    use stagehand_ecs::{ComponentKind, Rigidbody};

    #[test]
    fn runtime_clone_has_new_identity() {
        let mut level = Level::new("arena", Some(PathBuf::from("Levels/arena.level.json")));
        let root = level.tree().root();
        let ball = level
            .tree_mut()
            .add_child(root, "ball", Transform::from_position(Vec3::Y))
            .unwrap();
        level
            .tree_mut()
            .node_mut(ball)
            .unwrap()
            .components
            .insert(Box::new(Rigidbody::default()));
        level.set_dirty(true);

        let clone = level.runtime_clone();
        assert_ne!(clone.id(), level.id());
        assert!(clone.is_runtime_clone());
        assert!(!clone.is_dirty());
        assert_eq!(clone.name(), "arena");
        assert_eq!(clone.path(), level.path());
        let cloned_ball = clone.tree().find_path("ball").unwrap();
        let node = clone.tree().node(cloned_ball).unwrap();
        assert_eq!(node.transform.position, Vec3::Y);
        assert!(node.components.contains(ComponentKind::Rigidbody));
    }

    #[test]
    fn document_carries_editor_camera() {
        let mut level = Level::new("arena", None);
        level.editor_camera = Some(EditorCameraPose {
            position: Vec3::new(1.0, 2.0, 3.0),
            yaw: 0.5,
            pitch: -0.25,
        });
        let doc = level.to_document().unwrap();
        let restored = Level::from_document(&doc, None).unwrap();
        assert_eq!(restored.editor_camera, level.editor_camera);
        assert_eq!(restored.kind(), LevelKind::Persisted);
    }
}
