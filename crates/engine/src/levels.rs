//! Opening, creating, switching, closing and saving levels.

use std::path::{Path, PathBuf};

use stagehand_common::{Mode, NodeId};
use stagehand_persist::{read_level, resolve_level_path};
use stagehand_render::EditorCamera;
use stagehand_scene::{Level, resolve_transforms};

use crate::camera::{camera_view, resolve_game_camera};
use crate::context::EngineContext;
use crate::session::SessionError;

/// Level name for a file path: the file name without `.json` and `.level`.
fn level_name(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = file.strip_suffix(".json").unwrap_or(&file);
    file.strip_suffix(".level").unwrap_or(file).to_string()
}

impl EngineContext {
    /// Open a level by name or path and make it active. A level that is
    /// already open from the same file is focused instead of opened twice.
    pub fn open_level(&mut self, identifier: &str) -> Result<usize, SessionError> {
        if self.is_playing() {
            return Err(SessionError::PlayModeActive);
        }
        let path = resolve_level_path(&self.config.project_root, identifier).inspect_err(|err| {
            tracing::error!(identifier, %err, "cannot resolve level");
        })?;

        if let Some(index) = self.levels.position_by_path(&path) {
            tracing::info!(path = %path.display(), index, "level already open; focusing");
            if self.levels.active_index() != Some(index) {
                self.set_active_level(index, true)?;
            }
            return Ok(index);
        }

        let level = read_level(&path).inspect_err(|err| {
            tracing::error!(path = %path.display(), %err, "failed to read level");
        })?;
        tracing::info!(level = level.name(), path = %path.display(), "level opened");
        let index = self.levels.push(level);
        self.set_active_level(index, true)?;
        Ok(index)
    }

    /// Create an empty level backed by `path`, write it, and make it active.
    /// Relative paths are taken from the project root.
    pub fn create_level(&mut self, path: impl AsRef<Path>) -> Result<usize, SessionError> {
        if self.is_playing() {
            return Err(SessionError::PlayModeActive);
        }
        let path = path.as_ref();
        let path = if path.is_relative() {
            self.config.project_root.join(path)
        } else {
            path.to_path_buf()
        };
        let mut level = Level::new(level_name(&path), Some(path));
        stagehand_persist::save_level(&mut level)?;
        tracing::info!(level = level.name(), "level created");
        let index = self.levels.push(level);
        self.set_active_level(index, true)?;
        Ok(index)
    }

    /// Make the level at `index` active.
    ///
    /// Resolves its transforms and game camera, places the editor camera and
    /// clears the selection. `clear_history` drops undo history recorded
    /// against whatever level was active before.
    pub fn set_active_level(&mut self, index: usize, clear_history: bool) -> Result<(), SessionError> {
        if self.is_playing() && self.levels.active_index() != Some(index) {
            return Err(SessionError::PlayModeActive);
        }
        self.levels.set_active(index)?;
        if clear_history {
            self.history.clear();
        }

        let level = self.levels.active_mut().ok_or(SessionError::NoActiveLevel)?;
        resolve_transforms(level.tree_mut());
        let tree = level.tree();
        self.game_camera = resolve_game_camera(tree);
        if self.game_camera.is_none() {
            tracing::warn!(level = level.name(), "level has no camera");
        }

        self.editor_camera = match level.editor_camera {
            Some(pose) => EditorCamera::from_pose(pose),
            None => {
                let mut camera = EditorCamera::default();
                if let Some(view) = self.game_camera.and_then(|id| camera_view(tree, id)) {
                    camera.set_from_view(&view);
                }
                camera
            }
        };
        self.selected = None;
        tracing::debug!(level = level.name(), index, "level activated");
        Ok(())
    }

    /// Close the level at `index`, unloading and quitting its components.
    ///
    /// The active slot keeps its numeric position, clamped to the new last
    /// index. When that slot now holds a different level, it is activated
    /// afresh with the undo history cleared.
    pub fn close_level(&mut self, index: usize) -> Result<(), SessionError> {
        if self.is_playing() && self.levels.active_index().is_some_and(|active| index <= active) {
            return Err(SessionError::PlayModeActive);
        }
        let active_id = self.levels.active().map(Level::id);
        let level = self.levels.remove(index)?;
        tracing::info!(level = level.name(), index, "closing level");
        if self.history.level() == Some(level.id()) {
            self.history.clear();
        }
        self.teardown_level(level);

        match self.levels.active_index() {
            Some(next) if self.levels.active().map(Level::id) != active_id => {
                self.set_active_level(next, true)?;
            }
            Some(_) => {}
            None => {
                self.game_camera = None;
                self.selected = None;
            }
        }
        Ok(())
    }

    /// Write the level at `index` to its file. The active level also stores
    /// the editor camera pose when saved from the editor.
    pub fn save_level(&mut self, index: usize) -> Result<PathBuf, SessionError> {
        let len = self.levels.len();
        let pose = (self.mode == Mode::Edit && self.levels.active_index() == Some(index))
            .then(|| self.editor_camera.pose());
        let level = self
            .levels
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { index, len })?;
        if let Some(pose) = pose {
            level.editor_camera = Some(pose);
        }
        let path = stagehand_persist::save_level(level)?;
        tracing::info!(level = level.name(), path = %path.display(), "level saved");
        Ok(path)
    }

    /// Save every dirty persisted level, including one held aside during
    /// play mode. Returns how many were written.
    pub fn save_all_dirty_levels(&mut self) -> Result<usize, SessionError> {
        let dirty: Vec<usize> = self
            .levels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_dirty() && !l.is_runtime_clone())
            .map(|(i, _)| i)
            .collect();
        let mut saved = 0;
        for index in dirty {
            self.save_level(index)?;
            saved += 1;
        }
        if let Some(level) = self.editor_level.as_mut().filter(|l| l.is_dirty()) {
            stagehand_persist::save_level(level)?;
            saved += 1;
        }
        Ok(saved)
    }

    pub fn is_any_level_dirty(&self) -> bool {
        self.levels.iter().any(Level::is_dirty)
            || self.editor_level.as_ref().is_some_and(Level::is_dirty)
    }

    /// Re-resolve the game camera of the active level after structural edits.
    pub(crate) fn refresh_game_camera(&mut self) {
        let found = self.levels.active().and_then(|l| resolve_game_camera(l.tree()));
        self.replace_game_camera(found);
    }

    /// Store a re-resolved game camera. Losing it while simulating is
    /// reported once here; the frames skipped afterwards only log at debug.
    pub(crate) fn replace_game_camera(&mut self, found: Option<NodeId>) {
        if found.is_none() && self.game_camera.is_some() && self.mode.is_simulating() {
            let level = self.levels.active().map(|l| l.name().to_string()).unwrap_or_default();
            tracing::warn!(%level, "game camera lost; frames are skipped until one is added");
        }
        self.game_camera = found;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use stagehand_common::{EditorCameraPose, Transform};
    use stagehand_ecs::Camera;
    use stagehand_persist::write_level_json;

    use crate::config::EngineConfig;

    fn context(root: &Path) -> EngineContext {
        EngineContext::new(EngineConfig {
            project_root: root.to_path_buf(),
            ..EngineConfig::default()
        })
    }

    fn write_level(root: &Path, name: &str) -> PathBuf {
        let dir = root.join("Levels");
        let path = dir.join(format!("{name}.level.json"));
        let mut level = Level::new(name, Some(path.clone()));
        let tree = level.tree_mut();
        let cam = tree
            .add_child(tree.root(), "Camera", Transform::from_position(Vec3::new(0.0, 3.0, 6.0)))
            .unwrap();
        tree.node_mut(cam)
            .unwrap()
            .components
            .insert(Box::new(Camera::default()));
        write_level_json(&level, &path).unwrap();
        path
    }

    #[test]
    fn level_name_strips_suffixes() {
        assert_eq!(level_name(Path::new("Levels/arena.level.json")), "arena");
        assert_eq!(level_name(Path::new("menu.json")), "menu");
        assert_eq!(level_name(Path::new("plain")), "plain");
    }

    #[test]
    fn open_resolves_camera_and_activates() {
        let dir = tempfile::tempdir().unwrap();
        write_level(dir.path(), "arena");
        let mut ctx = context(dir.path());

        let index = ctx.open_level("arena").unwrap();
        assert_eq!(index, 0);
        assert_eq!(ctx.active_index(), Some(0));
        let level = ctx.active_level().unwrap();
        assert_eq!(level.name(), "arena");
        let cam = level.tree().find_path("Camera");
        assert_eq!(ctx.game_camera(), cam);
        // No stored pose: the editor camera starts at the game camera.
        assert_eq!(ctx.editor_camera().position, Vec3::new(0.0, 3.0, 6.0));
    }

    #[test]
    fn opening_twice_focuses_the_open_level() {
        let dir = tempfile::tempdir().unwrap();
        let arena = write_level(dir.path(), "arena");
        write_level(dir.path(), "menu");
        let mut ctx = context(dir.path());

        let first = ctx.open_level("arena").unwrap();
        ctx.open_level("menu").unwrap();
        assert_eq!(ctx.active_index(), Some(1));

        let again = ctx.open_level(arena.to_str().unwrap()).unwrap();
        assert_eq!(again, first);
        assert_eq!(ctx.levels().len(), 2);
        assert_eq!(ctx.active_index(), Some(first));
    }

    #[test]
    fn missing_level_is_an_error_and_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        assert!(ctx.open_level("nowhere").is_err());
        assert!(ctx.levels().is_empty());
        assert_eq!(ctx.active_index(), None);
    }

    #[test]
    fn close_active_last_clamps_and_reactivates() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            write_level(dir.path(), name);
        }
        let mut ctx = context(dir.path());
        for name in ["a", "b", "c"] {
            ctx.open_level(name).unwrap();
        }
        assert_eq!(ctx.active_index(), Some(2));

        ctx.close_level(2).unwrap();
        assert_eq!(ctx.active_index(), Some(1));
        assert_eq!(ctx.active_level().unwrap().name(), "b");
        assert!(ctx.game_camera().is_some());

        ctx.close_level(0).unwrap();
        assert_eq!(ctx.active_level().unwrap().name(), "b");
        ctx.close_level(0).unwrap();
        assert_eq!(ctx.active_index(), None);
        assert_eq!(ctx.game_camera(), None);
    }

    #[test]
    fn closing_before_active_keeps_the_index_and_clears_history() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            write_level(dir.path(), name);
        }
        let mut ctx = context(dir.path());
        for name in ["a", "b", "c"] {
            ctx.open_level(name).unwrap();
        }
        ctx.set_active_level(1, true).unwrap();
        let root = ctx.active_level().unwrap().tree().root();
        ctx.add_node(root, "crate", Transform::default()).unwrap();
        assert!(ctx.history().can_undo());

        ctx.close_level(0).unwrap();
        assert_eq!(ctx.active_index(), Some(1));
        assert_eq!(ctx.active_level().unwrap().name(), "c");
        assert!(!ctx.history().can_undo());
        assert!(ctx.game_camera().is_some());
    }

    #[test]
    fn closing_after_active_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b"] {
            write_level(dir.path(), name);
        }
        let mut ctx = context(dir.path());
        ctx.open_level("a").unwrap();
        ctx.open_level("b").unwrap();
        ctx.set_active_level(0, true).unwrap();
        let root = ctx.active_level().unwrap().tree().root();
        ctx.add_node(root, "crate", Transform::default()).unwrap();

        ctx.close_level(1).unwrap();
        assert_eq!(ctx.active_level().unwrap().name(), "a");
        assert!(ctx.history().can_undo());
    }

    #[test]
    fn switching_levels_clears_history() {
        let dir = tempfile::tempdir().unwrap();
        write_level(dir.path(), "a");
        write_level(dir.path(), "b");
        let mut ctx = context(dir.path());
        ctx.open_level("a").unwrap();
        ctx.open_level("b").unwrap();

        let root = ctx.active_level().unwrap().tree().root();
        ctx.add_node(root, "crate", Transform::default()).unwrap();
        assert!(ctx.history().can_undo());

        ctx.set_active_level(0, false).unwrap();
        assert!(ctx.history().can_undo());
        ctx.set_active_level(1, true).unwrap();
        assert!(!ctx.history().can_undo());
    }

    #[test]
    fn create_then_save_stores_editor_pose() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        let index = ctx.create_level("Levels/fresh.level.json").unwrap();
        let path = dir.path().join("Levels/fresh.level.json");
        assert!(path.is_file());
        assert_eq!(ctx.active_level().unwrap().name(), "fresh");

        ctx.editor_camera_mut().position = Vec3::new(4.0, 5.0, 6.0);
        ctx.save_level(index).unwrap();

        let reloaded = read_level(&path).unwrap();
        let pose: EditorCameraPose = reloaded.editor_camera.unwrap();
        assert_eq!(pose.position, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn save_all_writes_only_dirty_levels() {
        let dir = tempfile::tempdir().unwrap();
        write_level(dir.path(), "a");
        write_level(dir.path(), "b");
        let mut ctx = context(dir.path());
        ctx.open_level("a").unwrap();
        ctx.open_level("b").unwrap();
        assert!(!ctx.is_any_level_dirty());

        let root = ctx.active_level().unwrap().tree().root();
        ctx.add_node(root, "crate", Transform::default()).unwrap();
        assert!(ctx.is_any_level_dirty());

        assert_eq!(ctx.save_all_dirty_levels().unwrap(), 1);
        assert!(!ctx.is_any_level_dirty());
        let reloaded = read_level(dir.path().join("Levels/b.level.json")).unwrap();
        assert!(reloaded.tree().find_path("crate").is_some());
    }
}
