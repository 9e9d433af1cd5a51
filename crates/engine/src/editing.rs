//! Scene edits on the active level.
//!
//! In the paused editor every reversible edit goes through the undo history.
//! While simulating, edits apply to the running level directly and are not
//! recorded.

use stagehand_common::{Mode, NodeId, Transform};
use stagehand_ecs::{Component, ComponentKind, UnloadContext};
use stagehand_scene::{Level, Node};

use crate::context::EngineContext;
use crate::session::SessionError;

impl EngineContext {
    fn active_for_edit(&mut self) -> Result<&mut Level, SessionError> {
        self.levels.active_mut().ok_or(SessionError::NoActiveLevel)
    }

    fn recording(&self) -> bool {
        self.mode == Mode::Edit
    }

    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: &str,
        transform: Transform,
    ) -> Result<NodeId, SessionError> {
        let recording = self.recording();
        let level = self.levels.active_mut().ok_or(SessionError::NoActiveLevel)?;
        let id = if recording {
            self.history.add_child(level, parent, name, transform)?
        } else {
            level.tree_mut().add_child(parent, name, transform)?
        };
        tracing::debug!(node = name, "node added");
        Ok(id)
    }

    /// Remove a node and its subtree. Every component in the subtree is
    /// unloaded, then quit.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), SessionError> {
        let recording = self.recording();
        let level = self.levels.active_mut().ok_or(SessionError::NoActiveLevel)?;
        let removed: Vec<Node> = if recording {
            self.history.remove_node(level, id)?;
            self.history.take_detached()
        } else {
            level.tree_mut().remove(id)?
        };
        tracing::debug!(nodes = removed.len(), "subtree removed");
        self.after_structural_change(removed);
        Ok(())
    }

    /// Attach a component. Returns false, changing nothing, if the node
    /// already has one of that kind.
    pub fn add_component(
        &mut self,
        id: NodeId,
        component: Box<dyn Component>,
    ) -> Result<bool, SessionError> {
        let recording = self.recording();
        let is_camera = component.kind() == ComponentKind::Camera;
        let level = self.active_for_edit()?;
        let added = level.tree_mut().node_mut(id)?.components.insert(component);
        if added && recording {
            level.set_dirty(true);
        }
        if added && is_camera {
            self.refresh_game_camera();
        }
        Ok(added)
    }

    /// Detach a component, unloading and quitting it. Returns false if the
    /// node had none of that kind.
    pub fn remove_component(&mut self, id: NodeId, kind: ComponentKind) -> Result<bool, SessionError> {
        let recording = self.recording();
        let level = self.levels.active_mut().ok_or(SessionError::NoActiveLevel)?;
        let Some(slot) = level.tree_mut().node_mut(id)?.components.remove(kind) else {
            return Ok(false);
        };
        if recording {
            level.set_dirty(true);
        }
        slot.teardown(&mut UnloadContext {
            physics: self.physics.as_mut(),
            scripts: self.scripts.as_mut(),
        });
        if kind == ComponentKind::Camera {
            self.refresh_game_camera();
        }
        Ok(true)
    }

    /// Replace a node's local transform. Returns the previous one.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<Transform, SessionError> {
        let recording = self.recording();
        let level = self.levels.active_mut().ok_or(SessionError::NoActiveLevel)?;
        let old = if recording {
            self.history.set_transform(level, id, transform)?
        } else {
            level.tree_mut().set_transform(id, transform)?
        };
        Ok(old)
    }

    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<(), SessionError> {
        let recording = self.recording();
        let level = self.levels.active_mut().ok_or(SessionError::NoActiveLevel)?;
        if recording {
            self.history.rename(level, id, name)?;
        } else {
            level.tree_mut().rename(id, name)?;
        }
        self.refresh_game_camera();
        Ok(())
    }

    /// Undo the last edit on the active level. Only available in the paused
    /// editor.
    pub fn undo(&mut self) -> Result<bool, SessionError> {
        self.check_can_rewind()?;
        let level = self.levels.active_mut().ok_or(SessionError::NoActiveLevel)?;
        let undone = self.history.undo(level)?;
        let detached = self.history.take_detached();
        self.after_structural_change(detached);
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, SessionError> {
        self.check_can_rewind()?;
        let level = self.levels.active_mut().ok_or(SessionError::NoActiveLevel)?;
        let redone = self.history.redo(level)?;
        let detached = self.history.take_detached();
        self.after_structural_change(detached);
        Ok(redone)
    }

    /// Select a node, or clear the selection. In the paused editor a new
    /// selection starts the bounce pulse.
    pub fn select(&mut self, id: Option<NodeId>) {
        self.selected = id;
        if self.mode != Mode::Edit {
            return;
        }
        if let (Some(id), Some(level)) = (id, self.levels.active_mut()) {
            level.tree_mut().start_bounce(id);
        }
    }

    fn check_can_rewind(&self) -> Result<(), SessionError> {
        match self.mode {
            Mode::Edit => Ok(()),
            Mode::Play => Err(SessionError::PlayModeActive),
            Mode::Runtime => Err(SessionError::NotInEditor),
        }
    }

    fn after_structural_change(&mut self, removed: Vec<Node>) {
        let levels = &self.levels;
        self.selected = self
            .selected
            .filter(|&id| levels.active().is_some_and(|l| l.tree().contains(id)));
        if !removed.is_empty() {
            self.teardown_nodes(removed);
        }
        self.refresh_game_camera();
    }
}
