use stagehand_common::{LevelId, NodeId, Transform};
use stagehand_scene::{Level, Node, NodeDocument, SceneError};

/// An editing command that can be applied to a level and reversed.
///
/// Nodes are addressed by path so a command stays valid after its target was
/// removed and recreated by an earlier undo.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Create a subtree. Undo = despawn it.
    Spawn {
        parent: String,
        name: String,
        index: usize,
        node: NodeDocument,
    },
    /// Remove a subtree. Undo = spawn it again at the same sibling position.
    Despawn {
        parent: String,
        name: String,
        index: usize,
        node: NodeDocument,
    },
    /// Replace a local transform. Undo = restore the old one.
    SetTransform {
        path: String,
        old: Transform,
        new: Transform,
    },
    /// Rename a node. `parent` is `None` for the root.
    Rename {
        parent: Option<String>,
        old: String,
        new: String,
    },
}

impl EditCommand {
    /// Produce the inverse command (for undo).
    pub fn inverse(&self) -> Self {
        match self {
            Self::Spawn {
                parent,
                name,
                index,
                node,
            } => Self::Despawn {
                parent: parent.clone(),
                name: name.clone(),
                index: *index,
                node: node.clone(),
            },
            Self::Despawn {
                parent,
                name,
                index,
                node,
            } => Self::Spawn {
                parent: parent.clone(),
                name: name.clone(),
                index: *index,
                node: node.clone(),
            },
            Self::SetTransform { path, old, new } => Self::SetTransform {
                path: path.clone(),
                old: *new,
                new: *old,
            },
            Self::Rename { parent, old, new } => Self::Rename {
                parent: parent.clone(),
                old: new.clone(),
                new: old.clone(),
            },
        }
    }
}

/// Errors from edit operations.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("history belongs to level {expected:?}, not {actual:?}")]
    LevelMismatch { expected: LevelId, actual: LevelId },
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

fn find(level: &Level, path: &str) -> Result<NodeId, SceneError> {
    level
        .tree()
        .find_path(path)
        .ok_or_else(|| SceneError::PathNotFound(path.to_string()))
}

fn parent_path(level: &Level, id: NodeId) -> Result<Option<String>, SceneError> {
    let node = level.tree().node(id)?;
    Ok(node
        .parent()
        .and_then(|parent| level.tree().path_of(parent)))
}

/// Undo/redo history for one level.
///
/// Nodes detached by an edit, undo or redo are parked until the caller takes
/// them with [`take_detached`](Self::take_detached) and tears down their
/// components.
#[derive(Debug, Default)]
pub struct EditHistory {
    level: Option<LevelId>,
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
    detached: Vec<Node>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level this history records against, if any edit was made yet.
    pub fn level(&self) -> Option<LevelId> {
        self.level
    }

    /// Forget every recorded edit and the bound level.
    pub fn clear(&mut self) {
        self.level = None;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Nodes removed from the level since the last call.
    pub fn take_detached(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.detached)
    }

    /// Create a child under `parent` and record it.
    pub fn add_child(
        &mut self,
        level: &mut Level,
        parent: NodeId,
        name: &str,
        transform: Transform,
    ) -> Result<NodeId, EditError> {
        let id = level.tree_mut().add_child(parent, name, transform)?;
        let tree = level.tree();
        let command = EditCommand::Spawn {
            parent: tree.path_of(parent).unwrap_or_default(),
            name: name.to_string(),
            index: tree.sibling_index(id).unwrap_or_default(),
            node: tree.subtree_document(id)?,
        };
        self.record(level, command);
        Ok(id)
    }

    /// Remove a node and its subtree and record it.
    pub fn remove_node(&mut self, level: &mut Level, id: NodeId) -> Result<(), EditError> {
        let tree = level.tree();
        let node = tree.node(id)?;
        let command = EditCommand::Despawn {
            parent: parent_path(level, id)?.unwrap_or_default(),
            name: node.name().to_string(),
            index: tree.sibling_index(id).unwrap_or_default(),
            node: tree.subtree_document(id)?,
        };
        let removed = level.tree_mut().remove(id)?;
        self.detached.extend(removed);
        self.record(level, command);
        Ok(())
    }

    /// Replace a node's local transform and record it. Returns the old one.
    pub fn set_transform(
        &mut self,
        level: &mut Level,
        id: NodeId,
        new: Transform,
    ) -> Result<Transform, EditError> {
        let path = level
            .tree()
            .path_of(id)
            .ok_or(SceneError::NodeNotFound(id))?;
        let old = level.tree_mut().set_transform(id, new)?;
        self.record(level, EditCommand::SetTransform { path, old, new });
        Ok(old)
    }

    /// Rename a node and record it.
    pub fn rename(&mut self, level: &mut Level, id: NodeId, new: &str) -> Result<(), EditError> {
        let parent = parent_path(level, id)?;
        let old = level.tree_mut().rename(id, new)?;
        if old != new {
            let command = EditCommand::Rename {
                parent,
                old,
                new: new.to_string(),
            };
            self.record(level, command);
        }
        Ok(())
    }

    /// Undo the last edit. Returns true if an operation was undone.
    pub fn undo(&mut self, level: &mut Level) -> Result<bool, EditError> {
        self.check_level(level)?;
        let Some(cmd) = self.undo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = self.apply(level, &cmd.inverse()) {
            self.undo_stack.push(cmd);
            return Err(err);
        }
        self.redo_stack.push(cmd);
        Ok(true)
    }

    /// Redo the last undone edit. Returns true if an operation was redone.
    pub fn redo(&mut self, level: &mut Level) -> Result<bool, EditError> {
        self.check_level(level)?;
        let Some(cmd) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = self.apply(level, &cmd) {
            self.redo_stack.push(cmd);
            return Err(err);
        }
        self.undo_stack.push(cmd);
        Ok(true)
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn check_level(&self, level: &Level) -> Result<(), EditError> {
        match self.level {
            Some(expected) if expected != level.id() => Err(EditError::LevelMismatch {
                expected,
                actual: level.id(),
            }),
            _ => Ok(()),
        }
    }

    /// Push a freshly applied edit. Switching levels starts a new history.
    fn record(&mut self, level: &mut Level, command: EditCommand) {
        if self.level != Some(level.id()) {
            self.clear();
            self.level = Some(level.id());
        }
        tracing::debug!(level = level.name(), ?command, "edit recorded");
        self.undo_stack.push(command);
        self.redo_stack.clear();
        level.set_dirty(true);
    }

    fn apply(&mut self, level: &mut Level, cmd: &EditCommand) -> Result<(), EditError> {
        match cmd {
            EditCommand::Spawn {
                parent,
                name,
                index,
                node,
            } => {
                let parent_id = find(level, parent)?;
                let tree = level.tree_mut();
                tree.insert_document(parent_id, name, node)?;
                tree.move_child(parent_id, name, *index)?;
            }
            EditCommand::Despawn { parent, name, .. } => {
                let id = find(level, &join(parent, name))?;
                let removed = level.tree_mut().remove(id)?;
                self.detached.extend(removed);
            }
            EditCommand::SetTransform { path, new, .. } => {
                let id = find(level, path)?;
                level.tree_mut().set_transform(id, *new)?;
            }
            EditCommand::Rename { parent, old, new } => {
                let path = match parent {
                    Some(parent) => join(parent, old),
                    None => String::new(),
                };
                let id = find(level, &path)?;
                level.tree_mut().rename(id, new.as_str())?;
            }
        }
        level.set_dirty(true);
        Ok(())
    }
}
