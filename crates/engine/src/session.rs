use std::path::Path;

use stagehand_author::EditError;
use stagehand_common::LevelId;
use stagehand_persist::{LevelFileError, canonical_key};
use stagehand_scene::{Level, SceneError};

/// Errors from session operations: opening, closing, saving and switching
/// levels, and entering or leaving play mode.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no level at index {index} ({len} open)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no active level")]
    NoActiveLevel,
    #[error("not allowed while play mode is active")]
    PlayModeActive,
    #[error("play mode is not active")]
    NotPlaying,
    #[error("play mode is only available in the editor")]
    NotInEditor,
    #[error(transparent)]
    File(#[from] LevelFileError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Open levels in the order they were opened, plus the active slot.
#[derive(Debug, Default)]
pub struct LevelRegistry {
    levels: Vec<Level>,
    active: Option<usize>,
}

impl LevelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a level. Returns its index. Does not change the active slot.
    pub fn push(&mut self, level: Level) -> usize {
        self.levels.push(level);
        self.levels.len() - 1
    }

    /// Remove the level at `index`. The active slot keeps its position; if it
    /// now points past the end it is clamped to the new last index, or
    /// becomes none once the registry is empty.
    pub fn remove(&mut self, index: usize) -> Result<Level, SessionError> {
        self.check(index)?;
        let level = self.levels.remove(index);
        self.active = match self.active {
            _ if self.levels.is_empty() => None,
            Some(active) => Some(active.min(self.levels.len() - 1)),
            None => None,
        };
        Ok(level)
    }

    pub fn set_active(&mut self, index: usize) -> Result<(), SessionError> {
        self.check(index)?;
        self.active = Some(index);
        Ok(())
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&Level> {
        self.active.and_then(|i| self.levels.get(i))
    }

    pub fn active_mut(&mut self) -> Option<&mut Level> {
        self.active.and_then(|i| self.levels.get_mut(i))
    }

    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Level> {
        self.levels.get_mut(index)
    }

    /// Swap the level in slot `index` for `level`, returning the previous one.
    pub fn replace(&mut self, index: usize, level: Level) -> Result<Level, SessionError> {
        self.check(index)?;
        Ok(std::mem::replace(&mut self.levels[index], level))
    }

    pub fn position(&self, id: LevelId) -> Option<usize> {
        self.levels.iter().position(|l| l.id() == id)
    }

    /// Index of an open level backed by the same file as `path`.
    pub fn position_by_path(&self, path: &Path) -> Option<usize> {
        let key = canonical_key(path);
        self.levels
            .iter()
            .position(|l| l.path().is_some_and(|p| canonical_key(p) == key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Level> {
        self.levels.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Remove every level and clear the active slot.
    pub fn drain(&mut self) -> Vec<Level> {
        self.active = None;
        std::mem::take(&mut self.levels)
    }

    fn check(&self, index: usize) -> Result<(), SessionError> {
        if index < self.levels.len() {
            Ok(())
        } else {
            Err(SessionError::IndexOutOfRange {
                index,
                len: self.levels.len(),
            })
        }
    }
}
