//! Play mode: simulate a sandboxed clone of the active level.
//!
//! Entering play swaps the active slot for a runtime clone and keeps the
//! persisted level aside, untouched, so undo history recorded against it
//! stays valid. Leaving play puts that exact instance back.

use stagehand_common::Mode;

use crate::context::EngineContext;
use crate::lifecycle::Loader;
use crate::session::SessionError;

impl EngineContext {
    /// Enter play mode from the paused editor, or leave it. Returns the new
    /// mode.
    pub fn toggle_play_mode(&mut self) -> Result<Mode, SessionError> {
        match self.mode {
            Mode::Edit => self.enter_play().map(|()| Mode::Play),
            Mode::Play => self.exit_play().map(|()| Mode::Edit),
            Mode::Runtime => Err(SessionError::NotInEditor),
        }
    }

    fn enter_play(&mut self) -> Result<(), SessionError> {
        let index = self.levels.active_index().ok_or(SessionError::NoActiveLevel)?;
        let clone = self
            .levels
            .active()
            .ok_or(SessionError::NoActiveLevel)?
            .runtime_clone();
        tracing::info!(level = clone.name(), "entering play mode");

        self.mode = Mode::Play;
        self.physics.init();
        let original = self.levels.replace(index, clone)?;
        self.editor_level = Some(original);

        let camera = self.editor_camera;
        self.set_active_level(index, false)?;
        self.editor_camera = camera;
        Ok(())
    }

    fn exit_play(&mut self) -> Result<(), SessionError> {
        let index = self.levels.active_index().ok_or(SessionError::NoActiveLevel)?;
        let original = self.editor_level.take().ok_or(SessionError::NotPlaying)?;
        tracing::info!(level = original.name(), "leaving play mode");

        self.mode = Mode::Edit;
        let clone = self.levels.replace(index, original)?;
        self.teardown_level(clone);
        self.physics.init();

        let camera = self.editor_camera;
        self.set_active_level(index, false)?;
        self.editor_camera = camera;

        // The physics world was reset; rigidbodies of the restored level
        // hold no body in it.
        let mut loader = Loader {
            mode: self.mode,
            assets: &mut self.assets,
            physics: self.physics.as_mut(),
            scripts: self.scripts.as_mut(),
        };
        if let Some(level) = self.levels.get_mut(index) {
            let reloaded = loader.reload_rigidbodies(level.tree_mut());
            tracing::debug!(reloaded, "rigidbodies reloaded");
        }
        Ok(())
    }
}
