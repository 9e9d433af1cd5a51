use stagehand_assets::AssetServer;
use stagehand_author::EditHistory;
use stagehand_common::{Mode, NodeId};
use stagehand_ecs::{NullScriptHost, ScriptHost, UnloadContext};
use stagehand_physics::{PhysicsWorld, SimplePhysics};
use stagehand_render::{EditorCamera, FrameScratch, RenderSettings};
use stagehand_scene::{Level, Node};

use crate::config::EngineConfig;
use crate::session::LevelRegistry;
use crate::timing::FrameTimer;

/// All engine state for one session, owned in one place and driven by
/// [`frame`](Self::frame).
///
/// Constructed at startup, torn down with [`shutdown`](Self::shutdown).
pub struct EngineContext {
    pub(crate) config: EngineConfig,
    pub(crate) mode: Mode,
    pub(crate) levels: LevelRegistry,
    /// The persisted level set aside while its runtime clone plays.
    pub(crate) editor_level: Option<Level>,
    pub(crate) history: EditHistory,
    pub(crate) assets: AssetServer,
    pub(crate) physics: Box<dyn PhysicsWorld>,
    pub(crate) scripts: Box<dyn ScriptHost>,
    pub(crate) scratch: FrameScratch,
    pub(crate) game_camera: Option<NodeId>,
    pub(crate) editor_camera: EditorCamera,
    pub(crate) selected: Option<NodeId>,
    pub(crate) frame_index: u64,
    pub(crate) timer: FrameTimer,
}

impl EngineContext {
    /// A context with the built-in physics world and no script runtime.
    /// Assets load from the project root.
    pub fn new(config: EngineConfig) -> Self {
        let mode = if config.editor { Mode::Edit } else { Mode::Runtime };
        let mut physics = SimplePhysics::new(config.gravity, config.floor);
        physics.init();
        tracing::info!(?mode, root = %config.project_root.display(), "engine context created");
        Self {
            assets: AssetServer::new(&config.project_root),
            physics: Box::new(physics),
            scripts: Box::new(NullScriptHost::new()),
            mode,
            levels: LevelRegistry::new(),
            editor_level: None,
            history: EditHistory::new(),
            scratch: FrameScratch::new(),
            game_camera: None,
            editor_camera: EditorCamera::default(),
            selected: None,
            frame_index: 0,
            timer: FrameTimer::new(config.frame_history),
            config,
        }
    }

    pub fn with_physics(mut self, mut physics: Box<dyn PhysicsWorld>) -> Self {
        physics.init();
        self.physics = physics;
        self
    }

    pub fn with_scripts(mut self, scripts: Box<dyn ScriptHost>) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn with_assets(mut self, assets: AssetServer) -> Self {
        self.assets = assets;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode == Mode::Play
    }

    pub fn levels(&self) -> &LevelRegistry {
        &self.levels
    }

    pub fn active_level(&self) -> Option<&Level> {
        self.levels.active()
    }

    pub fn active_level_mut(&mut self) -> Option<&mut Level> {
        self.levels.active_mut()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.levels.active_index()
    }

    /// The persisted level held aside during play mode.
    pub fn editor_level(&self) -> Option<&Level> {
        self.editor_level.as_ref()
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn assets(&self) -> &AssetServer {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetServer {
        &mut self.assets
    }

    pub fn physics(&self) -> &dyn PhysicsWorld {
        self.physics.as_ref()
    }

    pub fn render_settings(&self) -> &RenderSettings {
        &self.config.render
    }

    pub fn render_settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.config.render
    }

    pub fn game_camera(&self) -> Option<NodeId> {
        self.game_camera
    }

    pub fn editor_camera(&self) -> &EditorCamera {
        &self.editor_camera
    }

    pub fn editor_camera_mut(&mut self) -> &mut EditorCamera {
        &mut self.editor_camera
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Unload then quit every component of every open level, including the
    /// level held aside during play mode. Leaves the context empty.
    pub fn shutdown(&mut self) {
        let mut levels = self.levels.drain();
        levels.extend(self.editor_level.take());
        tracing::info!(levels = levels.len(), "shutting down");
        for level in levels {
            self.teardown_level(level);
        }
        self.history.clear();
        self.scratch.clear();
        self.game_camera = None;
        self.selected = None;
        self.mode = if self.config.editor { Mode::Edit } else { Mode::Runtime };
    }

    pub(crate) fn teardown_level(&mut self, mut level: Level) {
        tracing::debug!(level = level.name(), "tearing down level");
        let mut ctx = UnloadContext {
            physics: self.physics.as_mut(),
            scripts: self.scripts.as_mut(),
        };
        let tree = level.tree_mut();
        for id in tree.pre_order() {
            if let Some(node) = tree.get_mut(id) {
                for slot in node.components.drain() {
                    slot.teardown(&mut ctx);
                }
            }
        }
    }

    /// Unload then quit every component on nodes already removed from a tree.
    pub(crate) fn teardown_nodes(&mut self, nodes: Vec<Node>) {
        let mut ctx = UnloadContext {
            physics: self.physics.as_mut(),
            scripts: self.scripts.as_mut(),
        };
        for mut node in nodes {
            for slot in node.components.drain() {
                slot.teardown(&mut ctx);
            }
        }
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("mode", &self.mode)
            .field("levels", &self.levels.len())
            .field("active", &self.levels.active_index())
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}
