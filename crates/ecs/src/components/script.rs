use std::any::Any;

use serde::{Deserialize, Serialize};
use stagehand_assets::AssetState;

use crate::component::{Component, ComponentError, ComponentKind, save_fields};
use crate::context::{LoadContext, LogicContext, UnloadContext};
use crate::scripting::{ScriptBindings, ScriptHandle};

/// Runs a script's loop entry point once per simulated frame.
///
/// In the paused editor the component loads without compiling anything, so
/// edit-time levels never execute user code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub path: String,
    #[serde(skip)]
    handle: Option<ScriptHandle>,
}

impl Script {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handle: None,
        }
    }

    /// True when the script compiled and exposes a loop.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Component for Script {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Script
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> bool {
        if !ctx.mode.is_simulating() {
            return true;
        }
        let asset = match ctx.assets.request(&self.path) {
            AssetState::Ready(asset) => asset.clone(),
            AssetState::Pending | AssetState::Failed(_) => return false,
        };
        let Some(source) = asset.as_script() else {
            tracing::error!(node = ctx.node.name, path = %self.path, "asset is not a script");
            return true;
        };

        match ctx.scripts.compile(&self.path, &source.source) {
            Ok(handle) => self.handle = handle,
            Err(err) => {
                tracing::error!(node = ctx.node.name, %err, "script failed to compile");
                self.handle = None;
            }
        }
        true
    }

    fn unload(&mut self, ctx: &mut UnloadContext<'_>) {
        if let Some(handle) = self.handle.take() {
            ctx.scripts.release(handle);
        }
    }

    fn logic(&mut self, ctx: &mut LogicContext<'_>) -> Result<(), ComponentError> {
        if !ctx.mode.is_simulating() {
            return Ok(());
        }
        let Some(handle) = self.handle else {
            return Ok(());
        };
        let mut bindings = ScriptBindings {
            node: ctx.node,
            node_name: ctx.node_name,
            transform: &mut *ctx.transform,
            camera: ctx.camera.as_ref(),
            scene: &mut *ctx.scene,
            settings: &mut *ctx.settings,
            dt: ctx.dt,
        };
        ctx.scripts.call_loop(handle, &mut bindings)?;
        Ok(())
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(Self::new(self.path.clone()))
    }

    fn save(&self) -> Result<serde_json::Value, ComponentError> {
        save_fields(self.kind(), self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NodeView;
    use crate::scripting::{NullScriptHost, ScriptError, ScriptHost};
    use glam::Mat4;
    use stagehand_assets::{Asset, AssetServer, ScriptSource};
    use stagehand_common::{Mode, NodeId};
    use stagehand_physics::SimplePhysics;

    struct RejectingHost;

    impl ScriptHost for RejectingHost {
        fn compile(&mut self, name: &str, _source: &str) -> Result<Option<ScriptHandle>, ScriptError> {
            Err(ScriptError::Compile {
                name: name.to_string(),
                message: "unexpected symbol".into(),
            })
        }
        fn call_loop(
            &mut self,
            handle: ScriptHandle,
            _bindings: &mut ScriptBindings<'_>,
        ) -> Result<(), ScriptError> {
            Err(ScriptError::UnknownHandle(handle))
        }
        fn release(&mut self, _handle: ScriptHandle) {}
    }

    fn assets_with_script() -> AssetServer {
        let mut assets = AssetServer::in_memory();
        assets.insert(
            "spin.lua",
            Asset::Script(ScriptSource {
                name: "spin.lua".into(),
                source: "function Loop(dt) end".into(),
            }),
        );
        assets
    }

    fn load_with(script: &mut Script, mode: Mode, assets: &mut AssetServer, host: &mut dyn ScriptHost) -> bool {
        let mut physics = SimplePhysics::default();
        let mut ctx = LoadContext {
            mode,
            node: NodeView {
                id: NodeId::default(),
                name: "spinner",
                world_matrix: Mat4::IDENTITY,
                collider_shapes: &[],
                pending_colliders: false,
            },
            assets,
            physics: &mut physics,
            scripts: host,
        };
        script.load(&mut ctx)
    }

    #[test]
    fn editor_load_skips_compile() {
        let mut assets = AssetServer::in_memory();
        let mut host = NullScriptHost::new();
        let mut script = Script::new("missing.lua");
        assert!(load_with(&mut script, Mode::Edit, &mut assets, &mut host));
        assert!(!script.is_running());
        assert_eq!(host.live_count(), 0);
    }

    #[test]
    fn play_load_compiles() {
        let mut assets = assets_with_script();
        let mut host = NullScriptHost::new();
        let mut script = Script::new("spin.lua");
        assert!(load_with(&mut script, Mode::Play, &mut assets, &mut host));
        assert!(script.is_running());
        assert_eq!(host.live_count(), 1);
    }

    #[test]
    fn missing_asset_keeps_retrying() {
        let mut assets = AssetServer::in_memory();
        let mut host = NullScriptHost::new();
        let mut script = Script::new("later.lua");
        assert!(!load_with(&mut script, Mode::Runtime, &mut assets, &mut host));
    }

    #[test]
    fn compile_error_still_counts_as_loaded() {
        let mut assets = assets_with_script();
        let mut script = Script::new("spin.lua");
        assert!(load_with(&mut script, Mode::Play, &mut assets, &mut RejectingHost));
        assert!(!script.is_running());
    }
}
