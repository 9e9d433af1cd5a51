//! The per-frame pass sequence.
//!
//! ```text
//! asset tick -> load sweep -> [script hooks -> physics step] -> logic
//!            -> hierarchy sync + collection -> shadow pass -> render
//! ```
//!
//! Bracketed phases only run while simulating. Without an active level the
//! frame stops after the asset tick; without a camera it stops after the
//! load sweep.

use std::time::Instant;

use glam::{Mat4, Vec3};
use stagehand_common::{Mode, NodeId};
use stagehand_ecs::{ComponentKind, ComponentSlot, LogicContext, RenderContext};
use stagehand_render::{
    BlendMode, CameraView, CollectedLight, RenderBackend, ShadowSelection, Uniform,
    select_shadow_light, upload_light,
};
use stagehand_scene::{LevelScene, SceneTree, sync_hierarchy};

use crate::camera::{camera_view, resolve_game_camera};
use crate::context::EngineContext;
use crate::lifecycle::Loader;

/// Phases of one frame, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    AssetTick,
    LoadSweep,
    ScriptHooks,
    PhysicsStep,
    Logic,
    HierarchySync,
    ShadowPass,
    Render,
}

/// Why a frame stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoActiveLevel,
    NoCamera,
}

/// What one frame did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub index: u64,
    /// Phases that ran, in order.
    pub phases: Vec<FramePhase>,
    pub assets_settled: usize,
    pub newly_loaded: usize,
    pub lights: usize,
    pub shadow_light: Option<NodeId>,
    /// Transparent nodes in draw order, farthest first.
    pub transparent_order: Vec<NodeId>,
    /// Logic calls that returned an error this frame.
    pub script_faults: usize,
    pub skipped: Option<SkipReason>,
}

impl EngineContext {
    /// Run one frame against the active level.
    ///
    /// Never fails: unready components are retried next frame, component
    /// errors are logged and counted, and a missing level or camera ends the
    /// frame early.
    pub fn frame(&mut self, dt: f32, backend: &mut dyn RenderBackend) -> FrameReport {
        let started = Instant::now();
        let index = self.frame_index;
        let _span = tracing::info_span!("frame", index).entered();
        let mut report = FrameReport {
            index,
            ..FrameReport::default()
        };

        self.run_phases(dt, backend, &mut report);
        if let Some(reason) = report.skipped {
            tracing::trace!(?reason, "frame skipped");
        }

        self.timer.record(started.elapsed());
        self.frame_index += 1;
        report
    }

    fn run_phases(&mut self, dt: f32, backend: &mut dyn RenderBackend, report: &mut FrameReport) {
        {
            let _phase = tracing::debug_span!("asset_tick").entered();
            report.assets_settled = self.assets.update();
            report.phases.push(FramePhase::AssetTick);
        }

        if self.levels.active().is_none() {
            report.skipped = Some(SkipReason::NoActiveLevel);
            return;
        }

        {
            let _phase = tracing::debug_span!("load_sweep").entered();
            report.newly_loaded = self.load_sweep();
            report.phases.push(FramePhase::LoadSweep);
        }

        let Some(camera) = self.active_camera() else {
            tracing::debug!("no active camera; skipping frame");
            report.skipped = Some(SkipReason::NoCamera);
            return;
        };

        self.scratch.clear();
        let simulating = self.mode.is_simulating();
        if simulating {
            {
                let _phase = tracing::debug_span!("script_hooks").entered();
                self.scripts.begin_frame(dt);
                report.phases.push(FramePhase::ScriptHooks);
            }
            let _phase = tracing::debug_span!("physics_step").entered();
            self.physics_step(dt);
            report.phases.push(FramePhase::PhysicsStep);
        }

        {
            let _phase = tracing::debug_span!("logic").entered();
            report.script_faults = self.logic_pass(dt, camera);
            report.phases.push(FramePhase::Logic);
        }

        {
            let _phase = tracing::debug_span!("hierarchy_sync").entered();
            self.hierarchy_pass(dt);
            report.phases.push(FramePhase::HierarchySync);
        }

        // Poses moved during logic; draw and sort from where the camera is now.
        let camera = self.active_camera().unwrap_or(camera);
        self.scratch.sort_transparent(camera.position);
        report.lights = self.scratch.lights().len();
        report.transparent_order = self.scratch.transparent().iter().map(|t| t.node).collect();
        backend.set_uniform("view_pos", Uniform::Vec3(camera.position));

        {
            let _phase = tracing::debug_span!("shadow_pass").entered();
            report.shadow_light = self.shadow_pass(backend);
            report.phases.push(FramePhase::ShadowPass);
        }

        {
            let _phase = tracing::debug_span!("render").entered();
            self.render_pass(&camera, backend);
            report.phases.push(FramePhase::Render);
        }
    }

    /// Try to load every unloaded component of the active level, in pre-order.
    /// Returns how many finished loading.
    pub fn load_sweep(&mut self) -> usize {
        let Some(level) = self.levels.active_mut() else {
            return 0;
        };
        let mut loader = Loader {
            mode: self.mode,
            assets: &mut self.assets,
            physics: self.physics.as_mut(),
            scripts: self.scripts.as_mut(),
        };
        let tree = level.tree_mut();
        let mut newly_loaded = 0;
        for id in tree.pre_order() {
            if let Some(node) = tree.get_mut(id) {
                newly_loaded += loader.load_node(id, node);
            }
        }
        newly_loaded
    }

    /// The camera this frame renders from. The editor camera while paused,
    /// the level's game camera while simulating.
    fn active_camera(&mut self) -> Option<CameraView> {
        if self.mode == Mode::Edit {
            return Some(self.editor_camera.view());
        }
        let tree = self.levels.active()?.tree();
        let stale = self
            .game_camera
            .is_none_or(|id| tree.get(id).is_none_or(|n| !n.components.contains(ComponentKind::Camera)));
        if stale {
            let found = resolve_game_camera(tree);
            self.replace_game_camera(found);
        }
        let tree = self.levels.active()?.tree();
        camera_view(tree, self.game_camera?)
    }

    /// Push last frame's resolved poses into the physics world, then step it.
    fn physics_step(&mut self, dt: f32) {
        if let Some(level) = self.levels.active_mut() {
            let tree = level.tree_mut();
            for id in tree.pre_order() {
                let Some(node) = tree.get_mut(id) else {
                    continue;
                };
                let world = node.world_matrix();
                for (_, slot) in node.components.iter_mut() {
                    slot.sync_to_physics(world, self.physics.as_mut());
                }
            }
        }
        self.physics.update(dt);
    }

    /// Run component logic in pre-order. A node's rigidbody runs before its
    /// other components, so they see the pose the physics step produced.
    /// Returns the number of failed calls.
    fn logic_pass(&mut self, dt: f32, camera: CameraView) -> usize {
        let mode = self.mode;
        let camera_node = if mode.is_simulating() { self.game_camera } else { None };
        let Some(level) = self.levels.active_mut() else {
            return 0;
        };
        let level_name = level.name().to_string();
        let tree = level.tree_mut();
        let mut faults = 0;

        for id in tree.pre_order() {
            let parent_world = parent_world(tree, id);
            // Components are detached while they run so logic can reach the
            // rest of the tree.
            let Some((name, mut components)) = tree
                .get_mut(id)
                .map(|node| (node.name().to_string(), std::mem::take(&mut node.components)))
            else {
                continue;
            };

            let mut order: Vec<ComponentKind> = components.kinds().collect();
            if let Some(pos) = order.iter().position(|&k| k == ComponentKind::Rigidbody) {
                let rigidbody = order.remove(pos);
                order.insert(0, rigidbody);
            }

            for kind in order {
                let Some(slot) = components.get_mut(kind) else {
                    continue;
                };
                let Some(node) = tree.get(id) else {
                    break;
                };
                let world_matrix = node.world_matrix();
                let before = node.transform;
                let mut transform = before;

                let mut scene = LevelScene::new(&level_name, &mut *tree, camera_node);
                let mut ctx = LogicContext {
                    mode,
                    dt,
                    node: id,
                    node_name: &name,
                    transform: &mut transform,
                    parent_world,
                    world_matrix,
                    camera: Some(camera),
                    scene: &mut scene,
                    settings: &mut self.config.render,
                    assets: &mut self.assets,
                    physics: self.physics.as_mut(),
                    scripts: self.scripts.as_mut(),
                };
                if let Err(err) = slot.logic(&mut ctx) {
                    tracing::error!(node = %name, %kind, %err, "component logic failed");
                    faults += 1;
                }

                // A write through the scene stands unless the component also
                // changed its own transform.
                if transform != before {
                    if let Some(node) = tree.get_mut(id) {
                        node.transform = transform;
                    }
                }
            }

            if let Some(node) = tree.get_mut(id) {
                node.components = components;
            }
        }
        faults
    }

    /// Resolve matrices top-down and collect this frame's lights and
    /// transparent draws. The queue is sorted once the camera is resolved.
    fn hierarchy_pass(&mut self, dt: f32) {
        let mode = self.mode;
        let Some(level) = self.levels.active_mut() else {
            return;
        };
        let scratch = &mut self.scratch;
        sync_hierarchy(level.tree_mut(), mode, dt, |id, node| {
            let mut transparent = false;
            for (_, slot) in node.components.iter() {
                if !slot.is_loaded() {
                    continue;
                }
                let component = slot.component();
                if let Some(params) = component.light() {
                    scratch.push_light(CollectedLight {
                        node: id,
                        params,
                        position: node.world_position(),
                        forward: node
                            .world_rotation()
                            .transform_vector3(Vec3::NEG_Z)
                            .normalize_or_zero(),
                    });
                }
                transparent |= component.is_transparent();
            }
            if transparent {
                scratch.push_transparent(id, node.world_position());
            }
        });
    }

    /// Select the shadow light, render the depth pass for it and upload
    /// every collected light. Returns the shadow-casting node, if any.
    fn shadow_pass(&mut self, backend: &mut dyn RenderBackend) -> Option<NodeId> {
        let settings = self.config.render;
        let lights = self.scratch.lights();
        backend.set_uniform("light_count", Uniform::Int(lights.len() as i32));

        let selection = select_shadow_light(lights, &settings);
        if let (Some(selection), Some(level)) = (&selection, self.levels.active()) {
            let light_vp = selection.view_projection();
            backend.begin_shadow_pass(light_vp, settings.shadow_map_resolution);
            let tree = level.tree();
            for_each_loaded(tree, self.mode, backend, |slot, ctx| slot.draw_shadow(ctx));
            backend.end_shadow_pass();

            backend.set_uniform("lightVP", Uniform::Mat4(light_vp));
            backend.set_uniform(
                "shadow_strength",
                Uniform::Float(selection.light.params.shadow_strength),
            );
            backend.set_uniform("shadow_bias", Uniform::Float(settings.shadow_bias));
            backend.set_uniform(
                "shadow_map_resolution",
                Uniform::Int(settings.shadow_map_resolution as i32),
            );
        }
        backend.set_uniform(
            "shadow_light_index",
            Uniform::Int(ShadowSelection::shader_index(selection.as_ref())),
        );

        for (index, light) in lights.iter().enumerate() {
            upload_light(backend, index, light);
        }
        selection.map(|s| s.light.node)
    }

    /// Opaque 3D, then the transparency queue farthest first, then 2D.
    fn render_pass(&self, camera: &CameraView, backend: &mut dyn RenderBackend) {
        let Some(level) = self.levels.active() else {
            return;
        };
        let tree = level.tree();
        let mode = self.mode;

        backend.begin_3d(camera);
        for_each_loaded(tree, mode, backend, |slot, ctx| slot.render_3d(ctx));

        let queue = self.scratch.transparent();
        if !queue.is_empty() {
            backend.set_blend(BlendMode::Alpha);
            backend.set_depth_write(false);
            for entry in queue {
                let Some(node) = tree.get(entry.node) else {
                    continue;
                };
                let mut ctx = RenderContext {
                    mode,
                    node: entry.node,
                    world_matrix: node.world_matrix(),
                    visual_matrix: node.visual_matrix(),
                    backend: &mut *backend,
                };
                for (_, slot) in node.components.iter() {
                    if slot.component().is_transparent() {
                        slot.draw_transparent(&mut ctx);
                    }
                }
            }
            backend.set_depth_write(true);
            backend.set_blend(BlendMode::Opaque);
        }
        backend.end_3d();

        backend.begin_2d();
        for_each_loaded(tree, mode, backend, |slot, ctx| slot.render_2d(ctx));
        backend.end_2d();
    }
}

fn parent_world(tree: &SceneTree, id: NodeId) -> Mat4 {
    tree.get(id)
        .and_then(|n| n.parent())
        .and_then(|p| tree.get(p))
        .map_or(Mat4::IDENTITY, |p| p.world_matrix())
}

/// Visit every component slot in draw order with a render context for its
/// node. Slots skip their hooks while unloaded.
fn for_each_loaded(
    tree: &SceneTree,
    mode: Mode,
    backend: &mut dyn RenderBackend,
    mut visit: impl FnMut(&ComponentSlot, &mut RenderContext<'_>),
) {
    for id in tree.render_order() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        let mut ctx = RenderContext {
            mode,
            node: id,
            world_matrix: node.world_matrix(),
            visual_matrix: node.visual_matrix(),
            backend: &mut *backend,
        };
        for (_, slot) in node.components.iter() {
            visit(slot, &mut ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use stagehand_assets::{Asset, Mesh, ScriptSource};
    use stagehand_common::Transform;
    use stagehand_ecs::{
        BoxCollider, Camera, Component, ComponentError, Light, LoadContext, Model, Rigidbody,
        Script, ScriptBindings, ScriptError, ScriptHandle, ScriptHost,
    };
    use stagehand_render::{LightParams, RecordingBackend, RenderCommand};
    use stagehand_scene::Level;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;
    use crate::config::EngineConfig;

    const DT: f32 = 1.0 / 60.0;

    /// Records the local position it sees in logic. Can refuse to load a
    /// number of times, or fail every logic call.
    #[derive(Debug, Default)]
    struct Recorder {
        seen: Rc<RefCell<Vec<Vec3>>>,
        load_failures: u32,
        load_calls: Rc<Cell<u32>>,
        fail_logic: bool,
    }

    impl Component for Recorder {
        fn kind(&self) -> ComponentKind {
            ComponentKind::Script
        }

        fn load(&mut self, _ctx: &mut LoadContext<'_>) -> bool {
            self.load_calls.set(self.load_calls.get() + 1);
            if self.load_failures > 0 {
                self.load_failures -= 1;
                return false;
            }
            true
        }

        fn logic(&mut self, ctx: &mut LogicContext<'_>) -> Result<(), ComponentError> {
            if self.fail_logic {
                return Err(ScriptError::Runtime {
                    name: ctx.node_name.to_string(),
                    message: "attempt to index a nil value".into(),
                }
                .into());
            }
            self.seen.borrow_mut().push(ctx.transform.position);
            Ok(())
        }

        fn duplicate(&self) -> Box<dyn Component> {
            Box::new(Recorder {
                seen: Rc::clone(&self.seen),
                load_failures: self.load_failures,
                load_calls: Rc::clone(&self.load_calls),
                fail_logic: self.fail_logic,
            })
        }

        fn save(&self) -> Result<serde_json::Value, ComponentError> {
            Ok(serde_json::Value::Null)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// A standalone player with an empty active level holding a game camera
    /// at the origin, looking down -Z.
    fn runtime() -> EngineContext {
        standalone(EngineContext::new(EngineConfig {
            editor: false,
            ..EngineConfig::default()
        }))
    }

    fn standalone(mut ctx: EngineContext) -> EngineContext {
        ctx.assets_mut().insert(
            "glass.mesh",
            Asset::Mesh(Mesh {
                name: "glass".into(),
                primitive_count: 1,
                material_count: 1,
            }),
        );
        let index = ctx.levels.push(Level::new("test", None));
        ctx.set_active_level(index, true).unwrap();
        let root = root(&ctx);
        let cam = ctx.add_node(root, "Camera", Transform::default()).unwrap();
        ctx.add_component(cam, Box::new(Camera::default())).unwrap();
        ctx
    }

    fn root(ctx: &EngineContext) -> NodeId {
        ctx.active_level().unwrap().tree().root()
    }

    fn add(ctx: &mut EngineContext, name: &str, position: Vec3) -> NodeId {
        let root = root(ctx);
        ctx.add_node(root, name, Transform::from_position(position)).unwrap()
    }

    fn is_loaded(ctx: &EngineContext, id: NodeId, kind: ComponentKind) -> bool {
        let node = ctx.active_level().unwrap().tree().node(id).unwrap();
        node.components.get(kind).unwrap().is_loaded()
    }

    #[test]
    fn transparent_queue_draws_farthest_first() {
        let mut ctx = runtime();
        let glass = || Model {
            transparent: true,
            ..Model::new("glass.mesh")
        };
        let a = add(&mut ctx, "a", Vec3::new(0.0, 0.0, -10.0));
        let b = add(&mut ctx, "b", Vec3::new(0.0, 0.0, -3.0));
        ctx.add_component(a, Box::new(glass())).unwrap();
        ctx.add_component(b, Box::new(glass())).unwrap();

        let mut backend = RecordingBackend::new();
        let report = ctx.frame(DT, &mut backend);
        assert_eq!(report.transparent_order, vec![a, b]);

        let drawn: Vec<NodeId> = backend.draws().map(|d| d.node).collect();
        assert_eq!(drawn, vec![a, b]);

        let commands = backend.commands();
        let blend = commands
            .iter()
            .position(|c| *c == RenderCommand::SetBlend(BlendMode::Alpha))
            .unwrap();
        let first_draw = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::Submit(_)))
            .unwrap();
        assert!(blend < first_draw);
        assert!(commands.contains(&RenderCommand::SetDepthWrite(false)));
    }

    #[test]
    fn rigidbody_logic_runs_before_other_components() {
        let mut ctx = runtime();
        let ball = add(&mut ctx, "ball", Vec3::new(0.0, 5.0, 0.0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        // Inserted first, so map order would run it before the rigidbody.
        ctx.add_component(
            ball,
            Box::new(Recorder {
                seen: Rc::clone(&seen),
                ..Recorder::default()
            }),
        )
        .unwrap();
        ctx.add_component(ball, Box::new(BoxCollider::default())).unwrap();
        ctx.add_component(ball, Box::new(Rigidbody::default())).unwrap();

        let mut backend = RecordingBackend::new();
        for _ in 0..3 {
            ctx.frame(DT, &mut backend);
        }

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].y < 5.0, "logic saw the pre-physics pose");
        assert!(seen.windows(2).all(|w| w[1].y < w[0].y));

        let node = ctx.active_level().unwrap().tree().node(ball).unwrap();
        let body = node.components.get_as::<Rigidbody>().unwrap().body().unwrap();
        let pose = ctx.physics().pose(body).unwrap();
        assert!(seen[2].abs_diff_eq(pose.position, 1e-5));
    }

    #[test]
    fn load_is_retried_until_it_succeeds_then_never_again() {
        let mut ctx = runtime();
        let node = add(&mut ctx, "slow", Vec3::ZERO);
        let calls = Rc::new(Cell::new(0));
        ctx.add_component(
            node,
            Box::new(Recorder {
                load_failures: 3,
                load_calls: Rc::clone(&calls),
                ..Recorder::default()
            }),
        )
        .unwrap();

        let mut backend = RecordingBackend::new();
        for frame in 1..=3 {
            ctx.frame(DT, &mut backend);
            assert!(!is_loaded(&ctx, node, ComponentKind::Script), "frame {frame}");
        }
        let report = ctx.frame(DT, &mut backend);
        assert!(is_loaded(&ctx, node, ComponentKind::Script));
        assert!(report.newly_loaded >= 1);
        assert_eq!(calls.get(), 4);

        for _ in 0..5 {
            ctx.frame(DT, &mut backend);
        }
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn models_wait_for_their_mesh() {
        let mut ctx = runtime();
        ctx.assets_mut().insert_deferred(
            "crate.mesh",
            Asset::Mesh(Mesh {
                name: "crate".into(),
                primitive_count: 1,
                material_count: 1,
            }),
            2,
        );
        let id = add(&mut ctx, "crate", Vec3::new(0.0, 0.0, -5.0));
        ctx.add_component(id, Box::new(Model::new("crate.mesh"))).unwrap();

        let mut backend = RecordingBackend::new();
        ctx.frame(DT, &mut backend);
        assert!(!is_loaded(&ctx, id, ComponentKind::Model));
        assert_eq!(backend.draws().count(), 0);

        ctx.frame(DT, &mut backend);
        assert!(is_loaded(&ctx, id, ComponentKind::Model));
        // One opaque draw. Without a shadow light there is no depth draw.
        assert_eq!(backend.draws().count(), 1);
    }

    #[test]
    fn first_enabled_shadow_light_is_selected() {
        let mut ctx = runtime();
        let mut lights = Vec::new();
        for (name, shadows) in [("l1", false), ("l2", true), ("l3", true)] {
            let id = add(&mut ctx, name, Vec3::new(0.0, 5.0, 0.0));
            let light = Light {
                params: LightParams {
                    shadows,
                    ..LightParams::default()
                },
            };
            ctx.add_component(id, Box::new(light)).unwrap();
            lights.push(id);
        }

        let mut backend = RecordingBackend::new();
        let report = ctx.frame(DT, &mut backend);
        assert_eq!(report.lights, 3);
        assert_eq!(report.shadow_light, Some(lights[1]));
        assert_eq!(backend.uniform("shadow_light_index"), Some(Uniform::Int(1)));
        assert_eq!(backend.uniform("light_count"), Some(Uniform::Int(3)));
        let shadow_passes = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::BeginShadowPass { .. }))
            .count();
        assert_eq!(shadow_passes, 1);
    }

    #[test]
    fn no_shadow_light_disables_the_shadow_pass() {
        let mut ctx = runtime();
        let id = add(&mut ctx, "sun", Vec3::ZERO);
        ctx.add_component(id, Box::new(Light::default())).unwrap();

        let mut backend = RecordingBackend::new();
        let report = ctx.frame(DT, &mut backend);
        assert_eq!(report.shadow_light, None);
        assert_eq!(backend.uniform("shadow_light_index"), Some(Uniform::Int(-1)));
        assert!(
            !backend
                .commands()
                .iter()
                .any(|c| matches!(c, RenderCommand::BeginShadowPass { .. }))
        );
    }

    #[test]
    fn a_failing_component_does_not_stop_the_frame() {
        let mut ctx = runtime();
        let bad = add(&mut ctx, "bad", Vec3::ZERO);
        let good = add(&mut ctx, "good", Vec3::X);
        ctx.add_component(
            bad,
            Box::new(Recorder {
                fail_logic: true,
                ..Recorder::default()
            }),
        )
        .unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        ctx.add_component(
            good,
            Box::new(Recorder {
                seen: Rc::clone(&seen),
                ..Recorder::default()
            }),
        )
        .unwrap();

        let report = ctx.frame(DT, &mut RecordingBackend::new());
        assert_eq!(report.script_faults, 1);
        assert_eq!(seen.borrow().as_slice(), &[Vec3::X]);
        assert_eq!(report.phases.last(), Some(&FramePhase::Render));
    }

    #[test]
    fn missing_camera_skips_after_the_load_sweep() {
        let mut ctx = EngineContext::new(EngineConfig {
            editor: false,
            ..EngineConfig::default()
        });
        let index = ctx.levels.push(Level::new("dark", None));
        ctx.set_active_level(index, true).unwrap();

        let mut backend = RecordingBackend::new();
        let report = ctx.frame(DT, &mut backend);
        assert_eq!(report.skipped, Some(SkipReason::NoCamera));
        assert_eq!(report.phases, vec![FramePhase::AssetTick, FramePhase::LoadSweep]);
        assert!(backend.commands().is_empty());
        assert_eq!(ctx.frame_index(), 1);
    }

    #[test]
    fn missing_level_skips_everything_but_assets() {
        let mut ctx = EngineContext::new(EngineConfig::default());
        let report = ctx.frame(DT, &mut RecordingBackend::new());
        assert_eq!(report.skipped, Some(SkipReason::NoActiveLevel));
        assert_eq!(report.phases, vec![FramePhase::AssetTick]);
    }

    #[test]
    fn editing_never_steps_physics() {
        let mut ctx = EngineContext::new(EngineConfig::default());
        let index = ctx.levels.push(Level::new("edit", None));
        ctx.set_active_level(index, true).unwrap();
        let ball = add(&mut ctx, "ball", Vec3::new(0.0, 5.0, 0.0));
        ctx.add_component(ball, Box::new(Rigidbody::default())).unwrap();

        let mut backend = RecordingBackend::new();
        for _ in 0..10 {
            let report = ctx.frame(DT, &mut backend);
            assert!(!report.phases.contains(&FramePhase::PhysicsStep));
            assert!(!report.phases.contains(&FramePhase::ScriptHooks));
        }
        assert!(is_loaded(&ctx, ball, ComponentKind::Rigidbody));
        let node = ctx.active_level().unwrap().tree().node(ball).unwrap();
        assert_eq!(node.transform.position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(ctx.timer().count(), 10);
    }

    #[test]
    fn simulated_frame_runs_every_phase_in_order() {
        let mut ctx = runtime();
        let report = ctx.frame(DT, &mut RecordingBackend::new());
        assert_eq!(
            report.phases,
            vec![
                FramePhase::AssetTick,
                FramePhase::LoadSweep,
                FramePhase::ScriptHooks,
                FramePhase::PhysicsStep,
                FramePhase::Logic,
                FramePhase::HierarchySync,
                FramePhase::ShadowPass,
                FramePhase::Render,
            ]
        );
        assert_eq!(report.skipped, None);
    }

    #[test]
    fn transparent_order_follows_a_moved_camera() {
        let mut ctx = runtime();
        let glass = || Model {
            transparent: true,
            ..Model::new("glass.mesh")
        };
        let a = add(&mut ctx, "a", Vec3::new(0.0, 0.0, -10.0));
        let b = add(&mut ctx, "b", Vec3::new(0.0, 0.0, 4.0));
        ctx.add_component(a, Box::new(glass())).unwrap();
        ctx.add_component(b, Box::new(glass())).unwrap();

        let mut backend = RecordingBackend::new();
        let report = ctx.frame(DT, &mut backend);
        assert_eq!(report.transparent_order, vec![a, b]);

        let cam = ctx.game_camera().unwrap();
        let behind = Vec3::new(0.0, 0.0, -20.0);
        ctx.set_transform(cam, Transform::from_position(behind)).unwrap();
        backend.take();
        let report = ctx.frame(DT, &mut backend);

        assert_eq!(report.transparent_order, vec![b, a]);
        assert_eq!(backend.uniform("view_pos"), Some(Uniform::Vec3(behind)));
        let drawn: Vec<NodeId> = backend.draws().map(|d| d.node).collect();
        assert_eq!(drawn, vec![b, a]);
    }

    #[test]
    fn parented_body_starts_at_its_world_pose() {
        let mut ctx = runtime();
        let rig = add(&mut ctx, "rig", Vec3::new(0.0, 10.0, 0.0));
        let ball = ctx
            .add_node(rig, "ball", Transform::from_position(Vec3::X))
            .unwrap();
        ctx.add_component(ball, Box::new(BoxCollider::default())).unwrap();
        ctx.add_component(ball, Box::new(Rigidbody::default())).unwrap();

        ctx.frame(DT, &mut RecordingBackend::new());

        assert!(is_loaded(&ctx, ball, ComponentKind::Rigidbody));
        let node = ctx.active_level().unwrap().tree().node(ball).unwrap();
        assert!(node.transform.position.abs_diff_eq(Vec3::X, 0.1));
        assert!(node.world_position().y > 9.9);
        let body = node.components.get_as::<Rigidbody>().unwrap().body().unwrap();
        assert!(ctx.physics().pose(body).unwrap().position.y > 9.9);
    }

    #[test]
    fn opaque_siblings_draw_back_to_front() {
        let mut ctx = runtime();
        let mut ids = Vec::new();
        for (name, z) in [("near", -1.0), ("far", 4.0), ("mid", 2.0)] {
            let id = add(&mut ctx, name, Vec3::new(0.0, 0.0, z));
            ctx.add_component(id, Box::new(Model::new("glass.mesh"))).unwrap();
            ids.push(id);
        }

        let mut backend = RecordingBackend::new();
        ctx.frame(DT, &mut backend);

        let drawn: Vec<NodeId> = backend.draws().map(|d| d.node).collect();
        assert_eq!(drawn, vec![ids[1], ids[2], ids[0]]);
    }

    /// Moves `props/target` one unit along X per call, parks the camera at
    /// z = -20 and records the level name it saw.
    struct MoverHost {
        levels: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptHost for MoverHost {
        fn compile(&mut self, _name: &str, _source: &str) -> Result<Option<ScriptHandle>, ScriptError> {
            Ok(Some(ScriptHandle(1)))
        }

        fn call_loop(
            &mut self,
            _handle: ScriptHandle,
            bindings: &mut ScriptBindings<'_>,
        ) -> Result<(), ScriptError> {
            self.levels.borrow_mut().push(bindings.level_name().to_string());
            let target = bindings
                .scene
                .find_path("props/target")
                .ok_or_else(|| ScriptError::Runtime {
                    name: bindings.node_name.to_string(),
                    message: "target not found".into(),
                })?;
            let mut transform = bindings.scene.transform(target).unwrap_or_default();
            transform.position.x += 1.0;
            bindings.scene.set_transform(target, transform);
            bindings.set_camera_transform(Transform::from_position(Vec3::new(0.0, 0.0, -20.0)));
            Ok(())
        }

        fn release(&mut self, _handle: ScriptHandle) {}
    }

    #[test]
    fn scripts_move_other_nodes_and_the_camera() {
        let levels = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = standalone(
            EngineContext::new(EngineConfig {
                editor: false,
                ..EngineConfig::default()
            })
            .with_scripts(Box::new(MoverHost {
                levels: Rc::clone(&levels),
            })),
        );
        ctx.assets_mut().insert(
            "mover.lua",
            Asset::Script(ScriptSource {
                name: "mover.lua".into(),
                source: "function Loop(dt) end".into(),
            }),
        );
        let props = add(&mut ctx, "props", Vec3::new(0.0, 1.0, 0.0));
        let target = ctx.add_node(props, "target", Transform::default()).unwrap();
        let driver = add(&mut ctx, "driver", Vec3::ZERO);
        ctx.add_component(driver, Box::new(Script::new("mover.lua"))).unwrap();

        let mut backend = RecordingBackend::new();
        let report = ctx.frame(DT, &mut backend);
        assert_eq!(report.script_faults, 0);
        assert_eq!(levels.borrow().as_slice(), &["test".to_string()]);
        assert_eq!(
            backend.uniform("view_pos"),
            Some(Uniform::Vec3(Vec3::new(0.0, 0.0, -20.0)))
        );

        ctx.frame(DT, &mut backend);
        let tree = ctx.active_level().unwrap().tree();
        assert_eq!(tree.node(target).unwrap().transform.position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(tree.node(target).unwrap().world_position(), Vec3::new(2.0, 1.0, 0.0));
        assert!(tree.node(driver).unwrap().components.contains(ComponentKind::Script));
    }

    /// Counts warning events.
    #[derive(Clone, Default)]
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn losing_the_camera_warns_once() {
        let mut ctx = runtime();
        let mut backend = RecordingBackend::new();
        ctx.frame(DT, &mut backend);
        let cam = ctx.game_camera().unwrap();

        let warnings = WarnCounter::default();
        let subscriber = tracing_subscriber::registry().with(warnings.clone());
        tracing::subscriber::with_default(subscriber, || {
            ctx.remove_node(cam).unwrap();
            for _ in 0..5 {
                let report = ctx.frame(DT, &mut backend);
                assert_eq!(report.skipped, Some(SkipReason::NoCamera));
            }
        });
        assert_eq!(warnings.0.load(Ordering::SeqCst), 1);
    }
}
