use std::any::Any;

use glam::Mat4;
use serde::{Deserialize, Serialize};
use stagehand_physics::{BodyDesc, BodyHandle, BodyPose, PhysicsError, PhysicsWorld};

use crate::component::{Component, ComponentError, ComponentKind, save_fields};
use crate::context::{LoadContext, LogicContext, UnloadContext};

const POSE_EPSILON: f32 = 1e-4;

/// A body simulated by the physics world.
///
/// Loads only after every collider on the node has loaded, and builds the
/// body from their shapes. While simulating, the solved pose is written back
/// into the node's local transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rigidbody {
    pub mass: f32,
    pub kinematic: bool,
    pub use_gravity: bool,
    #[serde(skip)]
    body: Option<BodyHandle>,
    #[serde(skip)]
    last_pose: Option<BodyPose>,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            kinematic: false,
            use_gravity: true,
            body: None,
            last_pose: None,
        }
    }
}

fn pose_of(world: Mat4) -> BodyPose {
    let (_, rotation, position) = world.to_scale_rotation_translation();
    BodyPose { position, rotation }
}

fn poses_match(a: &BodyPose, b: &BodyPose) -> bool {
    a.position.abs_diff_eq(b.position, POSE_EPSILON)
        && a.rotation.abs_diff_eq(b.rotation, POSE_EPSILON)
}

impl Rigidbody {
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }
}

impl Component for Rigidbody {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Rigidbody
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> bool {
        if ctx.node.pending_colliders {
            return false;
        }
        let pose = pose_of(ctx.node.world_matrix);
        let handle = ctx.physics.add_body(BodyDesc {
            pose,
            mass: self.mass,
            kinematic: self.kinematic,
            use_gravity: self.use_gravity,
            shapes: ctx.node.collider_shapes.to_vec(),
        });
        tracing::debug!(node = ctx.node.name, shapes = ctx.node.collider_shapes.len(), "body created");
        self.body = Some(handle);
        self.last_pose = Some(pose);
        true
    }

    fn unload(&mut self, ctx: &mut UnloadContext<'_>) {
        if let Some(handle) = self.body.take() {
            ctx.physics.remove_body(handle);
        }
        self.last_pose = None;
    }

    fn logic(&mut self, ctx: &mut LogicContext<'_>) -> Result<(), ComponentError> {
        if !ctx.mode.is_simulating() || self.kinematic {
            return Ok(());
        }
        let Some(handle) = self.body else {
            return Ok(());
        };
        let pose = ctx
            .physics
            .pose(handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;

        let world = Mat4::from_rotation_translation(pose.rotation, pose.position);
        let local = ctx.parent_world.inverse() * world;
        let (_, rotation, position) = local.to_scale_rotation_translation();
        ctx.transform.position = position;
        ctx.transform.rotation = rotation.normalize();
        self.last_pose = Some(pose);
        Ok(())
    }

    /// Teleports the body when the scene moved the node since the last
    /// step. Kinematic bodies follow the node every frame.
    fn sync_to_physics(&mut self, world: Mat4, physics: &mut dyn PhysicsWorld) {
        let Some(handle) = self.body else {
            return;
        };
        let pose = pose_of(world);
        let moved = self
            .last_pose
            .is_none_or(|last| !poses_match(&last, &pose));
        if self.kinematic || moved {
            if let Err(err) = physics.set_pose(handle, pose) {
                tracing::warn!(%err, "failed to push pose to physics");
                return;
            }
            self.last_pose = Some(pose);
        }
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(Self {
            body: None,
            last_pose: None,
            ..self.clone()
        })
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
    use crate::scripting::{FixedScene, NullScriptHost};
    use glam::Vec3;
    use stagehand_assets::AssetServer;
    use stagehand_common::{Mode, NodeId, Transform};
    use stagehand_physics::{Shape, SimplePhysics};
    use stagehand_render::RenderSettings;

    fn load(body: &mut Rigidbody, physics: &mut SimplePhysics, pending: bool, world: Mat4) -> bool {
        let mut assets = AssetServer::in_memory();
        let mut scripts = NullScriptHost::new();
        let shapes = [Shape::Sphere {
            radius: 0.5,
            center: Vec3::ZERO,
        }];
        let mut ctx = LoadContext {
            mode: Mode::Play,
            node: NodeView {
                id: NodeId::default(),
                name: "ball",
                world_matrix: world,
                collider_shapes: &shapes,
                pending_colliders: pending,
            },
            assets: &mut assets,
            physics,
            scripts: &mut scripts,
        };
        body.load(&mut ctx)
    }

    #[test]
    fn waits_for_colliders() {
        let mut physics = SimplePhysics::default();
        let mut body = Rigidbody::default();
        assert!(!load(&mut body, &mut physics, true, Mat4::IDENTITY));
        assert_eq!(physics.body_count(), 0);
        assert!(load(&mut body, &mut physics, false, Mat4::IDENTITY));
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn logic_writes_local_transform_from_body() {
        let mut physics = SimplePhysics::default();
        let mut body = Rigidbody::default();
        let world = Mat4::from_translation(Vec3::new(1.0, 10.0, 0.0));
        assert!(load(&mut body, &mut physics, false, world));
        physics.update(0.1);

        let mut assets = AssetServer::in_memory();
        let mut scripts = NullScriptHost::new();
        let mut settings = RenderSettings::default();
        let mut scene = FixedScene::default();
        let mut transform = Transform::from_position(Vec3::new(0.0, 9.0, 0.0));
        let parent_world = Mat4::from_translation(Vec3::new(1.0, 1.0, 0.0));
        let mut ctx = LogicContext {
            mode: Mode::Play,
            dt: 0.1,
            node: NodeId::default(),
            node_name: "ball",
            transform: &mut transform,
            parent_world,
            world_matrix: world,
            camera: None,
            scene: &mut scene,
            settings: &mut settings,
            assets: &mut assets,
            physics: &mut physics,
            scripts: &mut scripts,
        };
        body.logic(&mut ctx).unwrap();

        let solved = physics.pose(body.body().unwrap()).unwrap();
        assert!(solved.position.y < 10.0);
        let expected_local = solved.position - Vec3::new(1.0, 1.0, 0.0);
        assert!(transform.position.abs_diff_eq(expected_local, 1e-4));
    }

    #[test]
    fn unload_removes_body_and_duplicate_has_none() {
        let mut physics = SimplePhysics::default();
        let mut body = Rigidbody::default();
        load(&mut body, &mut physics, false, Mat4::IDENTITY);
        let copy = body.duplicate();
        assert!(copy.as_any().downcast_ref::<Rigidbody>().unwrap().body().is_none());

        let mut scripts = NullScriptHost::new();
        let mut ctx = UnloadContext {
            physics: &mut physics,
            scripts: &mut scripts,
        };
        body.unload(&mut ctx);
        assert_eq!(physics.body_count(), 0);
        assert!(body.body().is_none());
    }

    #[test]
    fn sync_teleports_moved_body() {
        let mut physics = SimplePhysics::default();
        let mut body = Rigidbody::default();
        load(&mut body, &mut physics, false, Mat4::IDENTITY);
        let target = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        body.sync_to_physics(target, &mut physics);
        let pose = physics.pose(body.body().unwrap()).unwrap();
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 5.0, 0.0), 1e-5));
    }
}
