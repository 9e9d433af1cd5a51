use glam::Vec3;
use slotmap::SlotMap;

use crate::{BodyDesc, BodyHandle, BodyPose, PhysicsError, PhysicsWorld};

#[derive(Debug, Clone)]
struct Body {
    desc: BodyDesc,
    velocity: Vec3,
}

/// Semi-implicit Euler integrator with gravity and an optional floor plane.
///
/// There is no body-body collision; shapes only matter for resting on the
/// floor.
#[derive(Debug)]
pub struct SimplePhysics {
    bodies: SlotMap<BodyHandle, Body>,
    gravity: Vec3,
    floor: Option<f32>,
    steps: u64,
}

impl SimplePhysics {
    pub fn new(gravity: Vec3, floor: Option<f32>) -> Self {
        Self {
            bodies: SlotMap::with_key(),
            gravity,
            floor,
            steps: 0,
        }
    }

    /// Steps taken since the last `init`.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| b.velocity)
    }
}

impl Default for SimplePhysics {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.81, 0.0), None)
    }
}

impl PhysicsWorld for SimplePhysics {
    fn init(&mut self) {
        tracing::debug!(dropped = self.bodies.len(), "physics world reset");
        self.bodies.clear();
        self.steps = 0;
    }

    fn update(&mut self, dt: f32) {
        self.steps += 1;
        for body in self.bodies.values_mut() {
            if body.desc.kinematic || body.desc.mass <= 0.0 {
                continue;
            }
            if body.desc.use_gravity {
                body.velocity += self.gravity * dt;
            }
            body.desc.pose.position += body.velocity * dt;

            if let Some(floor) = self.floor {
                let support = body
                    .desc
                    .shapes
                    .iter()
                    .map(|s| s.support_below())
                    .fold(0.0_f32, f32::max);
                let lowest = floor + support;
                if body.desc.pose.position.y < lowest {
                    body.desc.pose.position.y = lowest;
                    body.velocity.y = body.velocity.y.max(0.0);
                }
            }
        }
    }

    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        self.bodies.insert(Body {
            desc,
            velocity: Vec3::ZERO,
        })
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies.remove(handle).is_some()
    }

    fn pose(&self, handle: BodyHandle) -> Option<BodyPose> {
        self.bodies.get(handle).map(|b| b.desc.pose)
    }

    fn set_pose(&mut self, handle: BodyHandle, pose: BodyPose) -> Result<(), PhysicsError> {
        let body = self
            .bodies
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        body.desc.pose = pose;
        Ok(())
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> Result<(), PhysicsError> {
        let body = self
            .bodies
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        body.velocity = velocity;
        Ok(())
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
