//! Physics collaborator: the contract the scene runtime drives, plus
//! [`SimplePhysics`], a gravity-only integrator used by the headless driver
//! and tests.
//!
//! # Invariants
//! - The world's body list is only touched through this trait.
//! - `init` discards every body; handles issued before it stop resolving.

mod simple;

pub use simple::SimplePhysics;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

slotmap::new_key_type! {
    /// Handle to a body owned by a physics world.
    pub struct BodyHandle;
}

/// Collision shape, already scaled into world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box { half_extents: Vec3, center: Vec3 },
    Sphere { radius: f32, center: Vec3 },
}

impl Shape {
    /// Distance from the body origin to the bottom of the shape.
    pub fn support_below(&self) -> f32 {
        match *self {
            Self::Box {
                half_extents,
                center,
            } => half_extents.y - center.y,
            Self::Sphere { radius, center } => radius - center.y,
        }
    }
}

/// World-space pose of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    pub position: Vec3,
    pub rotation: Quat,
}

/// Everything needed to create a body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub pose: BodyPose,
    pub mass: f32,
    /// Kinematic bodies are moved by the scene, never by the solver.
    pub kinematic: bool,
    pub use_gravity: bool,
    pub shapes: Vec<Shape>,
}

/// Errors from physics operations.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("body {0:?} does not exist")]
    UnknownBody(BodyHandle),
}

/// Synchronization contract between the scene graph and a physics engine.
pub trait PhysicsWorld {
    /// Reset or create the simulation world. Drops all bodies.
    fn init(&mut self);

    /// Advance one step using the current body state.
    fn update(&mut self, dt: f32);

    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Returns false when the handle no longer resolves.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    fn pose(&self, handle: BodyHandle) -> Option<BodyPose>;

    /// Teleport a body. Velocity is kept.
    fn set_pose(&mut self, handle: BodyHandle, pose: BodyPose) -> Result<(), PhysicsError>;

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> Result<(), PhysicsError>;

    fn body_count(&self) -> usize;
}
