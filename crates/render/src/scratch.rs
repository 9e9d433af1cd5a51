use glam::Vec3;
use serde::{Deserialize, Serialize};
use stagehand_common::NodeId;

/// Light type. Each type places its shadow camera differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightKind {
    #[default]
    Directional,
    Point,
    Spot,
}

impl LightKind {
    /// Index used by the lighting shader.
    pub fn shader_index(self) -> i32 {
        match self {
            Self::Directional => 0,
            Self::Point => 1,
            Self::Spot => 2,
        }
    }
}

/// Light parameters carried by a light component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightParams {
    pub kind: LightKind,
    pub enabled: bool,
    pub shadows: bool,
    pub range: f32,
    pub color: Vec3,
    pub intensity: f32,
    pub shadow_strength: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            enabled: true,
            shadows: false,
            range: 10.0,
            color: Vec3::ONE,
            intensity: 1.0,
            shadow_strength: 0.8,
        }
    }
}

/// A loaded light seen during hierarchy sync, with its world placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectedLight {
    pub node: NodeId,
    pub params: LightParams,
    pub position: Vec3,
    pub forward: Vec3,
}

/// A transparent model waiting to be drawn back to front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransparentDrawCall {
    pub node: NodeId,
    pub position: Vec3,
    /// Distance to the camera the queue was last sorted for.
    pub distance: f32,
}

/// Render state rebuilt every frame: active lights in traversal order and the
/// transparency queue.
#[derive(Debug, Default)]
pub struct FrameScratch {
    lights: Vec<CollectedLight>,
    transparent: Vec<TransparentDrawCall>,
}

impl FrameScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything from the previous frame. Keeps allocations.
    pub fn clear(&mut self) {
        self.lights.clear();
        self.transparent.clear();
    }

    pub fn push_light(&mut self, light: CollectedLight) {
        self.lights.push(light);
    }

    /// Queue a transparent draw at its resolved world position. Distances
    /// are measured when the queue is sorted.
    pub fn push_transparent(&mut self, node: NodeId, world_position: Vec3) {
        self.transparent.push(TransparentDrawCall {
            node,
            position: world_position,
            distance: 0.0,
        });
    }

    pub fn lights(&self) -> &[CollectedLight] {
        &self.lights
    }

    pub fn transparent(&self) -> &[TransparentDrawCall] {
        &self.transparent
    }

    /// Measure every queued draw from `camera_position` and sort farthest
    /// first. Equal distances keep collection order.
    pub fn sort_transparent(&mut self, camera_position: Vec3) {
        for entry in &mut self.transparent {
            entry.distance = camera_position.distance(entry.position);
        }
        self.transparent
            .sort_by(|a, b| b.distance.total_cmp(&a.distance));
    }
}
