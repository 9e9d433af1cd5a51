use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

slotmap::new_key_type! {
    /// Generational handle to a node inside one scene tree arena.
    ///
    /// Handles are only meaningful for the tree that issued them; a duplicated
    /// tree issues fresh handles.
    pub struct NodeId;
}

/// Identity of one level instance.
///
/// Every constructed level gets a fresh id, so a runtime clone never shares
/// identity with the level it was copied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(pub Uuid);

impl LevelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LevelId {
    fn default() -> Self {
        Self::new()
    }
}

/// How the engine is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Editor application, simulation paused.
    #[default]
    Edit,
    /// Editor application simulating a sandboxed clone of the active level.
    Play,
    /// Standalone player. Always simulating.
    Runtime,
}

impl Mode {
    /// Play and Runtime advance physics and run scripts; Edit does not.
    pub fn is_simulating(self) -> bool {
        matches!(self, Self::Play | Self::Runtime)
    }

    pub fn is_editor(self) -> bool {
        matches!(self, Self::Edit | Self::Play)
    }
}

/// Local spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Local matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Rotation-only matrix used for directional math (forward vectors, light aim).
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }

    /// Decompose an affine matrix back into a transform.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Stored free-camera pose for a level, restored when the level becomes active
/// in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditorCameraPose {
    pub position: Vec3,
    /// Yaw in radians.
    pub yaw: f32,
    /// Pitch in radians.
    pub pitch: f32,
}

impl Default for EditorCameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 15.0),
            yaw: -90.0_f32.to_radians(),
            pitch: -30.0_f32.to_radians(),
        }
    }
}
