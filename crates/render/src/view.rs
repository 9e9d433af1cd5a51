use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use stagehand_common::EditorCameraPose;

/// Camera projection type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

/// Lens parameters carried by a camera component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    /// Vertical field of view in degrees (perspective) or view height (orthographic).
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    pub projection: Projection,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fovy: 60.0,
            near: 0.1,
            far: 1000.0,
            projection: Projection::Perspective,
        }
    }
}

/// A fully resolved camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub params: CameraParams,
    pub aspect: f32,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            params: CameraParams::default(),
            aspect: 16.0 / 9.0,
        }
    }
}

impl CameraView {
    /// Camera looking down the node's local -Z axis.
    pub fn from_world(world: Mat4, world_rotation: Mat4, params: CameraParams) -> Self {
        let position = world.w_axis.truncate();
        let forward = world_rotation.transform_vector3(Vec3::NEG_Z);
        let up = world_rotation.transform_vector3(Vec3::Y);
        Self {
            position,
            target: position + forward,
            up,
            params,
            ..Self::default()
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.params.projection {
            Projection::Perspective => Mat4::perspective_rh(
                self.params.fovy.to_radians(),
                self.aspect,
                self.params.near,
                self.params.far,
            ),
            Projection::Orthographic => {
                let top = self.params.fovy * 0.5;
                let right = top * self.aspect;
                Mat4::orthographic_rh(
                    -right,
                    right,
                    -top,
                    top,
                    self.params.near,
                    self.params.far,
                )
            }
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Editor free camera with position, yaw and pitch.
/// Lives outside the scene; its pose is stored per level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub params: CameraParams,
}

impl Default for EditorCamera {
    fn default() -> Self {
        Self::from_pose(EditorCameraPose::default())
    }
}

impl EditorCamera {
    pub fn from_pose(pose: EditorCameraPose) -> Self {
        Self {
            position: pose.position,
            yaw: pose.yaw,
            pitch: pose.pitch,
            params: CameraParams::default(),
        }
    }

    pub fn pose(&self) -> EditorCameraPose {
        EditorCameraPose {
            position: self.position,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }

    /// Place the free camera at another camera, looking the same way.
    pub fn set_from_view(&mut self, view: &CameraView) {
        let dir = (view.target - view.position).normalize_or_zero();
        self.position = view.position;
        if dir != Vec3::ZERO {
            self.pitch = dir.y.clamp(-1.0, 1.0).asin();
            self.yaw = dir.z.atan2(dir.x);
        }
        self.params = view.params;
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn rotate(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw += dx * sensitivity;
        self.pitch -= dy * sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            position: self.position,
            target: self.position + self.forward(),
            up: Vec3::Y,
            params: self.params,
            ..CameraView::default()
        }
    }
}
