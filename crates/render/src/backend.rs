use glam::{Mat4, Vec2, Vec3, Vec4};
use stagehand_common::NodeId;

use crate::view::CameraView;

/// Blend state for subsequent submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Opaque,
    Alpha,
}

/// A shader uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

/// What a draw submission renders.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    Mesh { mesh: String, tint: Vec4 },
    /// Depth-only mesh draw into the shadow map.
    ShadowDepth { mesh: String },
    Sprite {
        texture: String,
        size: Vec2,
        origin: Vec2,
        rotation: f32,
        tint: Vec4,
    },
}

/// One draw submission.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub node: NodeId,
    pub kind: DrawKind,
    pub transform: Mat4,
}

/// Renderer-agnostic backend contract.
///
/// The frame scheduler brackets passes with begin/end calls and submits draws
/// in between. Exact graphics-API semantics belong to the implementation.
pub trait RenderBackend {
    fn begin_3d(&mut self, camera: &CameraView);
    fn end_3d(&mut self);
    fn begin_2d(&mut self);
    fn end_2d(&mut self);
    /// Start an off-screen depth-only pass from a light's point of view.
    fn begin_shadow_pass(&mut self, light_view_projection: Mat4, resolution: u32);
    fn end_shadow_pass(&mut self);
    fn set_blend(&mut self, mode: BlendMode);
    fn set_depth_write(&mut self, enabled: bool);
    fn submit(&mut self, draw: DrawCall);
    fn set_uniform(&mut self, name: &str, value: Uniform);
}

/// A call recorded by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Begin3d { camera_position: Vec3 },
    End3d,
    Begin2d,
    End2d,
    BeginShadowPass { light_view_projection: Mat4, resolution: u32 },
    EndShadowPass,
    SetBlend(BlendMode),
    SetDepthWrite(bool),
    Submit(DrawCall),
    SetUniform { name: String, value: Uniform },
}

/// Backend that records every call instead of talking to a GPU.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<RenderCommand>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Drain and return the recorded commands.
    pub fn take(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Draw submissions in order.
    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|c| match c {
            RenderCommand::Submit(d) => Some(d),
            _ => None,
        })
    }

    /// Most recent value uploaded for a uniform.
    pub fn uniform(&self, name: &str) -> Option<Uniform> {
        self.commands.iter().rev().find_map(|c| match c {
            RenderCommand::SetUniform { name: n, value } if n == name => Some(*value),
            _ => None,
        })
    }

    /// Human-readable dump, one command per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for command in &self.commands {
            let line = match command {
                RenderCommand::Begin3d { camera_position: p } => {
                    format!("begin_3d camera=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
                }
                RenderCommand::End3d => "end_3d".to_string(),
                RenderCommand::Begin2d => "begin_2d".to_string(),
                RenderCommand::End2d => "end_2d".to_string(),
                RenderCommand::BeginShadowPass { resolution, .. } => {
                    format!("begin_shadow_pass resolution={resolution}")
                }
                RenderCommand::EndShadowPass => "end_shadow_pass".to_string(),
                RenderCommand::SetBlend(mode) => format!("blend {mode:?}"),
                RenderCommand::SetDepthWrite(on) => format!("depth_write {on}"),
                RenderCommand::Submit(draw) => {
                    let p = draw.transform.w_axis;
                    format!(
                        "draw {:?} at ({:.2}, {:.2}, {:.2})",
                        draw.kind, p.x, p.y, p.z
                    )
                }
                RenderCommand::SetUniform { name, value } => format!("uniform {name} = {value:?}"),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_3d(&mut self, camera: &CameraView) {
        self.commands.push(RenderCommand::Begin3d {
            camera_position: camera.position,
        });
    }

    fn end_3d(&mut self) {
        self.commands.push(RenderCommand::End3d);
    }

    fn begin_2d(&mut self) {
        self.commands.push(RenderCommand::Begin2d);
    }

    fn end_2d(&mut self) {
        self.commands.push(RenderCommand::End2d);
    }

    fn begin_shadow_pass(&mut self, light_view_projection: Mat4, resolution: u32) {
        self.commands.push(RenderCommand::BeginShadowPass {
            light_view_projection,
            resolution,
        });
    }

    fn end_shadow_pass(&mut self) {
        self.commands.push(RenderCommand::EndShadowPass);
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.commands.push(RenderCommand::SetBlend(mode));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.commands.push(RenderCommand::SetDepthWrite(enabled));
    }

    fn submit(&mut self, draw: DrawCall) {
        self.commands.push(RenderCommand::Submit(draw));
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) {
        self.commands.push(RenderCommand::SetUniform {
            name: name.to_string(),
            value,
        });
    }
}
