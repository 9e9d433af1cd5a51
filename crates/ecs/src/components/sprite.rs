use std::any::Any;

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};
use stagehand_render::{DrawCall, DrawKind};

use super::{Dependency, poll_asset};
use crate::component::{Component, ComponentError, ComponentKind, save_fields};
use crate::context::{LoadContext, RenderContext};

/// A textured quad drawn in the 2D overlay pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sprite2D {
    pub texture: String,
    pub width: f32,
    pub height: f32,
    /// Pivot in pixels from the top-left corner.
    pub origin: Vec2,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub tint: Vec4,
}

impl Default for Sprite2D {
    fn default() -> Self {
        Self {
            texture: String::new(),
            width: 64.0,
            height: 64.0,
            origin: Vec2::ZERO,
            rotation: 0.0,
            tint: Vec4::ONE,
        }
    }
}

impl Component for Sprite2D {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Sprite2D
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> bool {
        matches!(poll_asset(ctx.assets, &self.texture), Dependency::Ready)
    }

    fn render_2d(&self, ctx: &mut RenderContext<'_>) {
        ctx.backend.submit(DrawCall {
            node: ctx.node,
            kind: DrawKind::Sprite {
                texture: self.texture.clone(),
                size: Vec2::new(self.width, self.height),
                origin: self.origin,
                rotation: self.rotation,
                tint: self.tint,
            },
            transform: ctx.visual_matrix,
        });
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(self.clone())
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
