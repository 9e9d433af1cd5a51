use std::any::Any;

use glam::Vec4;
use serde::{Deserialize, Serialize};
use stagehand_render::{DrawCall, DrawKind};

use super::{Dependency, poll_asset};
use crate::component::{Component, ComponentError, ComponentKind, save_fields};
use crate::context::{LoadContext, RenderContext};

/// A mesh drawn in the 3D pass. Transparent models are drawn from the
/// transparency queue instead, farthest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    pub mesh: String,
    pub transparent: bool,
    pub cast_shadows: bool,
    pub tint: Vec4,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            mesh: String::new(),
            transparent: false,
            cast_shadows: true,
            tint: Vec4::ONE,
        }
    }
}

impl Model {
    pub fn new(mesh: impl Into<String>) -> Self {
        Self {
            mesh: mesh.into(),
            ..Self::default()
        }
    }

    fn submit(&self, ctx: &mut RenderContext<'_>) {
        ctx.backend.submit(DrawCall {
            node: ctx.node,
            kind: DrawKind::Mesh {
                mesh: self.mesh.clone(),
                tint: self.tint,
            },
            transform: ctx.visual_matrix,
        });
    }
}

impl Component for Model {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Model
    }

    /// Waits until the mesh asset is ready.
    fn load(&mut self, ctx: &mut LoadContext<'_>) -> bool {
        matches!(poll_asset(ctx.assets, &self.mesh), Dependency::Ready)
    }

    fn render_3d(&self, ctx: &mut RenderContext<'_>) {
        if !self.transparent {
            self.submit(ctx);
        }
    }

    fn draw_transparent(&self, ctx: &mut RenderContext<'_>) {
        self.submit(ctx);
    }

    fn draw_shadow(&self, ctx: &mut RenderContext<'_>) {
        if self.cast_shadows {
            ctx.backend.submit(DrawCall {
                node: ctx.node,
                kind: DrawKind::ShadowDepth {
                    mesh: self.mesh.clone(),
                },
                transform: ctx.world_matrix,
            });
        }
    }

    fn is_transparent(&self) -> bool {
        self.transparent
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
