use std::any::Any;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use stagehand_physics::Shape;

use crate::component::{Component, ComponentError, ComponentKind, save_fields};
use crate::context::{LoadContext, UnloadContext};

/// Axis-aligned box collider. `size` is the full edge length in local units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxCollider {
    pub size: Vec3,
    pub center: Vec3,
    #[serde(skip)]
    shape: Option<Shape>,
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self {
            size: Vec3::ONE,
            center: Vec3::ZERO,
            shape: None,
        }
    }
}

impl BoxCollider {
    pub fn new(size: Vec3) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }
}

impl Component for BoxCollider {
    fn kind(&self) -> ComponentKind {
        ComponentKind::BoxCollider
    }

    /// Bakes the node's world scale into the shape.
    fn load(&mut self, ctx: &mut LoadContext<'_>) -> bool {
        let (scale, _, _) = ctx.node.world_matrix.to_scale_rotation_translation();
        let scale = scale.abs();
        self.shape = Some(Shape::Box {
            half_extents: self.size * scale * 0.5,
            center: self.center * scale,
        });
        true
    }

    fn unload(&mut self, _ctx: &mut UnloadContext<'_>) {
        self.shape = None;
    }

    fn collider_shape(&self) -> Option<Shape> {
        self.shape
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(Self {
            shape: None,
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

/// Sphere collider. The radius scales with the largest world scale axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereCollider {
    pub radius: f32,
    pub center: Vec3,
    #[serde(skip)]
    shape: Option<Shape>,
}

impl Default for SphereCollider {
    fn default() -> Self {
        Self {
            radius: 0.5,
            center: Vec3::ZERO,
            shape: None,
        }
    }
}

impl Component for SphereCollider {
    fn kind(&self) -> ComponentKind {
        ComponentKind::SphereCollider
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> bool {
        let (scale, _, _) = ctx.node.world_matrix.to_scale_rotation_translation();
        let scale = scale.abs();
        self.shape = Some(Shape::Sphere {
            radius: self.radius * scale.max_element(),
            center: self.center * scale,
        });
        true
    }

    fn unload(&mut self, _ctx: &mut UnloadContext<'_>) {
        self.shape = None;
    }

    fn collider_shape(&self) -> Option<Shape> {
        self.shape
    }

    fn duplicate(&self) -> Box<dyn Component> {
        Box::new(Self {
            shape: None,
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
