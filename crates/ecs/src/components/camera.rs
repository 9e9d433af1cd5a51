use std::any::Any;

use serde::{Deserialize, Serialize};
use stagehand_render::CameraParams;

use crate::component::{Component, ComponentError, ComponentKind, save_fields};

/// Marks a node as a viewpoint. The level's game camera is chosen among these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Camera {
    pub params: CameraParams,
}

impl Component for Camera {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Camera
    }

    fn camera(&self) -> Option<CameraParams> {
        Some(self.params)
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
