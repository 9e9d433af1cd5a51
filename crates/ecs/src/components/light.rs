use std::any::Any;

use serde::{Deserialize, Serialize};
use stagehand_render::LightParams;

use crate::component::{Component, ComponentError, ComponentKind, save_fields};

/// A light source. Collected each frame while loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Light {
    pub params: LightParams,
}

impl Component for Light {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Light
    }

    fn light(&self) -> Option<LightParams> {
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
