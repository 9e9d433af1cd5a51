use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::component::{Component, ComponentError, ComponentKind};
use crate::components::{
    Animation, BoxCollider, Camera, Light, Model, Rigidbody, Script, SphereCollider, Sprite2D,
};

fn parse<T: DeserializeOwned>(kind: ComponentKind, data: Value) -> Result<T, ComponentError> {
    let data = match data {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(data).map_err(|e| ComponentError::InvalidData {
        kind,
        message: e.to_string(),
    })
}

/// Build a component from its persisted fields. Missing fields take their
/// defaults; `null` yields a default component.
pub fn component_from_data(
    kind: ComponentKind,
    data: Value,
) -> Result<Box<dyn Component>, ComponentError> {
    Ok(match kind {
        ComponentKind::Transform => return Err(ComponentError::Intrinsic(kind)),
        ComponentKind::Rigidbody => Box::new(parse::<Rigidbody>(kind, data)?),
        ComponentKind::BoxCollider => Box::new(parse::<BoxCollider>(kind, data)?),
        ComponentKind::SphereCollider => Box::new(parse::<SphereCollider>(kind, data)?),
        ComponentKind::Model => Box::new(parse::<Model>(kind, data)?),
        ComponentKind::Sprite2D => Box::new(parse::<Sprite2D>(kind, data)?),
        ComponentKind::Light => Box::new(parse::<Light>(kind, data)?),
        ComponentKind::Camera => Box::new(parse::<Camera>(kind, data)?),
        ComponentKind::Script => Box::new(parse::<Script>(kind, data)?),
        ComponentKind::Animation => Box::new(parse::<Animation>(kind, data)?),
    })
}
