use std::any::Any;
use std::fmt;

use glam::Mat4;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use stagehand_physics::{PhysicsError, PhysicsWorld, Shape};
use stagehand_render::{CameraParams, LightParams};

use crate::context::{LoadContext, LogicContext, RenderContext, UnloadContext};
use crate::scripting::ScriptError;

/// Identifies a component variant. A node holds at most one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Transform,
    Rigidbody,
    BoxCollider,
    SphereCollider,
    Model,
    Sprite2D,
    Light,
    Camera,
    Script,
    Animation,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 10] = [
        Self::Transform,
        Self::Rigidbody,
        Self::BoxCollider,
        Self::SphereCollider,
        Self::Model,
        Self::Sprite2D,
        Self::Light,
        Self::Camera,
        Self::Script,
        Self::Animation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Transform => "Transform",
            Self::Rigidbody => "Rigidbody",
            Self::BoxCollider => "BoxCollider",
            Self::SphereCollider => "SphereCollider",
            Self::Model => "Model",
            Self::Sprite2D => "Sprite2D",
            Self::Light => "Light",
            Self::Camera => "Camera",
            Self::Script => "Script",
            Self::Animation => "Animation",
        }
    }

    /// Look up a kind by its serialized name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Colliders must load before a rigidbody on the same node.
    pub fn is_collider(self) -> bool {
        matches!(self, Self::BoxCollider | Self::SphereCollider)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by component hooks and component construction.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error("invalid {kind} data: {message}")]
    InvalidData { kind: ComponentKind, message: String },
    #[error("{0} is part of every node and cannot be added as a component")]
    Intrinsic(ComponentKind),
}

/// A unit of behavior attached to a scene node.
///
/// Every hook has a default so a variant only implements what it needs.
/// Hooks other than `load` and `quit` are only invoked while the component is
/// loaded; [`ComponentSlot`] guarantees this.
pub trait Component: Any + fmt::Debug {
    fn kind(&self) -> ComponentKind;

    /// Try to acquire resources. Returns false to be retried next frame.
    fn load(&mut self, _ctx: &mut LoadContext<'_>) -> bool {
        true
    }

    /// Release resources acquired by `load`.
    fn unload(&mut self, _ctx: &mut UnloadContext<'_>) {}

    /// Final teardown, after `unload`.
    fn quit(&mut self) {}

    fn logic(&mut self, _ctx: &mut LogicContext<'_>) -> Result<(), ComponentError> {
        Ok(())
    }

    fn render_3d(&self, _ctx: &mut RenderContext<'_>) {}

    fn render_2d(&self, _ctx: &mut RenderContext<'_>) {}

    /// Depth-only draw into the shadow map.
    fn draw_shadow(&self, _ctx: &mut RenderContext<'_>) {}

    /// Draw from the transparency queue, after all opaque geometry.
    fn draw_transparent(&self, _ctx: &mut RenderContext<'_>) {}

    /// Push the node's world pose into the physics world before stepping.
    fn sync_to_physics(&mut self, _world: Mat4, _physics: &mut dyn PhysicsWorld) {}

    /// True if this component wants a slot in the transparency queue.
    fn is_transparent(&self) -> bool {
        false
    }

    fn light(&self) -> Option<LightParams> {
        None
    }

    fn camera(&self) -> Option<CameraParams> {
        None
    }

    /// Collision shape once loaded.
    fn collider_shape(&self) -> Option<Shape> {
        None
    }

    /// Copy of the persisted fields with no acquired resources.
    fn duplicate(&self) -> Box<dyn Component>;

    /// Persisted fields as a document value.
    fn save(&self) -> Result<serde_json::Value, ComponentError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Serialize a component's persisted fields.
pub(crate) fn save_fields<T: Serialize>(
    kind: ComponentKind,
    value: &T,
) -> Result<serde_json::Value, ComponentError> {
    serde_json::to_value(value).map_err(|e| ComponentError::InvalidData {
        kind,
        message: e.to_string(),
    })
}

/// A component plus its loaded flag.
#[derive(Debug)]
pub struct ComponentSlot {
    loaded: bool,
    component: Box<dyn Component>,
}

impl ComponentSlot {
    pub fn new(component: Box<dyn Component>) -> Self {
        Self {
            loaded: false,
            component,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.component.kind()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    pub fn component_mut(&mut self) -> &mut dyn Component {
        self.component.as_mut()
    }

    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.component.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.component.as_any_mut().downcast_mut()
    }

    /// Attempt a load if not loaded yet. Returns true on the transition.
    pub fn try_load(&mut self, ctx: &mut LoadContext<'_>) -> bool {
        if self.loaded {
            return false;
        }
        self.loaded = self.component.load(ctx);
        if self.loaded {
            tracing::trace!(node = ctx.node.name, kind = %self.kind(), "component loaded");
        }
        self.loaded
    }

    /// Unload and load again regardless of the current state.
    pub fn force_reload(&mut self, ctx: &mut LoadContext<'_>) -> bool {
        if self.loaded {
            let mut unload = UnloadContext {
                physics: &mut *ctx.physics,
                scripts: &mut *ctx.scripts,
            };
            self.component.unload(&mut unload);
            self.loaded = false;
        }
        self.try_load(ctx)
    }

    pub fn unload(&mut self, ctx: &mut UnloadContext<'_>) {
        if self.loaded {
            self.component.unload(ctx);
            self.loaded = false;
        }
    }

    /// Unload if loaded, then quit. Consumes the slot.
    pub fn teardown(mut self, ctx: &mut UnloadContext<'_>) {
        self.unload(ctx);
        self.component.quit();
    }

    pub fn logic(&mut self, ctx: &mut LogicContext<'_>) -> Result<(), ComponentError> {
        if !self.loaded {
            return Ok(());
        }
        self.component.logic(ctx)
    }

    pub fn render_3d(&self, ctx: &mut RenderContext<'_>) {
        if self.loaded {
            self.component.render_3d(ctx);
        }
    }

    pub fn render_2d(&self, ctx: &mut RenderContext<'_>) {
        if self.loaded {
            self.component.render_2d(ctx);
        }
    }

    pub fn draw_shadow(&self, ctx: &mut RenderContext<'_>) {
        if self.loaded {
            self.component.draw_shadow(ctx);
        }
    }

    pub fn draw_transparent(&self, ctx: &mut RenderContext<'_>) {
        if self.loaded {
            self.component.draw_transparent(ctx);
        }
    }

    pub fn sync_to_physics(&mut self, world: Mat4, physics: &mut dyn PhysicsWorld) {
        if self.loaded {
            self.component.sync_to_physics(world, physics);
        }
    }

    /// Unloaded copy of the component.
    pub fn duplicate(&self) -> Self {
        Self::new(self.component.duplicate())
    }
}

/// Per-node component registry, keyed by kind, in insertion order.
#[derive(Debug, Default)]
pub struct ComponentMap {
    slots: IndexMap<ComponentKind, ComponentSlot>,
}

impl ComponentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a component. Returns false, leaving the map unchanged, when a
    /// component of that kind is already present or the kind is intrinsic.
    pub fn insert(&mut self, component: Box<dyn Component>) -> bool {
        let kind = component.kind();
        if kind == ComponentKind::Transform {
            tracing::debug!("ignoring Transform component; every node owns one");
            return false;
        }
        if self.slots.contains_key(&kind) {
            tracing::debug!(%kind, "component already present");
            return false;
        }
        self.slots.insert(kind, ComponentSlot::new(component));
        true
    }

    /// Detach a component. The caller is responsible for tearing it down.
    pub fn remove(&mut self, kind: ComponentKind) -> Option<ComponentSlot> {
        self.slots.shift_remove(&kind)
    }

    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn get(&self, kind: ComponentKind) -> Option<&ComponentSlot> {
        self.slots.get(&kind)
    }

    pub fn get_mut(&mut self, kind: ComponentKind) -> Option<&mut ComponentSlot> {
        self.slots.get_mut(&kind)
    }

    /// First component of concrete type `T`.
    pub fn get_as<T: Component>(&self) -> Option<&T> {
        self.slots.values().find_map(|s| s.downcast_ref::<T>())
    }

    pub fn get_as_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.slots.values_mut().find_map(|s| s.downcast_mut::<T>())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentKind, &ComponentSlot)> {
        self.slots.iter().map(|(k, s)| (*k, s))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ComponentKind, &mut ComponentSlot)> {
        self.slots.iter_mut().map(|(k, s)| (*k, s))
    }

    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.slots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove every component, in insertion order.
    pub fn drain(&mut self) -> Vec<ComponentSlot> {
        self.slots.drain(..).map(|(_, s)| s).collect()
    }

    pub fn all_loaded(&self) -> bool {
        self.slots.values().all(ComponentSlot::is_loaded)
    }

    /// Unloaded copies of every component, same order.
    pub fn duplicate(&self) -> Self {
        Self {
            slots: self
                .slots
                .iter()
                .map(|(k, s)| (*k, s.duplicate()))
                .collect(),
        }
    }
}
