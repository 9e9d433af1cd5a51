//! Component model: the capability set every behavior unit implements, the
//! per-node registry that holds at most one component per kind, and the
//! built-in variants.
//!
//! # Invariants
//! - A node holds at most one component of each [`ComponentKind`]; a second
//!   insert of the same kind is a no-op.
//! - Logic and render hooks only run on loaded components. [`ComponentSlot`]
//!   enforces this; callers cannot bypass it.
//! - Duplicating a component copies its persisted fields and drops every
//!   acquired resource, so the copy loads again on its own.

mod component;
mod components;
mod context;
mod registry;
mod scripting;

pub use component::{Component, ComponentError, ComponentKind, ComponentMap, ComponentSlot};
pub use components::{
    Animation, BoxCollider, Camera, Light, Model, Rigidbody, Script, SphereCollider, Sprite2D,
};
pub use context::{LoadContext, LogicContext, NodeView, RenderContext, UnloadContext};
pub use registry::component_from_data;
pub use scripting::{
    NullScriptHost, SceneAccess, ScriptBindings, ScriptError, ScriptHandle, ScriptHost,
};
