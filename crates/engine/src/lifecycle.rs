//! Component load and reload over scene nodes.

use stagehand_assets::AssetServer;
use stagehand_common::{Mode, NodeId};
use stagehand_ecs::{ComponentKind, ComponentMap, LoadContext, NodeView, ScriptHost, UnloadContext};
use stagehand_physics::{PhysicsWorld, Shape};
use stagehand_scene::{Node, SceneTree};

/// Shapes of the loaded colliders, and whether any collider is still unloaded.
pub(crate) fn collider_state(components: &ComponentMap) -> (Vec<Shape>, bool) {
    let mut shapes = Vec::new();
    let mut pending = false;
    for (kind, slot) in components.iter() {
        if !kind.is_collider() {
            continue;
        }
        if slot.is_loaded() {
            shapes.extend(slot.component().collider_shape());
        } else {
            pending = true;
        }
    }
    (shapes, pending)
}

/// Collaborators a load attempt needs, borrowed from the engine context.
pub(crate) struct Loader<'a> {
    pub mode: Mode,
    pub assets: &'a mut AssetServer,
    pub physics: &'a mut dyn PhysicsWorld,
    pub scripts: &'a mut dyn ScriptHost,
}

impl Loader<'_> {
    /// Try to load every unloaded component on `node`. Colliders go first so
    /// a rigidbody on the same node can be built from their shapes in the
    /// same frame. Returns how many components finished loading.
    pub fn load_node(&mut self, id: NodeId, node: &mut Node) -> usize {
        let world_matrix = node.world_matrix();
        let (name, _, components) = node.parts_mut();
        let mut newly_loaded = 0;

        for (kind, slot) in components.iter_mut().filter(|(k, _)| k.is_collider()) {
            let view = NodeView {
                id,
                name,
                world_matrix,
                collider_shapes: &[],
                pending_colliders: false,
            };
            if slot.try_load(&mut self.context(view)) {
                tracing::debug!(node = name, %kind, "component loaded");
                newly_loaded += 1;
            }
        }

        let (shapes, pending_colliders) = collider_state(components);
        for (kind, slot) in components.iter_mut().filter(|(k, _)| !k.is_collider()) {
            let view = NodeView {
                id,
                name,
                world_matrix,
                collider_shapes: &shapes,
                pending_colliders,
            };
            if slot.try_load(&mut self.context(view)) {
                tracing::debug!(node = name, %kind, "component loaded");
                newly_loaded += 1;
            }
        }
        newly_loaded
    }

    /// Drop every rigidbody's load state and load it again against the
    /// current physics world. Two passes, so no stale handle is released
    /// after a fresh body was created.
    pub fn reload_rigidbodies(&mut self, tree: &mut SceneTree) -> usize {
        let order = tree.pre_order();
        let mut unload = UnloadContext {
            physics: &mut *self.physics,
            scripts: &mut *self.scripts,
        };
        for &id in &order {
            if let Some(slot) = tree
                .get_mut(id)
                .and_then(|n| n.components.get_mut(ComponentKind::Rigidbody))
            {
                slot.unload(&mut unload);
            }
        }

        let mut reloaded = 0;
        for id in order {
            let Some(node) = tree.get_mut(id) else {
                continue;
            };
            let world_matrix = node.world_matrix();
            let (name, _, components) = node.parts_mut();
            let (shapes, pending_colliders) = collider_state(components);
            let Some(slot) = components.get_mut(ComponentKind::Rigidbody) else {
                continue;
            };
            let view = NodeView {
                id,
                name,
                world_matrix,
                collider_shapes: &shapes,
                pending_colliders,
            };
            if slot.try_load(&mut self.context(view)) {
                reloaded += 1;
            }
        }
        reloaded
    }

    fn context<'s>(&'s mut self, node: NodeView<'s>) -> LoadContext<'s> {
        LoadContext {
            mode: self.mode,
            node,
            assets: &mut *self.assets,
            physics: &mut *self.physics,
            scripts: &mut *self.scripts,
        }
    }
}
