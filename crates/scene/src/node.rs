use glam::{Mat4, Vec3};
use indexmap::IndexMap;
use stagehand_common::{NodeId, Transform};
use stagehand_ecs::ComponentMap;

/// Cosmetic scale pulse played on a freshly selected node in the editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bounce {
    pub elapsed: f32,
}

/// A scene node. Owns its children (by handle) and its components.
#[derive(Debug)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: IndexMap<String, NodeId>,
    pub transform: Transform,
    pub components: ComponentMap,
    pub(crate) matrix: Mat4,
    pub(crate) rotation_matrix: Mat4,
    pub(crate) world: Mat4,
    pub(crate) world_rotation: Mat4,
    pub(crate) visual: Mat4,
    pub(crate) bounce: Option<Bounce>,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, parent: Option<NodeId>, transform: Transform) -> Self {
        let matrix = transform.matrix();
        let rotation_matrix = transform.rotation_matrix();
        Self {
            name: name.into(),
            parent,
            children: IndexMap::new(),
            transform,
            components: ComponentMap::new(),
            matrix,
            rotation_matrix,
            world: matrix,
            world_rotation: rotation_matrix,
            visual: matrix,
            bounce: None,
        }
    }

    /// Recompute the local matrices from `transform` and compose them with
    /// the parent's resolved `(world, world_rotation, visual)` matrices.
    /// The root composes with nothing.
    pub(crate) fn compose(&mut self, parent: Option<(Mat4, Mat4, Mat4)>, simulating: bool) {
        self.matrix = self.transform.matrix();
        self.rotation_matrix = self.transform.rotation_matrix();
        match parent {
            Some((world, world_rotation, visual)) => {
                self.world = world * self.matrix;
                self.world_rotation = world_rotation * self.rotation_matrix;
                self.visual = if simulating { self.world } else { visual * self.matrix };
            }
            None => {
                self.world = self.matrix;
                self.world_rotation = self.rotation_matrix;
                self.visual = self.world;
            }
        }
    }

    pub(crate) fn resolved(&self) -> (Mat4, Mat4, Mat4) {
        (self.world, self.world_rotation, self.visual)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Weak link to the owning parent. `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Local matrix as of the last resolve.
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    pub fn world_rotation(&self) -> Mat4 {
        self.world_rotation
    }

    pub fn visual_matrix(&self) -> Mat4 {
        self.visual
    }

    pub fn world_position(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }

    pub fn is_bouncing(&self) -> bool {
        self.bounce.is_some()
    }

    /// Split borrow for passes that read the name while mutating the rest.
    pub fn parts_mut(&mut self) -> (&str, &mut Transform, &mut ComponentMap) {
        (&self.name, &mut self.transform, &mut self.components)
    }
}
