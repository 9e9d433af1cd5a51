use std::fmt::{self, Write as _};

use stagehand_common::{Mode, NodeId};
use stagehand_ecs::ComponentKind;
use stagehand_engine::EngineContext;
use stagehand_scene::{Level, LevelKind, Node, SceneTree};

/// Scene inspector for developer tooling.
///
/// Read-only queries against levels and the engine context for debugging
/// and the headless driver.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of a level.
    pub fn summary(level: &Level) -> LevelSummary {
        let tree = level.tree();
        let (components, loaded) = tree
            .iter()
            .flat_map(|(_, node)| node.components.iter())
            .fold((0, 0), |(total, loaded), (_, slot)| {
                (total + 1, loaded + usize::from(slot.is_loaded()))
            });
        LevelSummary {
            name: level.name().to_string(),
            kind: level.kind(),
            dirty: level.is_dirty(),
            node_count: tree.node_count(),
            component_count: components,
            loaded_count: loaded,
        }
    }

    /// Details of one node, or `None` if it is not in the tree.
    pub fn inspect_node(tree: &SceneTree, id: NodeId) -> Option<NodeInfo> {
        let node = tree.get(id)?;
        let t = node.transform;
        Some(NodeInfo {
            id,
            path: tree.path_of(id).unwrap_or_default(),
            position: t.position.to_array(),
            rotation: t.rotation.to_array(),
            scale: t.scale.to_array(),
            world_position: node.world_position().to_array(),
            components: component_states(node),
        })
    }

    /// Indented outline of the tree in logic order, one node per line with
    /// its components. Unloaded components are marked with `?`.
    pub fn tree_dump(tree: &SceneTree) -> String {
        let mut out = String::new();
        for id in tree.pre_order() {
            let Some(node) = tree.get(id) else {
                continue;
            };
            let depth = depth_of(tree, node);
            let _ = write!(out, "{:indent$}{}", "", node.name(), indent = depth * 2);
            let states = component_states(node);
            if !states.is_empty() {
                let list: Vec<String> = states.iter().map(ToString::to_string).collect();
                let _ = write!(out, " [{}]", list.join(", "));
            }
            out.push('\n');
        }
        out
    }

    pub fn engine(ctx: &EngineContext) -> EngineSummary {
        EngineSummary {
            mode: ctx.mode(),
            open_levels: ctx.levels().len(),
            active: ctx.active_level().map(|l| l.name().to_string()),
            frame_index: ctx.frame_index(),
            average_frame_us: ctx.timer().average().as_micros(),
            max_frame_us: ctx.timer().max().as_micros(),
            undo_depth: ctx.history().undo_count(),
        }
    }
}

fn depth_of(tree: &SceneTree, node: &Node) -> usize {
    std::iter::successors(node.parent(), |&p| tree.get(p).and_then(Node::parent)).count()
}

fn component_states(node: &Node) -> Vec<ComponentState> {
    node.components
        .iter()
        .map(|(kind, slot)| ComponentState {
            kind,
            loaded: slot.is_loaded(),
        })
        .collect()
}

/// Summary of a level for the inspector.
#[derive(Debug, Clone)]
pub struct LevelSummary {
    pub name: String,
    pub kind: LevelKind,
    pub dirty: bool,
    pub node_count: usize,
    pub component_count: usize,
    pub loaded_count: usize,
}

impl fmt::Display for LevelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Level: {} ({:?}{}) nodes={} components={} loaded={}",
            self.name,
            self.kind,
            if self.dirty { ", dirty" } else { "" },
            self.node_count,
            self.component_count,
            self.loaded_count
        )
    }
}

/// A component kind on a node and whether it has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentState {
    pub kind: ComponentKind,
    pub loaded: bool,
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, if self.loaded { "" } else { "?" })
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub path: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub world_position: [f32; 3],
    pub components: Vec<ComponentState>,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        write!(
            f,
            "Node {path} pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2}) world=({:.2}, {:.2}, {:.2})",
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
            self.world_position[0],
            self.world_position[1],
            self.world_position[2],
        )
    }
}

/// Snapshot of engine session state.
#[derive(Debug, Clone)]
pub struct EngineSummary {
    pub mode: Mode,
    pub open_levels: usize,
    pub active: Option<String>,
    pub frame_index: u64,
    pub average_frame_us: u128,
    pub max_frame_us: u128,
    pub undo_depth: usize,
}

impl fmt::Display for EngineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Engine: mode={:?} levels={} active={} frames={} avg={}us max={}us undo={}",
            self.mode,
            self.open_levels,
            self.active.as_deref().unwrap_or("-"),
            self.frame_index,
            self.average_frame_us,
            self.max_frame_us,
            self.undo_depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use stagehand_common::Transform;
    use stagehand_ecs::{Light, Model, Rigidbody};
    use stagehand_engine::EngineConfig;

    fn sample_level() -> (Level, NodeId) {
        let mut level = Level::new("yard", None);
        let tree = level.tree_mut();
        let root = tree.root();
        let shed = tree.add_child(root, "shed", Transform::default()).unwrap();
        let lamp = tree
            .add_child(shed, "lamp", Transform::from_position(Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();
        let node = tree.node_mut(lamp).unwrap();
        node.components.insert(Box::new(Light::default()));
        node.components.insert(Box::new(Model::new("lamp.mesh")));
        tree.node_mut(shed)
            .unwrap()
            .components
            .insert(Box::new(Rigidbody::default()));
        (level, lamp)
    }

    #[test]
    fn summary_counts_nodes_and_components() {
        let (level, _) = sample_level();
        let summary = SceneInspector::summary(&level);
        assert_eq!(summary.node_count, 3);
        assert_eq!(summary.component_count, 3);
        assert_eq!(summary.loaded_count, 0);
        assert!(format!("{summary}").contains("yard"));
    }

    #[test]
    fn inspect_node_found() {
        let (level, lamp) = sample_level();
        let info = SceneInspector::inspect_node(level.tree(), lamp).unwrap();
        assert_eq!(info.path, "shed/lamp");
        assert_eq!(info.position, [1.0, 2.0, 3.0]);
        assert_eq!(
            info.components,
            vec![
                ComponentState {
                    kind: ComponentKind::Light,
                    loaded: false
                },
                ComponentState {
                    kind: ComponentKind::Model,
                    loaded: false
                },
            ]
        );
    }

    #[test]
    fn inspect_node_not_found() {
        let (mut level, lamp) = sample_level();
        level.tree_mut().remove(lamp).unwrap();
        assert!(SceneInspector::inspect_node(level.tree(), lamp).is_none());
    }

    #[test]
    fn tree_dump_indents_and_marks_unloaded() {
        let (level, _) = sample_level();
        let dump = SceneInspector::tree_dump(level.tree());
        assert_eq!(dump, "Root\n  shed [Rigidbody?]\n    lamp [Light?, Model?]\n");
    }

    #[test]
    fn engine_summary_display() {
        let ctx = EngineContext::new(EngineConfig::default());
        let summary = SceneInspector::engine(&ctx);
        assert_eq!(summary.open_levels, 0);
        let s = format!("{summary}");
        assert!(s.contains("mode=Edit"));
        assert!(s.contains("active=-"));
    }
}
