use std::f32::consts::PI;

use glam::{Mat4, Vec3};
use stagehand_common::{Mode, NodeId};

use crate::node::{Bounce, Node};
use crate::tree::SceneTree;

/// Length of the selection pulse, in seconds.
pub const BOUNCE_DURATION: f32 = 0.35;
const BOUNCE_AMPLITUDE: f32 = 0.15;

fn bounce_scale(elapsed: f32) -> f32 {
    let t = (elapsed / BOUNCE_DURATION).clamp(0.0, 1.0);
    1.0 + BOUNCE_AMPLITUDE * (PI * t).sin() * (1.0 - t)
}

/// Resolve world and visual matrices for the whole tree, then hand each
/// resolved node to `visit`.
///
/// Traversal is the draw order: parents first, siblings by descending local
/// z. While simulating, the visual matrix is the world matrix. In the paused
/// editor it composes parent visual with local, then applies any running
/// selection pulse, which never touches the world matrix.
pub fn sync_hierarchy(
    tree: &mut SceneTree,
    mode: Mode,
    dt: f32,
    mut visit: impl FnMut(NodeId, &Node),
) {
    let simulating = mode.is_simulating();

    for id in tree.render_order() {
        let parent = tree
            .get(id)
            .and_then(Node::parent)
            .and_then(|p| tree.get(p))
            .map(Node::resolved);
        let Some(node) = tree.get_mut(id) else {
            continue;
        };

        node.compose(parent, simulating);

        if !simulating {
            apply_bounce(node, dt);
        }

        visit(id, node);
    }
}

fn apply_bounce(node: &mut Node, dt: f32) {
    let Some(bounce) = node.bounce else {
        return;
    };
    let elapsed = bounce.elapsed + dt;
    if elapsed >= BOUNCE_DURATION {
        node.bounce = None;
        return;
    }
    node.bounce = Some(Bounce { elapsed });
    node.visual *= Mat4::from_scale(Vec3::splat(bounce_scale(elapsed)));
}

/// Resolve matrices without collecting anything. Used when a level is
/// activated, before its first frame.
pub fn resolve_transforms(tree: &mut SceneTree) {
    sync_hierarchy(tree, Mode::Runtime, 0.0, |_, _| {});
}
