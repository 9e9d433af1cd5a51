use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stagehand_common::EditorCameraPose;
use stagehand_ecs::ComponentKind;

/// Current level document format.
pub const LEVEL_FORMAT_VERSION: u32 = 1;

/// Structural encoding of one node and, recursively, its children.
///
/// The `Transform` entry of `components` carries the node's transform; every
/// other entry is the persisted field data of one component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub name: String,
    #[serde(default)]
    pub components: IndexMap<ComponentKind, Value>,
    /// Keyed by child name. The key wins over the child's own `name` field.
    #[serde(default)]
    pub children: IndexMap<String, NodeDocument>,
}

impl NodeDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Total node count of this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(NodeDocument::node_count).sum::<usize>()
    }
}

/// A whole level as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDocument {
    pub format: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_camera: Option<EditorCameraPose>,
    pub root: NodeDocument,
}

impl LevelDocument {
    pub fn new(name: impl Into<String>, root: NodeDocument) -> Self {
        Self {
            format: LEVEL_FORMAT_VERSION,
            name: name.into(),
            editor_camera: None,
            root,
        }
    }
}
