use serde::{Deserialize, Serialize};
use std::path::Path;

/// A minimal mesh description. Vertex data stays with the render backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub primitive_count: u32,
    pub material_count: u32,
}

/// A texture reference. Pixel decoding is left to the render backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub name: String,
    pub byte_len: usize,
}

/// Source text for the embedded scripting runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSource {
    pub name: String,
    pub source: String,
}

/// A decoded asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Asset {
    Mesh(Mesh),
    Texture(Texture),
    Script(ScriptSource),
}

impl Asset {
    pub fn as_script(&self) -> Option<&ScriptSource> {
        match self {
            Self::Script(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match self {
            Self::Mesh(m) => Some(m),
            _ => None,
        }
    }
}

/// Errors from asset operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssetError {
    #[error("IO error reading {name}: {message}")]
    Io { name: String, message: String },
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("glTF parse error in {name}: {message}")]
    GltfParse { name: String, message: String },
}

/// Read and decode one asset file. Runs on a loader thread.
pub(crate) fn decode_file(name: &str, path: &Path) -> Result<Asset, AssetError> {
    let io_err = |e: std::io::Error| AssetError::Io {
        name: name.to_string(),
        message: e.to_string(),
    };
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "lua" | "luau" | "script" => {
            let source = std::fs::read_to_string(path).map_err(io_err)?;
            Ok(Asset::Script(ScriptSource {
                name: name.to_string(),
                source,
            }))
        }
        "gltf" => {
            let data = std::fs::read_to_string(path).map_err(io_err)?;
            decode_gltf(name, &data).map(Asset::Mesh)
        }
        _ => {
            let bytes = std::fs::read(path).map_err(io_err)?;
            Ok(Asset::Texture(Texture {
                name: name.to_string(),
                byte_len: bytes.len(),
            }))
        }
    }
}

/// Read glTF JSON metadata only: primitive and material counts.
fn decode_gltf(name: &str, data: &str) -> Result<Mesh, AssetError> {
    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|e| AssetError::GltfParse {
            name: name.to_string(),
            message: e.to_string(),
        })?;

    let primitive_count = json
        .get("meshes")
        .and_then(|m| m.as_array())
        .map(|meshes| {
            meshes
                .iter()
                .filter_map(|m| m.get("primitives").and_then(|p| p.as_array()))
                .map(|p| p.len() as u32)
                .sum()
        })
        .unwrap_or(0);
    let material_count = json
        .get("materials")
        .and_then(|m| m.as_array())
        .map(|m| m.len() as u32)
        .unwrap_or(0);

    Ok(Mesh {
        name: name.to_string(),
        primitive_count,
        material_count,
    })
}
