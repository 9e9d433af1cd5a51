use std::path::PathBuf;

use stagehand_scene::SceneError;

/// Errors from reading, writing or locating level files.
#[derive(Debug, thiserror::Error)]
pub enum LevelFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("format version mismatch: file has v{file_version}, expected at most v{expected_version}")]
    FormatMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("not a packed level file")]
    BadMagic,
    #[error("level {name:?} not found; searched {searched:?}")]
    NotFound { name: String, searched: Vec<PathBuf> },
    #[error("level {0:?} has no backing file")]
    NoPath(String),
    #[error("level {0:?} is a play-mode clone and cannot be saved")]
    RuntimeClone(String),
    #[error("malformed level: {0}")]
    Scene(#[from] SceneError),
}
