use std::path::{Path, PathBuf};

use crate::error::LevelFileError;

/// Candidate files for a level name, in search order.
pub fn level_candidates(root: &Path, name: &str) -> Vec<PathBuf> {
    vec![
        root.join("Levels").join(format!("{name}.level.json")),
        root.join(format!("{name}.level.json")),
        root.join("Levels").join(format!("{name}.json")),
        root.join(format!("{name}.json")),
    ]
}

/// Resolve a level identifier to an existing file.
///
/// An identifier naming an existing file (absolute, or relative to `root`) is
/// used as-is; otherwise the name is searched for with the level extensions.
pub fn resolve_level_path(root: &Path, identifier: &str) -> Result<PathBuf, LevelFileError> {
    let direct = Path::new(identifier);
    for path in [direct.to_path_buf(), root.join(direct)] {
        if path.is_file() {
            return Ok(path);
        }
    }

    let candidates = level_candidates(root, identifier);
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        return Ok(found.clone());
    }
    Err(LevelFileError::NotFound {
        name: identifier.to_string(),
        searched: candidates,
    })
}

/// Key used to detect the same file opened twice. Paths are canonicalised
/// when possible and compared case-insensitively.
pub fn canonical_key(path: &Path) -> String {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    canonical.to_string_lossy().to_lowercase()
}
