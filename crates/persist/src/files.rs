use std::path::{Path, PathBuf};

use stagehand_scene::{LEVEL_FORMAT_VERSION, Level, LevelDocument};

use crate::error::LevelFileError;
use crate::packed::{PACK_EXTENSION, read_packed};

pub(crate) fn check_format(doc: &LevelDocument) -> Result<(), LevelFileError> {
    if doc.format > LEVEL_FORMAT_VERSION {
        return Err(LevelFileError::FormatMismatch {
            file_version: doc.format,
            expected_version: LEVEL_FORMAT_VERSION,
        });
    }
    Ok(())
}

/// Read a JSON level document and build its level.
pub fn read_level_json(path: impl AsRef<Path>) -> Result<Level, LevelFileError> {
    let path = path.as_ref();
    let doc: LevelDocument = serde_json::from_reader(std::fs::File::open(path)?)?;
    check_format(&doc)?;
    let level = Level::from_document(&doc, Some(path.to_path_buf()))?;
    tracing::debug!(path = %path.display(), nodes = level.tree().node_count(), "level read");
    Ok(level)
}

/// Read a level in whichever form its extension names.
pub fn read_level(path: impl AsRef<Path>) -> Result<Level, LevelFileError> {
    let path = path.as_ref();
    let packed = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PACK_EXTENSION));
    if packed {
        read_packed(path)
    } else {
        read_level_json(path)
    }
}

/// Write `level` as pretty JSON to `path`.
pub fn write_level_json(level: &Level, path: impl AsRef<Path>) -> Result<(), LevelFileError> {
    let path = path.as_ref();
    if level.is_runtime_clone() {
        return Err(LevelFileError::RuntimeClone(level.name().to_string()));
    }
    let doc = level.to_document()?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    serde_json::to_writer_pretty(std::fs::File::create(path)?, &doc)?;
    Ok(())
}

/// Write `level` to its backing file and clear its dirty flag.
pub fn save_level(level: &mut Level) -> Result<PathBuf, LevelFileError> {
    if level.is_runtime_clone() {
        return Err(LevelFileError::RuntimeClone(level.name().to_string()));
    }
    let path = level
        .path()
        .map(Path::to_path_buf)
        .ok_or_else(|| LevelFileError::NoPath(level.name().to_string()))?;
    write_level_json(level, &path)?;
    level.set_dirty(false);
    tracing::info!(level = level.name(), path = %path.display(), "level saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use stagehand_common::Transform;
    use stagehand_ecs::{ComponentKind, Light, Script};

    fn sample_level(path: PathBuf) -> Level {
        let mut level = Level::new("arena", Some(path));
        let root = level.tree().root();
        let tree = level.tree_mut();
        let sun = tree
            .add_child(root, "sun", Transform::from_position(Vec3::new(0.0, 20.0, 0.0)))
            .unwrap();
        tree.node_mut(sun)
            .unwrap()
            .components
            .insert(Box::new(Light::default()));
        let player = tree.add_child(root, "player", Transform::default()).unwrap();
        tree.node_mut(player)
            .unwrap()
            .components
            .insert(Box::new(Script::new("Scripts/player.lua")));
        level
    }

    #[test]
    fn save_then_read_preserves_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Levels").join("arena.level.json");
        let mut level = sample_level(path.clone());
        level.set_dirty(true);

        let written = save_level(&mut level).unwrap();
        assert_eq!(written, path);
        assert!(!level.is_dirty());

        let loaded = read_level(&path).unwrap();
        assert_eq!(loaded.name(), "arena");
        assert_eq!(loaded.path(), Some(path.as_path()));
        let sun = loaded.tree().find_path("sun").unwrap();
        let sun = loaded.tree().node(sun).unwrap();
        assert_eq!(sun.transform.position, Vec3::new(0.0, 20.0, 0.0));
        assert!(sun.components.contains(ComponentKind::Light));
        assert_eq!(loaded.to_document().unwrap(), level.to_document().unwrap());
    }

    #[test]
    fn runtime_clone_refuses_to_save() {
        let tmp = tempfile::tempdir().unwrap();
        let level = sample_level(tmp.path().join("arena.level.json"));
        let mut clone = level.runtime_clone();
        assert!(matches!(
            save_level(&mut clone),
            Err(LevelFileError::RuntimeClone(_))
        ));
        assert!(!tmp.path().join("arena.level.json").exists());
    }

    #[test]
    fn level_without_path_cannot_save() {
        let mut level = Level::new("scratch", None);
        assert!(matches!(save_level(&mut level), Err(LevelFileError::NoPath(_))));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.level.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_level(&path), Err(LevelFileError::Json(_))));
    }

    #[test]
    fn newer_format_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("future.level.json");
        let level = sample_level(path.clone());
        let mut doc = level.to_document().unwrap();
        doc.format = LEVEL_FORMAT_VERSION + 1;
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        match read_level(&path) {
            Err(LevelFileError::FormatMismatch {
                file_version,
                expected_version,
            }) => {
                assert_eq!(file_version, LEVEL_FORMAT_VERSION + 1);
                assert_eq!(expected_version, LEVEL_FORMAT_VERSION);
            }
            other => panic!("expected FormatMismatch, got {other:?}"),
        }
    }
}
