use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use stagehand_render::RenderSettings;

/// Errors loading or writing an engine configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Engine startup configuration. Every field has a default, so a config file
/// only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory level names are resolved against.
    pub project_root: PathBuf,
    /// Fixed simulation step in seconds.
    pub timestep: f32,
    pub gravity: Vec3,
    /// Height of the ground plane bodies rest on, if any.
    pub floor: Option<f32>,
    pub render: RenderSettings,
    /// Start in the editor (paused) instead of the standalone player.
    pub editor: bool,
    /// Number of frame times kept for the rolling statistics.
    pub frame_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            timestep: 1.0 / 60.0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            floor: Some(0.0),
            render: RenderSettings::default(),
            editor: true,
            frame_history: 120,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
