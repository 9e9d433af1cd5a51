use serde::{Deserialize, Serialize};

/// Engine-wide render settings. Scripts can read and write these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Multiplier on the shadow camera's field of view.
    pub shadow_fov_scale: f32,
    pub shadow_bias: f32,
    pub shadow_map_resolution: u32,
    /// Distance a directional shadow camera is pulled back along the light direction.
    pub directional_shadow_distance: f32,
    pub ambient: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadow_fov_scale: 1.0,
            shadow_bias: 0.005,
            shadow_map_resolution: 4096,
            directional_shadow_distance: 500.0,
            ambient: 0.1,
        }
    }
}
