//! Shadow pass selection: at most one shadow-casting light per frame.

use glam::{Mat4, Vec3, Vec4};

use crate::backend::{RenderBackend, Uniform};
use crate::scratch::{CollectedLight, LightKind};
use crate::settings::RenderSettings;

const SHADOW_NEAR: f32 = 0.01;
const SHADOW_FAR: f32 = 1000.0;
const POINT_SHADOW_FOV: f32 = 160.0;
const SPOT_SHADOW_FOV: f32 = 90.0;

/// The light chosen to cast this frame's shadow map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSelection {
    /// Index into the frame's collected light list.
    pub index: usize,
    pub light: CollectedLight,
    pub view: Mat4,
    pub projection: Mat4,
}

impl ShadowSelection {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Value for the `shadow_light_index` uniform.
    pub fn shader_index(selection: Option<&Self>) -> i32 {
        selection.map_or(-1, |s| s.index as i32)
    }
}

/// Pick the first enabled, shadow-casting light in collection order.
/// Later shadow lights are ignored.
pub fn select_shadow_light(
    lights: &[CollectedLight],
    settings: &RenderSettings,
) -> Option<ShadowSelection> {
    let index = lights
        .iter()
        .position(|l| l.params.enabled && l.params.shadows)?;
    let light = lights[index];
    tracing::trace!(index, kind = ?light.params.kind, "shadow light selected");
    let (view, projection) = light_space(&light, settings);
    Some(ShadowSelection {
        index,
        light,
        view,
        projection,
    })
}

/// Light-space view and projection for a light.
///
/// Directional lights use an orthographic camera pulled back along the light
/// direction, sized by the light range. Point lights look straight down with a
/// wide perspective. Spot lights look along their forward vector.
pub fn light_space(light: &CollectedLight, settings: &RenderSettings) -> (Mat4, Mat4) {
    let pos = light.position;
    let fwd = light.forward.normalize_or(Vec3::NEG_Z);
    let scale = settings.shadow_fov_scale;

    let (eye, target, up) = match light.params.kind {
        LightKind::Directional => (
            pos - fwd * settings.directional_shadow_distance,
            pos,
            Vec3::Y,
        ),
        LightKind::Point => (pos, pos - Vec3::Y, Vec3::X),
        LightKind::Spot => (pos, pos + fwd, Vec3::Y),
    };
    let up = stable_up(target - eye, up);
    let view = Mat4::look_at_rh(eye, target, up);

    let projection = match light.params.kind {
        LightKind::Directional => {
            let half = light.params.range * 2.0 * scale * 0.5;
            Mat4::orthographic_rh(-half, half, -half, half, SHADOW_NEAR, SHADOW_FAR)
        }
        LightKind::Point => Mat4::perspective_rh(
            (POINT_SHADOW_FOV * scale).to_radians(),
            1.0,
            SHADOW_NEAR,
            SHADOW_FAR,
        ),
        LightKind::Spot => Mat4::perspective_rh(
            (SPOT_SHADOW_FOV * scale).to_radians(),
            1.0,
            SHADOW_NEAR,
            SHADOW_FAR,
        ),
    };

    (view, projection)
}

/// Swap the up vector when it is parallel to the view direction.
fn stable_up(dir: Vec3, up: Vec3) -> Vec3 {
    if dir.normalize_or_zero().cross(up).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        up
    }
}

/// Upload one light's uniforms at its slot in the light array.
pub fn upload_light(backend: &mut dyn RenderBackend, index: usize, light: &CollectedLight) {
    let p = &light.params;
    let base = format!("lights[{index}]");
    backend.set_uniform(&format!("{base}.enabled"), Uniform::Int(i32::from(p.enabled)));
    backend.set_uniform(&format!("{base}.type"), Uniform::Int(p.kind.shader_index()));
    backend.set_uniform(&format!("{base}.position"), Uniform::Vec3(light.position));
    backend.set_uniform(
        &format!("{base}.target"),
        Uniform::Vec3(light.position + light.forward),
    );
    backend.set_uniform(
        &format!("{base}.color"),
        Uniform::Vec4(Vec4::from((p.color * p.intensity, 1.0))),
    );
    backend.set_uniform(&format!("{base}.range"), Uniform::Float(p.range));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::scratch::LightParams;
    use slotmap::SlotMap;
    use stagehand_common::NodeId;

    fn light(node: NodeId, kind: LightKind, enabled: bool, shadows: bool) -> CollectedLight {
        CollectedLight {
            node,
            params: LightParams {
                kind,
                enabled,
                shadows,
                ..LightParams::default()
            },
            position: Vec3::new(0.0, 5.0, 0.0),
            forward: Vec3::new(0.0, -1.0, -1.0).normalize(),
        }
    }

    fn keys(n: usize) -> Vec<NodeId> {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn first_shadow_light_wins() {
        let ids = keys(3);
        let lights = [
            light(ids[0], LightKind::Directional, true, false),
            light(ids[1], LightKind::Spot, true, true),
            light(ids[2], LightKind::Point, true, true),
        ];
        let selection = select_shadow_light(&lights, &RenderSettings::default()).unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.light.node, ids[1]);
    }

    #[test]
    fn disabled_shadow_light_is_skipped() {
        let ids = keys(2);
        let lights = [
            light(ids[0], LightKind::Spot, false, true),
            light(ids[1], LightKind::Spot, true, true),
        ];
        let selection = select_shadow_light(&lights, &RenderSettings::default()).unwrap();
        assert_eq!(selection.index, 1);
    }

    #[test]
    fn no_shadow_light_means_index_minus_one() {
        let ids = keys(1);
        let lights = [light(ids[0], LightKind::Point, true, false)];
        let selection = select_shadow_light(&lights, &RenderSettings::default());
        assert!(selection.is_none());
        assert_eq!(ShadowSelection::shader_index(selection.as_ref()), -1);
    }

    #[test]
    fn directional_eye_is_pulled_back_along_forward() {
        let ids = keys(1);
        let l = light(ids[0], LightKind::Directional, true, true);
        let settings = RenderSettings::default();
        let (view, _) = light_space(&l, &settings);
        let eye = l.position - l.forward * settings.directional_shadow_distance;
        // The view matrix maps the eye to the origin.
        assert!(view.transform_point3(eye).length() < 1e-2);
    }

    #[test]
    fn light_space_matrices_are_finite_for_every_kind() {
        let ids = keys(1);
        let settings = RenderSettings::default();
        for kind in [LightKind::Directional, LightKind::Point, LightKind::Spot] {
            let mut l = light(ids[0], kind, true, true);
            // Straight down stresses the up-vector choice.
            l.forward = Vec3::NEG_Y;
            let (view, proj) = light_space(&l, &settings);
            assert!(view.is_finite(), "{kind:?} view");
            assert!(proj.is_finite(), "{kind:?} projection");
        }
    }

    #[test]
    fn upload_light_sets_indexed_uniforms() {
        let ids = keys(1);
        let mut backend = RecordingBackend::new();
        upload_light(&mut backend, 2, &light(ids[0], LightKind::Spot, true, false));
        assert_eq!(backend.uniform("lights[2].type"), Some(Uniform::Int(2)));
        assert_eq!(backend.uniform("lights[2].enabled"), Some(Uniform::Int(1)));
    }
}
