use glam::{Mat4, Vec3, Vec4};

/// Light-space matrices for a directional shadow.
#[derive(Debug, Copy, Clone)]
pub struct ShadowMatrices {
    pub view: Mat4,
    pub proj: Mat4,
    /// World to shadow-map texture space (`[0, 1]` uv, depth in z).
    pub transform: Mat4,
    pub eye: Vec3,
    pub near: f32,
    pub far: f32,
}

/// Fits an orthographic light frustum around a sphere of `radius` at the
/// origin, looking along `light_dir`.
pub fn directional_shadow(light_dir: Vec3, radius: f32) -> ShadowMatrices {
    let dir = light_dir.normalize_or(Vec3::NEG_Y);
    let eye = -2.0 * radius * dir;
    let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, up);

    // Sphere centre in light space; the view looks down -Z.
    let c = view.transform_point3(Vec3::ZERO);
    let near = -c.z - radius;
    let far = -c.z + radius;
    let proj = Mat4::orthographic_rh(c.x - radius, c.x + radius, c.y - radius, c.y + radius, near, far);

    let ndc_to_tex = Mat4::from_cols(
        Vec4::new(0.5, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -0.5, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(0.5, 0.5, 0.0, 1.0),
    );

    ShadowMatrices {
        view,
        proj,
        transform: ndc_to_tex * proj * view,
        eye,
        near,
        far,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_centre_maps_to_middle_of_shadow_map() {
        let m = directional_shadow(Vec3::new(0.57735, -0.57735, 0.57735), 10.0);
        let p = m.transform.project_point3(Vec3::ZERO);
        assert!((p.x - 0.5).abs() < 1e-4);
        assert!((p.y - 0.5).abs() < 1e-4);
        assert!((p.z - 0.5).abs() < 1e-4);
    }

    #[test]
    fn straight_down_light_does_not_degenerate() {
        let m = directional_shadow(Vec3::NEG_Y, 5.0);
        assert!(m.transform.is_finite());
    }
}
