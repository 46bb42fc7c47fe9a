use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::input::MouseButtons;

/// Camera orbiting the origin on a sphere, driven by mouse drags.
///
/// - left drag: rotate (theta around Y, phi from the pole)
/// - right drag: move closer / further
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    theta: f32,
    phi: f32,
    radius: f32,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    last_mouse: (f32, f32),
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            theta: 1.5 * PI,
            phi: 0.2 * PI,
            radius: 15.0,
            fov_y: 0.25 * PI,
            aspect: 1.0,
            near: 1.0,
            far: 1000.0,
            last_mouse: (0.0, 0.0),
        }
    }
}

impl OrbitCamera {
    const RADIUS_MIN: f32 = 5.0;
    const RADIUS_MAX: f32 = 150.0;

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Rebuilds the projection for a new aspect ratio.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn on_mouse_down(&mut self, x: f32, y: f32) {
        self.last_mouse = (x, y);
    }

    pub fn on_mouse_move(&mut self, buttons: MouseButtons, x: f32, y: f32) {
        let (dx, dy) = (x - self.last_mouse.0, y - self.last_mouse.1);

        if buttons.contains(MouseButtons::LEFT) {
            // 0.25 degrees per pixel.
            self.theta += (0.25 * dx).to_radians();
            self.phi = (self.phi + (0.25 * dy).to_radians()).clamp(0.1, PI - 0.1);
        } else if buttons.contains(MouseButtons::RIGHT) {
            self.radius = (self.radius + 0.05 * (dx - dy)).clamp(Self::RADIUS_MIN, Self::RADIUS_MAX);
        }

        self.last_mouse = (x, y);
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(
            self.radius * self.phi.sin() * self.theta.cos(),
            self.radius * self.phi.cos(),
            self.radius * self.phi.sin() * self.theta.sin(),
        )
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

/// View matrices of the six faces of a cube map centred at `center`, in
/// layer order +X, -X, +Y, -Y, +Z, -Z.
pub fn cube_face_views(center: Vec3) -> [Mat4; 6] {
    const FACES: [(Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y),
        (Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::Z),
        (Vec3::Z, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y),
    ];
    FACES.map(|(dir, up)| Mat4::look_at_rh(center, center + dir, up))
}

/// Square 90-degree projection used by every cube face.
pub fn cube_face_proj(near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(0.5 * PI, 1.0, near, far)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_drag_rotates_and_clamps_phi() {
        let mut cam = OrbitCamera::default();
        cam.on_mouse_down(0.0, 0.0);
        cam.on_mouse_move(MouseButtons::LEFT, 0.0, 10_000.0);
        assert!((cam.phi - (PI - 0.1)).abs() < 1e-5);

        let before = cam.theta;
        cam.on_mouse_move(MouseButtons::LEFT, 4.0, 10_000.0);
        assert!((cam.theta - before - 1f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn right_drag_zooms_within_limits() {
        let mut cam = OrbitCamera::default();
        cam.on_mouse_down(0.0, 0.0);
        cam.on_mouse_move(MouseButtons::RIGHT, 20.0, 0.0);
        assert!((cam.radius - 16.0).abs() < 1e-5);

        cam.on_mouse_move(MouseButtons::RIGHT, 20.0, 10_000.0);
        assert_eq!(cam.radius, OrbitCamera::RADIUS_MIN);
    }

    #[test]
    fn position_stays_on_sphere() {
        let cam = OrbitCamera::default();
        assert!((cam.position().length() - 15.0).abs() < 1e-4);
    }
}
