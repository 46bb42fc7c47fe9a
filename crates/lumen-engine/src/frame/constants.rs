//! GPU-visible per-frame records.
//!
//! Layouts mirror the WGSL structs in the scene shaders. Matrices are stored
//! transposed; shaders multiply row vectors (`v * m`), which undoes it.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

pub const MAX_LIGHTS: usize = 16;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightData {
    pub strength: [f32; 3],
    pub falloff_start: f32,
    pub direction: [f32; 3],
    pub falloff_end: f32,
    pub position: [f32; 3],
    pub spot_power: f32,
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            strength: [0.5, 0.5, 0.5],
            falloff_start: 1.0,
            direction: [0.0, -1.0, 0.0],
            falloff_end: 10.0,
            position: [0.0; 3],
            spot_power: 64.0,
        }
    }
}

/// Screen-space reflection tuning, uploaded with every pass.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SsrParams {
    pub max_distance: f32,
    pub resolution: f32,
    pub thickness: f32,
    pub max_steps: f32,
    pub fade_start: f32,
    pub fade_end: f32,
    pub _pad: [f32; 2],
}

impl Default for SsrParams {
    fn default() -> Self {
        Self {
            max_distance: 50.0,
            resolution: 0.5,
            thickness: 0.5,
            max_steps: 128.0,
            fade_start: 0.8,
            fade_end: 1.0,
            _pad: [0.0; 2],
        }
    }
}

/// Per-pass constants (main view, cube faces, shadow).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct PassConstants {
    pub view: Mat4,
    pub inv_view: Mat4,
    pub proj: Mat4,
    pub inv_proj: Mat4,
    pub view_proj: Mat4,
    pub inv_view_proj: Mat4,
    pub shadow_transform: Mat4,
    pub eye_pos: [f32; 3],
    pub near_z: f32,
    pub render_target_size: [f32; 2],
    pub inv_render_target_size: [f32; 2],
    pub far_z: f32,
    pub total_time: f32,
    pub delta_time: f32,
    pub _pad: f32,
    pub ambient_light: Vec4,
    pub ssr: SsrParams,
    pub lights: [LightData; MAX_LIGHTS],
}

/// Camera inputs for one pass.
#[derive(Debug, Copy, Clone)]
pub struct PassView {
    pub view: Mat4,
    pub proj: Mat4,
    pub eye: Vec3,
    pub near: f32,
    pub far: f32,
    pub width: u32,
    pub height: u32,
}

impl PassConstants {
    /// Builds the matrices of `view`; everything else is zeroed.
    pub fn from_view(v: &PassView) -> Self {
        let view_proj = v.proj * v.view;
        let (w, h) = (v.width.max(1) as f32, v.height.max(1) as f32);
        Self {
            view: v.view.transpose(),
            inv_view: v.view.inverse().transpose(),
            proj: v.proj.transpose(),
            inv_proj: v.proj.inverse().transpose(),
            view_proj: view_proj.transpose(),
            inv_view_proj: view_proj.inverse().transpose(),
            eye_pos: v.eye.to_array(),
            near_z: v.near,
            far_z: v.far,
            render_target_size: [w, h],
            inv_render_target_size: [1.0 / w, 1.0 / h],
            ..Self::zeroed()
        }
    }

    pub fn with_shadow_transform(mut self, m: Mat4) -> Self {
        self.shadow_transform = m.transpose();
        self
    }
}

/// One drawn instance.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    world: Mat4,
    tex_transform: Mat4,
    pub material_index: u32,
    pub _pad: [u32; 3],
}

impl InstanceData {
    pub fn new(world: Mat4, tex_transform: Mat4, material_index: u32) -> Self {
        Self {
            world: world.transpose(),
            tex_transform: tex_transform.transpose(),
            material_index,
            _pad: [0; 3],
        }
    }

    pub fn world(&self) -> Mat4 {
        self.world.transpose()
    }

    pub fn tex_transform(&self) -> Mat4 {
        self.tex_transform.transpose()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialData {
    pub diffuse_albedo: Vec4,
    pub fresnel_r0: [f32; 3],
    pub roughness: f32,
    mat_transform: Mat4,
    pub diffuse_map_index: u32,
    pub normal_map_index: u32,
    pub _pad: [u32; 2],
}

impl MaterialData {
    pub fn new(
        diffuse_albedo: Vec4,
        fresnel_r0: Vec3,
        roughness: f32,
        mat_transform: Mat4,
        diffuse_map_index: u32,
        normal_map_index: u32,
    ) -> Self {
        Self {
            diffuse_albedo,
            fresnel_r0: fresnel_r0.to_array(),
            roughness,
            mat_transform: mat_transform.transpose(),
            diffuse_map_index,
            normal_map_index,
            _pad: [0; 2],
        }
    }

    pub fn mat_transform(&self) -> Mat4 {
        self.mat_transform.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Completion, HeadlessBackend};
    use crate::upload::{ElementKind, UploadBuffer};

    #[test]
    fn record_sizes_match_shader_layouts() {
        assert_eq!(size_of::<LightData>(), 48);
        assert_eq!(size_of::<InstanceData>(), 144);
        assert_eq!(size_of::<MaterialData>(), 112);
        assert_eq!(size_of::<PassConstants>() % 16, 0);
    }

    #[test]
    fn instances_round_trip_through_upload_buffer() {
        let mut backend = HeadlessBackend::new(4, 4, Completion::Immediate);
        let mut buf =
            UploadBuffer::<InstanceData>::new(&mut backend, "instances", 4, ElementKind::Structured)
                .unwrap();

        let worlds: Vec<Mat4> = (0..4)
            .map(|i| {
                Mat4::from_scale_rotation_translation(
                    Vec3::splat(1.0 + i as f32),
                    glam::Quat::from_rotation_y(0.3 * i as f32),
                    Vec3::new(i as f32, -2.0, 5.0),
                )
            })
            .collect();

        for (i, w) in worlds.iter().enumerate() {
            buf.write(i, &InstanceData::new(*w, Mat4::IDENTITY, i as u32));
        }

        for (i, w) in worlds.iter().enumerate() {
            let back = buf.read(i);
            assert_eq!(back.world(), *w);
            assert_eq!(back.material_index, i as u32);
        }
        // Stored layout is transposed: translation sits in the last row.
        let raw = buf.read(3).world.to_cols_array();
        assert_eq!([raw[3], raw[7], raw[11]], [3.0, -2.0, 5.0]);
    }
}
