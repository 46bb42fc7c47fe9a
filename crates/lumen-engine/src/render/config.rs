use std::time::Duration;

use glam::Vec3;

use crate::frame::SsrParams;

/// Renderer tuning.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Frame slots in flight (ring size).
    pub frames_in_flight: usize,

    /// Shadow map edge length in texels.
    pub shadow_map_size: u32,

    /// Dynamic cube map face edge length in texels.
    pub cube_map_size: u32,

    pub brdf_lut_size: u32,

    /// Clear color of the scene and cube faces.
    pub clear_color: [f32; 4],

    /// Where the dynamic cube map is captured from.
    pub cube_center: Vec3,

    /// Radius of the sphere the shadow map has to cover, centred at the origin.
    pub scene_radius: f32,

    pub ssr: SsrParams,

    /// Upper bound on any single fence wait. `None` waits forever.
    pub fence_timeout: Option<Duration>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 3,
            shadow_map_size: 2048,
            cube_map_size: 512,
            brdf_lut_size: 512,
            clear_color: [0.690_196, 0.768_627, 0.870_588, 1.0],
            cube_center: Vec3::new(0.0, 2.0, 0.0),
            scene_radius: (10.0f32 * 10.0 + 15.0 * 15.0).sqrt(),
            ssr: SsrParams::default(),
            fence_timeout: None,
        }
    }
}
