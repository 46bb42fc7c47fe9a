/// Knobs for [`super::Gpu::new`].
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends the instance may pick from.
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,

    /// Pick an sRGB swap-chain format when the surface offers one.
    pub prefer_srgb: bool,

    /// `Fifo` is the only mode every surface supports.
    pub present_mode: wgpu::PresentMode,

    /// Falls back to the surface's first supported mode when unset or
    /// unsupported.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Swap-chain depth hint. The frame ring bounds CPU run-ahead on its own.
    pub desired_maximum_frame_latency: u32,

    /// Run every submitted command list through the resource-state
    /// validator first.
    pub validate_commands: bool,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            validate_commands: cfg!(debug_assertions),
        }
    }
}
