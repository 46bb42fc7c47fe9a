use std::num::NonZeroU64;
use std::time::Duration;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::backend::{
    Backend, Binding, ComputePipelineDesc, FrameStatus, RenderPipelineDesc, ShaderSource,
    TableDesc,
};
use crate::command::{CommandList, StateValidator};
use crate::error::{ErrorCode, GpuError, GpuResult, ResultExt};
use crate::resource::{
    BufferDesc, BufferId, BufferUsage, MeshId, PipelineId, ResourceState, TableId, TextureDesc,
    TextureId,
};
use crate::scene::Vertex;
use crate::sync::{Fence, FenceCompleter, FenceValue, Timeline};

use super::registry::{GpuBuffer, GpuMesh, GpuPipeline, GpuTexture, Registry};
use super::signals::SignalPoints;
use super::{convert, exec, surface};
use super::{GpuInit, SurfaceErrorAction};

/// Swap-chain image acquired by `begin_frame` and released by `present`.
struct AcquiredFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// wgpu implementation of [`Backend`] bound to one window.
///
/// - creates and stores Instance/Adapter/Device/Queue
/// - creates and configures the Surface (swap chain)
/// - owns every GPU object behind the backend's typed handles
/// - signals fences from queue completion callbacks
pub struct Gpu<'w> {
    /// Needed for `pre_present_notify`; also ties the surface lifetime to it.
    window: &'w Window,

    /// Kept alive for the lifetime of the surface.
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'w>,
    adapter_name: String,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    registry: Registry,
    back_buffers: [TextureId; 2],
    linear_sampler: wgpu::Sampler,
    comparison_sampler: wgpu::Sampler,

    frame: Option<AcquiredFrame>,
    presents: u64,
    validator: Option<StateValidator>,

    last_submission: Option<wgpu::SubmissionIndex>,
    signals: SignalPoints<wgpu::SubmissionIndex>,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let GpuInit {
            backends,
            power_preference,
            prefer_srgb,
            present_mode,
            alpha_mode,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
            validate_commands,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("gpu: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps, alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen linear sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });
        let comparison_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen shadow sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let mut registry = Registry::default();
        let back_buffers = [
            registry.textures.insert(GpuTexture::BackBuffer),
            registry.textures.insert(GpuTexture::BackBuffer),
        ];

        let validator = validate_commands.then(|| {
            let mut v = StateValidator::new();
            for id in back_buffers {
                v.track_texture(id, ResourceState::Present);
            }
            v
        });

        Ok(Self {
            window,
            _instance: instance,
            surface,
            adapter_name: info.name,
            device,
            queue,
            config,
            registry,
            back_buffers,
            linear_sampler,
            comparison_sampler,
            frame: None,
            presents: 0,
            validator,
            last_submission: None,
            signals: SignalPoints::new(),
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn missing(operation: &'static str, what: impl std::fmt::Debug) -> GpuError {
        GpuError::new(ErrorCode::Validation, operation).with_detail(format!("unknown {what:?}"))
    }

    fn shader_module(&mut self, source: &ShaderSource) -> wgpu::ShaderModule {
        if let Some(module) = self.registry.shaders.get(&source.name) {
            return module.clone();
        }
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(source.name.as_ref()),
                source: wgpu::ShaderSource::Wgsl(source.wgsl.clone()),
            });
        self.registry
            .shaders
            .insert(source.name.clone(), module.clone());
        module
    }

    fn binding_view(&self, binding: &Binding) -> GpuResult<Option<wgpu::TextureView>> {
        let view = match *binding {
            Binding::Texture { texture, view } => {
                let (t, desc) = self
                    .registry
                    .owned_texture(texture)
                    .ok_or_else(|| Self::missing("create_table", texture))?;
                convert::sampled_view(t, desc.dimension, view)
            }
            Binding::StorageTexture { texture, mip, .. } => {
                let (t, _) = self
                    .registry
                    .owned_texture(texture)
                    .ok_or_else(|| Self::missing("create_table", texture))?;
                convert::subresource_view(t, mip, 0)
            }
            _ => return Ok(None),
        };
        Ok(Some(view))
    }

    fn buffer(&self, id: BufferId, operation: &'static str) -> GpuResult<&GpuBuffer> {
        self.registry
            .buffers
            .get(id)
            .ok_or_else(|| Self::missing(operation, id))
    }
}

impl Timeline for Gpu<'_> {
    fn enqueue_signal(&mut self, completer: FenceCompleter, value: FenceValue) -> GpuResult<()> {
        self.signals
            .push(value, self.last_submission.clone(), completer.completed_value());
        self.queue
            .on_submitted_work_done(move || completer.complete(value));
        Ok(())
    }

    fn drive(&self, _fence: &Fence, value: FenceValue, timeout: Option<Duration>) -> GpuResult<()> {
        let submission_index = self.signals.submission_for(value);
        log::trace!("gpu: polling device for fence {value} ({submission_index:?})");
        match self.device.poll(wgpu::PollType::Wait {
            submission_index,
            timeout,
        }) {
            Ok(_) => Ok(()),
            Err(wgpu::PollError::Timeout) => Err(GpuError::new(ErrorCode::Timeout, "device.poll")
                .with_detail(format!("fence {value} not reached within {timeout:?}"))),
            Err(e) => Err(e).gpu_context(ErrorCode::DeviceLost, "device.poll"),
        }
    }
}

impl Backend for Gpu<'_> {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn back_buffer(&self, index: usize) -> TextureId {
        self.back_buffers[index % 2]
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> GpuResult<TextureId> {
        if desc.width == 0 || desc.height == 0 || desc.mip_levels == 0 {
            return Err(GpuError::new(ErrorCode::Validation, "create_texture")
                .with_detail(format!("`{}` has an empty extent", desc.label)));
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label.as_str()),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: desc.layers(),
            },
            mip_level_count: desc.mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: convert::texture_format(desc.format, self.config.format),
            usage: convert::texture_usages(desc.usage),
            view_formats: &[],
        });
        let id = self.registry.textures.insert(GpuTexture::Owned {
            texture,
            desc: desc.clone(),
        });
        if let Some(v) = self.validator.as_mut() {
            v.track_texture(id, desc.initial_state);
        }
        log::debug!(
            "gpu: texture `{}` {}x{} {:?}",
            desc.label,
            desc.width,
            desc.height,
            desc.format
        );
        Ok(id)
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if let Some(GpuTexture::Owned { texture, .. }) = self.registry.textures.remove(id) {
            texture.destroy();
        }
        if let Some(v) = self.validator.as_mut() {
            v.forget_texture(id);
        }
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> GpuResult<BufferId> {
        let usage = match desc.usage {
            BufferUsage::Constant => wgpu::BufferUsages::UNIFORM,
            BufferUsage::Structured => wgpu::BufferUsages::STORAGE,
        };
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label.as_str()),
            size: desc.size,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(self.registry.buffers.insert(GpuBuffer {
            buffer,
            size: desc.size,
        }))
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        if let Some(b) = self.registry.buffers.remove(id) {
            b.buffer.destroy();
        }
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> GpuResult<()> {
        let buffer = self.buffer(id, "write_buffer")?;
        let end = offset + data.len() as u64;
        if end > buffer.size || offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(GpuError::new(ErrorCode::Validation, "write_buffer")
                .with_detail(format!("write {offset}..{end} into {} bytes", buffer.size)));
        }
        self.queue.write_buffer(&buffer.buffer, offset, data);
        Ok(())
    }

    fn create_mesh(
        &mut self,
        label: &str,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> GpuResult<MeshId> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(GpuError::new(ErrorCode::Validation, "create_mesh")
                .with_detail(format!("`{label}` is empty")));
        }
        let vertices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let indices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Ok(self.registry.meshes.insert(GpuMesh { vertices, indices }))
    }

    fn create_render_pipeline(&mut self, desc: &RenderPipelineDesc<'_>) -> GpuResult<PipelineId> {
        let module = self.shader_module(desc.shader);
        let layout = self
            .registry
            .pipeline_layout(&self.device, desc.label, desc.groups);
        let state = convert::raster_state(desc.kind);

        let targets: Vec<_> = desc
            .color_format
            .map(|f| wgpu::ColorTargetState {
                format: convert::texture_format(f, self.config.format),
                blend: state.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })
            .into_iter()
            .map(Some)
            .collect();
        let buffers = if desc.kind.uses_mesh_vertices() {
            vec![convert::vertex_layout()]
        } else {
            vec![]
        };
        let (depth_compare, depth_write_enabled) =
            state.depth.unwrap_or((wgpu::CompareFunction::Always, false));

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(desc.vs_entry),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: desc.fs_entry.map(|entry| wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    targets: &targets,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: state.cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: desc.depth_format.map(|f| wgpu::DepthStencilState {
                    format: convert::texture_format(f, self.config.format),
                    depth_write_enabled,
                    depth_compare,
                    stencil: wgpu::StencilState::default(),
                    bias: state.bias,
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });
        log::debug!("gpu: render pipeline `{}`", desc.label);
        Ok(self.registry.pipelines.insert(GpuPipeline::Render(pipeline)))
    }

    fn create_compute_pipeline(
        &mut self,
        desc: &ComputePipelineDesc<'_>,
    ) -> GpuResult<PipelineId> {
        let module = self.shader_module(desc.shader);
        let layout = self
            .registry
            .pipeline_layout(&self.device, desc.label, desc.groups);
        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&layout),
                module: &module,
                entry_point: Some(desc.entry),
                compilation_options: Default::default(),
                cache: None,
            });
        log::debug!("gpu: compute pipeline `{}`", desc.label);
        Ok(self.registry.pipelines.insert(GpuPipeline::Compute(pipeline)))
    }

    fn create_table(&mut self, desc: &TableDesc) -> GpuResult<TableId> {
        let layout = self.registry.layout(&self.device, &desc.layout());
        let views = desc
            .entries
            .iter()
            .map(|b| self.binding_view(b))
            .collect::<GpuResult<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(desc.entries.len());
        for (i, (binding, view)) in desc.entries.iter().zip(&views).enumerate() {
            let resource = match (binding, view) {
                (Binding::UniformDynamic { buffer, size }, _) => {
                    wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &self.buffer(*buffer, "create_table")?.buffer,
                        offset: 0,
                        size: NonZeroU64::new(*size),
                    })
                }
                (Binding::Storage { buffer }, _) => {
                    self.buffer(*buffer, "create_table")?.buffer.as_entire_binding()
                }
                (Binding::Texture { .. } | Binding::StorageTexture { .. }, Some(view)) => {
                    wgpu::BindingResource::TextureView(view)
                }
                (Binding::LinearSampler, _) => wgpu::BindingResource::Sampler(&self.linear_sampler),
                (Binding::ComparisonSampler, _) => {
                    wgpu::BindingResource::Sampler(&self.comparison_sampler)
                }
                (_, None) => return Err(Self::missing("create_table", binding)),
            };
            entries.push(wgpu::BindGroupEntry {
                binding: i as u32,
                resource,
            });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(desc.label.as_str()),
            layout: &layout,
            entries: &entries,
        });
        let id = self.registry.tables.insert(bind_group);
        if let Some(v) = self.validator.as_mut() {
            v.track_table(id, &desc.entries);
        }
        Ok(id)
    }

    fn destroy_table(&mut self, id: TableId) {
        self.registry.tables.remove(id);
        if let Some(v) = self.validator.as_mut() {
            v.forget_table(id);
        }
    }

    fn begin_frame(&mut self) -> GpuResult<FrameStatus> {
        if self.frame.is_some() {
            return Ok(FrameStatus::Ready);
        }
        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                return match surface::classify(&err) {
                    SurfaceErrorAction::Reconfigure => {
                        log::warn!("gpu: surface {err}; reconfiguring");
                        let (w, h) = self.surface_size();
                        surface::reconfigure(&self.surface, &self.device, &mut self.config, w, h);
                        Ok(FrameStatus::Skip)
                    }
                    SurfaceErrorAction::SkipFrame => {
                        log::warn!("gpu: surface {err}; frame skipped");
                        Ok(FrameStatus::Skip)
                    }
                    SurfaceErrorAction::Fatal => {
                        Err(GpuError::new(ErrorCode::OutOfMemory, "surface.get_current_texture")
                            .with_detail(err.to_string()))
                    }
                };
            }
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(AcquiredFrame {
            surface_texture,
            view,
        });
        Ok(FrameStatus::Ready)
    }

    fn execute(&mut self, list: &CommandList) -> GpuResult<()> {
        if let Some(v) = self.validator.as_mut() {
            v.validate(list)?;
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(list.label()),
            });
        exec::record(
            &mut encoder,
            &self.registry,
            self.frame.as_ref().map(|f| &f.view),
            list,
        )?;
        self.last_submission = Some(self.queue.submit(std::iter::once(encoder.finish())));
        Ok(())
    }

    fn present(&mut self) -> GpuResult<()> {
        let Some(AcquiredFrame {
            surface_texture,
            view,
        }) = self.frame.take()
        else {
            return Err(GpuError::new(ErrorCode::Validation, "present")
                .with_detail("no back buffer acquired"));
        };
        if let Some(v) = &self.validator {
            v.check_present(self.back_buffers[(self.presents % 2) as usize])?;
        }
        drop(view);
        self.window.pre_present_notify();
        surface_texture.present();
        self.presents += 1;
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> GpuResult<()> {
        if self.frame.is_some() {
            return Err(GpuError::new(ErrorCode::Validation, "resize_surface")
                .with_detail("back buffer still acquired"));
        }
        if !surface::reconfigure(&self.surface, &self.device, &mut self.config, width, height) {
            return Ok(());
        }
        self.presents = 0;
        if let Some(v) = self.validator.as_mut() {
            for id in self.back_buffers {
                v.track_texture(id, ResourceState::Present);
            }
        }
        log::debug!("gpu: surface resized to {width}x{height}");
        Ok(())
    }
}
