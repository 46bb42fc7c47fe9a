use glam::Vec3;

use crate::backend::{Backend, Binding, FrameStatus, TableDesc, TextureView};
use crate::command::{ColorAttachment, CommandList, DepthAttachment, ScissorRect, Viewport};
use crate::error::GpuResult;
use crate::frame::{
    FrameResource, FrameRing, FrameSizes, PassAllocator, PassConstants, PassHandle, PassLayout,
    PassView,
};
use crate::resource::{BufferId, ResourceState, TableId, TextureId, TrackedTexture};
use crate::scene::{cube_face_proj, cube_face_views, OrbitCamera, RenderItem, RenderLayer, Scene};
use crate::sync::{Fence, FenceValue};
use crate::targets::{
    BrdfLut, CubeRenderTarget, DepthBuffer, FallbackCube, HiZ, SceneColor, ShadowMap, SsrTarget,
};
use crate::time::GameTime;

use super::shadow::directional_shadow;
use super::{Pipelines, RendererConfig, ShaderLibrary};

const CUBE_NEAR: f32 = 0.1;
const CUBE_FAR: f32 = 1000.0;

struct Targets {
    depth: DepthBuffer,
    shadow: ShadowMap,
    cube: CubeRenderTarget,
    fallback_cube: FallbackCube,
    brdf: BrdfLut,
    scene_color: SceneColor,
    ssr: SsrTarget,
    hiz: HiZ,
}

/// Tables referencing target textures. Screen-sized ones are rebuilt on
/// resize.
struct Tables {
    /// Scene textures for the cube faces (fallback cube in place of the one
    /// being rendered).
    cube_pass: TableId,
    main_pass: TableId,
    ssr_inputs: TableId,
    composite_inputs: TableId,
}

/// Per-frame offsets into the pass-constants buffer.
struct PassOffsets {
    main: u32,
    cube_faces: [u32; 6],
    shadow: u32,
}

/// The frame pipeline: owns every GPU object the frame needs and records,
/// submits and presents one command list per frame.
///
/// Per loop iteration call [`Renderer::update`] then [`Renderer::draw`].
pub struct Renderer {
    config: RendererConfig,
    fence: Fence,
    ring: FrameRing<FrameResource>,
    passes: PassLayout,
    pipelines: Pipelines,
    targets: Targets,
    tables: Tables,
    back_buffers: [TrackedTexture; 2],
    back_buffer_index: usize,
    size: (u32, u32),
    /// Reused for work outside the frame ring (start-up, resize).
    one_off: CommandList,
}

impl Renderer {
    pub fn new<B: Backend + ?Sized>(
        backend: &mut B,
        shaders: &ShaderLibrary,
        scene: &mut Scene,
        config: RendererConfig,
    ) -> GpuResult<Self> {
        assert!(config.frames_in_flight > 0, "at least one frame in flight");
        // Every slot owns a material buffer; each one needs its own upload.
        scene.materials.set_frames_in_flight(config.frames_in_flight);
        let size = backend.surface_size();
        let (w, h) = size;
        log::debug!(
            "renderer: {w}x{h} on {}, {} frames in flight",
            backend.name(),
            config.frames_in_flight
        );

        let pipelines = Pipelines::new(backend, shaders)?;

        let mut alloc = PassAllocator::new();
        let passes = PassLayout::allocate(&mut alloc);

        let depth = DepthBuffer::new(backend, w, h)?;
        let hiz = HiZ::new(backend, w, h, depth.texture().id())?;
        let mut targets = Targets {
            shadow: ShadowMap::new(backend, config.shadow_map_size)?,
            cube: CubeRenderTarget::new(backend, config.cube_map_size)?,
            fallback_cube: FallbackCube::new(backend)?,
            brdf: BrdfLut::new(backend, config.brdf_lut_size)?,
            scene_color: SceneColor::new(backend, w, h, config.clear_color)?,
            ssr: SsrTarget::new(backend, w, h)?,
            hiz,
            depth,
        };

        let sizes = FrameSizes {
            passes: alloc.count(),
            instances: scene.instance_count(),
            materials: scene.materials.len(),
        };
        let slots = (0..config.frames_in_flight)
            .map(|i| FrameResource::new(backend, i, sizes))
            .collect::<GpuResult<Vec<_>>>()?;
        let ring = FrameRing::new(slots).with_wait_timeout(config.fence_timeout);

        let (ssr_inputs, composite_inputs) = screen_tables(backend, &targets)?;
        let tables = Tables {
            cube_pass: scene_textures_table(
                backend,
                "cube pass textures",
                &targets,
                targets.fallback_cube.texture().id(),
            )?,
            main_pass: scene_textures_table(
                backend,
                "main pass textures",
                &targets,
                targets.cube.color().id(),
            )?,
            ssr_inputs,
            composite_inputs,
        };

        let back_buffers =
            [0, 1].map(|i| TrackedTexture::new(backend.back_buffer(i), ResourceState::Present));

        let mut one_off = CommandList::new("one-off");
        targets.depth.transition_to(&mut one_off, ResourceState::DepthWrite);
        targets.brdf.record_generate(&mut one_off, pipelines.brdf_lut);
        one_off.close();

        let mut renderer = Self {
            config,
            fence: Fence::new(),
            ring,
            passes,
            pipelines,
            targets,
            tables,
            back_buffers,
            back_buffer_index: 0,
            size,
            one_off,
        };

        backend.execute(&renderer.one_off)?;
        renderer.flush(backend)?;
        Ok(renderer)
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn fence(&self) -> &Fence {
        &self.fence
    }

    pub fn frames_in_flight(&self) -> usize {
        self.ring.len()
    }

    /// Material buffer owned by ring slot `slot`.
    pub fn material_buffer(&self, slot: usize) -> Option<BufferId> {
        self.ring.get(slot).map(|frame| frame.materials.buffer())
    }

    /// Ring slot used by the frame being recorded.
    pub fn current_slot(&self) -> usize {
        self.ring.current_index()
    }

    pub fn back_buffer_index(&self) -> usize {
        self.back_buffer_index
    }

    /// Signals the fence and blocks until the GPU has drained the queue.
    pub fn flush<B: Backend + ?Sized>(&mut self, backend: &mut B) -> GpuResult<()> {
        let value = self.fence.signal(backend)?;
        self.wait(backend, value)?;
        self.ring.retire_completed(&self.fence);
        Ok(())
    }

    fn wait<B: Backend + ?Sized>(&self, backend: &B, value: FenceValue) -> GpuResult<()> {
        match self.config.fence_timeout {
            Some(t) => self.fence.block_until_for(backend, value, t),
            None => self.fence.block_until(backend, value),
        }
    }

    /// Rebuilds swap-chain sized resources.
    ///
    /// A zero-sized window (minimized) and an unchanged size are both
    /// ignored.
    pub fn on_resize<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> GpuResult<()> {
        if width == 0 || height == 0 {
            log::debug!("renderer: zero-sized resize ignored");
            return Ok(());
        }
        if (width, height) == self.size {
            return Ok(());
        }
        log::debug!(
            "renderer: resize {}x{} -> {width}x{height}",
            self.size.0,
            self.size.1
        );

        self.flush(backend)?;

        self.targets.depth.release(backend);
        backend.resize_surface(width, height)?;
        self.back_buffers =
            [0, 1].map(|i| TrackedTexture::new(backend.back_buffer(i), ResourceState::Present));
        self.back_buffer_index = 0;

        self.targets.depth = DepthBuffer::new(backend, width, height)?;
        self.one_off.reset();
        self.targets
            .depth
            .transition_to(&mut self.one_off, ResourceState::DepthWrite);
        self.one_off.close();
        backend.execute(&self.one_off)?;
        self.flush(backend)?;

        let depth = self.targets.depth.texture().id();
        self.targets.scene_color.on_resize(backend, width, height)?;
        self.targets.ssr.on_resize(backend, width, height)?;
        self.targets.hiz.on_resize(backend, width, height, depth)?;

        backend.destroy_table(self.tables.ssr_inputs);
        backend.destroy_table(self.tables.composite_inputs);
        let (ssr_inputs, composite_inputs) = screen_tables(backend, &self.targets)?;
        self.tables.ssr_inputs = ssr_inputs;
        self.tables.composite_inputs = composite_inputs;

        self.size = (width, height);
        Ok(())
    }

    /// Acquires the next frame slot and fills its upload buffers.
    pub fn update<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        scene: &mut Scene,
        camera: &OrbitCamera,
        time: GameTime,
    ) -> GpuResult<()> {
        let constants = self.pass_constants(scene, camera, time);

        let (_, frame) = self.ring.acquire(&*backend, &self.fence)?;

        scene.materials.upload(&mut frame.materials);
        scene.write_instances(&mut frame.instances);
        for (pass, c) in constants {
            frame.pass_constants.write(pass.index(), &c);
        }
        frame.flush_uploads(backend)
    }

    fn pass_constants(
        &self,
        scene: &Scene,
        camera: &OrbitCamera,
        time: GameTime,
    ) -> Vec<(PassHandle, PassConstants)> {
        let light_dir = scene
            .lights
            .first()
            .map(|l| Vec3::from_array(l.direction))
            .unwrap_or(Vec3::NEG_Y);
        let shadow = directional_shadow(light_dir, self.config.scene_radius);
        let lights = scene.light_array();

        let fill = |view: PassView| {
            let mut c = PassConstants::from_view(&view).with_shadow_transform(shadow.transform);
            c.total_time = time.total;
            c.delta_time = time.dt;
            c.ambient_light = scene.ambient;
            c.ssr = self.config.ssr;
            c.lights = lights;
            c
        };

        let (w, h) = self.size;
        let mut out = vec![(
            self.passes.main,
            fill(PassView {
                view: camera.view(),
                proj: camera.proj(),
                eye: camera.position(),
                near: camera.near(),
                far: camera.far(),
                width: w,
                height: h,
            }),
        )];

        let cube = self.config.cube_map_size;
        let center = self.config.cube_center;
        for (pass, view) in self.passes.cube_faces.iter().zip(cube_face_views(center)) {
            out.push((
                *pass,
                fill(PassView {
                    view,
                    proj: cube_face_proj(CUBE_NEAR, CUBE_FAR),
                    eye: center,
                    near: CUBE_NEAR,
                    far: CUBE_FAR,
                    width: cube,
                    height: cube,
                }),
            ));
        }

        let size = self.config.shadow_map_size;
        out.push((
            self.passes.shadow,
            fill(PassView {
                view: shadow.view,
                proj: shadow.proj,
                eye: shadow.eye,
                near: shadow.near,
                far: shadow.far,
                width: size,
                height: size,
            }),
        ));
        out
    }

    /// Records, submits and presents the frame acquired by the last
    /// [`Renderer::update`].
    pub fn draw<B: Backend + ?Sized>(&mut self, backend: &mut B, scene: &Scene) -> GpuResult<()> {
        let status = backend.begin_frame()?;
        let cube_clear = self.config.clear_color;

        let Self {
            ring,
            fence,
            passes,
            pipelines,
            targets,
            tables,
            back_buffers,
            back_buffer_index,
            size,
            ..
        } = self;

        let frame = ring.current_mut();
        frame.commands.reset();

        if status == FrameStatus::Skip {
            log::warn!("renderer: back buffer unavailable, frame skipped");
            frame.commands.close();
            let value = fence.signal(backend)?;
            ring.mark_submitted(value);
            return Ok(());
        }

        let offset = |pass: PassHandle| frame.pass_constants.byte_offset(pass.index()) as u32;
        let offsets = PassOffsets {
            main: offset(passes.main),
            cube_faces: passes.cube_faces.map(offset),
            shadow: offset(passes.shadow),
        };
        let globals = frame.globals;
        let list = &mut frame.commands;

        // ── shadow ───────────────────────────────────────────────────────
        targets.shadow.begin(list);
        list.set_pipeline(pipelines.shadow);
        list.set_table(0, globals, Some(offsets.shadow));
        for layer in RenderLayer::ORDER.into_iter().filter(|l| l.casts_shadow()) {
            draw_items(list, scene, scene.items_in(layer));
        }
        targets.shadow.end(list);

        // ── dynamic cube map ─────────────────────────────────────────────
        for (face, &face_offset) in offsets.cube_faces.iter().enumerate() {
            targets.cube.begin_face(list, face as u32, cube_clear);
            list.set_table(0, globals, Some(face_offset));
            list.set_table(1, tables.cube_pass, None);
            for layer in RenderLayer::ORDER {
                draw_layer(list, scene, pipelines, layer, |i| i.in_reflections);
            }
            targets.cube.end_face(list);
        }
        targets.cube.finish(list);

        // ── main ─────────────────────────────────────────────────────────
        targets.depth.transition_to(list, ResourceState::DepthWrite);
        let color = targets.scene_color.attachment(list);
        list.begin_render_pass(
            "main",
            Some(color),
            Some(DepthAttachment {
                texture: targets.depth.texture().id(),
                layer: 0,
                clear: Some(1.0),
            }),
        );
        list.set_viewport_scissor(Viewport::full(size.0, size.1), ScissorRect::full(size.0, size.1));
        list.set_table(0, globals, Some(offsets.main));
        list.set_table(1, tables.main_pass, None);
        for layer in RenderLayer::ORDER {
            draw_layer(list, scene, pipelines, layer, |_| true);
        }
        list.end_render_pass();
        targets.scene_color.finish(list);

        // ── hi-z + ssr ───────────────────────────────────────────────────
        targets.hiz.record(
            list,
            targets.depth.tracked_mut(),
            pipelines.hiz_first,
            pipelines.hiz_reduce,
        );

        targets.ssr.begin(list);
        list.set_pipeline(pipelines.ssr);
        list.set_table(0, globals, Some(offsets.main));
        list.set_table(1, tables.ssr_inputs, None);
        list.draw_fullscreen();
        targets.ssr.end(list);

        // ── composite to back buffer ─────────────────────────────────────
        let back = &mut back_buffers[*back_buffer_index];
        back.transition_to(list, ResourceState::RenderTarget);
        list.begin_render_pass(
            "composite",
            Some(ColorAttachment {
                texture: back.id(),
                layer: 0,
                clear: Some([0.0, 0.0, 0.0, 1.0]),
            }),
            None,
        );
        list.set_viewport_scissor(Viewport::full(size.0, size.1), ScissorRect::full(size.0, size.1));
        list.set_pipeline(pipelines.composite);
        list.set_table(0, tables.composite_inputs, None);
        list.draw_fullscreen();
        list.end_render_pass();
        back.transition_to(list, ResourceState::Present);

        list.close();
        backend.execute(list)?;
        backend.present()?;
        *back_buffer_index = (*back_buffer_index + 1) % back_buffers.len();

        let value = fence.signal(backend)?;
        ring.mark_submitted(value);
        Ok(())
    }

    /// Drains the queue and releases every GPU object.
    pub fn destroy<B: Backend + ?Sized>(mut self, backend: &mut B) -> GpuResult<()> {
        self.flush(backend)?;
        for frame in self.ring.into_resources() {
            frame.destroy(backend);
        }
        for table in [
            self.tables.cube_pass,
            self.tables.main_pass,
            self.tables.ssr_inputs,
            self.tables.composite_inputs,
        ] {
            backend.destroy_table(table);
        }
        let t = &self.targets;
        t.depth.release(backend);
        t.cube.release(backend);
        for id in [
            t.shadow.texture().id(),
            t.fallback_cube.texture().id(),
            t.brdf.texture().id(),
            t.scene_color.texture().id(),
            t.ssr.texture().id(),
            t.hiz.texture().id(),
        ] {
            backend.destroy_texture(id);
        }
        Ok(())
    }
}

fn draw_layer(
    list: &mut CommandList,
    scene: &Scene,
    pipelines: &Pipelines,
    layer: RenderLayer,
    keep: impl Fn(&RenderItem) -> bool,
) {
    let mut items = scene.items_in(layer).filter(|i| keep(i)).peekable();
    if items.peek().is_none() {
        return;
    }
    list.set_pipeline(pipelines.layer(layer));
    draw_items(list, scene, items);
}

fn draw_items<'a>(
    list: &mut CommandList,
    scene: &Scene,
    items: impl Iterator<Item = &'a RenderItem>,
) {
    for item in items {
        if item.instances.is_empty() {
            continue;
        }
        let mesh = scene.geometries[item.geometry].mesh;
        let s = item.submesh;
        list.draw_indexed(
            mesh,
            s.start_index..s.start_index + s.index_count,
            s.base_vertex,
            item.instance_range(),
        );
    }
}

fn scene_textures_table<B: Backend + ?Sized>(
    backend: &mut B,
    label: &str,
    targets: &Targets,
    environment: TextureId,
) -> GpuResult<TableId> {
    backend.create_table(&TableDesc {
        label: label.to_string(),
        entries: vec![
            Binding::Texture {
                texture: targets.shadow.texture().id(),
                view: TextureView::Depth,
            },
            Binding::Texture {
                texture: environment,
                view: TextureView::Cube,
            },
            Binding::Texture {
                texture: targets.brdf.texture().id(),
                view: TextureView::D2,
            },
            Binding::LinearSampler,
            Binding::ComparisonSampler,
        ],
    })
}

fn screen_tables<B: Backend + ?Sized>(
    backend: &mut B,
    targets: &Targets,
) -> GpuResult<(TableId, TableId)> {
    let ssr_inputs = backend.create_table(&TableDesc {
        label: "ssr inputs".into(),
        entries: vec![
            Binding::Texture {
                texture: targets.scene_color.texture().id(),
                view: TextureView::D2,
            },
            Binding::Texture {
                texture: targets.depth.texture().id(),
                view: TextureView::Depth,
            },
            Binding::Texture {
                texture: targets.hiz.texture().id(),
                view: TextureView::D2Unfilterable,
            },
            Binding::LinearSampler,
        ],
    })?;
    let composite_inputs = backend.create_table(&TableDesc {
        label: "composite inputs".into(),
        entries: vec![
            Binding::Texture {
                texture: targets.scene_color.texture().id(),
                view: TextureView::D2,
            },
            Binding::Texture {
                texture: targets.ssr.texture().id(),
                view: TextureView::D2,
            },
            Binding::LinearSampler,
        ],
    })?;
    Ok((ssr_inputs, composite_inputs))
}
