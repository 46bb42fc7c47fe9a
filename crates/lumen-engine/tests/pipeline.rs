//! Whole frames recorded by the renderer on the validating headless backend.

use lumen_engine::backend::{Backend, Completion, HeadlessBackend};
use lumen_engine::command::{Command, CommandList};
use lumen_engine::render::{Renderer, RendererConfig, ShaderLibrary};
use lumen_engine::scene::{
    Instance, Material, MeshGeometry, OrbitCamera, RenderItem, RenderLayer, Scene, Submesh, Vertex,
};
use lumen_engine::time::GameTime;

use glam::{Mat4, Vec3, Vec4};

const W: u32 = 64;
const H: u32 = 48;

fn shaders() -> ShaderLibrary {
    let mut lib = ShaderLibrary::new();
    for name in ShaderLibrary::REQUIRED {
        lib.insert(name, "// headless ignores shader text");
    }
    lib
}

fn quad_vertices() -> [Vertex; 4] {
    let n = [0.0, 0.0, 1.0];
    let t = [1.0, 0.0, 0.0];
    [
        Vertex::new([-0.5, -0.5, 0.0], n, [0.0, 1.0], t),
        Vertex::new([0.5, -0.5, 0.0], n, [1.0, 1.0], t),
        Vertex::new([0.5, 0.5, 0.0], n, [1.0, 0.0], t),
        Vertex::new([-0.5, 0.5, 0.0], n, [0.0, 0.0], t),
    ]
}

/// A scene of unit quads, one item per `(name, layer)`, one instance each.
fn quad_scene(backend: &mut HeadlessBackend, frames: usize, items: &[(&str, RenderLayer)]) -> Scene {
    let mut scene = Scene::new(frames);
    let quad = Submesh {
        index_count: 6,
        start_index: 0,
        base_vertex: 0,
    };
    let geometry = MeshGeometry::upload(
        backend,
        "quad",
        &quad_vertices(),
        &[0, 1, 2, 0, 2, 3],
        &[("quad", quad)],
    )
    .unwrap();
    let geo = scene.add_geometry(geometry);
    let mat = scene
        .materials
        .add(Material::new("grey", Vec4::splat(0.5), Vec3::splat(0.04), 0.5));

    scene.items = items
        .iter()
        .map(|&(name, layer)| {
            RenderItem::new(name, geo, quad, layer, vec![Instance::new(Mat4::IDENTITY, mat)])
        })
        .collect();
    scene
}

/// Four items: one per interesting layer, one hidden from reflections.
fn scene(backend: &mut HeadlessBackend, frames: usize) -> Scene {
    let mut scene = quad_scene(
        backend,
        frames,
        &[
            ("floor", RenderLayer::Opaque),
            ("ball", RenderLayer::OpaqueNoNormalMap),
            ("sky", RenderLayer::Sky),
            ("glass", RenderLayer::Transparent),
        ],
    );
    scene.items[1].in_reflections = false;
    scene
}

struct Harness {
    backend: HeadlessBackend,
    scene: Scene,
    camera: OrbitCamera,
    renderer: Renderer,
    frame: u64,
}

impl Harness {
    fn new(config: RendererConfig) -> Self {
        let mut backend = HeadlessBackend::new(W, H, Completion::Immediate);
        let scene = scene(&mut backend, config.frames_in_flight);
        Self::with_scene(backend, scene, config)
    }

    fn with_scene(mut backend: HeadlessBackend, mut scene: Scene, config: RendererConfig) -> Self {
        let renderer = Renderer::new(&mut backend, &shaders(), &mut scene, config).unwrap();
        Self {
            backend,
            scene,
            camera: OrbitCamera::default(),
            renderer,
            frame: 0,
        }
    }

    /// Runs one update/draw iteration and returns the slot it used.
    fn frame(&mut self) -> usize {
        let time = GameTime {
            dt: 1.0 / 60.0,
            total: (self.frame + 1) as f32 / 60.0,
            frame_index: self.frame,
        };
        self.frame += 1;
        self.renderer
            .update(&mut self.backend, &mut self.scene, &self.camera, time)
            .unwrap();
        let slot = self.renderer.current_slot();
        self.renderer.draw(&mut self.backend, &self.scene).unwrap();
        slot
    }
}

fn count(list: &CommandList, pred: impl Fn(&Command) -> bool) -> usize {
    list.commands().iter().filter(|c| pred(c)).count()
}

/// First instance of every indexed draw inside the render pass `label`
/// (the first one, for the repeated cube faces).
fn pass_draw_offsets(list: &CommandList, label: &str) -> Vec<u32> {
    list.commands()
        .iter()
        .skip_while(|c| !matches!(c, Command::BeginRenderPass { label: l, .. } if *l == label))
        .take_while(|c| !matches!(c, Command::EndRenderPass))
        .filter_map(|c| match c {
            Command::DrawIndexed { instances, .. } => Some(instances.start),
            _ => None,
        })
        .collect()
}

fn composite_target(list: &CommandList) -> Option<lumen_engine::resource::TextureId> {
    list.commands().iter().find_map(|c| match c {
        Command::BeginRenderPass {
            label: "composite",
            color: Some(color),
            ..
        } => Some(color.texture),
        _ => None,
    })
}

#[test]
fn start_up_generates_the_brdf_lut_once() {
    let h = Harness::new(RendererConfig::default());
    let lists = h.backend.executed();
    assert_eq!(lists.len(), 1);
    assert_eq!(
        count(&lists[0], |c| matches!(c, Command::BeginRenderPass { label: "brdf lut", .. })),
        1
    );
    // Start-up work is flushed before the first frame.
    assert_eq!(h.renderer.fence().current_value(), 1);
    assert_eq!(h.renderer.fence().completed_value(), 1);
}

#[test]
fn frames_rotate_slots_and_alternate_back_buffers() {
    let mut h = Harness::new(RendererConfig::default());
    let slots: Vec<usize> = (0..6).map(|_| h.frame()).collect();
    assert_eq!(slots, [1, 2, 0, 1, 2, 0]);

    assert_eq!(h.backend.presents(), 6);
    assert_eq!(h.renderer.fence().current_value(), 7);

    let lists = &h.backend.executed()[1..];
    assert_eq!(lists.len(), 6);
    for (i, list) in lists.iter().enumerate() {
        assert_eq!(composite_target(list), Some(h.backend.back_buffer(i % 2)));
    }
}

#[test]
fn one_frame_records_every_pass() {
    let mut h = Harness::new(RendererConfig::default());
    h.frame();
    let list = h.backend.executed().last().unwrap();

    let passes: Vec<&str> = list
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::BeginRenderPass { label, .. } | Command::BeginComputePass { label } => {
                Some(*label)
            }
            _ => None,
        })
        .collect();
    let mut expected = vec!["shadow"];
    expected.extend(["cube face"; 6]);
    expected.extend(["main", "hi-z", "ssr", "composite"]);
    assert_eq!(passes, expected);

    // shadow: floor + ball; cube faces: floor + sky + glass; main: all four.
    let draws = count(list, |c| matches!(c, Command::DrawIndexed { .. }));
    assert_eq!(draws, 2 + 6 * 3 + 4);
    assert_eq!(count(list, |c| matches!(c, Command::Draw { .. })), 2);

    // 64x48 -> mips 64, 32, 16, 8, 4, 2, 1.
    assert_eq!(count(list, |c| matches!(c, Command::Dispatch { .. })), 7);
}

#[test]
fn skipped_frame_signals_without_presenting() {
    let mut h = Harness::new(RendererConfig::default());
    h.backend.skip_next_frames(1);
    for _ in 0..3 {
        h.frame();
    }
    assert_eq!(h.backend.presents(), 2);
    // one-off + two real frames
    assert_eq!(h.backend.executed().len(), 3);
    // The skipped slot still got a fence value so the ring keeps turning.
    assert_eq!(h.renderer.fence().current_value(), 4);
    assert_eq!(h.renderer.back_buffer_index(), 0);
}

#[test]
fn resize_rebuilds_screen_targets_and_restarts_back_buffers() {
    let mut h = Harness::new(RendererConfig::default());
    h.frame();
    assert_eq!(h.renderer.back_buffer_index(), 1);

    let fence_before = h.renderer.fence().current_value();
    h.renderer.on_resize(&mut h.backend, 0, 0).unwrap();
    h.renderer.on_resize(&mut h.backend, W, H).unwrap();
    assert_eq!(h.renderer.fence().current_value(), fence_before, "ignored resizes flushed");

    h.renderer.on_resize(&mut h.backend, 128, 96).unwrap();
    assert_eq!(h.renderer.size(), (128, 96));
    assert_eq!(h.renderer.back_buffer_index(), 0);
    let back = h.backend.back_buffer(0);
    assert_eq!(h.backend.texture_desc(back).unwrap().width, 128);

    for _ in 0..4 {
        h.frame();
    }
    assert_eq!(h.backend.presents(), 4);
    let list = h.backend.executed().last().unwrap();
    // 128x96 -> 8 mips.
    assert_eq!(count(list, |c| matches!(c, Command::Dispatch { .. })), 8);
}

#[test]
fn two_frames_in_flight() {
    let config = RendererConfig {
        frames_in_flight: 2,
        ..RendererConfig::default()
    };
    let mut h = Harness::new(config);
    let slots: Vec<usize> = (0..4).map(|_| h.frame()).collect();
    assert_eq!(slots, [1, 0, 1, 0]);
    assert_eq!(h.renderer.frames_in_flight(), 2);
}

#[test]
fn destroy_releases_every_target() {
    let mut h = Harness::new(RendererConfig::default());
    h.frame();
    h.renderer.on_resize(&mut h.backend, 32, 32).unwrap();
    h.frame();

    let Harness {
        mut backend,
        renderer,
        ..
    } = h;
    renderer.destroy(&mut backend).unwrap();
    // Only the two back buffers remain.
    assert_eq!(backend.live_textures(), 2);
}

#[test]
fn layers_are_drawn_in_order_whatever_the_insertion_order() {
    let mut backend = HeadlessBackend::new(W, H, Completion::Immediate);
    let scene = quad_scene(
        &mut backend,
        3,
        &[
            ("glass", RenderLayer::Transparent),
            ("crate", RenderLayer::AlphaTested),
            ("floor", RenderLayer::Opaque),
        ],
    );
    let mut h = Harness::with_scene(backend, scene, RendererConfig::default());
    h.frame();
    let list = h.backend.executed().last().unwrap();

    // Instances are laid out in insertion order: glass 0, crate 1, floor 2.
    assert_eq!(pass_draw_offsets(list, "main"), [2, 1, 0]);
    assert_eq!(pass_draw_offsets(list, "cube face"), [2, 1, 0]);
    // Transparent geometry never reaches the shadow map.
    assert_eq!(pass_draw_offsets(list, "shadow"), [2, 1]);
}

#[test]
fn every_slot_gets_materials_when_the_scene_expects_fewer_slots() {
    let mut backend = HeadlessBackend::new(W, H, Completion::Immediate);
    let scene = scene(&mut backend, 2);
    let mut h = Harness::with_scene(backend, scene, RendererConfig::default());
    for _ in 0..3 {
        h.frame();
    }

    for slot in 0..h.renderer.frames_in_flight() {
        let buffer = h.renderer.material_buffer(slot).unwrap();
        let bytes = h.backend.buffer_bytes(buffer).unwrap();
        assert!(
            bytes.iter().any(|&b| b != 0),
            "slot {slot} never received its materials"
        );
    }
}
