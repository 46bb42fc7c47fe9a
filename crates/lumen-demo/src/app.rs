use glam::{Mat4, Quat, Vec3, Vec4};
use lumen_engine::backend::Backend;
use lumen_engine::core::{App, AppControl};
use lumen_engine::error::{ErrorCode, GpuError, GpuResult};
use lumen_engine::frame::LightData;
use lumen_engine::input::{InputEvent, Key, KeyState};
use lumen_engine::render::{Renderer, RendererConfig, ShaderLibrary};
use lumen_engine::scene::{
    Instance, Material, MeshGeometry, OrbitCamera, RenderItem, RenderLayer, Scene,
};
use lumen_engine::time::GameTime;

use crate::geometry::{cuboid, grid, merge, quad, sphere};

/// Reflective sphere at the cube-map capture point, orbited by a box, on a
/// floor with columns, a lattice crate and a glass pane.
pub struct DemoApp {
    shaders: ShaderLibrary,
    config: RendererConfig,
    camera: OrbitCamera,
    scene: Option<Scene>,
    renderer: Option<Renderer>,
    orbiter: usize,
    glass: u32,
}

impl DemoApp {
    pub fn new(shaders: ShaderLibrary, config: RendererConfig) -> Self {
        Self {
            shaders,
            config,
            camera: OrbitCamera::default(),
            scene: None,
            renderer: None,
            orbiter: 0,
            glass: 0,
        }
    }

    fn build_scene(&mut self, backend: &mut dyn Backend) -> GpuResult<Scene> {
        let mut scene = Scene::new(self.config.frames_in_flight);

        let (mesh, parts) = merge(&[
            ("box", cuboid(1.0, 1.0, 1.0)),
            ("grid", grid(20.0, 30.0, 60, 40)),
            ("sphere", sphere(0.5, 40, 20)),
            ("quad", quad(1.0, 1.0)),
        ]);
        let shapes = MeshGeometry::upload(backend, "shapes", &mesh.vertices, &mesh.indices, &parts)?;
        let part = |name: &str| {
            shapes.submesh(name).ok_or_else(|| {
                GpuError::new(ErrorCode::Internal, "build demo scene")
                    .with_detail(format!("no `{name}` part in the shapes mesh"))
            })
        };
        let (cube, floor, ball, pane) = (part("box")?, part("grid")?, part("sphere")?, part("quad")?);
        let shapes = scene.add_geometry(shapes);

        let materials = &mut scene.materials;
        let bricks = materials.add(Material::new(
            "bricks",
            Vec4::new(0.75, 0.45, 0.35, 1.0),
            Vec3::splat(0.02),
            0.6,
        ));
        let tile = materials.add(Material::new(
            "tile",
            Vec4::new(0.9, 0.9, 0.9, 1.0),
            Vec3::splat(0.2),
            0.1,
        ));
        let mirror = materials.add(Material::new(
            "mirror",
            Vec4::new(0.0, 0.0, 0.1, 1.0),
            Vec3::splat(0.98),
            0.1,
        ));
        let lattice = materials.add(Material::new(
            "lattice",
            Vec4::new(0.6, 0.55, 0.4, 1.0),
            Vec3::splat(0.05),
            0.4,
        ));
        let glass = materials.add(Material::new(
            "glass",
            Vec4::new(0.6, 0.8, 1.0, 0.4),
            Vec3::splat(0.1),
            0.0,
        ));
        let sky = materials.add(Material::new("sky", Vec4::ONE, Vec3::splat(0.1), 1.0));

        let items = &mut scene.items;
        items.push(RenderItem::new(
            "sky",
            shapes,
            cube,
            RenderLayer::Sky,
            vec![Instance::new(Mat4::from_scale(Vec3::splat(10.0)), sky)],
        ));

        items.push(RenderItem::new(
            "floor",
            shapes,
            floor,
            RenderLayer::Opaque,
            vec![Instance {
                tex_transform: Mat4::from_scale(Vec3::new(8.0, 8.0, 1.0)),
                ..Instance::new(Mat4::IDENTITY, tile)
            }],
        ));

        let columns = (0..5)
            .flat_map(|i| {
                let z = -10.0 + i as f32 * 5.0;
                [-5.0, 5.0].map(|x| {
                    Instance::new(
                        Mat4::from_scale_rotation_translation(
                            Vec3::new(1.0, 3.0, 1.0),
                            Quat::IDENTITY,
                            Vec3::new(x, 1.5, z),
                        ),
                        bricks,
                    )
                })
            })
            .collect();
        items.push(RenderItem::new("columns", shapes, cube, RenderLayer::Opaque, columns));

        let mut center = RenderItem::new(
            "mirror ball",
            shapes,
            ball,
            RenderLayer::OpaqueNoNormalMap,
            vec![Instance::new(
                Mat4::from_scale_rotation_translation(
                    Vec3::splat(2.0),
                    Quat::IDENTITY,
                    self.config.cube_center,
                ),
                mirror,
            )],
        );
        // It shows the cube map, so it must not be in it.
        center.in_reflections = false;
        items.push(center);

        self.orbiter = items.len();
        items.push(RenderItem::new(
            "orbiter",
            shapes,
            cube,
            RenderLayer::OpaqueNoNormalMap,
            vec![Instance::new(orbit(0.0, self.config.cube_center), bricks)],
        ));

        items.push(RenderItem::new(
            "crate",
            shapes,
            cube,
            RenderLayer::AlphaTested,
            vec![Instance::new(
                Mat4::from_scale_rotation_translation(
                    Vec3::splat(1.5),
                    Quat::IDENTITY,
                    Vec3::new(3.0, 0.75, -4.0),
                ),
                lattice,
            )],
        ));

        self.glass = glass;
        items.push(RenderItem::new(
            "glass",
            shapes,
            pane,
            RenderLayer::Transparent,
            vec![Instance::new(
                Mat4::from_scale_rotation_translation(
                    Vec3::new(4.0, 3.0, 1.0),
                    Quat::IDENTITY,
                    Vec3::new(-2.0, 1.5, 4.0),
                ),
                glass,
            )],
        ));

        scene.lights = vec![
            LightData {
                strength: [0.8, 0.8, 0.8],
                direction: [0.57735, -0.57735, 0.57735],
                ..LightData::default()
            },
            LightData {
                strength: [0.4, 0.4, 0.4],
                direction: [-0.57735, -0.57735, 0.57735],
                ..LightData::default()
            },
            LightData {
                strength: [0.2, 0.2, 0.2],
                direction: [0.0, -0.707, -0.707],
                ..LightData::default()
            },
        ];

        log::info!(
            "demo scene: {} items, {} instances, {} materials",
            scene.items.len(),
            scene.instance_count(),
            scene.materials.len()
        );
        Ok(scene)
    }
}

/// World matrix of the box circling `center` at `t` seconds.
fn orbit(t: f32, center: Vec3) -> Mat4 {
    let angle = 0.5 * t;
    let offset = Vec3::new(3.0 * angle.cos(), 0.0, 3.0 * angle.sin());
    Mat4::from_scale_rotation_translation(
        Vec3::splat(0.75),
        Quat::from_rotation_y(-angle),
        center + offset,
    )
}

impl App for DemoApp {
    fn init(&mut self, backend: &mut dyn Backend) -> GpuResult<()> {
        let mut scene = self.build_scene(backend)?;
        let renderer = Renderer::new(backend, &self.shaders, &mut scene, self.config.clone())?;
        let (w, h) = renderer.size();
        self.camera.set_aspect(w, h);
        self.scene = Some(scene);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn on_resize(&mut self, backend: &mut dyn Backend, width: u32, height: u32) -> GpuResult<()> {
        self.camera.set_aspect(width, height);
        match self.renderer.as_mut() {
            Some(renderer) => renderer.on_resize(backend, width, height),
            None => Ok(()),
        }
    }

    fn update(&mut self, backend: &mut dyn Backend, time: GameTime) -> GpuResult<()> {
        let (Some(scene), Some(renderer)) = (self.scene.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let center = self.config.cube_center;
        if let Some(instance) = scene.items[self.orbiter].instances.first_mut() {
            instance.world = orbit(time.total, center);
        }
        // Scroll the glass texture coordinates; re-uploaded once per slot.
        scene.materials.modify(self.glass, |m| {
            m.transform = Mat4::from_translation(Vec3::new(0.05 * time.total, 0.0, 0.0));
        });

        renderer.update(backend, scene, &self.camera, time)
    }

    fn draw(&mut self, backend: &mut dyn Backend) -> GpuResult<()> {
        match (self.scene.as_ref(), self.renderer.as_mut()) {
            (Some(scene), Some(renderer)) => renderer.draw(backend, scene),
            _ => Ok(()),
        }
    }

    fn on_input(&mut self, event: InputEvent) -> AppControl {
        match event {
            InputEvent::MouseDown { x, y, .. } => self.camera.on_mouse_down(x, y),
            InputEvent::MouseMove { buttons, x, y } => self.camera.on_mouse_move(buttons, x, y),
            InputEvent::Key {
                key: Key::Escape,
                state: KeyState::Pressed,
            } => return AppControl::Exit,
            _ => {}
        }
        AppControl::Continue
    }

    fn shutdown(&mut self, backend: &mut dyn Backend) -> GpuResult<()> {
        self.scene = None;
        match self.renderer.take() {
            Some(renderer) => renderer.destroy(backend),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_engine::backend::{Completion, HeadlessBackend};
    use lumen_engine::core::run_headless;

    use crate::shaders;

    #[test]
    fn runs_headless_and_presents_every_frame() {
        let mut backend = HeadlessBackend::new(320, 240, Completion::Immediate);
        let mut app = DemoApp::new(shaders::library(), RendererConfig::default());

        run_headless(&mut app, &mut backend, 5).unwrap();

        assert_eq!(backend.presents(), 5);
        assert!(app.renderer.is_none());
    }

    #[test]
    fn escape_exits_and_drags_orbit() {
        let mut app = DemoApp::new(shaders::library(), RendererConfig::default());
        let before = app.camera.position();

        app.on_input(InputEvent::MouseDown {
            buttons: lumen_engine::input::MouseButtons::LEFT,
            x: 0.0,
            y: 0.0,
        });
        let control = app.on_input(InputEvent::MouseMove {
            buttons: lumen_engine::input::MouseButtons::LEFT,
            x: 40.0,
            y: 0.0,
        });
        assert_eq!(control, AppControl::Continue);
        assert_ne!(app.camera.position(), before);

        let control = app.on_input(InputEvent::Key {
            key: Key::Escape,
            state: KeyState::Pressed,
        });
        assert_eq!(control, AppControl::Exit);
    }
}
