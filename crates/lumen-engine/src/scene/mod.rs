//! CPU-side scene state: meshes, materials, render items, camera.

mod camera;
mod item;
mod material;
mod mesh;

pub use camera::{cube_face_proj, cube_face_views, OrbitCamera};
pub use item::{Instance, RenderItem, RenderLayer};
pub use material::{Material, MaterialTable};
pub use mesh::{MeshGeometry, Submesh, Vertex};

use glam::Vec4;

use crate::frame::{InstanceData, LightData, MAX_LIGHTS};
use crate::upload::UploadBuffer;

#[derive(Debug)]
pub struct Scene {
    pub geometries: Vec<MeshGeometry>,
    pub materials: MaterialTable,
    pub items: Vec<RenderItem>,
    pub lights: Vec<LightData>,
    pub ambient: Vec4,
}

impl Scene {
    pub fn new(frames_in_flight: usize) -> Self {
        Self {
            geometries: Vec::new(),
            materials: MaterialTable::new(frames_in_flight),
            items: Vec::new(),
            lights: Vec::new(),
            ambient: Vec4::new(0.25, 0.25, 0.35, 1.0),
        }
    }

    pub fn add_geometry(&mut self, geometry: MeshGeometry) -> usize {
        self.geometries.push(geometry);
        self.geometries.len() - 1
    }

    /// Total instances across all items; sizes the per-frame instance buffer.
    pub fn instance_count(&self) -> usize {
        self.items.iter().map(|i| i.instances.len()).sum()
    }

    /// Writes every instance into `buffer` and updates item offsets.
    pub fn write_instances(&mut self, buffer: &mut UploadBuffer<InstanceData>) -> u32 {
        item::write_instances(&mut self.items, buffer)
    }

    /// Lights padded to the fixed shader array.
    pub fn light_array(&self) -> [LightData; MAX_LIGHTS] {
        if self.lights.len() > MAX_LIGHTS {
            log::warn!(
                "scene has {} lights; only the first {MAX_LIGHTS} are used",
                self.lights.len()
            );
        }
        let mut out = [LightData {
            strength: [0.0; 3],
            ..LightData::default()
        }; MAX_LIGHTS];
        for (dst, src) in out.iter_mut().zip(&self.lights) {
            *dst = *src;
        }
        out
    }

    pub fn items_in(&self, layer: RenderLayer) -> impl Iterator<Item = &RenderItem> {
        self.items.iter().filter(move |i| i.layer == layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Completion, HeadlessBackend};
    use crate::resource::{Handle, MeshId};
    use crate::upload::ElementKind;
    use glam::{Mat4, Vec3};

    fn item(name: &str, n: usize) -> RenderItem {
        let sub = Submesh {
            index_count: 36,
            start_index: 0,
            base_vertex: 0,
        };
        let instances = (0..n)
            .map(|i| Instance::new(Mat4::from_translation(Vec3::X * i as f32), 0))
            .collect();
        RenderItem::new(name, 0, sub, RenderLayer::Opaque, instances)
    }

    #[test]
    fn instances_are_flattened_contiguously() {
        let mut backend = HeadlessBackend::new(4, 4, Completion::Immediate);
        let mut scene = Scene::new(3);
        scene.geometries.push(MeshGeometry::upload(&mut backend, "m", &[], &[], &[]).unwrap());
        scene.items = vec![item("a", 2), item("b", 0), item("c", 3)];
        assert_eq!(scene.geometries[0].mesh, MeshId::from_raw(0));

        let mut buf = UploadBuffer::new(&mut backend, "inst", scene.instance_count(), ElementKind::Structured)
            .unwrap();
        assert_eq!(scene.write_instances(&mut buf), 5);

        let ranges: Vec<_> = scene.items.iter().map(RenderItem::instance_range).collect();
        assert_eq!(ranges, [0..2, 2..2, 2..5]);
        assert_eq!(buf.read(4).world(), Mat4::from_translation(Vec3::X * 2.0));
    }

    #[test]
    fn light_array_pads_with_dark_lights() {
        let mut scene = Scene::new(3);
        scene.lights.push(LightData::default());
        let lights = scene.light_array();
        assert_eq!(lights[0], LightData::default());
        assert_eq!(lights[1].strength, [0.0; 3]);
    }
}
