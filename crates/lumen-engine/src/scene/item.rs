use glam::Mat4;

use crate::frame::InstanceData;
use crate::upload::UploadBuffer;

use super::mesh::Submesh;

/// Draw bucket. Buckets are drawn in [`RenderLayer::ORDER`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RenderLayer {
    Opaque,
    OpaqueNoNormalMap,
    Sky,
    AlphaTested,
    Transparent,
}

impl RenderLayer {
    pub const ORDER: [RenderLayer; 5] = [
        RenderLayer::Opaque,
        RenderLayer::OpaqueNoNormalMap,
        RenderLayer::Sky,
        RenderLayer::AlphaTested,
        RenderLayer::Transparent,
    ];

    /// Layers rendered into the shadow map.
    pub fn casts_shadow(self) -> bool {
        matches!(
            self,
            RenderLayer::Opaque | RenderLayer::OpaqueNoNormalMap | RenderLayer::AlphaTested
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Instance {
    pub world: Mat4,
    pub tex_transform: Mat4,
    pub material: u32,
}

impl Instance {
    pub fn new(world: Mat4, material: u32) -> Self {
        Self {
            world,
            tex_transform: Mat4::IDENTITY,
            material,
        }
    }
}

/// One mesh range drawn with a list of instances.
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub name: String,
    /// Index into [`super::Scene::geometries`].
    pub geometry: usize,
    pub submesh: Submesh,
    pub layer: RenderLayer,
    pub instances: Vec<Instance>,
    /// Skipped while rendering the dynamic cube map (the object that shows
    /// the reflection).
    pub in_reflections: bool,
    /// First element of this item's instances in the frame's instance
    /// buffer. Set by [`super::Scene::write_instances`].
    pub instance_offset: u32,
}

impl RenderItem {
    pub fn new(
        name: impl Into<String>,
        geometry: usize,
        submesh: Submesh,
        layer: RenderLayer,
        instances: Vec<Instance>,
    ) -> Self {
        Self {
            name: name.into(),
            geometry,
            submesh,
            layer,
            instances,
            in_reflections: true,
            instance_offset: 0,
        }
    }

    pub fn instance_range(&self) -> std::ops::Range<u32> {
        self.instance_offset..self.instance_offset + self.instances.len() as u32
    }
}

/// Flattens the instances of `items` into `buffer`, back to back, and
/// records each item's offset.
pub(super) fn write_instances(items: &mut [RenderItem], buffer: &mut UploadBuffer<InstanceData>) -> u32 {
    let mut next = 0u32;
    for item in items {
        item.instance_offset = next;
        for inst in &item.instances {
            buffer.write(
                next as usize,
                &InstanceData::new(inst.world, inst.tex_transform, inst.material),
            );
            next += 1;
        }
    }
    next
}
