use glam::{Mat4, Vec3, Vec4};

use crate::frame::MaterialData;
use crate::upload::UploadBuffer;

/// Surface parameters of one material.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub diffuse_albedo: Vec4,
    pub fresnel_r0: Vec3,
    pub roughness: f32,
    pub transform: Mat4,
    pub diffuse_map_index: u32,
    pub normal_map_index: u32,
}

impl Material {
    pub fn new(name: impl Into<String>, diffuse_albedo: Vec4, fresnel_r0: Vec3, roughness: f32) -> Self {
        Self {
            name: name.into(),
            diffuse_albedo,
            fresnel_r0,
            roughness,
            transform: Mat4::IDENTITY,
            diffuse_map_index: 0,
            normal_map_index: 0,
        }
    }

    fn data(&self) -> MaterialData {
        MaterialData::new(
            self.diffuse_albedo,
            self.fresnel_r0,
            self.roughness,
            self.transform,
            self.diffuse_map_index,
            self.normal_map_index,
        )
    }
}

#[derive(Debug)]
struct Entry {
    material: Material,
    /// Frame slots that still hold an outdated copy.
    frames_dirty: usize,
}

/// Materials addressed by index, with per-slot dirty counting.
///
/// Every frame slot has its own material buffer, so a change has to be
/// written once per slot before it is clean again.
#[derive(Debug)]
pub struct MaterialTable {
    entries: Vec<Entry>,
    frames_in_flight: usize,
}

impl MaterialTable {
    pub fn new(frames_in_flight: usize) -> Self {
        Self {
            entries: Vec::new(),
            frames_in_flight,
        }
    }

    /// Changes how many slots a material must be written to, and marks
    /// every material dirty in all of them.
    pub fn set_frames_in_flight(&mut self, frames_in_flight: usize) {
        self.frames_in_flight = frames_in_flight;
        for entry in &mut self.entries {
            entry.frames_dirty = frames_in_flight;
        }
    }

    /// Adds a material and returns its buffer index.
    pub fn add(&mut self, material: Material) -> u32 {
        self.entries.push(Entry {
            material,
            frames_dirty: self.frames_in_flight,
        });
        self.entries.len() as u32 - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .position(|e| e.material.name == name)
            .map(|i| i as u32)
    }

    pub fn get(&self, index: u32) -> Option<&Material> {
        self.entries.get(index as usize).map(|e| &e.material)
    }

    /// Mutates a material and marks it dirty in every slot.
    pub fn modify(&mut self, index: u32, f: impl FnOnce(&mut Material)) {
        let Some(entry) = self.entries.get_mut(index as usize) else { return };
        f(&mut entry.material);
        entry.frames_dirty = self.frames_in_flight;
    }

    /// Writes dirty materials into this slot's buffer. Returns how many were
    /// written.
    pub fn upload(&mut self, buffer: &mut UploadBuffer<MaterialData>) -> usize {
        let mut written = 0;
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if entry.frames_dirty == 0 {
                continue;
            }
            buffer.write(i, &entry.material.data());
            entry.frames_dirty -= 1;
            written += 1;
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Completion, HeadlessBackend};
    use crate::upload::ElementKind;

    #[test]
    fn changed_material_is_written_once_per_slot() {
        let mut backend = HeadlessBackend::new(4, 4, Completion::Immediate);
        let mut buf =
            UploadBuffer::new(&mut backend, "materials", 2, ElementKind::Structured).unwrap();

        let mut table = MaterialTable::new(3);
        table.add(Material::new("brick", Vec4::ONE, Vec3::splat(0.02), 0.3));
        let water = table.add(Material::new("water", Vec4::ONE, Vec3::splat(0.1), 0.0));

        assert_eq!(table.upload(&mut buf), 2);
        assert_eq!(table.upload(&mut buf), 2);
        assert_eq!(table.upload(&mut buf), 2);
        assert_eq!(table.upload(&mut buf), 0);

        table.modify(water, |m| m.roughness = 0.5);
        let counts: Vec<_> = (0..4).map(|_| table.upload(&mut buf)).collect();
        assert_eq!(counts, [1, 1, 1, 0]);
        assert_eq!(buf.read(1).roughness, 0.5);
    }

    #[test]
    fn raising_slot_count_rewrites_every_material() {
        let mut backend = HeadlessBackend::new(4, 4, Completion::Immediate);
        let mut buf =
            UploadBuffer::new(&mut backend, "materials", 1, ElementKind::Structured).unwrap();

        let mut table = MaterialTable::new(2);
        table.add(Material::new("brick", Vec4::ONE, Vec3::splat(0.02), 0.3));
        table.set_frames_in_flight(3);

        let counts: Vec<_> = (0..4).map(|_| table.upload(&mut buf)).collect();
        assert_eq!(counts, [1, 1, 1, 0]);
    }
}
