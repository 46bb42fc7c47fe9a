use crate::backend::{Backend, Binding, BindingKind, TableDesc};
use crate::command::CommandList;
use crate::error::GpuResult;
use crate::resource::TableId;
use crate::upload::{element_stride, ElementKind, UploadBuffer};

use super::constants::{InstanceData, MaterialData, PassConstants};

/// Element counts for one frame slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameSizes {
    pub passes: usize,
    pub instances: usize,
    pub materials: usize,
}

/// Layout of the per-frame global table (group 0 of every scene pipeline).
pub fn globals_layout() -> [BindingKind; 3] {
    [
        BindingKind::UniformDynamic {
            size: element_stride(ElementKind::Constant, size_of::<PassConstants>()) as u64,
        },
        BindingKind::Storage,
        BindingKind::Storage,
    ]
}

/// Everything one in-flight frame writes: its command list and its private
/// upload buffers.
pub struct FrameResource {
    pub commands: CommandList,
    pub pass_constants: UploadBuffer<PassConstants>,
    pub instances: UploadBuffer<InstanceData>,
    pub materials: UploadBuffer<MaterialData>,
    /// Binds the three buffers above as group 0.
    pub globals: TableId,
}

impl FrameResource {
    pub fn new<B: Backend + ?Sized>(
        backend: &mut B,
        index: usize,
        sizes: FrameSizes,
    ) -> GpuResult<Self> {
        let pass_constants = UploadBuffer::new(
            backend,
            &format!("frame {index} pass constants"),
            sizes.passes,
            ElementKind::Constant,
        )?;
        let instances = UploadBuffer::new(
            backend,
            &format!("frame {index} instances"),
            sizes.instances.max(1),
            ElementKind::Structured,
        )?;
        let materials = UploadBuffer::new(
            backend,
            &format!("frame {index} materials"),
            sizes.materials.max(1),
            ElementKind::Structured,
        )?;

        let globals = backend.create_table(&TableDesc {
            label: format!("frame {index} globals"),
            entries: vec![
                Binding::UniformDynamic {
                    buffer: pass_constants.buffer(),
                    size: pass_constants.stride() as u64,
                },
                Binding::Storage {
                    buffer: instances.buffer(),
                },
                Binding::Storage {
                    buffer: materials.buffer(),
                },
            ],
        })?;

        // Closed so the first acquire can reset it like any other frame.
        let mut commands = CommandList::new(format!("frame {index}"));
        commands.close();

        Ok(Self {
            commands,
            pass_constants,
            instances,
            materials,
            globals,
        })
    }

    /// Pushes all staged uploads to the GPU.
    pub fn flush_uploads<B: Backend + ?Sized>(&mut self, backend: &mut B) -> GpuResult<()> {
        self.pass_constants.flush(backend)?;
        self.instances.flush(backend)?;
        self.materials.flush(backend)
    }

    /// Releases the slot's GPU objects. Only call once the GPU is idle.
    pub fn destroy<B: Backend + ?Sized>(self, backend: &mut B) {
        backend.destroy_table(self.globals);
        backend.destroy_buffer(self.pass_constants.buffer());
        backend.destroy_buffer(self.instances.buffer());
        backend.destroy_buffer(self.materials.buffer());
    }
}
