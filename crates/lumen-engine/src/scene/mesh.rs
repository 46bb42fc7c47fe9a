use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::backend::Backend;
use crate::error::{ErrorCode, GpuError, GpuResult};
use crate::resource::MeshId;

/// Vertex layout shared by every mesh pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2], tangent: [f32; 3]) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent,
        }
    }
}

/// Index range of one object inside a shared vertex/index buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Submesh {
    pub index_count: u32,
    pub start_index: u32,
    pub base_vertex: i32,
}

/// GPU mesh plus its named sub-ranges.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    pub name: String,
    pub mesh: MeshId,
    submeshes: HashMap<String, Submesh>,
}

impl MeshGeometry {
    /// Uploads vertex/index data. `parts` name consecutive ranges of
    /// `indices`, each with its own base vertex.
    pub fn upload<B: Backend + ?Sized>(
        backend: &mut B,
        name: &str,
        vertices: &[Vertex],
        indices: &[u32],
        parts: &[(&str, Submesh)],
    ) -> GpuResult<Self> {
        for (part, sub) in parts {
            let end = sub.start_index as usize + sub.index_count as usize;
            if end > indices.len() {
                return Err(GpuError::new(ErrorCode::Validation, "upload mesh").with_detail(
                    format!("`{name}.{part}` ends at index {end} of {}", indices.len()),
                ));
            }
        }

        let mesh = backend.create_mesh(name, vertices, indices)?;
        Ok(Self {
            name: name.to_string(),
            mesh,
            submeshes: parts
                .iter()
                .map(|(part, sub)| (part.to_string(), *sub))
                .collect(),
        })
    }

    pub fn submesh(&self, part: &str) -> Option<Submesh> {
        self.submeshes.get(part).copied()
    }
}
