//! Literal mesh data for the demo scene.

use glam::Vec3;
use lumen_engine::scene::{Submesh, Vertex};

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Unit-size face quad: normal `n`, `t` along +u. Counter-clockwise seen
/// from the side `n` points to.
fn face(out: &mut MeshData, center: Vec3, n: Vec3, t: Vec3, half: Vec3) {
    let b = n.cross(t);
    let (tx, bx) = (t * half, b * half);
    let base = out.vertices.len() as u32;
    let corners = [
        (center - tx - bx, [0.0, 1.0]),
        (center + tx - bx, [1.0, 1.0]),
        (center + tx + bx, [1.0, 0.0]),
        (center - tx + bx, [0.0, 0.0]),
    ];
    for (p, uv) in corners {
        out.vertices
            .push(Vertex::new(p.to_array(), n.to_array(), uv, t.to_array()));
    }
    out.indices
        .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// Axis-aligned box centred at the origin; 24 vertices so every face has
/// its own normal.
pub fn cuboid(width: f32, height: f32, depth: f32) -> MeshData {
    let h = Vec3::new(width, height, depth) * 0.5;
    let faces = [
        (Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_X, Vec3::Z),
        (Vec3::Y, Vec3::X),
        (Vec3::NEG_Y, Vec3::X),
        (Vec3::Z, Vec3::X),
        (Vec3::NEG_Z, Vec3::NEG_X),
    ];
    let mut out = MeshData::default();
    for (n, t) in faces {
        face(&mut out, n * h, n, t, h);
    }
    out
}

/// Vertical quad facing +Z.
pub fn quad(width: f32, height: f32) -> MeshData {
    let mut out = MeshData::default();
    face(
        &mut out,
        Vec3::ZERO,
        Vec3::Z,
        Vec3::X,
        Vec3::new(width, height, 0.0) * 0.5,
    );
    out
}

/// `rows x cols` vertex grid in the XZ plane, facing +Y.
pub fn grid(width: f32, depth: f32, rows: u32, cols: u32) -> MeshData {
    assert!(rows >= 2 && cols >= 2, "grid needs at least 2x2 vertices");
    let (dx, dz) = (width / (cols - 1) as f32, depth / (rows - 1) as f32);

    let mut out = MeshData::default();
    for i in 0..rows {
        for j in 0..cols {
            let x = -0.5 * width + j as f32 * dx;
            let z = 0.5 * depth - i as f32 * dz;
            let uv = [j as f32 / (cols - 1) as f32, i as f32 / (rows - 1) as f32];
            out.vertices
                .push(Vertex::new([x, 0.0, z], [0.0, 1.0, 0.0], uv, [1.0, 0.0, 0.0]));
        }
    }
    for i in 0..rows - 1 {
        for j in 0..cols - 1 {
            let a = i * cols + j;
            let (b, c, d) = (a + 1, a + cols, a + cols + 1);
            out.indices.extend([a, b, d, a, d, c]);
        }
    }
    out
}

/// UV sphere; poles on the Y axis.
pub fn sphere(radius: f32, slices: u32, stacks: u32) -> MeshData {
    use std::f32::consts::{PI, TAU};

    let mut out = MeshData::default();
    for i in 0..=stacks {
        let phi = i as f32 * PI / stacks as f32;
        for j in 0..=slices {
            let theta = j as f32 * TAU / slices as f32;
            let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            let t = Vec3::new(-theta.sin(), 0.0, theta.cos());
            out.vertices.push(Vertex::new(
                (n * radius).to_array(),
                n.to_array(),
                [theta / TAU, phi / PI],
                t.to_array(),
            ));
        }
    }
    let ring = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * ring + j;
            let (b, c, d) = (a + 1, a + ring, a + ring + 1);
            out.indices.extend([a, b, d, a, d, c]);
        }
    }
    out
}

/// Concatenates meshes into one vertex/index buffer. Each part keeps its
/// own indices and gets a base vertex.
pub fn merge<'a>(parts: &[(&'a str, MeshData)]) -> (MeshData, Vec<(&'a str, Submesh)>) {
    let mut out = MeshData::default();
    let mut submeshes = Vec::with_capacity(parts.len());
    for (name, mesh) in parts {
        submeshes.push((
            *name,
            Submesh {
                index_count: mesh.indices.len() as u32,
                start_index: out.indices.len() as u32,
                base_vertex: out.vertices.len() as i32,
            },
        ));
        out.vertices.extend_from_slice(&mesh.vertices);
        out.indices.extend_from_slice(&mesh.indices);
    }
    (out, submeshes)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every triangle's geometric normal agrees with its vertex normals.
    fn assert_ccw_outward(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let (pa, pb, pc) = (
                Vec3::from_array(a.position),
                Vec3::from_array(b.position),
                Vec3::from_array(c.position),
            );
            let geometric = (pb - pa).cross(pc - pa);
            if geometric.length_squared() < 1e-10 {
                continue; // collapsed at a sphere pole
            }
            let shading = Vec3::from_array(a.normal) + Vec3::from_array(b.normal) + Vec3::from_array(c.normal);
            assert!(geometric.dot(shading) > 0.0, "clockwise triangle {tri:?}");
        }
    }

    #[test]
    fn cuboid_has_a_quad_per_face() {
        let m = cuboid(1.0, 2.0, 3.0);
        assert_eq!(m.vertices.len(), 24);
        assert_eq!(m.indices.len(), 36);
        assert_ccw_outward(&m);
        let max_y = m.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert!((max_y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn grid_and_sphere_wind_counter_clockwise() {
        let g = grid(20.0, 30.0, 4, 5);
        assert_eq!(g.vertices.len(), 20);
        assert_eq!(g.indices.len(), 3 * 4 * 6);
        assert_ccw_outward(&g);

        let s = sphere(0.5, 12, 8);
        assert_eq!(s.vertices.len(), 13 * 9);
        assert_ccw_outward(&s);
        assert_ccw_outward(&quad(2.0, 1.0));
    }

    #[test]
    fn merge_offsets_parts() {
        let (mesh, parts) = merge(&[("box", cuboid(1.0, 1.0, 1.0)), ("quad", quad(1.0, 1.0))]);
        assert_eq!(mesh.vertices.len(), 28);
        assert_eq!(parts[1].1.start_index, 36);
        assert_eq!(parts[1].1.base_vertex, 24);
        assert_eq!(parts[1].1.index_count, 6);
    }
}
