//! Interleaved triangle meshes: position(3), texcoord(2), normal(3).

use std::f32::consts::PI;

use crate::gl::{Gl, VertexArray};

pub const FLOATS_PER_VERTEX: usize = 8;
/// Bytes per vertex.
pub const STRIDE: i32 = (FLOATS_PER_VERTEX * size_of::<f32>()) as i32;

/// Attribute name, component count and byte offset within a vertex.
pub const LAYOUT: [(&str, i32, usize); 3] = [
    (POSITION_ATTRIBUTE, 3, 0),
    (TEXCOORD_ATTRIBUTE, 2, 3 * size_of::<f32>()),
    (NORMAL_ATTRIBUTE, 3, 5 * size_of::<f32>()),
];

pub const POSITION_ATTRIBUTE: &str = "vert";
pub const TEXCOORD_ATTRIBUTE: &str = "vertTexCoord";
pub const NORMAL_ATTRIBUTE: &str = "normal";

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<f32>,
}

impl Mesh {
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    /// A unit cube centred on the origin, each face mapped to the full texture.
    pub fn cube() -> Self {
        // normal, tangent u, tangent v
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];

        let mut vertices = Vec::with_capacity(36 * FLOATS_PER_VERTEX);
        for (n, u, v) in FACES {
            let corner = |s: f32, t: f32| -> [f32; 8] {
                let p = |i: usize| 0.5 * n[i] + (s - 0.5) * u[i] + (t - 0.5) * v[i];
                [p(0), p(1), p(2), s, t, n[0], n[1], n[2]]
            };
            for (s, t) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                vertices.extend_from_slice(&corner(s, t));
            }
        }
        Self { vertices }
    }

    /// A 2x2 quad in the XZ plane facing +Y.
    pub fn plane() -> Self {
        let corner = |x: f32, z: f32| -> [f32; 8] {
            [x, 0.0, z, (x + 1.0) / 2.0, (1.0 - z) / 2.0, 0.0, 1.0, 0.0]
        };
        let mut vertices = Vec::with_capacity(6 * FLOATS_PER_VERTEX);
        for (x, z) in [(-1.0, 1.0), (1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
            vertices.extend_from_slice(&corner(x, z));
        }
        Self { vertices }
    }

    /// A UV sphere of radius 1.
    pub fn sphere(rings: u32, segments: u32) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);

        let point = |ring: u32, segment: u32| -> [f32; 8] {
            let v = ring as f32 / rings as f32;
            let u = segment as f32 / segments as f32;
            let theta = v * PI;
            let phi = u * 2.0 * PI;
            let (x, y, z) = (theta.sin() * phi.cos(), theta.cos(), -theta.sin() * phi.sin());
            [x, y, z, u, 1.0 - v, x, y, z]
        };

        let mut vertices =
            Vec::with_capacity((rings * segments * 6) as usize * FLOATS_PER_VERTEX);
        for ring in 0..rings {
            for segment in 0..segments {
                let a = point(ring, segment);
                let b = point(ring + 1, segment);
                let c = point(ring + 1, segment + 1);
                let d = point(ring, segment + 1);
                for corner in [a, b, c, a, c, d] {
                    vertices.extend_from_slice(&corner);
                }
            }
        }
        Self { vertices }
    }

    pub fn upload(&self, gl: &dyn Gl) -> VertexBuffer {
        VertexBuffer {
            array: gl.create_vertex_array(&self.vertices),
            vertex_count: self.vertex_count() as i32,
        }
    }
}

/// A mesh uploaded to the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBuffer {
    pub array: VertexArray,
    pub vertex_count: i32,
}

impl VertexBuffer {
    pub fn release(self, gl: &dyn Gl) {
        gl.delete_vertex_array(self.array);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::recording::{GlCall, RecordingGl};

    fn normals(mesh: &Mesh) -> impl Iterator<Item = [f32; 3]> + '_ {
        mesh.vertices()
            .chunks_exact(FLOATS_PER_VERTEX)
            .map(|v| [v[5], v[6], v[7]])
    }

    #[test]
    fn layout_matches_stride() {
        assert_eq!(STRIDE, 32);
        assert_eq!(LAYOUT.map(|(_, components, _)| components).iter().sum::<i32>(), 8);
        assert_eq!(LAYOUT[2].2, 20);
    }

    #[test]
    fn cube_has_six_outward_faces() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertex_count(), 36);

        for vertex in cube.vertices().chunks_exact(FLOATS_PER_VERTEX) {
            let (p, n) = (&vertex[0..3], &vertex[5..8]);
            let along_normal: f32 = p.iter().zip(n).map(|(p, n)| p * n).sum();
            assert!((along_normal - 0.5).abs() < 1e-6);
            assert!(vertex[3..5].iter().all(|t| (0.0..=1.0).contains(t)));
        }
    }

    #[test]
    fn cube_faces_wind_counter_clockwise() {
        let cube = Mesh::cube();
        for triangle in cube.vertices().chunks_exact(3 * FLOATS_PER_VERTEX) {
            let p = |i: usize| glam::Vec3::from_slice(&triangle[i * FLOATS_PER_VERTEX..]);
            let n = glam::Vec3::from_slice(&triangle[5..]);
            let face = (p(1) - p(0)).cross(p(2) - p(0));
            assert!(face.dot(n) > 0.0);
        }
    }

    #[test]
    fn plane_faces_up() {
        let plane = Mesh::plane();
        assert_eq!(plane.vertex_count(), 6);
        assert!(normals(&plane).all(|n| n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn sphere_normals_are_unit_positions() {
        let sphere = Mesh::sphere(8, 12);
        assert_eq!(sphere.vertex_count(), 8 * 12 * 6);
        for vertex in sphere.vertices().chunks_exact(FLOATS_PER_VERTEX) {
            let length = vertex[0..3].iter().map(|c| c * c).sum::<f32>().sqrt();
            assert!((length - 1.0).abs() < 1e-5);
            assert_eq!(&vertex[0..3], &vertex[5..8]);
        }
    }

    #[test]
    fn upload_reports_vertex_count() {
        let gl = RecordingGl::new();
        let buffer = Mesh::plane().upload(&gl);

        assert_eq!(buffer.vertex_count, 6);
        buffer.release(&gl);
        assert_eq!(
            gl.take_calls(),
            vec![
                GlCall::CreateVertexArray(buffer.array, 48),
                GlCall::DeleteVertexArray(buffer.array),
            ]
        );
    }
}
