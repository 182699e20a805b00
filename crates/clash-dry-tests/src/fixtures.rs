// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mesh fixtures.

use clash_core::db::MeshBuffers;
use clash_geom::{Line, Matrix, Triangle, Vector3};

/// An indexed triangle mesh in double precision.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<Vector3>,
    /// Triangles as vertex indices.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// A triangle soup with one face per triangle.
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let vertices: Vec<Vector3> = triangles.iter().flat_map(|t| t.vertices).collect();
        let faces = (0..triangles.len())
            .map(|i| {
                let base = u32::try_from(i * 3).unwrap_or(u32::MAX - 2);
                [base, base + 1, base + 2]
            })
            .collect();
        Self { vertices, faces }
    }

    /// A segment stored as a degenerate triangle, as line geometry appears
    /// in real data.
    pub fn from_line(line: &Line) -> Self {
        Self::from_triangles(&[Triangle::new(line.start, line.start, line.end)])
    }

    /// The faces as triangles.
    pub fn triangles(&self) -> Vec<Triangle> {
        self.faces
            .iter()
            .map(|f| Triangle::from(f.map(|i| self.vertices[i as usize])))
            .collect()
    }

    /// The mesh with every vertex transformed by `m`.
    pub fn transformed(&self, m: &Matrix) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| m.transform_point(v)).collect(),
            faces: self.faces.clone(),
        }
    }

    /// Storage form: f32 vertices and index lists.
    pub fn to_buffers(&self) -> MeshBuffers {
        #[allow(clippy::cast_possible_truncation)]
        let vertices = self
            .vertices
            .iter()
            .map(|v| v.to_array().map(|c| c as f32))
            .collect();
        MeshBuffers {
            vertices,
            faces: self.faces.iter().map(|f| f.to_vec()).collect(),
        }
    }
}

/// The closed unit cube `[0, 1]³`.
pub fn unit_cube() -> Mesh {
    let vertices = (0..8_u8)
        .map(|i| {
            Vector3::new(
                f64::from(i & 1),
                f64::from((i >> 1) & 1),
                f64::from((i >> 2) & 1),
            )
        })
        .collect();
    #[rustfmt::skip]
    let faces = vec![
        [0, 2, 1], [1, 2, 3], // z = 0
        [4, 5, 6], [5, 7, 6], // z = 1
        [0, 1, 4], [1, 5, 4], // y = 0
        [2, 6, 3], [3, 6, 7], // y = 1
        [0, 4, 2], [2, 4, 6], // x = 0
        [1, 3, 5], [3, 7, 5], // x = 1
    ];
    Mesh { vertices, faces }
}

/// A closed cone with its apex at `apex` and its base disc centred at
/// `apex + (0, 0, height)`. A negative height points the apex up.
///
/// The base is a fan around its centre vertex, so the centre is a vertex of
/// the mesh.
#[allow(clippy::cast_precision_loss)]
pub fn cone(apex: Vector3, height: f64, radius: f64, segments: u32) -> Mesh {
    let segments = segments.max(3);
    let centre = apex + Vector3::new(0.0, 0.0, height);
    let mut vertices = vec![apex, centre];
    for i in 0..segments {
        let phi = core::f64::consts::TAU * f64::from(i) / f64::from(segments);
        vertices.push(centre + Vector3::new(radius * phi.cos(), radius * phi.sin(), 0.0));
    }
    let ring = |i: u32| 2 + i % segments;
    let mut faces = Vec::with_capacity(segments as usize * 2);
    for i in 0..segments {
        faces.push([0, ring(i), ring(i + 1)]);
        faces.push([1, ring(i + 1), ring(i)]);
    }
    Mesh { vertices, faces }
}
