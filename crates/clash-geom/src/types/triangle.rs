// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::{Matrix, Vector3};
use crate::types::bounds::Bounds;

/// A triangle in project space.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triangle {
    /// The three vertices in winding order.
    pub vertices: [Vector3; 3],
}

impl Triangle {
    /// Creates a triangle from three vertices.
    pub const fn new(a: Vector3, b: Vector3, c: Vector3) -> Self {
        Self { vertices: [a, b, c] }
    }

    /// First vertex.
    pub fn a(&self) -> Vector3 {
        self.vertices[0]
    }

    /// Second vertex.
    pub fn b(&self) -> Vector3 {
        self.vertices[1]
    }

    /// Third vertex.
    pub fn c(&self) -> Vector3 {
        self.vertices[2]
    }

    /// Unnormalised normal `(b - a) × (c - a)`.
    pub fn cross(&self) -> Vector3 {
        (self.b() - self.a()).cross(&(self.c() - self.a()))
    }

    /// Unit normal, or zero for a degenerate triangle.
    pub fn normal(&self) -> Vector3 {
        self.cross().normalize()
    }

    /// The three edges as `(start, end)` pairs: ab, bc, ca.
    pub fn edges(&self) -> [(Vector3, Vector3); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }

    /// Axis-aligned bounds of the vertices.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(&self.vertices)
    }

    /// Returns the triangle translated by `v`.
    pub fn translated(&self, v: Vector3) -> Self {
        Self::new(self.a() + v, self.b() + v, self.c() + v)
    }

    /// Returns the triangle transformed as points by `mat`.
    pub fn transformed(&self, mat: &Matrix) -> Self {
        Self::new(
            mat.transform_point(&self.a()),
            mat.transform_point(&self.b()),
            mat.transform_point(&self.c()),
        )
    }

    /// Returns the triangle with reversed winding (`c, b, a`).
    pub fn flipped(&self) -> Self {
        Self::new(self.c(), self.b(), self.a())
    }

    /// Cyclic rotation of the vertices (`b, c, a`).
    pub fn shifted(&self) -> Self {
        Self::new(self.b(), self.c(), self.a())
    }
}

impl From<[Vector3; 3]> for Triangle {
    fn from(vertices: [Vector3; 3]) -> Self {
        Self { vertices }
    }
}
