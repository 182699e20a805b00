// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::math::Vector3;

/// Column‑major 4×4 affine matrix in double precision.
///
/// - Stored in column‑major order; translation occupies the last column.
/// - Scene graph matrices are accumulated in this type so that composing
///   the container transform chain never drops below f64.
///
/// # Examples
/// ```
/// use clash_geom::math::{Matrix, Vector3};
/// let t = Matrix::translation(Vector3::new(5.0, -3.0, 2.0));
/// let p = Vector3::new(2.0, 4.0, -1.0);
/// assert_eq!(t.transform_point(&p).to_array(), [7.0, 1.0, 1.0]);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "[[f64; 4]; 4]", into = "[[f64; 4]; 4]"))]
pub struct Matrix {
    data: [f64; 16],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    /// Returns the identity matrix.
    pub const fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, 0.0, // col 1
                0.0, 0.0, 1.0, 0.0, // col 2
                0.0, 0.0, 0.0, 1.0, // col 3
            ],
        }
    }

    /// Builds a translation matrix.
    pub fn translation(v: Vector3) -> Self {
        let [tx, ty, tz] = v.to_array();
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, 0.0, // col 1
                0.0, 0.0, 1.0, 0.0, // col 2
                tx, ty, tz, 1.0, // col 3 (translation)
            ],
        }
    }

    /// Builds a non-uniform scale matrix.
    pub const fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            data: [
                sx, 0.0, 0.0, 0.0, // col 0
                0.0, sy, 0.0, 0.0, // col 1
                0.0, 0.0, sz, 0.0, // col 2
                0.0, 0.0, 0.0, 1.0, // col 3
            ],
        }
    }

    /// Builds a uniform scale matrix.
    pub const fn uniform_scale(s: f64) -> Self {
        Self::scale(s, s, s)
    }

    /// Builds a rotation matrix around the X axis by `angle` radians.
    #[rustfmt::skip]
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new([
            1.0, 0.0, 0.0, 0.0,
            0.0, c,   s,   0.0,
            0.0, -s,  c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Builds a rotation matrix around the Y axis by `angle` radians.
    #[rustfmt::skip]
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new([
            c,   0.0, -s,  0.0,
            0.0, 1.0, 0.0, 0.0,
            s,   0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Builds a rotation matrix around the Z axis by `angle` radians.
    #[rustfmt::skip]
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new([
            c,   s,   0.0, 0.0,
            -s,  c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Builds a counter-clockwise rotation of `angle` radians about `axis`
    /// (Rodrigues). A zero-length axis yields the identity.
    pub fn rotation_axis_angle(axis: Vector3, angle: f64) -> Self {
        let n = axis.normalize();
        if n == Vector3::ZERO {
            return Self::identity();
        }
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let [x, y, z] = n.to_array();
        Self::from_rows([
            [t * x * x + c, t * x * y - s * z, t * x * z + s * y, 0.0],
            [t * x * y + s * z, t * y * y + c, t * y * z - s * x, 0.0],
            [t * x * z - s * y, t * y * z + s * x, t * z * z + c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a matrix from column-major array data.
    pub const fn new(data: [f64; 16]) -> Self {
        Self { data }
    }

    /// Creates a matrix from row-major rows, the layout scene documents use.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut data = [0.0; 16];
        for (row, values) in rows.iter().enumerate() {
            for (col, v) in values.iter().enumerate() {
                data[col * 4 + row] = *v;
            }
        }
        Self { data }
    }

    /// Returns the matrix as row-major rows.
    pub fn to_rows(self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (row, values) in rows.iter_mut().enumerate() {
            for (col, v) in values.iter_mut().enumerate() {
                *v = self.at(row, col);
            }
        }
        rows
    }

    /// Returns the matrix as a column‑major array.
    pub fn to_array(self) -> [f64; 16] {
        self.data
    }

    /// Element at `row`, `col`.
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[col * 4 + row]
    }

    /// Multiplies the matrix with another matrix (`self * rhs`).
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.at(row, k) * rhs.at(k, col);
                }
                out[col * 4 + row] = sum;
            }
        }
        Self::new(out)
    }

    /// Transforms a point (`w = 1`, no perspective divide).
    pub fn transform_point(&self, point: &Vector3) -> Vector3 {
        let [x, y, z] = point.to_array();
        Vector3::new(
            self.at(0, 0) * x + self.at(0, 1) * y + self.at(0, 2) * z + self.at(0, 3),
            self.at(1, 0) * x + self.at(1, 1) * y + self.at(1, 2) * z + self.at(1, 3),
            self.at(2, 0) * x + self.at(2, 1) * y + self.at(2, 2) * z + self.at(2, 3),
        )
    }

    /// Transforms a direction vector (ignores translation, `w = 0`).
    pub fn transform_direction(&self, direction: &Vector3) -> Vector3 {
        let [x, y, z] = direction.to_array();
        Vector3::new(
            self.at(0, 0) * x + self.at(0, 1) * y + self.at(0, 2) * z,
            self.at(1, 0) * x + self.at(1, 1) * y + self.at(1, 2) * z,
            self.at(2, 0) * x + self.at(2, 1) * y + self.at(2, 2) * z,
        )
    }

    /// Translation component (the last column).
    pub fn translation_part(&self) -> Vector3 {
        Vector3::new(self.at(0, 3), self.at(1, 3), self.at(2, 3))
    }

    /// Scale component, taken as the length of each basis column.
    ///
    /// Decomposition is lossy for sheared matrices; callers only use it to
    /// bound how much a transform can grow local geometry.
    pub fn scale_part(&self) -> Vector3 {
        let col = |c: usize| Vector3::new(self.at(0, c), self.at(1, c), self.at(2, c)).norm();
        Vector3::new(col(0), col(1), col(2))
    }

    /// Inverse of an affine matrix, or `None` when the linear part is
    /// singular.
    pub fn inverse(&self) -> Option<Self> {
        let m = |r: usize, c: usize| self.at(r, c);
        let c00 = m(1, 1) * m(2, 2) - m(1, 2) * m(2, 1);
        let c01 = m(1, 2) * m(2, 0) - m(1, 0) * m(2, 2);
        let c02 = m(1, 0) * m(2, 1) - m(1, 1) * m(2, 0);
        let det = m(0, 0) * c00 + m(0, 1) * c01 + m(0, 2) * c02;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        let r = [
            [
                c00 * inv_det,
                (m(0, 2) * m(2, 1) - m(0, 1) * m(2, 2)) * inv_det,
                (m(0, 1) * m(1, 2) - m(0, 2) * m(1, 1)) * inv_det,
            ],
            [
                c01 * inv_det,
                (m(0, 0) * m(2, 2) - m(0, 2) * m(2, 0)) * inv_det,
                (m(0, 2) * m(1, 0) - m(0, 0) * m(1, 2)) * inv_det,
            ],
            [
                c02 * inv_det,
                (m(0, 1) * m(2, 0) - m(0, 0) * m(2, 1)) * inv_det,
                (m(0, 0) * m(1, 1) - m(0, 1) * m(1, 0)) * inv_det,
            ],
        ];
        let t = self.translation_part();
        let it = |row: usize| -(r[row][0] * t.x() + r[row][1] * t.y() + r[row][2] * t.z());
        Some(Self::from_rows([
            [r[0][0], r[0][1], r[0][2], it(0)],
            [r[1][0], r[1][1], r[1][2], it(1)],
            [r[2][0], r[2][1], r[2][2], it(2)],
            [0.0, 0.0, 0.0, 1.0],
        ]))
    }
}

impl From<[[f64; 4]; 4]> for Matrix {
    fn from(rows: [[f64; 4]; 4]) -> Self {
        Self::from_rows(rows)
    }
}

impl From<Matrix> for [[f64; 4]; 4] {
    fn from(value: Matrix) -> Self {
        value.to_rows()
    }
}

impl core::ops::Mul for Matrix {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}

impl core::ops::Mul<Vector3> for Matrix {
    type Output = Vector3;
    fn mul(self, rhs: Vector3) -> Vector3 {
        self.transform_point(&rhs)
    }
}
