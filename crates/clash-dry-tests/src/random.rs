// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geometric sampling on top of [`Prng`].

use clash_geom::{Matrix, Vector3};
use uuid::Uuid;

use crate::prng::Prng;

/// A closed interval. Bounds may be given in either order.
pub type Range = (f64, f64);

/// Samples numbers, vectors, rotations and ids.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    prng: Prng,
}

impl RandomGenerator {
    /// Creates a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            prng: Prng::from_seed_u64(seed),
        }
    }

    /// Uniform number in `[0, 1)`.
    pub fn scalar(&mut self) -> f64 {
        self.prng.next_f64()
    }

    /// Uniform number between the bounds of `range`.
    pub fn number(&mut self, range: Range) -> f64 {
        let (lo, hi) = if range.0 <= range.1 { range } else { (range.1, range.0) };
        lo + (hi - lo) * self.scalar()
    }

    /// Uniform index in `[0, n)`.
    pub fn index(&mut self, n: usize) -> usize {
        self.prng.next_index(n)
    }

    /// Vector with every component in `range`.
    pub fn vector(&mut self, range: Range) -> Vector3 {
        Vector3::new(self.number(range), self.number(range), self.number(range))
    }

    /// Vector with each component in its own range.
    pub fn vector_in(&mut self, x: Range, y: Range, z: Range) -> Vector3 {
        Vector3::new(self.number(x), self.number(y), self.number(z))
    }

    /// Uniformly distributed unit vector.
    pub fn direction(&mut self) -> Vector3 {
        let z = self.number((-1.0, 1.0));
        let phi = self.number((0.0, core::f64::consts::TAU));
        let r = (1.0 - z * z).max(0.0).sqrt();
        Vector3::new(r * phi.cos(), r * phi.sin(), z)
    }

    /// Barycentric weights summing to one.
    pub fn barycentric(&mut self) -> Vector3 {
        let mut u = self.scalar();
        let mut v = self.scalar();
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        Vector3::new(1.0 - u - v, u, v)
    }

    /// Rotation about `axis` by an angle in `angle` radians.
    pub fn rotation(&mut self, axis: Vector3, angle: Range) -> Matrix {
        Matrix::rotation_axis_angle(axis, self.number(angle))
    }

    /// Random rotation followed by a translation with components in
    /// `translation`. Rigid, so distances are preserved.
    pub fn rigid_transform(&mut self, translation: Range) -> Matrix {
        let axis = self.direction();
        let rotation = self.rotation(axis, (0.0, core::f64::consts::TAU));
        Matrix::translation(self.vector(translation)) * rotation
    }

    /// Reproducible id.
    pub fn uuid(&mut self) -> Uuid {
        Uuid::from_u64_pair(self.prng.next_u64(), self.prng.next_u64())
    }
}
