// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Approximate penetration depth between two triangle soups.
//!
//! [`PolyDepth`] searches for a short translation `v` of soup A such that
//! `A + v` no longer interpenetrates B. Every configuration it accepts is
//! collision-free, so `|v|` is an upper bound on the true minimum
//! translation distance, tightened with each [`PolyDepth::iterate`] call.
//!
//! Candidates come from two sources:
//! - support projections: for a unit direction `d`, moving A by
//!   `(max_B(d·b) - min_A(d·a)) d` separates the projections of the soups on
//!   `d`, which makes the configuration free by construction;
//! - contact-space bisection: the segment from the current best
//!   configuration toward the origin is bisected, accepting only points the
//!   triangle-level test verifies as free.

use core::cmp::Ordering;

use crate::broad::bvh::{traverse_pair, Bvh};
use crate::broad::BoundsPredicate;
use crate::intersect::{intersects, minimum_separating_axis};
use crate::math::Vector3;
use crate::types::bounds::Bounds;
use crate::types::triangle::Triangle;

/// Interpenetration at or below this depth counts as touching.
pub const CONTACT_EPSILON: f64 = 1e-6;

const DIRECTIONS_PER_ITERATION: usize = 32;
const BISECTION_STEPS: usize = 6;
const MAX_SEED_NORMALS: usize = 64;

/// Classification of a configuration of the two soups.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Collision {
    /// Some triangle pair interpenetrates by more than [`CONTACT_EPSILON`],
    /// or one soup's bounds enclose the other's without surface contact.
    Collision,
    /// Surfaces touch but do not interpenetrate.
    Contact,
    /// No contact at all.
    Free,
}

/// Overlap test with A's bounds shifted by an offset.
struct Shifted {
    offset: Vector3,
}

impl BoundsPredicate for Shifted {
    fn test(&self, a: &Bounds, b: &Bounds) -> bool {
        a.translated(self.offset).overlaps(b)
    }
}

/// Penetration depth estimator over two triangle soups.
///
/// # Examples
/// ```
/// use clash_geom::math::Vector3;
/// use clash_geom::polydepth::PolyDepth;
/// use clash_geom::types::triangle::Triangle;
///
/// let a = vec![Triangle::new(
///     Vector3::new(0.0, 0.0, -1.0),
///     Vector3::new(0.0, 0.0, 1.0),
///     Vector3::new(1.0, 0.0, 0.0),
/// )];
/// let b = vec![Triangle::new(
///     Vector3::new(0.5, -1.0, 0.0),
///     Vector3::new(0.5, 1.0, 0.0),
///     Vector3::new(-1.0, 0.0, 0.0),
/// )];
/// let mut pd = PolyDepth::new(a, b);
/// pd.iterate(20);
/// assert!(pd.penetration_vector().norm() > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct PolyDepth {
    a: Vec<Triangle>,
    b: Vec<Triangle>,
    bvh_a: Bvh,
    bvh_b: Bvh,
    bounds_a: Bounds,
    bounds_b: Bounds,
    seeds: Vec<Vector3>,
    best: Vector3,
    iterations: usize,
}

impl PolyDepth {
    /// Prepares the estimator and computes the initial free configuration.
    pub fn new(a: Vec<Triangle>, b: Vec<Triangle>) -> Self {
        let bvh_a = Bvh::from_triangles(&a);
        let bvh_b = Bvh::from_triangles(&b);
        let bounds_a = bvh_a.root_bounds();
        let bounds_b = bvh_b.root_bounds();
        let mut pd = Self {
            a,
            b,
            bvh_a,
            bvh_b,
            bounds_a,
            bounds_b,
            seeds: Vector3::AXES.to_vec(),
            best: Vector3::ZERO,
            iterations: 0,
        };

        let initial = minimum_separating_axis(&pd.bounds_a, &pd.bounds_b);
        if initial == Vector3::ZERO {
            return pd;
        }
        pd.collect_seed_normals();
        if pd.collision(&Vector3::ZERO) != Collision::Collision {
            return pd;
        }
        pd.best = initial;
        pd
    }

    fn collect_seed_normals(&mut self) {
        let mut normals = Vec::new();
        traverse_pair(
            &self.bvh_a,
            &self.bvh_b,
            &Shifted { offset: Vector3::ZERO },
            |i, j| {
                if normals.len() < MAX_SEED_NORMALS * 2
                    && intersects(&self.a[i], &self.b[j]) > CONTACT_EPSILON
                {
                    normals.push(self.a[i].normal());
                    normals.push(self.b[j].normal());
                }
            },
        );
        for n in normals {
            if n != Vector3::ZERO && !self.seeds.iter().any(|s| *s == n || *s == -n) {
                self.seeds.push(n);
            }
        }
    }

    /// Current penetration vector: the translation of A found so far. Zero
    /// when the soups do not interpenetrate.
    pub fn penetration_vector(&self) -> Vector3 {
        self.best
    }

    /// Number of iterations run so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Classifies the configuration with A translated by `q`.
    pub fn collision(&self, q: &Vector3) -> Collision {
        let moved = self.bounds_a.translated(*q);
        if !moved.overlaps(&self.bounds_b) {
            return Collision::Free;
        }
        let mut deepest = 0.0_f64;
        let mut touching = false;
        traverse_pair(&self.bvh_a, &self.bvh_b, &Shifted { offset: *q }, |i, j| {
            if deepest > CONTACT_EPSILON {
                return;
            }
            touching = true;
            deepest = deepest.max(intersects(&self.a[i].translated(*q), &self.b[j]));
        });
        if deepest > CONTACT_EPSILON || moved.contains(&self.bounds_b) || self.bounds_b.contains(&moved) {
            Collision::Collision
        } else if touching {
            Collision::Contact
        } else {
            Collision::Free
        }
    }

    /// Runs `n` refinement iterations.
    pub fn iterate(&mut self, n: usize) {
        if self.best == Vector3::ZERO {
            return;
        }
        for _ in 0..n {
            self.support_step();
            self.bisection_step();
            self.iterations += 1;
        }
    }

    fn consider(&mut self, candidate: Vector3) {
        let len = candidate.norm();
        if !len.is_finite() || len < CONTACT_EPSILON {
            return;
        }
        let better = match len.total_cmp(&self.best.norm()) {
            Ordering::Less => true,
            Ordering::Equal => candidate.total_cmp(&self.best).is_lt(),
            Ordering::Greater => false,
        };
        if better {
            self.best = candidate;
        }
    }

    fn support_step(&mut self) {
        let start = self.iterations * DIRECTIONS_PER_ITERATION;
        let mut directions: Vec<Vector3> = if self.iterations == 0 {
            self.seeds.clone()
        } else {
            Vec::new()
        };
        directions.extend((start..start + DIRECTIONS_PER_ITERATION).map(sphere_direction));
        for d in directions {
            for dir in [d, -d] {
                let t = self.support_shift(&dir);
                if t > 0.0 {
                    self.consider(dir * t);
                }
            }
        }
    }

    /// Distance A must move along unit `dir` for its projection to clear B's.
    fn support_shift(&self, dir: &Vector3) -> f64 {
        let max_b = self
            .b
            .iter()
            .flat_map(|t| t.vertices.iter())
            .fold(f64::NEG_INFINITY, |m, v| m.max(dir.dot(v)));
        let min_a = self
            .a
            .iter()
            .flat_map(|t| t.vertices.iter())
            .fold(f64::INFINITY, |m, v| m.min(dir.dot(v)));
        max_b - min_a
    }

    fn bisection_step(&mut self) {
        let target = self.best;
        let mut lo = 0.0_f64;
        let mut hi = 1.0_f64;
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            let q = target * mid;
            if q.norm() < CONTACT_EPSILON {
                break;
            }
            if self.collision(&q) == Collision::Collision {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        if hi < 1.0 {
            self.consider(target * hi);
        }
    }
}

/// Deterministic low-discrepancy unit direction for index `i`.
#[allow(clippy::cast_precision_loss)]
fn sphere_direction(i: usize) -> Vector3 {
    const GOLDEN: f64 = 0.618_033_988_749_894_9;
    const PLASTIC: f64 = 0.754_877_666_246_692_8;
    let k = i as f64 + 0.5;
    let z = 1.0 - 2.0 * (k * GOLDEN).fract();
    let phi = core::f64::consts::TAU * (k * PLASTIC).fract();
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vector3::new(r * phi.cos(), r * phi.sin(), z)
}
