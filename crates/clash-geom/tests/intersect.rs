// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::float_cmp)]
//! Triangle interpenetration bound and box separation.

use clash_dry_tests::{ClashGenerator, RandomGenerator, Topology};
use clash_geom::intersect::{intersects, minimum_separating_axis};
use clash_geom::{Bounds, Triangle, Vector3};
use proptest::prelude::*;

fn random_triangle(rng: &mut RandomGenerator, range: (f64, f64)) -> Triangle {
    Triangle::new(rng.vector(range), rng.vector(range), rng.vector(range))
}

fn random_bounds(rng: &mut RandomGenerator) -> Bounds {
    let centre = rng.vector((-2.0, 2.0));
    let half = rng.vector_in((0.1, 2.0), (0.1, 2.0), (0.1, 2.0));
    Bounds::from_center_half_extents(centre, half)
}

fn unit() -> Bounds {
    Bounds::new(Vector3::splat(-0.5), Vector3::splat(0.5))
}

proptest! {
    #[test]
    fn depth_is_symmetric_and_ignores_winding(seed in any::<u64>()) {
        let mut rng = RandomGenerator::new(seed);
        let a = random_triangle(&mut rng, (-1.0, 1.0));
        let b = random_triangle(&mut rng, (-1.0, 1.0));
        let reference = intersects(&a, &b);
        prop_assert!(reference >= 0.0);
        let variants = [
            intersects(&b, &a),
            intersects(&a.shifted(), &b),
            intersects(&a, &b.shifted().shifted()),
            intersects(&a.flipped(), &b),
            intersects(&b.flipped(), &a.flipped()),
        ];
        for v in variants {
            prop_assert!((v - reference).abs() < 1e-8, "{} vs {}", v, reference);
        }
    }

    #[test]
    fn depth_is_zero_for_translated_apart_triangles(seed in any::<u64>()) {
        let mut rng = RandomGenerator::new(seed);
        let a = random_triangle(&mut rng, (-1.0, 1.0));
        let b = random_triangle(&mut rng, (-1.0, 1.0)).translated(Vector3::new(2.5, 0.0, 0.0));
        prop_assert_eq!(intersects(&a, &b).to_bits(), 0.0_f64.to_bits());
    }

    #[test]
    fn separating_axis_leaves_boxes_touching(seed in any::<u64>()) {
        let mut rng = RandomGenerator::new(seed);
        let a = random_bounds(&mut rng);
        let b = random_bounds(&mut rng);
        let v = minimum_separating_axis(&a, &b);
        let gaps: Vec<(f64, f64)> = (0..3)
            .map(|j| (a.max()[j] - b.min()[j], b.max()[j] - a.min()[j]))
            .collect();
        if gaps.iter().any(|&(d1, d2)| d1 <= 0.0 || d2 <= 0.0) {
            prop_assert_eq!(v, Vector3::ZERO);
        } else {
            let axis = (0..3).find(|&i| v[i] != 0.0);
            prop_assert!(axis.is_some());
            let i = axis.unwrap_or_default();
            let moved = a.translated(v);
            let overlap = (moved.max()[i] - b.min()[i]).min(b.max()[i] - moved.min()[i]);
            prop_assert!(overlap.abs() < 1e-9);
            // No other axis separates with a shorter move.
            for (d1, d2) in gaps {
                prop_assert!(v.norm() <= d1.min(d2) + 1e-12);
            }
        }
    }
}

#[test]
fn generated_separated_pairs_have_zero_depth() {
    let mut generator = ClashGenerator::new(21, (0.05, 0.3));
    let cell = unit();
    for topology in [Topology::VertexVertex, Topology::VertexEdge, Topology::EdgeEdge, Topology::VertexFace] {
        for _ in 0..200 {
            let pair = generator.triangles_of(topology, &cell);
            assert_eq!(intersects(&pair.a, &pair.b), 0.0, "{topology:?}");
        }
    }
}

#[test]
fn piercing_pairs_report_positive_depth() {
    let mut generator = ClashGenerator::new(22, (0.0, 0.0));
    let cell = unit();
    let mut positive = 0;
    for _ in 0..200 {
        let pair = generator.triangles_of(Topology::FaceEdge, &cell);
        if intersects(&pair.a, &pair.b) > 0.0 {
            positive += 1;
        }
    }
    // Piercings that graze the face boundary can report zero depth.
    assert!(positive > 190, "{positive}");
}

#[test]
fn coplanar_and_degenerate_triangles_never_intersect() {
    let a = Triangle::new(Vector3::ZERO, Vector3::UNIT_X, Vector3::UNIT_Y);
    let b = Triangle::new(Vector3::new(0.2, 0.2, 0.0), Vector3::new(1.0, 1.0, 0.0), Vector3::new(0.2, 1.0, 0.0));
    assert_eq!(intersects(&a, &b), 0.0);
    let sliver = Triangle::new(Vector3::ZERO, Vector3::UNIT_Z, Vector3::UNIT_Z * 2.0);
    assert_eq!(intersects(&a, &sliver), 0.0);
}

#[test]
fn concentric_boxes_separate_along_the_smallest_sum_of_half_extents() {
    let inner = Bounds::from_center_half_extents(Vector3::ZERO, Vector3::new(1.0, 0.25, 2.0));
    let outer = Bounds::from_center_half_extents(Vector3::ZERO, Vector3::new(3.0, 1.0, 3.0));
    let v = minimum_separating_axis(&inner, &outer);
    assert!((v.norm() - 1.25).abs() < 1e-12);
    assert_eq!(v.x(), 0.0);
    assert_eq!(v.z(), 0.0);
}

#[test]
fn disjoint_and_touching_boxes_need_no_move() {
    let a = unit();
    assert_eq!(minimum_separating_axis(&a, &a.translated(Vector3::new(1.0, 0.0, 0.0))), Vector3::ZERO);
    assert_eq!(minimum_separating_axis(&a, &a.translated(Vector3::new(0.0, 5.0, 0.0))), Vector3::ZERO);
}
