// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
//! Sign exactness of `orient3d` across the magnitudes seen in project space.

use clash_dry_tests::RandomGenerator;
use clash_geom::predicates::orient3d;
use clash_geom::{Triangle, Vector3};
use proptest::prelude::*;

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

proptest! {
    #[test]
    fn lattice_points_on_a_plane_are_exactly_coplanar(
        exp in -46_i32..46,
        coords in prop::array::uniform8(-64_i32..64),
        k in -64_i32..64,
    ) {
        // Plane x + y + z = k on an integer lattice, scaled by a power of two,
        // so every point is representable.
        let s = 2f64.powi(exp);
        let p = |x: i32, y: i32| {
            Vector3::new(f64::from(x) * s, f64::from(y) * s, f64::from(k - x - y) * s)
        };
        let a = p(coords[0], coords[1]);
        let b = p(coords[2], coords[3]);
        let c = p(coords[4], coords[5]);
        let d = p(coords[6], coords[7]);
        prop_assert_eq!(sign(orient3d(&a, &b, &c, &d)), 0);
    }

    #[test]
    fn offsets_along_the_normal_have_opposite_signs(seed in any::<u64>(), exp in -14_i32..15) {
        let scale = 10f64.powi(exp);
        let mut rng = RandomGenerator::new(seed);
        let t = Triangle::new(
            rng.vector((-scale, scale)),
            rng.vector((-scale, scale)),
            rng.vector((-scale, scale)),
        );
        prop_assume!(t.cross().norm() > scale * scale * 1e-6);
        let n = t.normal();
        let w = rng.barycentric();
        let p = t.a() * w.x() + t.b() * w.y() + t.c() * w.z();
        let h = scale * 1e-3;
        let above = p + n * h;
        let below = p - n * h;
        prop_assert_eq!(sign(orient3d(&t.a(), &t.b(), &t.c(), &above)), -1);
        prop_assert_eq!(sign(orient3d(&t.a(), &t.b(), &t.c(), &below)), 1);
        // Swapping two vertices flips the orientation.
        prop_assert_eq!(sign(orient3d(&t.c(), &t.b(), &t.a(), &above)), 1);
        // Cyclic permutations preserve it.
        prop_assert_eq!(sign(orient3d(&t.b(), &t.c(), &t.a(), &above)), -1);
    }
}

#[test]
fn near_degenerate_offsets_resolve_at_extreme_scale() {
    let s = 1e14;
    let a = Vector3::new(s, 0.0, 0.0);
    let b = Vector3::new(0.0, s, 0.0);
    let c = Vector3::new(0.0, 0.0, s);
    let centre = Vector3::new(s / 4.0, s / 4.0, s / 2.0);
    let up = Vector3::new(centre.x(), centre.y(), centre.z().next_up());
    let down = Vector3::new(centre.x(), centre.y(), centre.z().next_down());
    assert_eq!(sign(orient3d(&a, &b, &c, &centre)), 0);
    assert_eq!(sign(orient3d(&a, &b, &c, &up)), -1);
    assert_eq!(sign(orient3d(&a, &b, &c, &down)), 1);
}
