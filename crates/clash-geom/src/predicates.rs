// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Exact geometric predicates.
//!
//! `orient3d` first evaluates the determinant in plain floating point and
//! accepts the result when it clears a forward error bound. Otherwise it
//! recomputes the determinant exactly with floating point expansions (sums
//! of non-overlapping doubles in increasing magnitude order), built from the
//! error-free transforms below.

use crate::math::Vector3;

/// Half an ulp of 1.0; the unit roundoff of f64 arithmetic.
const HALF_EPSILON: f64 = f64::EPSILON * 0.5;

/// Error bound coefficient for the floating point orient3d filter.
const O3D_ERRBOUND: f64 = (7.0 + 56.0 * HALF_EPSILON) * HALF_EPSILON;

/// Error-free sum: returns `(s, e)` with `s = fl(a + b)` and `a + b = s + e`.
pub fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bv = s - a;
    let av = s - bv;
    (s, (a - av) + (b - bv))
}

/// Error-free difference: returns `(d, e)` with `a - b = d + e`.
pub fn two_diff(a: f64, b: f64) -> (f64, f64) {
    let d = a - b;
    let bv = a - d;
    let av = d + bv;
    (d, (a - av) + (bv - b))
}

/// Error-free product using a fused multiply-add: `a * b = p + e`.
pub fn two_product(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, a.mul_add(b, -p))
}

/// Adds a single double to an expansion, eliminating zero components.
fn grow_expansion(e: &[f64], b: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(e.len() + 1);
    let mut q = b;
    for &component in e {
        let (sum, err) = two_sum(q, component);
        if err != 0.0 {
            out.push(err);
        }
        q = sum;
    }
    if q != 0.0 {
        out.push(q);
    }
    out
}

fn expansion_sum(e: &[f64], f: &[f64]) -> Vec<f64> {
    f.iter().fold(e.to_vec(), |acc, &c| grow_expansion(&acc, c))
}

fn scale_expansion(e: &[f64], b: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(e.len() * 2);
    for &component in e {
        let (p, err) = two_product(component, b);
        out = grow_expansion(&out, err);
        out = grow_expansion(&out, p);
    }
    out
}

fn expansion_product(e: &[f64], f: &[f64]) -> Vec<f64> {
    f.iter().fold(Vec::new(), |acc, &c| expansion_sum(&acc, &scale_expansion(e, c)))
}

fn negate(e: &[f64]) -> Vec<f64> {
    e.iter().map(|c| -c).collect()
}

/// Exact difference `a - b` as a two component expansion.
fn diff_expansion(a: f64, b: f64) -> Vec<f64> {
    let (d, err) = two_diff(a, b);
    grow_expansion(&[err], d)
}

/// Most significant component of an expansion; carries the exact sign.
fn estimate(e: &[f64]) -> f64 {
    e.last().copied().unwrap_or(0.0)
}

fn orient3d_exact(a: &Vector3, b: &Vector3, c: &Vector3, d: &Vector3) -> f64 {
    let ad: Vec<Vec<f64>> = (0..3).map(|i| diff_expansion(a[i], d[i])).collect();
    let bd: Vec<Vec<f64>> = (0..3).map(|i| diff_expansion(b[i], d[i])).collect();
    let cd: Vec<Vec<f64>> = (0..3).map(|i| diff_expansion(c[i], d[i])).collect();

    // 2x2 minors of the lower rows.
    let minor = |p: &[Vec<f64>], q: &[Vec<f64>], i: usize, j: usize| {
        expansion_sum(
            &expansion_product(&p[i], &q[j]),
            &negate(&expansion_product(&p[j], &q[i])),
        )
    };
    let bc = minor(&bd, &cd, 1, 2);
    let ca = minor(&cd, &ad, 1, 2);
    let ab = minor(&ad, &bd, 1, 2);

    let det = expansion_sum(
        &expansion_sum(&expansion_product(&ad[0], &bc), &expansion_product(&bd[0], &ca)),
        &expansion_product(&cd[0], &ab),
    );
    estimate(&det)
}

/// Orientation of `d` relative to the plane through `a`, `b`, `c`.
///
/// Returns a negative value when `d` lies on the side the normal
/// `(b - a) × (c - a)` points to, a positive value when it lies on the other
/// side, and exactly zero when the four points are coplanar. The sign is
/// exact for all finite inputs; the magnitude approximates six times the
/// signed tetrahedron volume.
///
/// # Examples
/// ```
/// use clash_geom::math::Vector3;
/// use clash_geom::predicates::orient3d;
/// let a = Vector3::new(0.0, 0.0, 0.0);
/// let b = Vector3::new(1.0, 0.0, 0.0);
/// let c = Vector3::new(0.0, 1.0, 0.0);
/// assert!(orient3d(&a, &b, &c, &Vector3::new(0.0, 0.0, 1.0)) < 0.0);
/// assert!(orient3d(&c, &b, &a, &Vector3::new(0.0, 0.0, 1.0)) > 0.0);
/// assert_eq!(orient3d(&a, &b, &c, &Vector3::new(3.0, 7.0, 0.0)), 0.0);
/// ```
pub fn orient3d(a: &Vector3, b: &Vector3, c: &Vector3, d: &Vector3) -> f64 {
    let adx = a.x() - d.x();
    let ady = a.y() - d.y();
    let adz = a.z() - d.z();
    let bdx = b.x() - d.x();
    let bdy = b.y() - d.y();
    let bdz = b.z() - d.z();
    let cdx = c.x() - d.x();
    let cdy = c.y() - d.y();
    let cdz = c.z() - d.z();

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;
    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;

    let det = adz * (bdxcdy - cdxbdy) + bdz * (cdxady - adxcdy) + cdz * (adxbdy - bdxady);

    let permanent = (bdxcdy.abs() + cdxbdy.abs()) * adz.abs()
        + (cdxady.abs() + adxcdy.abs()) * bdz.abs()
        + (adxbdy.abs() + bdxady.abs()) * cdz.abs();
    let bound = O3D_ERRBOUND * permanent;
    if det > bound || -det > bound {
        return det;
    }
    orient3d_exact(a, b, c, d)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn error_free_transforms_are_exact() {
        let (s, e) = two_sum(1.0, 1e-20);
        assert_eq!(s, 1.0);
        assert_eq!(e, 1e-20);
        let (d, e) = two_diff(1.0, 1e-20);
        assert_eq!(d, 1.0);
        assert_eq!(e, -1e-20);
        let x = 1.0 + f64::EPSILON;
        let (p, e) = two_product(x, x);
        assert_eq!(p, 1.0 + 2.0 * f64::EPSILON);
        assert_eq!(e, f64::EPSILON * f64::EPSILON);
    }

    #[test]
    fn exact_path_resolves_near_coplanar_points() {
        let a = Vector3::new(1e14, 0.0, 0.0);
        let b = Vector3::new(0.0, 1e14, 0.0);
        let c = Vector3::new(0.0, 0.0, 1e14);
        let on_plane = Vector3::new(5e13, 5e13, 0.0);
        let above = Vector3::new(5e13, 5e13, 1e-3);
        assert_eq!(orient3d(&a, &b, &c, &on_plane), 0.0);
        assert!(orient3d(&a, &b, &c, &above) < 0.0);
        assert!(orient3d(&c, &b, &a, &above) > 0.0);
    }
}
