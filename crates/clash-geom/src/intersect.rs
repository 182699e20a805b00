// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Triangle interpenetration bounds and box separation.

use crate::math::Vector3;
use crate::predicates::orient3d;
use crate::types::bounds::Bounds;
use crate::types::triangle::Triangle;

/// Side of a plane for each vertex of a triangle: `1` along the plane
/// normal, `-1` against it, `0` on the plane. Exact.
fn sides(plane: &Triangle, t: &Triangle) -> [i8; 3] {
    let [p0, p1, p2] = plane.vertices;
    t.vertices.map(|v| {
        let o = orient3d(&p0, &p1, &p2, &v);
        if o < 0.0 {
            1
        } else if o > 0.0 {
            -1
        } else {
            0
        }
    })
}

fn separated(s: &[i8; 3]) -> bool {
    s.iter().all(|&x| x > 0) || s.iter().all(|&x| x < 0) || s.iter().all(|&x| x == 0)
}

/// Signed distances of the vertices of `t` from the plane of `plane`,
/// clamped so they never disagree with the exact sides.
fn distances(plane: &Triangle, normal: &Vector3, t: &Triangle, s: &[i8; 3]) -> [f64; 3] {
    let origin = plane.a();
    let mut out = [0.0; 3];
    for i in 0..3 {
        let d = normal.dot(&(t.vertices[i] - origin));
        out[i] = match s[i] {
            1 => d.max(0.0),
            -1 => d.min(0.0),
            _ => 0.0,
        };
    }
    out
}

/// Interval covered on `axis` by the part of `t` lying in the other plane.
fn interval(t: &Triangle, d: &[f64; 3], s: &[i8; 3], axis: &Vector3) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut push = |p: Vector3| {
        let x = axis.dot(&p);
        lo = lo.min(x);
        hi = hi.max(x);
    };
    for i in 0..3 {
        let j = (i + 1) % 3;
        if s[i] == 0 {
            push(t.vertices[i]);
        }
        if s[i] * s[j] < 0 {
            let (u, v) = (t.vertices[i], t.vertices[j]);
            let denom = d[i] - d[j];
            let p = if denom == 0.0 {
                (u + v) * 0.5
            } else {
                u + (v - u) * (d[i] / denom)
            };
            push(p);
        }
    }
    (lo, hi)
}

/// How far a triangle extends through the other plane: the smaller of its
/// reach on either side.
fn depth(d: &[f64; 3]) -> f64 {
    let above = d.iter().fold(0.0_f64, |m, &x| m.max(x));
    let below = d.iter().fold(0.0_f64, |m, &x| m.max(-x));
    above.min(below)
}

/// Upper bound on the translation needed to separate two triangles.
///
/// Returns `0.0` when the triangles are disjoint, coplanar or degenerate.
/// Otherwise the result is the least of:
/// - the shift along the planes' intersection line that separates the
///   triangles' intervals in either direction,
/// - the depth of `a` through the plane of `b`,
/// - the depth of `b` through the plane of `a`.
///
/// Disjointness is decided with [`orient3d`], so the zero result is exact.
/// The value is symmetric in its arguments and independent of vertex order
/// and winding up to rounding.
pub fn intersects(a: &Triangle, b: &Triangle) -> f64 {
    let na = a.normal();
    let nb = b.normal();
    if na == Vector3::ZERO || nb == Vector3::ZERO {
        return 0.0;
    }

    let sa = sides(b, a);
    if separated(&sa) {
        return 0.0;
    }
    let sb = sides(a, b);
    if separated(&sb) {
        return 0.0;
    }

    let axis = na.cross(&nb).normalize();
    if axis == Vector3::ZERO {
        return 0.0;
    }

    let da = distances(b, &nb, a, &sa);
    let db = distances(a, &na, b, &sb);
    let (a_lo, a_hi) = interval(a, &da, &sa, &axis);
    let (b_lo, b_hi) = interval(b, &db, &sb, &axis);
    if a_hi < b_lo || b_hi < a_lo {
        return 0.0;
    }

    (a_hi - b_lo)
        .min(b_hi - a_lo)
        .min(depth(&da))
        .min(depth(&db))
        .max(0.0)
}

/// Smallest axis-aligned translation of `a` that separates it from `b`.
///
/// For each axis the overlap is measured in both directions; when either
/// is not positive the boxes are already separated and the zero vector is
/// returned. Otherwise the shorter direction on each axis is a candidate,
/// and the shortest candidate overall wins. Ties resolve to the lower axis.
///
/// # Examples
/// ```
/// use clash_geom::intersect::minimum_separating_axis;
/// use clash_geom::math::Vector3;
/// use clash_geom::types::bounds::Bounds;
/// let r = Bounds::new(Vector3::splat(-0.5), Vector3::splat(0.5));
/// let shifted = Bounds::new(Vector3::new(0.4, -0.5, -0.5), Vector3::new(1.4, 0.5, 0.5));
/// let v = minimum_separating_axis(&r, &shifted);
/// assert!((v.x() + 0.1).abs() < 1e-12);
/// ```
pub fn minimum_separating_axis(a: &Bounds, b: &Bounds) -> Vector3 {
    let mut best = Vector3::ZERO;
    let mut best_len = f64::INFINITY;
    for (i, unit) in Vector3::AXES.iter().enumerate() {
        let d1 = a.max()[i] - b.min()[i];
        let d2 = b.max()[i] - a.min()[i];
        if d1 <= 0.0 || d2 <= 0.0 {
            return Vector3::ZERO;
        }
        let candidate = if d1 < d2 { *unit * -d1 } else { *unit * d2 };
        let len = candidate.norm();
        if len < best_len {
            best = candidate;
            best_len = len;
        }
    }
    best
}
