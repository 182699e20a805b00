// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Closest-point queries between points, segments and triangles.
//!
//! Formulations follow the region-based derivations in Ericson, *Real-Time
//! Collision Detection* (§5.1). All arithmetic is `f64`.

use crate::math::Vector3;
use crate::types::line::Line;
use crate::types::triangle::Triangle;

/// Squared-length threshold below which a segment is treated as a point.
const DEGENERATE: f64 = f64::EPSILON;

/// Closest point on triangle `t` to point `p`.
///
/// A triangle with collinear or coincident vertices is treated as its
/// edges.
pub fn closest_point_triangle(p: &Vector3, t: &Triangle) -> Vector3 {
    let [a, b, c] = t.vertices;
    if t.cross() == Vector3::ZERO {
        return closest_point_degenerate(p, t);
    }
    let ab = b - a;
    let ac = c - a;
    let ap = *p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = *p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = *p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

fn closest_point_degenerate(p: &Vector3, t: &Triangle) -> Vector3 {
    let point = Line::point(*p);
    t.edges()
        .iter()
        .map(|&(s, e)| closest_point_line_line(&point, &Line::new(s, e)).end)
        .min_by(|x, y| (*x - *p).norm_squared().total_cmp(&(*y - *p).norm_squared()))
        .unwrap_or(t.vertices[0])
}

/// Segment from `p` to its closest point on triangle `t`.
pub fn closest_point_point_triangle(p: &Vector3, t: &Triangle) -> Line {
    Line::new(*p, closest_point_triangle(p, t))
}

/// Shortest segment between segments `a` and `b`, oriented from `a` to `b`.
///
/// A segment whose squared length is at most `f64::EPSILON` is treated as a
/// point.
pub fn closest_point_line_line(a: &Line, b: &Line) -> Line {
    let d1 = a.direction();
    let d2 = b.direction();
    let r = a.start - b.start;
    let aa = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if aa <= DEGENERATE && e <= DEGENERATE {
        (0.0, 0.0)
    } else if aa <= DEGENERATE {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= DEGENERATE {
            ((-c / aa).clamp(0.0, 1.0), 0.0)
        } else {
            let bb = d1.dot(&d2);
            let denom = aa * e - bb * bb;
            let mut s = if denom == 0.0 {
                0.0
            } else {
                ((bb * f - c * e) / denom).clamp(0.0, 1.0)
            };
            let mut t = (bb * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / aa).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((bb - c) / aa).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };
    Line::new(a.at(s), b.at(t))
}

/// Intersection of segment `edge` with the interior of triangle `face`
/// (Möller–Trumbore), as a zero-length line at the hit point.
///
/// Returns `None` when the segment is parallel to the face, misses it, or
/// only touches it at its start point.
pub fn line_face_intersection(edge: &Line, face: &Triangle) -> Option<Line> {
    let [v0, v1, v2] = face.vertices;
    let dir = edge.direction();
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let pvec = dir.cross(&e2);
    let det = e1.dot(&pvec);
    if det.abs() < f64::EPSILON {
        return None;
    }
    let inv = 1.0 / det;
    let s = edge.start - v0;
    let u = s.dot(&pvec) * inv;
    if outside_unit(u) {
        return None;
    }
    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv;
    if (v < 0.0 && v.abs() > f64::EPSILON) || (u + v > 1.0 && outside_unit(u + v)) {
        return None;
    }
    let t = e2.dot(&q) * inv;
    if t > f64::EPSILON && t < 1.0 {
        Some(Line::point(edge.at(t)))
    } else {
        None
    }
}

/// `true` when `x` lies outside `[0, 1]` by more than `f64::EPSILON`.
fn outside_unit(x: f64) -> bool {
    (x < 0.0 && x.abs() > f64::EPSILON) || (x > 1.0 && (x - 1.0).abs() > f64::EPSILON)
}

/// Shortest segment between triangles `a` and `b`, oriented from `a` to `b`.
///
/// Evaluates the nine edge pairs, the six vertex-face pairs and the six
/// edge-through-face cases and returns the shortest candidate. Ties keep the
/// first candidate in that order.
pub fn closest_point_triangle_triangle(a: &Triangle, b: &Triangle) -> Line {
    let a_edges = a.edges().map(|(s, e)| Line::new(s, e));
    let b_edges = b.edges().map(|(s, e)| Line::new(s, e));

    let mut best = closest_point_line_line(&a_edges[0], &b_edges[0]);
    let mut best_sq = best.magnitude_squared();
    let mut consider = |line: Line| {
        let sq = line.magnitude_squared();
        if sq < best_sq {
            best = line;
            best_sq = sq;
        }
    };

    for ea in &a_edges {
        for eb in &b_edges {
            consider(closest_point_line_line(ea, eb));
        }
    }
    for va in &a.vertices {
        consider(closest_point_point_triangle(va, b));
    }
    for vb in &b.vertices {
        consider(closest_point_point_triangle(vb, a).reversed());
    }
    for ea in &a_edges {
        if let Some(hit) = line_face_intersection(ea, b) {
            consider(hit);
        }
    }
    for eb in &b_edges {
        if let Some(hit) = line_face_intersection(eb, a) {
            consider(hit);
        }
    }
    best
}
