// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::{Matrix, Vector3};

/// Widens the closed interval `[lo, hi]` by one ulp on each side.
///
/// Used after any floating point transform of bounds so that the rounded
/// result is guaranteed to contain the exact one.
pub fn round_out(lo: f64, hi: f64) -> (f64, f64) {
    (lo.next_down(), hi.next_up())
}

/// Axis-aligned bounding box in double precision.
///
/// Invariants:
/// - For non-empty bounds, `min` components are less than or equal to `max`
///   components.
/// - [`Bounds::EMPTY`] is inverted (`+inf` min, `-inf` max) so that it is the
///   identity of [`Bounds::union`].
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    min: Vector3,
    max: Vector3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds {
    /// The empty bounds; contains nothing and overlaps nothing.
    pub const EMPTY: Self = Self {
        min: Vector3::splat(f64::INFINITY),
        max: Vector3::splat(f64::NEG_INFINITY),
    };

    /// Constructs bounds from minimum and maximum corners.
    pub fn new(min: Vector3, max: Vector3) -> Self {
        debug_assert!(
            min.x() <= max.x() && min.y() <= max.y() && min.z() <= max.z(),
            "invalid bounds: min > max"
        );
        Self { min, max }
    }

    /// Returns the minimum corner.
    pub fn min(&self) -> Vector3 {
        self.min
    }

    /// Returns the maximum corner.
    pub fn max(&self) -> Vector3 {
        self.max
    }

    /// Returns `true` if no point is inside the bounds.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Builds bounds centred at `center` with the given half extents.
    pub fn from_center_half_extents(center: Vector3, half: Vector3) -> Self {
        Self::new(center - half, center + half)
    }

    /// Smallest bounds containing all `points`; empty for an empty slice.
    pub fn from_points(points: &[Vector3]) -> Self {
        points.iter().fold(Self::EMPTY, |b, p| b.extended(p))
    }

    /// Returns these bounds grown to include `p`.
    pub fn extended(&self, p: &Vector3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Union of two bounds.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Returns `true` if the bounds overlap (inclusive on faces).
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    /// Returns `true` if `other` lies entirely within these bounds.
    pub fn contains(&self, other: &Self) -> bool {
        (0..3).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
    }

    /// Intersection of two bounds, or `None` when they are disjoint.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Self {
            min: self.min.max(&other.min),
            max: self.max.min(&other.max),
        })
    }

    /// Bounds moved by `v`.
    pub fn translated(&self, v: Vector3) -> Self {
        Self {
            min: self.min + v,
            max: self.max + v,
        }
    }

    /// Inflates the bounds by a uniform margin in all directions.
    pub fn inflate(&self, margin: f64) -> Self {
        let delta = Vector3::splat(margin);
        Self {
            min: self.min - delta,
            max: self.max + delta,
        }
    }

    /// Centre point.
    pub fn center(&self) -> Vector3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along each axis.
    pub fn extent(&self) -> Vector3 {
        self.max - self.min
    }

    /// Largest absolute coordinate of either corner.
    pub fn max_abs(&self) -> f64 {
        self.min.max_abs().max(self.max.max_abs())
    }

    /// Squared Euclidean distance between the closest points of the two
    /// boxes; zero when they overlap.
    pub fn min_distance_squared(&self, other: &Self) -> f64 {
        let mut d = 0.0;
        for i in 0..3 {
            let gap = (other.min[i] - self.max[i]).max(self.min[i] - other.max[i]);
            if gap > 0.0 {
                d += gap * gap;
            }
        }
        d
    }

    /// Squared diagonal of the overlap region; zero when the boxes are
    /// disjoint along any axis.
    pub fn overlap_diagonal_squared(&self, other: &Self) -> f64 {
        let mut d = 0.0;
        for i in 0..3 {
            let lo = self.min[i].max(other.min[i]);
            let hi = self.max[i].min(other.max[i]);
            if hi < lo {
                return 0.0;
            }
            d += (hi - lo) * (hi - lo);
        }
        d
    }

    /// Bounds of this box after transformation by `mat`, evaluated at the
    /// eight corners.
    pub fn transformed(&self, mat: &Matrix) -> Self {
        if self.is_empty() {
            return *self;
        }
        let [minx, miny, minz] = self.min.to_array();
        let [maxx, maxy, maxz] = self.max.to_array();
        let corners = [
            Vector3::new(minx, miny, minz),
            Vector3::new(minx, miny, maxz),
            Vector3::new(minx, maxy, minz),
            Vector3::new(minx, maxy, maxz),
            Vector3::new(maxx, miny, minz),
            Vector3::new(maxx, miny, maxz),
            Vector3::new(maxx, maxy, minz),
            Vector3::new(maxx, maxy, maxz),
        ];
        corners
            .iter()
            .fold(Self::EMPTY, |b, c| b.extended(&mat.transform_point(c)))
    }

    /// Bounds widened by one ulp outward on every face.
    pub fn rounded_out(&self) -> Self {
        let axis = |i: usize| round_out(self.min[i], self.max[i]);
        let (x0, x1) = axis(0);
        let (y0, y1) = axis(1);
        let (z0, z1) = axis(2);
        Self {
            min: Vector3::new(x0, y0, z0),
            max: Vector3::new(x1, y1, z1),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn unit() -> Bounds {
        Bounds::new(Vector3::splat(-0.5), Vector3::splat(0.5))
    }

    #[test]
    fn empty_is_union_identity() {
        let b = unit();
        assert_eq!(Bounds::EMPTY.union(&b), b);
        assert!(Bounds::EMPTY.is_empty());
        assert!(!Bounds::EMPTY.overlaps(&b));
    }

    #[test]
    fn min_distance_is_euclidean() {
        let a = unit();
        let b = Bounds::new(Vector3::new(1.5, 1.5, -0.5), Vector3::new(2.5, 2.5, 0.5));
        assert!((a.min_distance_squared(&b) - 2.0).abs() < 1e-12);
        assert_eq!(a.min_distance_squared(&a), 0.0);
    }

    #[test]
    fn overlap_diagonal_zero_when_touching_apart() {
        let a = unit();
        let b = Bounds::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        assert!((a.overlap_diagonal_squared(&b) - 0.75).abs() < 1e-12);
        let c = Bounds::new(Vector3::new(0.6, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(a.overlap_diagonal_squared(&c), 0.0);
    }
}
