// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounding volume hierarchies and the pruning predicates used to walk them.

use crate::types::bounds::Bounds;

/// Bounding volume hierarchy and dual-tree traversal.
pub mod bvh;

/// Decides whether a pair of bounds may contain a reportable pair.
///
/// Implementations must be monotone: if the predicate rejects two boxes it
/// must reject every pair of boxes contained in them, so that pruning a
/// subtree never drops a result.
pub trait BoundsPredicate {
    /// Returns `true` when the pair must be kept (or descended into).
    fn test(&self, a: &Bounds, b: &Bounds) -> bool;
}

/// Keeps boxes that overlap, inclusive on faces.
#[derive(Debug, Copy, Clone, Default)]
pub struct Overlap;

impl BoundsPredicate for Overlap {
    fn test(&self, a: &Bounds, b: &Bounds) -> bool {
        a.overlaps(b)
    }
}

/// Keeps boxes whose closest points are within `tolerance`.
#[derive(Debug, Copy, Clone)]
pub struct WithinDistance {
    /// Maximum separation in project units.
    pub tolerance: f64,
}

impl BoundsPredicate for WithinDistance {
    fn test(&self, a: &Bounds, b: &Bounds) -> bool {
        a.min_distance_squared(b) <= self.tolerance * self.tolerance
    }
}

/// Keeps boxes whose overlap region has a diagonal longer than `tolerance`.
///
/// Geometry inside two boxes cannot interpenetrate by more than the
/// diagonal of their overlap.
#[derive(Debug, Copy, Clone)]
pub struct OverlapBeyond {
    /// Minimum overlap diagonal in project units.
    pub tolerance: f64,
}

impl BoundsPredicate for OverlapBeyond {
    fn test(&self, a: &Bounds, b: &Bounds) -> bool {
        a.overlap_diagonal_squared(b) > self.tolerance * self.tolerance
    }
}
