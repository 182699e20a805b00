// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![forbid(unsafe_code)]
#![doc = r"Geometry kernel for clash detection.

This crate provides:
- Double precision vectors and affine matrices (`math`).
- Bounds, triangles and segments (`types`).
- An exact orientation predicate (`predicates::orient3d`).
- Closest-point queries between segments and triangles (`distance`).
- A triangle interpenetration bound and box separation (`intersect`).
- A static BVH with dual-tree traversal (`broad`).
- The PolyDepth penetration estimator (`polydepth`).

Design notes:
- `f64` throughout. Source vertices are promoted on load and never
  demoted.
- Deterministic: no ambient RNG, no hash-ordered iteration, and every
  tie is broken by a total order.
- Bounds derived from transformed geometry are rounded outward by one ulp
  so culling never drops a true contact.
"]

/// Bounding volume hierarchies and pruning predicates.
pub mod broad;
/// Closest-point queries.
pub mod distance;
/// Triangle intersection depth and separating axes.
pub mod intersect;
/// Linear algebra.
pub mod math;
/// Penetration depth estimation.
pub mod polydepth;
/// Exact geometric predicates.
pub mod predicates;
/// Foundational geometric types.
pub mod types;

pub use math::{Matrix, Vector3};
pub use types::bounds::Bounds;
pub use types::line::Line;
pub use types::triangle::Triangle;
