// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node-level broadphase between the two sets.

use clash_geom::broad::bvh::traverse_pair;
use clash_geom::broad::{BoundsPredicate, OverlapBeyond, WithinDistance};
use tracing::{info, instrument};

use crate::model::ClashMode;
use crate::scene::SetGraph;

/// The node-level pruning predicate for `mode`.
pub fn predicate(mode: ClashMode, tolerance: f64) -> Box<dyn BoundsPredicate + Sync> {
    match mode {
        ClashMode::Clearance => Box::new(WithinDistance { tolerance }),
        ClashMode::Hard => Box::new(OverlapBeyond { tolerance }),
    }
}

/// Returns every `(set A node, set B node)` pair whose world bounds pass
/// the mode's predicate, sorted.
#[instrument(skip_all, fields(mode = ?mode, tolerance))]
pub fn candidate_pairs(
    a: &SetGraph,
    b: &SetGraph,
    mode: ClashMode,
    tolerance: f64,
) -> Vec<(usize, usize)> {
    let predicate = predicate(mode, tolerance);
    let mut pairs = Vec::new();
    traverse_pair(a.bvh(), b.bvh(), predicate.as_ref(), |i, j| pairs.push((i, j)));
    pairs.sort_unstable();
    info!(pairs = pairs.len(), "broadphase complete");
    pairs
}
