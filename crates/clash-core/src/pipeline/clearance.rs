// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Clearance narrowphase: minimum distance per composite pair.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;

use clash_geom::broad::bvh::traverse_pair;
use clash_geom::broad::WithinDistance;
use clash_geom::distance::closest_point_triangle_triangle;
use clash_geom::Line;
use rustc_hash::FxHashMap;
use tracing::{info, instrument};

use super::Narrowphase;
use crate::error::Result;
use crate::exec::{execute_parallel, DEFAULT_CHUNK};
use crate::fingerprint;
use crate::report::Clash;

type Closest = FxHashMap<(usize, usize), Line>;

/// Total order on candidate lines: shorter first, then by coordinates.
fn compare(x: &Line, y: &Line) -> Ordering {
    x.magnitude_squared()
        .total_cmp(&y.magnitude_squared())
        .then_with(|| x.start.total_cmp(&y.start))
        .then_with(|| x.end.total_cmp(&y.end))
}

fn offer(closest: &mut Closest, key: (usize, usize), line: Line) {
    match closest.entry(key) {
        Entry::Vacant(v) => {
            v.insert(line);
        }
        Entry::Occupied(mut o) => {
            if compare(&line, o.get()).is_lt() {
                o.insert(line);
            }
        }
    }
}

/// Closest line within tolerance between the meshes of node pair `(i, j)`,
/// oriented from A to B.
fn closest_between(np: &Narrowphase<'_>, i: usize, j: usize) -> Result<Option<Line>> {
    let ma = np.cache.acquire(np.slots_a[i])?;
    let mb = np.cache.acquire(np.slots_b[j])?;
    let predicate = WithinDistance {
        tolerance: np.tolerance,
    };
    let mut best: Option<Line> = None;
    traverse_pair(&ma.bvh, &mb.bvh, &predicate, |ti, tj| {
        let line = closest_point_triangle_triangle(&ma.triangles[ti], &mb.triangles[tj]);
        if line.magnitude() <= np.tolerance
            && best.as_ref().is_none_or(|b| compare(&line, b).is_lt())
        {
            best = Some(line);
        }
    });
    Ok(best)
}

/// Runs the clearance test over the scheduled node `pairs`.
#[instrument(skip_all, fields(pairs = pairs.len(), workers = np.workers))]
pub fn run(np: &Narrowphase<'_>, pairs: &[(usize, usize)]) -> Result<Vec<Clash>> {
    np.retain_pairs(pairs);
    np.cache.load(np.handler, np.schedule_order(pairs))?;

    let partials = execute_parallel(pairs, np.workers, DEFAULT_CHUNK, Closest::default, |acc, &(i, j)| {
        let found = closest_between(np, i, j);
        np.release_pair(i, j);
        if let Some(line) = found? {
            for key in np.composite_pairs(i, j) {
                offer(acc, key, line);
            }
        }
        Ok(())
    })?;

    let mut merged = Closest::default();
    for partial in partials {
        for (key, line) in partial {
            offer(&mut merged, key, line);
        }
    }

    let clashes: Vec<Clash> = merged
        .into_iter()
        .map(|((ca, cb), line)| Clash {
            id_a: np.a.composite_id(ca),
            id_b: np.b.composite_id(cb),
            positions: [line.start, line.end],
            fingerprint: fingerprint::clearance(&line),
        })
        .collect();
    info!(clashes = clashes.len(), evictions = np.cache.evictions(), "clearance narrowphase complete");
    Ok(clashes)
}
