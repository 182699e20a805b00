// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Hard narrowphase: interpenetration per composite pair.
//!
//! Stage one marks composite pairs whose meshes have a triangle pair
//! intersecting beyond contact and collects the contact region. Stage two
//! runs PolyDepth over the whole composites of every marked pair.

use std::collections::BTreeSet;

use clash_geom::broad::bvh::traverse_pair;
use clash_geom::broad::Overlap;
use clash_geom::intersect::intersects;
use clash_geom::polydepth::{PolyDepth, CONTACT_EPSILON};
use clash_geom::{Bounds, Triangle};
use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};

use super::Narrowphase;
use crate::error::Result;
use crate::exec::{execute_parallel, DEFAULT_CHUNK};
use crate::fingerprint;
use crate::report::Clash;

/// PolyDepth refinement iterations per marked pair.
pub const POLYDEPTH_ITERATIONS: usize = 20;

type Marks = FxHashMap<(usize, usize), Bounds>;

/// Union of the overlap boxes of the intersecting triangle pairs of node
/// pair `(i, j)`, if any.
fn contact_region(np: &Narrowphase<'_>, i: usize, j: usize) -> Result<Option<Bounds>> {
    let ma = np.cache.acquire(np.slots_a[i])?;
    let mb = np.cache.acquire(np.slots_b[j])?;
    let mut region: Option<Bounds> = None;
    traverse_pair(&ma.bvh, &mb.bvh, &Overlap, |ti, tj| {
        let (ta, tb) = (&ma.triangles[ti], &mb.triangles[tj]);
        if intersects(ta, tb) > CONTACT_EPSILON {
            if let Some(overlap) = ta.bounds().intersection(&tb.bounds()) {
                region = Some(region.map_or(overlap, |r| r.union(&overlap)));
            }
        }
    });
    Ok(region)
}

fn gather(np: &Narrowphase<'_>, slots: impl Iterator<Item = usize>) -> Result<Vec<Triangle>> {
    let mut triangles = Vec::new();
    for slot in slots {
        triangles.extend_from_slice(&np.cache.acquire(slot)?.triangles);
    }
    Ok(triangles)
}

fn penetration(np: &Narrowphase<'_>, ca: usize, cb: usize, region: &Bounds) -> Result<Option<Clash>> {
    let a = gather(np, np.a.members(ca).iter().map(|&n| np.slots_a[n]))?;
    let b = gather(np, np.b.members(cb).iter().map(|&n| np.slots_b[n]))?;
    let mut pd = PolyDepth::new(a, b);
    pd.iterate(POLYDEPTH_ITERATIONS);
    let v = pd.penetration_vector();
    debug!(ca, cb, iterations = pd.iterations(), depth = v.norm(), "penetration estimated");
    if v.norm() <= np.tolerance.max(f64::from(f32::EPSILON)) {
        return Ok(None);
    }
    let anchor = region.center();
    Ok(Some(Clash {
        id_a: np.a.composite_id(ca),
        id_b: np.b.composite_id(cb),
        positions: [anchor, anchor + v],
        fingerprint: fingerprint::hard(&v, &anchor),
    }))
}

fn retain_members(np: &Narrowphase<'_>, ca: usize, cb: usize) {
    np.a.members(ca).iter().for_each(|&n| np.cache.retain(np.slots_a[n]));
    np.b.members(cb).iter().for_each(|&n| np.cache.retain(np.slots_b[n]));
}

fn release_members(np: &Narrowphase<'_>, ca: usize, cb: usize) {
    np.a.members(ca).iter().for_each(|&n| {
        np.cache.release(np.slots_a[n]);
    });
    np.b.members(cb).iter().for_each(|&n| {
        np.cache.release(np.slots_b[n]);
    });
}

/// Runs the hard test over the scheduled node `pairs`.
#[instrument(skip_all, fields(pairs = pairs.len(), workers = np.workers))]
pub fn run(np: &Narrowphase<'_>, pairs: &[(usize, usize)]) -> Result<Vec<Clash>> {
    let candidates: BTreeSet<(usize, usize)> = pairs
        .iter()
        .flat_map(|&(i, j)| np.composite_pairs(i, j))
        .collect();
    let candidates: Vec<(usize, usize)> = candidates.into_iter().collect();

    np.retain_pairs(pairs);
    for &(ca, cb) in &candidates {
        retain_members(np, ca, cb);
    }
    np.cache.load(np.handler, np.schedule_order(pairs))?;

    let partials = execute_parallel(pairs, np.workers, DEFAULT_CHUNK, Marks::default, |marks, &(i, j)| {
        let region = contact_region(np, i, j);
        np.release_pair(i, j);
        if let Some(region) = region? {
            for key in np.composite_pairs(i, j) {
                let entry = marks.entry(key).or_insert(Bounds::EMPTY);
                *entry = entry.union(&region);
            }
        }
        Ok(())
    })?;
    let mut marks = Marks::default();
    for partial in partials {
        for (key, region) in partial {
            let entry = marks.entry(key).or_insert(Bounds::EMPTY);
            *entry = entry.union(&region);
        }
    }
    info!(candidates = candidates.len(), marked = marks.len(), "interpenetrating pairs marked");

    let partials = execute_parallel(&candidates, np.workers, 1, Vec::new, |out, &(ca, cb)| {
        let found = match marks.get(&(ca, cb)) {
            Some(region) => penetration(np, ca, cb, region),
            None => Ok(None),
        };
        release_members(np, ca, cb);
        out.extend(found?);
        Ok(())
    })?;
    let clashes: Vec<Clash> = partials.into_iter().flatten().collect();
    info!(clashes = clashes.len(), evictions = np.cache.evictions(), "hard narrowphase complete");
    Ok(clashes)
}
