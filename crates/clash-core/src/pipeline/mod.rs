// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Narrowphase pipelines, one per clash mode.
//!
//! Both take the scheduled node pairs, retain and load the meshes they
//! need, run the per-pair test on the worker pool and merge the per-worker
//! partials into one clash per composite pair.

pub mod clearance;
pub mod hard;

use crate::cache::NodeCache;
use crate::db::DatabaseHandler;
use crate::scene::SetGraph;

/// Everything a narrowphase needs besides the pair list.
#[derive(Clone, Copy)]
pub struct Narrowphase<'a> {
    /// Storage the cache loads buffers from.
    pub handler: &'a dyn DatabaseHandler,
    /// Set A.
    pub a: &'a SetGraph,
    /// Set B.
    pub b: &'a SetGraph,
    /// Cache slot of each set A node.
    pub slots_a: &'a [usize],
    /// Cache slot of each set B node.
    pub slots_b: &'a [usize],
    /// Shared mesh cache.
    pub cache: &'a NodeCache,
    /// Tolerance in millimetres.
    pub tolerance: f64,
    /// Worker count.
    pub workers: usize,
}

impl Narrowphase<'_> {
    /// Composite pairs `(set A composite, set B composite)` owning the node
    /// pair `(i, j)`.
    pub fn composite_pairs(&self, i: usize, j: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.a
            .owners(i)
            .iter()
            .flat_map(move |&ca| self.b.owners(j).iter().map(move |&cb| (ca, cb)))
    }

    /// Retains both meshes of every pair.
    fn retain_pairs(&self, pairs: &[(usize, usize)]) {
        for &(i, j) in pairs {
            self.cache.retain(self.slots_a[i]);
            self.cache.retain(self.slots_b[j]);
        }
    }

    /// Releases both meshes of one pair.
    fn release_pair(&self, i: usize, j: usize) {
        self.cache.release(self.slots_a[i]);
        self.cache.release(self.slots_b[j]);
    }

    /// Cache slots of `pairs` in schedule order.
    fn schedule_order<'p>(&'p self, pairs: &'p [(usize, usize)]) -> impl Iterator<Item = usize> + 'p {
        pairs
            .iter()
            .flat_map(|&(i, j)| [self.slots_a[i], self.slots_b[j]])
    }
}
