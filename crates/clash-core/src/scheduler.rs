// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ordering of broadphase pairs for the narrowphase.
//!
//! The candidate pairs form a bipartite graph between the nodes of set A
//! and set B. Pairs that share a node should run close together so the
//! node's geometry is promoted once and evicted soon after. Every policy
//! returns a permutation of its input: the multiset of pairs, duplicates
//! included, is preserved.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Scheduling policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchedulerKind {
    /// Bipartite BFS clustering starting from the least connected node.
    #[default]
    Greedy,
    /// Stable sort by `(a, b)`.
    LocalitySort,
}

/// Orders `pairs` of `(set A node, set B node)` according to `kind`.
#[instrument(skip_all, fields(kind = ?kind, pairs = pairs.len()))]
pub fn schedule(kind: SchedulerKind, pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    match kind {
        SchedulerKind::Greedy => greedy(pairs),
        SchedulerKind::LocalitySort => {
            let mut out = pairs.to_vec();
            out.sort();
            out
        }
    }
}

/// A vertex `(side, index)`; side 0 is set A, side 1 is set B.
type Vertex = (usize, usize);

struct Graph {
    /// Edge ids per vertex, by side.
    adjacency: [Vec<Vec<usize>>; 2],
    /// Live edge count per vertex, by side.
    live: [Vec<usize>; 2],
    alive: Vec<bool>,
}

impl Graph {
    fn new(pairs: &[(usize, usize)]) -> Self {
        let na = pairs.iter().map(|p| p.0 + 1).max().unwrap_or(0);
        let nb = pairs.iter().map(|p| p.1 + 1).max().unwrap_or(0);
        let mut adjacency = [vec![Vec::new(); na], vec![Vec::new(); nb]];
        for (e, &(a, b)) in pairs.iter().enumerate() {
            adjacency[0][a].push(e);
            adjacency[1][b].push(e);
        }
        let live = [
            adjacency[0].iter().map(Vec::len).collect(),
            adjacency[1].iter().map(Vec::len).collect(),
        ];
        Self {
            adjacency,
            live,
            alive: vec![true; pairs.len()],
        }
    }

    fn live(&self, (side, idx): Vertex) -> usize {
        self.live[side][idx]
    }
}

fn greedy(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut graph = Graph::new(pairs);
    let mut starts: Vec<Vertex> = (0..2)
        .flat_map(|side| (0..graph.live[side].len()).map(move |idx| (side, idx)))
        .filter(|v| graph.live(*v) > 0)
        .collect();
    starts.sort_by_key(|&(side, idx)| (graph.live[side][idx], side, idx));

    let other = |e: usize, side: usize| -> Vertex {
        let (a, b) = pairs[e];
        if side == 0 {
            (1, b)
        } else {
            (0, a)
        }
    };

    let mut out = Vec::with_capacity(pairs.len());
    let mut queue = VecDeque::new();
    let mut clusters = 0_usize;
    for start in starts {
        if graph.live(start) == 0 {
            continue;
        }
        clusters += 1;
        queue.push_back(start);
        while let Some(vertex @ (side, idx)) = queue.pop_front() {
            if graph.live(vertex) == 0 {
                continue;
            }
            let mut edges: Vec<(usize, usize)> = graph.adjacency[side][idx]
                .iter()
                .filter(|&&e| graph.alive[e])
                .map(|&e| (graph.live(other(e, side)), e))
                .collect();
            edges.sort_unstable();
            for (_, e) in edges {
                let (a, b) = pairs[e];
                graph.alive[e] = false;
                graph.live[0][a] -= 1;
                graph.live[1][b] -= 1;
                out.push(pairs[e]);
                queue.push_back(other(e, side));
            }
        }
    }
    debug!(clusters, "greedy schedule built");
    out
}
