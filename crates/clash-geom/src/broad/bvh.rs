// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::broad::BoundsPredicate;
use crate::types::bounds::Bounds;
use crate::types::triangle::Triangle;

/// A primitive stored in the hierarchy.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BvhPrimitive {
    /// Bounds of the primitive.
    pub bounds: Bounds,
    /// Index into the caller's primitive array.
    pub index: usize,
}

impl BvhPrimitive {
    /// Creates a primitive.
    pub fn new(bounds: Bounds, index: usize) -> Self {
        Self { bounds, index }
    }

    fn centroid(&self, axis: usize) -> f64 {
        (self.bounds.min()[axis] + self.bounds.max()[axis]) * 0.5
    }
}

#[derive(Debug, Clone)]
enum BvhNode {
    Internal {
        bounds: Bounds,
        left: usize,
        right: usize,
    },
    Leaf {
        bounds: Bounds,
        first: usize,
        count: usize,
    },
}

impl BvhNode {
    fn bounds(&self) -> &Bounds {
        match self {
            Self::Internal { bounds, .. } | Self::Leaf { bounds, .. } => bounds,
        }
    }
}

/// Static bounding volume hierarchy built top-down by median split.
///
/// Construction splits each node on the axis of largest extent, ordering
/// primitives by centroid with ties broken by index, so the tree shape is a
/// pure function of the input.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    primitives: Vec<BvhPrimitive>,
    max_primitives_per_leaf: usize,
}

impl Default for Bvh {
    fn default() -> Self {
        Self::new()
    }
}

impl Bvh {
    /// Creates an empty hierarchy with the default leaf size (4).
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            primitives: Vec::new(),
            max_primitives_per_leaf: 4,
        }
    }

    /// Sets the maximum number of primitives per leaf (at least 1).
    #[must_use]
    pub fn with_max_primitives_per_leaf(mut self, max: usize) -> Self {
        self.max_primitives_per_leaf = max.max(1);
        self
    }

    /// Builds a hierarchy with the default leaf size.
    pub fn build(primitives: Vec<BvhPrimitive>) -> Self {
        Self::new().build_from(primitives)
    }

    /// Builds a hierarchy over the bounds of `triangles`; primitive indices
    /// are triangle indices.
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        Self::build(
            triangles
                .iter()
                .enumerate()
                .map(|(i, t)| BvhPrimitive::new(t.bounds(), i))
                .collect(),
        )
    }

    /// Builds the hierarchy from primitives, consuming the builder.
    #[must_use]
    pub fn build_from(mut self, mut primitives: Vec<BvhPrimitive>) -> Self {
        self.nodes.clear();
        if primitives.is_empty() {
            self.primitives = primitives;
            return self;
        }
        self.nodes.reserve(primitives.len() * 2);
        let len = primitives.len();
        self.build_recursive(&mut primitives, 0, len);
        self.primitives = primitives;
        self
    }

    fn build_recursive(&mut self, primitives: &mut [BvhPrimitive], start: usize, end: usize) -> usize {
        let count = end - start;
        let bounds = primitives[start..end]
            .iter()
            .fold(Bounds::EMPTY, |b, p| b.union(&p.bounds));

        let node_idx = self.nodes.len();
        if count <= self.max_primitives_per_leaf {
            self.nodes.push(BvhNode::Leaf {
                bounds,
                first: start,
                count,
            });
            return node_idx;
        }

        let extent = bounds.extent();
        let axis = if extent.x() >= extent.y() && extent.x() >= extent.z() {
            0
        } else if extent.y() >= extent.z() {
            1
        } else {
            2
        };
        primitives[start..end].sort_by(|a, b| {
            a.centroid(axis)
                .total_cmp(&b.centroid(axis))
                .then(a.index.cmp(&b.index))
        });
        let mid = start + count / 2;

        self.nodes.push(BvhNode::Internal {
            bounds,
            left: 0,
            right: 0,
        });
        let left_idx = self.build_recursive(primitives, start, mid);
        let right_idx = self.build_recursive(primitives, mid, end);
        if let BvhNode::Internal { left, right, .. } = &mut self.nodes[node_idx] {
            *left = left_idx;
            *right = right_idx;
        }
        node_idx
    }

    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Returns `true` if the hierarchy holds no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Bounds of the whole hierarchy; empty when there are no primitives.
    pub fn root_bounds(&self) -> Bounds {
        self.nodes.first().map_or(Bounds::EMPTY, |n| *n.bounds())
    }

    /// Walks every subtree in depth-first order; `visit` receives a node's
    /// bounds and returns whether to descend. Leaf primitives reached this
    /// way are passed to `leaf`.
    pub fn walk(
        &self,
        mut visit: impl FnMut(&Bounds) -> bool,
        mut leaf: impl FnMut(&BvhPrimitive),
    ) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0_usize];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if !visit(node.bounds()) {
                continue;
            }
            match node {
                BvhNode::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
                BvhNode::Leaf { first, count, .. } => {
                    self.primitives[*first..*first + *count].iter().for_each(&mut leaf);
                }
            }
        }
    }
}

/// Dual-tree traversal reporting every primitive pair `(a, b)` accepted by
/// `predicate`.
///
/// Uses an explicit stack; subtrees rejected by the predicate are pruned.
/// When both nodes are internal the one with the larger extent is split.
/// The visiting order is deterministic but not sorted.
pub fn traverse_pair<P: BoundsPredicate + ?Sized>(
    a: &Bvh,
    b: &Bvh,
    predicate: &P,
    mut visit: impl FnMut(usize, usize),
) {
    if a.nodes.is_empty() || b.nodes.is_empty() {
        return;
    }
    let mut stack = vec![(0_usize, 0_usize)];
    while let Some((ia, ib)) = stack.pop() {
        let na = &a.nodes[ia];
        let nb = &b.nodes[ib];
        if !predicate.test(na.bounds(), nb.bounds()) {
            continue;
        }
        match (na, nb) {
            (
                BvhNode::Leaf {
                    first: fa,
                    count: ca,
                    ..
                },
                BvhNode::Leaf {
                    first: fb,
                    count: cb,
                    ..
                },
            ) => {
                for pa in &a.primitives[*fa..*fa + *ca] {
                    for pb in &b.primitives[*fb..*fb + *cb] {
                        if predicate.test(&pa.bounds, &pb.bounds) {
                            visit(pa.index, pb.index);
                        }
                    }
                }
            }
            (BvhNode::Internal { left, right, .. }, BvhNode::Leaf { .. }) => {
                stack.push((*right, ib));
                stack.push((*left, ib));
            }
            (BvhNode::Leaf { .. }, BvhNode::Internal { left, right, .. }) => {
                stack.push((ia, *right));
                stack.push((ia, *left));
            }
            (
                BvhNode::Internal {
                    bounds: ba,
                    left: la,
                    right: ra,
                },
                BvhNode::Internal {
                    bounds: bb,
                    left: lb,
                    right: rb,
                },
            ) => {
                if ba.extent().norm_squared() >= bb.extent().norm_squared() {
                    stack.push((*ra, ib));
                    stack.push((*la, ib));
                } else {
                    stack.push((ia, *rb));
                    stack.push((ia, *lb));
                }
            }
        }
    }
}
