// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sparse scene graph: resolves mesh references to placed mesh nodes.
//!
//! Only the nodes on the paths from the requested meshes to the container
//! root are fetched. Transforms are accumulated bottom-up, one level (one
//! scan) at a time, then the container's root transform
//! `scale(units → mm) · translate(coord offset)` is applied.

use std::collections::{BTreeMap, BTreeSet};

use clash_geom::broad::bvh::{Bvh, BvhPrimitive};
use clash_geom::{Bounds, Matrix};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::{DatabaseError, DatabaseHandler, Field, Filter, NodeKind, Projection};
use crate::error::{ClashError, Result};
use crate::model::{CompositeObject, Container};

/// Levels of parent links followed before the graph is declared cyclic.
const MAX_DEPTH: usize = 4096;

/// A mesh node placed in project space.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Container holding the mesh.
    pub container: Container,
    /// Unique id of the mesh node.
    pub unique_id: Uuid,
    /// Shared id of the mesh node.
    pub shared_id: Uuid,
    /// Accumulated local-to-project transform (millimetres).
    pub matrix: Matrix,
    /// Mesh bounds in the local frame.
    pub local_bounds: Bounds,
    /// Project-space bounds, rounded outward.
    pub world_bounds: Bounds,
}

/// Fetches the mesh nodes `unique_ids` from `container` and resolves their
/// project-space transforms.
///
/// Returns the nodes sorted by unique id. Ids that are not mesh nodes in
/// the container raise [`ClashError::MissingNode`].
#[instrument(skip_all, fields(container = %container, meshes = unique_ids.len()))]
pub fn populate(
    handler: &dyn DatabaseHandler,
    container: &Container,
    unique_ids: &BTreeSet<Uuid>,
) -> Result<Vec<Node>> {
    let mut nodes = Vec::with_capacity(unique_ids.len());
    // parent shared id -> nodes whose transform still needs that parent
    let mut pending: BTreeMap<Uuid, Vec<usize>> = BTreeMap::new();

    let ids: Vec<Uuid> = unique_ids.iter().copied().collect();
    let mut found = BTreeMap::new();
    for doc in handler.scan(container, &Filter::UniqueIds(ids), &Projection::all())? {
        let doc = doc?;
        if let NodeKind::Mesh { bounds } = doc.kind {
            found.insert(doc.unique_id, (doc.shared_id, doc.parents.first().copied(), bounds));
        }
    }
    for unique_id in unique_ids {
        let Some((shared_id, parent, bounds)) = found.remove(unique_id) else {
            return Err(ClashError::MissingNode {
                container: container.clone(),
                unique_id: *unique_id,
            });
        };
        if let Some(parent) = parent {
            pending.entry(parent).or_default().push(nodes.len());
        }
        nodes.push(Node {
            container: container.clone(),
            unique_id: *unique_id,
            shared_id,
            matrix: Matrix::identity(),
            local_bounds: bounds,
            world_bounds: Bounds::EMPTY,
        });
    }

    let links = Projection::fields([Field::Parents, Field::Payload]);
    let mut depth = 0;
    while !pending.is_empty() {
        depth += 1;
        if depth > MAX_DEPTH {
            return Err(DatabaseError::Corrupt {
                container: container.clone(),
                reason: "parent links form a cycle".into(),
            }
            .into());
        }
        let shared: Vec<Uuid> = pending.keys().copied().collect();
        let mut next: BTreeMap<Uuid, Vec<usize>> = BTreeMap::new();
        for doc in handler.scan(container, &Filter::SharedIds(shared), &links)? {
            let doc = doc?;
            let Some(children) = pending.remove(&doc.shared_id) else {
                continue;
            };
            if let NodeKind::Transformation { matrix } = doc.kind {
                for &i in &children {
                    nodes[i].matrix = matrix * nodes[i].matrix;
                }
            }
            if let Some(parent) = doc.parents.first() {
                next.entry(*parent).or_default().extend(children);
            }
        }
        // Parents missing from the collection end their chains.
        pending = next;
    }

    let units = handler.settings(container)?.units;
    let offset = handler.revision(container)?.coord_offset;
    let root = Matrix::uniform_scale(units.scale_to_mm()) * Matrix::translation(offset);
    for node in &mut nodes {
        node.matrix = root * node.matrix;
        node.world_bounds = node.local_bounds.transformed(&node.matrix).rounded_out();
    }
    debug!(nodes = nodes.len(), depth, "scene populated");
    Ok(nodes)
}

/// The resolved nodes of one object set, with a BVH over their world
/// bounds.
#[derive(Debug, Clone)]
pub struct SetGraph {
    nodes: Vec<Node>,
    owners: Vec<Vec<usize>>,
    members: Vec<Vec<usize>>,
    ids: Vec<Uuid>,
    bvh: Bvh,
}

impl SetGraph {
    /// Resolves every mesh of `set`, container by container.
    ///
    /// A mesh referenced by several composites resolves to one node owned by
    /// all of them. Nodes are ordered by container, then unique id.
    pub fn build(handler: &dyn DatabaseHandler, set: &[CompositeObject]) -> Result<Self> {
        let mut by_container: BTreeMap<&Container, BTreeSet<Uuid>> = BTreeMap::new();
        for composite in set {
            for mesh in &composite.meshes {
                by_container
                    .entry(&mesh.container)
                    .or_default()
                    .insert(mesh.unique_id);
            }
        }

        let mut nodes = Vec::new();
        for (container, ids) in by_container {
            nodes.extend(populate(handler, container, &ids)?);
        }

        let index: FxHashMap<(&Container, Uuid), usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| ((&n.container, n.unique_id), i))
            .collect();
        let mut owners = vec![Vec::new(); nodes.len()];
        let mut members = vec![Vec::new(); set.len()];
        for (c, composite) in set.iter().enumerate() {
            for mesh in &composite.meshes {
                if let Some(&i) = index.get(&(&mesh.container, mesh.unique_id)) {
                    if !owners[i].contains(&c) {
                        owners[i].push(c);
                        members[c].push(i);
                    }
                }
            }
        }

        let bvh = Bvh::new().with_max_primitives_per_leaf(1).build_from(
            nodes
                .iter()
                .enumerate()
                .map(|(i, n)| BvhPrimitive::new(n.world_bounds, i))
                .collect(),
        );
        Ok(Self {
            nodes,
            owners,
            members,
            ids: set.iter().map(|c| c.id).collect(),
            bvh,
        })
    }

    /// Resolved nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Indices of the composites owning node `node`.
    pub fn owners(&self, node: usize) -> &[usize] {
        &self.owners[node]
    }

    /// Indices of the nodes making up composite `composite`.
    pub fn members(&self, composite: usize) -> &[usize] {
        &self.members[composite]
    }

    /// Id of composite `composite`.
    pub fn composite_id(&self, composite: usize) -> Uuid {
        self.ids[composite]
    }

    /// BVH over node world bounds; primitive indices are node indices.
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }
}
