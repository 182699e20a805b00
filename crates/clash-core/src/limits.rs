// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Precision domain check.
//!
//! Geometry is processed in f64 but stored in f32. Meshes whose local
//! coordinates or placement push them far from the origin lose the
//! resolution the narrowphase relies on, so such runs are rejected before
//! any buffers are read.

use tracing::{debug, instrument};

use crate::error::{ClashError, Result};
use crate::scene::{Node, SetGraph};

/// Largest supported absolute coordinate of mesh geometry, in millimetres.
pub const MESH_LIMIT: f64 = 8e6;

/// Largest supported absolute translation of a mesh, in millimetres.
pub const TRANSLATION_LIMIT: f64 = 1e11;

/// Checks one placed node. The first failing check wins.
pub fn check_node(node: &Node) -> Result<()> {
    let local = node.local_bounds.max_abs();
    if local > MESH_LIMIT {
        return Err(ClashError::MeshBounds {
            container: node.container.clone(),
            unique_id: node.unique_id,
        });
    }
    let scale = node.matrix.scale_part();
    let scaled = node
        .local_bounds
        .min()
        .mul_elements(&scale)
        .max_abs()
        .max(node.local_bounds.max().mul_elements(&scale).max_abs());
    if scaled > MESH_LIMIT + 1.0 || node.matrix.translation_part().max_abs() > TRANSLATION_LIMIT {
        return Err(ClashError::TransformBounds {
            container: node.container.clone(),
            unique_id: node.unique_id,
        });
    }
    Ok(())
}

/// Checks every node of `graph` whose world bounds leave the mesh limit.
///
/// Subtrees of the set BVH that lie entirely within the limit are skipped.
#[instrument(skip_all, fields(nodes = graph.nodes().len()))]
pub fn validate(graph: &SetGraph) -> Result<()> {
    let mut outside = Vec::new();
    graph
        .bvh()
        .walk(|bounds| bounds.max_abs() > MESH_LIMIT, |prim| outside.push(prim.index));
    debug!(checked = outside.len(), "precision domain checked");
    outside
        .into_iter()
        .try_for_each(|i| check_node(&graph.nodes()[i]))
}
