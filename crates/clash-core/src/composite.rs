// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Builders that assemble [`CompositeObject`]s from scene queries.
//!
//! A composite gathers every mesh below the matched nodes. Composite ids
//! are freshly generated (v4) for each call.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::db::{DatabaseHandler, Field, Filter, NodeType, Projection, SceneDocument};
use crate::error::Result;
use crate::model::{CompositeObject, Container, MeshReference};

/// Unique ids of all mesh nodes at or below `root`.
pub fn child_meshes(
    handler: &dyn DatabaseHandler,
    container: &Container,
    root: &SceneDocument,
) -> Result<BTreeSet<Uuid>> {
    let links = Projection::fields([Field::Parents]);
    let mut meshes = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut stack = vec![(root.unique_id, root.shared_id, root.kind.node_type())];
    while let Some((unique_id, shared_id, node_type)) = stack.pop() {
        if node_type == NodeType::Mesh {
            meshes.insert(unique_id);
            continue;
        }
        if !visited.insert(shared_id) {
            continue;
        }
        for child in handler.scan(container, &Filter::Parents(vec![shared_id]), &links)? {
            let child = child?;
            stack.push((child.unique_id, child.shared_id, child.kind.node_type()));
        }
    }
    Ok(meshes)
}

fn composite_of(container: &Container, meshes: BTreeSet<Uuid>) -> CompositeObject {
    CompositeObject::new(
        Uuid::new_v4(),
        meshes
            .into_iter()
            .map(|id| MeshReference::new(container.clone(), id))
            .collect(),
    )
}

/// One composite holding the meshes below every mesh or transformation
/// node called `name`.
pub fn composite_by_name(
    handler: &dyn DatabaseHandler,
    container: &Container,
    name: &str,
) -> Result<CompositeObject> {
    let filter = Filter::All(vec![
        Filter::NodeTypes(vec![NodeType::Mesh, NodeType::Transformation]),
        Filter::Name(name.to_owned()),
    ]);
    let projection = Projection::fields([Field::Name]);
    let mut meshes = BTreeSet::new();
    for doc in handler.scan(container, &filter, &projection)? {
        meshes.extend(child_meshes(handler, container, &doc?)?);
    }
    Ok(composite_of(container, meshes))
}

/// One composite per metadata node holding `value`; each gathers the meshes
/// below the nodes the metadata is attached to.
pub fn composites_by_metadata_value(
    handler: &dyn DatabaseHandler,
    container: &Container,
    value: &str,
) -> Result<Vec<CompositeObject>> {
    let parents = Projection::fields([Field::Parents]);
    let metadata: Vec<SceneDocument> = handler
        .scan(container, &Filter::MetadataValue(value.to_owned()), &parents)?
        .collect::<core::result::Result<_, _>>()?;

    let mut out = Vec::with_capacity(metadata.len());
    for doc in metadata {
        let mut meshes = BTreeSet::new();
        for owner in handler.scan(container, &Filter::SharedIds(doc.parents.clone()), &parents)? {
            meshes.extend(child_meshes(handler, container, &owner?)?);
        }
        out.push(composite_of(container, meshes));
    }
    Ok(out)
}

