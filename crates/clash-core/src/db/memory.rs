// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use clash_geom::Vector3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    ContainerSettings, Cursor, DatabaseError, DatabaseHandler, Filter, MeshBuffers, Projection,
    RevisionInfo, SceneDocument,
};
use crate::model::Container;
use crate::units::Units;

/// Everything stored for one container revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerData {
    /// Which container this is.
    pub container: Container,
    /// Model units.
    #[serde(default)]
    pub units: Units,
    /// Revision coordinate offset in model units.
    #[serde(default)]
    pub coord_offset: Vector3,
    /// Scene collection.
    #[serde(default)]
    pub nodes: Vec<SceneDocument>,
    /// Mesh buffers by mesh unique id.
    #[serde(default)]
    pub buffers: BTreeMap<Uuid, MeshBuffers>,
}

impl ContainerData {
    /// Creates an empty container.
    pub fn new(container: Container, units: Units, coord_offset: Vector3) -> Self {
        Self {
            container,
            units,
            coord_offset,
            nodes: Vec::new(),
            buffers: BTreeMap::new(),
        }
    }
}

/// In-memory [`DatabaseHandler`], loadable from a JSON scene dump.
///
/// Counts buffer loads so callers can check how often geometry was read.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryDatabase {
    containers: Vec<ContainerData>,
    #[serde(skip)]
    buffer_loads: AtomicUsize,
}

impl Clone for MemoryDatabase {
    fn clone(&self) -> Self {
        Self {
            containers: self.containers.clone(),
            buffer_loads: AtomicUsize::new(0),
        }
    }
}

impl MemoryDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a container and returns it for population.
    pub fn insert_container(&mut self, data: ContainerData) -> &mut ContainerData {
        self.containers.retain(|c| c.container != data.container);
        self.containers.push(data);
        let last = self.containers.len() - 1;
        &mut self.containers[last]
    }

    /// Mutable access to a stored container.
    pub fn container_mut(&mut self, container: &Container) -> Option<&mut ContainerData> {
        self.containers.iter_mut().find(|c| c.container == *container)
    }

    /// All stored containers in insertion order.
    pub fn containers(&self) -> impl Iterator<Item = &ContainerData> {
        self.containers.iter()
    }

    /// Reads a scene dump written with [`MemoryDatabase::save`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Writes the scene as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DatabaseError> {
        std::fs::write(path, serde_json::to_vec(self)?)?;
        Ok(())
    }

    /// Number of `load_buffers` calls served so far.
    pub fn buffer_loads(&self) -> usize {
        self.buffer_loads.load(Ordering::Relaxed)
    }

    fn find(&self, container: &Container) -> Result<&ContainerData, DatabaseError> {
        self.containers
            .iter()
            .find(|c| c.container == *container)
            .ok_or_else(|| DatabaseError::ContainerNotFound(container.clone()))
    }
}

impl DatabaseHandler for MemoryDatabase {
    fn scan(
        &self,
        container: &Container,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Cursor<'_>, DatabaseError> {
        let data = self.find(container)?;
        let filter = filter.clone();
        let projection = projection.clone();
        Ok(Box::new(
            data.nodes
                .iter()
                .filter(move |doc| filter.matches(doc))
                .map(move |doc| Ok(projection.apply(doc))),
        ))
    }

    fn revision(&self, container: &Container) -> Result<RevisionInfo, DatabaseError> {
        Ok(RevisionInfo {
            coord_offset: self.find(container)?.coord_offset,
        })
    }

    fn settings(&self, container: &Container) -> Result<ContainerSettings, DatabaseError> {
        Ok(ContainerSettings {
            units: self.find(container)?.units,
        })
    }

    fn load_buffers(
        &self,
        container: &Container,
        unique_id: Uuid,
    ) -> Result<MeshBuffers, DatabaseError> {
        self.buffer_loads.fetch_add(1, Ordering::Relaxed);
        self.find(container)?
            .buffers
            .get(&unique_id)
            .cloned()
            .ok_or_else(|| DatabaseError::BuffersNotFound {
                container: container.clone(),
                unique_id,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::NodeKind;
    use clash_geom::Matrix;

    fn sample() -> (MemoryDatabase, Container) {
        let container = Container::new("ts", "model", Uuid::from_u128(1));
        let mut db = MemoryDatabase::new();
        let data = db.insert_container(ContainerData::new(
            container.clone(),
            crate::Units::Cm,
            Vector3::new(1.0, 2.0, 3.0),
        ));
        data.nodes.push(SceneDocument {
            unique_id: Uuid::from_u128(2),
            shared_id: Uuid::from_u128(3),
            parents: Vec::new(),
            name: Some("rootNode".into()),
            kind: NodeKind::Transformation {
                matrix: Matrix::identity(),
            },
        });
        (db, container)
    }

    #[test]
    fn scene_dump_round_trips() {
        let (db, container) = sample();
        let path = std::env::temp_dir().join(format!("clash-memory-db-{}.json", std::process::id()));
        db.save(&path).unwrap();
        let back = MemoryDatabase::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(back.settings(&container).unwrap().units, crate::Units::Cm);
        assert_eq!(back.revision(&container).unwrap().coord_offset, Vector3::new(1.0, 2.0, 3.0));
        let names: Vec<_> = back
            .scan(&container, &Filter::Name("rootNode".into()), &Projection::all())
            .unwrap()
            .map(|d| d.unwrap().unique_id)
            .collect();
        assert_eq!(names, vec![Uuid::from_u128(2)]);
    }

    #[test]
    fn unknown_containers_and_buffers_are_errors() {
        let (db, container) = sample();
        let other = Container::new("ts", "other", Uuid::nil());
        assert!(matches!(db.settings(&other), Err(DatabaseError::ContainerNotFound(_))));
        assert!(matches!(
            db.load_buffers(&container, Uuid::nil()),
            Err(DatabaseError::BuffersNotFound { .. })
        ));
        assert_eq!(db.buffer_loads(), 1);
    }
}
