// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock scene builder over [`MemoryDatabase`].
//!
//! Each container gets a root transformation node. Every added mesh sits
//! below its own transformation node, optionally carrying a random rigid
//! transform; the stored vertices are pre-multiplied by its inverse, so the
//! project-space geometry is what the caller passed in.

use std::collections::BTreeMap;

use clash_core::db::{ContainerData, MemoryDatabase, NodeKind, SceneDocument};
use clash_core::{ClashDetectionConfig, CompositeObject, Container, MeshReference, Units};
use clash_geom::{Bounds, Matrix, Vector3};
use uuid::Uuid;

use crate::fixtures::Mesh;
use crate::random::RandomGenerator;

/// Builds containers and meshes for engine tests.
#[derive(Debug)]
pub struct MockScene {
    random: RandomGenerator,
    db: MemoryDatabase,
    roots: BTreeMap<Container, Uuid>,
    random_transforms: bool,
}

impl MockScene {
    /// Creates an empty scene.
    pub fn new(seed: u64) -> Self {
        Self {
            random: RandomGenerator::new(seed),
            db: MemoryDatabase::new(),
            roots: BTreeMap::new(),
            random_transforms: false,
        }
    }

    /// Places every mesh under a random rigid transform.
    pub fn with_random_transforms(mut self, enabled: bool) -> Self {
        self.random_transforms = enabled;
        self
    }

    /// Access to the sampler, for building geometry from the same seed.
    pub fn random(&mut self) -> &mut RandomGenerator {
        &mut self.random
    }

    fn document(&mut self, parents: Vec<Uuid>, name: Option<&str>, kind: NodeKind) -> SceneDocument {
        SceneDocument {
            unique_id: self.random.uuid(),
            shared_id: self.random.uuid(),
            parents,
            name: name.map(str::to_owned),
            kind,
        }
    }

    /// Adds a container with a root node and returns its reference.
    pub fn add_container(&mut self, name: &str, units: Units, coord_offset: Vector3) -> Container {
        let container = Container::new("teamspace", name, self.random.uuid());
        let root = self.document(
            Vec::new(),
            Some("rootNode"),
            NodeKind::Transformation {
                matrix: Matrix::identity(),
            },
        );
        self.roots.insert(container.clone(), root.shared_id);
        let mut data = ContainerData::new(container.clone(), units, coord_offset);
        data.nodes.push(root);
        self.db.insert_container(data);
        container
    }

    /// Adds `mesh`, given in the container's model units before the
    /// revision offset, and returns its reference.
    ///
    /// `name` is set on both the mesh and its transformation node. Meshes
    /// added to unknown containers are dropped and a nil reference returned.
    pub fn add_mesh(&mut self, container: &Container, mesh: &Mesh, name: Option<&str>) -> MeshReference {
        let mut matrix = if self.random_transforms {
            self.random.rigid_transform((-100.0, 100.0))
        } else {
            Matrix::identity()
        };
        let local = match matrix.inverse() {
            Some(inverse) => mesh.transformed(&inverse),
            None => {
                matrix = Matrix::identity();
                mesh.clone()
            }
        };
        self.add_placed_mesh(container, &local, matrix, name)
    }

    /// Adds `local` as stored geometry below a transformation node holding
    /// `matrix`, and returns its reference.
    pub fn add_placed_mesh(
        &mut self,
        container: &Container,
        local: &Mesh,
        matrix: Matrix,
        name: Option<&str>,
    ) -> MeshReference {
        let Some(&root) = self.roots.get(container) else {
            return MeshReference::new(container.clone(), Uuid::nil());
        };
        let buffers = local.to_buffers();
        let stored: Vec<Vector3> = buffers.vertices.iter().map(|v| Vector3::from_f32(*v)).collect();

        let transform = self.document(vec![root], name, NodeKind::Transformation { matrix });
        let node = self.document(
            vec![transform.shared_id],
            name,
            NodeKind::Mesh {
                bounds: Bounds::from_points(&stored),
            },
        );
        let reference = MeshReference::new(container.clone(), node.unique_id);
        if let Some(data) = self.db.container_mut(container) {
            data.buffers.insert(node.unique_id, buffers);
            data.nodes.push(transform);
            data.nodes.push(node);
        }
        reference
    }

    /// Attaches a metadata node holding `values` to the transformation
    /// node above `mesh`.
    pub fn add_metadata(&mut self, mesh: &MeshReference, values: &[(&str, &str)]) {
        let values: BTreeMap<String, String> = values
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        let metadata_ids = (self.random.uuid(), self.random.uuid());
        let Some(data) = self.db.container_mut(&mesh.container) else {
            return;
        };
        let parents = data
            .nodes
            .iter()
            .find(|n| n.unique_id == mesh.unique_id)
            .map(|n| n.parents.clone())
            .unwrap_or_default();
        data.nodes.push(SceneDocument {
            unique_id: metadata_ids.0,
            shared_id: metadata_ids.1,
            parents,
            name: None,
            kind: NodeKind::Metadata { values },
        });
    }

    /// A composite object over `meshes` with a fresh id.
    pub fn composite(&mut self, meshes: &[MeshReference]) -> CompositeObject {
        CompositeObject::new(self.random.uuid(), meshes.to_vec())
    }

    /// Adds `a` to set A and `b` to set B of `config` as single-mesh
    /// composites, returning their ids.
    pub fn add_pair(
        &mut self,
        container: &Container,
        a: &Mesh,
        b: &Mesh,
        config: &mut ClashDetectionConfig,
    ) -> (Uuid, Uuid) {
        let ma = self.add_mesh(container, a, None);
        let mb = self.add_mesh(container, b, None);
        let ca = self.composite(&[ma]);
        let cb = self.composite(&[mb]);
        let ids = (ca.id, cb.id);
        config.set_a.push(ca);
        config.set_b.push(cb);
        ids
    }

    /// The database built so far.
    pub fn database(&self) -> &MemoryDatabase {
        &self.db
    }

    /// Consumes the builder and returns the database.
    pub fn into_database(self) -> MemoryDatabase {
        self.db
    }
}
