// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Storage port for scene documents and mesh buffers.
//!
//! The engine reads containers through [`DatabaseHandler`]. Scene documents
//! mirror the persisted node layout: every node has a unique id (per
//! revision), a shared id (stable across revisions) and parent links by
//! shared id.

mod memory;

pub use memory::{ContainerData, MemoryDatabase};

use std::collections::{BTreeMap, BTreeSet};

use clash_geom::{Bounds, Matrix, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::Container;
use crate::units::Units;

/// Error type for database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The container is unknown to the handler.
    #[error("container not found: {0}")]
    ContainerNotFound(Container),
    /// No buffers are stored for the mesh.
    #[error("buffers for {unique_id} not found in {container}")]
    BuffersNotFound {
        /// Container that was searched.
        container: Container,
        /// Mesh unique id.
        unique_id: Uuid,
    },
    /// Stored data is inconsistent.
    #[error("corrupt data in {container}: {reason}")]
    Corrupt {
        /// Container holding the data.
        container: Container,
        /// What is wrong.
        reason: String,
    },
    /// I/O error while reading.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Node payload by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    /// Groups children under a transform.
    Transformation {
        /// Local-to-parent transform, row-major.
        #[serde(default)]
        matrix: Matrix,
    },
    /// A mesh primitive; geometry lives in separate buffers.
    Mesh {
        /// Bounds of the vertices in the mesh's local frame.
        bounds: Bounds,
    },
    /// Key/value properties attached to the parent node.
    Metadata {
        /// Property values by key.
        #[serde(default)]
        values: BTreeMap<String, String>,
    },
}

/// Node type discriminant for filtering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// [`NodeKind::Transformation`].
    Transformation,
    /// [`NodeKind::Mesh`].
    Mesh,
    /// [`NodeKind::Metadata`].
    Metadata,
}

impl NodeKind {
    /// The node type.
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Transformation { .. } => NodeType::Transformation,
            Self::Mesh { .. } => NodeType::Mesh,
            Self::Metadata { .. } => NodeType::Metadata,
        }
    }

    fn stripped(&self) -> Self {
        match self {
            Self::Transformation { .. } => Self::Transformation {
                matrix: Matrix::identity(),
            },
            Self::Mesh { .. } => Self::Mesh {
                bounds: Bounds::EMPTY,
            },
            Self::Metadata { .. } => Self::Metadata {
                values: BTreeMap::new(),
            },
        }
    }
}

/// One node of a container's scene collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    /// Revision-specific id.
    pub unique_id: Uuid,
    /// Id stable across revisions; children refer to it.
    pub shared_id: Uuid,
    /// Shared ids of the parents. Only the first is followed when resolving
    /// transforms.
    #[serde(default)]
    pub parents: Vec<Uuid>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Type-specific payload.
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Query over scene documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Documents with one of the unique ids.
    UniqueIds(Vec<Uuid>),
    /// Documents with one of the shared ids.
    SharedIds(Vec<Uuid>),
    /// Documents with any of the given shared ids among their parents.
    Parents(Vec<Uuid>),
    /// Documents with exactly this name.
    Name(String),
    /// Metadata documents holding this value under any key.
    MetadataValue(String),
    /// Documents of one of the given types.
    NodeTypes(Vec<NodeType>),
    /// Conjunction.
    All(Vec<Filter>),
}

impl Filter {
    /// Evaluates the filter against a document.
    pub fn matches(&self, doc: &SceneDocument) -> bool {
        match self {
            Self::UniqueIds(ids) => ids.contains(&doc.unique_id),
            Self::SharedIds(ids) => ids.contains(&doc.shared_id),
            Self::Parents(ids) => doc.parents.iter().any(|p| ids.contains(p)),
            Self::Name(name) => doc.name.as_deref() == Some(name.as_str()),
            Self::MetadataValue(value) => match &doc.kind {
                NodeKind::Metadata { values } => values.values().any(|v| v == value),
                _ => false,
            },
            Self::NodeTypes(types) => types.contains(&doc.kind.node_type()),
            Self::All(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }
}

/// Optional document fields a scan should return.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    /// Parent links.
    Parents,
    /// Display name.
    Name,
    /// Type-specific payload (matrix, bounds, metadata values).
    Payload,
}

/// Field selection for a scan. Ids and the node type are always returned;
/// omitted fields come back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: BTreeSet<Field>,
}

impl Default for Projection {
    fn default() -> Self {
        Self::all()
    }
}

impl Projection {
    /// Returns every field.
    pub fn all() -> Self {
        Self {
            fields: [Field::Parents, Field::Name, Field::Payload].into_iter().collect(),
        }
    }

    /// Returns only the listed fields.
    pub fn fields(fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Returns `true` if `field` is selected.
    pub fn includes(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    /// Copies `doc` with unselected fields cleared.
    pub fn apply(&self, doc: &SceneDocument) -> SceneDocument {
        SceneDocument {
            unique_id: doc.unique_id,
            shared_id: doc.shared_id,
            parents: if self.includes(Field::Parents) {
                doc.parents.clone()
            } else {
                Vec::new()
            },
            name: if self.includes(Field::Name) {
                doc.name.clone()
            } else {
                None
            },
            kind: if self.includes(Field::Payload) {
                doc.kind.clone()
            } else {
                doc.kind.stripped()
            },
        }
    }
}

/// Raw mesh geometry as stored: single precision vertices and index faces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshBuffers {
    /// Vertex positions in the mesh's local frame.
    pub vertices: Vec<[f32; 3]>,
    /// Faces as vertex index lists; only triangles are supported.
    pub faces: Vec<Vec<u32>>,
}

/// Revision properties relevant to placement.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    /// Offset added to all coordinates of the revision, in model units.
    #[serde(default)]
    pub coord_offset: Vector3,
}

/// Container settings relevant to placement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerSettings {
    /// Model units.
    #[serde(default)]
    pub units: Units,
}

/// Cursor over scan results.
pub type Cursor<'a> = Box<dyn Iterator<Item = Result<SceneDocument, DatabaseError>> + 'a>;

/// Read access to BIM containers.
pub trait DatabaseHandler: Send + Sync {
    /// Iterates the scene documents of `container` matching `filter`.
    fn scan(
        &self,
        container: &Container,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Cursor<'_>, DatabaseError>;

    /// Revision properties of `container`.
    fn revision(&self, container: &Container) -> Result<RevisionInfo, DatabaseError>;

    /// Settings of `container`.
    fn settings(&self, container: &Container) -> Result<ContainerSettings, DatabaseError>;

    /// Geometry buffers of the mesh `unique_id`.
    fn load_buffers(&self, container: &Container, unique_id: Uuid)
        -> Result<MeshBuffers, DatabaseError>;
}
