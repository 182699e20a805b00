// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::db::DatabaseError;
use crate::model::Container;

/// Errors raised by a clash detection run. All are fatal to the run.
#[derive(Debug, Error)]
pub enum ClashError {
    /// A composite id or mesh unique id appears in both sets.
    #[error("sets A and B overlap: {ids:?}")]
    OverlappingSets {
        /// The offending ids, sorted.
        ids: Vec<Uuid>,
    },
    /// A mesh's local bounds exceed the supported coordinate range.
    #[error("mesh {unique_id} in {container} exceeds the supported local range")]
    MeshBounds {
        /// Container holding the mesh.
        container: Container,
        /// Unique id of the mesh node.
        unique_id: Uuid,
    },
    /// A mesh's transform scales or translates it beyond the supported range.
    #[error("transform of mesh {unique_id} in {container} exceeds the supported range")]
    TransformBounds {
        /// Container holding the mesh.
        container: Container,
        /// Unique id of the mesh node.
        unique_id: Uuid,
    },
    /// A mesh has a face that is not a triangle.
    #[error("mesh {unique_id} in {container} has a face with {sides} sides")]
    UnsupportedFace {
        /// Container holding the mesh.
        container: Container,
        /// Unique id of the mesh node.
        unique_id: Uuid,
        /// Number of indices in the face.
        sides: usize,
    },
    /// A referenced node could not be found.
    #[error("node {unique_id} not found in {container}")]
    MissingNode {
        /// Container that was searched.
        container: Container,
        /// Unique id that was requested.
        unique_id: Uuid,
    },
    /// Failure in the database handler.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// Invalid config or failure in the config store.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClashError {
    /// Returns `true` for failures of the precision domain check.
    pub fn is_precision_domain(&self) -> bool {
        matches!(self, Self::MeshBounds { .. } | Self::TransformBounds { .. })
    }
}

/// Convenience alias for results in this crate.
pub type Result<T, E = ClashError> = core::result::Result<T, E>;
