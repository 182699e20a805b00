// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Run configuration and the identifiers it refers to.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfigError;
use crate::error::{ClashError, Result};
use crate::scheduler::SchedulerKind;

/// One versioned BIM model; the unit of storage access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Owning teamspace (database).
    pub teamspace: String,
    /// Container (model) name.
    pub container: String,
    /// Revision id.
    pub revision: Uuid,
}

impl Container {
    /// Creates a container reference.
    pub fn new(teamspace: impl Into<String>, container: impl Into<String>, revision: Uuid) -> Self {
        Self {
            teamspace: teamspace.into(),
            container: container.into(),
            revision,
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.teamspace, self.container, self.revision)
    }
}

/// A physical mesh node within a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshReference {
    /// Container holding the mesh.
    pub container: Container,
    /// Unique id of the mesh node.
    pub unique_id: Uuid,
}

impl MeshReference {
    /// Creates a mesh reference.
    pub fn new(container: Container, unique_id: Uuid) -> Self {
        Self {
            container,
            unique_id,
        }
    }
}

/// A logical object: the granularity at which clashes are reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeObject {
    /// Reporting id.
    pub id: Uuid,
    /// Meshes making up the object; may span containers.
    pub meshes: Vec<MeshReference>,
}

impl CompositeObject {
    /// Creates a composite object.
    pub fn new(id: Uuid, meshes: Vec<MeshReference>) -> Self {
        Self { id, meshes }
    }
}

/// Clash test to perform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClashMode {
    /// Report pairs closer than the tolerance.
    Clearance,
    /// Report pairs that interpenetrate by more than the tolerance.
    Hard,
}

/// A clash detection run, as read from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClashDetectionConfig {
    /// Clash test to perform.
    #[serde(rename = "type")]
    pub mode: ClashMode,
    /// Tolerance in millimetres.
    pub tolerance: f64,
    /// First set of objects.
    pub set_a: Vec<CompositeObject>,
    /// Second set of objects; must be disjoint from `set_a`.
    pub set_b: Vec<CompositeObject>,
    /// Where the report is written.
    #[serde(default)]
    pub results_file: String,
    /// Narrowphase worker count; defaults to the available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Scheduling policy; defaults to [`SchedulerKind::Greedy`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerKind>,
}

impl ClashDetectionConfig {
    /// Creates a config with empty sets.
    pub fn new(mode: ClashMode, tolerance: f64) -> Self {
        Self {
            mode,
            tolerance,
            set_a: Vec::new(),
            set_b: Vec::new(),
            results_file: String::new(),
            workers: None,
            scheduler: None,
        }
    }

    /// Checks the tolerance and that the two sets are disjoint, by composite
    /// id and by mesh unique id.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            ))
            .into());
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be at least 1".into()).into());
        }

        let ids_a: BTreeSet<Uuid> = self.set_a.iter().map(|c| c.id).collect();
        let meshes_a: BTreeSet<Uuid> = self
            .set_a
            .iter()
            .flat_map(|c| c.meshes.iter().map(|m| m.unique_id))
            .collect();
        let mut overlap = BTreeSet::new();
        for composite in &self.set_b {
            if ids_a.contains(&composite.id) {
                overlap.insert(composite.id);
            }
            for mesh in &composite.meshes {
                if meshes_a.contains(&mesh.unique_id) {
                    overlap.insert(mesh.unique_id);
                }
            }
        }
        if overlap.is_empty() {
            Ok(())
        } else {
            Err(ClashError::OverlappingSets {
                ids: overlap.into_iter().collect(),
            })
        }
    }

    /// Scheduling policy in effect.
    pub fn scheduler_kind(&self) -> SchedulerKind {
        self.scheduler.unwrap_or_default()
    }
}
