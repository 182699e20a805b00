// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Clash report written at the end of a run.

use clash_geom::Vector3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ConfigError, ConfigService, ConfigStore};

/// One reported clash between a set A and a set B composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clash {
    /// Set A composite id.
    pub id_a: Uuid,
    /// Set B composite id.
    pub id_b: Uuid,
    /// Clearance: the closest points, on A then on B. Hard: the contact
    /// anchor, then the anchor moved by the penetration vector.
    pub positions: [Vector3; 2],
    /// Stable identity of the clash across runs.
    pub fingerprint: u64,
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClashDetectionReport {
    /// Clashes sorted by `(id_a, id_b)`.
    pub clashes: Vec<Clash>,
}

impl ClashDetectionReport {
    /// Builds a report, sorting the clashes.
    pub fn new(mut clashes: Vec<Clash>) -> Self {
        clashes.sort_by(|x, y| (x.id_a, x.id_b).cmp(&(y.id_a, y.id_b)));
        Self { clashes }
    }

    /// Number of clashes.
    pub fn len(&self) -> usize {
        self.clashes.len()
    }

    /// Returns `true` when nothing clashed.
    pub fn is_empty(&self) -> bool {
        self.clashes.is_empty()
    }

    /// The clash between `id_a` and `id_b`, if reported.
    pub fn find(&self, id_a: Uuid, id_b: Uuid) -> Option<&Clash> {
        self.clashes
            .binary_search_by(|c| (c.id_a, c.id_b).cmp(&(id_a, id_b)))
            .ok()
            .map(|i| &self.clashes[i])
    }

    /// Writes the report as JSON under `key`.
    pub fn write<S: ConfigStore>(&self, service: &ConfigService<S>, key: &str) -> Result<(), ConfigError> {
        service.save(key, self)
    }
}
