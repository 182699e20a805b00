// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![forbid(unsafe_code)]
//! clash-core: clash detection between two sets of BIM objects.
//!
//! A run takes a [`ClashDetectionConfig`] naming two disjoint sets of
//! composite objects and a tolerance, reads the referenced meshes through a
//! [`DatabaseHandler`], and reports one [`Clash`] per offending pair of
//! composites:
//!
//! - **Clearance** reports pairs closer than the tolerance, with the two
//!   closest points.
//! - **Hard** reports pairs that interpenetrate by more than the tolerance,
//!   with a penetration vector anchored in the contact region.
//!
//! Reports are deterministic: identical for any worker count and any
//! scheduling policy.
//!
//! ```
//! use clash_core::{ClashDetectionConfig, ClashEngine, ClashMode, MemoryDatabase};
//!
//! let db = MemoryDatabase::new();
//! let config = ClashDetectionConfig::new(ClashMode::Clearance, 1.0);
//! let report = ClashEngine::new(&db).run(&config).unwrap();
//! assert!(report.is_empty());
//! ```

/// Node-level broadphase.
pub mod broadphase;
/// Reference counted mesh cache.
pub mod cache;
/// Composite object builders.
pub mod composite;
/// Config service and storage port.
pub mod config;
/// Storage port and in-memory database.
pub mod db;
/// Top-level run.
pub mod engine;
/// Error types.
pub mod error;
/// Worker pool.
pub mod exec;
/// Clash fingerprints.
pub mod fingerprint;
/// Precision domain check.
pub mod limits;
/// Run configuration.
pub mod model;
/// Narrowphase pipelines.
pub mod pipeline;
/// Clash reports.
pub mod report;
/// Sparse scene graph.
pub mod scene;
/// Pair scheduling.
pub mod scheduler;
/// Model units.
pub mod units;

pub use config::{ConfigError, ConfigService, ConfigStore, FsConfigStore};
pub use db::{DatabaseError, DatabaseHandler, MemoryDatabase};
pub use engine::ClashEngine;
pub use error::{ClashError, Result};
pub use model::{ClashDetectionConfig, ClashMode, CompositeObject, Container, MeshReference};
pub use report::{Clash, ClashDetectionReport};
pub use scheduler::SchedulerKind;
pub use units::Units;
