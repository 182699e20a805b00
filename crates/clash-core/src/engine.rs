// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Top-level clash detection run.

use std::num::NonZeroUsize;

use tracing::{info, instrument};

use crate::broadphase;
use crate::cache::NodeCache;
use crate::config::{ConfigError, ConfigService, ConfigStore};
use crate::db::DatabaseHandler;
use crate::error::Result;
use crate::limits;
use crate::model::{ClashDetectionConfig, ClashMode};
use crate::pipeline::{clearance, hard, Narrowphase};
use crate::report::ClashDetectionReport;
use crate::scene::SetGraph;
use crate::scheduler;

/// Worker count used when a config does not name one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Runs clash detection against one database.
pub struct ClashEngine<'a> {
    handler: &'a dyn DatabaseHandler,
}

impl std::fmt::Debug for ClashEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClashEngine").finish_non_exhaustive()
    }
}

impl<'a> ClashEngine<'a> {
    /// Creates an engine reading from `handler`.
    pub fn new(handler: &'a dyn DatabaseHandler) -> Self {
        Self { handler }
    }

    /// Runs `config` and returns the report.
    ///
    /// Stages: validation, scene population, precision domain check,
    /// broadphase, scheduling, buffer load and narrowphase. Any error aborts
    /// the run; no partial report is produced.
    #[instrument(skip_all, fields(mode = ?config.mode, tolerance = config.tolerance))]
    pub fn run(&self, config: &ClashDetectionConfig) -> Result<ClashDetectionReport> {
        config.validate()?;

        let a = SetGraph::build(self.handler, &config.set_a)?;
        let b = SetGraph::build(self.handler, &config.set_b)?;
        info!(nodes_a = a.nodes().len(), nodes_b = b.nodes().len(), "scene populated");

        limits::validate(&a)?;
        limits::validate(&b)?;

        let pairs = broadphase::candidate_pairs(&a, &b, config.mode, config.tolerance);
        let pairs = scheduler::schedule(config.scheduler_kind(), &pairs);

        let mut cache = NodeCache::new();
        let slots_a = cache.register(&a);
        let slots_b = cache.register(&b);
        let np = Narrowphase {
            handler: self.handler,
            a: &a,
            b: &b,
            slots_a: &slots_a,
            slots_b: &slots_b,
            cache: &cache,
            tolerance: config.tolerance,
            workers: config.workers.unwrap_or_else(default_workers),
        };
        let clashes = match config.mode {
            ClashMode::Clearance => clearance::run(&np, &pairs)?,
            ClashMode::Hard => hard::run(&np, &pairs)?,
        };

        let report = ClashDetectionReport::new(clashes);
        info!(clashes = report.len(), "clash detection complete");
        Ok(report)
    }

    /// Runs `config` and writes the report to its `resultsFile`.
    pub fn run_to_store<S: ConfigStore>(
        &self,
        config: &ClashDetectionConfig,
        service: &ConfigService<S>,
    ) -> Result<ClashDetectionReport> {
        if config.results_file.is_empty() {
            return Err(ConfigError::Invalid("resultsFile is not set".into()).into());
        }
        let report = self.run(config)?;
        report.write(service, &config.results_file)?;
        Ok(report)
    }
}
