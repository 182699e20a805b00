// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Clash CLI entrypoint.
//!
//! # Usage
//! ```text
//! clash run --config <config.json> --scene <scene.json> [--workers N] [--scheduler greedy|locality-sort]
//! clash compose --scene <scene.json> --container-index <i> --by name|metadata --a <v>... --b <v>... --out <config.json>
//! ```
//!
//! Paths, including the config's `resultsFile`, are resolved against the
//! working directory. The CLI exits with code `0` on success and non-zero on
//! error.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod summary;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clash_core::composite::{composite_by_name, composites_by_metadata_value};
use clash_core::{
    ClashDetectionConfig, ClashEngine, ClashMode, CompositeObject, ConfigService, Container, FsConfigStore,
    MemoryDatabase, SchedulerKind,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Log pipeline stages at debug level
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a clash detection config against a scene dump
    Run {
        /// Config file (JSON)
        #[clap(long)]
        config: PathBuf,
        /// Scene dump (JSON)
        #[clap(long)]
        scene: PathBuf,
        /// Narrowphase workers; overrides the config
        #[clap(long)]
        workers: Option<usize>,
        /// Scheduling policy; overrides the config
        #[clap(long, value_enum)]
        scheduler: Option<Scheduler>,
    },
    /// Build a config from name or metadata queries against one container
    Compose {
        /// Scene dump (JSON)
        #[clap(long)]
        scene: PathBuf,
        /// Container to query, by position in the dump
        #[clap(long, default_value_t = 0)]
        container_index: usize,
        /// How composites are selected
        #[clap(long, value_enum)]
        by: Selector,
        /// Names or metadata values for set A
        #[clap(long = "a", required = true, num_args = 1..)]
        set_a: Vec<String>,
        /// Names or metadata values for set B
        #[clap(long = "b", required = true, num_args = 1..)]
        set_b: Vec<String>,
        /// Clash test
        #[clap(long = "type", value_enum, default_value_t = Mode::Clearance)]
        mode: Mode,
        /// Tolerance in millimetres
        #[clap(long, default_value_t = 0.0)]
        tolerance: f64,
        /// Report path written into the config
        #[clap(long, default_value = "results.json")]
        results_file: String,
        /// Where to write the config
        #[clap(long)]
        out: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Scheduler {
    Greedy,
    LocalitySort,
}

impl From<Scheduler> for SchedulerKind {
    fn from(s: Scheduler) -> Self {
        match s {
            Scheduler::Greedy => Self::Greedy,
            Scheduler::LocalitySort => Self::LocalitySort,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Clearance,
    Hard,
}

impl From<Mode> for ClashMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Clearance => Self::Clearance,
            Mode::Hard => Self::Hard,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Selector {
    Name,
    Metadata,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let service = ConfigService::new(FsConfigStore::current_dir()?);
    match args.cmd {
        Command::Run {
            config,
            scene,
            workers,
            scheduler,
        } => {
            let db = MemoryDatabase::open(&scene)
                .with_context(|| format!("reading scene {}", scene.display()))?;
            let key = config.to_string_lossy();
            let mut config: ClashDetectionConfig = service
                .require(&key)
                .with_context(|| format!("reading config {key}"))?;
            if workers.is_some() {
                config.workers = workers;
            }
            if let Some(s) = scheduler {
                config.scheduler = Some(s.into());
            }
            let report = ClashEngine::new(&db).run_to_store(&config, &service)?;
            println!("{}", summary::table(config.mode, &report));
            println!("{} clashes written to {}", report.len(), config.results_file);
        }
        Command::Compose {
            scene,
            container_index,
            by,
            set_a,
            set_b,
            mode,
            tolerance,
            results_file,
            out,
        } => {
            let db = MemoryDatabase::open(&scene)
                .with_context(|| format!("reading scene {}", scene.display()))?;
            let Some(container) = db.containers().nth(container_index).map(|c| c.container.clone()) else {
                bail!("scene has no container at index {container_index}");
            };
            let mut config = ClashDetectionConfig::new(mode.into(), tolerance);
            config.set_a = compose(&db, &container, by, &set_a)?;
            config.set_b = compose(&db, &container, by, &set_b)?;
            config.results_file = results_file;
            info!(
                set_a = config.set_a.len(),
                set_b = config.set_b.len(),
                container = %container,
                "sets composed"
            );
            service.save(&out.to_string_lossy(), &config)?;
            println!("config written to {}", out.display());
        }
    }
    Ok(())
}

fn compose(
    db: &MemoryDatabase,
    container: &Container,
    by: Selector,
    values: &[String],
) -> Result<Vec<CompositeObject>> {
    let mut out = Vec::new();
    for value in values {
        match by {
            Selector::Name => out.push(composite_by_name(db, container, value)?),
            Selector::Metadata => out.extend(composites_by_metadata_value(db, container, value)?),
        }
    }
    Ok(out)
}
