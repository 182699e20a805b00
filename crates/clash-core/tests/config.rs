// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
//! Config documents and result artifacts through the config store.

use clash_core::{
    ClashDetectionConfig, ClashDetectionReport, ClashEngine, ClashError, ClashMode, ConfigError,
    ConfigService, FsConfigStore, SchedulerKind, Units,
};
use clash_dry_tests::{unit_cube, InMemoryConfigStore, MockScene};
use clash_geom::{Matrix, Vector3};

fn scene() -> (clash_core::MemoryDatabase, ClashDetectionConfig) {
    let mut scene = MockScene::new(12);
    let container = scene.add_container("model", Units::Mm, Vector3::ZERO);
    let mut config = ClashDetectionConfig::new(ClashMode::Clearance, 1.0);
    let near = unit_cube().transformed(&Matrix::translation(Vector3::new(1.5, 0.0, 0.0)));
    scene.add_pair(&container, &unit_cube(), &near, &mut config);
    config.results_file = "results/clearance.json".into();
    (scene.into_database(), config)
}

#[test]
fn config_round_trips_through_the_store() {
    let (_, mut config) = scene();
    config.workers = Some(3);
    config.scheduler = Some(SchedulerKind::LocalitySort);
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    service.save("config.json", &config).unwrap();
    let back: ClashDetectionConfig = service.require("config.json").unwrap();
    assert_eq!(back, config);

    let json: serde_json::Value = serde_json::from_slice(&store.get("config.json").unwrap()).unwrap();
    assert_eq!(json["type"], "Clearance");
    assert_eq!(json["scheduler"], "LocalitySort");
    assert_eq!(json["resultsFile"], "results/clearance.json");
    assert!(json["setA"][0]["meshes"][0]["uniqueId"].is_string());
    assert!(json["setA"][0]["meshes"][0]["container"]["teamspace"].is_string());
}

#[test]
fn optional_engine_fields_default_when_absent() {
    let json = r#"{
        "type": "Hard",
        "tolerance": 2.5,
        "setA": [],
        "setB": [],
        "resultsFile": "out.json"
    }"#;
    let config: ClashDetectionConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.mode, ClashMode::Hard);
    assert_eq!(config.workers, None);
    assert_eq!(config.scheduler_kind(), SchedulerKind::Greedy);
    let out = serde_json::to_value(&config).unwrap();
    assert!(out.get("workers").is_none());
}

#[test]
fn run_to_store_writes_the_report() {
    let (db, config) = scene();
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    let report = ClashEngine::new(&db).run_to_store(&config, &service).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(store.save_count(), 1);

    let written: ClashDetectionReport = service.require(&config.results_file).unwrap();
    assert_eq!(written, report);
    let json: serde_json::Value = serde_json::from_slice(&store.get(&config.results_file).unwrap()).unwrap();
    let clash = &json["clashes"][0];
    assert!(clash["idA"].is_string() && clash["idB"].is_string());
    assert_eq!(clash["positions"].as_array().unwrap().len(), 2);
    assert!(clash["fingerprint"].is_u64());
}

#[test]
fn store_failures_and_missing_results_file_are_errors() {
    let (db, mut config) = scene();
    let store = InMemoryConfigStore::new();
    store.set_fail_on_save(true);
    let service = ConfigService::new(store.clone());
    let err = ClashEngine::new(&db).run_to_store(&config, &service).unwrap_err();
    assert!(matches!(err, ClashError::Config(_)), "{err:?}");

    store.set_fail_on_save(false);
    config.results_file.clear();
    let err = ClashEngine::new(&db).run_to_store(&config, &service).unwrap_err();
    assert!(matches!(err, ClashError::Config(ConfigError::Invalid(_))), "{err:?}");
    assert_eq!(store.save_count(), 1);
}

#[test]
fn fs_store_reads_back_what_it_wrote() {
    let dir = std::env::temp_dir().join(format!("clash-core-config-{}", std::process::id()));
    let service = ConfigService::new(FsConfigStore::new(&dir));
    let (_, config) = scene();
    service.save("nested/config.json", &config).unwrap();
    let back: Option<ClashDetectionConfig> = service.load("nested/config.json").unwrap();
    assert_eq!(back, Some(config));
    let missing: Option<ClashDetectionConfig> = service.load("absent.json").unwrap();
    assert!(missing.is_none());
    assert!(matches!(
        service.require::<ClashDetectionConfig>("absent.json"),
        Err(ConfigError::NotFound(_))
    ));
    std::fs::remove_dir_all(&dir).unwrap();
}
