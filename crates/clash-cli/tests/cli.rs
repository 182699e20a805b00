// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
//! End-to-end runs of the `clash` binary over scene dumps.

use std::path::Path;

use assert_cmd::Command;
use clash_core::{ClashDetectionConfig, ClashMode, Units};
use clash_dry_tests::{unit_cube, MockScene};
use clash_geom::{Matrix, Vector3};
use predicates::prelude::*;
use serde_json::Value;

/// Two walls, a door one unit clear of the second wall and a far pipe.
fn write_scene(dir: &Path) -> ClashDetectionConfig {
    let mut scene = MockScene::new(29);
    let container = scene.add_container("architecture", Units::Mm, Vector3::ZERO);
    let at = |x: f64| unit_cube().transformed(&Matrix::translation(Vector3::new(x, 0.0, 0.0)));
    let wall_1 = scene.add_mesh(&container, &at(0.0), Some("Wall"));
    let wall_2 = scene.add_mesh(&container, &at(2.0), Some("Wall"));
    let door = scene.add_mesh(&container, &at(4.0), Some("Door"));
    let pipe = scene.add_mesh(&container, &at(20.0), Some("Pipe"));
    scene.add_metadata(&door, &[("Category", "Fixture")]);

    let mut config = ClashDetectionConfig::new(ClashMode::Clearance, 1.5);
    config.set_a.push(scene.composite(&[wall_1, wall_2]));
    config.set_b.push(scene.composite(&[door]));
    config.set_b.push(scene.composite(&[pipe]));
    config.results_file = "results.json".to_owned();
    scene.database().save(dir.join("scene.json")).unwrap();
    config
}

fn clash() -> Command {
    Command::cargo_bin("clash").unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[test]
fn run_writes_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_scene(dir.path());
    std::fs::write(dir.path().join("config.json"), serde_json::to_vec(&config).unwrap()).unwrap();

    clash()
        .current_dir(dir.path())
        .args(["run", "--config", "config.json", "--scene", "scene.json"])
        .args(["--workers", "2", "--scheduler", "locality-sort"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 clashes written to results.json"))
        .stdout(predicate::str::contains("distance (mm)"));

    let report = read_json(&dir.path().join("results.json"));
    let clashes = report["clashes"].as_array().unwrap();
    assert_eq!(clashes.len(), 1);
    assert_eq!(clashes[0]["idA"], config.set_a[0].id.to_string());
    assert_eq!(clashes[0]["idB"], config.set_b[0].id.to_string());
}

#[test]
fn compose_then_run() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path());

    clash()
        .current_dir(dir.path())
        .args(["compose", "--scene", "scene.json", "--by", "name"])
        .args(["--a", "Wall", "--b", "Door", "Pipe"])
        .args(["--type", "clearance", "--tolerance", "1.5", "--out", "composed.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config written to composed.json"));

    let composed = read_json(&dir.path().join("composed.json"));
    assert_eq!(composed["type"], "Clearance");
    assert_eq!(composed["setA"].as_array().unwrap().len(), 1);
    assert_eq!(composed["setB"].as_array().unwrap().len(), 2);
    assert_eq!(composed["resultsFile"], "results.json");

    clash()
        .current_dir(dir.path())
        .args(["run", "--config", "composed.json", "--scene", "scene.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 clashes written"));
}

#[test]
fn compose_by_metadata_selects_tagged_objects() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path());

    clash()
        .current_dir(dir.path())
        .args(["compose", "--scene", "scene.json", "--by", "metadata"])
        .args(["--a", "Fixture", "--b", "Fixture", "--out", "tagged.json"])
        .assert()
        .success();

    let composed = read_json(&dir.path().join("tagged.json"));
    assert_eq!(composed["setA"].as_array().unwrap().len(), 1);
    assert_eq!(composed["setA"][0]["meshes"].as_array().unwrap().len(), 1);
}

#[test]
fn invalid_configs_fail() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_scene(dir.path());
    config.tolerance = -1.0;
    std::fs::write(dir.path().join("bad.json"), serde_json::to_vec(&config).unwrap()).unwrap();

    clash()
        .current_dir(dir.path())
        .args(["run", "--config", "bad.json", "--scene", "scene.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tolerance"));
    assert!(!dir.path().join("results.json").exists());

    clash()
        .current_dir(dir.path())
        .args(["run", "--config", "missing.json", "--scene", "scene.json"])
        .assert()
        .failure();
}

#[test]
fn missing_container_index_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_scene(dir.path());

    clash()
        .current_dir(dir.path())
        .args(["compose", "--scene", "scene.json", "--container-index", "3", "--by", "name"])
        .args(["--a", "Wall", "--b", "Door", "--out", "x.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no container at index 3"));
}
