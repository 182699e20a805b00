// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Runs that must be rejected before or during the narrowphase.

use clash_core::limits::MESH_LIMIT;
use clash_core::{
    ClashDetectionConfig, ClashEngine, ClashError, ClashMode, CompositeObject, ConfigError, MeshReference,
    Units,
};
use clash_dry_tests::{unit_cube, MockScene};
use clash_geom::{Matrix, Vector3};
use uuid::Uuid;

fn two_cubes(scene: &mut MockScene, units: Units, offset: Vector3) -> ClashDetectionConfig {
    let container = scene.add_container("model", units, Vector3::ZERO);
    let mut config = ClashDetectionConfig::new(ClashMode::Clearance, 1.0);
    let a = unit_cube().transformed(&Matrix::translation(offset));
    let b = unit_cube().transformed(&Matrix::translation(offset + Vector3::new(1.5, 0.0, 0.0)));
    scene.add_pair(&container, &a, &b, &mut config);
    config
}

#[test]
fn overlapping_sets_are_rejected() {
    let mut scene = MockScene::new(1);
    let mut config = two_cubes(&mut scene, Units::Mm, Vector3::ZERO);
    let shared = config.set_a[0].clone();
    config.set_b.push(shared.clone());
    let db = scene.into_database();
    match ClashEngine::new(&db).run(&config) {
        Err(ClashError::OverlappingSets { ids }) => {
            assert!(ids.contains(&shared.id));
            assert!(ids.contains(&shared.meshes[0].unique_id));
        }
        other => panic!("expected OverlappingSets, got {other:?}"),
    }

    // A mesh shared under a different composite id is still an overlap.
    let mut config = config.clone();
    config.set_b.pop();
    config.set_b.push(CompositeObject::new(Uuid::from_u128(7), shared.meshes.clone()));
    let err = ClashEngine::new(&db).run(&config).unwrap_err();
    assert!(matches!(err, ClashError::OverlappingSets { .. }));
}

#[test]
fn invalid_tolerance_and_worker_count_are_config_errors() {
    let mut scene = MockScene::new(2);
    let mut config = two_cubes(&mut scene, Units::Mm, Vector3::ZERO);
    let db = scene.into_database();
    for tolerance in [-1.0, f64::NAN, f64::INFINITY] {
        config.tolerance = tolerance;
        let err = ClashEngine::new(&db).run(&config).unwrap_err();
        assert!(matches!(err, ClashError::Config(ConfigError::Invalid(_))), "{err:?}");
    }
    config.tolerance = 1.0;
    config.workers = Some(0);
    assert!(matches!(
        ClashEngine::new(&db).run(&config),
        Err(ClashError::Config(_))
    ));
}

#[test]
fn meshes_outside_the_local_range_are_rejected() {
    let mut scene = MockScene::new(3);
    let config = two_cubes(&mut scene, Units::Mm, Vector3::splat(1e7));
    let db = scene.into_database();
    let err = ClashEngine::new(&db).run(&config).unwrap_err();
    assert!(matches!(err, ClashError::MeshBounds { .. }), "{err:?}");
    assert!(err.is_precision_domain());
}

#[test]
fn transforms_that_push_meshes_out_of_range_are_rejected() {
    let mut scene = MockScene::new(4);
    // 1e4 m is within the local range but 1e7 mm in project space.
    let config = two_cubes(&mut scene, Units::M, Vector3::splat(1e4));
    let db = scene.into_database();
    let err = ClashEngine::new(&db).run(&config).unwrap_err();
    assert!(matches!(err, ClashError::TransformBounds { .. }), "{err:?}");
    assert!(err.is_precision_domain());
}

#[test]
fn large_but_supported_coordinates_run() {
    let mut scene = MockScene::new(5);
    let config = two_cubes(&mut scene, Units::Mm, Vector3::splat(7e6));
    let db = scene.into_database();
    let report = ClashEngine::new(&db).run(&config).unwrap();
    assert_eq!(report.len(), 1);
}

/// A column of unit cross-section reaching 7e6 mm along y, placed by
/// `matrix`, against a unit cube translated to `cube_at`.
fn stretched_column(scene: &mut MockScene, matrix: Matrix, cube_at: Vector3) -> ClashDetectionConfig {
    let container = scene.add_container("model", Units::Mm, Vector3::ZERO);
    let column = unit_cube().transformed(&Matrix::scale(1.0, 7e6, 1.0));
    let a = scene.add_placed_mesh(&container, &column, matrix, None);
    let b = scene.add_placed_mesh(&container, &unit_cube(), Matrix::translation(cube_at), None);
    let mut config = ClashDetectionConfig::new(ClashMode::Clearance, 1.0);
    let (ca, cb) = (scene.composite(&[a]), scene.composite(&[b]));
    config.set_a.push(ca);
    config.set_b.push(cb);
    config
}

#[test]
fn non_uniform_scale_is_checked_per_axis() {
    // x is scaled far more than y, but only the short axis grows.
    let mut scene = MockScene::new(8);
    let placed =
        Matrix::translation(Vector3::new(1e7, 0.0, 0.0)) * Matrix::scale(100.0, 1.0, 1.0);
    let config = stretched_column(&mut scene, placed, Vector3::new(1e7 + 100.5, 0.0, 0.0));
    let db = scene.into_database();
    let report = ClashEngine::new(&db).run(&config).unwrap();
    assert_eq!(report.len(), 1);
}

#[test]
fn scale_past_the_limit_on_one_axis_is_rejected() {
    let mut scene = MockScene::new(9);
    let over = Matrix::scale(1.0, (MESH_LIMIT + 2.0) / 7e6, 1.0);
    let config = stretched_column(&mut scene, over, Vector3::new(3.0, 0.0, 0.0));
    let db = scene.into_database();
    let err = ClashEngine::new(&db).run(&config).unwrap_err();
    assert!(matches!(err, ClashError::TransformBounds { .. }), "{err:?}");

    let mut scene = MockScene::new(9);
    let under = Matrix::scale(1.0, (MESH_LIMIT - 1.0) / 7e6, 1.0);
    let config = stretched_column(&mut scene, under, Vector3::new(3.0, 0.0, 0.0));
    let db = scene.into_database();
    assert!(ClashEngine::new(&db).run(&config).is_ok());
}

#[test]
fn unknown_mesh_ids_are_missing_nodes() {
    let mut scene = MockScene::new(6);
    let mut config = two_cubes(&mut scene, Units::Mm, Vector3::ZERO);
    let container = config.set_a[0].meshes[0].container.clone();
    let ghost = Uuid::from_u128(0xdead_beef);
    config
        .set_a
        .push(CompositeObject::new(Uuid::from_u128(1), vec![MeshReference::new(container, ghost)]));
    let db = scene.into_database();
    match ClashEngine::new(&db).run(&config) {
        Err(ClashError::MissingNode { unique_id, .. }) => assert_eq!(unique_id, ghost),
        other => panic!("expected MissingNode, got {other:?}"),
    }
}

#[test]
fn non_triangular_faces_are_rejected() {
    let mut scene = MockScene::new(7);
    let config = two_cubes(&mut scene, Units::Mm, Vector3::ZERO);
    let mut db = scene.into_database();
    let mesh = &config.set_a[0].meshes[0];
    db.container_mut(&mesh.container)
        .unwrap()
        .buffers
        .get_mut(&mesh.unique_id)
        .unwrap()
        .faces
        .push(vec![0, 1, 2, 3]);
    match ClashEngine::new(&db).run(&config) {
        Err(ClashError::UnsupportedFace { sides, unique_id, .. }) => {
            assert_eq!(sides, 4);
            assert_eq!(unique_id, mesh.unique_id);
        }
        other => panic!("expected UnsupportedFace, got {other:?}"),
    }
}

#[test]
fn empty_sets_produce_an_empty_report() {
    let db = clash_core::MemoryDatabase::new();
    let config = ClashDetectionConfig::new(ClashMode::Hard, 0.0);
    assert!(ClashEngine::new(&db).run(&config).unwrap().is_empty());
}
