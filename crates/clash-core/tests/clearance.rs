// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end clearance runs over generated scenes.

use clash_core::{
    ClashDetectionConfig, ClashDetectionReport, ClashEngine, ClashMode, Container, MemoryDatabase,
    SchedulerKind, Units,
};
use clash_dry_tests::{cone, CellDistribution, ClashGenerator, LinePair, Mesh, MockScene};
use clash_geom::{Line, Vector3};
use uuid::Uuid;

/// Segment pairs at each distance, one pair per grid cell.
fn generate_lines(seed: u64, groups: &[(f64, usize)]) -> Vec<LinePair> {
    let mut cells = CellDistribution::new(seed, 20.0, 200.0);
    let mut out = Vec::new();
    for (i, &(distance, count)) in groups.iter().enumerate() {
        let mut generator = ClashGenerator::new(seed + i as u64, (distance, distance));
        for _ in 0..count {
            out.push(generator.lines(&cells.sample().unwrap()));
        }
    }
    out
}

struct LineScene {
    db: MemoryDatabase,
    config: ClashDetectionConfig,
    expected: Vec<(Uuid, Uuid, f64)>,
}

fn line_scene(seed: u64, pairs: &[LinePair], tolerance: f64) -> LineScene {
    let mut scene = MockScene::new(seed);
    let container = scene.add_container("services", Units::Mm, Vector3::ZERO);
    let mut config = ClashDetectionConfig::new(ClashMode::Clearance, tolerance);
    let expected = pairs
        .iter()
        .map(|p| {
            let (a, b) = scene.add_pair(
                &container,
                &Mesh::from_line(&p.a),
                &Mesh::from_line(&p.b),
                &mut config,
            );
            (a, b, p.distance)
        })
        .collect();
    LineScene {
        db: scene.into_database(),
        config,
        expected,
    }
}

fn run(db: &MemoryDatabase, config: &ClashDetectionConfig) -> ClashDetectionReport {
    ClashEngine::new(db).run(config).expect("clash run")
}

fn separation(positions: &[Vector3; 2]) -> f64 {
    (positions[1] - positions[0]).norm()
}

#[test]
fn clearance_counts_follow_the_tolerance() {
    const PER_GROUP: usize = 60;
    let pairs = generate_lines(17, &[(0.0, PER_GROUP), (2.0, PER_GROUP), (5.0, PER_GROUP)]);
    for (tolerance, expected) in [(1.0, PER_GROUP), (3.0, 2 * PER_GROUP), (6.0, 3 * PER_GROUP)] {
        let scene = line_scene(1, &pairs, tolerance);
        let report = run(&scene.db, &scene.config);
        assert_eq!(report.len(), expected, "tolerance {tolerance}");
        for (a, b, distance) in &scene.expected {
            match report.find(*a, *b) {
                Some(clash) => {
                    assert!(*distance <= tolerance);
                    assert!((separation(&clash.positions) - distance).abs() < 1e-3);
                }
                None => assert!(*distance > tolerance),
            }
        }
        // Every mesh is read from the database at most once per run.
        assert!(scene.db.buffer_loads() <= 2 * pairs.len());
    }
}

#[test]
fn report_is_identical_across_workers_and_schedulers() {
    let pairs = generate_lines(23, &[(0.0, 20), (0.5, 20), (1.5, 20)]);
    let mut scene = line_scene(2, &pairs, 1.0);
    let reference = run(&scene.db, &scene.config);
    assert_eq!(reference.len(), 40);
    for workers in [1, 2, 3, 8] {
        for kind in [SchedulerKind::Greedy, SchedulerKind::LocalitySort] {
            scene.config.workers = Some(workers);
            scene.config.scheduler = Some(kind);
            assert_eq!(run(&scene.db, &scene.config), reference, "{workers} workers, {kind:?}");
        }
    }
}

fn sorted_fingerprints(report: &ClashDetectionReport) -> Vec<u64> {
    let mut out: Vec<u64> = report.clashes.iter().map(|c| c.fingerprint).collect();
    out.sort_unstable();
    out
}

#[test]
fn fingerprints_survive_reruns_and_new_ids() {
    let pairs = generate_lines(31, &[(0.2, 15), (0.7, 15)]);
    let first = line_scene(3, &pairs, 1.0);
    let again = run(&first.db, &first.config);
    assert_eq!(run(&first.db, &first.config), again);

    // Same geometry, different composite and node ids.
    let renamed = line_scene(99, &pairs, 1.0);
    let other = run(&renamed.db, &renamed.config);
    assert_eq!(sorted_fingerprints(&again), sorted_fingerprints(&other));
}

#[test]
fn fingerprint_changes_when_geometry_moves() {
    let pairs = generate_lines(37, &[(0.5, 4)]);
    let before = line_scene(4, &pairs, 1.0);
    let mut moved = pairs.clone();
    let shift = Vector3::new(0.01, 0.0, 0.0);
    moved[0].b = Line::new(moved[0].b.start + shift, moved[0].b.end + shift);
    let after = line_scene(4, &moved, 1.0);

    let fa = run(&before.db, &before.config);
    let fb = run(&after.db, &after.config);
    let (a, b, _) = before.expected[0];
    assert_ne!(fa.find(a, b).unwrap().fingerprint, fb.find(a, b).unwrap().fingerprint);
    for &(a, b, _) in &before.expected[1..] {
        assert_eq!(fa.find(a, b).unwrap().fingerprint, fb.find(a, b).unwrap().fingerprint);
    }
}

fn add_single(scene: &mut MockScene, container: &Container, mesh: &Mesh) -> clash_core::CompositeObject {
    let reference = scene.add_mesh(container, mesh, None);
    scene.composite(&[reference])
}

#[test]
fn containers_in_different_units_meet_in_project_space() {
    const SEGMENTS: u32 = 32;
    const FOOT: f64 = 304.8;
    let mut scene = MockScene::new(5);
    let metres = scene.add_container("structure", Units::M, Vector3::ZERO);
    let millimetres = scene.add_container("mechanical", Units::Mm, Vector3::new(0.0, 0.0, 5.0));
    let feet = scene.add_container("plumbing", Units::Ft, Vector3::new(0.0, 0.0, -5.0 / FOOT));

    // Apex up at 1 m, base on the origin.
    let a = add_single(&mut scene, &metres, &cone(Vector3::new(0.0, 0.0, 1.0), -1.0, 0.5, SEGMENTS));
    // Apex down, 5 mm above the apex of a.
    let b = add_single(
        &mut scene,
        &millimetres,
        &cone(Vector3::new(0.0, 0.0, 1000.0), 1000.0, 500.0, SEGMENTS),
    );
    // Apex up, 5 mm below the base of a.
    let c = add_single(
        &mut scene,
        &feet,
        &cone(Vector3::ZERO, -1000.0 / FOOT, 500.0 / FOOT, SEGMENTS),
    );

    let mut config = ClashDetectionConfig::new(ClashMode::Clearance, 10.0);
    let (id_a, id_b, id_c) = (a.id, b.id, c.id);
    config.set_a.push(a);
    config.set_b.extend([b, c]);
    let db = scene.into_database();

    let report = run(&db, &config);
    assert_eq!(report.len(), 2);
    let near = |p: Vector3, q: Vector3| (p - q).norm() < 1.0;
    let ab = report.find(id_a, id_b).unwrap();
    assert!(near(ab.positions[0], Vector3::new(0.0, 0.0, 1000.0)), "{:?}", ab.positions);
    assert!(near(ab.positions[1], Vector3::new(0.0, 0.0, 1005.0)), "{:?}", ab.positions);
    let ac = report.find(id_a, id_c).unwrap();
    assert!(near(ac.positions[0], Vector3::ZERO), "{:?}", ac.positions);
    assert!(near(ac.positions[1], Vector3::new(0.0, 0.0, -5.0)), "{:?}", ac.positions);

    config.tolerance = 4.0;
    assert!(run(&db, &config).is_empty());
}

#[test]
fn randomly_placed_meshes_report_the_same_separation() {
    let pairs = generate_lines(41, &[(0.3, 10)]);
    let mut scene = MockScene::new(6).with_random_transforms(true);
    let container = scene.add_container("site", Units::Mm, Vector3::ZERO);
    let mut config = ClashDetectionConfig::new(ClashMode::Clearance, 0.5);
    for p in &pairs {
        scene.add_pair(&container, &Mesh::from_line(&p.a), &Mesh::from_line(&p.b), &mut config);
    }
    let db = scene.into_database();
    let report = run(&db, &config);
    assert_eq!(report.len(), pairs.len());
    for clash in &report.clashes {
        assert!((separation(&clash.positions) - 0.3).abs() < 1e-3);
    }
}

#[test]
fn composites_report_their_closest_member() {
    let mut scene = MockScene::new(7);
    let container = scene.add_container("fit-out", Units::Mm, Vector3::ZERO);
    let segment = |x: f64| Line::new(Vector3::new(x, 0.0, 0.0), Vector3::new(x, 10.0, 0.0));
    let near_a = scene.add_mesh(&container, &Mesh::from_line(&segment(0.0)), None);
    let far_a = scene.add_mesh(&container, &Mesh::from_line(&segment(-3.0)), None);
    let b = scene.add_mesh(&container, &Mesh::from_line(&segment(2.0)), None);
    let a = scene.composite(&[near_a, far_a]);
    let b = scene.composite(&[b]);
    let mut config = ClashDetectionConfig::new(ClashMode::Clearance, 10.0);
    let (id_a, id_b) = (a.id, b.id);
    config.set_a.push(a);
    config.set_b.push(b);
    let db = scene.into_database();

    let report = run(&db, &config);
    assert_eq!(report.len(), 1);
    let clash = report.find(id_a, id_b).unwrap();
    assert!((separation(&clash.positions) - 2.0).abs() < 1e-9);
    assert!(clash.positions[0].x().abs() < 1e-9);
}
