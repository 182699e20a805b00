// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
//! Composite builders over scene queries.

use std::collections::BTreeSet;

use clash_core::composite::{composite_by_name, composites_by_metadata_value};
use clash_core::{ClashDetectionConfig, ClashEngine, ClashMode, Units};
use clash_dry_tests::{unit_cube, MockScene};
use clash_geom::{Matrix, Vector3};
use uuid::Uuid;

fn ids(meshes: &[clash_core::MeshReference]) -> BTreeSet<Uuid> {
    meshes.iter().map(|m| m.unique_id).collect()
}

#[test]
fn composites_gather_meshes_by_name_and_metadata() {
    let mut scene = MockScene::new(13);
    let container = scene.add_container("architecture", Units::Mm, Vector3::ZERO);
    let at = |x: f64| unit_cube().transformed(&Matrix::translation(Vector3::new(x, 0.0, 0.0)));
    let wall_1 = scene.add_mesh(&container, &at(0.0), Some("Wall"));
    let wall_2 = scene.add_mesh(&container, &at(2.0), Some("Wall"));
    let door = scene.add_mesh(&container, &at(4.0), Some("Door"));
    let pipe = scene.add_mesh(&container, &at(6.0), None);
    scene.add_metadata(&door, &[("Category", "Fixture")]);
    scene.add_metadata(&pipe, &[("Category", "Fixture"), ("System", "Waste")]);
    let db = scene.into_database();

    let walls = composite_by_name(&db, &container, "Wall").unwrap();
    assert_eq!(ids(&walls.meshes), ids(&[wall_1, wall_2]));
    assert!(walls.meshes.iter().all(|m| m.container == container));

    let nothing = composite_by_name(&db, &container, "Roof").unwrap();
    assert!(nothing.meshes.is_empty());

    let fixtures = composites_by_metadata_value(&db, &container, "Fixture").unwrap();
    assert_eq!(fixtures.len(), 2);
    let found: BTreeSet<Uuid> = fixtures.iter().flat_map(|c| ids(&c.meshes)).collect();
    assert_eq!(found, ids(&[door, pipe.clone()]));
    assert!(fixtures.iter().all(|c| c.meshes.len() == 1));
    assert_ne!(fixtures[0].id, fixtures[1].id);

    let waste = composites_by_metadata_value(&db, &container, "Waste").unwrap();
    assert_eq!(waste.len(), 1);
    assert_eq!(ids(&waste[0].meshes), ids(&[pipe]));

    // Built composites drive a run directly.
    let mut config = ClashDetectionConfig::new(ClashMode::Clearance, 1.5);
    config.set_a.push(walls);
    config.set_b.extend(fixtures);
    let report = ClashEngine::new(&db).run(&config).unwrap();
    // The second wall ends at x = 3, one unit from the door.
    assert_eq!(report.len(), 1);
    assert!(report.clashes.iter().all(|c| c.id_a == config.set_a[0].id));
}
