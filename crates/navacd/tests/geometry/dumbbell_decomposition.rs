use super::common::{assert_convex, dumbbell, points_inside};
use navacd::shape::{ConvexHull, TriMesh};
use navacd::transformation::navacd::{decompose_mesh, NavAcdSettings};

fn settings() -> NavAcdSettings {
    NavAcdSettings {
        max_voxels_per_dim: 24,
        ..Default::default()
    }
}

#[test]
fn dumbbell_needs_several_hulls() {
    let result = decompose_mesh(dumbbell(), &settings()).unwrap();
    assert!(result.hulls.len() >= 2);
    assert!(!result.covering.is_empty());
    result.hulls.iter().for_each(assert_convex);
}

#[test]
fn dumbbell_hulls_stay_out_of_the_negative_space() {
    let settings = settings();
    let result = decompose_mesh(dumbbell(), &settings).unwrap();
    let tolerance = settings.tolerance_fraction * 4.0;

    for sphere in result.covering.iter() {
        for hull in &result.hulls {
            assert!(hull.signed_distance(&sphere.center) >= sphere.radius - tolerance - 1.0e-6);
        }
    }
}

fn assert_covered(mesh: &TriMesh, hulls: &[ConvexHull], seed: u64) {
    for pt in points_inside(mesh, 500, seed) {
        assert!(
            hulls.iter().any(|hull| hull.signed_distance(&pt) <= 1.0e-7),
            "{:?} is not covered",
            pt
        );
    }
}

#[test]
fn dumbbell_volume_is_covered() {
    let settings = NavAcdSettings {
        min_radius_fraction: 0.0,
        ..settings()
    };
    let mesh = dumbbell();
    let result = decompose_mesh(mesh.clone(), &settings).unwrap();
    assert!(result.covering.is_empty());
    assert!(result.hulls.len() >= 2);
    assert_covered(&mesh, &result.hulls, 42);

    // The hulls do not extend far into the free space either.
    let volume: f64 = result.hulls.iter().map(|hull| hull.volume()).sum();
    assert!(volume >= 2.08 - 1.0e-6);
    assert!(volume < 3.0);
}

#[test]
fn dumbbell_volume_is_covered_around_the_negative_space() {
    let mesh = dumbbell();

    for max_voxels_per_dim in [20, 24, 33] {
        let settings = NavAcdSettings {
            max_voxels_per_dim,
            ..Default::default()
        };
        let result = decompose_mesh(mesh.clone(), &settings).unwrap();
        assert!(!result.covering.is_empty());
        assert!(result.hulls.len() >= 2);
        assert_covered(&mesh, &result.hulls, max_voxels_per_dim as u64);
    }
}
