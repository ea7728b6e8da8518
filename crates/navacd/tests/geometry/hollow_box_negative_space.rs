use super::common::{assert_convex, points_inside, room_with_doorway};
use navacd::bounding_volume::Aabb;
use navacd::math::Point;
use navacd::shape::Sphere;
use navacd::transformation::navacd::{
    decompose_mesh, sample_negative_space, NavAcdSettings, NegativeSpaceCovering,
    NegativeSpaceSampleParameters,
};

/// The free space inside of the room.
fn interior() -> Aabb {
    Aabb::new(Point::new(0.2, 0.2, 0.2), Point::new(3.8, 3.8, 3.8))
}

fn sample(min_radius: f64, only_connected_to_hull: bool) -> NegativeSpaceCovering {
    let mesh = room_with_doorway();
    let params = NegativeSpaceSampleParameters {
        min_radius,
        min_spacing: min_radius,
        reduce_radius_margin: 0.02,
        only_connected_to_hull,
        max_voxels_per_dim: 40,
        ..Default::default()
    };
    sample_negative_space(&mesh, mesh.aabb(), &params, &[])
}

fn interior_samples(covering: &NegativeSpaceCovering) -> Vec<Sphere> {
    covering
        .iter()
        .filter(|s| interior().contains_local_point(&s.center))
        .copied()
        .collect()
}

#[test]
fn small_agents_reach_the_room() {
    let covering = sample(0.1, true);
    let inside = interior_samples(&covering);
    assert!(!inside.is_empty());

    let mesh = room_with_doorway();
    for sphere in covering.iter() {
        assert!(sphere.radius >= 0.1);
        assert!(!mesh.contains_point(&sphere.center));
    }
}

#[test]
fn large_agents_do_not_fit_through_the_doorway() {
    let covering = sample(0.7, true);
    assert!(interior_samples(&covering).is_empty());
}

#[test]
fn unreachable_space_can_be_protected() {
    let covering = sample(0.7, false);
    let inside = interior_samples(&covering);
    assert!(!inside.is_empty());
    assert!(inside.iter().all(|s| s.radius >= 0.7));
}

#[test]
fn hints_seed_the_reachable_space() {
    let mesh = room_with_doorway();
    let params = NegativeSpaceSampleParameters {
        min_radius: 0.7,
        min_spacing: 0.7,
        max_voxels_per_dim: 40,
        ..Default::default()
    };
    let hints = [Point::new(2.0, 2.0, 2.0)];
    let covering = sample_negative_space(&mesh, mesh.aabb(), &params, &hints);
    assert!(!interior_samples(&covering).is_empty());
}

#[test]
fn samples_never_reach_into_the_walls() {
    let mesh = room_with_doorway();

    for max_voxels_per_dim in [24, 33, 40] {
        let params = NegativeSpaceSampleParameters {
            min_radius: 0.2,
            min_spacing: 0.2,
            reduce_radius_margin: 0.04,
            max_voxels_per_dim,
            ..Default::default()
        };
        let covering = sample_negative_space(&mesh, mesh.aabb(), &params, &[]);
        assert!(!covering.is_empty());

        for sphere in covering.iter() {
            assert!(!mesh.contains_point(&sphere.center));
            for tri in mesh.triangles() {
                let dist = tri.distance_to_point(&sphere.center);
                assert!(dist >= sphere.radius + params.reduce_radius_margin - 1.0e-9);
            }
        }
    }
}

#[test]
fn room_decomposition_keeps_the_walls_and_the_doorway() {
    let mesh = room_with_doorway();
    let settings = NavAcdSettings {
        max_voxels_per_dim: 24,
        ..Default::default()
    };
    let result = decompose_mesh(mesh.clone(), &settings).unwrap();
    assert!(!interior_samples(&result.covering).is_empty());
    result.hulls.iter().for_each(assert_convex);

    // Every sample is free space.
    for sphere in result.covering.iter() {
        for tri in mesh.triangles() {
            assert!(tri.distance_to_point(&sphere.center) >= sphere.radius);
        }
    }

    // Hulls stay out of the samples.
    let tolerance = settings.tolerance_fraction * 4.0;
    for sphere in result.covering.iter() {
        for hull in &result.hulls {
            assert!(hull.signed_distance(&sphere.center) >= sphere.radius - tolerance - 1.0e-6);
        }
    }

    // And still cover the walls.
    for pt in points_inside(&mesh, 1000, 7) {
        assert!(
            result
                .hulls
                .iter()
                .any(|hull| hull.signed_distance(&pt) <= 1.0e-7),
            "{:?} is not covered",
            pt
        );
    }
}
