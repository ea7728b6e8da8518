use super::common::{assert_convex, cuboid};
use navacd::math::Point;
use navacd::transformation::navacd::{decompose_mesh, NavAcdSettings};

#[test]
fn cube_gives_a_single_hull() {
    let settings = NavAcdSettings {
        max_voxels_per_dim: 24,
        ..Default::default()
    };
    let result = decompose_mesh(cuboid([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]), &settings).unwrap();

    assert_eq!(result.hulls.len(), 1);
    assert_eq!(result.stats.num_splits, 0);
    assert_eq!(result.stats.num_merges, 0);

    let hull = &result.hulls[0];
    assert_convex(hull);
    assert_relative_eq!(hull.volume(), 8.0, epsilon = 1.0e-9);
    assert_relative_eq!(hull.aabb().mins, Point::new(-1.0, -1.0, -1.0), epsilon = 1.0e-9);
    assert_relative_eq!(hull.aabb().maxs, Point::new(1.0, 1.0, 1.0), epsilon = 1.0e-9);
}

#[test]
fn boxes_give_a_single_hull_without_any_tolerance() {
    let boxes = [
        cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
        cuboid([0.0, 0.0, 0.0], [3.0, 1.0, 1.0]),
        cuboid([0.1, 0.2, 0.3], [1.7, 2.9, 1.3]),
    ];

    for mesh in &boxes {
        for max_voxels_per_dim in [16, 24, 33, 48] {
            let settings = NavAcdSettings {
                min_radius_fraction: 0.0,
                tolerance_fraction: 0.0,
                max_voxels_per_dim,
                ..Default::default()
            };
            let result = decompose_mesh(mesh.clone(), &settings).unwrap();
            assert_eq!(result.hulls.len(), 1);
            assert_eq!(result.stats.num_splits, 0);
            let volume = mesh.signed_volume();
            assert_relative_eq!(result.hulls[0].volume(), volume, epsilon = 1.0e-9);
        }
    }
}

#[test]
fn cube_soup_is_welded() {
    use navacd::shape::TriMesh;

    // Every triangle has its own vertices.
    let cube = cuboid([0.0; 3], [1.0; 3]);
    let vertices = cube.triangles().flat_map(|tri| tri.vertices()).collect();
    let indices = (0..cube.num_triangles() as u32)
        .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
        .collect();
    let soup = TriMesh::new(vertices, indices).unwrap();

    let settings = NavAcdSettings {
        max_voxels_per_dim: 24,
        ..Default::default()
    };
    let result = decompose_mesh(soup, &settings).unwrap();
    assert_eq!(result.stats.preprocess.num_merged_vertices, 36 - 8);
    assert!(result.stats.preprocess.closed);
    assert_eq!(result.hulls.len(), 1);
}
