use navacd::bounding_volume::Aabb;
use navacd::math::{Point, Real};
use navacd::shape::{ConvexHull, TriMesh};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn cuboid(mins: [Real; 3], maxs: [Real; 3]) -> TriMesh {
    TriMesh::cuboid(&Aabb::new(mins.into(), maxs.into()))
}

/// Appends closed boxes into a single mesh.
pub fn boxes(boxes: &[([Real; 3], [Real; 3])]) -> TriMesh {
    let mut result = cuboid(boxes[0].0, boxes[0].1);
    for (mins, maxs) in &boxes[1..] {
        result.append(&cuboid(*mins, *maxs));
    }
    result
}

/// Two unit cubes joined by a thin bar along the x axis.
pub fn dumbbell() -> TriMesh {
    boxes(&[
        ([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
        ([1.0, 0.4, 0.4], [3.0, 0.6, 0.6]),
        ([3.0, 0.0, 0.0], [4.0, 1.0, 1.0]),
    ])
}

/// A 4x4x4 room with walls of thickness 0.2, and a doorway of width 1 and height 2 through
/// the wall at `x = 0`.
pub fn room_with_doorway() -> TriMesh {
    let w = 0.2;
    boxes(&[
        // Floor and ceiling.
        ([0.0, 0.0, 0.0], [4.0, 4.0, w]),
        ([0.0, 0.0, 4.0 - w], [4.0, 4.0, 4.0]),
        // Full walls.
        ([4.0 - w, 0.0, w], [4.0, 4.0, 4.0 - w]),
        ([0.0, 0.0, w], [4.0, w, 4.0 - w]),
        ([0.0, 4.0 - w, w], [4.0, 4.0, 4.0 - w]),
        // The wall with the doorway, around the opening `y in [1.5, 2.5]`, `z in [w, 2.2]`.
        ([0.0, w, w], [w, 1.5, 4.0 - w]),
        ([0.0, 2.5, w], [w, 4.0 - w, 4.0 - w]),
        ([0.0, 1.5, 2.2], [w, 2.5, 4.0 - w]),
    ])
}

/// Checks that every vertex of `hull` is on the inner side of each of its planes.
pub fn assert_convex(hull: &ConvexHull) {
    assert!(hull.volume() > 0.0);
    for plane in hull.planes() {
        for pt in hull.points() {
            assert!(plane.signed_distance(pt) <= 1.0e-7);
        }
    }
}

/// Random points inside of `mesh`.
pub fn points_inside(mesh: &TriMesh, count: usize, seed: u64) -> Vec<Point<Real>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let aabb = mesh.aabb();
    let mut result = Vec::with_capacity(count);

    while result.len() < count {
        let pt = Point::from(aabb.mins.coords.zip_map(&aabb.maxs.coords, |lo, hi| {
            rng.gen_range(lo..hi)
        }));

        if mesh.contains_point(&pt) {
            result.push(pt);
        }
    }

    result
}
