use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};

/// Returns the index of the support point of a list of points.
pub fn support_point_id(direction: &Vector<Real>, points: &[Point<Real>]) -> Option<usize> {
    indexed_support_point_id(direction, points, 0..points.len())
}

/// Returns the index of the support point of an indexed list of points.
pub fn indexed_support_point_id<I>(
    direction: &Vector<Real>,
    points: &[Point<Real>],
    idx: I,
) -> Option<usize>
where
    I: Iterator<Item = usize>,
{
    let mut argmax = None;
    let mut max = -Real::MAX;

    for i in idx {
        let dot = direction.dot(&points[i].coords);

        if dot > max {
            argmax = Some(i);
            max = dot;
        }
    }

    argmax
}

/// Returns the number `n` such that `points[idx.nth(n)]` is the support point.
pub fn indexed_support_point_nth<I>(
    direction: &Vector<Real>,
    points: &[Point<Real>],
    idx: I,
) -> Option<usize>
where
    I: Iterator<Item = usize>,
{
    let mut argmax = None;
    let mut max = -Real::MAX;

    for (k, i) in idx.enumerate() {
        let dot = direction.dot(&points[i].coords);

        if dot > max {
            argmax = Some(k);
            max = dot;
        }
    }

    argmax
}

/// Scale and center the given set of point depending on their AABB.
///
/// Returns the center and the diagonal used for the normalization. The points are left
/// untouched if their AABB is reduced to a single point.
pub fn normalize(coords: &mut [Point<Real>]) -> (Point<Real>, Real) {
    let aabb = Aabb::from_points(coords.iter());
    let diag = aabb.diagonal();
    let center = aabb.center();

    if diag > 0.0 {
        for c in coords.iter_mut() {
            *c = (*c + (-center.coords)) / diag;
        }
    }

    (center, diag)
}
