use crate::math::{Point, Real};
use crate::shape::HalfSpace;
use crate::utils::lexicographic_cmp;
use core::cmp::Ordering;

/// The intersection between the segment `[a, b]` and the boundary of a half-space, given the
/// signed distances `da` and `db` of both endpoints (of opposite signs).
///
/// The result does not depend on the order of `a` and `b`, so that an edge shared by two
/// polygons or two cells is always cut at the exact same point.
#[inline]
pub(crate) fn canonical_intersection(
    a: &Point<Real>,
    da: Real,
    b: &Point<Real>,
    db: Real,
) -> Point<Real> {
    let (a, da, b, db) = if lexicographic_cmp(a, b) == Ordering::Greater {
        (b, db, a, da)
    } else {
        (a, da, b, db)
    };

    let t = da / (da - db);
    a + (b - a) * t
}

/// The side of a half-space boundary a point lies on.
#[inline]
pub(crate) fn side(dist: Real, epsilon: Real) -> i8 {
    if dist < -epsilon {
        -1
    } else if dist > epsilon {
        1
    } else {
        0
    }
}

/// A piece of a triangle of the input mesh, clipped to the region of space covered by a
/// convex part.
#[derive(Clone, Debug)]
pub(crate) struct SurfacePolygon {
    /// The vertices of this convex polygon, in the winding order of the source triangle.
    pub vertices: Vec<Point<Real>>,
    /// The index of the source triangle.
    pub triangle: u32,
}

impl SurfacePolygon {
    pub fn new(vertices: Vec<Point<Real>>, triangle: u32) -> Self {
        Self { vertices, triangle }
    }

    /// Splits this polygon by the boundary of `plane`.
    ///
    /// Returns the parts inside and outside of the half-space. Vertices closer than `epsilon`
    /// to the boundary belong to both parts. Parts with less than three vertices are dropped.
    pub fn split(&self, plane: &HalfSpace, epsilon: Real) -> (Option<Self>, Option<Self>) {
        let dists: Vec<Real> = self
            .vertices
            .iter()
            .map(|pt| plane.signed_distance(pt))
            .collect();
        let sides: Vec<i8> = dists.iter().map(|d| side(*d, epsilon)).collect();

        if sides.iter().all(|s| *s <= 0) {
            return (Some(self.clone()), None);
        }
        if sides.iter().all(|s| *s >= 0) {
            return (None, Some(self.clone()));
        }

        let mut below = Vec::with_capacity(self.vertices.len() + 1);
        let mut above = Vec::with_capacity(self.vertices.len() + 1);
        let n = self.vertices.len();

        for i in 0..n {
            let j = (i + 1) % n;
            let (pi, si) = (&self.vertices[i], sides[i]);

            if si <= 0 {
                below.push(*pi);
            }
            if si >= 0 {
                above.push(*pi);
            }

            if si * sides[j] < 0 {
                let pt = canonical_intersection(pi, dists[i], &self.vertices[j], dists[j]);
                below.push(pt);
                above.push(pt);
            }
        }

        let below = (below.len() >= 3).then(|| Self::new(below, self.triangle));
        let above = (above.len() >= 3).then(|| Self::new(above, self.triangle));
        (below, above)
    }
}

#[cfg(test)]
mod test {
    use super::{canonical_intersection, SurfacePolygon};
    use crate::math::{Point, Vector};
    use crate::shape::HalfSpace;

    #[test]
    fn intersection_is_order_independent() {
        let a = Point::new(0.1, 0.7, 0.3);
        let b = Point::new(0.9, -0.2, 0.35);
        let plane = HalfSpace::from_point_and_normal(
            &Point::new(0.37, 0.0, 0.0),
            na::Unit::new_normalize(Vector::new(1.0, 0.2, 0.1)),
        );
        let (da, db) = (plane.signed_distance(&a), plane.signed_distance(&b));
        assert_eq!(
            canonical_intersection(&a, da, &b, db),
            canonical_intersection(&b, db, &a, da)
        );
    }

    #[test]
    fn split_triangle() {
        let poly = SurfacePolygon::new(
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(2.0, 0.0, 0.0),
                Point::new(0.0, 2.0, 0.0),
            ],
            7,
        );
        let plane = HalfSpace::from_point_and_normal(&Point::new(1.0, 0.0, 0.0), Vector::x_axis());
        let (below, above) = poly.split(&plane, 1.0e-9);
        let below = below.unwrap();
        let above = above.unwrap();
        assert_eq!(below.vertices.len(), 4);
        assert_eq!(above.vertices.len(), 3);
        assert_eq!(above.triangle, 7);
        assert!(above.vertices.iter().all(|p| p.x >= 1.0 - 1.0e-12));

        // A polygon touching the plane with a single vertex stays on its side.
        let plane = HalfSpace::from_point_and_normal(&Point::new(2.0, 0.0, 0.0), Vector::x_axis());
        let (below, above) = poly.split(&plane, 1.0e-9);
        assert!(below.is_some() && above.is_none());
    }
}
