use crate::math::{Point, Real, Vector};
use crate::shape::Triangle;

/// A face of a convex hull under construction, with the points it can see.
#[derive(Debug)]
pub struct TriangleFacet {
    pub valid: bool,
    pub affinely_dependent: bool,
    pub normal: Vector<Real>,
    pub adj: [usize; 3],
    pub indirect_adj_id: [usize; 3],
    pub pts: [usize; 3],
    pub visible_points: Vec<usize>,
    pub furthest_point: usize,
    pub furthest_distance: Real,
}

impl TriangleFacet {
    pub fn new(p1: usize, p2: usize, p3: usize, points: &[Point<Real>]) -> TriangleFacet {
        let p1p2 = points[p2] - points[p1];
        let p1p3 = points[p3] - points[p1];

        let normal = p1p2.cross(&p1p3).normalize();

        TriangleFacet {
            valid: true,
            affinely_dependent: Triangle::new(points[p1], points[p2], points[p3])
                .is_affinely_dependent(),
            normal,
            adj: [0, 0, 0],
            indirect_adj_id: [0, 0, 0],
            pts: [p1, p2, p3],
            visible_points: Vec::new(),
            furthest_point: usize::MAX,
            furthest_distance: 0.0,
        }
    }

    pub fn add_visible_point(&mut self, pid: usize, points: &[Point<Real>]) {
        let distance = self.distance_to_point(pid, points);
        debug_assert!(distance > crate::math::DEFAULT_EPSILON);

        if distance > self.furthest_distance {
            self.furthest_distance = distance;
            self.furthest_point = pid;
        }

        self.visible_points.push(pid);
    }

    /// Signed distance from the plane of this facet to `points[point]`.
    pub fn distance_to_point(&self, point: usize, points: &[Point<Real>]) -> Real {
        self.normal.dot(&(points[point] - points[self.pts[0]]))
    }

    pub fn set_adjacency(&mut self, adj: [usize; 3], id_adj: [usize; 3]) {
        self.adj = adj;
        self.indirect_adj_id = id_adj;
    }

    /// The first point of the `id`-th edge, going counterclockwise.
    pub fn edge_start(&self, id: usize) -> usize {
        self.pts[id]
    }

    pub fn edge_end(&self, id: usize) -> usize {
        self.pts[(id + 1) % 3]
    }

    pub fn can_see_point(&self, point: usize, points: &[Point<Real>]) -> bool {
        // An affinely-dependent triangle cannot see any point.
        if self.affinely_dependent {
            return false;
        }

        let p0 = points[self.pts[0]];
        let pt = points[point];

        (pt - p0).dot(&self.normal) >= crate::math::DEFAULT_EPSILON * 100.0
    }

    /// Whether `points[point]` is in front of this facet.
    ///
    /// The result does not depend on the order of the facet vertices.
    pub fn is_visible_from(
        &self,
        point: usize,
        points: &[Point<Real>],
    ) -> bool {
        // An affinely-dependent triangle can be seen by any point.
        if self.affinely_dependent {
            return true;
        }

        let pt = points[point];
        self.pts
            .iter()
            .any(|p| (pt - points[*p]).dot(&self.normal) >= 0.0)
    }
}
