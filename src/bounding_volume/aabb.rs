//! Axis Aligned Bounding Box.

use crate::math::{Point, Real, Vector, DIM};
use na;

/// An Axis-Aligned Bounding Box (AABB).
///
/// Defined by its minimum and maximum corners. The bounds of a mesh, of a voxel grid, and of
/// every convex hull of a decomposition are expressed with this type.
///
/// # Invariant
///
/// `mins.x ≤ maxs.x`, `mins.y ≤ maxs.y` and `mins.z ≤ maxs.z` for any non-empty box. An
/// invalid box (see [`Aabb::new_invalid`]) has inverted bounds and is only used as the
/// starting value of a merge.
#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// The point with minimum coordinates.
    pub mins: Point<Real>,
    /// The point with maximum coordinates.
    pub maxs: Point<Real>,
}

impl Aabb {
    /// Creates a new AABB from its minimum and maximum corners.
    #[inline]
    pub fn new(mins: Point<Real>, maxs: Point<Real>) -> Aabb {
        Aabb { mins, maxs }
    }

    /// Creates an invalid AABB with `mins` set to `Real::MAX` and `maxs` to `-Real::MAX`.
    #[inline]
    pub fn new_invalid() -> Self {
        Self::new(
            Vector::repeat(Real::MAX).into(),
            Vector::repeat(-Real::MAX).into(),
        )
    }

    /// Creates a new AABB from its center and its half-extents.
    #[inline]
    pub fn from_half_extents(center: Point<Real>, half_extents: Vector<Real>) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Creates the smallest AABB enclosing all the given points.
    ///
    /// Returns an invalid AABB if the iterator is empty.
    pub fn from_points<'a, I>(pts: I) -> Self
    where
        I: IntoIterator<Item = &'a Point<Real>>,
    {
        let mut result = Self::new_invalid();

        for pt in pts {
            result.take_point(*pt);
        }

        result
    }

    /// Is this AABB valid, i.e., are its bounds not inverted?
    #[inline]
    pub fn is_valid(&self) -> bool {
        na::partial_le(&self.mins, &self.maxs)
    }

    /// The center of this AABB.
    #[inline]
    pub fn center(&self) -> Point<Real> {
        na::center(&self.mins, &self.maxs)
    }

    /// The half-extents of this AABB.
    #[inline]
    pub fn half_extents(&self) -> Vector<Real> {
        (self.maxs - self.mins) * 0.5
    }

    /// The extents of this AABB.
    #[inline]
    pub fn extents(&self) -> Vector<Real> {
        self.maxs - self.mins
    }

    /// The length of the diagonal of this AABB.
    #[inline]
    pub fn diagonal(&self) -> Real {
        na::distance(&self.mins, &self.maxs)
    }

    /// The largest extent of this AABB.
    #[inline]
    pub fn max_extent(&self) -> Real {
        self.extents().max()
    }

    /// The volume of this AABB.
    #[inline]
    pub fn volume(&self) -> Real {
        let extents = self.extents();
        extents.x * extents.y * extents.z
    }

    /// Enlarges this AABB so it also contains the point `pt`.
    #[inline]
    pub fn take_point(&mut self, pt: Point<Real>) {
        self.mins = self.mins.coords.inf(&pt.coords).into();
        self.maxs = self.maxs.coords.sup(&pt.coords).into();
    }

    /// Does this AABB contain the given point?
    #[inline]
    pub fn contains_local_point(&self, point: &Point<Real>) -> bool {
        for i in 0..DIM {
            if point[i] < self.mins[i] || point[i] > self.maxs[i] {
                return false;
            }
        }

        true
    }

    /// Do these two AABB intersect (touching counts as an intersection)?
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        na::partial_le(&self.mins, &other.maxs) && na::partial_ge(&self.maxs, &other.mins)
    }

    /// Does this AABB fully contain `other`?
    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        na::partial_le(&self.mins, &other.mins) && na::partial_ge(&self.maxs, &other.maxs)
    }

    /// The smallest AABB containing both `self` and `other`.
    #[inline]
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            mins: self.mins.inf(&other.mins),
            maxs: self.maxs.sup(&other.maxs),
        }
    }

    /// Enlarges this AABB by `amount` along every direction.
    ///
    /// A negative `amount` is clamped to zero.
    #[inline]
    pub fn loosened(&self, amount: Real) -> Aabb {
        let amount = amount.max(0.0);
        Aabb {
            mins: self.mins + Vector::repeat(-amount),
            maxs: self.maxs + Vector::repeat(amount),
        }
    }

    /// The squared distance between `pt` and this AABB (zero if the point is inside).
    #[inline]
    pub fn distance_squared_to_point(&self, pt: &Point<Real>) -> Real {
        let mins_pt = self.mins - pt;
        let pt_maxs = pt - self.maxs;
        let shift = mins_pt.sup(&pt_maxs).sup(&Vector::zeros());
        shift.norm_squared()
    }

    /// Computes the vertices of this `Aabb`.
    ///
    /// The vertices are given in the following order, in a right-handed coordinate system:
    /// ```text
    ///    y             3 - 2
    ///    |           7 − 6 |
    ///    ___ x       |   | 1  (the zero is below 3 and on the left of 1,
    ///   /            4 - 5     hidden by the 4-5-6-7 face.)
    ///  z
    /// ```
    #[inline]
    pub fn vertices(&self) -> [Point<Real>; 8] {
        [
            Point::new(self.mins.x, self.mins.y, self.mins.z),
            Point::new(self.maxs.x, self.mins.y, self.mins.z),
            Point::new(self.maxs.x, self.maxs.y, self.mins.z),
            Point::new(self.mins.x, self.maxs.y, self.mins.z),
            Point::new(self.mins.x, self.mins.y, self.maxs.z),
            Point::new(self.maxs.x, self.mins.y, self.maxs.z),
            Point::new(self.maxs.x, self.maxs.y, self.maxs.z),
            Point::new(self.mins.x, self.maxs.y, self.maxs.z),
        ]
    }

    /// The vertex indices of each face of this `Aabb`, counter-clockwise when seen from
    /// the outside.
    ///
    /// The indices refer to the array returned by [`Aabb::vertices`].
    pub const FACES_VERTEX_IDS: [[usize; 4]; 6] = [
        [1, 2, 6, 5],
        [0, 4, 7, 3],
        [2, 3, 7, 6],
        [0, 1, 5, 4],
        [4, 5, 6, 7],
        [0, 3, 2, 1],
    ];
}

#[cfg(test)]
mod test {
    use super::Aabb;
    use crate::math::{Point, Vector};

    #[test]
    fn aabb_from_points_and_merge() {
        let pts = [
            Point::new(1.0, 2.0, 3.0),
            Point::new(-1.0, 4.0, 2.0),
            Point::new(0.0, 0.0, 5.0),
        ];
        let aabb = Aabb::from_points(&pts);
        assert_eq!(aabb.mins, Point::new(-1.0, 0.0, 2.0));
        assert_eq!(aabb.maxs, Point::new(1.0, 4.0, 5.0));
        assert!(aabb.is_valid());
        assert!(!Aabb::from_points(&[]).is_valid());

        let other = Aabb::from_half_extents(Point::new(3.0, 3.0, 3.0), Vector::repeat(0.5));
        assert!(!aabb.intersects(&other));
        assert!(aabb.loosened(1.5).intersects(&other));
        assert!(aabb.merged(&other).contains(&other));
    }

    #[test]
    fn aabb_faces_are_outward() {
        let aabb = Aabb::new(Point::origin(), Point::new(1.0, 2.0, 3.0));
        let vtx = aabb.vertices();
        let center = aabb.center();

        for face in Aabb::FACES_VERTEX_IDS {
            let n = (vtx[face[1]] - vtx[face[0]]).cross(&(vtx[face[2]] - vtx[face[0]]));
            assert!(n.dot(&(vtx[face[0]] - center)) > 0.0);
        }
    }

    #[test]
    fn aabb_point_distance() {
        let aabb = Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0));
        assert_eq!(aabb.distance_squared_to_point(&Point::new(0.5, 0.5, 0.5)), 0.0);
        assert_relative_eq!(aabb.distance_squared_to_point(&Point::new(3.0, 0.5, 0.5)), 4.0);
    }
}
