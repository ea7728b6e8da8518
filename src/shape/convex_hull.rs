use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector, ZERO_TOLERANCE};
use crate::shape::{HalfSpace, Triangle};
use crate::transformation::{self, ConvexHullError};
use crate::utils;

/// A convex polytope with a triangulated boundary.
///
/// The boundary triangles are oriented counter-clockwise when seen from the outside. Each
/// non-degenerate triangle also contributes one bounding [`HalfSpace`]: the polytope is the
/// intersection of all these half-spaces.
///
/// A `ConvexHull` can only be built by computing the convex hull of a point cloud (or from
/// an AABB), so it is convex by construction.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ConvexHull {
    points: Vec<Point<Real>>,
    indices: Vec<[u32; 3]>,
    planes: Vec<HalfSpace>,
    volume: Real,
    aabb: Aabb,
}

impl ConvexHull {
    /// Computes the convex hull of the given points.
    ///
    /// Duplicate points are removed first. Fails if the points do not span a volume, or if
    /// the hull computation fails because of rounding errors.
    pub fn try_from_points(points: &[Point<Real>]) -> Result<Self, ConvexHullError> {
        let mut points = points.to_vec();
        utils::sort_and_dedup_points(&mut points);

        let (vertices, indices) = transformation::convex_hull(&points)?;
        transformation::validate_convex_hull(&vertices, &indices)?;
        Ok(Self::from_raw_parts(vertices, indices))
    }

    /// Computes the convex hull of the given points, recovering from degenerate inputs.
    ///
    /// If the points are flat (coplanar, collinear, or all at the same location) they are
    /// offset by `± thickness / 2` along the flat directions before computing the hull. The
    /// thickness used is at least [`ZERO_TOLERANCE`], and at least `1.0e-4` times the
    /// diagonal of the points' AABB. If the hull still cannot be computed, the AABB of the
    /// points (loosened by `thickness / 2`) is returned instead.
    ///
    /// Returns `None` only if `points` is empty.
    pub fn from_points_thickened(points: &[Point<Real>], thickness: Real) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mut points = points.to_vec();
        utils::sort_and_dedup_points(&mut points);

        let aabb = Aabb::from_points(&points);
        let thickness = thickness.max(ZERO_TOLERANCE).max(aabb.diagonal() * 1.0e-4);

        let err = match Self::hull_of_unique_points(&points) {
            Ok(hull) => return Some(hull),
            Err(err) => err,
        };

        if matches!(
            err,
            ConvexHullError::Degenerate | ConvexHullError::IncompleteInput
        ) {
            let thickened = thicken_flat_points(&points, thickness);
            match Self::hull_of_unique_points(&thickened) {
                Ok(hull) => return Some(hull),
                Err(err) => log::debug!("Convex hull failed after thickening: {}", err),
            }
        } else {
            log::warn!("Convex hull computation failed ({}), using a box instead.", err);
        }

        Some(Self::from_aabb(&aabb.loosened(thickness / 2.0)))
    }

    /// The convex hull of the eight vertices of `aabb`.
    pub fn from_aabb(aabb: &Aabb) -> Self {
        let vertices = aabb.vertices().to_vec();
        let mut indices = Vec::with_capacity(12);

        for [a, b, c, d] in Aabb::FACES_VERTEX_IDS {
            indices.push([a as u32, b as u32, c as u32]);
            indices.push([a as u32, c as u32, d as u32]);
        }

        Self::from_raw_parts(vertices, indices)
    }

    fn hull_of_unique_points(points: &[Point<Real>]) -> Result<Self, ConvexHullError> {
        let (vertices, indices) = transformation::convex_hull(points)?;
        transformation::validate_convex_hull(&vertices, &indices)?;
        Ok(Self::from_raw_parts(vertices, indices))
    }

    fn from_raw_parts(points: Vec<Point<Real>>, indices: Vec<[u32; 3]>) -> Self {
        let aabb = Aabb::from_points(&points);
        let center = utils::center(&points);
        let mut planes = Vec::with_capacity(indices.len());
        let mut volume = 0.0;

        for idx in &indices {
            let tri = Triangle::new(
                points[idx[0] as usize],
                points[idx[1] as usize],
                points[idx[2] as usize],
            );

            if let Some(normal) = tri.normal() {
                planes.push(HalfSpace::from_point_and_normal(&tri.a, normal));
            }

            let a = tri.a - center;
            let b = tri.b - center;
            let c = tri.c - center;
            volume += a.dot(&b.cross(&c));
        }

        Self {
            points,
            indices,
            planes,
            volume: volume / 6.0,
            aabb,
        }
    }

    /// The vertices of this convex hull.
    #[inline]
    pub fn points(&self) -> &[Point<Real>] {
        &self.points
    }

    /// The triangles of the boundary of this convex hull.
    #[inline]
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    /// The bounding half-spaces of this convex hull.
    #[inline]
    pub fn planes(&self) -> &[HalfSpace] {
        &self.planes
    }

    /// The volume of this convex hull.
    #[inline]
    pub fn volume(&self) -> Real {
        self.volume
    }

    /// The AABB of this convex hull.
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// The boundary triangle with index `i`.
    #[inline]
    pub fn triangle(&self, i: usize) -> Triangle {
        let idx = self.indices[i];
        Triangle::new(
            self.points[idx[0] as usize],
            self.points[idx[1] as usize],
            self.points[idx[2] as usize],
        )
    }

    /// The plane of the boundary the closest to `pt`, for a point inside this hull.
    ///
    /// This is the plane with the largest signed distance to `pt`.
    pub fn nearest_plane(&self, pt: &Point<Real>) -> Option<&HalfSpace> {
        let mut best = None;
        let mut best_dist = -Real::MAX;

        for plane in &self.planes {
            let dist = plane.signed_distance(pt);
            if dist > best_dist {
                best_dist = dist;
                best = Some(plane);
            }
        }

        best
    }

    /// The signed distance from `pt` to the boundary of this convex hull.
    ///
    /// Negative inside, positive outside. The result is exact on both sides.
    pub fn signed_distance(&self, pt: &Point<Real>) -> Real {
        let inside_dist = self
            .planes
            .iter()
            .map(|plane| plane.signed_distance(pt))
            .fold(-Real::MAX, Real::max);

        if inside_dist <= 0.0 {
            return inside_dist;
        }

        (0..self.indices.len())
            .map(|i| self.triangle(i).distance_to_point(pt))
            .fold(Real::MAX, Real::min)
    }

    /// The point of the boundary of this hull closest to `pt`.
    pub fn project_point(&self, pt: &Point<Real>) -> Point<Real> {
        if self.contains_point(pt) {
            return match self.nearest_plane(pt) {
                Some(plane) => plane.project_on_boundary(pt),
                None => *pt,
            };
        }

        let mut best = *pt;
        let mut best_dist = Real::MAX;

        for i in 0..self.indices.len() {
            let proj = self.triangle(i).project_point(pt);
            let dist = na::distance_squared(&proj, pt);

            if dist < best_dist {
                best_dist = dist;
                best = proj;
            }
        }

        best
    }

    /// Is `pt` inside of this convex hull (boundary included)?
    #[inline]
    pub fn contains_point(&self, pt: &Point<Real>) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(pt) <= 0.0)
    }

    /// The minimum, over all the bounding planes, of the depth of the hull below that plane.
    ///
    /// This is the width of the thinnest slab, with one side on a face of the hull, that
    /// contains the whole hull.
    pub fn min_thickness(&self) -> Real {
        let mut result = Real::MAX;

        for plane in &self.planes {
            let depth = self
                .points
                .iter()
                .map(|pt| -plane.signed_distance(pt))
                .fold(0.0, Real::max);
            result = result.min(depth);
        }

        if result == Real::MAX {
            0.0
        } else {
            result
        }
    }

    /// The vertex and index buffers of the boundary of this convex hull.
    pub fn to_trimesh(&self) -> (Vec<Point<Real>>, Vec<[u32; 3]>) {
        (self.points.clone(), self.indices.clone())
    }
}

/// Offsets each point by `± thickness / 2` along each of the directions the point set is
/// flat along.
fn thicken_flat_points(points: &[Point<Real>], thickness: Real) -> Vec<Point<Real>> {
    let mut normalized = points.to_vec();
    let _ = transformation::convex_hull_utils::normalize(&mut normalized);
    let (dimension, eigpairs) = transformation::principal_axes(&normalized);

    let flat_axes: Vec<Vector<Real>> = if points.len() == 1 || dimension == 0 {
        vec![Vector::x(), Vector::y(), Vector::z()]
    } else {
        eigpairs[dimension..]
            .iter()
            .map(|(axis, _)| axis.normalize())
            .collect()
    };

    let half = thickness / 2.0;
    let num_offsets = 1usize << flat_axes.len();
    let mut result = Vec::with_capacity(points.len() * num_offsets);

    for pt in points {
        for mask in 0..num_offsets {
            let mut shifted = *pt;
            for (k, axis) in flat_axes.iter().enumerate() {
                let sign = if mask & (1 << k) == 0 { -1.0 } else { 1.0 };
                shifted += axis * (sign * half);
            }
            result.push(shifted);
        }
    }

    result
}
