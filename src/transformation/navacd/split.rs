use super::part::{hull_intrusion, ConvexPart};
use super::{ConvexDecomposition, DecompositionError};
use crate::math::{Point, Real, Vector};
use crate::shape::HalfSpace;
use ordered_float::OrderedFloat;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The result of splitting a part with one candidate plane.
struct SplitCandidate {
    below: ConvexPart,
    above: ConvexPart,
    cost: (OrderedFloat<Real>, OrderedFloat<Real>),
}

impl ConvexDecomposition {
    /// Splits the hulls until each of them fits the mesh and stays out of the negative space.
    ///
    /// At each step the worst hull is split in two: the one intruding the most into the
    /// negative space or, if none does, the one with the largest fit error above
    /// [`error_tolerance`](super::DecompositionParameters::error_tolerance). Hulls that
    /// cannot be split further are frozen and left as is.
    ///
    /// Returns the number of splits performed, or an error if more than
    /// [`max_splits`](super::DecompositionParameters::max_splits) splits would be needed.
    pub fn split_hulls(&mut self) -> Result<usize, DecompositionError> {
        let mut num_splits = 0;

        while let Some(worst) = self.worst_part() {
            if num_splits >= self.params.max_splits {
                return Err(DecompositionError::ExceededMaxSplits(self.params.max_splits));
            }

            match self.best_split(worst) {
                Some(candidate) => {
                    let SplitCandidate {
                        mut below,
                        mut above,
                        ..
                    } = candidate;
                    below.id = self.new_part_id();
                    above.id = self.new_part_id();
                    below.update_fit_error(&self.probes);
                    above.update_fit_error(&self.probes);
                    self.parts[worst] = below;
                    self.parts.push(above);
                    num_splits += 1;
                }
                None => {
                    log::debug!("Freezing part {}: no valid split.", self.parts[worst].id);
                    self.parts[worst].frozen = true;
                }
            }
        }

        log::debug!(
            "Hull splitting: {} splits, {} hulls.",
            num_splits,
            self.parts.len()
        );

        Ok(num_splits)
    }

    /// The index of the part that needs splitting the most, if any.
    fn worst_part(&self) -> Option<usize> {
        let epsilon = self.solid.epsilon;
        let mut worst_intrusion = (epsilon, None);
        let mut worst_fit = (self.params.error_tolerance, None);

        for (i, part) in self.parts.iter().enumerate() {
            if part.frozen {
                continue;
            }

            if part.intrusion > worst_intrusion.0 {
                worst_intrusion = (part.intrusion, Some(i));
            }
            if part.fit_error > worst_fit.0 {
                worst_fit = (part.fit_error, Some(i));
            }
        }

        worst_intrusion.1.or(worst_fit.1)
    }

    /// Finds the best way to split the part `i` in two, if it can be split.
    fn best_split(&self, i: usize) -> Option<SplitCandidate> {
        let part = &self.parts[i];

        if part.hull.aabb().max_extent() < 0.5 * self.probes.voxel_size() {
            return None;
        }

        let intrudes = part.intrudes(self.solid.epsilon);
        let planes = self.candidate_planes(part, intrudes);

        #[cfg(feature = "parallel")]
        let iter = planes.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = planes.iter();

        let candidates: Vec<Option<SplitCandidate>> = iter
            .map(|plane| self.evaluate_split(part, plane, intrudes))
            .collect();

        let mut best: Option<SplitCandidate> = None;

        for candidate in candidates.into_iter().flatten() {
            if best.as_ref().map_or(true, |best| candidate.cost < best.cost) {
                best = Some(candidate);
            }
        }

        best
    }

    /// The planes tried to split `part`, in order of preference.
    fn candidate_planes(&self, part: &ConvexPart, intrudes: bool) -> Vec<HalfSpace> {
        let mut planes = Vec::new();

        // Axis-aligned planes through the worst offender.
        let target: Option<Point<Real>> = if intrudes {
            part.worst_sphere
                .map(|s| self.negative_space.spheres()[s as usize].center)
        } else {
            part.worst_probe.map(|p| self.probes.point(p))
        };

        if let Some(target) = target {
            for axis in [Vector::x_axis(), Vector::y_axis(), Vector::z_axis()] {
                planes.push(HalfSpace::from_point_and_normal(&target, axis));
            }
        }

        // Planes along the concave edges of the mesh inside of the part.
        let edges = self
            .concave_edges
            .iter()
            .filter(|edge| part.hull.signed_distance(&edge.midpoint) <= self.solid.epsilon)
            .take(self.params.max_convex_edge_planes);

        for edge in edges {
            planes.extend_from_slice(&edge.planes);
        }

        // Evenly spaced axis-aligned planes.
        let aabb = part.hull.aabb();
        let num_samples = self.params.num_axis_split_samples;

        for (dim, axis) in [Vector::x_axis(), Vector::y_axis(), Vector::z_axis()]
            .into_iter()
            .enumerate()
        {
            let (lo, hi) = (aabb.mins[dim], aabb.maxs[dim]);

            for s in 1..=num_samples {
                let t = s as Real / (num_samples + 1) as Real;
                planes.push(HalfSpace::new(axis, lo + (hi - lo) * t));
            }
        }

        planes
    }

    fn evaluate_split(
        &self,
        part: &ConvexPart,
        plane: &HalfSpace,
        parent_intrudes: bool,
    ) -> Option<SplitCandidate> {
        let (below, above) = part.split(plane, &self.solid);
        let (mut below, mut above) = (below?, above?);

        // Both sides must make progress, and must not be slivers.
        let max_volume = part.hull.volume() * (1.0 - 1.0e-9);
        let min_width = 0.5 * self.probes.voxel_size();

        for child in [&below, &above] {
            if child.hull.volume() >= max_volume
                || width_along(child.hull.points(), &plane.normal) < min_width
            {
                return None;
            }
        }

        let spheres = self.negative_space.spheres();
        let tolerance = self.params.negative_space_tolerance;
        (below.intrusion, below.worst_sphere) = hull_intrusion(&below.hull, spheres, tolerance);
        (above.intrusion, above.worst_sphere) = hull_intrusion(&above.hull, spheres, tolerance);

        let volume = below.hull.volume() + above.hull.volume();
        let cost = if parent_intrudes {
            let intrusion = below.intrusion.max(0.0) + above.intrusion.max(0.0);
            (OrderedFloat(intrusion), OrderedFloat(volume))
        } else {
            (OrderedFloat(0.0), OrderedFloat(volume))
        };

        Some(SplitCandidate { below, above, cost })
    }
}

/// The extent of a point cloud along the unit direction `dir`.
fn width_along(points: &[Point<Real>], dir: &Vector<Real>) -> Real {
    let (min, max) = points.iter().fold((Real::MAX, -Real::MAX), |(min, max), pt| {
        let d = pt.coords.dot(dir);
        (min.min(d), max.max(d))
    });
    (max - min).max(0.0)
}
