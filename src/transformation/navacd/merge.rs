use super::part::{hull_intrusion, ConvexPart};
use super::ConvexDecomposition;
use crate::math::{Point, Real};
use crate::shape::ConvexHull;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The hull obtained by merging two parts, and whether that merge is acceptable.
struct MergeCandidate {
    hull: ConvexHull,
    cost: Real,
    within_error: bool,
    intrudes: bool,
}

impl ConvexDecomposition {
    /// Greedily merges pairs of hulls while their union stays a good fit.
    ///
    /// Two hulls can be merged if the convex hull of their union stays out of the negative
    /// space, and either fits the mesh within the error tolerance, or one of the hulls is
    /// thinner than [`min_thickness_tolerance`]. While there are more than
    /// [`max_shape_count`] hulls (if non-zero), merges outside of the error tolerance are
    /// accepted too. The merge adding the least volume is always performed first.
    ///
    /// [`min_thickness_tolerance`]: super::DecompositionParameters::min_thickness_tolerance
    /// [`max_shape_count`]: super::DecompositionParameters::max_shape_count
    ///
    /// Returns the number of merges performed.
    pub fn merge_hulls(&mut self) -> usize {
        let mut cache = BTreeMap::new();

        let mut pairs = Vec::new();
        for (i, a) in self.parts.iter().enumerate() {
            for b in &self.parts[i + 1..] {
                if self.may_merge(a, b) {
                    pairs.push((a, b));
                }
            }
        }

        #[cfg(feature = "parallel")]
        let iter = pairs.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = pairs.iter();

        let candidates: Vec<_> = iter
            .map(|(a, b)| ((a.id, b.id), self.merge_candidate(a, b)))
            .collect();
        cache.extend(candidates);

        let mut num_merges = 0;

        while let Some(key) = self.cheapest_legal_merge(&cache) {
            let Some(candidate) = cache.remove(&key) else {
                break;
            };
            let (Some(ia), Some(ib)) = (self.part_index(key.0), self.part_index(key.1)) else {
                break;
            };

            let id = self.new_part_id();
            let mut merged =
                ConvexPart::merged(id, &self.parts[ia], &self.parts[ib], candidate.hull);
            self.evaluate(&mut merged);

            let (first, second) = (ia.min(ib), ia.max(ib));
            self.parts[first] = merged;
            let _ = self.parts.remove(second);
            cache.retain(|(a, b), _| *a != key.0 && *a != key.1 && *b != key.0 && *b != key.1);

            let merged = &self.parts[first];
            for other in &self.parts {
                if other.id != merged.id && self.may_merge(merged, other) {
                    let _ = cache.insert(
                        (other.id.min(merged.id), other.id.max(merged.id)),
                        self.merge_candidate(merged, other),
                    );
                }
            }

            num_merges += 1;
        }

        log::debug!(
            "Hull merging: {} merges, {} hulls left.",
            num_merges,
            self.parts.len()
        );

        num_merges
    }

    fn has_too_many_parts(&self) -> bool {
        let max_count = self.params.max_shape_count;
        max_count > 0 && self.parts.len() > max_count
    }

    fn part_index(&self, id: u32) -> Option<usize> {
        self.parts.iter().position(|part| part.id == id)
    }

    fn may_merge(&self, a: &ConvexPart, b: &ConvexPart) -> bool {
        if self.has_too_many_parts() {
            return true;
        }

        let margin = self.params.error_tolerance.max(self.probes.voxel_size());
        a.hull.aabb().loosened(margin).intersects(b.hull.aabb())
    }

    fn merge_candidate(&self, a: &ConvexPart, b: &ConvexPart) -> MergeCandidate {
        let points: Vec<Point<Real>> = a
            .hull
            .points()
            .iter()
            .chain(b.hull.points().iter())
            .copied()
            .collect();
        let hull = ConvexHull::from_points_thickened(&points, self.solid.thickness)
            .unwrap_or_else(|| a.hull.clone());

        let min_thickness = self.params.min_thickness_tolerance;
        let within_error = a.hull.min_thickness() < min_thickness
            || b.hull.min_thickness() < min_thickness
            || !self
                .probes
                .fit_error_exceeds(&hull, self.params.error_tolerance);
        let (intrusion, _) = hull_intrusion(
            &hull,
            self.negative_space.spheres(),
            self.params.negative_space_tolerance,
        );

        MergeCandidate {
            cost: hull.volume() - a.hull.volume() - b.hull.volume(),
            within_error,
            intrudes: intrusion > self.solid.epsilon,
            hull,
        }
    }

    /// The key of the legal merge with the smallest cost. Ties go to the smallest key.
    fn cheapest_legal_merge(
        &self,
        cache: &BTreeMap<(u32, u32), MergeCandidate>,
    ) -> Option<(u32, u32)> {
        let too_many = self.has_too_many_parts();

        cache
            .iter()
            .filter(|(_, c)| !c.intrudes && (c.within_error || too_many))
            .min_by_key(|(key, c)| (OrderedFloat(c.cost), **key))
            .map(|(key, _)| *key)
    }
}
