//! Sampling of the free space around a mesh with spheres.

use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, ZERO_TOLERANCE};
use crate::shape::{ConvexHull, Sphere, TriMesh};
use crate::transformation::voxelization::{ClearanceField, FillMode, VoxelValue, VoxelizedVolume};
use core::cmp::Reverse;
use ordered_float::OrderedFloat;
use std::collections::VecDeque;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How negative-space candidates are selected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum SampleMethod {
    /// Free voxels with enough clearance for an agent, reachable from outside of the convex
    /// hull of the mesh.
    NavigableVoxelSearch,
    /// Every free voxel with enough clearance, reachable or not.
    VoxelSearch,
}

/// Parameters of [`sample_negative_space`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct NegativeSpaceSampleParameters {
    /// How candidate voxels are selected.
    pub sample_method: SampleMethod,
    /// The smallest sample radius.
    pub min_radius: Real,
    /// The smallest distance between two sample centers.
    pub min_spacing: Real,
    /// Distance subtracted from the clearance of a voxel to get the radius of its sample.
    pub reduce_radius_margin: Real,
    /// Only keep the free space reachable from outside of the convex hull of the mesh.
    pub only_connected_to_hull: bool,
    /// Place samples until every candidate is covered, ignoring `target_num_samples` and
    /// `min_spacing`.
    pub require_search_sample_coverage: bool,
    /// Consider the voxels inside of the solid as free space too.
    pub allow_samples_inside_mesh: bool,
    /// Stop after placing this many samples. 0 for no limit.
    pub target_num_samples: usize,
    /// Only use order-preserving parallel algorithms.
    pub deterministic: bool,
    /// Resolution of the sampling grid along the largest dimension of the mesh.
    pub max_voxels_per_dim: u32,
}

impl Default for NegativeSpaceSampleParameters {
    fn default() -> Self {
        Self {
            sample_method: SampleMethod::NavigableVoxelSearch,
            min_radius: 0.0,
            min_spacing: 0.0,
            reduce_radius_margin: 0.0,
            only_connected_to_hull: true,
            require_search_sample_coverage: false,
            allow_samples_inside_mesh: false,
            target_num_samples: 0,
            deterministic: true,
            max_voxels_per_dim: 64,
        }
    }
}

/// A set of spheres of free space that convex hulls must stay out of.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct NegativeSpaceCovering {
    spheres: Vec<Sphere>,
}

impl NegativeSpaceCovering {
    /// A covering made of the given spheres.
    pub fn new(spheres: Vec<Sphere>) -> Self {
        Self { spheres }
    }

    /// The spheres of this covering.
    #[inline]
    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    /// The number of spheres of this covering.
    #[inline]
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// Does this covering contain no sphere?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Iterates through the spheres of this covering.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Sphere> + '_ {
        self.spheres.iter()
    }

    /// The spheres of this covering.
    pub fn into_spheres(self) -> Vec<Sphere> {
        self.spheres
    }
}

/// Covers the free space around `mesh` with spheres.
///
/// The mesh is voxelized on a grid covering `bounds` (plus some padding). Each free voxel
/// is given a sphere radius derived from its clearance (its distance to the mesh surface),
/// and candidate voxels whose sphere overlaps the convex hull of the mesh are covered
/// greedily, largest spheres first.
///
/// `hints` are additional points of free space known to be reachable, for example spawn
/// points of a level.
///
/// Every sphere returned has a radius of at least `params.min_radius`, and its center is at
/// least `radius + params.reduce_radius_margin` away from the mesh surface. Degenerate bounds
/// or meshes with a zero volume result in an empty covering.
pub fn sample_negative_space(
    mesh: &TriMesh,
    bounds: &Aabb,
    params: &NegativeSpaceSampleParameters,
    hints: &[Point<Real>],
) -> NegativeSpaceCovering {
    if !bounds.is_valid() || bounds.extents().min() <= 0.0 {
        log::debug!("Negative space sampling skipped: degenerate bounds.");
        return NegativeSpaceCovering::default();
    }

    if mesh.is_closed() && mesh.signed_volume().abs() <= ZERO_TOLERANCE * bounds.volume() {
        log::debug!("Negative space sampling skipped: the mesh has no volume.");
        return NegativeSpaceCovering::default();
    }

    let Some(hull) = ConvexHull::from_points_thickened(mesh.vertices(), ZERO_TOLERANCE) else {
        return NegativeSpaceCovering::default();
    };

    let min_radius = params.min_radius.max(0.0);
    let radius_margin = params.reduce_radius_margin.max(0.0);
    let max_voxels = params.max_voxels_per_dim.max(8);
    let voxel_size =
        (bounds.max_extent() + 2.0 * (min_radius + radius_margin)) / (max_voxels - 4) as Real;
    let domain = bounds.loosened(min_radius + radius_margin + 2.0 * voxel_size);

    let mut volume = VoxelizedVolume::voxelize(mesh, &domain, voxel_size, FillMode::FloodFill);
    volume.classify_cavities(mesh);
    let clearance = ClearanceField::new(&volume, mesh);

    let grid = SampleGrid {
        mesh,
        volume: &volume,
        clearance: &clearance,
        hull: &hull,
        params,
        margin: radius_margin + voxel_size / 2.0,
        min_radius,
    };

    let candidates = grid.candidates(hints);
    let spheres = grid.cover(candidates);

    log::debug!(
        "Negative space: {} spheres on a {}x{}x{} grid (voxel size {}).",
        spheres.len(),
        volume.resolution().x,
        volume.resolution().y,
        volume.resolution().z,
        voxel_size
    );

    NegativeSpaceCovering::new(spheres)
}

struct SampleGrid<'a> {
    mesh: &'a TriMesh,
    volume: &'a VoxelizedVolume,
    clearance: &'a ClearanceField,
    hull: &'a ConvexHull,
    params: &'a NegativeSpaceSampleParameters,
    margin: Real,
    min_radius: Real,
}

impl SampleGrid<'_> {
    /// The sample radius of the voxel `idx`, from its approximate clearance.
    ///
    /// Never smaller than [`Self::exact_radius`].
    fn radius(&self, idx: u32) -> Real {
        self.clearance.distance(idx) - self.margin
    }

    /// The sample radius of the voxel `idx`, from the exact distance of its center to the
    /// mesh surface.
    fn exact_radius(&self, idx: u32) -> Real {
        let center = self.volume.voxel_center(idx);
        let clearance = self.clearance.distance(idx);
        self.volume.distance_to_surface(self.mesh, &center, clearance) - self.margin
    }

    /// A sample centered on the voxel `idx`, if it still is large enough and still overlaps
    /// the hull of the mesh once its radius is computed exactly.
    fn sample(&self, idx: u32) -> Option<Sphere> {
        let center = self.volume.voxel_center(idx);
        let radius = self.exact_radius(idx);
        let valid = radius > 0.0
            && radius >= self.min_radius
            && self.hull.signed_distance(&center) < radius;
        valid.then(|| Sphere::new(center, radius))
    }

    fn is_free(&self, idx: u32) -> bool {
        self.volume.is_free(idx)
            || (self.params.allow_samples_inside_mesh
                && self.volume.voxel_at(idx) == VoxelValue::PrimitiveInsideSurface)
    }

    fn is_navigable(&self, idx: u32) -> bool {
        if !self.is_free(idx) {
            return false;
        }

        let radius = self.radius(idx);
        match self.params.sample_method {
            SampleMethod::NavigableVoxelSearch => {
                radius >= self.min_radius.max(self.volume.scale())
            }
            SampleMethod::VoxelSearch => radius >= self.min_radius && radius > 0.0,
        }
    }

    /// The voxels eligible for a sample, in increasing index order.
    fn candidates(&self, hints: &[Point<Real>]) -> Vec<u32> {
        let num_voxels = self.volume.len() as u32;
        let navigable: Vec<bool> = (0..num_voxels).map(|idx| self.is_navigable(idx)).collect();

        let reachable = if self.params.sample_method == SampleMethod::NavigableVoxelSearch
            && self.params.only_connected_to_hull
        {
            self.reachable_voxels(&navigable, hints)
        } else {
            navigable
        };

        let eligible: Vec<u32> = (0..num_voxels)
            .filter(|idx| reachable[*idx as usize])
            .collect();

        #[cfg(feature = "parallel")]
        let iter = eligible.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = eligible.iter();

        let overlaps_hull: Vec<bool> = iter
            .map(|idx| {
                let center = self.volume.voxel_center(*idx);
                self.hull.signed_distance(&center) < self.radius(*idx)
            })
            .collect();

        eligible
            .into_iter()
            .zip(overlaps_hull)
            .filter_map(|(idx, overlaps)| overlaps.then_some(idx))
            .collect()
    }

    /// Flood-fills the navigable voxels from the ones outside of the convex hull of the mesh
    /// and from the hints.
    fn reachable_voxels(&self, navigable: &[bool], hints: &[Point<Real>]) -> Vec<bool> {
        let mut reachable = vec![false; navigable.len()];
        let mut queue = VecDeque::new();

        let hint_voxels = hints
            .iter()
            .filter_map(|pt| self.volume.voxel_containing(pt));
        let outside_voxels = (0..navigable.len() as u32).filter(|idx| {
            navigable[*idx as usize]
                && self.hull.signed_distance(&self.volume.voxel_center(*idx)) > 0.0
        });

        for seed in outside_voxels.chain(hint_voxels) {
            if navigable[seed as usize] && !reachable[seed as usize] {
                reachable[seed as usize] = true;
                queue.push_back(seed);
            }
        }

        while let Some(curr) = queue.pop_front() {
            self.volume.for_each_neighbor(curr, true, |n| {
                if navigable[n as usize] && !reachable[n as usize] {
                    reachable[n as usize] = true;
                    queue.push_back(n);
                }
            });
        }

        reachable
    }

    /// Greedily places spheres on the candidates, largest clearance first.
    fn cover(&self, mut candidates: Vec<u32>) -> Vec<Sphere> {
        let sort_key = |idx: &u32| (Reverse(OrderedFloat(self.clearance.distance(*idx))), *idx);

        // The key is a total order: both sorts give the same result.
        #[cfg(feature = "parallel")]
        let sorted = !self.params.deterministic && {
            candidates.par_sort_unstable_by_key(sort_key);
            true
        };
        #[cfg(not(feature = "parallel"))]
        let sorted = false;

        if !sorted {
            candidates.sort_by_key(sort_key);
        }

        let mut is_candidate = vec![false; self.volume.len()];
        for idx in &candidates {
            is_candidate[*idx as usize] = true;
        }

        let mut covered = vec![false; self.volume.len()];
        let mut spheres = Vec::new();
        let target = self.params.target_num_samples;
        let sq_spacing = self.params.min_spacing * self.params.min_spacing;

        for idx in &candidates {
            if target > 0 && spheres.len() >= target && !self.params.require_search_sample_coverage
            {
                break;
            }

            if covered[*idx as usize] {
                continue;
            }

            let center = self.volume.voxel_center(*idx);
            if spheres
                .iter()
                .any(|s: &Sphere| na::distance_squared(&s.center, &center) < sq_spacing)
            {
                continue;
            }

            let Some(sphere) = self.sample(*idx) else {
                continue;
            };
            self.mark_covered(&sphere, &is_candidate, &mut covered);
            spheres.push(sphere);
        }

        if self.params.require_search_sample_coverage {
            for idx in &candidates {
                if covered[*idx as usize] {
                    continue;
                }

                if let Some(sphere) = self.sample(*idx) {
                    self.mark_covered(&sphere, &is_candidate, &mut covered);
                    spheres.push(sphere);
                }
            }
        }

        spheres
    }

    fn mark_covered(&self, sphere: &Sphere, is_candidate: &[bool], covered: &mut [bool]) {
        let Some((ijk0, ijk1)) = self.volume.voxel_range(&sphere.aabb()) else {
            return;
        };

        for k in ijk0.z..ijk1.z {
            for j in ijk0.y..ijk1.y {
                for i in ijk0.x..ijk1.x {
                    let idx = self.volume.voxel_index(i, j, k);
                    if is_candidate[idx as usize]
                        && sphere.contains_point(&self.volume.voxel_center(idx))
                    {
                        covered[idx as usize] = true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{sample_negative_space, NegativeSpaceSampleParameters, SampleMethod};
    use crate::bounding_volume::Aabb;
    use crate::math::Point;
    use crate::shape::TriMesh;

    /// A box with an open top, made of five slabs.
    fn open_box() -> TriMesh {
        let mut mesh = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(10.0, 10.0, 1.0)));
        let walls = [
            Aabb::new(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 10.0, 10.0)),
            Aabb::new(Point::new(9.0, 0.0, 0.0), Point::new(10.0, 10.0, 10.0)),
            Aabb::new(Point::new(0.0, 0.0, 0.0), Point::new(10.0, 1.0, 10.0)),
            Aabb::new(Point::new(0.0, 9.0, 0.0), Point::new(10.0, 10.0, 10.0)),
        ];
        for wall in &walls {
            mesh.append(&TriMesh::cuboid(wall));
        }
        mesh
    }

    #[test]
    fn convex_mesh_has_no_negative_space() {
        let cube = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0)));
        let params = NegativeSpaceSampleParameters {
            min_radius: 0.05,
            max_voxels_per_dim: 24,
            ..Default::default()
        };
        let covering = sample_negative_space(&cube, cube.aabb(), &params, &[]);
        assert!(covering.is_empty());
    }

    #[test]
    fn degenerate_bounds() {
        let cube = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0)));
        let flat = Aabb::new(Point::origin(), Point::new(1.0, 1.0, 0.0));
        let covering =
            sample_negative_space(&cube, &flat, &NegativeSpaceSampleParameters::default(), &[]);
        assert!(covering.is_empty());
    }

    #[test]
    fn open_box_is_sampled() {
        let mesh = open_box();
        let params = NegativeSpaceSampleParameters {
            min_radius: 0.5,
            min_spacing: 0.5,
            reduce_radius_margin: 0.1,
            max_voxels_per_dim: 32,
            ..Default::default()
        };
        let covering = sample_negative_space(&mesh, mesh.aabb(), &params, &[]);
        assert!(!covering.is_empty());

        let interior = Aabb::new(Point::new(1.0, 1.0, 1.0), Point::new(9.0, 9.0, 10.0));
        assert!(covering.iter().any(|s| interior.contains_local_point(&s.center)));

        for sphere in covering.iter() {
            assert!(sphere.radius >= params.min_radius);
            // Samples stay away from the solid by the margin.
            for tri in mesh.triangles() {
                let dist = tri.distance_to_point(&sphere.center);
                assert!(dist >= sphere.radius + params.reduce_radius_margin - 1.0e-9);
            }
        }

        for (i, a) in covering.iter().enumerate() {
            for b in &covering.spheres()[i + 1..] {
                assert!(na::distance(&a.center, &b.center) >= params.min_spacing);
            }
        }

        let limited = NegativeSpaceSampleParameters {
            target_num_samples: 2,
            ..params
        };
        let covering = sample_negative_space(&mesh, mesh.aabb(), &limited, &[]);
        assert_eq!(covering.len(), 2);

        let voxel_search = NegativeSpaceSampleParameters {
            sample_method: SampleMethod::VoxelSearch,
            ..params
        };
        let covering = sample_negative_space(&mesh, mesh.aabb(), &voxel_search, &[]);
        assert!(!covering.is_empty());
    }
}
