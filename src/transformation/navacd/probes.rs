use crate::math::{Point, Real};
use crate::shape::{ConvexHull, TriMesh};
use crate::transformation::voxelization::{ClearanceField, FillMode, VoxelizedVolume};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Points of free space used to measure how far a convex hull extends beyond the solid.
///
/// Probes are the centers of the free voxels (outside of the solid or inside of a cavity)
/// that lie inside of the convex hull of the whole mesh. Each probe carries its clearance,
/// i.e., its exact distance to the mesh surface.
#[derive(Clone, Debug)]
pub(crate) struct FitProbes {
    volume: VoxelizedVolume,
    probe_of_voxel: Vec<u32>,
    points: Vec<Point<Real>>,
    clearances: Vec<Real>,
    epsilon: Real,
}

impl FitProbes {
    pub fn new(mesh: &TriMesh, global_hull: &ConvexHull, max_voxels_per_dim: u32) -> Self {
        let aabb = mesh.aabb();
        // One voxel of padding on each side.
        let voxel_size = aabb.max_extent() / max_voxels_per_dim.max(3).saturating_sub(2) as Real;
        let domain = aabb.loosened(voxel_size);
        let mut volume = VoxelizedVolume::voxelize(mesh, &domain, voxel_size, FillMode::FloodFill);
        volume.classify_cavities(mesh);
        let clearance = ClearanceField::new(&volume, mesh);
        let epsilon = voxel_size * 1.0e-6;

        let free: Vec<u32> = (0..volume.len() as u32)
            .filter(|idx| volume.is_free(*idx))
            .collect();

        #[cfg(feature = "parallel")]
        let iter = free.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = free.iter();

        // The exact clearance of the free voxels inside of the hull, `None` for the others.
        let probe_clearances: Vec<Option<Real>> = iter
            .map(|idx| {
                let center = volume.voxel_center(*idx);
                (global_hull.signed_distance(&center) < -epsilon).then(|| {
                    volume.distance_to_surface(mesh, &center, clearance.distance(*idx))
                })
            })
            .collect();

        let mut probe_of_voxel = vec![u32::MAX; volume.len()];
        let mut points = Vec::new();
        let mut clearances = Vec::new();

        for (idx, probe_clearance) in free.iter().zip(probe_clearances) {
            if let Some(probe_clearance) = probe_clearance {
                probe_of_voxel[*idx as usize] = points.len() as u32;
                points.push(volume.voxel_center(*idx));
                clearances.push(probe_clearance);
            }
        }

        log::debug!(
            "Fit probes: {} probes on a {}x{}x{} grid with voxel size {}.",
            points.len(),
            volume.resolution().x,
            volume.resolution().y,
            volume.resolution().z,
            voxel_size
        );

        Self {
            volume,
            probe_of_voxel,
            points,
            clearances,
            epsilon,
        }
    }

    /// The size of the voxels the probes were generated from.
    pub fn voxel_size(&self) -> Real {
        self.volume.scale()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn point(&self, probe: u32) -> Point<Real> {
        self.points[probe as usize]
    }

    /// The largest clearance of the probes strictly inside of `hull`, and the first probe
    /// reaching it. Returns `(0.0, None)` if no probe is inside.
    pub fn fit_error(&self, hull: &ConvexHull) -> (Real, Option<u32>) {
        let mut best = (0.0, None);

        let _ = self.visit_probes(hull, |probe, clearance| {
            if clearance > best.0 && self.is_strictly_inside(hull, probe) {
                best = (clearance, Some(probe));
            }
            false
        });

        best
    }

    /// Is there a probe with a clearance greater than `threshold` strictly inside of `hull`?
    pub fn fit_error_exceeds(&self, hull: &ConvexHull, threshold: Real) -> bool {
        self.visit_probes(hull, |probe, clearance| {
            clearance > threshold && self.is_strictly_inside(hull, probe)
        })
    }

    fn is_strictly_inside(&self, hull: &ConvexHull, probe: u32) -> bool {
        hull.signed_distance(&self.points[probe as usize]) < -self.epsilon
    }

    /// Calls `f` on every probe inside of the AABB of `hull`, in increasing voxel index order,
    /// until it returns `true`.
    fn visit_probes(&self, hull: &ConvexHull, mut f: impl FnMut(u32, Real) -> bool) -> bool {
        let Some((ijk0, ijk1)) = self.volume.voxel_range(hull.aabb()) else {
            return false;
        };

        for k in ijk0.z..ijk1.z {
            for j in ijk0.y..ijk1.y {
                for i in ijk0.x..ijk1.x {
                    let probe = self.probe_of_voxel[self.volume.voxel_index(i, j, k) as usize];

                    if probe != u32::MAX && f(probe, self.clearances[probe as usize]) {
                        return true;
                    }
                }
            }
        }

        false
    }
}
