use super::VoxelizedVolume;
use crate::math::Real;
use crate::shape::TriMesh;
use core::cmp::Reverse;
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The approximate distance from the center of each voxel of a grid to the surface of a
/// triangle mesh.
///
/// Every voxel is assigned a nearest triangle, propagated from the surface voxels to their
/// neighbors in increasing order of distance (Dijkstra over the 26-neighborhood). The stored
/// distance is the exact distance between the voxel center and its assigned triangle: it is
/// an upper bound of the true distance to the surface, and may overestimate it where the
/// nearest triangle changes. [`VoxelizedVolume::distance_to_surface`] gives the exact value.
#[derive(Clone, Debug)]
pub struct ClearanceField {
    distances: Vec<Real>,
    nearest_triangles: Vec<u32>,
}

impl ClearanceField {
    /// Computes the clearance of every voxel of `volume`, relative to the mesh it was
    /// voxelized from.
    ///
    /// Voxels unreachable from any surface voxel keep an infinite clearance.
    pub fn new(volume: &VoxelizedVolume, mesh: &TriMesh) -> Self {
        let mut distances = vec![Real::INFINITY; volume.len()];
        let mut nearest_triangles = vec![u32::MAX; volume.len()];

        // Group the (voxel, triangle) pairs by voxel. They are sorted by voxel index.
        let pairs = volume.surface_triangles();
        let mut groups = Vec::new();
        let mut start = 0;

        for i in 1..=pairs.len() {
            if i == pairs.len() || pairs[i].0 != pairs[start].0 {
                groups.push(&pairs[start..i]);
                start = i;
            }
        }

        #[cfg(feature = "parallel")]
        let iter = groups.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = groups.iter();

        let seeds: Vec<(u32, Real, u32)> = iter
            .map(|group| {
                let voxel = group[0].0;
                let center = volume.voxel_center(voxel);
                let mut best = (Real::INFINITY, u32::MAX);

                for (_, tri) in group.iter() {
                    let dist = mesh.triangle(*tri).distance_to_point(&center);
                    if dist < best.0 {
                        best = (dist, *tri);
                    }
                }

                (voxel, best.0, best.1)
            })
            .collect();

        let mut heap = BinaryHeap::with_capacity(seeds.len());

        for (voxel, dist, tri) in seeds {
            distances[voxel as usize] = dist;
            nearest_triangles[voxel as usize] = tri;
            heap.push(Reverse((OrderedFloat(dist), voxel)));
        }

        while let Some(Reverse((OrderedFloat(dist), voxel))) = heap.pop() {
            if dist > distances[voxel as usize] {
                continue;
            }

            let tri_id = nearest_triangles[voxel as usize];
            let tri = mesh.triangle(tri_id);

            volume.for_each_neighbor(voxel, true, |neighbor| {
                let candidate = tri.distance_to_point(&volume.voxel_center(neighbor));

                if candidate < distances[neighbor as usize] {
                    distances[neighbor as usize] = candidate;
                    nearest_triangles[neighbor as usize] = tri_id;
                    heap.push(Reverse((OrderedFloat(candidate), neighbor)));
                }
            });
        }

        Self {
            distances,
            nearest_triangles,
        }
    }

    /// The clearance of the voxel with linear index `idx`.
    #[inline]
    pub fn distance(&self, idx: u32) -> Real {
        self.distances[idx as usize]
    }

    /// The clearance of every voxel, indexed like the voxels of the grid.
    #[inline]
    pub fn distances(&self) -> &[Real] {
        &self.distances
    }

    /// The triangle assigned to the voxel with linear index `idx`, if any.
    #[inline]
    pub fn nearest_triangle(&self, idx: u32) -> Option<u32> {
        let tri = self.nearest_triangles[idx as usize];
        (tri != u32::MAX).then_some(tri)
    }
}
