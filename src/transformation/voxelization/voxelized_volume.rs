use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};
use crate::shape::TriMesh;
use na::Vector3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Relative enlargement of the voxels tested against the mesh triangles.
const VOXEL_OVERLAP_MARGIN: Real = 1.0e-6;

/// Controls how the voxels that are not on the surface are classified.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillMode {
    /// Only the surface voxels are computed, every other voxel is outside.
    SurfaceOnly,
    /// Voxels connected to the border of the grid are outside, the others are inside.
    FloodFill,
}

/// The classification of a single voxel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VoxelValue {
    /// Not classified yet.
    PrimitiveUndefined,
    /// Outside voxel with neighbors that still have to be visited by the flood fill.
    PrimitiveOutsideSurfaceToWalk,
    /// A voxel reachable from the border of the grid without crossing the surface.
    PrimitiveOutsideSurface,
    /// A voxel enclosed by the surface, and inside of the solid.
    PrimitiveInsideSurface,
    /// A voxel intersecting at least one triangle.
    PrimitiveOnSurface,
    /// A voxel enclosed by the surface, but not part of the solid (an internal pocket).
    PrimitiveCavity,
}

/// A uniform grid of cubic voxels classified against a triangle mesh.
///
/// The voxel `(i, j, k)` covers the box `[origin + (i, j, k) * scale, origin + (i + 1, j + 1,
/// k + 1) * scale]`. Voxels are stored with `i` varying fastest.
#[derive(Clone, Debug)]
pub struct VoxelizedVolume {
    origin: Point<Real>,
    scale: Real,
    resolution: Vector3<u32>,
    num_voxels_on_surface: u32,
    num_voxels_inside_surface: u32,
    num_voxels_outside_surface: u32,
    num_voxels_in_cavities: u32,
    data: Vec<VoxelValue>,
    // Pairs (voxel index, triangle index) sorted lexicographically.
    surface_triangles: Vec<(u32, u32)>,
}

impl VoxelizedVolume {
    /// Voxelizes `mesh` on a grid of voxels of size `voxel_size` covering `domain`.
    ///
    /// The domain is expected to contain the whole mesh: triangles outside of it are only
    /// voxelized where they overlap the grid. Returns an empty volume if the domain is
    /// invalid or if `voxel_size` is not positive.
    pub fn voxelize(mesh: &TriMesh, domain: &Aabb, voxel_size: Real, fill_mode: FillMode) -> Self {
        let mut result = VoxelizedVolume {
            origin: domain.mins,
            scale: voxel_size,
            resolution: Vector3::zeros(),
            num_voxels_on_surface: 0,
            num_voxels_inside_surface: 0,
            num_voxels_outside_surface: 0,
            num_voxels_in_cavities: 0,
            data: Vec::new(),
            surface_triangles: Vec::new(),
        };

        if !domain.is_valid() || voxel_size <= 0.0 || !voxel_size.is_finite() {
            return result;
        }

        let extents = domain.extents();
        result.resolution = extents.map(|e| ((e / voxel_size).ceil() as u32).max(1));
        result.data = vec![VoxelValue::PrimitiveUndefined; result.len()];

        // A face on a voxel boundary marks the voxels on both sides, whatever the rounding.
        let margin = voxel_size * VOXEL_OVERLAP_MARGIN;

        for (tid, tri) in mesh.triangles().enumerate() {
            let Some((ijk0, ijk1)) = result.voxel_range(&tri.aabb().loosened(margin)) else {
                continue;
            };

            for k in ijk0.z..ijk1.z {
                for j in ijk0.y..ijk1.y {
                    for i in ijk0.x..ijk1.x {
                        let voxel = result.voxel_aabb(i, j, k).loosened(margin);

                        if voxel.intersects_triangle(&tri) {
                            let idx = result.voxel_index(i, j, k);
                            let value = &mut result.data[idx as usize];

                            if *value != VoxelValue::PrimitiveOnSurface {
                                *value = VoxelValue::PrimitiveOnSurface;
                                result.num_voxels_on_surface += 1;
                            }

                            result.surface_triangles.push((idx, tid as u32));
                        }
                    }
                }
            }
        }

        result.surface_triangles.sort_unstable();

        match fill_mode {
            FillMode::SurfaceOnly => {
                for value in &mut result.data {
                    if *value != VoxelValue::PrimitiveOnSurface {
                        *value = VoxelValue::PrimitiveOutsideSurface;
                        result.num_voxels_outside_surface += 1;
                    }
                }
            }
            FillMode::FloodFill => {
                let [rx, ry, rz] = [result.resolution.x, result.resolution.y, result.resolution.z];
                result.mark_outside_surface([0, 0, 0], [rx, ry, 1]);
                result.mark_outside_surface([0, 0, rz - 1], [rx, ry, rz]);
                result.mark_outside_surface([0, 0, 0], [rx, 1, rz]);
                result.mark_outside_surface([0, ry - 1, 0], [rx, ry, rz]);
                result.mark_outside_surface([0, 0, 0], [1, ry, rz]);
                result.mark_outside_surface([rx - 1, 0, 0], [rx, ry, rz]);
                result.fill_outside_surface();
                result.fill_inside_surface();
            }
        }

        log::debug!(
            "Voxelized {} triangles on a {}x{}x{} grid: {} surface, {} inside, {} outside voxels.",
            mesh.num_triangles(),
            result.resolution.x,
            result.resolution.y,
            result.resolution.z,
            result.num_voxels_on_surface,
            result.num_voxels_inside_surface,
            result.num_voxels_outside_surface
        );

        result
    }

    /// The number of voxels along each axis.
    #[inline]
    pub fn resolution(&self) -> Vector3<u32> {
        self.resolution
    }

    /// The size of the voxels.
    #[inline]
    pub fn scale(&self) -> Real {
        self.scale
    }

    /// The corner of the grid with the smallest coordinates.
    #[inline]
    pub fn origin(&self) -> Point<Real> {
        self.origin
    }

    /// The total number of voxels.
    #[inline]
    pub fn len(&self) -> usize {
        self.resolution.x as usize * self.resolution.y as usize * self.resolution.z as usize
    }

    /// Does this grid contain no voxel at all?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The linear index of the voxel `(i, j, k)`.
    #[inline]
    pub fn voxel_index(&self, i: u32, j: u32, k: u32) -> u32 {
        i + j * self.resolution.x + k * self.resolution.x * self.resolution.y
    }

    /// The grid coordinates of the voxel with linear index `idx`.
    #[inline]
    pub fn voxel_coords(&self, idx: u32) -> Vector3<u32> {
        let rx = self.resolution.x;
        let rxy = rx * self.resolution.y;
        Vector3::new(idx % rx, (idx % rxy) / rx, idx / rxy)
    }

    /// The classification of the voxel `(i, j, k)`.
    #[inline]
    pub fn voxel(&self, i: u32, j: u32, k: u32) -> VoxelValue {
        self.data[self.voxel_index(i, j, k) as usize]
    }

    /// The classification of the voxel with linear index `idx`.
    #[inline]
    pub fn voxel_at(&self, idx: u32) -> VoxelValue {
        self.data[idx as usize]
    }

    /// Is the voxel with linear index `idx` outside of the solid, either connected to the
    /// border of the grid or inside a cavity?
    #[inline]
    pub fn is_free(&self, idx: u32) -> bool {
        matches!(
            self.data[idx as usize],
            VoxelValue::PrimitiveOutsideSurface | VoxelValue::PrimitiveCavity
        )
    }

    /// The center of the voxel with linear index `idx`.
    #[inline]
    pub fn voxel_center(&self, idx: u32) -> Point<Real> {
        let ijk = self.voxel_coords(idx);
        self.origin + (ijk.cast::<Real>() + Vector::repeat(0.5)) * self.scale
    }

    /// The box covered by the voxel `(i, j, k)`.
    #[inline]
    pub fn voxel_aabb(&self, i: u32, j: u32, k: u32) -> Aabb {
        let mins = self.origin + Vector::new(i as Real, j as Real, k as Real) * self.scale;
        Aabb::new(mins, mins + Vector::repeat(self.scale))
    }

    /// The linear index of the voxel containing `pt`, if it lies inside of the grid.
    pub fn voxel_containing(&self, pt: &Point<Real>) -> Option<u32> {
        if self.is_empty() {
            return None;
        }

        let local = (pt - self.origin) / self.scale;
        let mut ijk = [0; 3];

        for d in 0..3 {
            if !(local[d] >= 0.0) {
                return None;
            }

            let c = local[d] as u32;
            if c > self.resolution[d] || (c == self.resolution[d] && local[d] > c as Real) {
                return None;
            }

            ijk[d] = c.min(self.resolution[d] - 1);
        }

        Some(self.voxel_index(ijk[0], ijk[1], ijk[2]))
    }

    /// The range `[ijk0, ijk1)` of voxels overlapping `aabb`, or `None` if `aabb` does not
    /// overlap the grid.
    pub fn voxel_range(&self, aabb: &Aabb) -> Option<(Vector3<u32>, Vector3<u32>)> {
        if self.is_empty() {
            return None;
        }

        let mut ijk0 = Vector3::zeros();
        let mut ijk1 = Vector3::zeros();

        for d in 0..3 {
            let lo = ((aabb.mins[d] - self.origin[d]) / self.scale).floor();
            let hi = ((aabb.maxs[d] - self.origin[d]) / self.scale).floor();

            if hi < 0.0 || lo >= self.resolution[d] as Real {
                return None;
            }

            ijk0[d] = lo.max(0.0) as u32;
            ijk1[d] = (hi as u32 + 1).min(self.resolution[d]);
        }

        Some((ijk0, ijk1))
    }

    /// Calls `f` on the linear index of each of the 6 (face-sharing) or 26 (face, edge, or
    /// vertex-sharing) neighbors of the voxel `idx`.
    pub fn for_each_neighbor(&self, idx: u32, connectivity26: bool, mut f: impl FnMut(u32)) {
        let ijk = self.voxel_coords(idx).cast::<i64>();
        let res = self.resolution.cast::<i64>();

        for dk in -1i64..=1 {
            for dj in -1i64..=1 {
                for di in -1i64..=1 {
                    let manhattan = di.abs() + dj.abs() + dk.abs();
                    if manhattan == 0 || (!connectivity26 && manhattan != 1) {
                        continue;
                    }

                    let n = ijk + Vector3::new(di, dj, dk);
                    if n.x < 0 || n.y < 0 || n.z < 0 || n.x >= res.x || n.y >= res.y || n.z >= res.z
                    {
                        continue;
                    }

                    f(self.voxel_index(n.x as u32, n.y as u32, n.z as u32));
                }
            }
        }
    }

    /// The `(voxel index, triangle index)` pairs of every surface voxel and every triangle
    /// overlapping it, sorted.
    #[inline]
    pub fn surface_triangles(&self) -> &[(u32, u32)] {
        &self.surface_triangles
    }

    /// The triangles overlapping the voxel with linear index `idx`.
    pub fn triangles_on_voxel(&self, idx: u32) -> impl Iterator<Item = u32> + '_ {
        let start = self.surface_triangles.partition_point(|(voxel, _)| *voxel < idx);
        self.surface_triangles[start..]
            .iter()
            .take_while(move |(voxel, _)| *voxel == idx)
            .map(|(_, tri)| *tri)
    }

    /// The exact distance from `pt` to the surface of `mesh`, or `max_dist` if the surface
    /// is farther than that.
    ///
    /// Only the triangles overlapping the voxels within `max_dist` of `pt` are tested, so
    /// `mesh` must be the mesh this grid was voxelized from, and lie inside of the grid.
    pub fn distance_to_surface(&self, mesh: &TriMesh, pt: &Point<Real>, max_dist: Real) -> Real {
        if !max_dist.is_finite() {
            return mesh
                .triangles()
                .map(|tri| tri.distance_to_point(pt))
                .fold(max_dist, Real::min);
        }

        let ball = Aabb::new(*pt - Vector::repeat(max_dist), *pt + Vector::repeat(max_dist));
        let Some((ijk0, ijk1)) = self.voxel_range(&ball) else {
            return max_dist;
        };

        let mut triangles = Vec::new();
        for k in ijk0.z..ijk1.z {
            for j in ijk0.y..ijk1.y {
                for i in ijk0.x..ijk1.x {
                    triangles.extend(self.triangles_on_voxel(self.voxel_index(i, j, k)));
                }
            }
        }

        triangles.sort_unstable();
        triangles.dedup();
        triangles
            .into_iter()
            .map(|tri| mesh.triangle(tri).distance_to_point(pt))
            .fold(max_dist, Real::min)
    }

    /// The number of voxels intersecting the surface.
    pub fn num_voxels_on_surface(&self) -> u32 {
        self.num_voxels_on_surface
    }

    /// The number of voxels enclosed by the surface and inside of the solid.
    pub fn num_voxels_inside_surface(&self) -> u32 {
        self.num_voxels_inside_surface
    }

    /// The number of voxels connected to the border of the grid.
    pub fn num_voxels_outside_surface(&self) -> u32 {
        self.num_voxels_outside_surface
    }

    /// The number of enclosed voxels that are not part of the solid.
    pub fn num_voxels_in_cavities(&self) -> u32 {
        self.num_voxels_in_cavities
    }

    /// Reclassifies as [`VoxelValue::PrimitiveCavity`] every face-connected group of inside
    /// voxels that is not part of the solid bounded by `mesh`.
    ///
    /// A group is tested once, at the center of its voxel with the smallest index, with the
    /// generalized winding number of the mesh.
    pub fn classify_cavities(&mut self, mesh: &TriMesh) {
        let mut visited = vec![false; self.len()];
        let mut components = Vec::new();
        let mut stack = Vec::new();

        for seed in 0..self.len() as u32 {
            let is_inside = self.data[seed as usize] == VoxelValue::PrimitiveInsideSurface;
            if visited[seed as usize] || !is_inside {
                continue;
            }

            let mut component = vec![seed];
            visited[seed as usize] = true;
            stack.push(seed);

            while let Some(curr) = stack.pop() {
                self.for_each_neighbor(curr, false, |n| {
                    let is_inside = self.data[n as usize] == VoxelValue::PrimitiveInsideSurface;
                    if !visited[n as usize] && is_inside {
                        visited[n as usize] = true;
                        component.push(n);
                        stack.push(n);
                    }
                });
            }

            components.push(component);
        }

        #[cfg(feature = "parallel")]
        let iter = components.par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = components.iter();

        let is_cavity: Vec<bool> = iter
            .map(|component| mesh.winding_number(&self.voxel_center(component[0])) < 0.5)
            .collect();

        for (component, is_cavity) in components.iter().zip(is_cavity) {
            if is_cavity {
                for idx in component {
                    self.data[*idx as usize] = VoxelValue::PrimitiveCavity;
                }
                self.num_voxels_inside_surface -= component.len() as u32;
                self.num_voxels_in_cavities += component.len() as u32;
            }
        }

        if self.num_voxels_in_cavities > 0 {
            log::debug!(
                "Found {} voxels inside of cavities.",
                self.num_voxels_in_cavities
            );
        }
    }

    /// Mark all the undefined voxels within `[ijk0, ijk1)` as outside voxels to walk.
    fn mark_outside_surface(&mut self, ijk0: [u32; 3], ijk1: [u32; 3]) {
        for k in ijk0[2]..ijk1[2] {
            for j in ijk0[1]..ijk1[1] {
                for i in ijk0[0]..ijk1[0] {
                    let idx = self.voxel_index(i, j, k) as usize;

                    if self.data[idx] == VoxelValue::PrimitiveUndefined {
                        self.data[idx] = VoxelValue::PrimitiveOutsideSurfaceToWalk;
                    }
                }
            }
        }
    }

    /// Marks as "to walk" the undefined voxels met when walking from `idx` along `stride`, for
    /// at most `steps` voxels.
    fn walk(data: &mut [VoxelValue], mut idx: isize, stride: isize, steps: isize) {
        for _ in 0..steps {
            idx += stride;

            if data[idx as usize] != VoxelValue::PrimitiveUndefined {
                break;
            }

            data[idx as usize] = VoxelValue::PrimitiveOutsideSurfaceToWalk;
        }
    }

    fn fill_outside_surface(&mut self) {
        // Short walks in memory order converge in a few sweeps without needing a queue as
        // large as the grid.
        const WALK_DISTANCE: isize = 64;

        let res = self.resolution.cast::<isize>();
        let strides = [1, res.x, res.x * res.y];

        loop {
            let mut voxels_walked = 0;

            for k in 0..res.z {
                for j in 0..res.y {
                    for i in 0..res.x {
                        let idx = i + j * strides[1] + k * strides[2];

                        if self.data[idx as usize] != VoxelValue::PrimitiveOutsideSurfaceToWalk {
                            continue;
                        }

                        voxels_walked += 1;
                        self.data[idx as usize] = VoxelValue::PrimitiveOutsideSurface;

                        for (d, coord) in [i, j, k].into_iter().enumerate() {
                            let forward = (res[d] - 1 - coord).min(WALK_DISTANCE);
                            let backward = coord.min(WALK_DISTANCE);
                            Self::walk(&mut self.data, idx, strides[d], forward);
                            Self::walk(&mut self.data, idx, -strides[d], backward);
                        }
                    }
                }
            }

            self.num_voxels_outside_surface += voxels_walked;

            if voxels_walked == 0 {
                break;
            }
        }
    }

    fn fill_inside_surface(&mut self) {
        for value in &mut self.data {
            if *value == VoxelValue::PrimitiveUndefined {
                *value = VoxelValue::PrimitiveInsideSurface;
                self.num_voxels_inside_surface += 1;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{FillMode, VoxelValue, VoxelizedVolume};
    use crate::bounding_volume::Aabb;
    use crate::math::{Point, Real, Vector};
    use crate::shape::TriMesh;

    fn cube_volume(fill_mode: FillMode) -> VoxelizedVolume {
        let cube = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0)));
        let domain = cube.aabb().loosened(0.25);
        VoxelizedVolume::voxelize(&cube, &domain, 0.1, fill_mode)
    }

    #[test]
    fn voxelize_cube_flood_fill() {
        let volume = cube_volume(FillMode::FloodFill);
        assert_eq!(volume.resolution(), na::Vector3::new(15, 15, 15));
        assert_eq!(volume.len(), 15 * 15 * 15);

        // Corners of the grid are outside, its center is inside.
        assert_eq!(volume.voxel(0, 0, 0), VoxelValue::PrimitiveOutsideSurface);
        assert_eq!(volume.voxel(7, 7, 7), VoxelValue::PrimitiveInsideSurface);

        let center = volume
            .voxel_containing(&Point::new(0.5, 0.5, 0.5))
            .unwrap();
        assert_eq!(volume.voxel_at(center), VoxelValue::PrimitiveInsideSurface);
        assert!(!volume.is_free(center));

        let total = volume.num_voxels_on_surface()
            + volume.num_voxels_inside_surface()
            + volume.num_voxels_outside_surface();
        assert_eq!(total as usize, volume.len());
        assert!(volume
            .surface_triangles()
            .windows(2)
            .all(|w| w[0] < w[1]));
    }

    #[test]
    fn voxelize_surface_only() {
        let volume = cube_volume(FillMode::SurfaceOnly);
        assert_eq!(volume.num_voxels_inside_surface(), 0);
        assert_eq!(volume.voxel(7, 7, 7), VoxelValue::PrimitiveOutsideSurface);
    }

    #[test]
    fn index_and_coordinates_agree() {
        let volume = cube_volume(FillMode::SurfaceOnly);
        let idx = volume.voxel_index(3, 4, 5);
        assert_eq!(volume.voxel_coords(idx), na::Vector3::new(3, 4, 5));
        assert_eq!(volume.voxel_containing(&volume.voxel_center(idx)), Some(idx));
        assert_eq!(
            volume.voxel_containing(&(volume.origin() - Vector::repeat(0.01))),
            None
        );

        let mut count6 = 0;
        let mut count26 = 0;
        volume.for_each_neighbor(idx, false, |_| count6 += 1);
        volume.for_each_neighbor(idx, true, |_| count26 += 1);
        assert_eq!((count6, count26), (6, 26));

        let mut corner_count = 0;
        volume.for_each_neighbor(0, true, |_| corner_count += 1);
        assert_eq!(corner_count, 7);
    }

    #[test]
    fn boxes_aligned_with_the_grid_are_watertight() {
        // Faces of these boxes fall exactly on voxel boundaries.
        let boxes = [
            Aabb::new(Point::origin(), Point::new(3.0, 1.0, 1.0)),
            Aabb::new(Point::new(0.1, 0.2, 0.3), Point::new(1.7, 2.9, 1.3)),
        ];

        for aabb in &boxes {
            let mesh = TriMesh::cuboid(aabb);

            for n in [22, 24, 31, 33] {
                let voxel_size = aabb.max_extent() / (n - 2) as Real;
                let domain = aabb.loosened(voxel_size);
                let volume =
                    VoxelizedVolume::voxelize(&mesh, &domain, voxel_size, FillMode::FloodFill);

                assert!(volume.num_voxels_inside_surface() > 0);
                for idx in 0..volume.len() as u32 {
                    if volume.is_free(idx) {
                        assert!(!aabb.contains_local_point(&volume.voxel_center(idx)));
                    }
                }
            }
        }
    }

    #[test]
    fn distance_to_surface_is_exact() {
        let cube = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0)));
        let domain = cube.aabb().loosened(1.0);
        let volume = VoxelizedVolume::voxelize(&cube, &domain, 0.1, FillMode::FloodFill);

        let pts = [
            Point::new(0.5, 0.5, 1.37),
            Point::new(-0.4, 1.3, 0.5),
            Point::new(0.3, 0.6, 0.55),
        ];

        for pt in &pts {
            let exact = cube
                .triangles()
                .map(|t| t.distance_to_point(pt))
                .fold(Real::MAX, Real::min);
            let dist = volume.distance_to_surface(&cube, pt, 2.0);
            assert_relative_eq!(dist, exact, epsilon = 1.0e-12);
            assert_relative_eq!(
                volume.distance_to_surface(&cube, pt, Real::INFINITY),
                exact,
                epsilon = 1.0e-12
            );
            assert_eq!(volume.distance_to_surface(&cube, pt, exact * 0.5), exact * 0.5);
        }
    }

    #[test]
    fn enclosed_pocket_is_a_cavity() {
        // A box with an inner box facing inward: the space between both is solid, the inner
        // region is a closed pocket of free space.
        let outer = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(3.0, 3.0, 3.0)));
        let mut inner = TriMesh::cuboid(&Aabb::new(
            Point::new(1.0, 1.0, 1.0),
            Point::new(2.0, 2.0, 2.0),
        ));
        inner.reverse();
        let mut mesh = outer;
        mesh.append(&inner);

        let domain = mesh.aabb().loosened(0.2);
        let mut volume = VoxelizedVolume::voxelize(&mesh, &domain, 0.1, FillMode::FloodFill);
        let pocket = volume.voxel_containing(&Point::new(1.5, 1.5, 1.5)).unwrap();
        let solid = volume.voxel_containing(&Point::new(0.5, 0.5, 0.5)).unwrap();
        assert_eq!(volume.voxel_at(pocket), VoxelValue::PrimitiveInsideSurface);

        volume.classify_cavities(&mesh);
        assert_eq!(volume.voxel_at(pocket), VoxelValue::PrimitiveCavity);
        assert_eq!(volume.voxel_at(solid), VoxelValue::PrimitiveInsideSurface);
        assert!(volume.is_free(pocket));
        assert!(volume.num_voxels_in_cavities() > 0);
    }
}
