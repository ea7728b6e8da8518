use super::{
    sample_negative_space, ConvexDecomposition, DecompositionError, DecompositionParameters,
    NegativeSpaceCovering, NegativeSpaceSampleParameters, SampleMethod,
};
use crate::math::{Real, ZERO_TOLERANCE};
use crate::shape::{ConvexHull, TriMesh};
use crate::transformation::{preprocess_mesh, PreprocessFlags, PreprocessReport};
use core::time::Duration;
use std::time::Instant;

/// Vertices closer than this fraction of the mesh size are welded together.
const WELD_TOLERANCE_FRACTION: Real = 1.0e-7;

/// Settings of [`decompose_mesh`].
///
/// Lengths are given as fractions of the largest dimension of the mesh bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct NavAcdSettings {
    /// The radius of the smallest agent that must be able to move through the free space.
    ///
    /// Set to 0 to ignore the negative space entirely.
    pub min_radius_fraction: Real,
    /// How far hulls may extend into the free space.
    pub tolerance_fraction: Real,
    /// Also keep the free space that cannot be reached from outside of the mesh.
    pub protect_unreachable: bool,
    /// Weld duplicate vertices and remove the resulting degenerate triangles first.
    pub merge_edges: bool,
    /// See [`DecompositionParameters::max_shape_count`].
    pub max_shape_count: usize,
    /// Hulls thinner than this are always allowed to be merged.
    pub min_thickness_fraction: Real,
    /// See [`DecompositionParameters::max_convex_edge_planes`].
    pub max_convex_edge_planes: usize,
    /// Resolution of the voxel grids along the largest dimension of the mesh.
    pub max_voxels_per_dim: u32,
    /// Only use order-preserving parallel algorithms.
    pub deterministic: bool,
}

impl Default for NavAcdSettings {
    fn default() -> Self {
        Self {
            min_radius_fraction: 0.05,
            tolerance_fraction: 0.01,
            protect_unreachable: false,
            merge_edges: true,
            max_shape_count: 0,
            min_thickness_fraction: 0.001,
            max_convex_edge_planes: 16,
            max_voxels_per_dim: 48,
            deterministic: true,
        }
    }
}

/// Statistics about a run of [`decompose_mesh`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DecompositionStats {
    /// What the mesh cleanup did.
    pub preprocess: PreprocessReport,
    /// Time spent cleaning up the mesh.
    pub preprocess_time: Duration,
    /// Time spent sampling the negative space.
    pub sampling_time: Duration,
    /// Time spent splitting hulls.
    pub splitting_time: Duration,
    /// Time spent cutting hulls out of the negative space.
    pub overlap_fixing_time: Duration,
    /// Time spent merging hulls.
    pub merging_time: Duration,
    /// The number of negative-space spheres.
    pub num_samples: usize,
    /// The number of hull splits.
    pub num_splits: usize,
    /// The number of hull cuts.
    pub num_cuts: usize,
    /// The number of hull merges.
    pub num_merges: usize,
    /// The final number of hulls.
    pub num_hulls: usize,
}

impl DecompositionStats {
    /// The total time spent decomposing the mesh.
    pub fn total_time(&self) -> Duration {
        self.preprocess_time
            + self.sampling_time
            + self.splitting_time
            + self.overlap_fixing_time
            + self.merging_time
    }
}

/// The output of [`decompose_mesh`].
#[derive(Clone, Debug)]
pub struct NavAcdResult {
    /// The convex hulls approximating the mesh.
    pub hulls: Vec<ConvexHull>,
    /// The spheres of free space the hulls stay out of.
    pub covering: NegativeSpaceCovering,
    /// Statistics about the decomposition.
    pub stats: DecompositionStats,
}

/// Decomposes `mesh` into convex hulls that keep its navigable free space empty.
///
/// This cleans up the mesh, samples its negative space, then splits, cuts, and merges hulls
/// as described in [`ConvexDecomposition`].
pub fn decompose_mesh(
    mut mesh: TriMesh,
    settings: &NavAcdSettings,
) -> Result<NavAcdResult, DecompositionError> {
    let mut stats = DecompositionStats::default();

    let t0 = Instant::now();
    let mut flags = PreprocessFlags::ORIENT_OUTWARD;
    if settings.merge_edges {
        flags |= PreprocessFlags::MERGE_DUPLICATE_VERTICES
            | PreprocessFlags::DELETE_DEGENERATE_TRIANGLES;
    }
    let weld_tolerance = WELD_TOLERANCE_FRACTION * mesh.aabb().max_extent();
    stats.preprocess = preprocess_mesh(&mut mesh, flags, weld_tolerance);
    stats.preprocess_time = t0.elapsed();
    log::info!(
        "Preprocessed the mesh in {:?}: {} vertices, {} triangles.",
        stats.preprocess_time,
        mesh.vertices().len(),
        mesh.num_triangles()
    );

    let extent = mesh.aabb().max_extent();
    let min_radius = settings.min_radius_fraction * extent;
    let tolerance = settings.tolerance_fraction * extent;

    let t0 = Instant::now();
    let covering = if min_radius > 0.0 {
        let params = NegativeSpaceSampleParameters {
            sample_method: SampleMethod::NavigableVoxelSearch,
            min_radius,
            min_spacing: min_radius,
            reduce_radius_margin: tolerance,
            only_connected_to_hull: !settings.protect_unreachable,
            require_search_sample_coverage: false,
            deterministic: settings.deterministic,
            max_voxels_per_dim: settings.max_voxels_per_dim,
            ..Default::default()
        };
        sample_negative_space(&mesh, mesh.aabb(), &params, &[])
    } else {
        NegativeSpaceCovering::default()
    };
    stats.sampling_time = t0.elapsed();
    stats.num_samples = covering.len();
    log::info!(
        "Sampled {} negative-space spheres in {:?}.",
        stats.num_samples,
        stats.sampling_time
    );

    let params = DecompositionParameters {
        error_tolerance: tolerance,
        negative_space_tolerance: tolerance,
        min_thickness_tolerance: settings.min_thickness_fraction * extent,
        max_shape_count: settings.max_shape_count,
        max_convex_edge_planes: settings.max_convex_edge_planes,
        thicken_after_hull_failure: ZERO_TOLERANCE.max(weld_tolerance),
        max_voxels_per_dim: settings.max_voxels_per_dim,
        ..Default::default()
    };

    let mut decomp = ConvexDecomposition::new(mesh, params)?;
    decomp.set_negative_space(covering);

    let t0 = Instant::now();
    stats.num_splits = decomp.split_hulls()?;
    stats.splitting_time = t0.elapsed();
    log::info!(
        "Split hulls {} times in {:?}.",
        stats.num_splits,
        stats.splitting_time
    );

    let t0 = Instant::now();
    stats.num_cuts = decomp.fix_hull_overlaps_in_negative_space();
    stats.overlap_fixing_time = t0.elapsed();
    log::info!(
        "Cut hulls out of the negative space {} times in {:?}.",
        stats.num_cuts,
        stats.overlap_fixing_time
    );

    let t0 = Instant::now();
    stats.num_merges = decomp.merge_hulls();
    stats.merging_time = t0.elapsed();
    stats.num_hulls = decomp.num_hulls();
    log::info!(
        "Merged hulls {} times in {:?}: {} hulls left.",
        stats.num_merges,
        stats.merging_time,
        stats.num_hulls
    );

    let covering = decomp.negative_space().clone();

    Ok(NavAcdResult {
        hulls: decomp.into_hulls(),
        covering,
        stats,
    })
}

#[cfg(test)]
mod test {
    use super::{decompose_mesh, NavAcdSettings};
    use crate::bounding_volume::Aabb;
    use crate::math::Point;
    use crate::shape::TriMesh;
    use crate::transformation::navacd::DecompositionError;

    fn settings() -> NavAcdSettings {
        NavAcdSettings {
            max_voxels_per_dim: 24,
            ..Default::default()
        }
    }

    #[test]
    fn cube_is_a_single_hull() {
        let cube = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(1.0, 2.0, 1.0)));
        let result = decompose_mesh(cube, &settings()).unwrap();
        assert_eq!(result.hulls.len(), 1);
        assert_eq!(result.stats.num_hulls, 1);
        assert_eq!(result.stats.num_splits, 0);
        assert_relative_eq!(result.hulls[0].volume(), 2.0, epsilon = 1.0e-9);
    }

    #[test]
    fn inverted_cube_is_reoriented() {
        let mut cube = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0)));
        cube.reverse();
        let result = decompose_mesh(cube, &settings()).unwrap();
        assert!(result.stats.preprocess.reversed);
        assert_eq!(result.hulls.len(), 1);
    }

    #[test]
    fn separated_cubes_keep_the_gap_free() {
        let mut mesh = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0)));
        mesh.append(&TriMesh::cuboid(&Aabb::new(
            Point::new(3.0, 0.0, 0.0),
            Point::new(4.0, 1.0, 1.0),
        )));

        let settings = settings();
        let result = decompose_mesh(mesh, &settings).unwrap();
        assert!(result.hulls.len() >= 2);
        assert!(!result.covering.is_empty());
        assert_eq!(result.stats.num_samples, result.covering.len());

        let tolerance = settings.tolerance_fraction * 4.0;
        for sphere in result.covering.iter() {
            assert!(sphere.radius >= settings.min_radius_fraction * 4.0 - 1.0e-9);
            for hull in &result.hulls {
                assert!(hull.signed_distance(&sphere.center) >= sphere.radius - tolerance - 1.0e-6);
            }
        }
    }

    #[test]
    fn flat_mesh_is_rejected() {
        let vertices = vec![
            Point::origin(),
            Point::new(1.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
        ];
        let mesh = TriMesh::new(vertices, vec![[0, 1, 2]]).unwrap();
        assert_eq!(
            decompose_mesh(mesh, &settings()).unwrap_err(),
            DecompositionError::DegenerateMesh
        );
    }
}
