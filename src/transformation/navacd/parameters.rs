use crate::math::{Real, ZERO_TOLERANCE};

/// Parameters of a [`ConvexDecomposition`](super::ConvexDecomposition).
///
/// Lengths are in world units. See [`NavAcdSettings`](super::NavAcdSettings) for parameters
/// relative to the size of the mesh.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DecompositionParameters {
    /// How far a hull may extend into free space without being split.
    ///
    /// Also the largest fit error of a hull resulting from a merge.
    pub error_tolerance: Real,
    /// How deep a hull may enter a negative-space sphere.
    pub negative_space_tolerance: Real,
    /// Hulls thinner than this are always allowed to be merged.
    pub min_thickness_tolerance: Real,
    /// The number of hulls the merger tries to reach, even above the error tolerance.
    ///
    /// Set to 0 for no limit.
    pub max_shape_count: usize,
    /// The maximum number of concave mesh edges used to generate split planes for a hull.
    pub max_convex_edge_planes: usize,
    /// Free-space wedge angle, in degrees, above which a concave edge also generates its
    /// bisector plane. 180 disables bisector planes.
    pub convex_edge_angle_more_samples_threshold: Real,
    /// Thickness given to hulls of flat point sets.
    pub thicken_after_hull_failure: Real,
    /// The maximum number of splits before giving up.
    pub max_splits: usize,
    /// Resolution of the grid of free-space probes measuring the fit error, along the largest
    /// dimension of the mesh.
    pub max_voxels_per_dim: u32,
    /// The number of evenly spaced split planes tried along each axis.
    pub num_axis_split_samples: usize,
    /// Decompose each connected component of the mesh independently.
    pub split_connected_components: bool,
}

impl Default for DecompositionParameters {
    fn default() -> Self {
        Self {
            error_tolerance: 0.0,
            negative_space_tolerance: 0.0,
            min_thickness_tolerance: 0.0,
            max_shape_count: 0,
            max_convex_edge_planes: 16,
            convex_edge_angle_more_samples_threshold: 180.0,
            thicken_after_hull_failure: ZERO_TOLERANCE,
            max_splits: 100_000,
            max_voxels_per_dim: 48,
            num_axis_split_samples: 7,
            split_connected_components: false,
        }
    }
}
