//! Transformation, cleanup, voxelization and decomposition of meshes.

pub(crate) use self::convex_hull3::principal_axes;
pub use self::convex_hull3::{convex_hull, validate_convex_hull, ConvexHullError};
pub use self::preprocess::{preprocess_mesh, PreprocessFlags, PreprocessReport};

mod convex_hull3;
pub(crate) mod convex_hull_utils;
mod preprocess;

/// Navigation-driven approximate convex decomposition.
pub mod navacd;
/// Voxelization of a 3D triangle mesh.
pub mod voxelization;

#[cfg(feature = "wavefront")]
pub mod wavefront;
