//! Approximate convex decomposition keeping the navigable free space empty.
//!
//! The decomposition of a mesh goes through the following stages:
//! 1. The mesh is cleaned up with [`preprocess_mesh`](crate::transformation::preprocess_mesh).
//! 2. The free space around the mesh is covered with spheres by [`sample_negative_space`].
//! 3. A [`ConvexDecomposition`] splits the hulls until they fit the mesh and stay out of
//!    these spheres, cuts the hulls that could not be split enough, then merges hulls back
//!    as long as they still fit.
//!
//! [`decompose_mesh`] runs every stage with parameters relative to the size of the mesh.

pub use self::decomposition::ConvexDecomposition;
pub use self::driver::{decompose_mesh, DecompositionStats, NavAcdResult, NavAcdSettings};
pub use self::error::DecompositionError;
pub use self::negative_space::{
    sample_negative_space, NegativeSpaceCovering, NegativeSpaceSampleParameters, SampleMethod,
};
pub use self::parameters::DecompositionParameters;

mod cell;
mod concave_edges;
mod decomposition;
mod driver;
mod error;
mod merge;
mod negative_space;
mod overlap;
mod parameters;
mod part;
mod polygon;
mod probes;
mod split;
