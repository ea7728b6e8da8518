use crate::shape::TriMeshBuilderError;

/// Errors that can occur during a convex decomposition.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecompositionError {
    /// The input buffers do not form a valid triangle mesh.
    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] TriMeshBuilderError),
    /// Every triangle of the mesh has a zero area.
    #[error("every triangle of the mesh is degenerate")]
    DegenerateMesh,
    /// The split limit was reached before every hull fit the mesh.
    #[error("the decomposition exceeded the maximum number of splits ({0})")]
    ExceededMaxSplits(usize),
}
