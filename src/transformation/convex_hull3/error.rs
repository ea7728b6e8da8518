/// Errors that can occur during convex hull computation.
///
/// The hull is built incrementally. It fails when the input is degenerate (too few points,
/// or all points on a plane), contains invalid data (NaN), or when rounding errors break the
/// topology of the hull being built. None of these conditions panic.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvexHullError {
    /// An internal error occurred during convex hull computation.
    ///
    /// This usually stems from rounding errors on nearly degenerate inputs.
    #[error("Internal error: {0}")]
    InternalError(&'static str),
    /// The algorithm could not find a valid support point.
    ///
    /// The input likely contains points with NaN or infinite coordinates.
    #[error("Input points are either invalid (NaN) or are almost coplanar.")]
    MissingSupportPoint,
    /// Less than four points were given.
    #[error("Less than 4 points were given to the convex-hull algorithm.")]
    IncompleteInput,
    /// All the points lie on a plane, a line, or at a single location.
    ///
    /// The hull would have no volume.
    #[error("The input points do not span a volume.")]
    Degenerate,
    /// An edge of the hull is used by a single triangle.
    #[error("Detected unfinished triangle")]
    UnfinishedTriangle,
    /// An edge of the hull is used by more than two triangles.
    #[error("Detected t-junction for triangle {0}, edge: ({1}, {2})")]
    TJunction(usize, u32, u32),
    /// Two vertices of the hull are located at the same position.
    #[error("Detected duplicate points {0} and {1}")]
    DuplicatePoints(usize, usize),
}
