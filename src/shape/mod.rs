//! Shapes used by the decomposition: triangles, meshes, half-spaces, spheres and convex
//! hulls.

pub use self::convex_hull::ConvexHull;
pub use self::half_space::HalfSpace;
pub use self::sphere::Sphere;
pub use self::triangle::Triangle;
pub use self::trimesh::{TriMesh, TriMeshBuilderError, TriMeshConnectedComponents};

mod convex_hull;
mod half_space;
mod sphere;
mod triangle;
mod trimesh;
