pub use self::convex_hull::convex_hull;
pub use self::error::ConvexHullError;
use self::initial_mesh::get_initial_mesh;
pub(crate) use self::initial_mesh::principal_axes;
use self::triangle_facet::TriangleFacet;
use self::validation::check_facet_links;
pub use self::validation::validate_convex_hull;

mod convex_hull;
mod error;
mod initial_mesh;
mod triangle_facet;
mod validation;
