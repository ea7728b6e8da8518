/*!
navacd
========

**navacd** is a navigation-driven approximate convex decomposition library
written with the rust programming language.

Given a triangle mesh, it computes a small set of convex hulls approximating
the solid volume of the mesh while keeping the *negative space* (rooms,
corridors, doorways) free for agents of a given radius.

```no_run
use navacd::shape::TriMesh;
use navacd::transformation::navacd::{decompose_mesh, NavAcdSettings};
# fn load() -> TriMesh { unimplemented!() }

let mesh = load();
let result = decompose_mesh(mesh, &NavAcdSettings::default()).unwrap();
println!("{} convex hulls", result.hulls.len());
```
*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![deny(unused_results)]
#![deny(unused_qualifications)]
#![warn(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_inception)]
#![allow(clippy::manual_range_contains)] // This usually makes it way more verbose that it could be.
#![allow(clippy::type_complexity)] // Complains about closures that are fairly simple.

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;
#[macro_use]
extern crate approx;

pub extern crate nalgebra as na;

pub mod bounding_volume;
pub mod shape;
pub mod transformation;
pub mod utils;

/// Aliases for mathematical types.
pub mod math {
    pub use na::{Matrix3, Point3, Vector3};

    /// The scalar type used throughout this crate.
    pub use f64 as Real;

    /// The default tolerance used for geometric operations.
    pub const DEFAULT_EPSILON: Real = Real::EPSILON;

    /// The smallest thickness a convex hull is allowed to have.
    ///
    /// Degenerate hulls are thickened by at least this amount.
    pub const ZERO_TOLERANCE: Real = 1.0e-8;

    /// The dimension of the space.
    pub const DIM: usize = 3;

    /// The point type.
    pub use Point3 as Point;

    /// The vector type.
    pub use Vector3 as Vector;

    /// The matrix type.
    pub use Matrix3 as Matrix;
}
