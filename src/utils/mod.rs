//! Various unsorted geometrical and logical operators.

pub use self::center::center;
pub use self::cleanup::remove_unused_points;
pub use self::cov::{center_cov, cov};
pub use self::lexicographic::{lexicographic_cmp, sort_and_dedup_points};
pub use self::sorted_pair::SortedPair;

mod center;
mod cleanup;
mod cov;
pub mod hashmap;
mod lexicographic;
mod sorted_pair;
