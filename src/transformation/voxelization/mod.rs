//! Voxelization of a 3D triangle mesh, and distance to its surface.

pub use self::clearance::ClearanceField;
pub use self::voxelized_volume::{FillMode, VoxelValue, VoxelizedVolume};

mod clearance;
mod voxelized_volume;
