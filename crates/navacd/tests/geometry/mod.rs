mod common;
mod cube_decomposition;
mod decomposition_invariants;
mod dumbbell_decomposition;
mod hollow_box_negative_space;
#[cfg(feature = "wavefront")]
mod wavefront_roundtrip;
