use super::common::{boxes, dumbbell};
use navacd::transformation::navacd::{
    decompose_mesh, ConvexDecomposition, DecompositionError, DecompositionParameters,
    NavAcdSettings,
};

fn settings() -> NavAcdSettings {
    NavAcdSettings {
        max_voxels_per_dim: 24,
        ..Default::default()
    }
}

#[test]
fn decomposition_is_deterministic() {
    let a = decompose_mesh(dumbbell(), &settings()).unwrap();
    let b = decompose_mesh(dumbbell(), &settings()).unwrap();

    assert_eq!(a.covering, b.covering);
    assert_eq!(a.hulls.len(), b.hulls.len());
    for (ha, hb) in a.hulls.iter().zip(b.hulls.iter()) {
        assert_eq!(ha.points(), hb.points());
        assert_eq!(ha.indices(), hb.indices());
    }
}

#[test]
fn merging_never_adds_hulls() {
    let result = decompose_mesh(dumbbell(), &settings()).unwrap();
    let stats = result.stats;
    assert_eq!(stats.num_hulls, result.hulls.len());
    assert_eq!(stats.num_hulls + stats.num_merges, stats.num_splits + 1);
}

#[test]
fn shape_count_is_reached_without_negative_space() {
    let settings = NavAcdSettings {
        min_radius_fraction: 0.0,
        max_shape_count: 1,
        ..settings()
    };
    let result = decompose_mesh(dumbbell(), &settings).unwrap();
    assert_eq!(result.hulls.len(), 1);
}

#[test]
fn shape_count_never_overrides_the_negative_space() {
    let settings = NavAcdSettings {
        max_shape_count: 1,
        ..settings()
    };
    let result = decompose_mesh(dumbbell(), &settings).unwrap();
    assert!(result.hulls.len() >= 2);
}

#[test]
fn split_limit_is_reported() {
    let params = DecompositionParameters {
        error_tolerance: 0.01,
        max_splits: 0,
        max_voxels_per_dim: 24,
        ..Default::default()
    };
    let mut decomp = ConvexDecomposition::new(dumbbell(), params).unwrap();
    assert_eq!(
        decomp.split_hulls(),
        Err(DecompositionError::ExceededMaxSplits(0))
    );

    let params = DecompositionParameters {
        max_splits: 1,
        ..params
    };
    let mut decomp = ConvexDecomposition::new(dumbbell(), params).unwrap();
    assert_eq!(
        decomp.split_hulls(),
        Err(DecompositionError::ExceededMaxSplits(1))
    );
}

#[test]
fn separate_components_can_be_decomposed_independently() {
    let mesh = boxes(&[
        ([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
        ([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]),
    ]);
    let params = DecompositionParameters {
        split_connected_components: true,
        max_voxels_per_dim: 24,
        ..Default::default()
    };
    let mut decomp = ConvexDecomposition::new(mesh, params).unwrap();
    assert_eq!(decomp.num_hulls(), 2);
    assert_eq!(decomp.split_hulls(), Ok(0));
    assert_eq!(decomp.merge_hulls(), 0);
}
