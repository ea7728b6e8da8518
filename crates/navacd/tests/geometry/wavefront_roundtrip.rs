use super::common::boxes;
use navacd::shape::TriMesh;
use navacd::transformation::navacd::{decompose_mesh, NavAcdSettings};
use navacd::transformation::wavefront::write_decomposition_obj;

#[test]
fn decomposition_roundtrip_through_obj() {
    let mesh = boxes(&[
        ([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
        ([3.0, 0.0, 0.0], [4.0, 1.0, 1.0]),
    ]);
    let settings = NavAcdSettings {
        max_voxels_per_dim: 24,
        ..Default::default()
    };
    let result = decompose_mesh(mesh, &settings).unwrap();
    assert!(result.hulls.len() >= 2);

    let path = std::env::temp_dir().join("navacd_wavefront_roundtrip.obj");
    write_decomposition_obj(&result.hulls, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    for i in 0..result.hulls.len() {
        assert!(text.contains(&format!("hull_{}", i)));
    }

    let loaded = TriMesh::from_obj_file(&path).unwrap();
    let num_triangles: usize = result.hulls.iter().map(|h| h.indices().len()).sum();
    let num_vertices: usize = result.hulls.iter().map(|h| h.points().len()).sum();
    assert_eq!(loaded.num_triangles(), num_triangles);
    assert_eq!(loaded.vertices().len(), num_vertices);

    let volume: f64 = result.hulls.iter().map(|h| h.volume()).sum();
    assert_relative_eq!(loaded.signed_volume(), volume, epsilon = 1.0e-4);

    std::fs::remove_file(&path).unwrap();
}
