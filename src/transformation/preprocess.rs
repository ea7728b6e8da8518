//! Cleanup of a raw triangle mesh before its decomposition.

use crate::math::{Point, Real};
use crate::shape::TriMesh;
use crate::utils::hashmap::{Entry, HashMap, HashSet};

bitflags::bitflags! {
    #[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
    #[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
    /// The operations applied by [`preprocess_mesh`].
    pub struct PreprocessFlags: u8 {
        /// If set, vertices closer than the weld tolerance are merged into a single vertex.
        ///
        /// The first vertex (in vertex buffer order) of each group is kept. Vertices no
        /// longer referenced by any triangle are removed afterwards.
        const MERGE_DUPLICATE_VERTICES = 1;
        /// If set, triangles with two identical vertex indices are removed.
        const DELETE_DEGENERATE_TRIANGLES = 1 << 1;
        /// If set, triangles using the same three vertices as a previous triangle (in any
        /// order) are removed.
        const DELETE_DUPLICATE_TRIANGLES = 1 << 2;
        /// If set, and if the mesh is closed with a negative volume, the winding of every
        /// triangle is reversed so that the volume becomes positive.
        const ORIENT_OUTWARD = 1 << 3;
    }
}

/// What [`preprocess_mesh`] did to a mesh.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PreprocessReport {
    /// The number of vertices merged into another vertex.
    pub num_merged_vertices: usize,
    /// The number of degenerate or duplicate triangles removed.
    pub num_removed_triangles: usize,
    /// Was the mesh closed after cleanup?
    pub closed: bool,
    /// Was the mesh orientation reversed?
    pub reversed: bool,
}

/// Normalizes a raw mesh in place: vertex welding, triangle cleanup, and orientation.
///
/// Vertices closer than `weld_tolerance` are merged when
/// [`PreprocessFlags::MERGE_DUPLICATE_VERTICES`] is set (exact duplicates only if the tolerance
/// is zero). If the cleanup would remove every triangle, the mesh buffers are left untouched.
pub fn preprocess_mesh(
    mesh: &mut TriMesh,
    flags: PreprocessFlags,
    weld_tolerance: Real,
) -> PreprocessReport {
    let mut report = PreprocessReport::default();

    let (mut vertices, remap) = if flags.contains(PreprocessFlags::MERGE_DUPLICATE_VERTICES) {
        weld_vertices(mesh.vertices(), weld_tolerance)
    } else {
        (
            mesh.vertices().to_vec(),
            (0..mesh.vertices().len() as u32).collect(),
        )
    };
    report.num_merged_vertices = mesh.vertices().len() - vertices.len();

    let mut triangle_set = HashSet::default();
    let mut indices = Vec::with_capacity(mesh.num_triangles());

    for idx in mesh.indices() {
        let [a, b, c] = idx.map(|i| remap[i as usize]);

        if flags.contains(PreprocessFlags::DELETE_DEGENERATE_TRIANGLES)
            && (a == b || a == c || b == c)
        {
            continue;
        }

        if flags.contains(PreprocessFlags::DELETE_DUPLICATE_TRIANGLES) {
            let mut key = [a, b, c];
            key.sort_unstable();
            if !triangle_set.insert(key) {
                continue;
            }
        }

        indices.push([a, b, c]);
    }

    report.num_removed_triangles = mesh.num_triangles() - indices.len();

    if indices.is_empty() {
        log::warn!("Mesh cleanup would remove every triangle; the mesh is left untouched.");
        report.num_merged_vertices = 0;
        report.num_removed_triangles = 0;
    } else if report.num_merged_vertices != 0 || report.num_removed_triangles != 0 {
        crate::utils::remove_unused_points(&mut vertices, &mut indices);
        mesh.set_buffers(vertices, indices);
    }

    report.closed = mesh.is_closed();

    if flags.contains(PreprocessFlags::ORIENT_OUTWARD)
        && report.closed
        && mesh.signed_volume() < 0.0
    {
        mesh.reverse();
        report.reversed = true;
    }

    log::debug!(
        "Mesh preprocessing: {} vertices merged, {} triangles removed, closed: {}, reversed: {}.",
        report.num_merged_vertices,
        report.num_removed_triangles,
        report.closed,
        report.reversed
    );

    report
}

/// Merges the vertices closer than `tolerance`.
///
/// Returns the new vertex buffer and, for each original vertex, its index in the new buffer.
fn weld_vertices(vertices: &[Point<Real>], tolerance: Real) -> (Vec<Point<Real>>, Vec<u32>) {
    let mut new_vertices = Vec::with_capacity(vertices.len());
    let mut remap = Vec::with_capacity(vertices.len());

    if tolerance <= 0.0 {
        let mut vtx_to_id: HashMap<[u64; 3], u32> = HashMap::default();

        for pt in vertices {
            // `+ 0.0` maps `-0.0` to `0.0`.
            let key = [(pt.x + 0.0).to_bits(), (pt.y + 0.0).to_bits(), (pt.z + 0.0).to_bits()];
            let id = match vtx_to_id.entry(key) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    new_vertices.push(*pt);
                    *entry.insert(new_vertices.len() as u32 - 1)
                }
            };
            remap.push(id);
        }

        return (new_vertices, remap);
    }

    // Cells of width `tolerance`: a vertex closer than `tolerance` to `pt` is necessarily in
    // one of the 27 cells around the cell of `pt`.
    let mut cells: HashMap<[i64; 3], Vec<u32>> = HashMap::default();
    let cell_of = |pt: &Point<Real>| (pt.coords / tolerance).map(|e| e.floor() as i64);
    let sq_tol = tolerance * tolerance;

    for pt in vertices {
        let cell = cell_of(pt);
        let mut found = None;

        for dk in -1..=1 {
            for dj in -1..=1 {
                for di in -1..=1 {
                    let key = [cell.x + di, cell.y + dj, cell.z + dk];
                    let Some(candidates) = cells.get(&key) else {
                        continue;
                    };

                    // Candidates are in insertion order: the first match is the oldest.
                    if let Some(id) = candidates.iter().find(|id| {
                        na::distance_squared(&new_vertices[**id as usize], pt) <= sq_tol
                    }) {
                        found = Some(found.map_or(*id, |f: u32| f.min(*id)));
                    }
                }
            }
        }

        let id = match found {
            Some(id) => id,
            None => {
                new_vertices.push(*pt);
                let id = new_vertices.len() as u32 - 1;
                cells.entry([cell.x, cell.y, cell.z]).or_default().push(id);
                id
            }
        };
        remap.push(id);
    }

    (new_vertices, remap)
}
