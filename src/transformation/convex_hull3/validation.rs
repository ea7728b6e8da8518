use super::{ConvexHullError, TriangleFacet};
use crate::math::{Point, Real};
use crate::utils::hashmap::{Entry, HashMap};
use crate::utils::{lexicographic_cmp, SortedPair};

/// Checks, in debug mode only, that the adjacency links of a facet are consistent.
pub fn check_facet_links(ifacet: usize, facets: &[TriangleFacet]) {
    if !cfg!(debug_assertions) {
        return;
    }

    let facet = &facets[ifacet];

    for i in 0..3 {
        debug_assert!(facets[facet.adj[i]].valid);
    }

    for i in 0..3 {
        let adj_facet = &facets[facet.adj[i]];

        debug_assert_eq!(adj_facet.adj[facet.indirect_adj_id[i]], ifacet);
        debug_assert_eq!(adj_facet.indirect_adj_id[facet.indirect_adj_id[i]], i);
        debug_assert_eq!(
            adj_facet.edge_start(facet.indirect_adj_id[i]),
            facet.edge_end(i)
        );
        debug_assert_eq!(
            adj_facet.edge_end(facet.indirect_adj_id[i]),
            facet.edge_start(i)
        );
    }
}

/// Checks if a convex-hull is properly formed.
///
/// The boundary must be a closed 2-manifold of genus zero without duplicate vertices:
/// each edge shared by exactly two triangles, and `V - E + F = 2`.
pub fn validate_convex_hull(
    points: &[Point<Real>],
    triangles: &[[u32; 3]],
) -> Result<(), ConvexHullError> {
    let mut sorted: Vec<usize> = (0..points.len()).collect();
    sorted.sort_by(|a, b| lexicographic_cmp(&points[*a], &points[*b]));

    for pair in sorted.windows(2) {
        if points[pair[0]] == points[pair[1]] {
            return Err(ConvexHullError::DuplicatePoints(
                pair[0].min(pair[1]),
                pair[0].max(pair[1]),
            ));
        }
    }

    let mut edges: HashMap<SortedPair<u32>, [usize; 2]> = HashMap::default();

    for (itri, tri) in triangles.iter().enumerate() {
        if tri[0] == tri[1] || tri[0] == tri[2] || tri[1] == tri[2] {
            return Err(ConvexHullError::InternalError("degenerate hull triangle"));
        }

        for i in 0..3 {
            let ivtx1 = tri[i];
            let ivtx2 = tri[(i + 1) % 3];
            let edge_key = SortedPair::new(ivtx1, ivtx2);

            match edges.entry(edge_key) {
                Entry::Vacant(e) => {
                    let _ = e.insert([itri, usize::MAX]);
                }
                Entry::Occupied(mut e) => {
                    if e.get()[1] != usize::MAX {
                        return Err(ConvexHullError::TJunction(itri, ivtx1, ivtx2));
                    }

                    e.get_mut()[1] = itri;
                }
            }
        }
    }

    if edges.values().any(|adj| adj[1] == usize::MAX) {
        return Err(ConvexHullError::UnfinishedTriangle);
    }

    // Check Euler characteristic.
    if points.len() + triangles.len() != edges.len() + 2 {
        return Err(ConvexHullError::InternalError(
            "invalid Euler characteristic",
        ));
    }

    Ok(())
}
