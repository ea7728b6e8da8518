use crate::math::{Point, Real};
use crate::shape::{HalfSpace, TriMesh};
use crate::utils::SortedPair;
use na::Unit;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

/// An edge of the mesh where the surface folds toward the free space.
#[derive(Clone, Debug)]
pub(crate) struct ConcaveEdge {
    pub midpoint: Point<Real>,
    /// The planes of the two adjacent faces, and their bisector if the edge is open enough.
    pub planes: SmallVec<[HalfSpace; 3]>,
    /// The angle between the normals of the adjacent faces, in radians.
    pub concavity: Real,
}

/// Finds the concave edges of `mesh`, sorted by decreasing concavity.
///
/// Only edges shared by exactly two triangles are considered. Edges with equal concavities
/// are sorted by vertex indices.
pub(crate) fn concave_edges(
    mesh: &TriMesh,
    bisector_threshold_degrees: Real,
    epsilon: Real,
) -> Vec<ConcaveEdge> {
    let mut edges: Vec<(SortedPair<u32>, u32)> = Vec::with_capacity(mesh.num_triangles() * 3);

    for (tid, idx) in mesh.indices().iter().enumerate() {
        for k in 0..3 {
            edges.push((SortedPair::new(idx[k], idx[(k + 1) % 3]), tid as u32));
        }
    }

    edges.sort_unstable();

    let mut result = Vec::new();
    let mut i = 0;

    while i < edges.len() {
        let mut j = i + 1;
        while j < edges.len() && edges[j].0 == edges[i].0 {
            j += 1;
        }

        if j - i == 2 {
            if let Some(edge) = classify_edge(
                mesh,
                *edges[i].0,
                [edges[i].1, edges[i + 1].1],
                bisector_threshold_degrees,
                epsilon,
            ) {
                result.push(edge);
            }
        }

        i = j;
    }

    // Stable: equal concavities keep the edge order.
    result.sort_by_key(|edge| core::cmp::Reverse(OrderedFloat(edge.concavity)));
    result
}

fn classify_edge(
    mesh: &TriMesh,
    (a, b): (u32, u32),
    triangles: [u32; 2],
    bisector_threshold_degrees: Real,
    epsilon: Real,
) -> Option<ConcaveEdge> {
    let tri1 = mesh.triangle(triangles[0]);
    let tri2 = mesh.triangle(triangles[1]);
    let n1 = tri1.normal()?;
    let n2 = tri2.normal()?;

    let [pa, pb] = [a, b].map(|i| mesh.vertices()[i as usize]);
    let opposite = mesh.indices()[triangles[1] as usize]
        .into_iter()
        .find(|i| *i != a && *i != b)?;
    let opposite = mesh.vertices()[opposite as usize];

    // The second triangle bends above the plane of the first one.
    if n1.dot(&(opposite - pa)) <= epsilon {
        return None;
    }

    let concavity = n1.dot(&n2).clamp(-1.0, 1.0).acos();
    let wedge_angle = 180.0 - concavity.to_degrees();

    let mut planes = SmallVec::new();
    planes.push(HalfSpace::from_point_and_normal(&pa, n1));
    planes.push(HalfSpace::from_point_and_normal(&pa, n2));

    if wedge_angle >= bisector_threshold_degrees {
        if let Some(normal) = Unit::try_new(n1.into_inner() - n2.into_inner(), epsilon) {
            planes.push(HalfSpace::from_point_and_normal(&pa, normal));
        }
    }

    Some(ConcaveEdge {
        midpoint: na::center(&pa, &pb),
        planes,
        concavity,
    })
}
