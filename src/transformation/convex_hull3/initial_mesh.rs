use super::{ConvexHullError, TriangleFacet};
use crate::math::{Point, Real};
use crate::shape::Triangle;
use crate::transformation::convex_hull_utils::support_point_id;

/// Eigenvalues (of the normalized covariance matrix) below this threshold indicate that the
/// point cloud is flat along the associated eigenvector.
pub const FLAT_EIGENVALUE_THRESHOLD: Real = 1.0e-10;

/// Computes the number of dimensions spanned by the (normalized) points, together with the
/// eigenpairs of their covariance matrix sorted by decreasing eigenvalue.
pub fn principal_axes(
    normalized_points: &[Point<Real>],
) -> (usize, [(na::Vector3<Real>, Real); 3]) {
    let cov_mat = crate::utils::cov(normalized_points);
    let eig = cov_mat.symmetric_eigen();
    let eigvec = eig.eigenvectors;
    let eigval = eig.eigenvalues;

    let mut eigpairs = [
        (eigvec.column(0).into_owned(), eigval[0]),
        (eigvec.column(1).into_owned(), eigval[1]),
        (eigvec.column(2).into_owned(), eigval[2]),
    ];

    /*
     * Sort in decreasing order wrt. eigenvalues.
     */
    eigpairs.sort_by(|a, b| b.1.total_cmp(&a.1));

    /*
     * Count the dimension the data lives in.
     */
    let mut dimension = 0;
    while dimension < 3 {
        if relative_eq!(
            eigpairs[dimension].1,
            0.0,
            epsilon = FLAT_EIGENVALUE_THRESHOLD
        ) {
            break;
        }

        dimension += 1;
    }

    (dimension, eigpairs)
}

pub fn get_initial_mesh(
    normalized_points: &mut [Point<Real>],
    undecidable: &mut Vec<usize>,
) -> Result<Vec<TriangleFacet>, ConvexHullError> {
    /*
     * Compute the eigenvectors to see if the input data live on a subspace.
     */
    let (dimension, eigpairs) = principal_axes(normalized_points);

    if dimension < 3 {
        return Err(ConvexHullError::Degenerate);
    }

    // The hull is a polyhedron.
    // Find a initial triangle lying on the principal halfspace…
    let center = crate::utils::center(normalized_points);
    let max_eigval = eigpairs[0].1;

    for point in normalized_points.iter_mut() {
        *point = Point::from((*point - center) / max_eigval);
    }

    let p1 = support_point_id(&eigpairs[0].0, normalized_points)
        .ok_or(ConvexHullError::MissingSupportPoint)?;
    let p2 = support_point_id(&-eigpairs[0].0, normalized_points)
        .ok_or(ConvexHullError::MissingSupportPoint)?;

    let mut max_area = 0.0;
    let mut p3 = None;

    for (i, point) in normalized_points.iter().enumerate() {
        let area = Triangle::new(normalized_points[p1], normalized_points[p2], *point).area();

        if area > max_area {
            max_area = area;
            p3 = Some(i);
        }
    }

    let p3 = p3.ok_or(ConvexHullError::InternalError(
        "no initial triangle found",
    ))?;

    // Build two facets with opposite normals
    let mut f1 = TriangleFacet::new(p1, p2, p3, normalized_points);
    let mut f2 = TriangleFacet::new(p2, p1, p3, normalized_points);

    // Link the facets together
    f1.set_adjacency([1, 1, 1], [0, 2, 1]);
    f2.set_adjacency([0, 0, 0], [0, 2, 1]);

    let mut facets = vec![f1, f2];

    // … and attribute visible points to each one of them.
    for point in 0..normalized_points.len() {
        if normalized_points[point] == normalized_points[p1]
            || normalized_points[point] == normalized_points[p2]
            || normalized_points[point] == normalized_points[p3]
        {
            continue;
        }

        let mut furthest = None;
        let mut furthest_dist = 0.0;

        for (i, curr_facet) in facets.iter().enumerate() {
            if curr_facet.can_see_point(point, normalized_points) {
                let distance = curr_facet.distance_to_point(point, normalized_points);

                if distance > furthest_dist {
                    furthest = Some(i);
                    furthest_dist = distance;
                }
            }
        }

        match furthest {
            Some(i) => facets[i].add_visible_point(point, normalized_points),
            None => undecidable.push(point),
        }
    }

    super::check_facet_links(0, &facets);
    super::check_facet_links(1, &facets);

    Ok(facets)
}
