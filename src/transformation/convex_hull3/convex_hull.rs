use super::{ConvexHullError, TriangleFacet};
use crate::math::{Point, Real};
use crate::transformation::convex_hull_utils::{
    indexed_support_point_id, indexed_support_point_nth, normalize,
};
use crate::utils;

/// Computes the convex hull of a set of 3d points.
///
/// Returns the hull vertices (a subset of the input points) and its triangles, oriented
/// counter-clockwise when seen from the outside.
///
/// Fails with [`ConvexHullError::IncompleteInput`] if less than four points are given, and
/// with [`ConvexHullError::Degenerate`] if the points do not span a volume.
pub fn convex_hull(
    points: &[Point<Real>],
) -> Result<(Vec<Point<Real>>, Vec<[u32; 3]>), ConvexHullError> {
    if points.len() < 4 {
        return Err(ConvexHullError::IncompleteInput);
    }

    if points.iter().any(|pt| !pt.coords.iter().all(|e| e.is_finite())) {
        return Err(ConvexHullError::MissingSupportPoint);
    }

    let mut normalized_points = points.to_vec();
    let (_, diag) = normalize(&mut normalized_points[..]);

    if diag == 0.0 {
        return Err(ConvexHullError::Degenerate);
    }

    let mut undecidable_points = Vec::new();
    let mut silhouette_loop_facets_and_idx = Vec::new();
    let mut removed_facets = Vec::new();

    let mut triangles =
        super::get_initial_mesh(&mut normalized_points[..], &mut undecidable_points)?;

    let mut i = 0;
    while i != triangles.len() {
        silhouette_loop_facets_and_idx.clear();

        if !triangles[i].valid || triangles[i].affinely_dependent {
            i += 1;
            continue;
        }

        let pt_id = indexed_support_point_id(
            &triangles[i].normal,
            &normalized_points[..],
            triangles[i].visible_points[..].iter().copied(),
        );

        if let Some(point) = pt_id {
            triangles[i].valid = false;

            removed_facets.clear();
            removed_facets.push(i);

            for j in 0usize..3 {
                compute_silhouette(
                    triangles[i].adj[j],
                    triangles[i].indirect_adj_id[j],
                    point,
                    &mut silhouette_loop_facets_and_idx,
                    &normalized_points[..],
                    &mut removed_facets,
                    &mut triangles[..],
                );
            }

            // In some degenerate cases (because of float rounding problems), the silhouette may:
            // 1. Contain self-intersections (i.e. a single vertex is used by more than two edges).
            // 2. Contain multiple disjoint (but nested) loops.
            fix_silhouette_topology(
                &normalized_points,
                &mut silhouette_loop_facets_and_idx,
                &mut removed_facets,
                &mut triangles[..],
            )?;

            if silhouette_loop_facets_and_idx.is_empty() {
                // Rounding errors made the point visible from every remaining facet.
                let any_valid = triangles[i + 1..]
                    .iter()
                    .any(|t| t.valid && !t.affinely_dependent);

                if any_valid {
                    return Err(ConvexHullError::InternalError(
                        "exiting an unfinished hull: empty silhouette",
                    ));
                }

                // Keep the facet and stop growing the hull.
                triangles[i].valid = true;
                break;
            }

            attach_and_push_facets(
                &silhouette_loop_facets_and_idx[..],
                point,
                &normalized_points[..],
                &mut triangles,
                &removed_facets[..],
                &mut undecidable_points,
            )?;
        }

        i += 1;
    }

    let mut idx = Vec::new();

    for facet in triangles.iter() {
        if facet.valid {
            idx.push([
                facet.pts[0] as u32,
                facet.pts[1] as u32,
                facet.pts[2] as u32,
            ]);
        }
    }

    let mut points = points.to_vec();
    utils::remove_unused_points(&mut points, &mut idx[..]);

    if points.is_empty() || idx.is_empty() {
        return Err(ConvexHullError::InternalError("empty output mesh"));
    }

    Ok((points, idx))
}

fn compute_silhouette(
    facet: usize,
    indirect_id: usize,
    point: usize,
    out_facets_and_idx: &mut Vec<(usize, usize)>,
    points: &[Point<Real>],
    removed_facets: &mut Vec<usize>,
    triangles: &mut [TriangleFacet],
) {
    if triangles[facet].valid {
        if !triangles[facet].is_visible_from(point, points) {
            out_facets_and_idx.push((facet, indirect_id));
        } else {
            triangles[facet].valid = false; // The facet must be removed from the convex hull.
            removed_facets.push(facet);

            compute_silhouette(
                triangles[facet].adj[(indirect_id + 1) % 3],
                triangles[facet].indirect_adj_id[(indirect_id + 1) % 3],
                point,
                out_facets_and_idx,
                points,
                removed_facets,
                triangles,
            );

            compute_silhouette(
                triangles[facet].adj[(indirect_id + 2) % 3],
                triangles[facet].indirect_adj_id[(indirect_id + 2) % 3],
                point,
                out_facets_and_idx,
                points,
                removed_facets,
                triangles,
            );
        }
    }
}

fn fix_silhouette_topology(
    points: &[Point<Real>],
    out_facets_and_idx: &mut Vec<(usize, usize)>,
    removed_facets: &mut Vec<usize>,
    triangles: &mut [TriangleFacet],
) -> Result<(), ConvexHullError> {
    let mut workspace = vec![0; points.len()];
    let mut needs_fixing = false;

    // The silhouette is traversed such that the end of each edge is seen before its start.
    for (facet, adj_id) in &*out_facets_and_idx {
        let p = triangles[*facet].edge_end(*adj_id);
        workspace[p] += 1;

        if workspace[p] > 1 {
            needs_fixing = true;
        }
    }

    // We detected a topological problem, i.e., we have
    // multiple loops.
    if needs_fixing {
        // First, we need to know which loop is the one we
        // need to keep.
        let mut loop_start = 0;
        for (facet, adj_id) in &*out_facets_and_idx {
            let p1 = points[triangles[*facet].edge_end(*adj_id)];
            let p2 = points[triangles[*facet].edge_start(*adj_id)];
            let supp = indexed_support_point_nth(
                &(p2 - p1),
                points,
                out_facets_and_idx
                    .iter()
                    .map(|(f, ai)| triangles[*f].edge_end(*ai)),
            )
            .ok_or(ConvexHullError::MissingSupportPoint)?;
            let selected = &out_facets_and_idx[supp];
            if workspace[triangles[selected.0].edge_end(selected.1)] == 1 {
                // This is a valid point to start with.
                loop_start = supp;
                break;
            }
        }

        let mut removing = None;
        let old_facets_and_idx = core::mem::take(out_facets_and_idx);

        for i in 0..old_facets_and_idx.len() {
            let facet_id = (loop_start + i) % old_facets_and_idx.len();
            let (facet, adj_id) = old_facets_and_idx[facet_id];

            match removing {
                Some(p) => {
                    let p1 = triangles[facet].edge_end(adj_id);
                    if p == p1 {
                        removing = None;
                    }
                }
                _ => {
                    let p1 = triangles[facet].edge_end(adj_id);
                    if workspace[p1] > 1 {
                        removing = Some(p1);
                    }
                }
            }

            if removing.is_some() {
                if triangles[facet].valid {
                    triangles[facet].valid = false;
                    removed_facets.push(facet);
                }
            } else {
                out_facets_and_idx.push((facet, adj_id));
            }
        }
    }

    Ok(())
}

fn attach_and_push_facets(
    silhouette_loop_facets_and_idx: &[(usize, usize)],
    point: usize,
    points: &[Point<Real>],
    triangles: &mut Vec<TriangleFacet>,
    removed_facets: &[usize],
    undecidable: &mut Vec<usize>,
) -> Result<(), ConvexHullError> {
    // The silhouette is built to be in CCW order.
    let mut new_facets = Vec::with_capacity(silhouette_loop_facets_and_idx.len());

    // Create new facets.
    for (adj_facet, indirect_id) in silhouette_loop_facets_and_idx.iter().copied() {
        let facet = TriangleFacet::new(
            point,
            triangles[adj_facet].edge_end(indirect_id),
            triangles[adj_facet].edge_start(indirect_id),
            points,
        );
        new_facets.push(facet);
    }

    // Link the facets together.
    let num_new = silhouette_loop_facets_and_idx.len();
    for i in 0..num_new {
        let prev_facet = if i == 0 {
            triangles.len() + num_new - 1
        } else {
            triangles.len() + i - 1
        };

        let (middle_facet, middle_id) = silhouette_loop_facets_and_idx[i];
        let next_facet = triangles.len() + (i + 1) % num_new;

        new_facets[i].set_adjacency([prev_facet, middle_facet, next_facet], [2, middle_id, 0]);

        // Check that we are not overwriting a valid link.
        if triangles[triangles[middle_facet].adj[middle_id]].valid {
            return Err(ConvexHullError::InternalError(
                "silhouette edge still linked to a valid facet",
            ));
        }

        // The future id of `curr_facet`.
        triangles[middle_facet].adj[middle_id] = triangles.len() + i;
        triangles[middle_facet].indirect_adj_id[middle_id] = 1;
    }

    // Assign to each facets some of the points which can see it.
    for curr_facet in removed_facets.iter() {
        for visible_point in triangles[*curr_facet].visible_points.iter() {
            if points[*visible_point] == points[point] {
                continue;
            }

            let mut furthest = None;
            let mut furthest_dist = 0.0;

            for (i, curr_facet) in new_facets.iter().enumerate() {
                if !curr_facet.affinely_dependent {
                    let distance = curr_facet.distance_to_point(*visible_point, points);

                    if distance > furthest_dist {
                        furthest = Some(i);
                        furthest_dist = distance;
                    }
                }
            }

            if let Some(furthest) = furthest {
                if new_facets[furthest].can_see_point(*visible_point, points) {
                    new_facets[furthest].add_visible_point(*visible_point, points);
                }
            }

            // If none of the facet can be seen from the point, it is implicitly
            // deleted because it won't be referenced by any facet.
        }
    }

    // Try to assign collinear points to one of the new facets.
    let mut i = 0;

    while i != undecidable.len() {
        let mut furthest = None;
        let mut furthest_dist = 0.0;
        let undecidable_point = undecidable[i];

        for (j, curr_facet) in new_facets.iter().enumerate() {
            if curr_facet.can_see_point(undecidable_point, points) {
                let distance = curr_facet.distance_to_point(undecidable_point, points);

                if distance > furthest_dist {
                    furthest = Some(j);
                    furthest_dist = distance;
                }
            }
        }

        if let Some(furthest) = furthest {
            new_facets[furthest].add_visible_point(undecidable_point, points);
            let _ = undecidable.swap_remove(i);
        } else {
            i += 1;
        }
    }

    // Push facets.
    triangles.append(&mut new_facets);
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::math::Point;
    use crate::transformation::{convex_hull, validate_convex_hull, ConvexHullError};

    #[test]
    fn cube_corners_and_interior_points() {
        let mut points = Vec::new();
        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    points.push(Point::new(i as f64, j as f64, k as f64));
                }
            }
        }
        points.push(Point::new(0.5, 0.5, 0.5));
        points.push(Point::new(0.25, 0.75, 0.5));

        let (vertices, indices) = convex_hull(&points).unwrap();
        assert_eq!(vertices.len(), 8);
        assert_eq!(indices.len(), 12);
        validate_convex_hull(&vertices, &indices).unwrap();
    }

    #[test]
    fn flat_input_is_degenerate() {
        let points = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.3, 0.2, 0.0),
        ];
        assert_eq!(convex_hull(&points), Err(ConvexHullError::Degenerate));
        assert_eq!(
            convex_hull(&points[..3]),
            Err(ConvexHullError::IncompleteInput)
        );
    }

    #[test]
    fn sphere_sampling_hull_is_valid() {
        // Points on a UV-sphere: every point is a hull vertex.
        let mut points = Vec::new();
        let nlat = 10;
        let nlon = 14;
        for i in 1..nlat {
            let theta = core::f64::consts::PI * i as f64 / nlat as f64;
            for j in 0..nlon {
                let phi = 2.0 * core::f64::consts::PI * j as f64 / nlon as f64;
                points.push(Point::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                ));
            }
        }
        points.push(Point::new(0.0, 0.0, 1.0));
        points.push(Point::new(0.0, 0.0, -1.0));

        let (vertices, indices) = convex_hull(&points).unwrap();
        assert_eq!(vertices.len(), points.len());
        validate_convex_hull(&vertices, &indices).unwrap();
    }
}
