use crate::math::{Point, Real};

/// Given an index buffer, remove from `points` every point that is not indexed.
///
/// Kept points preserve their relative order.
pub fn remove_unused_points(points: &mut Vec<Point<Real>>, idx: &mut [[u32; 3]]) {
    let mut used = vec![false; points.len()];

    for i in idx.iter() {
        used[i[0] as usize] = true;
        used[i[1] as usize] = true;
        used[i[2] as usize] = true;
    }

    let mut remap = vec![u32::MAX; points.len()];
    let mut num_kept = 0;

    for i in 0..points.len() {
        if used[i] {
            points[num_kept] = points[i];
            remap[i] = num_kept as u32;
            num_kept += 1;
        }
    }

    points.truncate(num_kept);

    for id in idx.iter_mut() {
        id[0] = remap[id[0] as usize];
        id[1] = remap[id[1] as usize];
        id[2] = remap[id[2] as usize];
    }
}

#[cfg(test)]
mod test {
    use super::remove_unused_points;
    use crate::math::Point;

    #[test]
    fn unused_points_are_removed_in_order() {
        let mut pts = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(9.0, 9.0, 9.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let mut idx = [[0, 2, 3]];
        remove_unused_points(&mut pts, &mut idx);
        assert_eq!(pts.len(), 3);
        assert_eq!(idx, [[0, 1, 2]]);
        assert_eq!(pts[1], Point::new(1.0, 0.0, 0.0));
    }
}
