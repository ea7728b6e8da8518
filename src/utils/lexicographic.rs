use crate::math::{Point, Real};
use core::cmp::Ordering;

/// Total lexicographic order on points (`x`, then `y`, then `z`).
///
/// Uses [`f64::total_cmp`] so that the order is well-defined even for signed zeros.
#[inline]
pub fn lexicographic_cmp(a: &Point<Real>, b: &Point<Real>) -> Ordering {
    a.x.total_cmp(&b.x)
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.z.total_cmp(&b.z))
}

/// Sorts the points lexicographically and removes exact duplicates.
pub fn sort_and_dedup_points(points: &mut Vec<Point<Real>>) {
    points.sort_by(lexicographic_cmp);
    points.dedup();
}

#[cfg(test)]
mod test {
    use super::sort_and_dedup_points;
    use crate::math::Point;

    #[test]
    fn dedup_removes_exact_duplicates_only() {
        let mut pts = vec![
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 1.0e-12),
        ];
        sort_and_dedup_points(&mut pts);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[0], Point::origin());
    }
}
