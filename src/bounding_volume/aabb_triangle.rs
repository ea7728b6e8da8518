use crate::bounding_volume::Aabb;
use crate::math::{Real, Vector};
use crate::shape::Triangle;

impl Aabb {
    /// Tests if this AABB intersects the given triangle.
    ///
    /// Separating-axis test over the three box face normals, the triangle normal, and the
    /// nine cross products between box axes and triangle edges. Touching counts as
    /// intersecting.
    pub fn intersects_triangle(&self, triangle: &Triangle) -> bool {
        let center = self.center();
        let half = self.half_extents();

        // Work in the local frame of the box.
        let v0 = triangle.a - center;
        let v1 = triangle.b - center;
        let v2 = triangle.c - center;

        // Box face normals.
        for i in 0..3 {
            let min = v0[i].min(v1[i]).min(v2[i]);
            let max = v0[i].max(v1[i]).max(v2[i]);
            if min > half[i] || max < -half[i] {
                return false;
            }
        }

        let edges = [v1 - v0, v2 - v1, v0 - v2];

        // Edge/edge cross products.
        for edge in &edges {
            for i in 0..3 {
                let axis = Vector::ith(i, 1.0).cross(edge);
                if separated_along(&axis, &[v0, v1, v2], &half) {
                    return false;
                }
            }
        }

        // Triangle normal.
        let normal = edges[0].cross(&edges[1]);
        !separated_along(&normal, &[v0, v1, v2], &half)
    }
}

fn separated_along(axis: &Vector<Real>, vertices: &[Vector<Real>; 3], half: &Vector<Real>) -> bool {
    if axis.norm_squared() == 0.0 {
        return false;
    }

    let p0 = axis.dot(&vertices[0]);
    let p1 = axis.dot(&vertices[1]);
    let p2 = axis.dot(&vertices[2]);
    let radius = half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs();

    p0.min(p1).min(p2) > radius || p0.max(p1).max(p2) < -radius
}

#[cfg(test)]
mod test {
    use crate::bounding_volume::Aabb;
    use crate::math::Point;
    use crate::shape::Triangle;

    #[test]
    fn aabb_triangle_intersection() {
        let aabb = Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0));

        // Crosses the box.
        let tri = Triangle::new(
            Point::new(-1.0, 0.5, -1.0),
            Point::new(2.0, 0.5, -1.0),
            Point::new(0.5, 0.5, 2.0),
        );
        assert!(aabb.intersects_triangle(&tri));

        // The AABBs overlap, but the plane of the triangle passes beside the corner.
        let tri = Triangle::new(
            Point::new(3.2, 0.0, 0.0),
            Point::new(0.0, 3.2, 0.0),
            Point::new(0.0, 0.0, 3.2),
        );
        assert!(tri.aabb().intersects(&aabb));
        assert!(!aabb.intersects_triangle(&tri));

        // Touching a face.
        let tri = Triangle::new(
            Point::new(1.0, 0.2, 0.2),
            Point::new(3.0, 0.2, 0.2),
            Point::new(1.0, 0.8, 0.8),
        );
        assert!(aabb.intersects_triangle(&tri));
    }
}
