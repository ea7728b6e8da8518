use super::part::{sphere_intrusion, ConvexPart};
use super::ConvexDecomposition;
use crate::shape::{HalfSpace, Sphere};
use na::Unit;

impl ConvexDecomposition {
    /// Cuts the hulls that still intrude into the negative space.
    ///
    /// For each hull and each sphere it intrudes into, the part of the hull closer than the
    /// sphere radius (minus the negative space tolerance) to the sphere center is removed
    /// with a planar cut facing the sphere. Cuts that would remove the whole hull are skipped.
    ///
    /// Returns the number of cuts performed.
    pub fn fix_hull_overlaps_in_negative_space(&mut self) -> usize {
        let mut num_cuts = 0;

        for i in 0..self.parts.len() {
            let num_spheres = self.negative_space.len();
            let mut skipped = vec![false; num_spheres];

            // A successful cut moves the hull out of its sphere for good, so each sphere is
            // handled at most once.
            for _ in 0..num_spheres {
                let Some(s) = self.first_intruded_sphere(&self.parts[i], &skipped) else {
                    break;
                };
                let sphere = self.negative_space.spheres()[s];

                match self.cut_part(&self.parts[i], &sphere) {
                    Some(mut part) => {
                        self.evaluate(&mut part);
                        self.parts[i] = part;
                        num_cuts += 1;
                    }
                    None => {
                        log::warn!(
                            "Cannot move hull {} out of the negative-space sphere {}: the cut would remove the whole hull.",
                            self.parts[i].id,
                            s
                        );
                        skipped[s] = true;
                    }
                }
            }
        }

        log::debug!("Negative space overlap fixing: {} cuts.", num_cuts);
        num_cuts
    }

    fn first_intruded_sphere(&self, part: &ConvexPart, skipped: &[bool]) -> Option<usize> {
        let tolerance = self.params.negative_space_tolerance;

        self.negative_space
            .spheres()
            .iter()
            .enumerate()
            .position(|(s, sphere)| {
                !skipped[s]
                    && part.hull.aabb().distance_squared_to_point(&sphere.center)
                        < sphere.radius * sphere.radius
                    && sphere_intrusion(&part.hull, sphere, tolerance) > self.solid.epsilon
            })
    }

    /// Keeps the part of `part` farther than `radius - negative_space_tolerance` from the
    /// center of `sphere`, on the side of the hull facing away from the sphere.
    fn cut_part(&self, part: &ConvexPart, sphere: &Sphere) -> Option<ConvexPart> {
        let depth = sphere.radius - self.params.negative_space_tolerance;
        let center = sphere.center;
        let projection = part.hull.project_point(&center);

        let dir = if part.hull.contains_point(&center) {
            None
        } else {
            Unit::try_new(projection - center, self.solid.epsilon)
        };

        let (dir, inside) = match dir {
            Some(dir) => (dir, false),
            None => (part.hull.nearest_plane(&center)?.normal, true),
        };

        // The kept region `dir · (x - center) >= depth`, as the half-space below the plane.
        let keep = HalfSpace::new(-dir, -dir.dot(&center.coords) - depth);
        if let (Some(kept), _) = part.split(&keep, &self.solid) {
            return Some(kept);
        }

        // With the center inside of the hull, the other side of the sphere may still hold
        // some solid.
        if inside {
            let keep = HalfSpace::new(dir, dir.dot(&center.coords) - depth);
            if let (Some(kept), _) = part.split(&keep, &self.solid) {
                return Some(kept);
            }
        }

        None
    }
}

#[cfg(test)]
mod test {
    use crate::bounding_volume::Aabb;
    use crate::math::Point;
    use crate::shape::{Sphere, TriMesh};
    use crate::transformation::navacd::{
        ConvexDecomposition, DecompositionParameters, NegativeSpaceCovering,
    };

    fn decomposition(spheres: Vec<Sphere>) -> ConvexDecomposition {
        let mesh = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(2.0, 1.0, 1.0)));
        let params = DecompositionParameters {
            max_voxels_per_dim: 16,
            ..Default::default()
        };
        let mut decomp = ConvexDecomposition::new(mesh, params).unwrap();
        decomp.set_negative_space(NegativeSpaceCovering::new(spheres));
        decomp
    }

    #[test]
    fn outside_sphere_cuts_the_hull() {
        let sphere = Sphere::new(Point::new(2.3, 0.5, 0.5), 0.5);
        let mut decomp = decomposition(vec![sphere]);
        assert_eq!(decomp.fix_hull_overlaps_in_negative_space(), 1);

        let hull = decomp.hulls().next().unwrap();
        assert_relative_eq!(hull.volume(), 1.8, epsilon = 1.0e-9);
        assert!(hull.signed_distance(&sphere.center) >= sphere.radius - 1.0e-9);
        assert!(!decomp.parts[0].intrudes(1.0e-9));
    }

    #[test]
    fn inside_sphere_cuts_toward_the_nearest_face() {
        let sphere = Sphere::new(Point::new(1.9, 0.5, 0.5), 0.2);
        let mut decomp = decomposition(vec![sphere]);
        assert_eq!(decomp.fix_hull_overlaps_in_negative_space(), 1);

        // The nearest face is x = 2, so everything beyond x = 2.1 would be kept: the cut
        // falls back to the other side, keeping x <= 1.7.
        let hull = decomp.hulls().next().unwrap();
        assert_relative_eq!(hull.aabb().maxs.x, 1.7, epsilon = 1.0e-9);
    }

    #[test]
    fn non_intruding_spheres_are_ignored() {
        let far = Sphere::new(Point::new(5.0, 0.5, 0.5), 0.5);
        let mut decomp = decomposition(vec![far]);
        assert_eq!(decomp.fix_hull_overlaps_in_negative_space(), 0);
        assert_relative_eq!(decomp.hulls().next().unwrap().volume(), 2.0, epsilon = 1.0e-9);
    }
}
