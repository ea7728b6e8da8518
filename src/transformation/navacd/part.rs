use super::cell::ConvexCell;
use super::polygon::SurfacePolygon;
use super::probes::FitProbes;
use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use crate::shape::{ConvexHull, HalfSpace, Sphere, TriMesh};

/// The solid being decomposed, split into the components the parts are clipped against.
#[derive(Clone, Debug)]
pub(crate) struct Solid {
    pub mesh: TriMesh,
    /// The triangles bounding each component.
    pub components: Vec<Vec<u32>>,
    pub component_aabbs: Vec<Aabb>,
    /// Tolerance for classifying points against cutting planes.
    pub epsilon: Real,
    /// Thickness given to flat hulls.
    pub thickness: Real,
}

impl Solid {
    pub fn new(mesh: TriMesh, split_components: bool, thickness: Real) -> Self {
        let components: Vec<Vec<u32>> = if split_components {
            let cc = mesh.connected_components();
            (0..cc.num_connected_components())
                .map(|i| cc.component(i).to_vec())
                .collect()
        } else {
            vec![(0..mesh.num_triangles() as u32).collect()]
        };

        let component_aabbs = components
            .iter()
            .map(|tris| {
                let mut aabb = Aabb::new_invalid();
                for tri in tris {
                    for pt in mesh.triangle(*tri).vertices() {
                        aabb.take_point(pt);
                    }
                }
                aabb
            })
            .collect();

        let epsilon = mesh.aabb().diagonal() * 1.0e-9;

        Self {
            mesh,
            components,
            component_aabbs,
            epsilon,
            thickness,
        }
    }

    /// Is `pt` inside of the solid bounded by the component `component`?
    pub fn is_inside(&self, pt: &Point<Real>, component: u32) -> bool {
        self.component_aabbs[component as usize].contains_local_point(pt)
            && self.mesh.winding_number_of_triangles(
                pt,
                self.components[component as usize].iter().copied(),
            ) >= 0.5
    }

    /// The part covering the whole component `component`.
    pub fn initial_part(&self, component: u32, id: u32) -> Option<ConvexPart> {
        let aabb = &self.component_aabbs[component as usize];
        let cell = ConvexCell::from_aabb(&aabb.loosened(aabb.diagonal() * 0.01), component, |pt| {
            self.is_inside(pt, component)
        });
        let polygons = self.components[component as usize]
            .iter()
            .map(|tri| SurfacePolygon::new(self.mesh.triangle(*tri).vertices().to_vec(), *tri))
            .collect();

        ConvexPart::new(id, vec![cell], polygons, self.thickness)
    }
}

/// One piece of a convex decomposition.
///
/// A part covers a set of convex cells of space. Its hull is the convex hull of the pieces
/// of the mesh surface inside of these cells, together with the cell vertices inside of the
/// solid: for closed meshes, this is the convex hull of the solid restricted to the cells.
#[derive(Clone, Debug)]
pub(crate) struct ConvexPart {
    pub id: u32,
    pub hull: ConvexHull,
    pub cells: Vec<ConvexCell>,
    pub polygons: Vec<SurfacePolygon>,
    pub fit_error: Real,
    pub worst_probe: Option<u32>,
    /// Largest intrusion into a negative-space sphere, `-inf` if no sphere is close.
    pub intrusion: Real,
    pub worst_sphere: Option<u32>,
    pub frozen: bool,
}

impl ConvexPart {
    /// Builds a part from its cells and surface polygons.
    ///
    /// Returns `None` if they contain no solid material. The cached errors are left unset.
    pub fn new(
        id: u32,
        cells: Vec<ConvexCell>,
        polygons: Vec<SurfacePolygon>,
        thickness: Real,
    ) -> Option<Self> {
        let points: Vec<Point<Real>> = polygons
            .iter()
            .flat_map(|poly| poly.vertices.iter())
            .chain(cells.iter().flat_map(|cell| cell.inside_vertices()))
            .copied()
            .collect();
        let hull = ConvexHull::from_points_thickened(&points, thickness)?;

        Some(Self {
            id,
            hull,
            cells,
            polygons,
            fit_error: 0.0,
            worst_probe: None,
            intrusion: Real::NEG_INFINITY,
            worst_sphere: None,
            frozen: false,
        })
    }

    /// Merges two parts into a part covering both, with the given hull.
    pub fn merged(id: u32, a: &ConvexPart, b: &ConvexPart, hull: ConvexHull) -> Self {
        Self {
            id,
            hull,
            cells: a.cells.iter().chain(b.cells.iter()).cloned().collect(),
            polygons: a.polygons.iter().chain(b.polygons.iter()).cloned().collect(),
            fit_error: 0.0,
            worst_probe: None,
            intrusion: Real::NEG_INFINITY,
            worst_sphere: None,
            frozen: false,
        }
    }

    /// Splits this part by the boundary of `plane`.
    ///
    /// Returns the parts inside and outside of the half-space, or `None` for a side without
    /// any solid material. Both children get the id of this part.
    pub fn split(&self, plane: &HalfSpace, solid: &Solid) -> (Option<Self>, Option<Self>) {
        let mut cells = (Vec::new(), Vec::new());
        let mut polygons = (Vec::new(), Vec::new());

        for cell in &self.cells {
            let (below, above) = cell.split(plane, solid.epsilon, |pt| {
                solid.is_inside(pt, cell.component)
            });
            cells.0.extend(below);
            cells.1.extend(above);
        }

        for poly in &self.polygons {
            let (below, above) = poly.split(plane, solid.epsilon);
            polygons.0.extend(below);
            polygons.1.extend(above);
        }

        (
            Self::new(self.id, cells.0, polygons.0, solid.thickness),
            Self::new(self.id, cells.1, polygons.1, solid.thickness),
        )
    }

    pub fn update_fit_error(&mut self, probes: &FitProbes) {
        (self.fit_error, self.worst_probe) = probes.fit_error(&self.hull);
    }

    pub fn update_intrusion(&mut self, spheres: &[Sphere], tolerance: Real) {
        (self.intrusion, self.worst_sphere) = hull_intrusion(&self.hull, spheres, tolerance);
    }

    /// Does this part intrude into the negative space by more than `epsilon`?
    pub fn intrudes(&self, epsilon: Real) -> bool {
        self.intrusion > epsilon
    }
}

/// How deep a sphere penetrates a hull, beyond `tolerance`.
///
/// Positive if the sphere center is closer than `radius - tolerance` to the hull (or inside
/// of it).
#[inline]
pub(crate) fn sphere_intrusion(hull: &ConvexHull, sphere: &Sphere, tolerance: Real) -> Real {
    sphere.radius - tolerance - hull.signed_distance(&sphere.center)
}

/// The largest intrusion of `hull` into any of the `spheres`, and the first sphere reaching
/// it.
///
/// Spheres too far from the AABB of the hull to be intruded are skipped. Returns
/// `(-inf, None)` if every sphere is skipped.
pub(crate) fn hull_intrusion(
    hull: &ConvexHull,
    spheres: &[Sphere],
    tolerance: Real,
) -> (Real, Option<u32>) {
    let mut best = (Real::NEG_INFINITY, None);

    for (i, sphere) in spheres.iter().enumerate() {
        let reach = sphere.radius - tolerance;
        let far = if reach > 0.0 {
            hull.aabb().distance_squared_to_point(&sphere.center) >= reach * reach
        } else {
            !hull.aabb().contains_local_point(&sphere.center)
        };

        if far {
            continue;
        }

        let intrusion = sphere_intrusion(hull, sphere, tolerance);
        if intrusion > best.0 {
            best = (intrusion, Some(i as u32));
        }
    }

    best
}

#[cfg(test)]
mod test {
    use super::{hull_intrusion, Solid};
    use crate::bounding_volume::Aabb;
    use crate::math::{Point, Vector};
    use crate::shape::{HalfSpace, Sphere, TriMesh};

    #[test]
    fn initial_part_is_the_hull() {
        let cube = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(2.0, 1.0, 1.0)));
        let solid = Solid::new(cube, false, 1.0e-8);
        let part = solid.initial_part(0, 0).unwrap();
        assert_relative_eq!(part.hull.volume(), 2.0, epsilon = 1.0e-9);
        assert_eq!(part.cells[0].inside_vertices().count(), 0);
    }

    #[test]
    fn split_part_covers_the_solid_on_each_side() {
        let cube = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(2.0, 1.0, 1.0)));
        let solid = Solid::new(cube, false, 1.0e-8);
        let part = solid.initial_part(0, 0).unwrap();

        let plane = HalfSpace::new(Vector::x_axis(), 0.5);
        let (below, above) = part.split(&plane, &solid);
        let (below, above) = (below.unwrap(), above.unwrap());
        assert_relative_eq!(below.hull.volume(), 0.5, epsilon = 1.0e-9);
        assert_relative_eq!(above.hull.volume(), 1.5, epsilon = 1.0e-9);

        // The new cell vertices lie on the loosened box, outside of the solid.
        assert_eq!(below.cells[0].inside_vertices().count(), 0);
        assert!(below.polygons.iter().all(|p| p.vertices.iter().all(|v| v.x <= 0.5 + 1.0e-9)));

        // A plane missing the solid leaves one side empty.
        let plane = HalfSpace::new(Vector::x_axis(), 2.01);
        let (below, above) = part.split(&plane, &solid);
        assert!(below.is_some());
        assert!(above.is_none());
    }

    #[test]
    fn intrusion_of_spheres() {
        let cube = TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0)));
        let solid = Solid::new(cube, false, 1.0e-8);
        let part = solid.initial_part(0, 0).unwrap();

        let spheres = [
            Sphere::new(Point::new(3.0, 0.5, 0.5), 1.0),
            Sphere::new(Point::new(1.5, 0.5, 0.5), 1.0),
            Sphere::new(Point::new(0.5, 0.5, -1.25), 1.0),
        ];
        let (intrusion, worst) = hull_intrusion(&part.hull, &spheres, 0.0);
        assert_relative_eq!(intrusion, 0.5, epsilon = 1.0e-9);
        assert_eq!(worst, Some(1));

        let (intrusion, _) = hull_intrusion(&part.hull, &spheres, 0.6);
        assert!(intrusion < 0.0);
        let (intrusion, worst) = hull_intrusion(&part.hull, &spheres[..1], 0.0);
        assert_eq!((intrusion, worst), (f64::NEG_INFINITY, None));
    }
}
