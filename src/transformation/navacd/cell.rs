use super::polygon::{canonical_intersection, side};
use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};
use crate::shape::HalfSpace;
use crate::utils::hashmap::{Entry, HashMap};
use crate::utils::SortedPair;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

/// A convex polytope of space, part of the region covered by a convex part.
///
/// Each vertex is flagged as inside or outside of the solid component the cell belongs to.
/// Faces are loops of vertex indices, counter-clockwise when seen from the outside.
#[derive(Clone, Debug)]
pub(crate) struct ConvexCell {
    pub vertices: Vec<Point<Real>>,
    pub inside: Vec<bool>,
    pub faces: Vec<SmallVec<[u32; 8]>>,
    /// The index of the solid component this cell is clipped against.
    pub component: u32,
}

impl ConvexCell {
    /// A cell covering `aabb`.
    pub fn from_aabb(
        aabb: &Aabb,
        component: u32,
        is_inside: impl Fn(&Point<Real>) -> bool,
    ) -> Self {
        let vertices = aabb.vertices().to_vec();
        let inside = vertices.iter().map(is_inside).collect();
        let faces = Aabb::FACES_VERTEX_IDS
            .iter()
            .map(|face| face.iter().map(|i| *i as u32).collect())
            .collect();

        Self {
            vertices,
            inside,
            faces,
            component,
        }
    }

    /// The vertices of this cell located inside of the solid.
    pub fn inside_vertices(&self) -> impl Iterator<Item = &Point<Real>> + '_ {
        self.vertices
            .iter()
            .zip(self.inside.iter())
            .filter(|(_, inside)| **inside)
            .map(|(pt, _)| pt)
    }

    /// Splits this cell by the boundary of `plane`.
    ///
    /// Returns the parts inside and outside of the half-space, or `None` for a side the cell
    /// does not extend to. Vertices closer than `epsilon` to the boundary belong to both
    /// parts. The inside flags of the new vertices are computed with `is_inside`.
    pub fn split(
        &self,
        plane: &HalfSpace,
        epsilon: Real,
        is_inside: impl Fn(&Point<Real>) -> bool,
    ) -> (Option<Self>, Option<Self>) {
        let dists: Vec<Real> = self
            .vertices
            .iter()
            .map(|pt| plane.signed_distance(pt))
            .collect();
        let sides: Vec<i8> = dists.iter().map(|d| side(*d, epsilon)).collect();

        if sides.iter().all(|s| *s <= 0) {
            return (Some(self.clone()), None);
        }
        if sides.iter().all(|s| *s >= 0) {
            return (None, Some(self.clone()));
        }

        // One new vertex per edge crossing the plane.
        let mut cut_ids = HashMap::default();
        let mut cuts = Vec::new();

        for face in &self.faces {
            for (a, b) in loop_edges(face) {
                if sides[a as usize] * sides[b as usize] < 0 {
                    if let Entry::Vacant(entry) = cut_ids.entry(SortedPair::new(a, b)) {
                        let _ = entry.insert(cuts.len() as u32);
                        cuts.push(canonical_intersection(
                            &self.vertices[a as usize],
                            dists[a as usize],
                            &self.vertices[b as usize],
                            dists[b as usize],
                        ));
                    }
                }
            }
        }

        let cuts_inside: Vec<bool> = cuts.iter().map(is_inside).collect();
        let clip = CellClipping {
            cell: self,
            sides: &sides,
            cut_ids: &cut_ids,
            cuts: &cuts,
            cuts_inside: &cuts_inside,
        };

        (
            clip.keep_side(-1, *plane.normal),
            clip.keep_side(1, -*plane.normal),
        )
    }
}

struct CellClipping<'a> {
    cell: &'a ConvexCell,
    sides: &'a [i8],
    cut_ids: &'a HashMap<SortedPair<u32>, u32>,
    cuts: &'a [Point<Real>],
    cuts_inside: &'a [bool],
}

impl CellClipping<'_> {
    fn keep_side(&self, keep: i8, cap_normal: Vector<Real>) -> Option<ConvexCell> {
        let cell = self.cell;
        let mut remap = vec![u32::MAX; cell.vertices.len()];
        let mut vertices = Vec::with_capacity(cell.vertices.len() + self.cuts.len());
        let mut inside = Vec::with_capacity(vertices.capacity());

        for (i, s) in self.sides.iter().enumerate() {
            if *s != -keep {
                remap[i] = vertices.len() as u32;
                vertices.push(cell.vertices[i]);
                inside.push(cell.inside[i]);
            }
        }

        let cut_base = vertices.len() as u32;
        vertices.extend_from_slice(self.cuts);
        inside.extend_from_slice(self.cuts_inside);

        let mut faces = Vec::with_capacity(cell.faces.len() + 1);

        for face in &cell.faces {
            let mut clipped = SmallVec::<[u32; 8]>::new();

            for (a, b) in loop_edges(face) {
                let (sa, sb) = (self.sides[a as usize], self.sides[b as usize]);

                if sa != -keep {
                    clipped.push(remap[a as usize]);
                }

                if sa * sb < 0 {
                    if let Some(cut) = self.cut_ids.get(&SortedPair::new(a, b)) {
                        clipped.push(cut_base + cut);
                    }
                }
            }

            if clipped.len() >= 3 {
                faces.push(clipped);
            }
        }

        // The cap face, made of every kept vertex lying on the plane.
        let cap: Vec<u32> = self
            .sides
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == 0)
            .map(|(i, _)| remap[i])
            .chain(cut_base..vertices.len() as u32)
            .collect();

        if cap.len() >= 3 {
            faces.push(sort_around_normal(&vertices, cap, &cap_normal));
        }

        (vertices.len() >= 4 && faces.len() >= 4).then_some(ConvexCell {
            vertices,
            inside,
            faces,
            component: cell.component,
        })
    }
}

fn loop_edges(face: &[u32]) -> impl Iterator<Item = (u32, u32)> + '_ {
    (0..face.len()).map(move |i| (face[i], face[(i + 1) % face.len()]))
}

/// Orders the coplanar points `ids` counter-clockwise around `normal`.
fn sort_around_normal(
    vertices: &[Point<Real>],
    mut ids: Vec<u32>,
    normal: &Vector<Real>,
) -> SmallVec<[u32; 8]> {
    let center = ids
        .iter()
        .fold(Vector::zeros(), |acc, i| acc + vertices[*i as usize].coords)
        / ids.len() as Real;

    let imin = normal.iamin();
    let mut axis = Vector::zeros();
    axis[imin] = 1.0;
    let u = normal.cross(&axis).normalize();
    let v = normal.cross(&u);

    ids.sort_by_key(|i| {
        let dpt = vertices[*i as usize].coords - center;
        (OrderedFloat(dpt.dot(&v).atan2(dpt.dot(&u))), *i)
    });

    ids.into_iter().collect()
}
