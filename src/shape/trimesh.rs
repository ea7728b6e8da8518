use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use crate::shape::Triangle;
use crate::utils::hashmap::{Entry, HashMap};
use crate::utils::SortedPair;
use core::f64::consts::PI;
use core::fmt;

/// Indicated an inconsistency while building a triangle mesh.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TriMeshBuilderError {
    /// A triangle mesh must contain at least one triangle.
    #[error("A triangle mesh must contain at least one triangle.")]
    EmptyIndices,
    /// A triangle references a vertex that does not exist.
    #[error("the triangle {triangle} references the vertex {index} which does not exist.")]
    InvalidIndex {
        /// The faulty triangle.
        triangle: u32,
        /// The out-of-bounds vertex index.
        index: u32,
    },
    /// A vertex has a NaN or infinite coordinate.
    #[error("the vertex {0} has a non-finite coordinate.")]
    NonFiniteVertex(u32),
}

/// The connected components of a triangle mesh.
///
/// Two triangles belong to the same component if they are linked by a chain of triangles
/// sharing vertices.
#[derive(Clone, Debug, Default)]
pub struct TriMeshConnectedComponents {
    /// The `face_colors[i]` gives the connected-component index of the i-th face.
    pub face_colors: Vec<u32>,
    /// The set of faces grouped by connected components.
    pub grouped_faces: Vec<u32>,
    /// The range of connected components. `self.grouped_faces[self.ranges[i]..self.ranges[i + 1]]`
    /// contains the indices of all the faces part of the i-th connected component.
    pub ranges: Vec<usize>,
}

impl TriMeshConnectedComponents {
    /// The total number of connected components.
    pub fn num_connected_components(&self) -> usize {
        self.ranges.len() - 1
    }

    /// The faces of the i-th connected component.
    pub fn component(&self, i: usize) -> &[u32] {
        &self.grouped_faces[self.ranges[i]..self.ranges[i + 1]]
    }
}

#[derive(Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
/// A triangle mesh: an indexed triangle soup.
///
/// Every index is guaranteed to be valid and every vertex finite. No other topological
/// property is assumed: whether the mesh is closed is a query, not an invariant.
pub struct TriMesh {
    vertices: Vec<Point<Real>>,
    indices: Vec<[u32; 3]>,
    aabb: Aabb,
}

impl fmt::Debug for TriMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TriMesh {{ vertices: {}, triangles: {} }}",
            self.vertices.len(),
            self.indices.len()
        )
    }
}

impl TriMesh {
    /// Creates a new triangle mesh from a vertex buffer and an index buffer.
    pub fn new(
        vertices: Vec<Point<Real>>,
        indices: Vec<[u32; 3]>,
    ) -> Result<Self, TriMeshBuilderError> {
        if indices.is_empty() {
            return Err(TriMeshBuilderError::EmptyIndices);
        }

        for (i, pt) in vertices.iter().enumerate() {
            if !pt.coords.iter().all(|e| e.is_finite()) {
                return Err(TriMeshBuilderError::NonFiniteVertex(i as u32));
            }
        }

        for (i, idx) in indices.iter().enumerate() {
            for index in idx {
                if *index as usize >= vertices.len() {
                    return Err(TriMeshBuilderError::InvalidIndex {
                        triangle: i as u32,
                        index: *index,
                    });
                }
            }
        }

        let aabb = Aabb::from_points(&vertices);
        Ok(Self {
            vertices,
            indices,
            aabb,
        })
    }

    /// A closed box-shaped mesh with outward-facing triangles.
    pub fn cuboid(aabb: &Aabb) -> Self {
        let vertices = aabb.vertices().to_vec();
        let mut indices = Vec::with_capacity(12);

        for [a, b, c, d] in Aabb::FACES_VERTEX_IDS {
            indices.push([a as u32, b as u32, c as u32]);
            indices.push([a as u32, c as u32, d as u32]);
        }

        Self {
            vertices,
            indices,
            aabb: *aabb,
        }
    }

    /// Replaces both buffers. The caller guarantees the indices are valid.
    pub(crate) fn set_buffers(&mut self, vertices: Vec<Point<Real>>, indices: Vec<[u32; 3]>) {
        debug_assert!(indices
            .iter()
            .all(|idx| idx.iter().all(|i| (*i as usize) < vertices.len())));
        self.aabb = Aabb::from_points(&vertices);
        self.vertices = vertices;
        self.indices = indices;
    }

    /// Appends a second triangle mesh to this triangle mesh.
    pub fn append(&mut self, rhs: &TriMesh) {
        let base_id = self.vertices.len() as u32;
        self.vertices.extend_from_slice(rhs.vertices());
        self.indices.extend(
            rhs.indices()
                .iter()
                .map(|idx| [idx[0] + base_id, idx[1] + base_id, idx[2] + base_id]),
        );
        self.aabb = self.aabb.merged(&rhs.aabb);
    }

    /// Reverse the orientation of the triangle mesh.
    pub fn reverse(&mut self) {
        self.indices.iter_mut().for_each(|idx| idx.swap(0, 1));
    }

    /// The vertex buffer of this mesh.
    #[inline]
    pub fn vertices(&self) -> &[Point<Real>] {
        &self.vertices
    }

    /// The index buffer of this mesh.
    #[inline]
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    /// Consumes the mesh and returns its vertex and index buffers.
    pub fn into_buffers(self) -> (Vec<Point<Real>>, Vec<[u32; 3]>) {
        (self.vertices, self.indices)
    }

    /// The number of triangles of this mesh.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// Get the `i`-th triangle of this mesh.
    #[inline]
    pub fn triangle(&self, i: u32) -> Triangle {
        let idx = self.indices[i as usize];
        Triangle::new(
            self.vertices[idx[0] as usize],
            self.vertices[idx[1] as usize],
            self.vertices[idx[2] as usize],
        )
    }

    /// An iterator through all the triangles of this mesh.
    pub fn triangles(&self) -> impl ExactSizeIterator<Item = Triangle> + '_ {
        (0..self.indices.len() as u32).map(move |i| self.triangle(i))
    }

    /// The bounding box of all the vertices of this mesh.
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Is every (undirected) edge of this mesh shared by exactly two triangles?
    ///
    /// Edges are identified by vertex indices: duplicate vertices must be merged first
    /// for a geometrically closed mesh to be reported as closed.
    pub fn is_closed(&self) -> bool {
        let mut edges: HashMap<SortedPair<u32>, u32> = HashMap::default();

        for idx in &self.indices {
            for i in 0..3 {
                let key = SortedPair::new(idx[i], idx[(i + 1) % 3]);
                match edges.entry(key) {
                    Entry::Occupied(mut e) => *e.get_mut() += 1,
                    Entry::Vacant(e) => {
                        let _ = e.insert(1);
                    }
                }
            }
        }

        edges.values().all(|count| *count == 2)
    }

    /// The signed volume enclosed by this mesh.
    ///
    /// Positive if the mesh is closed and its triangles are oriented toward the outside.
    /// The result is meaningless for open meshes.
    pub fn signed_volume(&self) -> Real {
        let mut volume = 0.0;

        for idx in &self.indices {
            let a = self.vertices[idx[0] as usize].coords;
            let b = self.vertices[idx[1] as usize].coords;
            let c = self.vertices[idx[2] as usize].coords;
            volume += a.dot(&b.cross(&c));
        }

        volume / 6.0
    }

    /// The generalized winding number of this mesh at `pt`.
    ///
    /// Close to 1 inside a closed outward-oriented mesh, close to 0 outside. For open meshes
    /// it smoothly measures how much the surface wraps around `pt`.
    pub fn winding_number(&self, pt: &Point<Real>) -> Real {
        self.winding_number_of_triangles(pt, 0..self.indices.len() as u32)
    }

    /// The generalized winding number at `pt` of the subset of triangles `triangles`.
    pub fn winding_number_of_triangles(
        &self,
        pt: &Point<Real>,
        triangles: impl IntoIterator<Item = u32>,
    ) -> Real {
        let mut total = 0.0;

        for i in triangles {
            total += self.triangle(i).solid_angle(pt);
        }

        total / (4.0 * PI)
    }

    /// Is `pt` inside the solid bounded by this mesh (winding number ≥ 0.5)?
    #[inline]
    pub fn contains_point(&self, pt: &Point<Real>) -> bool {
        self.aabb.contains_local_point(pt) && self.winding_number(pt) >= 0.5
    }

    /// Computes the connected components of this mesh.
    ///
    /// Components are numbered in the order of their first triangle.
    pub fn connected_components(&self) -> TriMeshConnectedComponents {
        use ena::unify::{InPlaceUnificationTable, UnifyKey};

        #[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
        struct IntKey(u32);

        impl UnifyKey for IntKey {
            type Value = ();
            fn index(&self) -> u32 {
                self.0
            }
            fn from_index(u: u32) -> IntKey {
                IntKey(u)
            }
            fn tag() -> &'static str {
                "IntKey"
            }
        }

        let mut ufind: InPlaceUnificationTable<IntKey> = InPlaceUnificationTable::new();
        let vertex_keys: Vec<IntKey> = (0..self.vertices.len())
            .map(|_| ufind.new_key(()))
            .collect();

        for idx in &self.indices {
            let keys = idx.map(|i| vertex_keys[i as usize]);
            ufind.union(keys[0], keys[1]);
            ufind.union(keys[1], keys[2]);
        }

        let mut root_to_color = vec![u32::MAX; self.vertices.len()];
        let mut face_colors = Vec::with_capacity(self.indices.len());
        let mut counts = Vec::new();

        for idx in &self.indices {
            let root = ufind.find(vertex_keys[idx[0] as usize]).0 as usize;

            if root_to_color[root] == u32::MAX {
                root_to_color[root] = counts.len() as u32;
                counts.push(0usize);
            }

            let color = root_to_color[root];
            counts[color as usize] += 1;
            face_colors.push(color);
        }

        // Cumulated sum on range indices, to find the first index faces need to be inserted into
        // for each range.
        let mut ranges = Vec::with_capacity(counts.len() + 1);
        ranges.push(0);
        for count in &counts {
            let last = ranges[ranges.len() - 1];
            ranges.push(last + count);
        }

        let mut insertion_index = ranges.clone();
        let mut grouped_faces = vec![u32::MAX; self.indices.len()];
        for (face_id, color) in face_colors.iter().enumerate() {
            let target = &mut insertion_index[*color as usize];
            grouped_faces[*target] = face_id as u32;
            *target += 1;
        }

        TriMeshConnectedComponents {
            face_colors,
            grouped_faces,
            ranges,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{TriMesh, TriMeshBuilderError};
    use crate::bounding_volume::Aabb;
    use crate::math::{Point, Vector};

    fn unit_cube() -> TriMesh {
        TriMesh::cuboid(&Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0)))
    }

    #[test]
    fn trimesh_error_empty_indices() {
        assert_eq!(
            TriMesh::new(vec![], vec![]).unwrap_err(),
            TriMeshBuilderError::EmptyIndices
        );
    }

    #[test]
    fn trimesh_error_invalid_index() {
        let vtx = vec![Point::origin(), Point::new(1.0, 0.0, 0.0)];
        assert_eq!(
            TriMesh::new(vtx, vec![[0, 1, 2]]).unwrap_err(),
            TriMeshBuilderError::InvalidIndex {
                triangle: 0,
                index: 2
            }
        );
    }

    #[test]
    fn trimesh_error_non_finite_vertex() {
        let vtx = vec![
            Point::origin(),
            Point::new(1.0, f64::NAN, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        assert_eq!(
            TriMesh::new(vtx, vec![[0, 1, 2]]).unwrap_err(),
            TriMeshBuilderError::NonFiniteVertex(1)
        );
    }

    #[test]
    fn cube_is_closed_with_positive_volume() {
        let mut cube = unit_cube();
        assert!(cube.is_closed());
        assert_relative_eq!(cube.signed_volume(), 1.0, epsilon = 1.0e-12);

        cube.reverse();
        assert_relative_eq!(cube.signed_volume(), -1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn open_mesh_is_not_closed() {
        let cube = unit_cube();
        let (vtx, mut idx) = cube.into_buffers();
        let _ = idx.pop();
        let open = TriMesh::new(vtx, idx).unwrap();
        assert!(!open.is_closed());
    }

    #[test]
    fn winding_number_inside_outside() {
        let cube = unit_cube();
        assert_relative_eq!(
            cube.winding_number(&Point::new(0.3, 0.5, 0.6)),
            1.0,
            epsilon = 1.0e-9
        );
        assert_relative_eq!(
            cube.winding_number(&Point::new(2.0, 0.5, 0.5)),
            0.0,
            epsilon = 1.0e-9
        );
        assert!(cube.contains_point(&Point::new(0.5, 0.5, 0.5)));
        assert!(!cube.contains_point(&Point::new(0.5, 0.5, 1.5)));
    }

    #[test]
    fn connected_components() {
        let mut mesh = unit_cube();

        // Push 9 more copies of the mesh, each time pushed with an offset.
        for i in 1..10 {
            let shift = Vector::repeat(2.0 * i as f64);
            let aabb = Aabb::new(Point::origin() + shift, Point::new(1.0, 1.0, 1.0) + shift);
            mesh.append(&TriMesh::cuboid(&aabb));
        }

        let components = mesh.connected_components();
        assert_eq!(components.num_connected_components(), 10);

        for i in 0..10 {
            let faces = components.component(i);
            assert_eq!(faces.len(), 12);
            assert!(faces.iter().all(|f| components.face_colors[*f as usize] == i as u32));
        }
    }
}
