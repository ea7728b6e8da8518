use super::concave_edges::{concave_edges, ConcaveEdge};
use super::part::{ConvexPart, Solid};
use super::probes::FitProbes;
use super::{DecompositionError, DecompositionParameters, NegativeSpaceCovering};
use crate::math::{Point, Real};
use crate::shape::{ConvexHull, TriMesh};

/// An approximate convex decomposition of a triangle mesh that keeps the negative space free.
///
/// The decomposition starts with a single convex hull per solid component, and is refined in
/// three stages, usually called in this order:
/// 1. [`Self::split_hulls`] splits hulls until they fit the mesh and stay out of the negative
///    space.
/// 2. [`Self::fix_hull_overlaps_in_negative_space`] cuts the hulls that could not be split
///    enough.
/// 3. [`Self::merge_hulls`] merges hulls as long as the result still fits the mesh.
#[derive(Clone, Debug)]
pub struct ConvexDecomposition {
    pub(super) params: DecompositionParameters,
    pub(super) solid: Solid,
    pub(super) probes: FitProbes,
    pub(super) concave_edges: Vec<ConcaveEdge>,
    pub(super) negative_space: NegativeSpaceCovering,
    pub(super) parts: Vec<ConvexPart>,
    pub(super) next_part_id: u32,
}

impl ConvexDecomposition {
    /// Initializes the decomposition of `mesh`, with an empty negative space.
    ///
    /// Fails if every triangle of the mesh is degenerate.
    pub fn new(mesh: TriMesh, params: DecompositionParameters) -> Result<Self, DecompositionError> {
        if mesh.triangles().all(|tri| tri.is_affinely_dependent()) {
            return Err(DecompositionError::DegenerateMesh);
        }

        let thickness = params.thicken_after_hull_failure;
        let global_hull = ConvexHull::from_points_thickened(mesh.vertices(), thickness)
            .ok_or(DecompositionError::DegenerateMesh)?;
        let probes = FitProbes::new(&mesh, &global_hull, params.max_voxels_per_dim);
        let solid = Solid::new(mesh, params.split_connected_components, thickness);
        let concave_edges = concave_edges(
            &solid.mesh,
            params.convex_edge_angle_more_samples_threshold,
            solid.epsilon,
        );

        let mut result = Self {
            params,
            solid,
            probes,
            concave_edges,
            negative_space: NegativeSpaceCovering::default(),
            parts: Vec::new(),
            next_part_id: 0,
        };

        for component in 0..result.solid.components.len() as u32 {
            let id = result.next_part_id;
            if let Some(mut part) = result.solid.initial_part(component, id) {
                part.update_fit_error(&result.probes);
                result.parts.push(part);
                result.next_part_id += 1;
            }
        }

        log::debug!(
            "Convex decomposition initialized: {} parts, {} concave edges, {} probes.",
            result.parts.len(),
            result.concave_edges.len(),
            result.probes.len()
        );

        Ok(result)
    }

    /// Initializes the decomposition of the mesh given by a vertex buffer and an index
    /// buffer.
    pub fn from_buffers(
        vertices: Vec<Point<Real>>,
        indices: Vec<[u32; 3]>,
        params: DecompositionParameters,
    ) -> Result<Self, DecompositionError> {
        Self::new(TriMesh::new(vertices, indices)?, params)
    }

    /// Sets the spheres of free space the hulls must stay out of.
    ///
    /// Every hull is re-evaluated against the new covering, and may be split again.
    pub fn set_negative_space(&mut self, covering: NegativeSpaceCovering) {
        self.negative_space = covering;

        for part in &mut self.parts {
            part.update_intrusion(
                self.negative_space.spheres(),
                self.params.negative_space_tolerance,
            );
            part.frozen = false;
        }
    }

    /// The current convex hulls.
    pub fn hulls(&self) -> impl ExactSizeIterator<Item = &ConvexHull> + '_ {
        self.parts.iter().map(|part| &part.hull)
    }

    /// Consumes the decomposition and returns its convex hulls.
    pub fn into_hulls(self) -> Vec<ConvexHull> {
        self.parts.into_iter().map(|part| part.hull).collect()
    }

    /// The current number of convex hulls.
    pub fn num_hulls(&self) -> usize {
        self.parts.len()
    }

    /// The spheres of free space the hulls must stay out of.
    pub fn negative_space(&self) -> &NegativeSpaceCovering {
        &self.negative_space
    }

    /// The parameters of this decomposition.
    pub fn parameters(&self) -> &DecompositionParameters {
        &self.params
    }

    /// The mesh being decomposed.
    pub fn mesh(&self) -> &TriMesh {
        &self.solid.mesh
    }

    /// The largest fit error among the current hulls.
    ///
    /// The fit error of a hull is the largest distance to the mesh surface of the free-space
    /// points it contains.
    pub fn max_fit_error(&self) -> Real {
        self.parts
            .iter()
            .map(|part| part.fit_error)
            .fold(0.0, Real::max)
    }

    pub(super) fn new_part_id(&mut self) -> u32 {
        self.next_part_id += 1;
        self.next_part_id - 1
    }

    pub(super) fn evaluate(&self, part: &mut ConvexPart) {
        part.update_fit_error(&self.probes);
        part.update_intrusion(
            self.negative_space.spheres(),
            self.params.negative_space_tolerance,
        );
    }
}
