//! Loading meshes from, and writing convex decompositions to, Wavefront (`.obj`) files.
//!
//! This module is enabled by the `wavefront` feature flag.

use crate::math::{Point, Real};
use crate::shape::{ConvexHull, TriMesh, TriMeshBuilderError};
use obj::{Group, IndexTuple, Obj, ObjData, ObjError, Object, SimplePolygon};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Errors that can occur while reading or writing a Wavefront file.
#[derive(thiserror::Error, Debug)]
pub enum WavefrontError {
    /// The file could not be parsed or written by the `obj` crate.
    #[error(transparent)]
    Obj(#[from] ObjError),
    /// The file could not be created or flushed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The file does not describe a valid triangle mesh.
    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] TriMeshBuilderError),
}

impl TriMesh {
    /// Loads a triangle mesh from a Wavefront (`.obj`) file.
    ///
    /// Every object and group of the file is loaded into the same mesh. Polygons with more
    /// than three vertices are triangulated as fans around their first vertex.
    pub fn from_obj_file(path: impl AsRef<Path>) -> Result<Self, WavefrontError> {
        let Obj {
            data: ObjData {
                position, objects, ..
            },
            ..
        } = Obj::load(path.as_ref())?;

        let vertices = position
            .iter()
            .map(|v| Point::new(v[0] as Real, v[1] as Real, v[2] as Real))
            .collect();

        let mut indices = Vec::new();
        for poly in objects
            .iter()
            .flat_map(|object| &object.groups)
            .flat_map(|group| &group.polys)
        {
            let ids = &poly.0;
            for k in 1..ids.len().saturating_sub(1) {
                indices.push([ids[0].0 as u32, ids[k].0 as u32, ids[k + 1].0 as u32]);
            }
        }

        Ok(TriMesh::new(vertices, indices)?)
    }

    /// Outputs a Wavefront (`.obj`) file at the given path.
    pub fn to_obj_file(&self, path: impl AsRef<Path>) -> Result<(), WavefrontError> {
        write_obj(
            path.as_ref(),
            self.vertices(),
            vec![named_object("mesh", 0, self.indices())],
        )
    }
}

/// Writes each hull as a separate object named `hull_<i>` of a Wavefront (`.obj`) file.
pub fn write_decomposition_obj(
    hulls: &[ConvexHull],
    path: impl AsRef<Path>,
) -> Result<(), WavefrontError> {
    let mut vertices = Vec::new();
    let mut objects = Vec::with_capacity(hulls.len());

    for (i, hull) in hulls.iter().enumerate() {
        let (points, indices) = hull.to_trimesh();
        let name = format!("hull_{}", i);
        objects.push(named_object(&name, vertices.len(), &indices));
        vertices.extend(points);
    }

    write_obj(path.as_ref(), &vertices, objects)
}

/// A color for displaying the `i`-th hull of a decomposition, as RGB components in `[0, 1]`.
///
/// Consecutive hulls get hues far apart from each other.
pub fn hull_color(i: usize) -> [f32; 3] {
    const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;
    let hue = (i as f32 * GOLDEN_RATIO_CONJUGATE).fract() * 6.0;
    let x = 1.0 - (hue % 2.0 - 1.0).abs();

    match hue as u32 {
        0 => [1.0, x, 0.0],
        1 => [x, 1.0, 0.0],
        2 => [0.0, 1.0, x],
        3 => [0.0, x, 1.0],
        4 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    }
}

fn named_object(name: &str, base_id: usize, indices: &[[u32; 3]]) -> Object {
    Object {
        name: name.to_string(),
        groups: vec![Group {
            name: name.to_string(),
            index: 0,
            material: None,
            polys: indices
                .iter()
                .map(|tri| {
                    SimplePolygon(
                        tri.iter()
                            .map(|i| IndexTuple(base_id + *i as usize, None, None))
                            .collect(),
                    )
                })
                .collect(),
        }],
    }
}

fn write_obj(
    path: &Path,
    vertices: &[Point<Real>],
    objects: Vec<Object>,
) -> Result<(), WavefrontError> {
    let mut out = BufWriter::new(File::create(path)?);

    ObjData {
        position: vertices
            .iter()
            .map(|v| [v.x as f32, v.y as f32, v.z as f32])
            .collect(),
        objects,
        ..Default::default()
    }
    .write_to_buf(&mut out)?;

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::hull_color;

    #[test]
    fn hull_colors_are_distinct() {
        let colors: Vec<_> = (0..8).map(hull_color).collect();

        for (i, a) in colors.iter().enumerate() {
            assert!(a.iter().all(|c| (0.0..=1.0).contains(c)));
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
