//! Mesh construction utilities.
//!
//! This module builds [`PolyMesh`]es from face-vertex lists as found in mesh
//! file formats, and converts them back.

use nalgebra::Point3;

use super::index::{MeshIndex, VertexId};
use super::polymesh::PolyMesh;
use crate::error::{MeshError, Result};

/// Build a polygon mesh from vertices and polygon faces of any arity.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of faces, each an ordered list of vertex indices
///
/// # Returns
/// A polygon mesh with all UVs at the origin, or an error if the input is
/// invalid.
///
/// # Example
/// ```
/// use texelgrid::mesh::{build_from_polygons, PolyMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 1.0),
///     Point3::new(0.5, 0.0, 1.5),
///     Point3::new(0.0, 0.0, 1.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3, 4]];
///
/// let mesh: PolyMesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 5);
/// assert_eq!(mesh.num_corners(), 5);
/// ```
pub fn build_from_polygons<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[Vec<usize>],
) -> Result<PolyMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        validate_face(fi, face, vertices.len())?;
    }

    let mut mesh = PolyMesh::new();
    let vertex_ids: Vec<VertexId<I>> = vertices
        .iter()
        .map(|&pos| mesh.add_vertex(pos))
        .collect();

    let mut corners = Vec::new();
    for face in faces {
        corners.clear();
        corners.extend(face.iter().map(|&vi| vertex_ids[vi]));
        mesh.push_face(&corners);
    }

    Ok(mesh)
}

/// Build a polygon mesh from vertices and quad faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of quad faces, each as [v0, v1, v2, v3] indices (counter-clockwise)
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<PolyMesh<I>> {
    let faces: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
    build_from_polygons(vertices, &faces)
}

fn validate_face(fi: usize, face: &[usize], num_vertices: usize) -> Result<()> {
    for &vi in face {
        if vi >= num_vertices {
            return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
        }
    }
    if face.len() < 3 {
        return Err(MeshError::DegenerateFace { face: fi });
    }
    // A vertex may appear only once in a face
    for (i, vi) in face.iter().enumerate() {
        if face[i + 1..].contains(vi) {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }
    Ok(())
}

/// Convert a polygon mesh back to a face-vertex representation.
///
/// Returns (vertices, faces) tuple. UVs are not included.
pub fn to_face_vertex<I: MeshIndex>(mesh: &PolyMesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<Vec<usize>> = mesh
        .face_ids()
        .map(|f| {
            mesh.face(f)
                .corners
                .iter()
                .map(|c| c.vertex.index())
                .collect()
        })
        .collect();

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    fn two_quads() -> (Vec<Point3<f64>>, Vec<[usize; 4]>) {
        // Two quads sharing an edge (1-2)
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2, 3], [1, 4, 5, 2]];
        (vertices, faces)
    }

    #[test]
    fn test_build_from_quads_two_quads() {
        let (vertices, faces) = two_quads();
        let mesh: PolyMesh<u32> = build_from_quads(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_corners(), 8);

        // Shared vertices see both faces
        assert_eq!(mesh.vertex_faces(VertexId::new(1)).len(), 2);
        assert_eq!(mesh.vertex_faces(VertexId::new(0)), &[FaceId::new(0)]);
    }

    #[test]
    fn test_mixed_polygons() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3], vec![1, 4, 2]];
        let mesh: PolyMesh<u16> = build_from_polygons(&vertices, &faces).unwrap();
        assert_eq!(mesh.face_len(FaceId::new(0)), 4);
        assert_eq!(mesh.face_len(FaceId::new(1)), 3);
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = two_quads();
        let mesh: PolyMesh<u32> = build_from_quads(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh);

        assert_eq!(vertices, out_verts);
        assert_eq!(out_faces, vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]]);
    }

    #[test]
    fn test_empty_mesh() {
        let result: Result<PolyMesh<u32>> = build_from_polygons(&[], &[]);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces = vec![vec![0, 1, 2]];

        let result: Result<PolyMesh<u32>> = build_from_polygons(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_faces() {
        let (vertices, _) = two_quads();

        // Diagonal vertices the same
        let result: Result<PolyMesh<u32>> = build_from_quads(&vertices, &[[0, 1, 0, 3]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));

        // Too few corners
        let result: Result<PolyMesh<u32>> = build_from_polygons(&vertices, &[vec![0, 1]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }
}
