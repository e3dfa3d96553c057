//! Polygon mesh with per-corner UV storage.
//!
//! A [`PolyMesh`] stores shared vertex positions and faces made of an ordered,
//! cyclic list of corners. Each corner references one vertex and owns one
//! mutable UV coordinate, so two faces meeting at a vertex can carry different
//! UVs there (a UV seam). Positions are immutable after construction; only the
//! UV component of corners is ever written by the solver.
//!
//! Corner indices passed to the accessors are taken modulo the face length, so
//! `-1` is the last corner and `len` wraps back to the first.

use nalgebra::{Point2, Point3, Vector2, Vector3};

use super::index::{FaceId, MeshIndex, VertexId};

/// A vertex in the mesh.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,
}

/// One corner of a face: a vertex reference plus the UV stored for it.
#[derive(Debug, Clone, Copy)]
pub struct Corner<I: MeshIndex = u32> {
    /// The vertex at this corner.
    pub vertex: VertexId<I>,
    /// The UV coordinate of this corner.
    pub uv: Point2<f64>,
}

/// A polygonal face.
#[derive(Debug, Clone)]
pub struct Face<I: MeshIndex = u32> {
    /// Corners in winding order.
    pub corners: Vec<Corner<I>>,
    /// Selection flag, used by selection-only runs.
    pub selected: bool,
}

impl<I: MeshIndex> Face<I> {
    /// Number of corners (and edges).
    #[inline]
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    /// Whether the face has no corners.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }
}

/// A polygon mesh with per-corner UVs.
#[derive(Debug, Clone)]
pub struct PolyMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) faces: Vec<Face<I>>,
    /// Faces incident to each vertex, in face order.
    pub(crate) vertex_faces: Vec<Vec<FaceId<I>>>,
}

impl<I: MeshIndex> Default for PolyMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> PolyMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            vertex_faces: Vec::new(),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get the total number of face corners.
    pub fn num_corners(&self) -> usize {
        self.faces.iter().map(Face::len).sum()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Faces incident to a vertex.
    #[inline]
    pub fn vertex_faces(&self, v: VertexId<I>) -> &[FaceId<I>] {
        &self.vertex_faces[v.index()]
    }

    // ==================== Corners ====================

    /// Number of corners of a face.
    #[inline]
    pub fn face_len(&self, f: FaceId<I>) -> usize {
        self.face(f).len()
    }

    /// Wrap a possibly negative or overflowing corner index into `0..len`.
    #[inline]
    pub fn wrap(&self, f: FaceId<I>, index: isize) -> usize {
        index.rem_euclid(self.face_len(f) as isize) as usize
    }

    #[inline]
    fn corner(&self, f: FaceId<I>, index: usize) -> &Corner<I> {
        let face = self.face(f);
        &face.corners[index % face.len()]
    }

    /// Vertex at a corner.
    #[inline]
    pub fn corner_vertex(&self, f: FaceId<I>, index: usize) -> VertexId<I> {
        self.corner(f, index).vertex
    }

    /// 3D position at a corner.
    #[inline]
    pub fn corner_position(&self, f: FaceId<I>, index: usize) -> Point3<f64> {
        *self.position(self.corner_vertex(f, index))
    }

    /// 3D vector of the edge starting at corner `index`.
    #[inline]
    pub fn edge_vector(&self, f: FaceId<I>, index: usize) -> Vector3<f64> {
        self.corner_position(f, index + 1) - self.corner_position(f, index)
    }

    /// UV at a corner.
    #[inline]
    pub fn uv(&self, f: FaceId<I>, index: usize) -> Point2<f64> {
        self.corner(f, index).uv
    }

    /// UV vector of the edge starting at corner `index`.
    #[inline]
    pub fn uv_edge(&self, f: FaceId<I>, index: usize) -> Vector2<f64> {
        self.uv(f, index + 1) - self.uv(f, index)
    }

    /// Set the UV of a corner.
    #[inline]
    pub fn set_uv(&mut self, f: FaceId<I>, index: usize, uv: Point2<f64>) {
        let face = &mut self.faces[f.index()];
        let len = face.corners.len();
        face.corners[index % len].uv = uv;
    }

    /// All UVs of a face in corner order.
    pub fn face_uvs(&self, f: FaceId<I>) -> Vec<Point2<f64>> {
        self.face(f).corners.iter().map(|c| c.uv).collect()
    }

    /// Overwrite all UVs of a face.
    pub fn set_face_uvs(&mut self, f: FaceId<I>, uvs: &[Point2<f64>]) {
        for (corner, uv) in self.faces[f.index()].corners.iter_mut().zip(uvs) {
            corner.uv = *uv;
        }
    }

    // ==================== Selection ====================

    /// Whether a face is selected.
    #[inline]
    pub fn is_face_selected(&self, f: FaceId<I>) -> bool {
        self.face(f).selected
    }

    /// Select or deselect a face.
    pub fn select_face(&mut self, f: FaceId<I>, selected: bool) {
        self.faces[f.index()].selected = selected;
    }

    /// Select exactly the given faces.
    pub fn select_only(&mut self, faces: impl IntoIterator<Item = FaceId<I>>) {
        for face in &mut self.faces {
            face.selected = false;
        }
        for f in faces {
            self.select_face(f, true);
        }
    }

    // ==================== Geometry ====================

    /// Compute the unit normal of a face using Newell's method.
    ///
    /// Returns the zero vector for degenerate faces.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let n = self.face_len(f);
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let a = self.corner_position(f, i);
            let b = self.corner_position(f, i + 1);
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        normal.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
    }

    /// Faces sharing at least one vertex with `f`, in discovery order.
    ///
    /// Discovery walks the corners of `f` in order and, for each, the faces
    /// incident to its vertex. `f` itself is never included.
    pub fn linked_faces(&self, f: FaceId<I>) -> Vec<FaceId<I>> {
        let mut linked: Vec<FaceId<I>> = Vec::new();
        for corner in &self.face(f).corners {
            for &other in self.vertex_faces(corner.vertex) {
                if other != f && !linked.contains(&other) {
                    linked.push(other);
                }
            }
        }
        linked
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let mut min = first;
        let mut max = first;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    /// UV bounding box over a set of faces.
    ///
    /// Returns `None` if `faces` is empty.
    pub fn uv_bounding_box<'a>(
        &self,
        faces: impl IntoIterator<Item = &'a FaceId<I>>,
    ) -> Option<(Point2<f64>, Point2<f64>)> {
        let mut bounds: Option<(Point2<f64>, Point2<f64>)> = None;
        for &f in faces {
            for corner in &self.face(f).corners {
                let uv = corner.uv;
                bounds = Some(match bounds {
                    None => (uv, uv),
                    Some((min, max)) => (
                        Point2::new(min.x.min(uv.x), min.y.min(uv.y)),
                        Point2::new(max.x.max(uv.x), max.y.max(uv.y)),
                    ),
                });
            }
        }
        bounds
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex { position });
        self.vertex_faces.push(Vec::new());
        id
    }

    /// Add a face over existing vertices. UVs start at the origin.
    ///
    /// Callers are expected to have validated the indices; see
    /// [`build_from_polygons`](super::build_from_polygons).
    pub(crate) fn push_face(&mut self, vertices: &[VertexId<I>]) -> FaceId<I> {
        let id = FaceId::new(self.faces.len());
        let corners = vertices
            .iter()
            .map(|&vertex| Corner {
                vertex,
                uv: Point2::origin(),
            })
            .collect();
        self.faces.push(Face {
            corners,
            selected: false,
        });
        for &v in vertices {
            self.vertex_faces[v.index()].push(id);
        }
        id
    }
}
