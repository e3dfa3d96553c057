//! Per-face analysis and the per-run face registry.
//!
//! A [`FaceView`] caches what the solver needs to know about one face that
//! never changes during a run: its plane bucket, which 3D edges are aligned
//! with the plane's axes, and the corner positions. UVs are always read from
//! the mesh, since stitching and packing rewrite them in place.
//!
//! Views live in a [`FaceArena`] owned by one run and indexed by face handle.

use nalgebra::{Matrix3, Point2, Point3, Vector2, Vector3};

use super::geometry::{sign, tolerant_sign};
use crate::mesh::{FaceId, MeshIndex, PolyMesh};

/// World up.
pub const UP: Vector3<f64> = Vector3::new(0.0, 0.0, 1.0);

/// Coarse orientation bucket of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    /// Walls: anything not within the threshold of up or down.
    Lateral,
    /// Floors: normal within the threshold of up.
    Top,
    /// Ceilings: normal within the threshold of down.
    Down,
}

impl Plane {
    /// Processing order used when planes are solved separately.
    pub const ORDER: [Plane; 3] = [Plane::Lateral, Plane::Top, Plane::Down];

    /// Classify a face normal. `threshold` is in radians.
    pub fn classify(normal: &Vector3<f64>, threshold: f64) -> Plane {
        if normal.angle(&UP) <= threshold {
            Plane::Top
        } else if normal.angle(&-UP) <= threshold {
            Plane::Down
        } else {
            Plane::Lateral
        }
    }

    /// Reference "up" of the face-local basis.
    fn basis_up(self) -> Vector3<f64> {
        match self {
            Plane::Lateral => UP,
            Plane::Top => Vector3::new(0.0, 1.0, 0.0),
            Plane::Down => Vector3::new(0.0, -1.0, 0.0),
        }
    }

    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Plane::Lateral => "LATERAL",
            Plane::Top => "TOP",
            Plane::Down => "DOWN",
        }
    }
}

impl std::fmt::Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Solve state of a face within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaceState {
    /// Not placed yet.
    #[default]
    Unsolved,
    /// Placed. `inverted` is set when the face was rotated half a turn to
    /// match a neighbor wound the other way.
    Solved {
        /// Whether the face-local basis is flipped.
        inverted: bool,
    },
}

impl FaceState {
    /// Whether the face has been placed.
    #[inline]
    pub fn is_solved(self) -> bool {
        matches!(self, FaceState::Solved { .. })
    }

    /// Whether the face-local basis is flipped.
    #[inline]
    pub fn is_inverted(self) -> bool {
        matches!(self, FaceState::Solved { inverted: true })
    }
}

/// Cached analysis of one mesh face.
#[derive(Debug, Clone)]
pub struct FaceView<I: MeshIndex = u32> {
    face: FaceId<I>,
    plane: Plane,
    normal: Vector3<f64>,
    positions: Vec<Point3<f64>>,
    horizontal_edges: Vec<usize>,
    vertical_edges: Vec<usize>,
    state: FaceState,
}

impl<I: MeshIndex> FaceView<I> {
    /// Analyse a face. `vertical_angle` is the plane threshold in radians.
    pub fn new(mesh: &PolyMesh<I>, face: FaceId<I>, vertical_angle: f64) -> Self {
        let normal = mesh.face_normal(face);
        let plane = Plane::classify(&normal, vertical_angle);
        let positions: Vec<Point3<f64>> = (0..mesh.face_len(face))
            .map(|i| mesh.corner_position(face, i))
            .collect();

        let n = positions.len();
        let mut horizontal_edges = Vec::new();
        let mut vertical_edges = Vec::new();
        for i in 0..n {
            let a = &positions[i];
            let b = &positions[(i + 1) % n];
            let (horizontal, vertical) = match plane {
                Plane::Lateral => (a.z == b.z, a.x == b.x && a.y == b.y),
                Plane::Top | Plane::Down => (a.y == b.y, a.x == b.x),
            };
            if horizontal {
                horizontal_edges.push(i);
            }
            if vertical {
                vertical_edges.push(i);
            }
        }

        Self {
            face,
            plane,
            normal,
            positions,
            horizontal_edges,
            vertical_edges,
            state: FaceState::Unsolved,
        }
    }

    // ==================== Accessors ====================

    /// The mesh face this view describes.
    #[inline]
    pub fn face(&self) -> FaceId<I> {
        self.face
    }

    /// Plane bucket.
    #[inline]
    pub fn plane(&self) -> Plane {
        self.plane
    }

    /// Unit face normal (zero for degenerate faces).
    #[inline]
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// Number of corners.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the face has no corners.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Current solve state.
    #[inline]
    pub fn state(&self) -> FaceState {
        self.state
    }

    #[inline]
    pub(super) fn set_state(&mut self, state: FaceState) {
        self.state = state;
    }

    /// Whether the face has been placed.
    #[inline]
    pub fn is_solved(&self) -> bool {
        self.state.is_solved()
    }

    /// Whether the face-local basis is flipped.
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.state.is_inverted()
    }

    /// Wrap a corner index into `0..len`.
    #[inline]
    pub fn index(&self, i: isize) -> usize {
        i.rem_euclid(self.len() as isize) as usize
    }

    /// 3D position of a corner.
    #[inline]
    pub fn position(&self, i: usize) -> &Point3<f64> {
        &self.positions[i % self.len()]
    }

    /// 3D vector of edge `i`.
    #[inline]
    pub fn edge(&self, i: usize) -> Vector3<f64> {
        self.position(i + 1) - self.position(i)
    }

    // ==================== Alignment ====================

    /// Edges aligned with the plane's horizontal axis, ascending.
    #[inline]
    pub fn horizontal_edges(&self) -> &[usize] {
        &self.horizontal_edges
    }

    /// Edges aligned with the plane's vertical axis, ascending.
    #[inline]
    pub fn vertical_edges(&self) -> &[usize] {
        &self.vertical_edges
    }

    /// Whether edge `i` is horizontal-aligned.
    #[inline]
    pub fn is_horizontal(&self, i: usize) -> bool {
        self.horizontal_edges.binary_search(&i).is_ok()
    }

    /// Whether edge `i` is vertical-aligned.
    #[inline]
    pub fn is_vertical(&self, i: usize) -> bool {
        self.vertical_edges.binary_search(&i).is_ok()
    }

    /// Whether edge `i` is aligned on either axis.
    #[inline]
    pub fn is_aligned(&self, i: usize) -> bool {
        self.is_horizontal(i) || self.is_vertical(i)
    }

    /// Total number of aligned edges (an edge on both axes counts twice).
    #[inline]
    pub fn aligned_edge_count(&self) -> usize {
        self.horizontal_edges.len() + self.vertical_edges.len()
    }

    /// Whether any edge is aligned.
    #[inline]
    pub fn has_aligned_edges(&self) -> bool {
        self.aligned_edge_count() > 0
    }

    // ==================== Basis ====================

    /// Matrix taking world coordinates into the face-local frame.
    ///
    /// Rows are the local horizontal, local vertical and normal axes. The
    /// frame is orthonormal so the inverse is the transpose.
    pub fn basis(&self) -> Matrix3<f64> {
        let n = self.normal;
        let mut up = self.plane.basis_up();
        if self.is_inverted() {
            up = -up;
        }
        let ihat = up.cross(&n).try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros);
        let jhat = n.cross(&ihat).try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros);
        Matrix3::from_rows(&[ihat.transpose(), jhat.transpose(), n.transpose()])
    }

    /// Corner `i` in the face-local frame.
    #[inline]
    pub fn basis_converted_vertex(&self, i: usize) -> Vector3<f64> {
        self.basis() * self.position(i).coords
    }

    /// Edge `i` in the face-local frame.
    #[inline]
    pub fn basis_converted_edge(&self, i: usize) -> Vector3<f64> {
        self.basis() * self.edge(i)
    }

    // ==================== UVs ====================

    /// UV of corner `i`.
    #[inline]
    pub fn uv(&self, mesh: &PolyMesh<I>, i: usize) -> Point2<f64> {
        mesh.uv(self.face, i)
    }

    /// UV vector of edge `i`.
    #[inline]
    pub fn uv_edge(&self, mesh: &PolyMesh<I>, i: usize) -> Vector2<f64> {
        mesh.uv_edge(self.face, i)
    }

    /// All corner UVs.
    #[inline]
    pub fn uvs(&self, mesh: &PolyMesh<I>) -> Vec<Point2<f64>> {
        mesh.face_uvs(self.face)
    }

    /// UV edges with exactly equal v at both ends.
    pub fn uv_horizontal_edges(&self, mesh: &PolyMesh<I>) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.uv(mesh, i + 1).y == self.uv(mesh, i).y)
            .collect()
    }

    /// UV edges with exactly equal u at both ends.
    pub fn uv_vertical_edges(&self, mesh: &PolyMesh<I>) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.uv(mesh, i + 1).x == self.uv(mesh, i).x)
            .collect()
    }

    /// Whether every 3D-aligned edge is aligned the same way in UV space.
    ///
    /// Faces without aligned edges are trivially aligned.
    pub fn is_3d_and_uv_aligned(&self, mesh: &PolyMesh<I>) -> bool {
        if !self.has_aligned_edges() {
            return true;
        }
        let uv_horizontal = self.uv_horizontal_edges(mesh);
        let uv_vertical = self.uv_vertical_edges(mesh);
        self.horizontal_edges.iter().all(|e| uv_horizontal.contains(e))
            && self.vertical_edges.iter().all(|e| uv_vertical.contains(e))
    }

    // ==================== Adjacency ====================

    /// Corner pairs `(self, other)` with exactly equal 3D positions.
    pub fn common_vertices(&self, other: &FaceView<I>) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, p) in self.positions.iter().enumerate() {
            for (j, q) in other.positions.iter().enumerate() {
                if p == q {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    /// Shared edges as `(self_edge, other_edge)` start corners.
    ///
    /// Self's edge `i → i+1` pairs with the edge of `other` joining the same
    /// two vertices. On consistently wound faces that edge runs the other way
    /// and starts at the match of `i + 1`; on faces wound against each other
    /// it runs the same way and starts at the match of `i`.
    pub fn common_edges(&self, other: &FaceView<I>) -> Vec<(usize, usize)> {
        let vertices = self.common_vertices(other);
        let n = other.len();
        vertices
            .iter()
            .filter_map(|&(i, j)| {
                let next = (i + 1) % self.len();
                let &(_, k) = vertices.iter().find(|(a, _)| *a == next)?;
                if k == other.index(j as isize - 1) {
                    Some((i, k))
                } else if k == (j + 1) % n {
                    Some((i, j))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Whether the two faces are wound against each other across a shared edge.
    ///
    /// True if for some common edge both faces run the same way in 3D and
    /// their face-local projections of it point the same way too.
    pub fn is_inverted_against(&self, other: &FaceView<I>) -> bool {
        self.common_edges(other).into_iter().any(|(e, oe)| {
            let self_edge = self.edge(e);
            let other_edge = other.edge(oe);
            let self_basis = self.basis_converted_edge(e);
            let other_basis = other.basis_converted_edge(oe);
            (0..3).all(|k| sign(self_edge[k]) == sign(other_edge[k]))
                && (0..3).all(|k| tolerant_sign(self_basis[k]) == tolerant_sign(other_basis[k]))
        })
    }
}

/// Registry of face views for one run, indexed by face handle.
///
/// Only faces in scope (all faces, or the selection) get views. A fresh arena
/// is built for every run.
#[derive(Debug, Clone)]
pub struct FaceArena<I: MeshIndex = u32> {
    views: Vec<Option<FaceView<I>>>,
    in_scope: Vec<bool>,
    vertical_angle: f64,
}

impl<I: MeshIndex> FaceArena<I> {
    /// Create an empty arena. `vertical_angle` is in radians.
    pub fn new(mesh: &PolyMesh<I>, selection_only: bool, vertical_angle: f64) -> Self {
        let in_scope = mesh
            .face_ids()
            .map(|f| !selection_only || mesh.is_face_selected(f))
            .collect();
        Self {
            views: vec![None; mesh.num_faces()],
            in_scope,
            vertical_angle,
        }
    }

    /// Plane threshold in radians.
    #[inline]
    pub fn vertical_angle(&self) -> f64 {
        self.vertical_angle
    }

    /// Whether a face takes part in this run.
    #[inline]
    pub fn in_scope(&self, f: FaceId<I>) -> bool {
        self.in_scope.get(f.index()).copied().unwrap_or(false)
    }

    /// Faces in scope, in mesh order.
    pub fn scope(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.in_scope
            .iter()
            .enumerate()
            .filter(|(_, s)| **s)
            .map(|(i, _)| FaceId::new(i))
    }

    /// The view of a face, if created.
    #[inline]
    pub fn get(&self, f: FaceId<I>) -> Option<&FaceView<I>> {
        self.views.get(f.index()).and_then(Option::as_ref)
    }

    /// Store a view, replacing any previous one.
    pub fn insert(&mut self, view: FaceView<I>) {
        let i = view.face().index();
        self.views[i] = Some(view);
    }

    /// Create the view of a face on first use.
    pub fn ensure(&mut self, mesh: &PolyMesh<I>, f: FaceId<I>) -> &FaceView<I> {
        let angle = self.vertical_angle;
        self.views[f.index()].get_or_insert_with(|| FaceView::new(mesh, f, angle))
    }

    /// Solve state; faces without a view are unsolved.
    #[inline]
    pub fn state(&self, f: FaceId<I>) -> FaceState {
        self.get(f).map(FaceView::state).unwrap_or_default()
    }

    /// Transition a face's state. No-op for faces without a view.
    pub(super) fn set_state(&mut self, f: FaceId<I>, state: FaceState) {
        if let Some(view) = self.views[f.index()].as_mut() {
            view.set_state(state);
        }
    }

    /// Number of views created.
    pub fn len(&self) -> usize {
        self.views.iter().filter(|v| v.is_some()).count()
    }

    /// Whether no view has been created.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_quads;
    use approx::assert_relative_eq;

    const THIRTY_DEGREES: f64 = std::f64::consts::PI / 6.0;

    /// Front wall (y = 0) and right wall (x = 1) of a unit box, plus its floor
    /// seen from above.
    fn corner_mesh() -> PolyMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces = [[0, 1, 2, 3], [1, 4, 5, 2], [3, 2, 5, 6]];
        build_from_quads(&vertices, &faces).unwrap()
    }

    fn view(mesh: &PolyMesh, f: usize) -> FaceView {
        FaceView::new(mesh, FaceId::new(f), THIRTY_DEGREES)
    }

    #[test]
    fn test_plane_classification() {
        let mesh = corner_mesh();
        assert_eq!(view(&mesh, 0).plane(), Plane::Lateral);
        assert_eq!(view(&mesh, 1).plane(), Plane::Lateral);
        assert_eq!(view(&mesh, 2).plane(), Plane::Top);

        let tilted = Vector3::new(0.0, 0.3, -1.0).normalize();
        assert_eq!(Plane::classify(&tilted, THIRTY_DEGREES), Plane::Down);
        assert_eq!(Plane::classify(&tilted, 0.1), Plane::Lateral);
    }

    #[test]
    fn test_alignment_lists() {
        let mesh = corner_mesh();
        let wall = view(&mesh, 0);
        assert_eq!(wall.horizontal_edges(), &[0, 2]);
        assert_eq!(wall.vertical_edges(), &[1, 3]);
        assert!(wall.is_aligned(3));

        // Floor: horizontal is constant y, vertical is constant x
        let top = view(&mesh, 2);
        assert_eq!(top.horizontal_edges(), &[0, 2]);
        assert_eq!(top.vertical_edges(), &[1, 3]);
    }

    #[test]
    fn test_basis_projection() {
        let mesh = corner_mesh();
        let wall = view(&mesh, 0);
        // Front wall: local x follows world x, local y follows world z
        assert_relative_eq!(wall.basis_converted_edge(0), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(wall.basis_converted_edge(1), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);

        let mut flipped = wall.clone();
        flipped.set_state(FaceState::Solved { inverted: true });
        assert_relative_eq!(
            flipped.basis_converted_edge(0),
            Vector3::new(-1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_common_vertices_and_edges() {
        let mesh = corner_mesh();
        let front = view(&mesh, 0);
        let right = view(&mesh, 1);

        assert_eq!(front.common_vertices(&right), vec![(1, 0), (2, 3)]);
        // front edge 1 (1 -> 2) runs against right edge 3 (2 -> 1)
        assert_eq!(front.common_edges(&right), vec![(1, 3)]);
        assert_eq!(right.common_edges(&front), vec![(3, 1)]);
        assert!(!front.is_inverted_against(&right));
    }

    #[test]
    fn test_uv_alignment_diagnostics() {
        let mut mesh = corner_mesh();
        let f = FaceId::new(0);
        let uvs = [
            Point2::new(0.0, 0.0),
            Point2::new(0.5, 0.0),
            Point2::new(0.5, 0.5),
            Point2::new(0.0, 0.5),
        ];
        mesh.set_face_uvs(f, &uvs);
        let wall = view(&mesh, 0);
        assert_eq!(wall.uv_horizontal_edges(&mesh), vec![0, 2]);
        assert_eq!(wall.uv_vertical_edges(&mesh), vec![1, 3]);
        assert!(wall.is_3d_and_uv_aligned(&mesh));

        mesh.set_uv(f, 2, Point2::new(0.6, 0.5));
        assert!(!wall.is_3d_and_uv_aligned(&mesh));
    }

    #[test]
    fn test_arena_scope_and_state() {
        let mut mesh = corner_mesh();
        mesh.select_only([FaceId::new(1)]);
        let mut arena = FaceArena::new(&mesh, true, THIRTY_DEGREES);
        assert!(!arena.in_scope(FaceId::new(0)));
        assert_eq!(arena.scope().collect::<Vec<_>>(), vec![FaceId::new(1)]);

        assert!(arena.is_empty());
        arena.ensure(&mesh, FaceId::new(1));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.state(FaceId::new(1)), FaceState::Unsolved);

        arena.set_state(FaceId::new(1), FaceState::Solved { inverted: false });
        assert!(arena.state(FaceId::new(1)).is_solved());
        assert!(!arena.state(FaceId::new(0)).is_solved());
    }
}
