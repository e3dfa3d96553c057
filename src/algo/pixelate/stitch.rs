//! Stitching a freshly solved face onto a solved neighbour.
//!
//! [`stitch`] rotates the face's layout by quarter turns so the shared edge
//! lines up with the neighbour's, then translates it onto that edge.
//! [`stitch_by_vertex`] only translates, for faces meeting at a corner. Both
//! reject the placement if it would overlap any face already in the
//! neighbour's island, and leave the face's UVs untouched on rejection.

use nalgebra::{Point2, Vector2};
use tracing::debug;

use super::face_view::{FaceView, Plane};
use super::geometry::{
    almost_equal, almost_equal_points, bounds, point_in_polygon, segments_intersect,
};
use crate::error::{Result, StitchingError};
use crate::mesh::{FaceId, MeshIndex, PolyMesh};

/// How a successful stitch transformed the face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StitchOutcome {
    /// Quarter turns applied, including any half-turn flip.
    pub quarter_turns: u8,
    /// Whether a half turn was added on top of the smallest aligning
    /// rotation.
    pub flipped: bool,
}

/// Rotate a vector counter-clockwise by `turns` quarter turns, exactly.
#[inline]
pub fn rotate_quarter_turns(v: Vector2<f64>, turns: u8) -> Vector2<f64> {
    match turns % 4 {
        0 => v,
        1 => Vector2::new(-v.y, v.x),
        2 => Vector2::new(-v.x, -v.y),
        _ => Vector2::new(v.y, -v.x),
    }
}

/// Smallest number of quarter turns that makes `v` parallel or
/// anti-parallel to `target`.
pub fn quarter_turns_to_align(target: &Vector2<f64>, v: &Vector2<f64>) -> Option<u8> {
    let target = target.try_normalize(0.0)?;
    let v = v.try_normalize(0.0)?;
    (0..4u8).find(|&k| {
        let r = rotate_quarter_turns(v, k);
        almost_equal(target.x, r.x) && almost_equal(target.y, r.y)
            || almost_equal(target.x, -r.x) && almost_equal(target.y, -r.y)
    })
}

/// Snap corners that landed on a shared vertex onto the neighbour's UV bits.
fn anchor_shared_corners(
    points: &mut [Point2<f64>],
    shared: &[(usize, usize)],
    neighbor_uvs: &[Point2<f64>],
) {
    for &(i, j) in shared {
        if almost_equal_points(&points[i], &neighbor_uvs[j]) {
            points[i] = neighbor_uvs[j];
        }
    }
}

fn check_overlap<I: MeshIndex>(
    mesh: &PolyMesh<I>,
    face: FaceId<I>,
    points: &[Point2<f64>],
    island: &[FaceId<I>],
) -> Result<()> {
    for &other in island {
        if other == face {
            continue;
        }
        if polygons_overlap(points, &mesh.face_uvs(other)) {
            return Err(StitchingError::Overlap {
                face: face.index(),
                other: other.index(),
            }
            .into());
        }
    }
    Ok(())
}

/// Stitch `view` onto `neighbor` along their shared edge.
///
/// `island` lists the faces already in the neighbour's island. On success
/// the face's UVs are rewritten and the two corners of the shared edge are
/// bit-for-bit equal to the neighbour's.
///
/// # Errors
/// `MeshError::Stitching` when the faces share no edge, the shared UV edges
/// differ in length, no quarter turn aligns them, the edge does not line up
/// after the transform, or the result overlaps the island.
pub fn stitch<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    view: &FaceView<I>,
    neighbor: &FaceView<I>,
    island: &[FaceId<I>],
) -> Result<StitchOutcome> {
    let face = view.face().index();
    let neighbor_index = neighbor.face().index();

    let Some(&(edge, _)) = view.common_edges(neighbor).last() else {
        return Err(StitchingError::NoCommonEdge {
            face,
            neighbor: neighbor_index,
        }
        .into());
    };

    let misaligned = StitchingError::SharedEdgeMisaligned {
        face,
        neighbor: neighbor_index,
    };
    let shared = view.common_vertices(neighbor);
    let far = (edge + 1) % view.len();
    let matching = |i: usize| shared.iter().find(|(k, _)| *k == i).map(|&(_, j)| j);
    let (Some(anchor), Some(far_anchor)) = (matching(edge), matching(far)) else {
        return Err(misaligned.into());
    };

    let neighbor_uvs = neighbor.uvs(mesh);
    let uv_edge = view.uv_edge(mesh, edge);
    let neighbor_uv_edge = neighbor_uvs[far_anchor] - neighbor_uvs[anchor];
    if !almost_equal(uv_edge.norm(), neighbor_uv_edge.norm()) {
        return Err(StitchingError::EdgeLengthMismatch {
            face,
            length: uv_edge.norm(),
            neighbor_length: neighbor_uv_edge.norm(),
        }
        .into());
    }

    let turns = quarter_turns_to_align(&neighbor_uv_edge, &uv_edge)
        .ok_or(StitchingError::NoAlignedRotation { face })?;
    let wound_against = view.plane() == Plane::Lateral
        && neighbor.plane() == Plane::Lateral
        && view.is_inverted_against(neighbor);
    let first = (turns + if wound_against { 2 } else { 0 }) % 4;

    // Exactly one of the two half-turn candidates carries the far corner
    // onto the neighbour's.
    let uvs = view.uvs(mesh);
    let (total, points) = [first, (first + 2) % 4]
        .into_iter()
        .find_map(|total| {
            let mut points: Vec<Point2<f64>> = uvs
                .iter()
                .map(|p| Point2::from(rotate_quarter_turns(p.coords, total)))
                .collect();
            let offset = neighbor_uvs[anchor] - points[edge];
            for p in &mut points {
                *p += offset;
            }
            points[edge] = neighbor_uvs[anchor];
            anchor_shared_corners(&mut points, &shared, &neighbor_uvs);
            (points[far] == neighbor_uvs[far_anchor]).then_some((total, points))
        })
        .ok_or(misaligned)?;
    let flipped = total != turns;

    check_overlap(mesh, view.face(), &points, island)?;
    mesh.set_face_uvs(view.face(), &points);

    debug!(face, neighbor = neighbor_index, turns = total, flipped, "stitched by edge");
    Ok(StitchOutcome {
        quarter_turns: total,
        flipped,
    })
}

/// Stitch `view` onto `neighbor` at a shared corner, by translation only.
///
/// # Errors
/// `MeshError::Stitching` when the faces share an edge (they must be
/// stitched with [`stitch`]), share no vertex, or the result overlaps the
/// island.
pub fn stitch_by_vertex<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    view: &FaceView<I>,
    neighbor: &FaceView<I>,
    island: &[FaceId<I>],
) -> Result<StitchOutcome> {
    let face = view.face().index();
    let neighbor_index = neighbor.face().index();

    if !view.common_edges(neighbor).is_empty() {
        return Err(StitchingError::SharesEdge {
            face,
            neighbor: neighbor_index,
        }
        .into());
    }
    let shared = view.common_vertices(neighbor);
    let Some(&(corner, other_corner)) = shared.first() else {
        return Err(StitchingError::NoCommonVertex {
            face,
            neighbor: neighbor_index,
        }
        .into());
    };

    let neighbor_uvs = neighbor.uvs(mesh);
    let offset = neighbor_uvs[other_corner] - view.uv(mesh, corner);
    let mut points: Vec<Point2<f64>> = view.uvs(mesh).into_iter().map(|p| p + offset).collect();
    points[corner] = neighbor_uvs[other_corner];

    check_overlap(mesh, view.face(), &points, island)?;
    mesh.set_face_uvs(view.face(), &points);

    debug!(face, neighbor = neighbor_index, "stitched by vertex");
    Ok(StitchOutcome::default())
}

// ==================== Overlap ====================

/// Whether two UV polygons overlap.
///
/// They overlap if they have the same corners, if an edge of one crosses an
/// edge of the other, or if a corner of either lies strictly inside the
/// other. Corners coinciding with the other polygon's corners are ignored
/// for the inside test, so faces sharing an edge or a corner do not overlap.
pub fn polygons_overlap(a: &[Point2<f64>], b: &[Point2<f64>]) -> bool {
    same_points(a, b) || edges_cross(a, b) || any_point_inside(a, b) || any_point_inside(b, a)
}

fn same_points(a: &[Point2<f64>], b: &[Point2<f64>]) -> bool {
    a.len() == b.len() && a.iter().all(|p| b.iter().any(|q| almost_equal_points(p, q)))
}

fn same_segment(p1: &Point2<f64>, q1: &Point2<f64>, p2: &Point2<f64>, q2: &Point2<f64>) -> bool {
    (almost_equal_points(p1, p2) && almost_equal_points(q1, q2))
        || (almost_equal_points(p1, q2) && almost_equal_points(q1, p2))
}

/// For segments sharing an endpoint: whether they run along each other.
fn shared_endpoint_overlap(
    p1: &Point2<f64>,
    q1: &Point2<f64>,
    p2: &Point2<f64>,
    q2: &Point2<f64>,
) -> Option<bool> {
    let pairs = [(p1, q1, p2, q2), (p1, q1, q2, p2), (q1, p1, p2, q2), (q1, p1, q2, p2)];
    pairs.iter().find_map(|&(s1, e1, s2, e2)| {
        if !almost_equal_points(s1, s2) {
            return None;
        }
        let da = e1 - s1;
        let db = e2 - s2;
        let collinear = almost_equal(da.perp(&db), 0.0);
        Some(collinear && da.dot(&db) > 0.0)
    })
}

fn edges_cross(a: &[Point2<f64>], b: &[Point2<f64>]) -> bool {
    let (Some((a_min, a_max)), Some((b_min, b_max))) = (bounds(a), bounds(b)) else {
        return false;
    };
    if a_min.x > b_max.x || b_min.x > a_max.x || a_min.y > b_max.y || b_min.y > a_max.y {
        return false;
    }

    for i in 0..a.len() {
        let (p1, q1) = (&a[i], &a[(i + 1) % a.len()]);
        for j in 0..b.len() {
            let (p2, q2) = (&b[j], &b[(j + 1) % b.len()]);
            if same_segment(p1, q1, p2, q2) {
                continue;
            }
            let crosses = match shared_endpoint_overlap(p1, q1, p2, q2) {
                Some(overlap) => overlap,
                None => segments_intersect(p1, q1, p2, q2),
            };
            if crosses {
                return true;
            }
        }
    }
    false
}

fn any_point_inside(points: &[Point2<f64>], polygon: &[Point2<f64>]) -> bool {
    points.iter().any(|p| {
        !polygon.iter().any(|q| almost_equal_points(p, q)) && point_in_polygon(p, polygon)
    })
}
