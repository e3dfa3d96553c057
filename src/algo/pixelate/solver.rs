//! Per-face UV solving on the texel grid.
//!
//! A face is flattened into its local basis, scaled so one world unit spans
//! `grid_density` texels, anchored at the origin and snapped. Aligned edges
//! whose texel count then disagrees with their 3D length are corrected by
//! shifting a run of neighbouring corners along the edge's axis.

use nalgebra::{Point2, Vector2};
use tracing::{debug, warn};

use super::face_view::FaceView;
use crate::error::{MeshError, Result};
use crate::mesh::{MeshIndex, PolyMesh};

/// Default fraction of a texel past which snapping moves to the next line.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 0.5;

/// The texel grid UVs are quantized to.
///
/// `grid_density` is texels per world unit and `texel_size` is UV units per
/// texel, so a 3D length `l` should span `l * grid_density` texels, i.e.
/// `l * grid_density * texel_size` in UV space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexelGrid {
    grid_density: u32,
    texel_size: f64,
    snap_threshold: f64,
}

impl TexelGrid {
    /// Create a grid with the default snap threshold.
    ///
    /// # Errors
    /// `InvalidParameter` if the density is zero or the texel size is not in
    /// `(0, 1]`.
    pub fn new(grid_density: u32, texel_size: f64) -> Result<Self> {
        if grid_density == 0 {
            return Err(MeshError::invalid_param(
                "grid_density",
                grid_density,
                "must be positive",
            ));
        }
        if !(texel_size > 0.0 && texel_size <= 1.0) {
            return Err(MeshError::invalid_param(
                "texel_size",
                texel_size,
                "must be in (0, 1]",
            ));
        }
        Ok(Self {
            grid_density,
            texel_size,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
        })
    }

    /// Create a grid for a square texture of `texture_size` texels.
    pub fn from_texture_size(grid_density: u32, texture_size: u32) -> Result<Self> {
        if texture_size == 0 {
            return Err(MeshError::invalid_param(
                "texture_size",
                texture_size,
                "must be positive",
            ));
        }
        Self::new(grid_density, 1.0 / f64::from(texture_size))
    }

    /// Set the snap threshold, as a fraction of one texel.
    pub fn with_snap_threshold(mut self, threshold: f64) -> Result<Self> {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(MeshError::invalid_param(
                "snap_threshold",
                threshold,
                "must be in (0, 1)",
            ));
        }
        self.snap_threshold = threshold;
        Ok(self)
    }

    /// Texels per world unit.
    #[inline]
    pub fn grid_density(&self) -> u32 {
        self.grid_density
    }

    /// UV units per texel.
    #[inline]
    pub fn texel_size(&self) -> f64 {
        self.texel_size
    }

    /// Snap threshold as a fraction of one texel.
    #[inline]
    pub fn snap_threshold(&self) -> f64 {
        self.snap_threshold
    }

    /// UV length a 3D length should map to.
    #[inline]
    pub fn target_length(&self, length3d: f64) -> f64 {
        f64::from(self.grid_density) * length3d * self.texel_size
    }

    /// Whole texels a 3D length should span. Halves round to even.
    #[inline]
    pub fn pixels_3d(&self, length3d: f64) -> i64 {
        (length3d * f64::from(self.grid_density)).round_ties_even() as i64
    }

    /// Whole texels a UV length spans. Halves round to even.
    #[inline]
    pub fn pixels_2d(&self, length2d: f64) -> i64 {
        (length2d / self.texel_size).round_ties_even() as i64
    }

    /// Snap one coordinate to a grid line.
    ///
    /// Moving forward, the lower line wins unless the value is more than the
    /// threshold past it. Moving in reverse, the upper line wins unless the
    /// value is more than the threshold below it.
    pub fn snap_value(&self, value: f64, reverse: bool) -> f64 {
        let s = self.texel_size;
        let margin = s * self.snap_threshold;
        let lower_index = (value / s).floor();
        let lower = lower_index * s;
        let upper = (lower_index + 1.0) * s;
        if reverse {
            if value >= upper - margin {
                upper
            } else {
                lower
            }
        } else if value <= lower + margin {
            lower
        } else {
            upper
        }
    }

    /// Snap a point, per axis. `from` is the corner the point was reached
    /// from; an axis travelled in the negative direction snaps in reverse.
    pub fn snap_point(&self, point: Point2<f64>, from: Option<&Point2<f64>>) -> Point2<f64> {
        let (x_reverse, y_reverse) = match from {
            Some(from) => {
                let d = point - from;
                (d.x < 0.0, d.y < 0.0)
            }
            None => (false, false),
        };
        Point2::new(
            self.snap_value(point.x, x_reverse),
            self.snap_value(point.y, y_reverse),
        )
    }
}

/// Snap every corner of a face, without direction hints.
pub fn snap_face<I: MeshIndex>(mesh: &mut PolyMesh<I>, view: &FaceView<I>, grid: &TexelGrid) {
    let f = view.face();
    for i in 0..view.len() {
        let uv = grid.snap_point(mesh.uv(f, i), None);
        mesh.set_uv(f, i, uv);
    }
}

/// Compute an isolated pixel-aligned layout for one face.
///
/// Writes the face's UVs and returns the number of aligned edges the edge
/// fix could not correct.
///
/// # Errors
/// - `DegenerateFace` if the face has no normal or no edge of positive length
/// - `AlignmentInvariant` if an aligned edge needs fixing but has no extent
///   along its axis
pub fn solve_face<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    view: &FaceView<I>,
    grid: &TexelGrid,
) -> Result<usize> {
    let f = view.face();
    let n = view.len();
    if view.normal().norm_squared() == 0.0 {
        return Err(MeshError::DegenerateFace { face: f.index() });
    }

    // Mean UV-per-world scale over the measurable edges
    let mut total = 0.0;
    let mut measured = 0usize;
    for i in 0..n {
        let length = view.edge(i).norm();
        if length > 0.0 {
            total += grid.target_length(length) / length;
            measured += 1;
        }
    }
    if measured == 0 {
        return Err(MeshError::DegenerateFace { face: f.index() });
    }
    let scale = total / measured as f64;

    let basis = view.basis();
    let projected: Vec<Point2<f64>> = (0..n)
        .map(|i| {
            let local = basis * view.position(i).coords;
            Point2::new(local.x, local.y) * scale
        })
        .collect();
    let origin = projected[0].coords;
    let raw: Vec<Point2<f64>> = projected.iter().map(|p| p - origin).collect();

    for i in 0..n {
        let from = if i == 0 { None } else { Some(&raw[i - 1]) };
        mesh.set_uv(f, i, grid.snap_point(raw[i], from));
    }

    let imperfect = fix_wrong_edges(mesh, view, grid)?;
    snap_face(mesh, view, grid);

    debug!(face = f.index(), plane = %view.plane(), imperfect, "solved face");
    Ok(imperfect)
}

/// Direction a movable run is searched and shifted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    /// From the edge's end corner onwards in winding order.
    Forward,
    /// From the edge's start corner backwards.
    Backward,
}

/// Correct aligned edges whose texel count disagrees with their 3D length.
///
/// Horizontal edges are handled first, then vertical ones. Returns the
/// number of edges that could not be corrected.
pub fn fix_wrong_edges<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    view: &FaceView<I>,
    grid: &TexelGrid,
) -> Result<usize> {
    let mut imperfect = 0;
    for (edges, horizontal) in [(view.horizontal_edges(), true), (view.vertical_edges(), false)] {
        for &edge in edges {
            let pixels_3d = grid.pixels_3d(view.edge(edge).norm());
            let pixels_2d = grid.pixels_2d(view.uv_edge(mesh, edge).norm());
            if pixels_3d == pixels_2d {
                continue;
            }
            if !fix_edge(mesh, view, grid, edge, pixels_3d - pixels_2d, horizontal)? {
                warn!(
                    face = view.face().index(),
                    edge,
                    expected = pixels_3d,
                    actual = pixels_2d,
                    "aligned edge left imperfect"
                );
                imperfect += 1;
            }
        }
    }
    Ok(imperfect)
}

/// Lengthen (or shorten) one aligned edge by `delta` texels along its axis.
///
/// Returns `false` if no run of corners can absorb the shift.
fn fix_edge<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    view: &FaceView<I>,
    grid: &TexelGrid,
    edge: usize,
    delta: i64,
    horizontal: bool,
) -> Result<bool> {
    let axis = if horizontal { 0 } else { 1 };
    let direction = match view.uv_edge(mesh, edge)[axis] {
        d if d > 0.0 => 1.0,
        d if d < 0.0 => -1.0,
        _ => match view.basis_converted_edge(edge)[axis] {
            d if d > 0.0 => 1.0,
            d if d < 0.0 => -1.0,
            _ => {
                return Err(MeshError::AlignmentInvariant {
                    face: view.face().index(),
                    edge,
                })
            }
        },
    };

    let mut shift = Vector2::zeros();
    shift[axis] = delta as f64 * direction * grid.texel_size();

    for walk in [Walk::Forward, Walk::Backward] {
        if let Some(count) = movable_run(mesh, view, grid, edge, walk, &shift, horizontal) {
            let f = view.face();
            let (mut vertex, step, offset) = match walk {
                Walk::Forward => ((edge + 1) % view.len(), 1, shift),
                Walk::Backward => (edge, -1, -shift),
            };
            for _ in 0..count {
                let uv = mesh.uv(f, vertex) + offset;
                mesh.set_uv(f, vertex, uv);
                vertex = view.index(vertex as isize + step);
            }
            debug!(face = f.index(), edge, delta, ?walk, count, "fixed edge");
            return Ok(true);
        }
    }
    Ok(false)
}

/// Count the corners that can move together to fix `edge`.
///
/// Walks the boundary from one end of the edge. Each corner visited joins
/// the run; the walk ends at the first edge beyond it that is unaligned, or
/// that lies on the same axis and becomes correct with the shift. Reaching
/// the other end of the fixed edge means no run exists.
fn movable_run<I: MeshIndex>(
    mesh: &PolyMesh<I>,
    view: &FaceView<I>,
    grid: &TexelGrid,
    edge: usize,
    walk: Walk,
    shift: &Vector2<f64>,
    horizontal: bool,
) -> Option<usize> {
    let n = view.len();
    let (mut vertex, stop) = match walk {
        Walk::Forward => ((edge + 1) % n, edge),
        Walk::Backward => (edge, (edge + 1) % n),
    };

    let mut count = 0;
    while vertex != stop {
        count += 1;
        let (beyond, next) = match walk {
            Walk::Forward => (vertex, (vertex + 1) % n),
            Walk::Backward => {
                let prev = view.index(vertex as isize - 1);
                (prev, prev)
            }
        };

        if !view.is_aligned(beyond) {
            return Some(count);
        }
        let same_axis = if horizontal {
            view.is_horizontal(beyond)
        } else {
            view.is_vertical(beyond)
        };
        if same_axis {
            let target = grid.pixels_3d(view.edge(beyond).norm());
            let current = view.uv_edge(mesh, beyond);
            // Either end moving by the shift changes the edge vector by -shift
            if grid.pixels_2d(current.norm()) != target
                && grid.pixels_2d((current - shift).norm()) == target
            {
                return Some(count);
            }
        }
        vertex = next;
    }
    None
}
