//! Pixel-perfect UV unwrapping.
//!
//! Re-derives the UVs of a polygon mesh so every axis-aligned edge spans a
//! whole number of texels on a square texture, adjacent faces share their UV
//! edges where the geometry allows, and the resulting islands are packed
//! side by side in the unit square.
//!
//! # Pipeline
//!
//! 1. Options and the mesh are validated; two vertices at the same position
//!    abort the run before any UV is written.
//! 2. Faces in scope are classified into lateral, top and down planes.
//! 3. Faces are solved one by one and stitched onto solved neighbours
//!    ([`orchestrator::run`]).
//! 4. Islands are packed into columns ([`pack::pack`]).
//! 5. Every corner is snapped back onto the grid.
//!
//! # Example
//!
//! ```
//! use texelgrid::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 1.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 1.0),
//! ];
//! let faces = vec![[0, 1, 2, 3], [1, 4, 5, 2]];
//! let mut mesh: PolyMesh = build_from_quads(&vertices, &faces).unwrap();
//!
//! let report = pixelate(&mut mesh, &PixelateOptions::default()).unwrap();
//! assert_eq!(report.islands, 1);
//! ```

pub mod face_view;
pub mod geometry;
pub mod island;
pub mod orchestrator;
pub mod pack;
pub mod solver;
pub mod stitch;

pub use face_view::{FaceArena, FaceState, FaceView, Plane};
pub use island::{IslandId, IslandMap};
pub use orchestrator::{classify_and_collect, run, snap_all, PlaneGroups, RunStats};
pub use pack::{pack, UvBounds};
pub use solver::{solve_face, TexelGrid};
pub use stitch::{stitch, stitch_by_vertex, StitchOutcome};

use tracing::info;

use super::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{validate_unique_positions, MeshIndex, PolyMesh};

/// Options for [`pixelate`].
#[derive(Debug, Clone, PartialEq)]
pub struct PixelateOptions {
    /// Texels per world unit.
    pub grid_density: u32,

    /// Side of the square texture in texels. One texel is
    /// `1 / texture_size` UV units.
    pub texture_size: u32,

    /// Only unwrap selected faces.
    pub selection_only: bool,

    /// Solve lateral, top and down faces as separate groups that never
    /// stitch to each other.
    pub separate_by_plane: bool,

    /// Angle in degrees between a face normal and up (or down) under which
    /// the face counts as top (or down).
    pub vertical_angle: f64,

    /// Fraction of a texel past which snapping moves to the next grid line.
    pub snap_threshold: f64,

    /// Whether to classify faces in parallel (default: true).
    pub parallel: bool,
}

impl Default for PixelateOptions {
    fn default() -> Self {
        Self {
            grid_density: 10,
            texture_size: 32,
            selection_only: false,
            separate_by_plane: true,
            vertical_angle: 30.0,
            snap_threshold: solver::DEFAULT_SNAP_THRESHOLD,
            parallel: true,
        }
    }
}

impl PixelateOptions {
    /// Set the grid density.
    pub fn with_grid_density(mut self, grid_density: u32) -> Self {
        self.grid_density = grid_density;
        self
    }

    /// Set the texture size.
    pub fn with_texture_size(mut self, texture_size: u32) -> Self {
        self.texture_size = texture_size;
        self
    }

    /// Set whether only selected faces are unwrapped.
    pub fn with_selection_only(mut self, selection_only: bool) -> Self {
        self.selection_only = selection_only;
        self
    }

    /// Set whether planes are solved separately.
    pub fn with_separate_by_plane(mut self, separate: bool) -> Self {
        self.separate_by_plane = separate;
        self
    }

    /// Set the plane classification angle, in degrees.
    pub fn with_vertical_angle(mut self, degrees: f64) -> Self {
        self.vertical_angle = degrees;
        self
    }

    /// Set the snap threshold.
    pub fn with_snap_threshold(mut self, threshold: f64) -> Self {
        self.snap_threshold = threshold;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Use sequential execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// UV units per texel.
    #[inline]
    pub fn texel_size(&self) -> f64 {
        1.0 / f64::from(self.texture_size)
    }

    /// Check every field.
    ///
    /// # Errors
    /// `InvalidParameter` naming the first field out of range.
    pub fn validate(&self) -> Result<()> {
        self.grid().map(|_| ())
    }

    /// The texel grid these options describe.
    ///
    /// # Errors
    /// `InvalidParameter` naming the first field out of range.
    pub fn grid(&self) -> Result<TexelGrid> {
        if !(self.vertical_angle > 0.0 && self.vertical_angle < 90.0) {
            return Err(MeshError::invalid_param(
                "vertical_angle",
                self.vertical_angle,
                "must be in (0, 90) degrees",
            ));
        }
        TexelGrid::from_texture_size(self.grid_density, self.texture_size)?
            .with_snap_threshold(self.snap_threshold)
    }
}

/// Summary of one [`pixelate`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelateReport {
    /// Lateral faces in scope.
    pub lateral_faces: usize,
    /// Top faces in scope.
    pub top_faces: usize,
    /// Down faces in scope.
    pub down_faces: usize,
    /// Faces given a layout.
    pub faces_solved: usize,
    /// Islands after stitching.
    pub islands: usize,
    /// Faces stitched along a shared edge.
    pub edge_stitches: usize,
    /// Faces stitched at a shared corner.
    pub vertex_stitches: usize,
    /// Aligned edges the edge fix could not correct.
    pub imperfect_edges: usize,
    /// Faces whose aligned 3D edges are not all aligned in UV space.
    pub misaligned_faces: usize,
}

/// Unwrap a mesh onto the texel grid.
///
/// Only the UVs are modified. See the [module documentation](self) for the
/// stages.
///
/// # Errors
/// - `InvalidParameter` for out-of-range options
/// - `EmptyMesh` if the mesh has no faces
/// - `DuplicateVertex` if two vertices share a position; no UV is touched
/// - solver errors such as `DegenerateFace` or `AlignmentInvariant`
pub fn pixelate<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    options: &PixelateOptions,
) -> Result<PixelateReport> {
    pixelate_with_progress(mesh, options, &Progress::none())
}

/// [`pixelate`] with progress reporting.
///
/// Reports once per solved face, then once each for packing and snapping.
pub fn pixelate_with_progress<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    options: &PixelateOptions,
    progress: &Progress,
) -> Result<PixelateReport> {
    let grid = options.grid()?;
    if mesh.num_faces() == 0 {
        return Err(MeshError::EmptyMesh);
    }
    validate_unique_positions(mesh)?;
    info!(
        vertices = mesh.num_vertices(),
        faces = mesh.num_faces(),
        "validated mesh"
    );

    let mut arena = FaceArena::new(
        mesh,
        options.selection_only,
        options.vertical_angle.to_radians(),
    );
    let groups = classify_and_collect(mesh, &mut arena, options.parallel);
    let solve_steps = groups.len();
    let total_steps = solve_steps + 2;

    let (islands, stats) = run(
        mesh,
        &mut arena,
        &groups,
        &grid,
        options.separate_by_plane,
        progress,
        total_steps,
    )?;

    pack(mesh, &islands, grid.texel_size());
    info!(islands = islands.len(), "packed islands");
    progress.report_stage(solve_steps, 1, total_steps, "Packing islands");

    snap_all(mesh, &arena, &groups, &grid, options.selection_only);
    progress.report_stage(solve_steps, 2, total_steps, "Snapping to grid");

    let misaligned_faces = groups
        .iter()
        .filter_map(|f| arena.get(f))
        .filter(|view| !view.is_3d_and_uv_aligned(mesh))
        .count();

    Ok(PixelateReport {
        lateral_faces: groups.lateral.len(),
        top_faces: groups.top.len(),
        down_faces: groups.down.len(),
        faces_solved: stats.faces_solved,
        islands: islands.len(),
        edge_stitches: stats.edge_stitches,
        vertex_stitches: stats.vertex_stitches,
        imperfect_edges: stats.imperfect_edges,
        misaligned_faces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_quads, FaceId};
    use nalgebra::{Point2, Point3};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const T: f64 = 1.0 / 32.0;

    fn create_unit_cube() -> PolyMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces = [
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
            [4, 5, 6, 7],
            [0, 3, 2, 1],
        ];
        build_from_quads(&vertices, &faces).unwrap()
    }

    fn f(i: usize) -> FaceId {
        FaceId::new(i)
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn test_default_options() {
        let options = PixelateOptions::default();
        assert_eq!(options.grid_density, 10);
        assert_eq!(options.texture_size, 32);
        assert!(options.separate_by_plane);
        assert!(!options.selection_only);
        assert!(options.parallel);
        assert_eq!(options.texel_size(), T);
        assert!(options.validate().is_ok());
        assert!(!options.sequential().parallel);
    }

    #[test]
    fn test_invalid_options() {
        let bad = [
            PixelateOptions::default().with_grid_density(0),
            PixelateOptions::default().with_texture_size(0),
            PixelateOptions::default().with_vertical_angle(0.0),
            PixelateOptions::default().with_vertical_angle(90.0),
            PixelateOptions::default().with_snap_threshold(1.0),
        ];
        for options in bad {
            assert!(matches!(
                options.validate(),
                Err(MeshError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_cube_pipeline() {
        let mut mesh = create_unit_cube();
        let report = pixelate(&mut mesh, &PixelateOptions::default()).unwrap();

        assert_eq!(
            report,
            PixelateReport {
                lateral_faces: 4,
                top_faces: 1,
                down_faces: 1,
                faces_solved: 6,
                islands: 3,
                edge_stitches: 3,
                vertex_stitches: 0,
                imperfect_edges: 0,
                misaligned_faces: 0,
            }
        );

        // Wall strip along the bottom, then top and bottom stacked above it
        assert_eq!(mesh.face_uvs(f(3)), rect(0.0, 0.0, 10.0 * T, 10.0 * T));
        assert_eq!(mesh.face_uvs(f(0)), rect(10.0 * T, 0.0, 20.0 * T, 10.0 * T));
        assert_eq!(mesh.face_uvs(f(4)), rect(0.0, 11.0 * T, 10.0 * T, 21.0 * T));
        assert_eq!(
            mesh.uv_bounding_box(&[f(5)]),
            Some((Point2::new(0.0, 22.0 * T), Point2::new(10.0 * T, 1.0)))
        );

        for g in mesh.face_ids() {
            for i in 0..4 {
                let e = mesh.uv_edge(g, i);
                assert_eq!(e.x.abs().max(e.y.abs()), 10.0 * T);
                assert_eq!(e.x.abs().min(e.y.abs()), 0.0);
            }
        }
    }

    #[test]
    fn test_reversed_wall_gets_own_island() {
        // The middle wall faces the other way, so it mirrors both neighbours
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 1.0),
        ];
        let faces = [[0, 2, 3, 1], [2, 3, 5, 4], [4, 6, 7, 5]];
        let mut mesh: PolyMesh = build_from_quads(&vertices, &faces).unwrap();
        let report = pixelate(&mut mesh, &PixelateOptions::default().sequential()).unwrap();

        assert_eq!(report.faces_solved, 3);
        assert_eq!(report.islands, 3);
        assert_eq!(report.edge_stitches, 0);
        assert_eq!(report.misaligned_faces, 0);

        let all: Vec<FaceId> = mesh.face_ids().collect();
        for (k, &a) in all.iter().enumerate() {
            for &b in &all[k + 1..] {
                assert!(!stitch::polygons_overlap(&mesh.face_uvs(a), &mesh.face_uvs(b)));
            }
        }
    }

    #[test]
    fn test_duplicate_vertex_leaves_uvs() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
        ];
        let mut mesh: PolyMesh =
            build_from_quads(&vertices, &[[0, 1, 2, 3], [4, 5, 6, 7]]).unwrap();
        let before = rect(0.1, 0.2, 0.3, 0.4);
        mesh.set_face_uvs(f(0), &before);

        let result = pixelate(&mut mesh, &PixelateOptions::default());
        assert!(matches!(
            result,
            Err(MeshError::DuplicateVertex {
                first: 1,
                second: 4,
                ..
            })
        ));
        assert_eq!(mesh.face_uvs(f(0)), before);
    }

    #[test]
    fn test_empty_mesh() {
        let mut mesh: PolyMesh = PolyMesh::new();
        assert!(matches!(
            pixelate(&mut mesh, &PixelateOptions::default()),
            Err(MeshError::EmptyMesh)
        ));
    }

    #[test]
    fn test_selection_only() {
        let mut mesh = create_unit_cube();
        mesh.select_only([f(4)]);
        let options = PixelateOptions::default().with_selection_only(true).sequential();
        let report = pixelate(&mut mesh, &options).unwrap();

        assert_eq!(report.faces_solved, 1);
        assert_eq!(report.islands, 1);
        assert_eq!(mesh.face_uvs(f(4)), rect(0.0, 0.0, 10.0 * T, 10.0 * T));
        assert_eq!(mesh.face_uvs(f(0)), vec![Point2::origin(); 4]);
    }

    #[test]
    fn test_progress_reports() {
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));
        let progress = {
            let calls = Arc::clone(&calls);
            let last = Arc::clone(&last);
            Progress::new(move |current, total, _| {
                assert!(current <= total);
                calls.fetch_add(1, Ordering::SeqCst);
                last.store(current, Ordering::SeqCst);
            })
        };

        let mut mesh = create_unit_cube();
        pixelate_with_progress(&mut mesh, &PixelateOptions::default(), &progress).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert_eq!(last.load(Ordering::SeqCst), 8);
    }
}
