//! Greedy traversal driving solve and stitch over the mesh adjacency.
//!
//! Faces are solved one at a time from a work queue seeded per plane group.
//! After each solve the face is stitched onto a solved neighbour when one
//! accepts it, otherwise it seeds a new island. Its unsolved neighbours are
//! then queued, best constrained first.

use std::collections::VecDeque;

use rayon::prelude::*;
use tracing::{debug, info};

use super::face_view::{FaceArena, FaceState, FaceView, Plane};
use super::island::IslandMap;
use super::solver::{snap_face, solve_face, TexelGrid};
use super::stitch::{stitch, stitch_by_vertex, StitchOutcome};
use crate::algo::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, MeshIndex, PolyMesh};

/// In-scope faces bucketed by plane, each list in mesh order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneGroups<I: MeshIndex = u32> {
    /// Wall faces.
    pub lateral: Vec<FaceId<I>>,
    /// Floor faces.
    pub top: Vec<FaceId<I>>,
    /// Ceiling faces.
    pub down: Vec<FaceId<I>>,
}

impl<I: MeshIndex> Default for PlaneGroups<I> {
    fn default() -> Self {
        Self {
            lateral: Vec::new(),
            top: Vec::new(),
            down: Vec::new(),
        }
    }
}

impl<I: MeshIndex> PlaneGroups<I> {
    /// Faces of one plane.
    pub fn get(&self, plane: Plane) -> &[FaceId<I>] {
        match plane {
            Plane::Lateral => &self.lateral,
            Plane::Top => &self.top,
            Plane::Down => &self.down,
        }
    }

    /// Total number of grouped faces.
    pub fn len(&self) -> usize {
        self.lateral.len() + self.top.len() + self.down.len()
    }

    /// Whether no face was grouped.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All faces, lateral first, then top, then down.
    pub fn iter(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        Plane::ORDER.into_iter().flat_map(|plane| self.get(plane).iter().copied())
    }

    /// Traversal groups: one per plane, or a single merged group.
    fn traversal(&self, separate_by_plane: bool) -> Vec<Vec<FaceId<I>>> {
        if separate_by_plane {
            Plane::ORDER.iter().map(|&plane| self.get(plane).to_vec()).collect()
        } else {
            vec![self.iter().collect()]
        }
    }
}

/// Counters gathered while solving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Faces given a layout.
    pub faces_solved: usize,
    /// Faces stitched along a shared edge.
    pub edge_stitches: usize,
    /// Faces stitched at a shared corner.
    pub vertex_stitches: usize,
    /// Aligned edges the edge fix could not correct.
    pub imperfect_edges: usize,
}

/// Create views for every face in scope and bucket them by plane.
///
/// Classification only reads geometry, so with `parallel` it runs on the
/// rayon pool. The lists keep mesh face order either way.
pub fn classify_and_collect<I: MeshIndex>(
    mesh: &PolyMesh<I>,
    arena: &mut FaceArena<I>,
    parallel: bool,
) -> PlaneGroups<I> {
    let scope: Vec<FaceId<I>> = arena.scope().collect();
    let angle = arena.vertical_angle();

    let views: Vec<FaceView<I>> = if parallel {
        scope
            .par_iter()
            .map(|&f| FaceView::new(mesh, f, angle))
            .collect()
    } else {
        scope.iter().map(|&f| FaceView::new(mesh, f, angle)).collect()
    };

    let mut groups = PlaneGroups::default();
    for view in views {
        match view.plane() {
            Plane::Lateral => groups.lateral.push(view.face()),
            Plane::Top => groups.top.push(view.face()),
            Plane::Down => groups.down.push(view.face()),
        }
        arena.insert(view);
    }

    info!(
        lateral = groups.lateral.len(),
        top = groups.top.len(),
        down = groups.down.len(),
        "classified faces"
    );
    groups
}

/// Queue priority: solved same-plane neighbours (one per shared edge) plus
/// the fraction of aligned edges.
pub fn score<I: MeshIndex>(mesh: &PolyMesh<I>, arena: &mut FaceArena<I>, f: FaceId<I>) -> f64 {
    let linked: Vec<FaceId<I>> = mesh
        .linked_faces(f)
        .into_iter()
        .filter(|&g| arena.in_scope(g))
        .collect();
    for &g in &linked {
        arena.ensure(mesh, g);
    }
    arena.ensure(mesh, f);

    let arena: &FaceArena<I> = arena;
    let Some(view) = arena.get(f) else {
        return 0.0;
    };
    let solved_edges: usize = linked
        .iter()
        .filter_map(|&g| arena.get(g))
        .filter(|other| other.is_solved() && other.plane() == view.plane())
        .map(|other| view.common_edges(other).len())
        .sum();
    solved_edges as f64 + view.aligned_edge_count() as f64 / view.len() as f64
}

/// Neighbours of a freshly solved face, by how they can be stitched.
#[derive(Debug)]
struct Neighbourhood<I: MeshIndex> {
    edge_solved: Vec<FaceId<I>>,
    vertex_solved: Vec<FaceId<I>>,
    edge_unsolved: bool,
}

fn neighbourhood<I: MeshIndex>(
    arena: &FaceArena<I>,
    view: &FaceView<I>,
    linked: &[FaceId<I>],
    separate_by_plane: bool,
) -> Neighbourhood<I> {
    let mut hood = Neighbourhood {
        edge_solved: Vec::new(),
        vertex_solved: Vec::new(),
        edge_unsolved: false,
    };
    for other in linked.iter().filter_map(|&g| arena.get(g)) {
        if separate_by_plane && other.plane() != view.plane() {
            continue;
        }
        let shares_edge = !view.common_edges(other).is_empty();
        match (other.is_solved(), shares_edge) {
            (true, true) => hood.edge_solved.push(other.face()),
            (true, false) => hood.vertex_solved.push(other.face()),
            (false, true) => hood.edge_unsolved = true,
            (false, false) => {}
        }
    }
    hood
}

/// Try each candidate in turn; the first accepted stitch wins.
///
/// Stitching rejections move on to the next candidate. Any other error is
/// returned as is.
fn try_stitch<I, F>(
    mesh: &mut PolyMesh<I>,
    arena: &FaceArena<I>,
    islands: &IslandMap<I>,
    view: &FaceView<I>,
    candidates: &[FaceId<I>],
    stitcher: F,
) -> Result<Option<(FaceId<I>, StitchOutcome)>>
where
    I: MeshIndex,
    F: Fn(&mut PolyMesh<I>, &FaceView<I>, &FaceView<I>, &[FaceId<I>]) -> Result<StitchOutcome>,
{
    for &g in candidates {
        let Some(neighbor) = arena.get(g) else {
            continue;
        };
        match stitcher(mesh, view, neighbor, islands.faces_with(g)) {
            Ok(outcome) => return Ok(Some((g, outcome))),
            Err(MeshError::Stitching(reason)) => {
                debug!(
                    face = view.face().index(),
                    neighbor = g.index(),
                    %reason,
                    "stitch rejected"
                );
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// Solve every grouped face, stitching faces into islands.
///
/// With `separate_by_plane` planes are traversed one after another (lateral,
/// top, down) and faces only stitch to faces of their own plane. Progress is
/// reported once per face against `total_steps`.
///
/// # Errors
/// Solver failures and unexpected stitch errors abort the run. Stitch
/// rejections only make the face fall back to the next candidate or to a
/// new island.
pub fn run<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    arena: &mut FaceArena<I>,
    groups: &PlaneGroups<I>,
    grid: &TexelGrid,
    separate_by_plane: bool,
    progress: &Progress,
    total_steps: usize,
) -> Result<(IslandMap<I>, RunStats)> {
    let mut islands = IslandMap::new(mesh.num_faces());
    let mut stats = RunStats::default();
    let mut queued = vec![false; mesh.num_faces()];

    for group in groups.traversal(separate_by_plane) {
        for start in group {
            if arena.state(start).is_solved() {
                continue;
            }
            let mut queue = VecDeque::from([start]);
            queued[start.index()] = true;

            while let Some(f) = queue.pop_front() {
                if arena.state(f).is_solved() {
                    continue;
                }
                process_face(mesh, arena, &mut islands, &mut stats, grid, separate_by_plane, f)?;
                progress.report_stage(0, stats.faces_solved, total_steps, "Solving faces");

                let plane = arena.ensure(mesh, f).plane();
                for g in mesh.linked_faces(f) {
                    if !arena.in_scope(g) || queued[g.index()] || arena.state(g).is_solved() {
                        continue;
                    }
                    if separate_by_plane && arena.ensure(mesh, g).plane() != plane {
                        continue;
                    }
                    queued[g.index()] = true;
                    queue.push_back(g);
                }

                let mut scored: Vec<(f64, FaceId<I>)> = queue
                    .drain(..)
                    .map(|g| (score(mesh, arena, g), g))
                    .collect();
                scored.sort_by(|a, b| b.0.total_cmp(&a.0));
                if let Some(&(best, next)) = scored.first() {
                    debug!(
                        next = next.index(),
                        score = best,
                        queued = scored.len(),
                        "ordered queue"
                    );
                }
                queue.extend(scored.into_iter().map(|(_, g)| g));
            }
        }
    }

    info!(
        solved = stats.faces_solved,
        islands = islands.len(),
        edge_stitches = stats.edge_stitches,
        vertex_stitches = stats.vertex_stitches,
        imperfect_edges = stats.imperfect_edges,
        "solved faces"
    );
    Ok((islands, stats))
}

fn process_face<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    arena: &mut FaceArena<I>,
    islands: &mut IslandMap<I>,
    stats: &mut RunStats,
    grid: &TexelGrid,
    separate_by_plane: bool,
    f: FaceId<I>,
) -> Result<()> {
    let linked: Vec<FaceId<I>> = mesh
        .linked_faces(f)
        .into_iter()
        .filter(|&g| arena.in_scope(g))
        .collect();
    for &g in &linked {
        arena.ensure(mesh, g);
    }
    arena.ensure(mesh, f);

    let arena_view: &FaceArena<I> = arena;
    let view = arena_view
        .get(f)
        .ok_or_else(|| MeshError::InvalidState(format!("face {} has no view", f.index())))?;

    stats.imperfect_edges += solve_face(mesh, view, grid)?;

    let hood = neighbourhood(arena_view, view, &linked, separate_by_plane);
    let mut placed = try_stitch(mesh, arena_view, islands, view, &hood.edge_solved, stitch)?;
    if placed.is_some() {
        stats.edge_stitches += 1;
    } else if !hood.vertex_solved.is_empty() && !hood.edge_unsolved {
        placed = try_stitch(
            mesh,
            arena_view,
            islands,
            view,
            &hood.vertex_solved,
            stitch_by_vertex,
        )?;
        if placed.is_some() {
            stats.vertex_stitches += 1;
        }
    }

    let inverted = placed.is_some_and(|(_, outcome)| outcome.flipped);
    arena.set_state(f, FaceState::Solved { inverted });
    match placed {
        Some((neighbor, _)) => {
            islands.join(f, neighbor)?;
        }
        None => {
            let id = islands.seed(f);
            debug!(face = f.index(), island = id.index(), "seeded island");
        }
    }
    stats.faces_solved += 1;
    Ok(())
}

/// Re-snap every grouped face to the texel grid, without direction hints.
///
/// With `selection_only` only selected faces are touched.
pub fn snap_all<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    arena: &FaceArena<I>,
    groups: &PlaneGroups<I>,
    grid: &TexelGrid,
    selection_only: bool,
) {
    let mut snapped = 0usize;
    for f in groups.iter() {
        if selection_only && !mesh.is_face_selected(f) {
            continue;
        }
        if let Some(view) = arena.get(f) {
            snap_face(mesh, view, grid);
            snapped += 1;
        }
    }
    info!(faces = snapped, "snapped faces");
}
