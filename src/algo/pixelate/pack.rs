//! Shelf packing of UV islands into the unit square.
//!
//! Islands are stacked bottom-up in columns, one texel apart. When a column
//! runs past the top of the square the next island starts a new column to
//! the right of the widest island seen so far in the current one. Islands
//! are never rotated and the layout is not optimised.

use nalgebra::{Point2, Vector2};
use tracing::debug;

use super::island::IslandMap;
use crate::mesh::{FaceId, MeshIndex, PolyMesh};

/// Axis-aligned UV bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvBounds {
    /// Bottom-left corner.
    pub min: Point2<f64>,
    /// Top-right corner.
    pub max: Point2<f64>,
}

impl UvBounds {
    /// Horizontal extent.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Vertical extent.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// UV bounds of a set of faces; `None` for an empty set.
pub fn island_bounds<I: MeshIndex>(mesh: &PolyMesh<I>, faces: &[FaceId<I>]) -> Option<UvBounds> {
    mesh.uv_bounding_box(faces).map(|(min, max)| UvBounds { min, max })
}

fn translate<I: MeshIndex>(mesh: &mut PolyMesh<I>, faces: &[FaceId<I>], offset: Vector2<f64>) {
    for &f in faces {
        for i in 0..mesh.face_len(f) {
            let uv = mesh.uv(f, i) + offset;
            mesh.set_uv(f, i, uv);
        }
    }
}

/// Lay out every island of `islands` in columns, `texel_size` apart.
///
/// Islands are placed in creation order.
pub fn pack<I: MeshIndex>(mesh: &mut PolyMesh<I>, islands: &IslandMap<I>, texel_size: f64) {
    let mut left = 0.0;
    let mut bottom = 0.0;
    let mut column_width: f64 = 0.0;

    for (id, faces) in islands.iter() {
        let Some(bounds) = island_bounds(mesh, faces) else {
            continue;
        };
        let offset = Vector2::new(left - bounds.min.x, bottom - bounds.min.y);
        translate(mesh, faces, offset);
        debug!(island = id.index(), faces = faces.len(), left, bottom, "placed island");

        column_width = column_width.max(bounds.width());
        bottom += bounds.height() + texel_size;
        if bottom > 1.0 {
            bottom = 0.0;
            left += column_width + texel_size;
            column_width = 0.0;
        }
    }
}
